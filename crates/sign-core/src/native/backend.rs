//! Implementations of the signing capability.

use rand::RngCore;
use tracing::{debug, info, warn};

use super::call::SignFunction;
use super::invoker::{InvokerSettings, ServiceState};
use super::layout::{SignOutput, test_mode};
use super::library::{self, ModuleHandle};
use super::locator;
use super::offset::{self, EntryPoint};
use crate::error::{Error, Result};

/// Something that can turn `(cmd, src, seq)` into a [`SignOutput`].
///
/// Implementations must be callable from many threads at once.
pub trait SignBackend: Send + Sync {
    /// Operating mode this backend represents
    fn mode(&self) -> ServiceState;

    /// Produce the three signature fields for one request
    fn sign(&self, cmd: &str, src: &[u8], seq: i32) -> Result<SignOutput>;

    /// Resolved call target, if any
    fn entry_point(&self) -> Option<EntryPoint> {
        None
    }
}

/// Stand-in used when no native libraries are configured.
///
/// Output has a fixed shape (32/64/64 bytes) and random content.
#[derive(Debug, Default)]
pub struct TestModeBackend;

impl SignBackend for TestModeBackend {
    fn mode(&self) -> ServiceState {
        ServiceState::TestMode
    }

    fn sign(&self, cmd: &str, src: &[u8], seq: i32) -> Result<SignOutput> {
        warn!(cmd, seq, len = src.len(), "Test mode: returning synthetic signature");
        Ok(SignOutput {
            token: random_bytes(test_mode::TOKEN_LEN),
            extra: random_bytes(test_mode::EXTRA_LEN),
            sign: random_bytes(test_mode::SIGN_LEN),
        })
    }
}

fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// Backend that calls into the loaded native module.
pub struct NativeBackend {
    // Declared before `_module` so the function is dropped first.
    function: SignFunction,
    max_input_len: usize,
    _module: ModuleHandle,
}

impl NativeBackend {
    /// Load dependencies and the entry module, then resolve the sign function.
    ///
    /// On any failure after the entry module is opened, its handle is
    /// released before returning.
    pub fn load(settings: &InvokerSettings) -> Result<Self> {
        let count = library::load_dependencies(&settings.libraries)?;
        info!("Loaded {} dependency libraries", count);

        let module = library::open_module(&settings.module_path)?;

        let module_name = settings.module_name();
        let base = locator::find_base_address(&module_name)?;
        let offset = offset::parse_offset(&settings.offset)?;
        let entry = offset::compute_entry_point(base, offset)?;

        // SAFETY: `entry` lies inside `module`, which this backend owns and
        // keeps loaded for as long as `function` exists. The configured
        // offset is trusted to name a function with the RawSignFn ABI.
        let function = unsafe { SignFunction::from_entry_point(entry) }?;

        info!(
            "Resolved sign function in {} at {}",
            module.path(),
            entry
        );

        Ok(Self {
            function,
            max_input_len: settings.max_input_len,
            _module: module,
        })
    }
}

impl SignBackend for NativeBackend {
    fn mode(&self) -> ServiceState {
        ServiceState::Ready
    }

    fn sign(&self, cmd: &str, src: &[u8], seq: i32) -> Result<SignOutput> {
        check_input_len(src.len(), self.max_input_len)?;
        debug!(cmd, seq, len = src.len(), "Calling sign function");
        self.function.call(cmd, src, seq)
    }

    fn entry_point(&self) -> Option<EntryPoint> {
        Some(self.function.entry_point())
    }
}

/// Backend around a bound function that owns no module handle.
///
/// Used when the sign function lives in the host binary itself.
pub struct InProcessBackend {
    function: SignFunction,
    max_input_len: usize,
}

impl InProcessBackend {
    pub fn new(function: SignFunction, max_input_len: usize) -> Self {
        Self {
            function,
            max_input_len,
        }
    }
}

impl SignBackend for InProcessBackend {
    fn mode(&self) -> ServiceState {
        ServiceState::Ready
    }

    fn sign(&self, cmd: &str, src: &[u8], seq: i32) -> Result<SignOutput> {
        check_input_len(src.len(), self.max_input_len)?;
        self.function.call(cmd, src, seq)
    }

    fn entry_point(&self) -> Option<EntryPoint> {
        Some(self.function.entry_point())
    }
}

fn check_input_len(len: usize, max: usize) -> Result<()> {
    if len > max {
        return Err(Error::PayloadTooLarge { len, max });
    }
    Ok(())
}
