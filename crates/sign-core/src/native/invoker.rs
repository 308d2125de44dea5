//! Lifecycle owner for the signing backend.
//!
//! `NativeInvoker` walks the state machine
//!
//! ```text
//! Uninitialized ──(no libraries)──────────▶ TestMode ──┐
//!       │                                             ├──unload──▶ Unloaded
//!       └──(load + resolve succeed)───────▶ Ready ────┘
//! ```
//!
//! A failed initialization leaves it `Uninitialized`.
//!
//! `initialize` and `unload` take `&mut self`; `invoke` takes `&self`. Once
//! shared behind an `Arc`, the only way to unload is to regain unique
//! ownership, which means every in-flight call has finished.

use std::path::Path;

use serde::Serialize;
use strum::Display;
use tracing::{info, warn};

use super::backend::{NativeBackend, SignBackend, TestModeBackend};
use super::layout::SignOutput;
use super::offset::{self, EntryPoint};
use crate::error::{Error, Result};

/// Upper bound accepted for `max_input_len` (10 MiB)
pub const MAX_INPUT_LIMIT: usize = 10 * 1024 * 1024;

/// Upper bound accepted for `timeout_ms`
pub const MAX_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
pub enum ServiceState {
    Uninitialized,
    TestMode,
    Ready,
    Unloaded,
}

/// Everything the invoker needs to bring up the native module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokerSettings {
    /// Dependency libraries, loaded in order before the entry module
    pub libraries: Vec<String>,
    /// Path of the module that contains the sign function
    pub module_path: String,
    /// Fragment used to find the module in the loaded-object list
    /// (defaults to the file name of `module_path`)
    pub module_name: Option<String>,
    /// Offset of the sign function from the module base
    pub offset: String,
    /// Largest accepted input in bytes
    pub max_input_len: usize,
    /// Deadline for one signing call, enforced by the caller
    pub timeout_ms: u64,
}

impl Default for InvokerSettings {
    fn default() -> Self {
        Self {
            libraries: Vec::new(),
            module_path: "./QQApp/wrapper.node".to_string(),
            module_name: None,
            offset: "0x0".to_string(),
            max_input_len: 1024 * 1024,
            timeout_ms: 5000,
        }
    }
}

impl InvokerSettings {
    pub fn module_name(&self) -> String {
        match &self.module_name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => Path::new(&self.module_path)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.module_path.clone()),
        }
    }

    /// Check the settings that only matter when native libraries are used.
    pub fn validate(&self) -> Result<()> {
        if self.libraries.is_empty() {
            return Err(Error::Configuration(
                "library list must not be empty".to_string(),
            ));
        }

        if self.offset.trim().is_empty() || matches!(offset::parse_offset(&self.offset), Ok(0)) {
            return Err(Error::Configuration("offset must not be zero".to_string()));
        }

        if self.max_input_len == 0 || self.max_input_len > MAX_INPUT_LIMIT {
            return Err(Error::Configuration(format!(
                "max input length must be in 1..={} bytes, got {}",
                MAX_INPUT_LIMIT, self.max_input_len
            )));
        }

        if self.timeout_ms == 0 || self.timeout_ms > MAX_TIMEOUT_MS {
            return Err(Error::Configuration(format!(
                "timeout must be in 1..={} ms, got {}",
                MAX_TIMEOUT_MS, self.timeout_ms
            )));
        }

        Ok(())
    }
}

/// Owns the signing backend and its lifecycle.
pub struct NativeInvoker {
    state: ServiceState,
    backend: Option<Box<dyn SignBackend>>,
}

impl NativeInvoker {
    pub fn new() -> Self {
        Self {
            state: ServiceState::Uninitialized,
            backend: None,
        }
    }

    /// Start from an already constructed backend.
    pub fn from_backend(backend: Box<dyn SignBackend>) -> Self {
        Self {
            state: backend.mode(),
            backend: Some(backend),
        }
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    pub fn entry_point(&self) -> Option<EntryPoint> {
        self.backend.as_ref().and_then(|b| b.entry_point())
    }

    /// Bring up the backend selected by `settings`.
    ///
    /// Must run once, before any call to [`invoke`](Self::invoke).
    pub fn initialize(&mut self, settings: &InvokerSettings) -> Result<()> {
        match self.state {
            ServiceState::Uninitialized => {}
            ServiceState::Unloaded => {
                return Err(Error::Configuration(
                    "signing module was already unloaded".to_string(),
                ));
            }
            state => {
                return Err(Error::Configuration(format!(
                    "signing module already initialized ({})",
                    state
                )));
            }
        }

        let backend: Box<dyn SignBackend> = if settings.libraries.is_empty() {
            warn!("No libraries configured, running in test mode");
            Box::new(TestModeBackend)
        } else {
            settings.validate()?;
            Box::new(NativeBackend::load(settings)?)
        };

        self.state = backend.mode();
        self.backend = Some(backend);
        info!("Signing module initialized ({})", self.state);
        Ok(())
    }

    /// Run one signing call. Safe to call from many threads at once.
    pub fn invoke(&self, cmd: &str, src: &[u8], seq: i32) -> Result<SignOutput> {
        let backend = self.backend.as_ref().ok_or(Error::NotInitialized)?;
        backend.sign(cmd, src, seq)
    }

    /// Release the entry module and forget the entry point. Idempotent.
    pub fn unload(&mut self) {
        if self.backend.take().is_some() {
            info!("Signing module unloaded");
        }
        self.state = ServiceState::Unloaded;
    }
}

impl Default for NativeInvoker {
    fn default() -> Self {
        Self::new()
    }
}
