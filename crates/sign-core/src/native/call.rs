//! The raw foreign call into the sign function.

use std::ffi::{CString, c_char, c_int};

use tracing::debug;

use super::layout::{OUTPUT_SIZE, SignOutput};
use super::offset::EntryPoint;
use crate::error::{Error, Result};

/// C ABI of the native sign function:
/// `int sign(const char* cmd, const uint8_t* src, int src_len, int seq, uint8_t* out)`
pub type RawSignFn = unsafe extern "C" fn(
    cmd: *const c_char,
    src: *const u8,
    src_len: c_int,
    seq: c_int,
    out: *mut u8,
) -> c_int;

/// A callable sign function at a validated entry point.
#[derive(Debug, Clone, Copy)]
pub struct SignFunction {
    entry: EntryPoint,
    func: RawSignFn,
}

impl SignFunction {
    /// Bind the function at `entry`.
    ///
    /// # Safety
    ///
    /// `entry` must be the address of a function with the [`RawSignFn`] ABI
    /// that writes at most [`OUTPUT_SIZE`] bytes to `out`, and the module
    /// containing it must stay loaded for as long as this value is used.
    pub unsafe fn from_entry_point(entry: EntryPoint) -> Result<Self> {
        let address = usize::try_from(entry.address()).map_err(|_| Error::OutOfRange {
            address: entry.address(),
        })?;
        // SAFETY: the address is non-null (>= 0x1000) and the caller vouches
        // for the signature.
        let func = unsafe { std::mem::transmute::<usize, RawSignFn>(address) };
        Ok(Self { entry, func })
    }

    /// Bind an in-process function, used to stand in for a module.
    ///
    /// # Safety
    ///
    /// `func` must honour the same output-buffer contract as a module
    /// function bound through [`SignFunction::from_entry_point`].
    pub unsafe fn from_fn(func: RawSignFn) -> Result<Self> {
        let entry = super::offset::compute_entry_point(0, func as usize as u64)?;
        Ok(Self { entry, func })
    }

    pub fn entry_point(&self) -> EntryPoint {
        self.entry
    }

    /// Call the function and decode its output buffer.
    pub fn call(&self, cmd: &str, src: &[u8], seq: i32) -> Result<SignOutput> {
        let cmd = CString::new(cmd)
            .map_err(|_| Error::Validation("cmd must not contain NUL bytes".to_string()))?;
        let src_len = c_int::try_from(src.len()).map_err(|_| Error::PayloadTooLarge {
            len: src.len(),
            max: c_int::MAX as usize,
        })?;
        let mut output = Box::new([0u8; OUTPUT_SIZE]);

        // SAFETY: `cmd` is NUL-terminated, `src` is valid for `src_len` bytes,
        // `output` is OUTPUT_SIZE writable bytes; all three outlive the call.
        let code = unsafe {
            (self.func)(
                cmd.as_ptr(),
                src.as_ptr(),
                src_len,
                seq,
                output.as_mut_ptr(),
            )
        };

        if code != 0 {
            return Err(Error::NativeCall(code));
        }

        let result = SignOutput::parse(&output);
        debug!(
            token_len = result.token.len(),
            extra_len = result.extra.len(),
            sign_len = result.sign.len(),
            "Sign function call succeeded"
        );
        Ok(result)
    }
}
