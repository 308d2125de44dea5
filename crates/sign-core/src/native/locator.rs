//! Lookup of shared-object load addresses in the current process.

use tracing::{debug, error};

use crate::error::{Error, Result};

/// One entry of the process's loaded-object list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedModule {
    /// Path as reported by the dynamic loader (empty for the main executable)
    pub path: String,
    /// Load bias of the object
    pub base: u64,
}

/// Enumerate every shared object mapped into the process.
#[cfg(target_os = "linux")]
pub fn loaded_modules() -> Result<Vec<LoadedModule>> {
    use std::ffi::{CStr, c_int, c_void};

    unsafe extern "C" fn collect(
        info: *mut libc::dl_phdr_info,
        _size: usize,
        data: *mut c_void,
    ) -> c_int {
        // SAFETY: `data` is the `&mut Vec<LoadedModule>` passed below and
        // outlives the iteration; `info` is valid for the callback's duration.
        let (modules, info) = unsafe { (&mut *(data as *mut Vec<LoadedModule>), &*info) };

        let path = if info.dlpi_name.is_null() {
            String::new()
        } else {
            // SAFETY: the loader hands out NUL-terminated names.
            unsafe { CStr::from_ptr(info.dlpi_name) }
                .to_string_lossy()
                .into_owned()
        };

        modules.push(LoadedModule {
            path,
            base: info.dlpi_addr as u64,
        });
        0
    }

    let mut modules: Vec<LoadedModule> = Vec::new();
    // SAFETY: the callback only touches `modules` through the data pointer
    // and never unwinds.
    unsafe {
        libc::dl_iterate_phdr(Some(collect), &mut modules as *mut _ as *mut c_void);
    }

    Ok(modules)
}

#[cfg(not(target_os = "linux"))]
pub fn loaded_modules() -> Result<Vec<LoadedModule>> {
    Err(Error::ModuleNotFound(
        "module enumeration is only supported on Linux".to_string(),
    ))
}

/// Pick the first module whose path contains `fragment` (case-sensitive).
///
/// Unnamed entries and entries without a load bias are skipped.
pub fn select_base(modules: &[LoadedModule], fragment: &str) -> Option<u64> {
    modules
        .iter()
        .filter(|m| !m.path.is_empty() && m.base != 0)
        .find(|m| m.path.contains(fragment))
        .map(|m| m.base)
}

/// Find the load base of the module whose path contains `fragment`.
pub fn find_base_address(fragment: &str) -> Result<u64> {
    let modules = loaded_modules().map_err(|e| {
        error!("Failed to enumerate loaded modules: {}", e);
        Error::ModuleNotFound(fragment.to_string())
    })?;

    match select_base(&modules, fragment) {
        Some(base) => {
            debug!("Found module {} at base 0x{:016X}", fragment, base);
            Ok(base)
        }
        None => {
            error!(
                "Module {} not found among {} loaded objects",
                fragment,
                modules.len()
            );
            Err(Error::ModuleNotFound(fragment.to_string()))
        }
    }
}
