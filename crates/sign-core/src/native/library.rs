//! Shared library loading.
//!
//! Dependency libraries are opened with global symbol visibility and kept
//! for the lifetime of the process. The entry module is the only handle we
//! own and close.

use crate::error::{Error, Result};

#[cfg(unix)]
mod imp {
    use libloading::os::unix::{Library, RTLD_GLOBAL, RTLD_LAZY, RTLD_LOCAL};
    use tracing::debug;

    use crate::error::{Error, Result};

    /// Owned handle to the module that contains the sign function.
    ///
    /// Closing happens exactly once, when the handle is dropped.
    pub struct ModuleHandle {
        path: String,
        _library: Library,
    }

    impl ModuleHandle {
        pub fn path(&self) -> &str {
            &self.path
        }
    }

    impl Drop for ModuleHandle {
        fn drop(&mut self) {
            debug!("Releasing module handle for {}", self.path);
        }
    }

    fn open(path: &str, flags: i32) -> Result<Library> {
        // SAFETY: loading runs the library's initializers. The configured
        // libraries are trusted to be loadable into this process.
        unsafe { Library::open(Some(path), flags) }.map_err(|e| Error::LibraryLoad {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    pub fn load_dependency(path: &str) -> Result<()> {
        let library = open(path, RTLD_LAZY | RTLD_GLOBAL)?;
        // Never closed: later libraries and the entry module may bind to its symbols.
        let _ = library.into_raw();
        debug!("Loaded library: {}", path);
        Ok(())
    }

    pub fn open_module(path: &str) -> Result<ModuleHandle> {
        let library = open(path, RTLD_LAZY | RTLD_LOCAL)?;
        debug!("Loaded entry module: {}", path);
        Ok(ModuleHandle {
            path: path.to_string(),
            _library: library,
        })
    }
}

#[cfg(not(unix))]
mod imp {
    use crate::error::{Error, Result};

    pub struct ModuleHandle {
        path: String,
    }

    impl ModuleHandle {
        pub fn path(&self) -> &str {
            &self.path
        }
    }

    fn unsupported(path: &str) -> Error {
        Error::LibraryLoad {
            path: path.to_string(),
            message: "dynamic loading is only supported on Unix".to_string(),
        }
    }

    pub fn load_dependency(path: &str) -> Result<()> {
        Err(unsupported(path))
    }

    pub fn open_module(path: &str) -> Result<ModuleHandle> {
        Err(unsupported(path))
    }
}

pub use imp::ModuleHandle;

/// Load every dependency in order, stopping at the first failure.
///
/// Libraries loaded before the failure stay loaded.
pub fn load_dependencies<S: AsRef<str>>(paths: &[S]) -> Result<usize> {
    for path in paths {
        imp::load_dependency(path.as_ref())?;
    }
    Ok(paths.len())
}

/// Open the module containing the sign function.
pub fn open_module(path: &str) -> Result<ModuleHandle> {
    if path.is_empty() {
        return Err(Error::Configuration("module path is empty".to_string()));
    }
    imp::open_module(path)
}
