use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Invalid hex encoding: {0}")]
    InvalidEncoding(String),

    #[error("Invalid offset: {0}")]
    InvalidOffset(String),

    #[error("Arithmetic overflow computing entry point: base {base:#x} + offset {offset:#x}")]
    ArithmeticOverflow { base: u64, offset: u64 },

    #[error("Entry point {address:#x} is outside the plausible user-space range")]
    OutOfRange { address: u64 },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to load library {path}: {message}")]
    LibraryLoad { path: String, message: String },

    #[error("Module not found in process: {0}")]
    ModuleNotFound(String),

    #[error("Signing service is not initialized")]
    NotInitialized,

    #[error("Input too large: {len} bytes (max: {max})")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("Native sign function returned error code {0}")]
    NativeCall(i32),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is a "file not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }

    /// Errors caused by the shape of a signing request.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::InvalidEncoding(_) | Error::PayloadTooLarge { .. }
        )
    }

    /// The caller reached the service before it finished starting.
    pub fn is_not_ready(&self) -> bool {
        matches!(self, Error::NotInitialized)
    }

    /// Errors that must abort process startup.
    pub fn is_fatal_to_startup(&self) -> bool {
        matches!(
            self,
            Error::Configuration(_)
                | Error::LibraryLoad { .. }
                | Error::ModuleNotFound(_)
                | Error::InvalidOffset(_)
                | Error::ArithmeticOverflow { .. }
                | Error::OutOfRange { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_not_found() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::Io(io_err);
        assert!(err.is_not_found());

        let other_io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err2 = Error::Io(other_io_err);
        assert!(!err2.is_not_found());
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::Validation("cmd".into()).is_client_error());
        assert!(Error::PayloadTooLarge { len: 2, max: 1 }.is_client_error());
        assert!(!Error::NativeCall(-1).is_client_error());

        assert!(Error::NotInitialized.is_not_ready());
        assert!(!Error::NotInitialized.is_client_error());

        assert!(Error::ModuleNotFound("wrapper.node".into()).is_fatal_to_startup());
        assert!(Error::OutOfRange { address: 0x10 }.is_fatal_to_startup());
        assert!(!Error::NativeCall(3).is_fatal_to_startup());
    }

    #[test]
    fn test_error_messages_carry_context() {
        let err = Error::LibraryLoad {
            path: "./libs/libfoo.so".into(),
            message: "cannot open shared object file".into(),
        };
        let text = err.to_string();
        assert!(text.contains("./libs/libfoo.so"));
        assert!(text.contains("cannot open shared object file"));

        let err = Error::ArithmeticOverflow {
            base: u64::MAX,
            offset: 1,
        };
        assert!(err.to_string().contains("0xffffffffffffffff"));
    }
}
