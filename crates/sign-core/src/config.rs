//! Configuration file model.
//!
//! ```toml
//! [sign_service]
//! host = "127.0.0.1"
//! port = 8080
//! libs = ["./QQApp/libcrbase.so", "./QQApp/libbase.so"]
//! module_path = "./QQApp/wrapper.node"
//! offset = "0x5ADE220"
//! max_data_length = 1048576
//! timeout_ms = 5000
//!
//! [logging]
//! level = "Information"
//! ```
//!
//! Every field has a default, so an empty file is a valid (test mode) config.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app_info::DEFAULT_SEARCH_PATHS;
use crate::error::Result;
use crate::native::InvokerSettings;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub sign_service: SignServiceConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignServiceConfig {
    pub host: String,
    pub port: u16,
    /// Dependency libraries loaded before the module (empty = test mode)
    pub libs: Vec<String>,
    pub module_path: String,
    /// Name fragment to look for in the loaded-object list
    pub module_name: Option<String>,
    /// Offset of the sign function, decimal or `0x` hex
    pub offset: String,
    /// Largest accepted decoded input, in bytes
    pub max_data_length: usize,
    pub timeout_ms: u64,
    /// Where to look for the application descriptor, in order
    pub app_info_paths: Vec<PathBuf>,
}

impl Default for SignServiceConfig {
    fn default() -> Self {
        let invoker = InvokerSettings::default();
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            libs: invoker.libraries,
            module_path: invoker.module_path,
            module_name: invoker.module_name,
            offset: invoker.offset,
            max_data_length: invoker.max_input_len,
            timeout_ms: invoker.timeout_ms,
            app_info_paths: DEFAULT_SEARCH_PATHS.iter().map(PathBuf::from).collect(),
        }
    }
}

impl SignServiceConfig {
    pub fn invoker_settings(&self) -> InvokerSettings {
        InvokerSettings {
            libraries: self.libs.clone(),
            module_path: self.module_path.clone(),
            module_name: self.module_name.clone(),
            offset: self.offset.clone(),
            max_input_len: self.max_data_length,
            timeout_ms: self.timeout_ms,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `trace`..`error`, or `Trace`/`Debug`/`Information`/`Warning`/`Error`/`Critical`/`None`
    pub level: String,
    pub enable_file_logging: bool,
    pub log_file_path: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "Information".to_string(),
            enable_file_logging: false,
            log_file_path: PathBuf::from("logs/signserver.log"),
        }
    }
}

impl AppSettings {
    /// Load settings from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
