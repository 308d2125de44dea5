//! Application descriptor (`appinfo.json`) lookup.
//!
//! The descriptor is an external JSON document. Only `Os` and
//! `CurrentVersion` are consulted, matched case-insensitively. A missing or
//! malformed descriptor never fails a signing call; fixed defaults are used.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Result;

/// Default descriptor locations, searched in order
pub const DEFAULT_SEARCH_PATHS: [&str; 2] = ["./appinfo.json", "./QQApp/appinfo.json"];

pub const DEFAULT_PLATFORM: &str = "Linux";
pub const DEFAULT_VERSION: &str = "3.2.21-42086";

/// Platform/version pair reported with every signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppInfo {
    pub platform: String,
    pub version: String,
}

impl Default for AppInfo {
    fn default() -> Self {
        Self {
            platform: DEFAULT_PLATFORM.to_string(),
            version: DEFAULT_VERSION.to_string(),
        }
    }
}

impl AppInfo {
    /// Pull `Os`/`CurrentVersion` out of a descriptor document.
    ///
    /// Keys that are absent or not strings keep their defaults; a `null`
    /// value counts as absent.
    pub fn from_json(document: &Value) -> Self {
        let mut info = Self::default();
        let Some(object) = document.as_object() else {
            return info;
        };

        for (key, value) in object {
            let Some(text) = value.as_str() else {
                continue;
            };
            if key.eq_ignore_ascii_case("Os") {
                info.platform = text.to_string();
            } else if key.eq_ignore_ascii_case("CurrentVersion") {
                info.version = text.to_string();
            }
        }
        info
    }
}

/// Where to find the descriptor
#[derive(Debug, Clone)]
pub struct AppInfoSource {
    paths: Vec<PathBuf>,
}

impl Default for AppInfoSource {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_PATHS.iter().map(PathBuf::from).collect())
    }
}

impl AppInfoSource {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    /// First configured path that exists
    pub fn locate(&self) -> Option<&Path> {
        self.paths
            .iter()
            .map(PathBuf::as_path)
            .find(|p| p.is_file())
    }

    /// Read the whole descriptor. `Ok(None)` if no file exists.
    pub fn read_document(&self) -> Result<Option<Value>> {
        let Some(path) = self.locate() else {
            return Ok(None);
        };
        let content = fs::read_to_string(path)?;
        let document = serde_json::from_str(&content)?;
        debug!("Read application descriptor from {}", path.display());
        Ok(Some(document))
    }

    /// Platform/version for a response, falling back to defaults on any problem.
    pub fn app_info(&self) -> AppInfo {
        match self.read_document() {
            Ok(Some(document)) => AppInfo::from_json(&document),
            Ok(None) => {
                warn!("appinfo.json not found, using default platform/version");
                AppInfo::default()
            }
            Err(e) => {
                warn!("Failed to read appinfo.json ({}), using default platform/version", e);
                AppInfo::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_from_json_case_insensitive() {
        let info = AppInfo::from_json(&json!({
            "os": "Windows",
            "CURRENTVERSION": "9.9.9-12345",
            "AppId": 1600001615
        }));
        assert_eq!(info.platform, "Windows");
        assert_eq!(info.version, "9.9.9-12345");
    }

    #[test]
    fn test_from_json_partial_and_wrong_types() {
        let info = AppInfo::from_json(&json!({ "Os": "Mac", "CurrentVersion": 42 }));
        assert_eq!(info.platform, "Mac");
        assert_eq!(info.version, DEFAULT_VERSION);

        let info = AppInfo::from_json(&json!({ "Os": null, "CurrentVersion": null }));
        assert_eq!(info, AppInfo::default());

        let info = AppInfo::from_json(&json!(["not", "an", "object"]));
        assert_eq!(info, AppInfo::default());
    }

    #[test]
    fn test_source_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let source = AppInfoSource::new(vec![dir.path().join("appinfo.json")]);
        assert!(source.locate().is_none());
        assert!(source.read_document().unwrap().is_none());
        assert_eq!(source.app_info(), AppInfo::default());
    }

    #[test]
    fn test_source_search_order() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("appinfo.json");
        let second = dir.path().join("QQApp").join("appinfo.json");
        fs::create_dir_all(second.parent().unwrap()).unwrap();
        fs::write(&second, r#"{"Os":"Linux","CurrentVersion":"3.2.19-39038"}"#).unwrap();

        let source = AppInfoSource::new(vec![first.clone(), second.clone()]);
        assert_eq!(source.locate(), Some(second.as_path()));
        assert_eq!(source.app_info().version, "3.2.19-39038");

        fs::write(&first, r#"{"Os":"Windows","CurrentVersion":"9.9.12-26000"}"#).unwrap();
        assert_eq!(source.locate(), Some(first.as_path()));
        assert_eq!(source.app_info().platform, "Windows");
    }

    #[test]
    fn test_source_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("appinfo.json");
        fs::write(&path, "{ not json").unwrap();

        let source = AppInfoSource::new(vec![path]);
        assert!(source.read_document().is_err());
        assert_eq!(source.app_info(), AppInfo::default());
    }
}
