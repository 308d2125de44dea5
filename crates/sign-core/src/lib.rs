//! # sign-core
//!
//! Core library for the native signing host.
//!
//! This crate provides:
//! - Hex encoding of request payloads and results
//! - Dynamic loading of the signing module and its dependencies
//! - Module base lookup and entry-point resolution from a configured offset
//! - The foreign call and decoding of its fixed-layout output
//! - A request-level facade with validation and a test-mode fallback
//! - Configuration and lifecycle hooks for the hosting process

pub mod app_info;
pub mod config;
pub mod error;
pub mod hex;
pub mod lifecycle;
pub mod native;
pub mod service;

pub use app_info::{AppInfo, AppInfoSource};
pub use config::{AppSettings, LoggingConfig, SignServiceConfig};
pub use error::{Error, Result};
pub use lifecycle::Lifecycle;
pub use native::{
    EntryPoint, InvokerSettings, LoadedModule, NativeInvoker, ServiceState, SignBackend,
    SignOutput, compute_entry_point, find_base_address, loaded_modules, parse_offset,
};
pub use service::{MAX_SRC_HEX_LEN, SignRequest, SignResponse, SignService, ValueResponse};
