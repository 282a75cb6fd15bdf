//! Shared plumbing for quill: the checking service client, configuration,
//! error types and tracing setup.

pub mod client;
pub mod config;
pub mod error;
#[cfg(not(all(target_family = "wasm", target_os = "unknown")))]
pub mod telemetry;

pub use crate::client::CheckClient;
pub use crate::config::{ConfigFile, DEFAULT_ENDPOINT, QuillConfig};
pub use crate::error::{CheckError, ConfigError};
