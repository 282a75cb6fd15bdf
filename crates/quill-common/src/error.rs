//! Error types for quill - checking service and configuration failures

use std::path::PathBuf;

use miette::Diagnostic;

/// A check that did not produce a result.
#[derive(thiserror::Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum CheckError {
    /// Transport failure: connection refused, timeout, TLS, ...
    #[error("request to checking service failed: {0}")]
    #[diagnostic(
        code(quill::check::http),
        help("is the checking service running at the configured endpoint?")
    )]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("checking service answered {status}: {message}")]
    #[diagnostic(code(quill::check::service))]
    Service { status: u16, message: String },

    /// The response body was not a check result.
    #[error("could not decode check response: {0}")]
    #[diagnostic(code(quill::check::decode))]
    Decode(#[from] serde_json::Error),

    #[error("invalid checking service endpoint '{0}'")]
    #[diagnostic(
        code(quill::config::endpoint),
        help("expected an absolute http:// or https:// URL, e.g. http://127.0.0.1:5000/check")
    )]
    InvalidEndpoint(String),

    /// Rejected locally; the service would answer 413.
    #[error("text is {chars} characters long, the checking service accepts at most {max}")]
    #[diagnostic(code(quill::check::too_long), help("check the text in smaller pieces"))]
    TooLong { chars: usize, max: usize },
}

impl CheckError {
    /// Whether retrying the same request later could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            CheckError::Http(_) => true,
            CheckError::Service { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Configuration loading/saving errors
#[derive(thiserror::Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("could not access config file {path}: {source}")]
    #[diagnostic(code(quill::config::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML config: {0}")]
    #[diagnostic(code(quill::config::toml))]
    Toml(#[from] toml::de::Error),

    #[error("could not write TOML config: {0}")]
    #[diagnostic(code(quill::config::toml))]
    TomlWrite(#[from] toml::ser::Error),

    #[error("invalid JSON config: {0}")]
    #[diagnostic(code(quill::config::json))]
    Json(#[from] serde_json::Error),

    #[error("unsupported config format: {0}")]
    #[diagnostic(
        code(quill::config::format),
        help("config files must end in .toml or .json")
    )]
    UnsupportedFormat(PathBuf),
}
