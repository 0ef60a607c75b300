use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum SteadError {
    #[error("failed to load settings from {path}")]
    ConfigLoad {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings from {path}: {message}")]
    ConfigParse { path: String, message: String },

    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("missing required configuration key '{key}'")]
    MissingSection { key: &'static str },

    #[error("failed to read key file {path}")]
    KeyRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}")]
    ConfigWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("init cancelled")]
    InitCancelled,
}
