//! Crate-level error type

use crate::featline::config::ConfigError;
use crate::featline::diagnostics::StrictParseError;
use crate::featline::label::LabelError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Strict(#[from] StrictParseError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("label error: {0}")]
    Label(#[from] LabelError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("settings error: {0}")]
    Settings(#[from] featline_config::SettingsError),
}
