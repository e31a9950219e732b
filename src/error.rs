//! Construction-time errors
//!
//! The per-frame path never fails; these only surface when building
//! physics parameters, settings or a session.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    /// Physics constants that would feed NaN or infinity into gameplay
    #[error("degenerate physics configuration: {0}")]
    DegeneratePhysics(&'static str),

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("settings json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
