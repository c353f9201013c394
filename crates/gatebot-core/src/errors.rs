use crate::ports::InviteError;

/// Core error type.
///
/// Adapter crates map their specific errors into this type so handlers can
/// pick a user-facing message consistently (state conflict vs. transport vs.
/// unknown).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store error: {0}")]
    Store(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Invite(#[from] InviteError),
}

pub type Result<T> = std::result::Result<T, Error>;
