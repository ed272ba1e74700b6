use thiserror::Error;

/// Errors returned by fallible Settee operations.
///
/// Comparing documents never fails; these come from parsing JSON payloads
/// and from setters that only accept one JSON shape.
#[derive(Debug, Error)]
pub enum SetteeError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SetteeError>;
