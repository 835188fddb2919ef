use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    /// The page had no markup to parse. Missing fields are never an error.
    #[error("empty document from {0}")]
    EmptyDocument(String),

    #[error("invalid selector for field '{field}': {reason}")]
    InvalidSelector { field: &'static str, reason: String },
}
