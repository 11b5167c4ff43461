use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortError {
    #[error("not found")]
    NotFound,
    #[error("uniqueness conflict: {0}")]
    Conflict(String),
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("connection error: {0}")]
    Connection(String),
}
