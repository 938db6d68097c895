use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Order not found")]
    NotFound,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// A stored line references a service or customer that no longer resolves.
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),
    #[error("Internal error: {0}")]
    Internal(String),
}
