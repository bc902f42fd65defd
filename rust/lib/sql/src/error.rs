use thiserror::Error;

#[derive(Error, Debug)]
pub enum SQLError {
    #[error("query error: {0}")]
    Query(String),

    #[error("execution error: {0}")]
    Execution(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("transaction error: {0}")]
    Transaction(String),
}

impl SQLError {
    /// Whether the underlying failure was a UNIQUE constraint violation.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            SQLError::Query(msg) | SQLError::Execution(msg) => msg.contains("UNIQUE constraint"),
            _ => false,
        }
    }

    /// Whether the underlying failure was a FOREIGN KEY constraint violation.
    pub fn is_foreign_key_violation(&self) -> bool {
        match self {
            SQLError::Query(msg) | SQLError::Execution(msg) => {
                msg.contains("FOREIGN KEY constraint")
            }
            _ => false,
        }
    }
}
