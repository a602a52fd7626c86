use thiserror::Error;

#[derive(Error, Debug)]
pub enum VitalsError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Vital signs record not found: {0}")]
    RecordNotFound(uuid::Uuid),

    #[error("Vital alert not found: {0}")]
    AlertNotFound(uuid::Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type VitalsResult<T> = Result<T, VitalsError>;
