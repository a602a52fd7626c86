use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Catalog service not found: {0}")]
    ServiceNotFound(uuid::Uuid),

    #[error("Service item not found: {0}")]
    ItemNotFound(uuid::Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type CatalogResult<T> = Result<T, CatalogError>;
