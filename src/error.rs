// src/error.rs

use crate::repository::FetchFailure;
use thiserror::Error;

/// Core error types for Cyweb
#[derive(Error, Debug)]
pub enum Error {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored JSON could not be read or written
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Database or client initialization error
    #[error("Initialization failed: {0}")]
    InitError(String),

    /// Database not found
    #[error("Database not found at path: {0}")]
    DatabaseNotFound(String),

    /// User input rejected before any fetch or write happened
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Every candidate index path of a repository failed
    #[error(transparent)]
    Fetch(#[from] FetchFailure),

    /// Lookup of a repository or package that isn't there
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Result type alias using Cyweb's Error type
pub type Result<T> = std::result::Result<T, Error>;
