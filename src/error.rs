use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the SQLite storage layer.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to open database at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to create table {table}: {source}")]
    Schema {
        table: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("query error: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("failed to close database: {0}")]
    Close(#[source] rusqlite::Error),
}

/// Errors that end the interactive menu loop.
#[derive(Error, Debug)]
pub enum MenuError {
    #[error("invalid number: {input:?}")]
    InvalidNumber {
        input: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}
