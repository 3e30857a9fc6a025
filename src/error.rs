use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Unsupported database driver: {0}: check your connection settings")]
    UnsupportedDriver(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Could not find database file: {0}")]
    FileNotFound(PathBuf),

    #[error("{0} is not implemented for this dialect")]
    NotImplemented(&'static str),

    #[error("Malformed query: {0}")]
    MalformedQuery(String),

    #[error("Unable to fetch next sequence ID without a sequence name")]
    MissingSequenceName,

    #[error("There is no transaction started")]
    NoActiveTransaction,

    #[error("Schema introspection failed for {context}: {source}")]
    Introspection {
        context: String,
        #[source]
        source: Box<AdapterError>,
    },

    #[error("Query returned no rows: {0}")]
    NoRows(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("MSSQL error: {0}")]
    Mssql(#[from] tiberius::error::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AdapterError {
    /// Wrap a catalog-query failure so it aborts the schema build with the
    /// table (or phase) it happened in.
    pub fn introspection(context: impl Into<String>, source: impl Into<AdapterError>) -> Self {
        AdapterError::Introspection {
            context: context.into(),
            source: Box::new(source.into()),
        }
    }
}
