use common::SchemaGeneration;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while assembling or compiling schema documents.
///
/// These only happen at startup; validating a payload never errors.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("schema document {id} is not valid JSON: {message}")]
    InvalidDocument { id: String, message: String },

    #[error("schema document {id} is not a JSON object")]
    NotAnObject { id: String },

    #[error("schema document from {origin} has no $id")]
    MissingId { origin: String },

    #[error("schema id already registered: {id}")]
    DuplicateId { id: String },

    #[error("unknown schema id: {id}")]
    UnknownSchema { id: String },

    #[error("failed to compile {generation} validator: {message}")]
    Compile {
        generation: SchemaGeneration,
        message: String,
    },

    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
