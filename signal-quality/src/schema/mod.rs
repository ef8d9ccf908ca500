//! Schema repository and validator.
//!
//! Documents are registered by `$id` and cross-reference each other with
//! relative `$ref`s. One validator is compiled per schema generation; the
//! payload's `schema` literal selects which one runs.

pub mod error;
pub mod repository;
pub mod validator;

pub use error::SchemaError;
pub use repository::{root_id, SchemaRepository};
pub use validator::{SchemaValidator, ValidationIssue, ValidationReport};
