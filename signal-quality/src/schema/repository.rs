use super::error::SchemaError;
use common::SchemaGeneration;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

const SCHEMA_SUFFIX: &str = ".schema.json";

const BUILTIN_DOCUMENTS: &[(&str, &str)] = &[
    ("usignal/v1/core", include_str!("../../schemas/usignal/v1/core.schema.json")),
    ("usignal/v1/lenses/equity", include_str!("../../schemas/usignal/v1/lenses/equity.lens.schema.json")),
    ("usignal/v1/lenses/strategy", include_str!("../../schemas/usignal/v1/lenses/strategy.lens.schema.json")),
    ("usignal/v1/lenses/macro", include_str!("../../schemas/usignal/v1/lenses/macro.lens.schema.json")),
    ("usignal/v1/lenses/onchain", include_str!("../../schemas/usignal/v1/lenses/onchain.lens.schema.json")),
    ("usignal/v1/index", include_str!("../../schemas/usignal/v1/index.schema.json")),
    ("usignal/v1_1/core", include_str!("../../schemas/usignal/v1_1/core.schema.json")),
    ("usignal/v1_1/index", include_str!("../../schemas/usignal/v1_1/index.schema.json")),
    ("cpj/v0_1/core", include_str!("../../schemas/cpj/v0_1/core.schema.json")),
    ("cpj/v0_1/index", include_str!("../../schemas/cpj/v0_1/index.schema.json")),
];

/// `$id` of the document a generation's payloads are validated against
pub fn root_id(generation: SchemaGeneration) -> &'static str {
    match generation {
        SchemaGeneration::UsignalV1 => "https://afi.local/schemas/usignal/v1/index.schema.json",
        SchemaGeneration::UsignalV1_1 => "https://afi.local/schemas/usignal/v1_1/index.schema.json",
        SchemaGeneration::CpjV0_1 => "https://afi.local/schemas/cpj/v0_1/index.schema.json",
    }
}

/// Registry of schema documents keyed by `$id`
#[derive(Debug, Clone, Default)]
pub struct SchemaRepository {
    documents: BTreeMap<String, Value>,
}

impl SchemaRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// The documents shipped with this crate
    pub fn builtin() -> Result<Self, SchemaError> {
        let mut repo = Self::new();
        for (name, text) in BUILTIN_DOCUMENTS {
            let document: Value = serde_json::from_str(text).map_err(|e| SchemaError::InvalidDocument {
                id: (*name).to_string(),
                message: e.to_string(),
            })?;
            repo.add_document(document, name)?;
        }
        debug!(documents = repo.len(), "built-in schema repository loaded");
        Ok(repo)
    }

    /// Load every `*.schema.json` under `dir`, recursively, in path order
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let mut files = Vec::new();
        collect_schema_files(dir.as_ref(), &mut files)?;
        files.sort();

        let mut repo = Self::new();
        for path in &files {
            let text = fs::read_to_string(path).map_err(|source| SchemaError::Io {
                path: path.clone(),
                source,
            })?;
            let origin = path.display().to_string();
            let document: Value = serde_json::from_str(&text).map_err(|e| SchemaError::InvalidDocument {
                id: origin.clone(),
                message: e.to_string(),
            })?;
            repo.add_document(document, &origin)?;
        }

        info!(dir = %dir.as_ref().display(), documents = repo.len(), "schema repository loaded");
        Ok(repo)
    }

    /// Register a document under an explicit id
    pub fn add_schema(&mut self, id: impl Into<String>, document: Value) -> Result<(), SchemaError> {
        let id = id.into();
        if !document.is_object() {
            return Err(SchemaError::NotAnObject { id });
        }
        if self.documents.contains_key(&id) {
            return Err(SchemaError::DuplicateId { id });
        }
        debug!(id = %id, "schema registered");
        self.documents.insert(id, document);
        Ok(())
    }

    /// Register a document under its own `$id`
    pub fn add_document(&mut self, document: Value, origin: &str) -> Result<(), SchemaError> {
        if !document.is_object() {
            return Err(SchemaError::NotAnObject { id: origin.to_string() });
        }
        let id = document
            .get("$id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| SchemaError::MissingId { origin: origin.to_string() })?;
        self.add_schema(id, document)
    }

    pub fn get_schema(&self, id: &str) -> Option<&Value> {
        self.documents.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub(crate) fn documents(&self) -> &BTreeMap<String, Value> {
        &self.documents
    }

    pub(crate) fn require(&self, id: &str) -> Result<&Value, SchemaError> {
        self.get_schema(id)
            .ok_or_else(|| SchemaError::UnknownSchema { id: id.to_string() })
    }
}

fn collect_schema_files(dir: &Path, files: &mut Vec<std::path::PathBuf>) -> Result<(), SchemaError> {
    let entries = fs::read_dir(dir).map_err(|source| SchemaError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| SchemaError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            collect_schema_files(&path, files)?;
        } else if path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(SCHEMA_SUFFIX))
        {
            files.push(path);
        }
    }
    Ok(())
}
