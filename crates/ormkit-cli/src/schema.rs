//! Schema files.

use ormkit_core::TableDef;
use serde::Deserialize;
use std::path::Path;

/// A JSON schema file: `{"tables": [...]}`.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaFile {
    pub tables: Vec<TableDef>,
}

impl SchemaFile {
    /// Read and validate a schema file.
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
        Self::parse(&content)
    }

    /// Parse and validate schema JSON.
    pub fn parse(content: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let schema: SchemaFile = serde_json::from_str(content)?;
        for table in &schema.tables {
            table.validate()?;
        }
        Ok(schema)
    }
}
