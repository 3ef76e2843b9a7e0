//! Plant catalog - the fixed table of plants the viewer can place
//!
//! The catalog is configuration data: it is parsed once at startup (from the
//! compiled-in `plants.toml` or an override file) and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Catalog shipped with the viewer
const BUILTIN_CATALOG: &str = include_str!("../plants.toml");

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read plant catalog: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse plant catalog: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Duplicate plant key: {0}")]
    DuplicateKey(String),
    #[error("Plant entry '{0}' has an empty key")]
    EmptyKey(String),
}

/// A single plant in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlantEntry {
    /// Unique key; also names the model asset (e.g., "tulsi" -> models/tulsi.glb)
    pub key: String,
    /// Human-readable name shown in the info panel
    pub name: String,
    /// Descriptive text shown under the name
    pub description: String,
}

/// On-disk layout of a catalog file
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default = "default_version")]
    version: String,
    #[serde(default)]
    plant: Vec<PlantEntry>,
}

fn default_version() -> String {
    "1.0".to_string()
}

/// Immutable key -> plant lookup table
#[derive(Debug, Clone, Default)]
pub struct PlantCatalog {
    entries: Vec<PlantEntry>,
    index: HashMap<String, usize>,
}

impl PlantCatalog {
    /// The catalog compiled into the binary
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_toml(BUILTIN_CATALOG)
    }

    /// Load a catalog from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(content)?;
        Self::from_entries(file.plant)
    }

    /// Load a catalog from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Build a catalog, rejecting empty or duplicate keys
    pub fn from_entries(entries: Vec<PlantEntry>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if entry.key.trim().is_empty() {
                return Err(CatalogError::EmptyKey(entry.name.clone()));
            }
            if index.insert(entry.key.clone(), i).is_some() {
                return Err(CatalogError::DuplicateKey(entry.key.clone()));
            }
        }
        Ok(Self { entries, index })
    }

    /// Look up a plant by key (exact, case-sensitive match)
    pub fn get(&self, key: &str) -> Option<&PlantEntry> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    /// Whether the key names a plant in this catalog
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// All entries, in file order
    pub fn entries(&self) -> &[PlantEntry] {
        &self.entries
    }

    /// All keys, in file order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
