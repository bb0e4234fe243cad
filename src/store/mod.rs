use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::SondoError;

/// One learned function category and the clue parameters that worked for it
/// on previous runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub category: String,
    #[serde(default)]
    pub clues: Vec<String>,
}

/// Ordered on-disk registry of function categories, grouped by coarse-category
/// prefix. The whole file is rewritten on every insert; records never move
/// once placed.
#[derive(Debug)]
pub struct CategoryStore {
    path: PathBuf,
    records: Vec<CategoryRecord>,
}

impl CategoryStore {
    /// Load the registry from `path`. A missing file is a normal first run; an
    /// unreadable or malformed one is logged and treated as empty.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Vec<CategoryRecord>>(&raw) {
                Ok(records) => records,
                Err(e) => {
                    warn!("category registry {} is malformed, starting empty: {}", path.display(), e);
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!("cannot read category registry {}, starting empty: {}", path.display(), e);
                Vec::new()
            }
        };
        debug!("category registry loaded with {} records", records.len());
        Self { path, records }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn exists(&self, category: &str) -> bool {
        self.records.iter().any(|r| r.category == category)
    }

    /// Clue parameters recorded for an exact category, if any.
    pub fn clues(&self, category: &str) -> Option<&[String]> {
        self.records
            .iter()
            .find(|r| r.category == category)
            .map(|r| r.clues.as_slice())
    }

    /// Category names sharing a coarse prefix, in registry order. An empty
    /// prefix matches nothing.
    pub fn candidates_for_prefix(&self, prefix: &str) -> Vec<String> {
        if prefix.is_empty() {
            return Vec::new();
        }
        self.records
            .iter()
            .filter(|r| r.category.starts_with(prefix))
            .map(|r| r.category.clone())
            .collect()
    }

    /// Insert a newly observed category with an empty clue list, placed after
    /// the last record sharing `prefix` so prefix groups stay contiguous.
    /// Returns false when the category was already present. The in-memory
    /// state is authoritative; a failed flush is logged and ignored.
    pub fn insert(&mut self, category: &str, prefix: &str) -> bool {
        if self.exists(category) {
            return false;
        }
        let record = CategoryRecord {
            category: category.to_string(),
            clues: Vec::new(),
        };
        if prefix.is_empty() {
            self.records.push(record);
        } else {
            let mut index = self.records.len();
            for (i, existing) in self.records.iter().enumerate() {
                if existing.category.starts_with(prefix) {
                    index = i + 1;
                }
            }
            self.records.insert(index, record);
        }
        if let Err(e) = self.flush() {
            warn!("cannot persist category registry {}: {}", self.path.display(), e);
        }
        true
    }

    fn flush(&self) -> Result<(), SondoError> {
        let body = serde_json::to_string_pretty(&self.records)?;
        fs::write(&self.path, body)?;
        Ok(())
    }
}
