//! Named table of serialized models bundled with the application.
//!
//! Replaces a process-global list of embedded blobs: the table is built by the
//! host (from `include_bytes!` data or a directory scan) and handed to whatever
//! needs to resolve a model by its declared file name.

use crate::model::{ModelFormat, ModelSource};
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Declared file name → serialized model bytes.
#[derive(Debug, Clone, Default)]
pub struct ResourceTable {
    entries: BTreeMap<String, Arc<[u8]>>,
}

impl ResourceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model under `name`, replacing any previous entry.
    pub fn insert(&mut self, name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> &mut Self {
        self.entries.insert(name.into(), bytes.into());
        self
    }

    /// Register data compiled into the binary, e.g. via `include_bytes!`.
    pub fn insert_static(&mut self, name: impl Into<String>, bytes: &'static [u8]) -> &mut Self {
        self.insert(name, Arc::<[u8]>::from(bytes))
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries.get(name).map(|bytes| &bytes[..])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve `name` to an in-memory model source.
    pub fn source(&self, name: &str) -> Result<ModelSource> {
        self.entries
            .get(name)
            .map(|bytes| ModelSource::Buffer(Arc::clone(bytes)))
            .ok_or_else(|| Error::ResourceNotFound(name.to_string()))
    }

    /// Load every `.onnx` / `.tflite` file in `dir`, keyed by file name.
    ///
    /// Unreadable files are skipped with a warning.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(Error::InvalidConfig(format!(
                "Not a directory: {}",
                dir.display()
            )));
        }

        let mut table = Self::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() || ModelFormat::from_path(&path).is_none() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
                continue;
            };

            match std::fs::read(&path) {
                Ok(bytes) => {
                    tracing::info!(
                        "Registered model resource: {} ({} bytes)",
                        name,
                        bytes.len()
                    );
                    table.insert(name, bytes);
                }
                Err(e) => {
                    tracing::warn!("Failed to read {}: {}", path.display(), e);
                }
            }
        }

        Ok(table)
    }
}
