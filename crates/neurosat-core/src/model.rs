//! Model sources and serialized formats.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Flat-buffer file identifier stored at bytes 4..8 of a `.tflite` model.
const TFLITE_IDENTIFIER: &[u8; 4] = b"TFL3";

/// Serialized model format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormat {
    /// Open neural-network-exchange protobuf (`.onnx`).
    Onnx,
    /// Flat-buffer tensor-graph model (`.tflite`).
    Tflite,
}

impl ModelFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "onnx" => Some(Self::Onnx),
            "tflite" => Some(Self::Tflite),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Sniff a serialized buffer. ONNX files carry no magic number, so
    /// anything that is not a flat-buffer tensor graph is treated as ONNX.
    pub fn sniff(bytes: &[u8]) -> Self {
        if bytes.len() >= 8 && &bytes[4..8] == TFLITE_IDENTIFIER {
            Self::Tflite
        } else {
            Self::Onnx
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Onnx => "onnx",
            Self::Tflite => "tflite",
        }
    }
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Onnx => write!(f, "ONNX"),
            Self::Tflite => write!(f, "TFLite"),
        }
    }
}

/// Where a serialized model comes from.
#[derive(Debug, Clone)]
pub enum ModelSource {
    /// A model file on the local filesystem.
    Path(PathBuf),
    /// A serialized model already in memory (e.g. an embedded resource).
    Buffer(Arc<[u8]>),
}

impl ModelSource {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn buffer(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::Buffer(bytes.into())
    }

    /// Format by extension for paths, by content for buffers.
    ///
    /// Paths without a recognised extension are sniffed after reading.
    pub fn format(&self) -> Result<ModelFormat> {
        match self {
            Self::Path(path) => match ModelFormat::from_path(path) {
                Some(format) => Ok(format),
                None => Ok(ModelFormat::sniff(&self.bytes()?)),
            },
            Self::Buffer(bytes) => Ok(ModelFormat::sniff(bytes)),
        }
    }

    /// Serialized model bytes. Borrows for buffers, reads the file for paths.
    pub fn bytes(&self) -> Result<Cow<'_, [u8]>> {
        match self {
            Self::Path(path) => std::fs::read(path)
                .map(Cow::Owned)
                .map_err(|source| Error::ModelRead {
                    path: path.clone(),
                    source,
                }),
            Self::Buffer(bytes) => Ok(Cow::Borrowed(&bytes[..])),
        }
    }

    /// Short human-readable description for logs.
    pub fn describe(&self) -> String {
        match self {
            Self::Path(path) => format!("path '{}'", path.display()),
            Self::Buffer(bytes) => format!("buffer ({} bytes)", bytes.len()),
        }
    }
}

impl From<PathBuf> for ModelSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for ModelSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<Vec<u8>> for ModelSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Buffer(bytes.into())
    }
}

impl From<&'static [u8]> for ModelSource {
    fn from(bytes: &'static [u8]) -> Self {
        Self::Buffer(Arc::from(bytes))
    }
}
