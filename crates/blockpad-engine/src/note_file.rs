//! Framing of a buffer file on disk.
//!
//! A note file may start with one line of JSON metadata, followed by the
//! document text exactly as the editor holds it:
//!
//! ```text
//! {"formatVersion":"1.0.0","name":"Scratch"}
//! \n∞∞∞text-a;created=…\nhello
//! ```
//!
//! Metadata that does not parse is not fatal: the whole file is then treated
//! as document text.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub const FORMAT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteMetadata {
    pub format_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Keys the engine does not interpret, kept for the write-back
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for NoteMetadata {
    fn default() -> Self {
        Self {
            format_version: FORMAT_VERSION.to_string(),
            name: None,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Error)]
#[error("invalid note metadata line: {source}")]
pub struct MetadataParseError {
    #[from]
    source: serde_json::Error,
}

#[derive(Debug, Error)]
pub enum NoteFileError {
    #[error("Failed to read note file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write note file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NoteFile {
    pub metadata: Option<NoteMetadata>,
    /// Document text following the metadata line
    pub text: String,
}

impl NoteFile {
    pub fn new(metadata: Option<NoteMetadata>, text: impl Into<String>) -> Self {
        Self {
            metadata,
            text: text.into(),
        }
    }

    /// Split a file into metadata and text, falling back to no metadata when
    /// the first line is not valid metadata.
    pub fn parse(input: &str) -> Self {
        match Self::try_parse(input) {
            Ok(file) => file,
            Err(err) => {
                warn!("{err}; reading the whole file as note text");
                Self::new(None, input)
            }
        }
    }

    /// Like [`NoteFile::parse`], but report bad metadata instead of
    /// recovering.
    pub fn try_parse(input: &str) -> Result<Self, MetadataParseError> {
        if !input.starts_with('{') {
            return Ok(Self::new(None, input));
        }
        let (line, text) = input.split_once('\n').unwrap_or((input, ""));
        let metadata: NoteMetadata = serde_json::from_str(line)?;
        Ok(Self::new(Some(metadata), text))
    }

    pub fn read(path: &Path) -> Result<Self, NoteFileError> {
        let input = fs::read_to_string(path).map_err(|source| NoteFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&input))
    }

    pub fn write(&self, path: &Path) -> Result<(), NoteFileError> {
        let write_error = |source| NoteFileError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        fs::write(path, self.to_string()).map_err(write_error)
    }
}

impl fmt::Display for NoteFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(metadata) = &self.metadata {
            let line = serde_json::to_string(metadata).map_err(|_| fmt::Error)?;
            writeln!(f, "{line}")?;
        }
        f.write_str(&self.text)
    }
}
