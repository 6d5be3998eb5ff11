//! Corpus discovery: resolving a directory of recordings into an ordered list.

use crate::error::{DiabenchError, Result};
use std::path::{Path, PathBuf};

/// One input audio asset.
///
/// The identifier (`uri`) is the file stem and must be unique across the
/// corpus; it names the matching ground-truth and prediction files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recording {
    pub path: PathBuf,
    pub uri: String,
}

impl Recording {
    /// Builds a recording handle from a file path, deriving the identifier
    /// from the file stem.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let uri = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(str::to_string)
            .ok_or_else(|| DiabenchError::ConfigInvalidValue {
                key: "audio".to_string(),
                message: format!("cannot derive an identifier from {}", path.display()),
            })?;
        Ok(Self { path, uri })
    }
}

/// Lists the `.wav` recordings directly under `dir`, ordered by file name.
///
/// Subdirectories and other extensions are ignored. Two files that share a
/// stem (e.g. `a.wav` and `a.WAV`) collide and are rejected.
pub fn discover(dir: &Path) -> Result<Vec<Recording>> {
    if !dir.is_dir() {
        return Err(DiabenchError::CorpusDirNotFound {
            path: dir.display().to_string(),
        });
    }

    let mut recordings = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_wav = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));
        if !is_wav {
            continue;
        }
        recordings.push(Recording::from_path(path)?);
    }

    recordings.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));

    for pair in recordings.windows(2) {
        if pair[0].uri == pair[1].uri {
            return Err(DiabenchError::DuplicateRecording {
                uri: pair[0].uri.clone(),
            });
        }
    }

    Ok(recordings)
}
