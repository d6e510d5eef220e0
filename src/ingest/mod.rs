//! Parsers that turn input files into [`ImportBatch`]es. They make no merge
//! decisions; everything they produce goes through the store.

pub mod csv_sites;
pub mod geojson_features;
pub mod graphviz;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::IngestError;
use crate::store::{ImportBatch, SourceFormat};

pub(crate) fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub(crate) fn read_text(path: &Path) -> Result<String, IngestError> {
    fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses one file, picking the parser from its extension.
pub fn load_file(path: &Path) -> Result<ImportBatch, IngestError> {
    match SourceFormat::from_path(path) {
        Some(SourceFormat::SiteTable) => csv_sites::load_path(path),
        Some(SourceFormat::FeatureDocument) => geojson_features::load_path(path),
        Some(SourceFormat::GraphDescription) => graphviz::load_path(path),
        None => Err(IngestError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Files in `dir` with a supported extension, sorted by name.
pub fn list_importable(dir: &Path) -> Result<Vec<PathBuf>, IngestError> {
    let entries = fs::read_dir(dir).map_err(|source| IngestError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| IngestError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if SourceFormat::from_path(&path).is_some() {
            paths.push(path);
        } else {
            debug!("File format not supported for {}", path.display());
        }
    }
    paths.sort();
    Ok(paths)
}
