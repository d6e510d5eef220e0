use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::entity::EntityKind;

/// Why the store declined a raw record. Never fatal to a batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    #[error("record is neither a site nor a link")]
    Unclassified,
    #[error("{kind} record has no identifier")]
    MissingId { kind: EntityKind },
    #[error("link record is missing `{field}`")]
    MissingEndpoint { field: &'static str },
    #[error("{role} {id} is not defined as a site within the data set")]
    UnknownSite { role: &'static str, id: String },
    #[error("link {id} starts and ends at the same site")]
    SelfLoop { id: String },
    #[error("{id} is already stored as a {existing}")]
    KindConflict { id: String, existing: EntityKind },
}

/// The reference-based adjacency strategy cannot read what it needs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StrategyUnavailable {
    #[error("link {link_id} has no `{field}` reference")]
    MissingReference {
        link_id: String,
        field: &'static str,
    },
}

/// Failure to read a whole input file.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),
    #[error("expected a FeatureCollection, found {0}")]
    NotAFeatureCollection(&'static str),
    #[error("graph description has no graph body")]
    NoGraph,
    #[error("unsupported file format: '{0}'")]
    UnsupportedFormat(PathBuf),
}

/// Failure to write an export artifact.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error writing '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("KML error: {0}")]
    Kml(String),
}
