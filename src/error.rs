//! Error types for the enrichment engine.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::AreaCategory;

/// Errors raised by an area catalog provider.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("catalog provider unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by the enrichment engine.
///
/// Only lifecycle operations fail; per-point resolution never does.
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("malformed geometry for {category} area {feature_id}: {reason}")]
    MalformedGeometry {
        category: AreaCategory,
        feature_id: String,
        reason: String,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
