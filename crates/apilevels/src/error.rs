use crate::types::Version;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building or cleaning a [`Registry`](crate::v1::Registry).
///
/// Missing classes and missing edges are not errors: they mean "no provable
/// relationship" and every pass falls back to keeping the data as it is.
#[derive(Debug, Error)]
pub enum Error {
    #[error("snapshot for version {found} arrived after version {previous}")]
    VersionRegression { previous: Version, found: Version },

    #[error("hidden ancestor cycle while flattening class {0}")]
    InheritanceCycle(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JSON error on line {line}: {source}")]
    JsonLine {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}
