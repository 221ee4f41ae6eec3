use thiserror::Error;

/// Errors surfaced by index construction, GeoJSON input and cluster lookups.
///
/// Degenerate geometry never produces an error: it is absorbed as empty
/// output.  Broken internal invariants panic instead of returning here.
#[derive(Debug, Error)]
pub enum Error {
    /// Options rejected before any tiling or clustering work began.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The input document is not usable GeoJSON.
    #[error("{0}")]
    InvalidGeoJson(String),

    /// A cluster id that no zoom level of the index produced.
    #[error("no cluster with the specified id: {0}")]
    ClusterNotFound(u64),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Bail out of the enclosing function with an [`Error::Config`].
macro_rules! config_bail {
    ($($arg:tt)*) => {
        return Err($crate::error::Error::Config(format!($($arg)*)))
    };
}

pub(crate) use config_bail;
