//! Error type shared by the vector math, clustering and calibration modules.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building vectors, scoring clusters or loading input files
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Two vectors of different dimension were compared
    #[error("vector dimensions differ: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    /// A vector was constructed with no components
    #[error("word vector for {word:?} has dimension 0")]
    ZeroDimension { word: String },

    /// A vector literal contained a component that is not a float
    #[error("malformed vector for {word:?}: bad component {component:?}")]
    MalformedVector { word: String, component: String },

    /// A configuration value is out of range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A calibration corpus or model file did not follow its line format
    #[error("{}:{line}: {reason}", path.display())]
    MalformedCorpus {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// An input file could not be read
    #[error("unable to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, ClusterError>;
