//! # phrase-clustering
//!
//! Groups short free-text phrases (guesses or ranked suggestions in a
//! word-association game) into clusters of near-synonymous answers using
//! word-vector cosine similarity.
//!
//! - [`vector`] and [`similarity`]: immutable word vectors and the math on them
//! - [`cluster`]: the cluster capability, its variants and their factories
//! - [`clustering`]: the greedy online [`ClusteringEngine`]
//! - [`calibration`]: offline grid search for the similarity threshold
//! - [`model`]: the tokenizer seam and an in-memory word-vector model

pub mod calibration;
pub mod cluster;
pub mod clustering;
pub mod error;
pub mod model;
pub mod similarity;
pub mod vector;

// Re-export key types
pub use cluster::{
    Cluster, ClusterFactory, Suggestion, SuggestionFactory, WordCluster, WordClusterFactory,
};
pub use clustering::ClusteringEngine;
pub use error::{ClusterError, Result};
pub use model::{ModelConfig, Tokenizer, WordVectorModel};
pub use vector::WordVector;
