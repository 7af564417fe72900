//! Cluster capability and its concrete variants
//!
//! A cluster accumulates the word vectors of every phrase merged into it and
//! scores candidate phrases against them. Variants differ only in how that
//! score is computed and in the threshold a candidate must reach:
//! - [`Suggestion`]: centroid-to-centroid cosine over embeddings, used for
//!   scored answer groups
//! - [`WordCluster`]: exact token overlap, ignoring the embedding values
//!
//! The engine never names a variant directly; it receives a [`ClusterFactory`]
//! at construction and lets the factory build new clusters.

use std::collections::HashSet;

use crate::error::{ClusterError, Result};
use crate::similarity::{centroid, cosine_similarity};
use crate::vector::WordVector;

/// Similarity scoring and merging over accumulated word vectors
pub trait Cluster {
    /// Score a candidate vector sequence against this cluster
    fn similarity(&self, vectors: &[WordVector]) -> Result<f64>;

    /// Minimum score a candidate needs to be merged into this cluster
    fn similarity_threshold(&self) -> f64;

    /// Merge a candidate's vectors into this cluster
    fn add(&mut self, vectors: &[WordVector]);

    /// Vectors accumulated so far, founder first
    fn vectors(&self) -> &[WordVector];
}

/// Builds new clusters for a clustering engine
pub trait ClusterFactory {
    type Cluster: Cluster;

    /// Create a cluster seeded with `vectors`, founded by `phrase` at `rank`
    ///
    /// `vectors` may be empty when every token of `phrase` was dropped by the
    /// tokenizer; the returned cluster then has an empty vector view.
    fn new_instance(
        &self,
        vectors: Vec<WordVector>,
        phrase: &str,
        rank: usize,
    ) -> Self::Cluster;
}

/// A scored answer group labelled by its founding phrase
///
/// Similarity is the cosine between the mean of the stored vectors and the
/// mean of the candidate's vectors. An empty side scores `0.0`. Once vectors
/// of two different dimensions have been accumulated every score fails with
/// `DimensionMismatch`.
#[derive(Clone, Debug)]
pub struct Suggestion {
    response: String,
    score: usize,
    vectors: Vec<WordVector>,
    /// Component-wise sum of `vectors`; same direction as their mean
    sum: Vec<f64>,
    mismatch: Option<(usize, usize)>,
}

impl Suggestion {
    /// Cutoff chosen with the `calibrate-threshold` tool; rerun it when the model changes
    pub const SIMILARITY_THRESHOLD: f64 = 0.62;

    /// Create a suggestion from its founder's vectors
    pub fn new(vectors: Vec<WordVector>, response: impl Into<String>, score: usize) -> Self {
        let mut suggestion = Self {
            response: response.into(),
            score,
            vectors: Vec::with_capacity(vectors.len()),
            sum: Vec::new(),
            mismatch: None,
        };
        suggestion.extend(vectors);
        suggestion
    }

    /// The founding phrase
    pub fn response(&self) -> &str {
        &self.response
    }

    /// Rank of the founder, or the stored score when reconstructed
    pub fn score(&self) -> usize {
        self.score
    }

    /// Number of accumulated vectors
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Similarity between two suggestions, as used by threshold calibration
    pub fn similarity_to(&self, other: &Suggestion) -> Result<f64> {
        match (self.direction()?, other.direction()?) {
            (Some(a), Some(b)) => cosine_similarity(a, b),
            _ => Ok(0.0),
        }
    }

    fn extend<I>(&mut self, vectors: I)
    where
        I: IntoIterator<Item = WordVector>,
    {
        for vector in vectors {
            if self.sum.is_empty() {
                self.sum = vector.values().to_vec();
            } else if self.sum.len() != vector.dimension() {
                let found = (self.sum.len(), vector.dimension());
                self.mismatch.get_or_insert(found);
            } else {
                for (acc, v) in self.sum.iter_mut().zip(vector.values()) {
                    *acc += v;
                }
            }
            self.vectors.push(vector);
        }
    }

    fn direction(&self) -> Result<Option<&[f64]>> {
        if let Some((left, right)) = self.mismatch {
            return Err(ClusterError::DimensionMismatch { left, right });
        }
        if self.sum.is_empty() {
            return Ok(None);
        }
        Ok(Some(&self.sum))
    }
}

impl Cluster for Suggestion {
    fn similarity(&self, vectors: &[WordVector]) -> Result<f64> {
        let Some(own) = self.direction()? else {
            return Ok(0.0);
        };
        match centroid(vectors.iter().map(WordVector::values))? {
            Some(candidate) => cosine_similarity(own, &candidate),
            None => Ok(0.0),
        }
    }

    fn similarity_threshold(&self) -> f64 {
        Self::SIMILARITY_THRESHOLD
    }

    fn add(&mut self, vectors: &[WordVector]) {
        self.extend(vectors.iter().cloned());
    }

    fn vectors(&self) -> &[WordVector] {
        &self.vectors
    }
}

impl std::fmt::Display for Suggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.response, self.score)
    }
}

/// Factory for [`Suggestion`] clusters
#[derive(Clone, Copy, Debug, Default)]
pub struct SuggestionFactory;

impl ClusterFactory for SuggestionFactory {
    type Cluster = Suggestion;

    fn new_instance(
        &self,
        vectors: Vec<WordVector>,
        phrase: &str,
        rank: usize,
    ) -> Suggestion {
        Suggestion::new(vectors, phrase, rank)
    }
}

/// Exact-token cluster
///
/// Scores a candidate by the fraction of its distinct words already present
/// in the cluster. Embedding values are never consulted.
#[derive(Clone, Debug)]
pub struct WordCluster {
    phrase: String,
    rank: usize,
    vectors: Vec<WordVector>,
    words: HashSet<WordVector>,
}

impl WordCluster {
    /// Half of a candidate's words must already be known to the cluster
    pub const SIMILARITY_THRESHOLD: f64 = 0.5;

    pub fn new(vectors: Vec<WordVector>, phrase: impl Into<String>, rank: usize) -> Self {
        let words = vectors.iter().cloned().collect();
        Self {
            phrase: phrase.into(),
            rank,
            vectors,
            words,
        }
    }

    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Whether `word` has been contributed by any merged phrase
    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }
}

impl Cluster for WordCluster {
    fn similarity(&self, vectors: &[WordVector]) -> Result<f64> {
        let candidate: HashSet<&WordVector> = vectors.iter().collect();
        if candidate.is_empty() {
            return Ok(0.0);
        }
        let shared = candidate
            .iter()
            .filter(|v| self.words.contains(**v))
            .count();
        Ok(shared as f64 / candidate.len() as f64)
    }

    fn similarity_threshold(&self) -> f64 {
        Self::SIMILARITY_THRESHOLD
    }

    fn add(&mut self, vectors: &[WordVector]) {
        for vector in vectors {
            if self.words.insert(vector.clone()) {
                self.vectors.push(vector.clone());
            }
        }
    }

    fn vectors(&self) -> &[WordVector] {
        &self.vectors
    }
}

/// Factory for [`WordCluster`] clusters
#[derive(Clone, Copy, Debug, Default)]
pub struct WordClusterFactory;

impl ClusterFactory for WordClusterFactory {
    type Cluster = WordCluster;

    fn new_instance(
        &self,
        vectors: Vec<WordVector>,
        phrase: &str,
        rank: usize,
    ) -> WordCluster {
        WordCluster::new(vectors, phrase, rank)
    }
}
