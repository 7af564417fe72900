//! Greedy online clustering of phrases
//!
//! Phrases are inserted one at a time, in rank order. Each phrase is
//! tokenized, scored against every existing cluster, and then either merged
//! into the single best cluster that clears its threshold or used to found a
//! new cluster. Clusters are never merged with each other or re-clustered
//! later, so the result depends on insertion order: the first phrase of a
//! cluster stays its label and score for good.
//!
//! Every insertion is two-phase: a read-only scan picks the best match, then
//! at most one mutation (merge or create) is applied.

use tracing::{debug, trace};

use crate::cluster::{Cluster, ClusterFactory, Suggestion, SuggestionFactory};
use crate::error::Result;
use crate::model::Tokenizer;
use crate::vector::{common_dimension, WordVector};

/// Ordered collection of clusters built by greedy assignment
///
/// The engine borrows its tokenizer and owns its factory. It is not meant to
/// be shared: one engine belongs to one query or one game round.
///
/// # Examples
///
/// ```
/// use phrase_clustering::model::{ModelConfig, WordVectorModel};
/// use phrase_clustering::ClusteringEngine;
///
/// let vocab = "apple 1.0,0.1\npie 0.9,0.2\ntart 0.95,0.15\nbanana 0.0,1.0\nsplit 0.1,1.0\n";
/// let model = WordVectorModel::from_reader(vocab.as_bytes(), ModelConfig::default())?;
///
/// let phrases = ["apple pie", "apple tart", "banana split"];
/// let engine = ClusteringEngine::suggestions(&model, phrases)?;
/// assert_eq!(engine.size(), 2);
/// assert_eq!(engine.as_list()[0].response(), "apple pie");
/// # Ok::<(), phrase_clustering::ClusterError>(())
/// ```
pub struct ClusteringEngine<'m, F: ClusterFactory, M: Tokenizer + ?Sized> {
    clusters: Vec<F::Cluster>,
    model: &'m M,
    factory: F,
    total: usize,
}

impl<'m, F, M> ClusteringEngine<'m, F, M>
where
    F: ClusterFactory,
    M: Tokenizer + ?Sized,
{
    /// Create an empty engine
    pub fn new(model: &'m M, factory: F) -> Self {
        Self {
            clusters: Vec::new(),
            model,
            factory,
            total: 0,
        }
    }

    /// Cluster `phrases` in order, highest ranked first
    pub fn from_phrases<I, S>(model: &'m M, factory: F, phrases: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut engine = Self::new(model, factory);
        for phrase in phrases {
            engine.add(phrase.as_ref())?;
        }
        Ok(engine)
    }

    /// Rebuild an engine from stored `(phrase, score)` rows
    ///
    /// Each row becomes its own cluster, in the given order, with no
    /// comparison between rows. Phrases are still tokenized so that later
    /// guesses can be scored against them. Clusters founded afterwards get
    /// ranks continuing from the number of restored rows.
    pub fn from_existing<I, S>(model: &'m M, factory: F, rows: I) -> Self
    where
        I: IntoIterator<Item = (S, usize)>,
        S: AsRef<str>,
    {
        let clusters: Vec<F::Cluster> = rows
            .into_iter()
            .map(|(phrase, score)| {
                let phrase = phrase.as_ref();
                factory.new_instance(model.tokenize(phrase), phrase, score)
            })
            .collect();
        debug!(clusters = clusters.len(), "restored clustering");
        Self {
            total: clusters.len(),
            clusters,
            model,
            factory,
        }
    }

    /// Insert a phrase, merging it into the best matching cluster or founding a new one
    ///
    /// Returns the cluster the phrase ended up in, or `None` when the phrase
    /// has no known words and therefore neither matched nor founded a cluster.
    pub fn add(&mut self, phrase: &str) -> Result<Option<&F::Cluster>> {
        let vectors = self.model.tokenize(phrase);
        self.add_vectors(vectors, phrase)
    }

    /// Like [`add`](Self::add), for a phrase that is already tokenized
    pub fn add_vectors(
        &mut self,
        vectors: Vec<WordVector>,
        phrase: &str,
    ) -> Result<Option<&F::Cluster>> {
        match self.best_match(&vectors)? {
            Some(idx) => {
                debug!(phrase, cluster = idx, "merged phrase into cluster");
                let cluster = &mut self.clusters[idx];
                cluster.add(&vectors);
                Ok(Some(&*cluster))
            }
            None => {
                let cluster = self.factory.new_instance(vectors, phrase, self.total);
                if cluster.vectors().is_empty() {
                    debug!(phrase, "phrase has no known words; not clustered");
                    return Ok(None);
                }
                let idx = self.clusters.len();
                self.total += 1;
                self.clusters.push(cluster);
                debug!(phrase, cluster = idx, "founded new cluster");
                Ok(self.clusters.last())
            }
        }
    }

    /// Find the cluster a phrase belongs to without changing the engine
    ///
    /// This is how a guess is scored during play: it either lands in an
    /// existing cluster or it does not, and nothing is created either way.
    pub fn cluster_of(&self, phrase: &str) -> Result<Option<&F::Cluster>> {
        self.cluster_of_vectors(&self.model.tokenize(phrase))
    }

    /// Like [`cluster_of`](Self::cluster_of), for an already tokenized phrase
    pub fn cluster_of_vectors(&self, vectors: &[WordVector]) -> Result<Option<&F::Cluster>> {
        Ok(self.best_match(vectors)?.map(|idx| &self.clusters[idx]))
    }

    /// Index of the most similar cluster whose threshold the candidate clears
    ///
    /// Only a strictly greater score replaces the running best, so ties go
    /// to the earliest cluster. A candidate whose own vectors disagree on
    /// dimension fails before any cluster is scored.
    fn best_match(&self, vectors: &[WordVector]) -> Result<Option<usize>> {
        if common_dimension(vectors)?.is_none() {
            return Ok(None);
        }

        let mut best: Option<(usize, f64)> = None;
        for (idx, cluster) in self.clusters.iter().enumerate() {
            let similarity = cluster.similarity(vectors)?;
            trace!(cluster = idx, similarity, "scored cluster");
            if similarity < cluster.similarity_threshold() || similarity.is_nan() {
                continue;
            }
            match best {
                Some((_, best_similarity)) if similarity <= best_similarity => {}
                _ => best = Some((idx, similarity)),
            }
        }
        Ok(best.map(|(idx, _)| idx))
    }

    /// Number of clusters created so far
    pub fn size(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Clusters in creation order
    pub fn as_list(&self) -> &[F::Cluster] {
        &self.clusters
    }
}

impl<'m, M: Tokenizer + ?Sized> ClusteringEngine<'m, SuggestionFactory, M> {
    /// Group ranked suggestions into scored answer clusters
    pub fn suggestions<I, S>(model: &'m M, phrases: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_phrases(model, SuggestionFactory, phrases)
    }

    /// Restore previously stored `(response, score)` suggestion rows
    pub fn existing_suggestions<I, S>(model: &'m M, rows: I) -> Self
    where
        I: IntoIterator<Item = (S, usize)>,
        S: AsRef<str>,
    {
        Self::from_existing(model, SuggestionFactory, rows)
    }

    /// Founder phrases and scores in creation order, as a store would persist them
    pub fn responses(&self) -> Vec<(&str, usize)> {
        self.clusters
            .iter()
            .map(|s: &Suggestion| (s.response(), s.score()))
            .collect()
    }
}

impl<'m, F, M> std::fmt::Debug for ClusteringEngine<'m, F, M>
where
    F: ClusterFactory,
    F::Cluster: std::fmt::Debug,
    M: Tokenizer + ?Sized,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusteringEngine")
            .field("total", &self.total)
            .field("clusters", &self.clusters)
            .finish()
    }
}
