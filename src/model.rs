//! Word-vector model and tokenizer
//!
//! The clustering engine and the calibrator only need the [`Tokenizer`]
//! seam. [`WordVectorModel`] is an in-memory implementation backed by a
//! vocabulary loaded from a plain text file, one entry per line:
//!
//! ```text
//! # comment
//! apple 0.12,-0.40,1.3e-2
//! pie   0.51,0.02,-0.77
//! ```
//!
//! Build the model once and pass it by reference to every engine; it is
//! never mutated while clustering.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ClusterError, Result};
use crate::vector::WordVector;

/// Maps a phrase to the vectors of its known words
pub trait Tokenizer {
    /// Tokenize `phrase`, dropping unknown and stopword tokens
    fn tokenize(&self, phrase: &str) -> Vec<WordVector>;
}

impl<T: Tokenizer + ?Sized> Tokenizer for &T {
    fn tokenize(&self, phrase: &str) -> Vec<WordVector> {
        (**self).tokenize(phrase)
    }
}

/// Tokenizer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Lowercase tokens before lookup
    pub lowercase: bool,
    /// Tokens dropped even when the vocabulary knows them
    pub stopwords: Vec<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            lowercase: true,
            stopwords: [
                "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "in", "is", "it",
                "of", "on", "or", "that", "the", "to", "with",
            ]
            .iter()
            .map(|w| w.to_string())
            .collect(),
        }
    }
}

/// In-memory vocabulary of word vectors
#[derive(Debug, Clone)]
pub struct WordVectorModel {
    vocabulary: HashMap<String, WordVector>,
    stopwords: HashSet<String>,
    lowercase: bool,
    dimension: Option<usize>,
}

impl Default for WordVectorModel {
    fn default() -> Self {
        Self::new(ModelConfig::default())
    }
}

impl WordVectorModel {
    pub fn new(config: ModelConfig) -> Self {
        let lowercase = config.lowercase;
        let stopwords = config
            .stopwords
            .into_iter()
            .map(|w| if lowercase { w.to_lowercase() } else { w })
            .collect();
        Self {
            vocabulary: HashMap::new(),
            stopwords,
            lowercase,
            dimension: None,
        }
    }

    /// Load a vocabulary file
    pub fn load(path: impl AsRef<Path>, config: ModelConfig) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ClusterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let model = Self::read_entries(BufReader::new(file), path, config)?;
        info!(
            path = %path.display(),
            words = model.len(),
            dimension = ?model.dimension(),
            "loaded word vector model"
        );
        Ok(model)
    }

    /// Read a vocabulary from any buffered reader
    ///
    /// # Examples
    ///
    /// ```
    /// use phrase_clustering::model::{ModelConfig, Tokenizer, WordVectorModel};
    ///
    /// let text = "apple 1.0,0.0\npie 0.0,1.0\n";
    /// let model = WordVectorModel::from_reader(text.as_bytes(), ModelConfig::default())?;
    /// assert_eq!(model.len(), 2);
    /// assert_eq!(model.tokenize("The Apple pie").len(), 2);
    /// # Ok::<(), phrase_clustering::ClusterError>(())
    /// ```
    pub fn from_reader<R: BufRead>(reader: R, config: ModelConfig) -> Result<Self> {
        Self::read_entries(reader, Path::new("<memory>"), config)
    }

    fn read_entries<R: BufRead>(reader: R, path: &Path, config: ModelConfig) -> Result<Self> {
        let mut model = Self::new(config);
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|source| ClusterError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let malformed = |reason: String| ClusterError::MalformedCorpus {
                path: PathBuf::from(path),
                line: idx + 1,
                reason,
            };
            let Some((word, literal)) = line.split_once(char::is_whitespace) else {
                let reason = format!("expected `word v1,v2,...`, got {line:?}");
                return Err(malformed(reason));
            };
            let vector = WordVector::parse(word, literal.trim())?;
            model.insert(vector).map_err(|err| match err {
                ClusterError::DimensionMismatch { left, right } => malformed(format!(
                    "vector for {word:?} has dimension {right}, model has {left}"
                )),
                other => other,
            })?;
        }
        Ok(model)
    }

    /// Add a vector to the vocabulary, replacing any entry for the same word
    ///
    /// All vectors in one model share a dimension; the first insert fixes it.
    pub fn insert(&mut self, vector: WordVector) -> Result<()> {
        match self.dimension {
            Some(dimension) if dimension != vector.dimension() => {
                return Err(ClusterError::DimensionMismatch {
                    left: dimension,
                    right: vector.dimension(),
                });
            }
            Some(_) => {}
            None => self.dimension = Some(vector.dimension()),
        }
        let key = self.normalize(vector.word());
        self.vocabulary.insert(key, vector);
        Ok(())
    }

    pub fn get(&self, word: &str) -> Option<&WordVector> {
        self.vocabulary.get(&self.normalize(word))
    }

    pub fn len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vocabulary.is_empty()
    }

    /// Dimension shared by every vector, `None` while the model is empty
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(&self.normalize(word))
    }

    fn normalize(&self, word: &str) -> String {
        if self.lowercase {
            word.to_lowercase()
        } else {
            word.to_string()
        }
    }
}

impl Tokenizer for WordVectorModel {
    fn tokenize(&self, phrase: &str) -> Vec<WordVector> {
        let mut seen = HashSet::new();
        let mut vectors = Vec::new();
        for token in phrase
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .filter(|t| !t.is_empty())
        {
            let token = self.normalize(token);
            if self.stopwords.contains(&token) || !seen.insert(token.clone()) {
                continue;
            }
            if let Some(vector) = self.vocabulary.get(&token) {
                vectors.push(vector.clone());
            }
        }
        debug!(phrase, known = vectors.len(), "tokenized phrase");
        vectors
    }
}
