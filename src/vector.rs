//! Immutable word vectors
//!
//! A [`WordVector`] pairs a word with its embedding. Identity is the word:
//! two vectors compare and hash equal whenever their words are equal, so
//! repeated tokens deduplicate regardless of the numbers they carry.

use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::{ClusterError, Result};
use crate::similarity::cosine_with_magnitudes;

/// A word and its fixed-length embedding
///
/// Storage is shared behind `Arc`, so clones are cheap and a vector can be
/// read from any number of threads without synchronization.
#[derive(Clone)]
pub struct WordVector {
    word: Arc<str>,
    values: Arc<[f64]>,
    magnitude: f64,
}

impl WordVector {
    /// Create a word vector from its components
    ///
    /// # Examples
    ///
    /// ```
    /// use phrase_clustering::WordVector;
    ///
    /// let v = WordVector::new("pie", vec![3.0, 4.0]).unwrap();
    /// assert_eq!(v.dimension(), 2);
    /// assert_eq!(v.magnitude(), 5.0);
    /// assert!(WordVector::new("empty", Vec::new()).is_err());
    /// ```
    pub fn new(word: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        let word = word.into();
        if values.is_empty() {
            return Err(ClusterError::ZeroDimension { word });
        }
        let magnitude = crate::similarity::magnitude(&values);
        Ok(Self {
            word: Arc::from(word),
            values: Arc::from(values),
            magnitude,
        })
    }

    /// Parse a vector literal of the form `v1,v2,...,vn`
    ///
    /// Components may use scientific notation. Surrounding whitespace on a
    /// component is tolerated; anything else that is not a float fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use phrase_clustering::WordVector;
    ///
    /// let v = WordVector::parse("tart", "1.5e-1,-2.0,3").unwrap();
    /// assert_eq!(v.values(), &[0.15, -2.0, 3.0]);
    /// assert!(WordVector::parse("tart", "1.0,abc").is_err());
    /// ```
    pub fn parse(word: impl Into<String>, literal: &str) -> Result<Self> {
        let word = word.into();
        let mut values = Vec::new();
        for component in literal.trim().split(',') {
            match component.trim().parse::<f64>() {
                Ok(value) => values.push(value),
                Err(_) => {
                    return Err(ClusterError::MalformedVector {
                        word,
                        component: component.to_string(),
                    });
                }
            }
        }
        Self::new(word, values)
    }

    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    /// Cosine similarity against another word vector
    ///
    /// Fails with `DimensionMismatch` when the dimensions differ.
    pub fn similarity(&self, other: &WordVector) -> Result<f64> {
        cosine_with_magnitudes(
            &self.values,
            self.magnitude,
            &other.values,
            other.magnitude,
        )
    }
}

/// Dimension shared by every vector in `vectors`, `None` when it is empty
///
/// Fails with `DimensionMismatch` on the first vector that disagrees with
/// the first one.
pub fn common_dimension(vectors: &[WordVector]) -> Result<Option<usize>> {
    let Some(first) = vectors.first() else {
        return Ok(None);
    };
    for vector in &vectors[1..] {
        if vector.dimension() != first.dimension() {
            return Err(ClusterError::DimensionMismatch {
                left: first.dimension(),
                right: vector.dimension(),
            });
        }
    }
    Ok(Some(first.dimension()))
}

impl PartialEq for WordVector {
    fn eq(&self, other: &Self) -> bool {
        self.word == other.word
    }
}

impl Eq for WordVector {}

impl Hash for WordVector {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.word.hash(state);
    }
}

// Hash and Eq only look at the word, so lookups by `&str` agree with them.
impl Borrow<str> for WordVector {
    fn borrow(&self) -> &str {
        &self.word
    }
}

impl fmt::Debug for WordVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WordVector")
            .field("word", &self.word)
            .field("dimension", &self.values.len())
            .field("magnitude", &self.magnitude)
            .finish()
    }
}
