//! Offline threshold calibration
//!
//! Grid-searches the similarity cutoff for [`Suggestion`] clusters against
//! two labelled corpora: groups of phrases that should cluster together and
//! groups that should not. Both corpora share one plain text format:
//!
//! ```text
//! 2.0
//! apple pie
//! apple tart
//! -
//! 1
//! car
//! automobile
//! -
//! ```
//!
//! Each group starts with a positive weight line, lists one phrase per line
//! and ends at a line whose first character is `-`.
//!
//! For a threshold `t`, the accuracy of a corpus is the weighted fraction of
//! within-group phrase pairs whose similarity is at least `t`. The score of
//! `t` averages the accuracy on the good corpus with one minus the accuracy
//! on the bad corpus.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cluster::Suggestion;
use crate::error::{ClusterError, Result};
use crate::model::Tokenizer;

/// Calibration configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Distance between consecutive candidate thresholds, in (0, 1]
    pub step: f64,
    /// Compute pair similarities on the rayon pool
    pub parallel: bool,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            step: 0.01,
            parallel: false,
        }
    }
}

/// One weighted group of phrases
#[derive(Debug, Clone, PartialEq)]
pub struct PhraseGroup {
    pub weight: f64,
    pub phrases: Vec<String>,
}

/// A labelled calibration corpus
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalibrationCorpus {
    pub groups: Vec<PhraseGroup>,
}

impl CalibrationCorpus {
    /// Load a corpus file; an unreadable file is an error
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ClusterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::read_groups(BufReader::new(file), path)
    }

    /// Parse a corpus from any buffered reader
    ///
    /// # Examples
    ///
    /// ```
    /// use phrase_clustering::calibration::CalibrationCorpus;
    ///
    /// let text = "2.5\napple pie\napple tart\n-\n1\ncar\nautomobile\n-\n";
    /// let corpus = CalibrationCorpus::parse(text.as_bytes()).unwrap();
    /// assert_eq!(corpus.groups.len(), 2);
    /// assert_eq!(corpus.groups[0].weight, 2.5);
    /// assert_eq!(corpus.groups[1].phrases, vec!["car", "automobile"]);
    /// ```
    pub fn parse<R: BufRead>(reader: R) -> Result<Self> {
        Self::read_groups(reader, Path::new("<memory>"))
    }

    fn read_groups<R: BufRead>(reader: R, path: &Path) -> Result<Self> {
        let mut groups: Vec<PhraseGroup> = Vec::new();
        let mut expecting_weight = true;

        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|source| ClusterError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let malformed = |reason: String| ClusterError::MalformedCorpus {
                path: PathBuf::from(path),
                line: idx + 1,
                reason,
            };

            if expecting_weight && line.trim().is_empty() {
                continue;
            } else if expecting_weight {
                let Ok(weight) = line.trim().parse::<f64>() else {
                    let reason = format!("expected a group weight, got {line:?}");
                    return Err(malformed(reason));
                };
                if !weight.is_finite() || weight <= 0.0 {
                    let reason = format!("group weight must be positive, got {weight}");
                    return Err(malformed(reason));
                }
                groups.push(PhraseGroup {
                    weight,
                    phrases: Vec::new(),
                });
                expecting_weight = false;
            } else if line.starts_with('-') {
                expecting_weight = true;
            } else if line.trim().is_empty() {
                warn!(
                    path = %path.display(),
                    line = idx + 1,
                    "skipping blank phrase line"
                );
            } else if let Some(group) = groups.last_mut() {
                let phrase = line.trim().to_string();
                if !group.phrases.contains(&phrase) {
                    group.phrases.push(phrase);
                }
            }
        }

        debug!(
            path = %path.display(),
            groups = groups.len(),
            "parsed calibration corpus"
        );
        Ok(Self { groups })
    }

    /// Number of within-group phrase pairs
    pub fn pair_count(&self) -> usize {
        self.groups
            .iter()
            .map(|g| {
                let n = g.phrases.len();
                n * n.saturating_sub(1) / 2
            })
            .sum()
    }
}

/// Similarity of one within-group phrase pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairSimilarity {
    pub left: String,
    pub right: String,
    pub weight: f64,
    pub similarity: f64,
}

/// Score of one candidate threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdScore {
    pub threshold: f64,
    /// Weighted fraction of good pairs at or above the threshold
    pub good_accuracy: f64,
    /// Weighted fraction of bad pairs at or above the threshold
    pub bad_accuracy: f64,
    pub score: f64,
}

/// The winning threshold and its score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub threshold: f64,
    pub score: f64,
}

/// Grid search over similarity thresholds
pub struct ThresholdCalibrator<'m, M: Tokenizer + ?Sized> {
    model: &'m M,
    config: CalibrationConfig,
}

impl<'m, M> ThresholdCalibrator<'m, M>
where
    M: Tokenizer + Sync + ?Sized,
{
    /// Create a calibrator
    ///
    /// Fails with `InvalidConfig` unless `config.step` is a finite number in
    /// `(0, 1]`.
    pub fn new(model: &'m M, config: CalibrationConfig) -> Result<Self> {
        let step = config.step;
        if !step.is_finite() || step <= 0.0 || step > 1.0 {
            return Err(ClusterError::InvalidConfig(format!(
                "calibration step must be in (0, 1], got {step}"
            )));
        }
        Ok(Self { model, config })
    }

    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    /// Similarity of every within-group pair in `corpus`
    pub fn pair_similarities(&self, corpus: &CalibrationCorpus) -> Result<Vec<PairSimilarity>> {
        let per_group = |group: &PhraseGroup| -> Result<Vec<PairSimilarity>> {
            let suggestions: Vec<Suggestion> = group
                .phrases
                .iter()
                .map(|p| Suggestion::new(self.model.tokenize(p), p.as_str(), 1))
                .collect();

            let mut pairs = Vec::new();
            for i in 0..suggestions.len() {
                for j in (i + 1)..suggestions.len() {
                    pairs.push(PairSimilarity {
                        left: suggestions[i].response().to_string(),
                        right: suggestions[j].response().to_string(),
                        weight: group.weight,
                        similarity: suggestions[i].similarity_to(&suggestions[j])?,
                    });
                }
            }
            Ok(pairs)
        };

        let groups = &corpus.groups;
        let pairs: Vec<Vec<PairSimilarity>> = if self.config.parallel {
            groups.par_iter().map(per_group).collect::<Result<_>>()?
        } else {
            groups.iter().map(per_group).collect::<Result<_>>()?
        };
        Ok(pairs.into_iter().flatten().collect())
    }

    /// Score every threshold on the grid, lowest first
    pub fn sweep(
        &self,
        good: &CalibrationCorpus,
        bad: &CalibrationCorpus,
    ) -> Result<Vec<ThresholdScore>> {
        let good_pairs = self.pair_similarities(good)?;
        let bad_pairs = self.pair_similarities(bad)?;
        info!(
            good_pairs = good_pairs.len(),
            bad_pairs = bad_pairs.len(),
            "computed calibration pair similarities"
        );

        Ok(thresholds(self.config.step)
            .map(|threshold| {
                let good_accuracy = accuracy(&good_pairs, threshold);
                let bad_accuracy = accuracy(&bad_pairs, threshold);
                ThresholdScore {
                    threshold,
                    good_accuracy,
                    bad_accuracy,
                    score: (good_accuracy + (1.0 - bad_accuracy)) / 2.0,
                }
            })
            .collect())
    }

    /// Threshold with the highest score; ties keep the lowest threshold
    pub fn optimal_threshold(
        &self,
        good: &CalibrationCorpus,
        bad: &CalibrationCorpus,
    ) -> Result<Calibration> {
        let sweep = self.sweep(good, bad)?;
        let best = best_of(&sweep);
        info!(
            threshold = best.threshold,
            score = best.score,
            "calibrated threshold"
        );
        Ok(best)
    }

    /// Load both corpora from disk and calibrate
    pub fn calibrate_files(
        &self,
        good_path: impl AsRef<Path>,
        bad_path: impl AsRef<Path>,
    ) -> Result<Calibration> {
        let good = CalibrationCorpus::load(good_path)?;
        let bad = CalibrationCorpus::load(bad_path)?;
        self.optimal_threshold(&good, &bad)
    }
}

/// Weighted fraction of pairs whose similarity is at least `threshold`
///
/// An empty pair list has accuracy `0.0`.
///
/// # Examples
///
/// ```
/// use phrase_clustering::calibration::{accuracy, PairSimilarity};
///
/// let pair = |weight, similarity| PairSimilarity {
///     left: "a".into(),
///     right: "b".into(),
///     weight,
///     similarity,
/// };
/// let pairs = vec![pair(3.0, 0.9), pair(1.0, 0.2)];
/// assert_eq!(accuracy(&pairs, 0.5), 0.75);
/// assert_eq!(accuracy(&[], 0.5), 0.0);
/// ```
pub fn accuracy(pairs: &[PairSimilarity], threshold: f64) -> f64 {
    let (correct, total) = pairs.iter().fold((0.0, 0.0), |(correct, total), pair| {
        let hit = if pair.similarity >= threshold {
            pair.weight
        } else {
            0.0
        };
        (correct + hit, total + pair.weight)
    });
    if total == 0.0 {
        0.0
    } else {
        correct / total
    }
}

/// Candidate thresholds `0, step, 2*step, ...` up to and including 1
///
/// `step` is validated by [`ThresholdCalibrator::new`].
fn thresholds(step: f64) -> impl Iterator<Item = f64> {
    let count = (1.0 / step + 1e-9).floor() as usize;
    (0..=count).map(move |i| i as f64 * step)
}

fn best_of(sweep: &[ThresholdScore]) -> Calibration {
    let mut best = Calibration {
        threshold: 0.0,
        score: 0.0,
    };
    for point in sweep {
        if point.score > best.score {
            best = Calibration {
                threshold: point.threshold,
                score: point.score,
            };
        }
    }
    best
}
