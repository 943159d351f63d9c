//! Trained-model contract and the bundled centroid artifact loader.
//!
//! Training happens offline; this crate only consumes the result. Anything
//! that can turn the 63-value landmark feature vector into a label plus class
//! probabilities can implement [`LabelPredictor`].
//!
//! # Artifact format
//!
//! [`CentroidModel`] reads a JSON document:
//!
//! ```json
//! {
//!   "labels": ["FIST", "OPEN_PALM", "POINT", "BANDO"],
//!   "centroids": [[0.51, 0.62, 0.0, ...], ...],
//!   "sharpness": 10.0
//! }
//! ```
//!
//! One centroid of 63 floats per label. Class probabilities are a softmax over
//! `-sharpness * distance`. Label strings the game does not know map to `NONE`.

use std::fs;
use std::path::Path;

use archmage_types::{ArchmageError, FEATURE_LEN, GestureLabel};
use serde::{Deserialize, Serialize};

/// Minimum top-class probability (exclusive) for a prediction to be accepted.
pub const CONFIDENCE_THRESHOLD: f32 = 0.4;

/// Output of a [`LabelPredictor`].
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: GestureLabel,
    pub probabilities: Vec<f32>,
}

impl Prediction {
    /// The maximum class probability, or `0.0` when empty.
    pub fn confidence(&self) -> f32 {
        self.probabilities.iter().copied().fold(0.0, f32::max)
    }
}

/// Predict-with-confidence contract for an externally trained classifier.
pub trait LabelPredictor: Send + Sync {
    fn predict(&self, features: &[f32; FEATURE_LEN]) -> Prediction;
}

#[derive(Debug, Serialize, Deserialize)]
struct CentroidArtifact {
    labels: Vec<String>,
    centroids: Vec<Vec<f32>>,
    #[serde(default = "default_sharpness")]
    sharpness: f32,
}

fn default_sharpness() -> f32 {
    10.0
}

/// Nearest-centroid model with softmax confidences.
#[derive(Debug, Clone)]
pub struct CentroidModel {
    labels: Vec<GestureLabel>,
    centroids: Vec<[f32; FEATURE_LEN]>,
    sharpness: f32,
}

impl CentroidModel {
    /// Build a model from parallel label/centroid lists.
    ///
    /// # Errors
    ///
    /// [`ArchmageError::ModelArtifact`] when the lists are empty, differ in
    /// length, or a centroid is not [`FEATURE_LEN`] long.
    pub fn new(
        labels: Vec<GestureLabel>,
        centroids: Vec<Vec<f32>>,
        sharpness: f32,
    ) -> Result<Self, ArchmageError> {
        if labels.is_empty() {
            return Err(ArchmageError::ModelArtifact("model has no classes".into()));
        }
        if labels.len() != centroids.len() {
            return Err(ArchmageError::ModelArtifact(format!(
                "{} labels but {} centroids",
                labels.len(),
                centroids.len()
            )));
        }
        let centroids = centroids
            .into_iter()
            .enumerate()
            .map(|(i, c)| {
                let len = c.len();
                <[f32; FEATURE_LEN]>::try_from(c).map_err(|_| {
                    ArchmageError::ModelArtifact(format!(
                        "centroid {i} has {len} features, expected {FEATURE_LEN}"
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            labels,
            centroids,
            sharpness,
        })
    }

    /// Parse a JSON artifact.
    pub fn from_json(raw: &str) -> Result<Self, ArchmageError> {
        let artifact: CentroidArtifact = serde_json::from_str(raw)
            .map_err(|e| ArchmageError::ModelArtifact(format!("parse error: {e}")))?;
        let labels = artifact
            .labels
            .iter()
            .map(|l| GestureLabel::from_token(l))
            .collect();
        Self::new(labels, artifact.centroids, artifact.sharpness)
    }

    /// Read and parse a JSON artifact from disk.
    pub fn load(path: &Path) -> Result<Self, ArchmageError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            ArchmageError::ModelArtifact(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_json(&raw)
    }

    pub fn labels(&self) -> &[GestureLabel] {
        &self.labels
    }
}

impl LabelPredictor for CentroidModel {
    fn predict(&self, features: &[f32; FEATURE_LEN]) -> Prediction {
        let logits: Vec<f32> = self
            .centroids
            .iter()
            .map(|c| {
                let dist = c
                    .iter()
                    .zip(features)
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum::<f32>()
                    .sqrt();
                -self.sharpness * dist
            })
            .collect();

        // Numerically stable softmax.
        let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let exps: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
        let total: f32 = exps.iter().sum();
        let probabilities: Vec<f32> = exps.iter().map(|e| e / total).collect();

        let best = probabilities
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap_or(0);

        Prediction {
            label: self.labels[best],
            probabilities,
        }
    }
}
