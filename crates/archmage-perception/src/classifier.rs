//! [`PoseClassifier`] – one hand frame in, one static gesture label out.
//!
//! Two strategies implement the same interface and are chosen once at
//! construction time:
//!
//! 1. **Rules** ([`RuleClassifier`]): finger-curl geometry. A non-thumb finger
//!    is *curled* when its tip sits lower in the image than its knuckle
//!    (`tip.y > mcp.y`, image y grows downward). Labels resolve by fixed
//!    priority, first match wins:
//!
//!    | Priority | Condition | Label |
//!    |---|---|---|
//!    | 1 | all four curled | `FIST` |
//!    | 2 | none curled | `OPEN_PALM` |
//!    | 3 | only index extended | `POINT` |
//!    | 4 | middle and ring curled | `BANDO` |
//!    | – | otherwise | `NONE` |
//!
//!    The `BANDO` rule is a non-exclusive second tier: it would also match
//!    some FIST/POINT shapes, which the earlier rows already claim. The combo
//!    tables are tuned against exactly this order.
//!
//! 2. **Model** ([`ModelClassifier`]): asks a [`LabelPredictor`] for a label
//!    and accepts it only above [`CONFIDENCE_THRESHOLD`]. Without a predictor
//!    it runs the rules instead.
//!
//! # Example
//!
//! ```
//! use archmage_perception::{ClassifierStrategy, build_classifier};
//!
//! // No artifact on disk: the model strategy degrades to the rules.
//! let classifier = build_classifier(ClassifierStrategy::Model, None);
//! assert_eq!(classifier.strategy(), ClassifierStrategy::Rules);
//! ```

use std::path::Path;
use std::sync::Arc;

use archmage_types::{
    GestureLabel, HandPose, INDEX_MCP, INDEX_TIP, MIDDLE_MCP, MIDDLE_TIP, PINKY_MCP, PINKY_TIP,
    RING_MCP, RING_TIP,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::model::{CentroidModel, CONFIDENCE_THRESHOLD, LabelPredictor};

// ─────────────────────────────────────────────────────────────────────────────
// Capability interface
// ─────────────────────────────────────────────────────────────────────────────

/// Which classification strategy is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierStrategy {
    #[default]
    Rules,
    Model,
}

impl std::fmt::Display for ClassifierStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassifierStrategy::Rules => write!(f, "rules"),
            ClassifierStrategy::Model => write!(f, "model"),
        }
    }
}

/// Maps a single [`HandPose`] to a static [`GestureLabel`].
///
/// Implementations must be deterministic, side-effect free and total:
/// unrecognized shapes yield [`GestureLabel::None`]. They never produce
/// `PUNCH` (motion-derived) or `THUMBS_UP` (out-of-band).
pub trait PoseClassifier: Send + Sync {
    fn classify(&self, pose: &HandPose) -> GestureLabel;

    /// The strategy actually in effect (a degraded model reports `Rules`).
    fn strategy(&self) -> ClassifierStrategy;
}

/// Build the configured classifier.
///
/// For [`ClassifierStrategy::Model`] the artifact at `model_path` is loaded;
/// a missing path or unreadable artifact yields a permanently degraded
/// [`ModelClassifier`].
pub fn build_classifier(
    strategy: ClassifierStrategy,
    model_path: Option<&Path>,
) -> Arc<dyn PoseClassifier> {
    match strategy {
        ClassifierStrategy::Rules => Arc::new(RuleClassifier),
        ClassifierStrategy::Model => Arc::new(ModelClassifier::from_artifact(model_path)),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rule-based strategy
// ─────────────────────────────────────────────────────────────────────────────

/// Curl state of the four non-thumb fingers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FingerCurl {
    pub index: bool,
    pub middle: bool,
    pub ring: bool,
    pub pinky: bool,
}

impl FingerCurl {
    pub fn of(pose: &HandPose) -> Self {
        let curled = |tip: usize, mcp: usize| pose.landmark(tip).y > pose.landmark(mcp).y;
        Self {
            index: curled(INDEX_TIP, INDEX_MCP),
            middle: curled(MIDDLE_TIP, MIDDLE_MCP),
            ring: curled(RING_TIP, RING_MCP),
            pinky: curled(PINKY_TIP, PINKY_MCP),
        }
    }
}

/// Finger-curl geometry classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleClassifier;

impl RuleClassifier {
    pub fn label_for(curl: FingerCurl) -> GestureLabel {
        let FingerCurl {
            index,
            middle,
            ring,
            pinky,
        } = curl;

        if index && middle && ring && pinky {
            return GestureLabel::Fist;
        }
        if !index && !middle && !ring && !pinky {
            return GestureLabel::OpenPalm;
        }
        if !index && middle && ring && pinky {
            return GestureLabel::Point;
        }
        if middle && ring {
            return GestureLabel::Bando;
        }
        GestureLabel::None
    }
}

impl PoseClassifier for RuleClassifier {
    fn classify(&self, pose: &HandPose) -> GestureLabel {
        Self::label_for(FingerCurl::of(pose))
    }

    fn strategy(&self) -> ClassifierStrategy {
        ClassifierStrategy::Rules
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Probabilistic strategy
// ─────────────────────────────────────────────────────────────────────────────

/// Trained-model classifier with transparent rule fallback.
pub struct ModelClassifier {
    predictor: Option<Box<dyn LabelPredictor>>,
    threshold: f32,
}

impl ModelClassifier {
    /// Wrap a ready predictor.
    pub fn new(predictor: Box<dyn LabelPredictor>) -> Self {
        Self {
            predictor: Some(predictor),
            threshold: CONFIDENCE_THRESHOLD,
        }
    }

    /// A classifier with no model. Logs the degraded-mode notice once, here.
    pub fn degraded(reason: &str) -> Self {
        warn!(reason, "trained gesture model unavailable; falling back to rule-based classification");
        Self {
            predictor: None,
            threshold: CONFIDENCE_THRESHOLD,
        }
    }

    /// Load a [`CentroidModel`] artifact, degrading on any failure.
    pub fn from_artifact(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::degraded("no model_path configured");
        };
        match CentroidModel::load(path) {
            Ok(model) => {
                info!(path = %path.display(), labels = ?model.labels(), "loaded gesture model");
                Self::new(Box::new(model))
            }
            Err(e) => Self::degraded(&e.to_string()),
        }
    }

    /// Override the acceptance threshold (builder-style).
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn is_degraded(&self) -> bool {
        self.predictor.is_none()
    }
}

impl PoseClassifier for ModelClassifier {
    fn classify(&self, pose: &HandPose) -> GestureLabel {
        let Some(predictor) = &self.predictor else {
            return RuleClassifier.classify(pose);
        };

        let prediction = predictor.predict(&pose.features());
        if prediction.confidence() > self.threshold {
            prediction.label
        } else {
            GestureLabel::None
        }
    }

    fn strategy(&self) -> ClassifierStrategy {
        if self.is_degraded() {
            ClassifierStrategy::Rules
        } else {
            ClassifierStrategy::Model
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
