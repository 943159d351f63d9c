//! `archmage-perception` – Pose Recognition layer.
//!
//! Turns a single frame of hand landmarks into a discrete
//! [`GestureLabel`][archmage_types::GestureLabel], and tracks just enough
//! cross-frame memory to spot a forward punch.
//!
//! # Modules
//!
//! - [`classifier`] – [`PoseClassifier`][classifier::PoseClassifier]: the
//!   single capability interface, implemented by the finger-curl
//!   [`RuleClassifier`][classifier::RuleClassifier] and the trained
//!   [`ModelClassifier`][classifier::ModelClassifier] (which falls back to the
//!   rules when no artifact is available).
//! - [`model`] – [`LabelPredictor`][model::LabelPredictor]: the
//!   predict-with-confidence contract for external models, plus the
//!   [`CentroidModel`][model::CentroidModel] JSON artifact loader.
//! - [`motion`] – [`MotionGestureDetector`][motion::MotionGestureDetector]:
//!   promotes a FIST to a one-shot PUNCH when the hand's bounding box
//!   suddenly grows past its resting size.

pub mod classifier;
pub mod model;
pub mod motion;

pub use classifier::{
    ClassifierStrategy, ModelClassifier, PoseClassifier, RuleClassifier, build_classifier,
};
pub use model::{CentroidModel, LabelPredictor, Prediction, CONFIDENCE_THRESHOLD};
pub use motion::{MotionGestureDetector, MotionState, PUNCH_AREA_MULTIPLIER, hand_area};
