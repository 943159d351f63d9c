//! [`MotionGestureDetector`] – the transient PUNCH label.
//!
//! A punch is a FIST thrust toward the camera: the hand's bounding box
//! suddenly grows. The detector remembers two things between frames:
//!
//! - the **resting area**, i.e. the box area of the last non-punch frame;
//! - the **last label** it emitted.
//!
//! A frame becomes `PUNCH` when all of these hold:
//!
//! 1. the static label is `FIST`;
//! 2. a resting area has been recorded (`> 0`);
//! 3. the current area exceeds `resting_area × PUNCH_AREA_MULTIPLIER`;
//! 4. the previous frame was not already a `PUNCH`.
//!
//! The enlarged area of a punch frame is never adopted as the new baseline,
//! so holding the fist forward cannot chain into repeated punches.
//!
//! # Example
//!
//! ```
//! use archmage_perception::motion::{MotionState, detect};
//! use archmage_types::GestureLabel;
//!
//! // Losing the hand always resets the memory.
//! let held = MotionState { resting_area: 0.04, last_label: GestureLabel::Fist };
//! let (label, state) = detect(None, GestureLabel::Fist, held);
//! assert_eq!(label, GestureLabel::None);
//! assert_eq!(state, MotionState::default());
//! ```

use archmage_types::{GestureLabel, HandPose};
use tracing::debug;

/// How much larger than the resting area a FIST must get to count as a punch.
pub const PUNCH_AREA_MULTIPLIER: f32 = 1.5;

/// Cross-frame memory of the detector.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionState {
    pub resting_area: f32,
    pub last_label: GestureLabel,
}

/// Axis-aligned bounding-box area of all landmarks; `z` is ignored.
pub fn hand_area(pose: &HandPose) -> f32 {
    let (mut min_x, mut max_x) = (f32::INFINITY, f32::NEG_INFINITY);
    let (mut min_y, mut max_y) = (f32::INFINITY, f32::NEG_INFINITY);
    for lm in pose.landmarks() {
        min_x = min_x.min(lm.x);
        max_x = max_x.max(lm.x);
        min_y = min_y.min(lm.y);
        max_y = max_y.max(lm.y);
    }
    (max_x - min_x) * (max_y - min_y)
}

/// Pure transition: `(pose, static label, state) → (final label, new state)`.
///
/// `pose == None` means no hand was observed this tick.
pub fn detect(
    pose: Option<&HandPose>,
    static_label: GestureLabel,
    state: MotionState,
) -> (GestureLabel, MotionState) {
    let Some(pose) = pose else {
        return (GestureLabel::None, MotionState::default());
    };

    let area = hand_area(pose);
    let is_punch = static_label == GestureLabel::Fist
        && state.resting_area > 0.0
        && area > state.resting_area * PUNCH_AREA_MULTIPLIER
        && state.last_label != GestureLabel::Punch;

    let final_label = if is_punch {
        debug!(area, resting_area = state.resting_area, "punch detected");
        GestureLabel::Punch
    } else {
        static_label
    };

    let resting_area = if is_punch { state.resting_area } else { area };

    (
        final_label,
        MotionState {
            resting_area,
            last_label: final_label,
        },
    )
}

/// Owns a session's [`MotionState`] and applies [`detect`] frame by frame.
#[derive(Debug, Default)]
pub struct MotionGestureDetector {
    state: MotionState,
}

impl MotionGestureDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one frame (or `None` for "no hand") and return the final label.
    pub fn observe(&mut self, pose: Option<&HandPose>, static_label: GestureLabel) -> GestureLabel {
        let (label, next) = detect(pose, static_label, self.state);
        self.state = next;
        label
    }

    pub fn state(&self) -> MotionState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = MotionState::default();
    }
}
