use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of landmarks in a single tracked hand.
pub const LANDMARK_COUNT: usize = 21;

/// Length of the flattened `(x, y, z)` feature vector for one hand.
pub const FEATURE_LEN: usize = LANDMARK_COUNT * 3;

// Landmark indices used by the finger-curl geometry.
pub const WRIST: usize = 0;
pub const INDEX_MCP: usize = 5;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_TIP: usize = 20;

/// One tracked point of a hand, in normalized image coordinates.
///
/// `y` grows downward. `z` is relative depth and is optional on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// A full hand frame: exactly [`LANDMARK_COUNT`] landmarks in tracker order.
///
/// The count is enforced at construction so downstream code can index freely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Landmark>", into = "Vec<Landmark>")]
pub struct HandPose {
    landmarks: [Landmark; LANDMARK_COUNT],
}

impl HandPose {
    /// Build a pose from a landmark list.
    ///
    /// # Errors
    ///
    /// Returns [`ArchmageError::InvalidPose`] when the list does not hold
    /// exactly [`LANDMARK_COUNT`] points.
    pub fn new(landmarks: Vec<Landmark>) -> Result<Self, ArchmageError> {
        let count = landmarks.len();
        let landmarks: [Landmark; LANDMARK_COUNT] = landmarks
            .try_into()
            .map_err(|_| ArchmageError::InvalidPose(count))?;
        Ok(Self { landmarks })
    }

    pub fn landmarks(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.landmarks
    }

    pub fn landmark(&self, index: usize) -> Landmark {
        self.landmarks[index]
    }

    /// Flatten into `x0, y0, z0, x1, ...` in landmark order.
    pub fn features(&self) -> [f32; FEATURE_LEN] {
        let mut out = [0.0; FEATURE_LEN];
        for (i, lm) in self.landmarks.iter().enumerate() {
            out[i * 3] = lm.x;
            out[i * 3 + 1] = lm.y;
            out[i * 3 + 2] = lm.z;
        }
        out
    }
}

impl TryFrom<Vec<Landmark>> for HandPose {
    type Error = ArchmageError;

    fn try_from(value: Vec<Landmark>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<HandPose> for Vec<Landmark> {
    fn from(pose: HandPose) -> Self {
        pose.landmarks.to_vec()
    }
}

/// Discrete gesture vocabulary shared by the classifier and the resolver.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GestureLabel {
    #[default]
    None,
    Fist,
    OpenPalm,
    Point,
    Bando,
    /// Motion-derived; never produced by static geometry.
    Punch,
    /// Out-of-band acknowledgement from the pose source.
    ThumbsUp,
}

impl GestureLabel {
    pub const ALL: [GestureLabel; 7] = [
        GestureLabel::None,
        GestureLabel::Fist,
        GestureLabel::OpenPalm,
        GestureLabel::Point,
        GestureLabel::Bando,
        GestureLabel::Punch,
        GestureLabel::ThumbsUp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GestureLabel::None => "NONE",
            GestureLabel::Fist => "FIST",
            GestureLabel::OpenPalm => "OPEN_PALM",
            GestureLabel::Point => "POINT",
            GestureLabel::Bando => "BANDO",
            GestureLabel::Punch => "PUNCH",
            GestureLabel::ThumbsUp => "THUMBS_UP",
        }
    }

    /// Parse a wire token, mapping anything unrecognized to [`GestureLabel::None`].
    pub fn from_token(token: &str) -> Self {
        token.parse().unwrap_or_default()
    }
}

impl fmt::Display for GestureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GestureLabel {
    type Err = ArchmageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        GestureLabel::ALL
            .into_iter()
            .find(|g| g.as_str().eq_ignore_ascii_case(token))
            .ok_or_else(|| ArchmageError::UnknownToken(token.to_string()))
    }
}

/// Output token of the command pipeline.
///
/// Declaration order is the tie-break order for "most used" statistics.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    #[default]
    None,
    Fireball,
    IceShard,
    Lightning,
    Heal,
    PunchCombo,
    ExplosionCombo,
    HealingLightCombo,
    LightningStrikeCombo,
    Cooldown,
    InsufficientMana,
    ChallengeSuccess,
    ThumbsUp,
}

impl Command {
    /// Commands that are counted in usage statistics, in tie-break order.
    pub const SPELLS: [Command; 8] = [
        Command::Fireball,
        Command::IceShard,
        Command::Lightning,
        Command::Heal,
        Command::PunchCombo,
        Command::ExplosionCombo,
        Command::HealingLightCombo,
        Command::LightningStrikeCombo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Command::None => "NONE",
            Command::Fireball => "FIREBALL",
            Command::IceShard => "ICE_SHARD",
            Command::Lightning => "LIGHTNING",
            Command::Heal => "HEAL",
            Command::PunchCombo => "PUNCH_COMBO",
            Command::ExplosionCombo => "EXPLOSION_COMBO",
            Command::HealingLightCombo => "HEALING_LIGHT_COMBO",
            Command::LightningStrikeCombo => "LIGHTNING_STRIKE_COMBO",
            Command::Cooldown => "COOLDOWN",
            Command::InsufficientMana => "INSUFFICIENT_MANA",
            Command::ChallengeSuccess => "CHALLENGE_SUCCESS",
            Command::ThumbsUp => "THUMBS_UP",
        }
    }

    /// Human-readable name shown on the game-over screen.
    pub fn display_name(&self) -> &'static str {
        match self {
            Command::None => "None",
            Command::Fireball => "Fireball",
            Command::IceShard => "Ice Shard",
            Command::Lightning => "Lightning",
            Command::Heal => "Heal",
            Command::PunchCombo => "Punch Combo",
            Command::ExplosionCombo => "Explosion Combo",
            Command::HealingLightCombo => "Healing Light",
            Command::LightningStrikeCombo => "Lightning Strike",
            Command::Cooldown => "Cooldown",
            Command::InsufficientMana => "Insufficient Mana",
            Command::ChallengeSuccess => "Challenge Success",
            Command::ThumbsUp => "Thumbs Up",
        }
    }

    /// `true` for commands produced by a spell cast (as opposed to gate outcomes).
    pub fn is_spell(&self) -> bool {
        Command::SPELLS.contains(self)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timed world events and challenges surfaced alongside each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// Boss takes extra fire damage.
    #[serde(rename = "WEAKFIRE")]
    WeakFire,
    /// Boss takes extra ice damage.
    #[serde(rename = "WEAKICE")]
    WeakIce,
    ExplosionChallenge,
    HealLightChallenge,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::WeakFire,
        EventKind::WeakIce,
        EventKind::ExplosionChallenge,
        EventKind::HealLightChallenge,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::WeakFire => "WEAKFIRE",
            EventKind::WeakIce => "WEAKICE",
            EventKind::ExplosionChallenge => "EXPLOSION_CHALLENGE",
            EventKind::HealLightChallenge => "HEAL_LIGHT_CHALLENGE",
        }
    }

    /// The combo that completes this event, or `None` for ambient events.
    pub fn challenge_target(&self) -> Option<Command> {
        match self {
            EventKind::ExplosionChallenge => Some(Command::ExplosionCombo),
            EventKind::HealLightChallenge => Some(Command::HealingLightCombo),
            EventKind::WeakFire | EventKind::WeakIce => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Marker serialized as the string `"NONE"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum NoEvent {
    #[serde(rename = "NONE")]
    None,
}

/// Event as reported to clients: the running kind, or `"NONE"` when idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum EventStatus {
    Idle(NoEvent),
    Active(EventKind),
}

impl EventStatus {
    pub const IDLE: EventStatus = EventStatus::Idle(NoEvent::None);

    pub fn kind(&self) -> Option<EventKind> {
        match self {
            EventStatus::Active(kind) => Some(*kind),
            EventStatus::Idle(_) => None,
        }
    }
}

impl From<Option<EventKind>> for EventStatus {
    fn from(kind: Option<EventKind>) -> Self {
        kind.map_or(EventStatus::IDLE, EventStatus::Active)
    }
}

/// Marker serialized as the string `"unlimited"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Unlimited {
    Unlimited,
}

/// Mana as reported to clients: a number, or `"unlimited"` in tutorial mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ManaLevel {
    Finite(f32),
    Unlimited(Unlimited),
}

/// Boundary errors. The gesture/command core never returns these.
#[derive(Error, Debug)]
pub enum ArchmageError {
    #[error("Invalid hand pose: expected 21 landmarks, got {0}")]
    InvalidPose(usize),

    #[error("Unknown token: {0}")]
    UnknownToken(String),

    #[error("Model artifact error: {0}")]
    ModelArtifact(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Transport error: {0}")]
    Transport(String),
}
