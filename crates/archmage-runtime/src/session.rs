//! [`GameSession`] – one player's gesture-to-command pipeline.
//!
//! A session owns everything that carries state between ticks: the motion
//! detector, the resolver state (last gesture, cooldown clock, combo, mana,
//! usage), the event state and the RNG that draws events. The classifier is
//! stateless and shared between sessions.
//!
//! Time is measured as a [`Duration`] since the session was created, read
//! from a monotonic [`Instant`]. [`GameSession::tick_at`] takes that time
//! explicitly, which is what the tests drive.
//!
//! # Tick pipeline
//!
//! 1. Regenerate mana up to `now`.
//! 2. Derive this tick's gesture from the [`TickInput`]:
//!    a pose goes through the classifier and the motion detector; a label is
//!    taken as is; `Held` reuses the last observed gesture.
//! 3. Resolve the gesture into a [`Command`].
//! 4. Advance the event scheduler, which may upgrade the command to
//!    `CHALLENGE_SUCCESS`.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use archmage_perception::RuleClassifier;
//! use archmage_runtime::session::{GameConfig, GameSession, TickInput};
//! use archmage_types::{Command, GestureLabel};
//!
//! let mut session = GameSession::new("demo", &GameConfig::default(), Arc::new(RuleClassifier));
//! let out = session.tick_at(Duration::from_secs(1), TickInput::Gesture(GestureLabel::Fist));
//! assert_eq!(out.command, Command::Fireball);
//! assert_eq!(out.combo, 1);
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use archmage_kernel::events::{DEFAULT_EVENT_COOLDOWN, DEFAULT_EVENT_DURATION};
use archmage_kernel::mana::{DEFAULT_MAX_MANA, DEFAULT_REGEN_PER_SEC};
use archmage_kernel::resolver::DEFAULT_COOLDOWN;
use archmage_kernel::{
    CommandResolver, EventScheduler, EventState, EventTransition, ManaPool, ResolverState,
};
use archmage_perception::{MotionGestureDetector, PoseClassifier};
use archmage_types::{Command, EventStatus, GestureLabel, HandPose, ManaLevel};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

/// Game tuning shared by every session a registry creates.
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    /// Minimum gap between casts. Zero disables the cooldown gate.
    pub cooldown: Duration,
    pub max_mana: f32,
    pub starting_mana: f32,
    pub mana_regen_per_sec: f32,
    pub event_cooldown: Duration,
    pub event_duration: Duration,
    /// Seed for the event RNG. `None` draws from OS entropy.
    pub rng_seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            cooldown: DEFAULT_COOLDOWN,
            max_mana: DEFAULT_MAX_MANA,
            starting_mana: DEFAULT_MAX_MANA,
            mana_regen_per_sec: DEFAULT_REGEN_PER_SEC,
            event_cooldown: DEFAULT_EVENT_COOLDOWN,
            event_duration: DEFAULT_EVENT_DURATION,
            rng_seed: None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tick input / output
// ────────────────────────────────────────────────────────────────────────────

/// What a tick is driven by.
#[derive(Debug, Clone, PartialEq)]
pub enum TickInput {
    /// Reuse the last observed gesture.
    Held,
    /// An already-classified label (e.g. from a client-side recognizer).
    Gesture(GestureLabel),
    /// A camera frame: `None` when no hand was detected.
    Pose(Option<HandPose>),
}

/// Per-tick snapshot returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TickOutcome {
    pub command: Command,
    /// The running event, or `"NONE"`.
    pub event: EventStatus,
    /// Seconds left in the cooldown window.
    pub cooldown: f32,
    pub combo: u32,
    pub gesture: GestureLabel,
    pub mana: ManaLevel,
    pub max_mana: f32,
    /// Reserved; always zero.
    pub challenge_progress: u32,
    /// Reserved; always zero.
    pub challenge_target: u32,
}

/// Usage statistics report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SpellStats {
    pub spell_stats: BTreeMap<String, u32>,
    pub favorite_spell: Option<Command>,
    pub favorite_spell_display: String,
    pub favorite_spell_count: u32,
}

// ────────────────────────────────────────────────────────────────────────────
// Session
// ────────────────────────────────────────────────────────────────────────────

pub struct GameSession {
    id: String,
    created: Instant,
    classifier: Arc<dyn PoseClassifier>,
    motion: MotionGestureDetector,
    resolver: CommandResolver,
    resolver_state: ResolverState,
    scheduler: EventScheduler,
    events: EventState,
    rng: ChaCha8Rng,
    current_gesture: GestureLabel,
}

impl GameSession {
    pub fn new(id: impl Into<String>, config: &GameConfig, classifier: Arc<dyn PoseClassifier>) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let mana = ManaPool::new(config.max_mana, config.starting_mana, config.mana_regen_per_sec);
        let id = id.into();
        info!(session = %id, classifier = %classifier.strategy(), "session created");
        Self {
            id,
            created: Instant::now(),
            classifier,
            motion: MotionGestureDetector::new(),
            resolver: CommandResolver::new(config.cooldown),
            resolver_state: ResolverState::with_mana(mana),
            scheduler: EventScheduler::new(config.event_cooldown, config.event_duration),
            events: EventState::default(),
            rng,
            current_gesture: GestureLabel::None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Session time on the monotonic clock.
    pub fn elapsed(&self) -> Duration {
        self.created.elapsed()
    }

    /// One tick at the current session time.
    pub fn tick(&mut self, input: TickInput) -> TickOutcome {
        let now = self.elapsed();
        self.tick_at(now, input)
    }

    /// One tick at an explicit session time.
    pub fn tick_at(&mut self, now: Duration, input: TickInput) -> TickOutcome {
        self.resolver_state.mana.regenerate(now);

        let gesture = self.observe(input);
        let resolved = self.resolver.resolve(gesture, now, &mut self.resolver_state);
        let outcome = self
            .scheduler
            .advance(resolved, now, &mut self.events, &mut self.rng);

        if let Some(transition) = outcome.transition {
            match transition {
                EventTransition::Started(kind) => info!(session = %self.id, event = %kind, "event started"),
                EventTransition::Expired(kind) => info!(session = %self.id, event = %kind, "event expired"),
                EventTransition::Completed(kind) => info!(session = %self.id, event = %kind, "challenge completed"),
            }
        }
        debug!(session = %self.id, %gesture, command = %outcome.command, "tick");

        self.snapshot(now, outcome.command)
    }

    fn observe(&mut self, input: TickInput) -> GestureLabel {
        match input {
            TickInput::Held => {}
            TickInput::Gesture(label) => self.current_gesture = label,
            TickInput::Pose(pose) => {
                let static_label = pose
                    .as_ref()
                    .map(|p| self.classifier.classify(p))
                    .unwrap_or(GestureLabel::None);
                self.current_gesture = self.motion.observe(pose.as_ref(), static_label);
            }
        }
        self.current_gesture
    }

    fn snapshot(&self, now: Duration, command: Command) -> TickOutcome {
        let mana = &self.resolver_state.mana;
        TickOutcome {
            command,
            event: EventStatus::from(self.events.active_kind()),
            cooldown: self
                .resolver
                .cooldown_remaining(now, &self.resolver_state)
                .as_secs_f32(),
            combo: self.resolver_state.combo_counter,
            gesture: self.current_gesture,
            mana: mana.level(),
            max_mana: mana.max(),
            challenge_progress: 0,
            challenge_target: 0,
        }
    }

    // ── Side channels ───────────────────────────────────────────────────────

    /// Record an out-of-band gesture observation for the next held tick.
    pub fn set_gesture(&mut self, gesture: GestureLabel) {
        debug!(session = %self.id, %gesture, "gesture set");
        self.current_gesture = gesture;
    }

    /// Credit (or with a negative amount, drain) mana. Returns the new level.
    pub fn add_mana(&mut self, amount: f32) -> ManaLevel {
        self.resolver_state.mana.credit(amount);
        self.resolver_state.mana.level()
    }

    pub fn set_tutorial_mode(&mut self, enabled: bool) -> ManaLevel {
        info!(session = %self.id, enabled, "tutorial mode");
        self.resolver_state.mana.set_unlimited(enabled);
        self.resolver_state.mana.level()
    }

    pub fn reset_combo(&mut self) {
        self.resolver_state.reset_combo();
    }

    pub fn reset_spell_stats(&mut self) {
        self.resolver_state.usage.reset();
    }

    pub fn spell_stats(&self) -> SpellStats {
        let usage = &self.resolver_state.usage;
        let spell_stats = usage
            .snapshot()
            .into_iter()
            .map(|(c, n)| (c.as_str().to_string(), n))
            .collect();
        let favorite = usage.most_used();
        SpellStats {
            spell_stats,
            favorite_spell: favorite.map(|(c, _)| c),
            favorite_spell_display: favorite
                .map(|(c, _)| c.display_name())
                .unwrap_or("None")
                .to_string(),
            favorite_spell_count: favorite.map(|(_, n)| n).unwrap_or(0),
        }
    }

    pub fn combo(&self) -> u32 {
        self.resolver_state.combo_counter
    }

    pub fn mana(&self) -> ManaLevel {
        self.resolver_state.mana.level()
    }

    pub fn event_state(&self) -> &EventState {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archmage_perception::RuleClassifier;
    use archmage_types::{
        INDEX_MCP, INDEX_TIP, LANDMARK_COUNT, Landmark, MIDDLE_MCP, MIDDLE_TIP, PINKY_MCP,
        EventKind, PINKY_TIP, RING_MCP, RING_TIP, Unlimited,
    };

    fn secs(s: f32) -> Duration {
        Duration::from_secs_f32(s)
    }

    fn quiet_config() -> GameConfig {
        GameConfig {
            mana_regen_per_sec: 0.0,
            event_cooldown: Duration::from_secs(3600),
            rng_seed: Some(7),
            ..GameConfig::default()
        }
    }

    fn session(config: &GameConfig) -> GameSession {
        GameSession::new("test", config, Arc::new(RuleClassifier))
    }

    /// A hand with the given finger curls, scaled around the frame centre.
    fn hand(curled: [bool; 4], scale: f32) -> HandPose {
        let mut lms = vec![Landmark::new(0.5, 0.5, 0.0); LANDMARK_COUNT];
        let fingers = [
            (INDEX_MCP, INDEX_TIP),
            (MIDDLE_MCP, MIDDLE_TIP),
            (RING_MCP, RING_TIP),
            (PINKY_MCP, PINKY_TIP),
        ];
        for (i, ((mcp, tip), c)) in fingers.into_iter().zip(curled).enumerate() {
            let x = 0.5 + (i as f32 - 1.5) * 0.05 * scale;
            lms[mcp] = Landmark::new(x, 0.5, 0.0);
            lms[tip] = Landmark::new(x, if c { 0.5 + 0.1 * scale } else { 0.5 - 0.2 * scale }, 0.0);
        }
        lms[0] = Landmark::new(0.5, 0.5 + 0.2 * scale, 0.0);
        HandPose::new(lms).unwrap()
    }

    #[test]
    fn mana_scenario_over_held_ticks() {
        let mut s = session(&quiet_config());

        let out = s.tick_at(secs(1.0), TickInput::Gesture(GestureLabel::Fist));
        assert_eq!(out.command, Command::Fireball);
        assert_eq!(out.mana, ManaLevel::Finite(80.0));
        assert_eq!(out.combo, 1);

        assert_eq!(s.tick_at(secs(2.0), TickInput::Held).command, Command::None);
        assert_eq!(s.tick_at(secs(3.0), TickInput::Gesture(GestureLabel::None)).command, Command::None);

        let out = s.tick_at(secs(4.0), TickInput::Gesture(GestureLabel::Fist));
        assert_eq!(out.command, Command::Fireball);
        assert_eq!(out.mana, ManaLevel::Finite(60.0));
        assert_eq!(out.combo, 2);
    }

    #[test]
    fn poses_go_through_classifier() {
        let mut s = session(&quiet_config());
        let out = s.tick_at(secs(1.0), TickInput::Pose(Some(hand([false; 4], 1.0))));
        assert_eq!(out.gesture, GestureLabel::OpenPalm);
        assert_eq!(out.command, Command::IceShard);

        let out = s.tick_at(secs(2.0), TickInput::Pose(Some(hand([true; 4], 1.0))));
        assert_eq!(out.gesture, GestureLabel::Fist);
        assert_eq!(out.command, Command::ExplosionCombo);
    }

    #[test]
    fn fist_thrust_becomes_punch_combo() {
        let mut s = session(&quiet_config());
        s.tick_at(secs(1.0), TickInput::Pose(Some(hand([true; 4], 1.0))));
        let out = s.tick_at(secs(2.0), TickInput::Pose(Some(hand([true; 4], 2.0))));
        assert_eq!(out.gesture, GestureLabel::Punch);
        assert_eq!(out.command, Command::PunchCombo);
    }

    #[test]
    fn lost_hand_reads_as_none() {
        let mut s = session(&quiet_config());
        s.tick_at(secs(1.0), TickInput::Pose(Some(hand([true; 4], 1.0))));
        let out = s.tick_at(secs(2.0), TickInput::Pose(None));
        assert_eq!(out.gesture, GestureLabel::None);
        assert_eq!(out.command, Command::None);
    }

    #[test]
    fn set_gesture_feeds_next_held_tick() {
        let mut s = session(&quiet_config());
        s.set_gesture(GestureLabel::Point);
        let out = s.tick_at(secs(1.0), TickInput::Held);
        assert_eq!(out.command, Command::Lightning);
        assert_eq!(out.gesture, GestureLabel::Point);
    }

    #[test]
    fn cooldown_seconds_reported() {
        let mut s = session(&quiet_config());
        s.tick_at(secs(1.0), TickInput::Gesture(GestureLabel::Fist));
        let out = s.tick_at(secs(1.1), TickInput::Gesture(GestureLabel::Point));
        assert_eq!(out.command, Command::Cooldown);
        assert!((out.cooldown - 0.4).abs() < 1e-3);
    }

    #[test]
    fn tutorial_mode_reports_unlimited_and_restores_max() {
        let mut s = session(&quiet_config());
        s.add_mana(-90.0);
        assert_eq!(
            s.set_tutorial_mode(true),
            ManaLevel::Unlimited(Unlimited::Unlimited)
        );
        let out = s.tick_at(secs(1.0), TickInput::Gesture(GestureLabel::Bando));
        assert_eq!(out.command, Command::Heal);
        assert_eq!(out.mana, ManaLevel::Unlimited(Unlimited::Unlimited));

        assert_eq!(s.set_tutorial_mode(false), ManaLevel::Finite(100.0));
    }

    #[test]
    fn add_mana_clamps() {
        let mut s = session(&quiet_config());
        assert_eq!(s.add_mana(50.0), ManaLevel::Finite(100.0));
        assert_eq!(s.add_mana(-500.0), ManaLevel::Finite(0.0));
        let out = s.tick_at(secs(1.0), TickInput::Gesture(GestureLabel::OpenPalm));
        assert_eq!(out.command, Command::InsufficientMana);
    }

    #[test]
    fn stats_report_favourite_and_reset() {
        let mut s = session(&GameConfig {
            cooldown: Duration::ZERO,
            ..quiet_config()
        });
        s.tick_at(secs(1.0), TickInput::Gesture(GestureLabel::Point));
        s.tick_at(secs(2.0), TickInput::Gesture(GestureLabel::None));
        s.tick_at(secs(3.0), TickInput::Gesture(GestureLabel::Point));

        let stats = s.spell_stats();
        assert_eq!(stats.favorite_spell, Some(Command::Lightning));
        assert_eq!(stats.favorite_spell_count, 2);
        assert_eq!(stats.spell_stats["LIGHTNING"], 2);
        assert_eq!(stats.spell_stats["FIREBALL"], 0);

        s.reset_spell_stats();
        let stats = s.spell_stats();
        assert_eq!(stats.favorite_spell, None);
        assert_eq!(stats.favorite_spell_display, "None");
        assert_eq!(stats.favorite_spell_count, 0);
    }

    #[test]
    fn reset_combo_zeroes_counter() {
        let mut s = session(&quiet_config());
        s.tick_at(secs(1.0), TickInput::Gesture(GestureLabel::Fist));
        assert_eq!(s.combo(), 1);
        s.reset_combo();
        assert_eq!(s.combo(), 0);
    }

    #[test]
    fn challenge_completion_upgrades_tick_command() {
        let config = GameConfig {
            event_cooldown: Duration::ZERO,
            event_duration: Duration::from_secs(60),
            ..quiet_config()
        };
        let mut s = session(&config);
        // Draw events until an explosion challenge is running.
        let mut t = 1.0;
        while s.event_state().active_kind() != Some(EventKind::ExplosionChallenge) {
            // Let whatever is running expire, then idle into a fresh draw.
            t += 61.0;
            s.tick_at(secs(t), TickInput::Held);
        }

        s.tick_at(secs(t + 1.0), TickInput::Gesture(GestureLabel::OpenPalm));
        let out = s.tick_at(secs(t + 2.0), TickInput::Gesture(GestureLabel::Fist));
        assert_eq!(out.command, Command::ChallengeSuccess);
        assert_eq!(out.event, EventStatus::IDLE);
        assert_eq!(serde_json::to_value(&out).unwrap()["event"], "NONE");
        assert_eq!(out.combo, 3);
    }

    #[test]
    fn outcome_serializes_with_wire_names() {
        let mut s = session(&quiet_config());
        let out = s.tick_at(secs(1.0), TickInput::Gesture(GestureLabel::OpenPalm));
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["command"], "ICE_SHARD");
        assert_eq!(json["gesture"], "OPEN_PALM");
        assert_eq!(json["event"], "NONE");
        assert_eq!(json["max_mana"], 100.0);
    }
}
