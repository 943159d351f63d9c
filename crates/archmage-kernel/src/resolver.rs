//! [`CommandResolver`] – gesture → command gate.
//!
//! Every gesture produced for a tick passes through
//! [`CommandResolver::resolve`], which applies these stages in order:
//!
//! 1. **Acknowledgement** – `THUMBS_UP` returns immediately. No cooldown,
//!    mana or combo effect.
//! 2. **Edge trigger** – only a change to a non-`NONE` gesture can cast.
//!    Holding a pose yields `NONE`.
//! 3. **Cooldown** – an edge inside the cooldown window yields `COOLDOWN`.
//! 4. **Spellbook lookup** – combos keyed on `(gesture, last_gesture)` first,
//!    then single spells. See [`spellbook`][crate::spellbook].
//! 5. **Mana** – unaffordable casts yield `INSUFFICIENT_MANA`.
//!
//! On a successful cast mana is debited, the usage counter and combo counter
//! are bumped and the cooldown window restarts. Whatever the outcome,
//! `last_gesture` becomes the current gesture.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use archmage_kernel::resolver::{CommandResolver, ResolverState};
//! use archmage_types::{Command, GestureLabel};
//!
//! let resolver = CommandResolver::new(Duration::from_millis(500));
//! let mut state = ResolverState::default();
//!
//! let cmd = resolver.resolve(GestureLabel::Fist, Duration::from_secs(1), &mut state);
//! assert_eq!(cmd, Command::Fireball);
//! assert_eq!(state.mana.current(), 80.0);
//! ```

use std::time::Duration;

use archmage_types::{Command, GestureLabel};
use tracing::debug;

use crate::mana::ManaPool;
use crate::spellbook;
use crate::usage::UsageStats;

pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(500);

// ────────────────────────────────────────────────────────────────────────────
// State
// ────────────────────────────────────────────────────────────────────────────

/// Mutable per-session resolver state.
#[derive(Debug, Clone, Default)]
pub struct ResolverState {
    pub last_gesture: GestureLabel,
    /// Session time of the last successful cast; `None` before the first.
    pub last_command_time: Option<Duration>,
    pub combo_counter: u32,
    pub mana: ManaPool,
    pub usage: UsageStats,
}

impl ResolverState {
    pub fn with_mana(mana: ManaPool) -> Self {
        Self {
            mana,
            ..Self::default()
        }
    }

    pub fn reset_combo(&mut self) {
        self.combo_counter = 0;
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Resolver
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct CommandResolver {
    cooldown: Duration,
}

impl Default for CommandResolver {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

impl CommandResolver {
    /// A zero `cooldown` disables the cooldown gate.
    pub fn new(cooldown: Duration) -> Self {
        Self { cooldown }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Time left in the cooldown window at `now`, zero when ready.
    pub fn cooldown_remaining(&self, now: Duration, state: &ResolverState) -> Duration {
        match state.last_command_time {
            Some(last) => (last + self.cooldown).saturating_sub(now),
            None => Duration::ZERO,
        }
    }

    fn cooldown_elapsed(&self, now: Duration, state: &ResolverState) -> bool {
        if self.cooldown.is_zero() {
            return true;
        }
        match state.last_command_time {
            Some(last) => now.saturating_sub(last) > self.cooldown,
            None => true,
        }
    }

    /// Resolve `gesture` at session time `now`, updating `state`.
    pub fn resolve(&self, gesture: GestureLabel, now: Duration, state: &mut ResolverState) -> Command {
        let command = self.gate(gesture, now, state);
        state.last_gesture = gesture;
        command
    }

    fn gate(&self, gesture: GestureLabel, now: Duration, state: &mut ResolverState) -> Command {
        if gesture == GestureLabel::ThumbsUp {
            return Command::ThumbsUp;
        }

        if gesture == GestureLabel::None || gesture == state.last_gesture {
            return Command::None;
        }

        if !self.cooldown_elapsed(now, state) {
            debug!(%gesture, "edge inside cooldown window");
            return Command::Cooldown;
        }

        let Some(spell) = spellbook::lookup(gesture, state.last_gesture) else {
            return Command::None;
        };

        if !state.mana.try_debit(spell.mana_cost) {
            debug!(
                command = %spell.command,
                cost = spell.mana_cost,
                mana = state.mana.current(),
                "insufficient mana"
            );
            return Command::InsufficientMana;
        }

        state.usage.record(spell.command);
        state.combo_counter += spell.combo_points;
        state.last_command_time = Some(now);
        debug!(
            command = %spell.command,
            combo = state.combo_counter,
            mana = state.mana.current(),
            "spell cast"
        );
        spell.command
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: f32) -> Duration {
        Duration::from_secs_f32(s)
    }

    #[test]
    fn fireball_scenario_drains_mana_and_builds_combo() {
        let resolver = CommandResolver::new(Duration::from_millis(500));
        let mut state = ResolverState::with_mana(ManaPool::new(100.0, 100.0, 0.0));

        assert_eq!(resolver.resolve(GestureLabel::Fist, secs(1.0), &mut state), Command::Fireball);
        assert_eq!(state.mana.current(), 80.0);
        assert_eq!(state.combo_counter, 1);

        assert_eq!(resolver.resolve(GestureLabel::Fist, secs(2.0), &mut state), Command::None);
        assert_eq!(resolver.resolve(GestureLabel::None, secs(3.0), &mut state), Command::None);

        assert_eq!(resolver.resolve(GestureLabel::Fist, secs(4.0), &mut state), Command::Fireball);
        assert_eq!(state.mana.current(), 60.0);
        assert_eq!(state.combo_counter, 2);
        assert_eq!(state.usage.count(Command::Fireball), 2);
    }

    #[test]
    fn held_gesture_is_edge_gated() {
        let resolver = CommandResolver::new(Duration::ZERO);
        let mut state = ResolverState::default();
        resolver.resolve(GestureLabel::Point, secs(1.0), &mut state);
        for t in 2..6 {
            assert_eq!(
                resolver.resolve(GestureLabel::Point, secs(t as f32), &mut state),
                Command::None
            );
        }
        assert_eq!(state.usage.count(Command::Lightning), 1);
    }

    #[test]
    fn edge_inside_window_is_cooldown_without_side_effects() {
        let resolver = CommandResolver::new(Duration::from_millis(500));
        let mut state = ResolverState::default();
        resolver.resolve(GestureLabel::Fist, secs(1.0), &mut state);
        let mana = state.mana.current();

        let cmd = resolver.resolve(GestureLabel::Point, secs(1.2), &mut state);
        assert_eq!(cmd, Command::Cooldown);
        assert_eq!(state.mana.current(), mana);
        assert_eq!(state.combo_counter, 1);
        assert_eq!(state.last_command_time, Some(secs(1.0)));
        // last_gesture still follows the input.
        assert_eq!(state.last_gesture, GestureLabel::Point);
    }

    #[test]
    fn cooldown_remaining_counts_down() {
        let resolver = CommandResolver::new(Duration::from_millis(500));
        let mut state = ResolverState::default();
        assert_eq!(resolver.cooldown_remaining(secs(0.0), &state), Duration::ZERO);

        resolver.resolve(GestureLabel::Fist, secs(1.0), &mut state);
        let left = resolver.cooldown_remaining(secs(1.2), &state);
        assert!((left.as_secs_f32() - 0.3).abs() < 1e-3);
        assert_eq!(resolver.cooldown_remaining(secs(2.0), &state), Duration::ZERO);
    }

    #[test]
    fn combo_on_direct_transition() {
        let resolver = CommandResolver::new(Duration::from_millis(500));
        let mut state = ResolverState::default();

        assert_eq!(resolver.resolve(GestureLabel::OpenPalm, secs(1.0), &mut state), Command::IceShard);
        assert_eq!(
            resolver.resolve(GestureLabel::Fist, secs(2.0), &mut state),
            Command::ExplosionCombo
        );
        assert_eq!(state.combo_counter, 3);
        assert_eq!(state.mana.current(), 100.0 - 15.0 - 40.0);
    }

    #[test]
    fn lost_hand_between_gestures_breaks_the_combo() {
        let resolver = CommandResolver::new(Duration::from_millis(500));
        let mut state = ResolverState::default();

        assert_eq!(resolver.resolve(GestureLabel::OpenPalm, secs(1.0), &mut state), Command::IceShard);
        assert_eq!(resolver.resolve(GestureLabel::None, secs(2.0), &mut state), Command::None);
        assert_eq!(state.last_gesture, GestureLabel::None);
        // FIST now pairs with NONE, not OPEN_PALM.
        assert_eq!(resolver.resolve(GestureLabel::Fist, secs(3.0), &mut state), Command::Fireball);
        assert_eq!(state.combo_counter, 2);
        assert_eq!(state.usage.count(Command::ExplosionCombo), 0);
    }

    #[test]
    fn heal_and_punch_do_not_build_combo() {
        let resolver = CommandResolver::new(Duration::ZERO);
        let mut state = ResolverState::default();
        assert_eq!(resolver.resolve(GestureLabel::Bando, secs(1.0), &mut state), Command::Heal);
        assert_eq!(resolver.resolve(GestureLabel::Punch, secs(2.0), &mut state), Command::PunchCombo);
        assert_eq!(state.combo_counter, 0);
        assert_eq!(state.mana.current(), 100.0 - 30.0 - 10.0);
    }

    #[test]
    fn insufficient_mana_has_no_side_effects() {
        let resolver = CommandResolver::new(Duration::ZERO);
        let mut state = ResolverState::with_mana(ManaPool::new(100.0, 10.0, 0.0));

        assert_eq!(
            resolver.resolve(GestureLabel::Fist, secs(1.0), &mut state),
            Command::InsufficientMana
        );
        assert_eq!(state.mana.current(), 10.0);
        assert_eq!(state.combo_counter, 0);
        assert_eq!(state.usage.total(), 0);
        assert_eq!(state.last_command_time, None);
    }

    #[test]
    fn unlimited_mana_casts_freely() {
        let resolver = CommandResolver::new(Duration::ZERO);
        let mut state = ResolverState::with_mana(ManaPool::new(100.0, 0.0, 0.0));
        state.mana.set_unlimited(true);

        assert_eq!(resolver.resolve(GestureLabel::Point, secs(1.0), &mut state), Command::Lightning);
        assert_eq!(
            resolver.resolve(GestureLabel::Fist, secs(2.0), &mut state),
            Command::LightningStrikeCombo
        );
        assert_eq!(state.mana.current(), 0.0);
    }

    #[test]
    fn thumbs_up_bypasses_every_gate() {
        let resolver = CommandResolver::new(Duration::from_secs(10));
        let mut state = ResolverState::with_mana(ManaPool::new(100.0, 0.0, 0.0));
        state.last_command_time = Some(secs(1.0));

        for t in [1.1, 1.2] {
            assert_eq!(
                resolver.resolve(GestureLabel::ThumbsUp, secs(t), &mut state),
                Command::ThumbsUp
            );
        }
        assert_eq!(state.last_gesture, GestureLabel::ThumbsUp);
        assert_eq!(state.combo_counter, 0);
    }

    #[test]
    fn combo_counter_never_decreases_without_reset() {
        let resolver = CommandResolver::new(Duration::ZERO);
        let mut state = ResolverState::with_mana(ManaPool::new(1000.0, 1000.0, 0.0));
        let seq = [
            GestureLabel::Fist,
            GestureLabel::OpenPalm,
            GestureLabel::Point,
            GestureLabel::None,
            GestureLabel::Bando,
            GestureLabel::Fist,
            GestureLabel::Punch,
            GestureLabel::OpenPalm,
            GestureLabel::Fist,
        ];
        let mut prev = 0;
        for (i, g) in seq.iter().enumerate() {
            resolver.resolve(*g, secs(i as f32 + 1.0), &mut state);
            assert!(state.combo_counter >= prev);
            prev = state.combo_counter;
        }
        state.reset_combo();
        assert_eq!(state.combo_counter, 0);
    }
}
