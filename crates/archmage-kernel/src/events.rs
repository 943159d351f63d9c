//! [`EventScheduler`] – randomized timed world events and challenges.
//!
//! The scheduler is a two-state machine driven once per tick:
//!
//! ```text
//!   IDLE ──(now − last_end > cooldown)──▶ ACTIVE(kind, start = now)
//!   ACTIVE ──(now − start > duration)──▶ IDLE   (expired, no reward)
//!   ACTIVE ──(command == target combo)──▶ IDLE  (completed)
//! ```
//!
//! The kind is drawn uniformly from [`EventKind::ALL`] with a caller-supplied
//! RNG, so a seeded RNG gives reproducible schedules. Ambient events
//! (`WEAKFIRE`, `WEAKICE`) have no target and only ever expire. Completing a
//! challenge upgrades the tick's command to `CHALLENGE_SUCCESS`.
//!
//! At most one transition happens per tick.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use archmage_kernel::events::{EventPhase, EventScheduler, EventState};
//! use archmage_types::Command;
//! use rand::SeedableRng;
//!
//! let scheduler = EventScheduler::new(Duration::from_secs(10), Duration::from_secs(8));
//! let mut state = EventState::default();
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//!
//! scheduler.advance(Command::None, Duration::from_secs(5), &mut state, &mut rng);
//! assert_eq!(state.phase, EventPhase::Idle);
//!
//! scheduler.advance(Command::None, Duration::from_secs(11), &mut state, &mut rng);
//! assert_eq!(state.phase, EventPhase::Active);
//! ```

use std::time::Duration;

use archmage_types::{Command, EventKind};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

pub const DEFAULT_EVENT_COOLDOWN: Duration = Duration::from_secs(10);
pub const DEFAULT_EVENT_DURATION: Duration = Duration::from_secs(8);

// ────────────────────────────────────────────────────────────────────────────
// State
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventPhase {
    #[default]
    Idle,
    Active,
}

/// Per-session event state. `kind`, `start_time` and `challenge_target` are
/// meaningful only while [`EventPhase::Active`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventState {
    pub phase: EventPhase,
    pub kind: Option<EventKind>,
    pub start_time: Duration,
    pub challenge_target: Option<Command>,
    /// Session time the last event ended; the cooldown baseline.
    pub last_event_end: Duration,
}

impl EventState {
    /// The running event, if any.
    pub fn active_kind(&self) -> Option<EventKind> {
        match self.phase {
            EventPhase::Active => self.kind,
            EventPhase::Idle => None,
        }
    }

    fn finish(&mut self, at: Duration) -> Option<EventKind> {
        let kind = self.kind.take();
        self.phase = EventPhase::Idle;
        self.challenge_target = None;
        self.last_event_end = at;
        kind
    }
}

/// A phase change that happened during [`EventScheduler::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTransition {
    Started(EventKind),
    Expired(EventKind),
    Completed(EventKind),
}

/// Result of one scheduler step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventOutcome {
    /// The tick's command, upgraded to `CHALLENGE_SUCCESS` on completion.
    pub command: Command,
    pub transition: Option<EventTransition>,
}

// ────────────────────────────────────────────────────────────────────────────
// Scheduler
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct EventScheduler {
    cooldown: Duration,
    duration: Duration,
}

impl Default for EventScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_COOLDOWN, DEFAULT_EVENT_DURATION)
    }
}

impl EventScheduler {
    pub fn new(cooldown: Duration, duration: Duration) -> Self {
        Self { cooldown, duration }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Advance the machine to `now`, given the command the resolver produced
    /// for this tick.
    pub fn advance<R: Rng + ?Sized>(
        &self,
        command: Command,
        now: Duration,
        state: &mut EventState,
        rng: &mut R,
    ) -> EventOutcome {
        let transition = match state.phase {
            EventPhase::Active => self.settle(command, now, state),
            EventPhase::Idle => self.maybe_start(now, state, rng),
        };

        let command = match transition {
            Some(EventTransition::Completed(_)) => Command::ChallengeSuccess,
            _ => command,
        };

        EventOutcome { command, transition }
    }

    fn settle(&self, command: Command, now: Duration, state: &mut EventState) -> Option<EventTransition> {
        if now.saturating_sub(state.start_time) > self.duration {
            let ended_at = state.start_time + self.duration;
            let kind = state.finish(ended_at)?;
            debug!(event = %kind, "event expired");
            return Some(EventTransition::Expired(kind));
        }

        if state.challenge_target.is_some_and(|target| target == command) {
            let kind = state.finish(now)?;
            debug!(event = %kind, %command, "challenge completed");
            return Some(EventTransition::Completed(kind));
        }

        None
    }

    fn maybe_start<R: Rng + ?Sized>(
        &self,
        now: Duration,
        state: &mut EventState,
        rng: &mut R,
    ) -> Option<EventTransition> {
        if now.saturating_sub(state.last_event_end) <= self.cooldown {
            return None;
        }
        let kind = *EventKind::ALL.choose(rng)?;
        state.phase = EventPhase::Active;
        state.kind = Some(kind);
        state.start_time = now;
        state.challenge_target = kind.challenge_target();
        debug!(event = %kind, target = ?state.challenge_target, "event started");
        Some(EventTransition::Started(kind))
    }
}
