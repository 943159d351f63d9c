//! [`ManaPool`] – the per-session spell resource.
//!
//! Mana lives in `[0, max]`. It regenerates at a fixed rate, computed lazily
//! from elapsed session time whenever [`ManaPool::regenerate`] is called, so
//! no background timer is needed.
//!
//! In *unlimited* (tutorial) mode every cast is affordable and nothing is
//! debited. Leaving unlimited mode refills the pool to `max`.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use archmage_kernel::mana::ManaPool;
//!
//! let mut pool = ManaPool::new(100.0, 100.0, 5.0);
//! assert!(pool.try_debit(20.0));
//! assert_eq!(pool.current(), 80.0);
//!
//! pool.regenerate(Duration::from_secs(2));
//! assert_eq!(pool.current(), 90.0);
//! ```

use std::time::Duration;

use archmage_types::{ManaLevel, Unlimited};
use tracing::debug;

pub const DEFAULT_MAX_MANA: f32 = 100.0;
pub const DEFAULT_REGEN_PER_SEC: f32 = 5.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ManaPool {
    current: f32,
    max: f32,
    regen_per_sec: f32,
    unlimited: bool,
    /// Session time up to which regeneration has been applied.
    regen_clock: Duration,
}

impl Default for ManaPool {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MANA, DEFAULT_MAX_MANA, DEFAULT_REGEN_PER_SEC)
    }
}

impl ManaPool {
    /// Create a pool. `starting` is clamped into `[0, max]`; a negative `max`
    /// is treated as zero.
    pub fn new(max: f32, starting: f32, regen_per_sec: f32) -> Self {
        let max = max.max(0.0);
        Self {
            current: starting.clamp(0.0, max),
            max,
            regen_per_sec: regen_per_sec.max(0.0),
            unlimited: false,
            regen_clock: Duration::ZERO,
        }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn is_unlimited(&self) -> bool {
        self.unlimited
    }

    /// Client-facing level: a number, or `"unlimited"`.
    pub fn level(&self) -> ManaLevel {
        if self.unlimited {
            ManaLevel::Unlimited(Unlimited::Unlimited)
        } else {
            ManaLevel::Finite(self.current)
        }
    }

    /// Apply regeneration for the time elapsed since the last call.
    ///
    /// The regen clock always advances, so time spent in unlimited mode is
    /// not paid out retroactively. `now` earlier than the clock is a no-op.
    pub fn regenerate(&mut self, now: Duration) {
        let Some(elapsed) = now.checked_sub(self.regen_clock) else {
            return;
        };
        self.regen_clock = now;
        if self.unlimited || self.current >= self.max {
            return;
        }
        let gained = elapsed.as_secs_f32() * self.regen_per_sec;
        self.current = (self.current + gained).min(self.max);
    }

    pub fn can_afford(&self, cost: f32) -> bool {
        self.unlimited || self.current >= cost
    }

    /// Spend `cost` if affordable. Returns `false` and leaves the pool
    /// untouched otherwise. Unlimited mode never debits.
    pub fn try_debit(&mut self, cost: f32) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        if !self.unlimited {
            self.current = (self.current - cost).max(0.0);
        }
        true
    }

    /// Add a signed `amount`, clamped into `[0, max]`.
    pub fn credit(&mut self, amount: f32) {
        self.current = (self.current + amount).clamp(0.0, self.max);
        debug!(amount, current = self.current, "mana credited");
    }

    /// Enter or leave unlimited mode. Leaving refills the pool.
    pub fn set_unlimited(&mut self, enabled: bool) {
        if self.unlimited && !enabled {
            self.current = self.max;
        }
        self.unlimited = enabled;
    }
}
