//! `archmage-kernel` – Spell Rules & Orchestration
//!
//! The rules engine of Archmage. It does not see hands; it turns a sequence
//! of gesture labels into rate-limited, mana-gated game commands.
//!
//! # Modules
//!
//! - [`spellbook`] – the static command table: which gesture (or ordered
//!   gesture pair) casts which [`Command`][archmage_types::Command], its mana
//!   cost and its combo value.
//! - [`mana`] – [`ManaPool`][mana::ManaPool]: bounded resource with lazy,
//!   time-based regeneration and an unlimited (tutorial) mode.
//! - [`usage`] – [`UsageStats`][usage::UsageStats]: per-command cast counts
//!   and the favourite spell.
//! - [`resolver`] – [`CommandResolver`][resolver::CommandResolver]: the single
//!   gate every gesture passes through. Enforces, in order, the edge trigger,
//!   the cooldown window and the mana economy.
//! - [`events`] – [`EventScheduler`][events::EventScheduler]: randomized timed
//!   world events and challenges that can upgrade a resolved command into
//!   `CHALLENGE_SUCCESS`.

pub mod events;
pub mod mana;
pub mod resolver;
pub mod spellbook;
pub mod usage;

pub use events::{EventOutcome, EventPhase, EventScheduler, EventState, EventTransition};
pub use mana::ManaPool;
pub use resolver::{CommandResolver, ResolverState};
pub use spellbook::Spell;
pub use usage::UsageStats;
