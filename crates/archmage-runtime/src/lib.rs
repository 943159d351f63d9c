//! `archmage-runtime` – Session Orchestration
//!
//! Wires perception and the rules kernel into playable sessions.
//!
//! # Modules
//!
//! - [`session`] – [`GameSession`][session::GameSession]: one player's full
//!   pipeline. Each [`tick`][session::GameSession::tick] is a single atomic
//!   step: regenerate mana, turn the latest observation into a gesture label
//!   (classifier + motion detector), resolve it into a command, then advance
//!   the event scheduler.
//! - [`registry`] – [`SessionRegistry`][registry::SessionRegistry]: the
//!   thread-safe map of live sessions. Sessions are independent; each sits
//!   behind its own mutex so ticks on one never block another.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: installs the
//!   global `tracing` subscriber with an optional OTLP span exporter.

pub mod registry;
pub mod session;
pub mod telemetry;

pub use registry::{DEFAULT_SESSION, SessionHandle, SessionRegistry};
pub use session::{GameConfig, GameSession, SpellStats, TickInput, TickOutcome};
pub use telemetry::{TracerProviderGuard, init_tracing};
