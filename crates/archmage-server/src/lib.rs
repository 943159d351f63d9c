//! `archmage-server` – HTTP & WebSocket Game Server
//!
//! Boots an axum HTTP + WebSocket server (default port `5001`) in front of
//! a [`SessionRegistry`][archmage_runtime::SessionRegistry]:
//!
//! 1. **HTTP** – each path names one operation:
//!    `/get_command`, `/tick`, `/set_gesture`, `/add_mana`,
//!    `/set_tutorial_mode`, `/reset_combo`, `/reset_spell_stats`,
//!    `/get_spell_stats` and `/schema`. Bodies are JSON; the target session
//!    comes from the body's `session`, the `?session=` query, or defaults to
//!    `"default"`.
//!
//! 2. **WebSocket** – `/ws` upgrades to a persistent connection sending the
//!    same operations as `{"op": "<name>", ...}` frames. A connection is
//!    bound to a freshly generated session, released when the socket closes,
//!    unless a message names one.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use archmage_perception::RuleClassifier;
//! use archmage_runtime::{GameConfig, SessionRegistry};
//! use archmage_server::ArchmageServer;
//!
//! #[tokio::main]
//! async fn main() {
//!     let registry = Arc::new(SessionRegistry::new(GameConfig::default(), Arc::new(RuleClassifier)));
//!     ArchmageServer::new(registry)
//!         .with_port(5001)
//!         .run()
//!         .await
//!         .expect("archmage server failed");
//! }
//! ```

pub mod protocol;
pub mod server;

pub use protocol::{Ack, RequestBody, Route, WsMessage};
pub use server::{ArchmageServer, DEFAULT_PORT, WS_PATH, dispatch, router, serve};
