//! [`SessionRegistry`] – the live session table.
//!
//! Sessions are created on first use and live until removed. The table lock
//! is held only long enough to look up or insert a handle; a tick locks just
//! its own session, so independent sessions run in parallel while ticks on
//! the same session are serialized.
//!
//! A poisoned lock (a panic while a session was being ticked) is recovered
//! rather than propagated: session state is plain data that is always left
//! consistent between field writes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use archmage_perception::PoseClassifier;
use tracing::{info, warn};

use crate::session::{GameConfig, GameSession};

/// Session id used when a client does not name one.
pub const DEFAULT_SESSION: &str = "default";

pub type SessionHandle = Arc<Mutex<GameSession>>;

pub struct SessionRegistry {
    config: GameConfig,
    classifier: Arc<dyn PoseClassifier>,
    sessions: Mutex<HashMap<String, SessionHandle>>,
}

fn lock_recovering<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        warn!("recovering poisoned lock");
        poisoned.into_inner()
    })
}

impl SessionRegistry {
    pub fn new(config: GameConfig, classifier: Arc<dyn PoseClassifier>) -> Self {
        Self {
            config,
            classifier,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Fetch the session `id`, creating it if needed.
    pub fn get_or_create(&self, id: &str) -> SessionHandle {
        let mut sessions = lock_recovering(&self.sessions);
        sessions
            .entry(id.to_string())
            .or_insert_with(|| {
                Arc::new(Mutex::new(GameSession::new(
                    id,
                    &self.config,
                    Arc::clone(&self.classifier),
                )))
            })
            .clone()
    }

    pub fn get(&self, id: &str) -> Option<SessionHandle> {
        lock_recovering(&self.sessions).get(id).cloned()
    }

    /// Run `f` on session `id` (created if needed) under its lock.
    pub fn with_session<R>(&self, id: &str, f: impl FnOnce(&mut GameSession) -> R) -> R {
        let handle = self.get_or_create(id);
        let mut session = lock_recovering(&handle);
        f(&mut session)
    }

    pub fn remove(&self, id: &str) -> bool {
        let removed = lock_recovering(&self.sessions).remove(id).is_some();
        if removed {
            info!(session = %id, "session removed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        lock_recovering(&self.sessions).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted ids of all live sessions.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = lock_recovering(&self.sessions).keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::TickInput;
    use archmage_perception::RuleClassifier;
    use archmage_types::{Command, GestureLabel};
    use std::thread;
    use std::time::Duration;

    fn registry() -> SessionRegistry {
        let config = GameConfig {
            rng_seed: Some(1),
            event_cooldown: Duration::from_secs(3600),
            ..GameConfig::default()
        };
        SessionRegistry::new(config, Arc::new(RuleClassifier))
    }

    #[test]
    fn sessions_are_created_once() {
        let reg = registry();
        let a = reg.get_or_create("alice");
        let b = reg.get_or_create("alice");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(reg.len(), 1);
        assert!(reg.get("bob").is_none());
    }

    #[test]
    fn sessions_are_independent() {
        let reg = registry();
        let fire = reg.with_session("alice", |s| {
            s.tick_at(Duration::from_secs(1), TickInput::Gesture(GestureLabel::Fist))
        });
        assert_eq!(fire.command, Command::Fireball);

        let other = reg.with_session("bob", |s| {
            s.tick_at(Duration::from_secs(1), TickInput::Held)
        });
        assert_eq!(other.combo, 0);
        assert_eq!(reg.ids(), vec!["alice".to_string(), "bob".to_string()]);
    }

    #[test]
    fn remove_drops_session() {
        let reg = registry();
        reg.get_or_create(DEFAULT_SESSION);
        assert!(reg.remove(DEFAULT_SESSION));
        assert!(!reg.remove(DEFAULT_SESSION));
        assert!(reg.is_empty());
    }

    #[test]
    fn parallel_ticks_on_one_session_are_serialized() {
        let reg = Arc::new(registry());
        reg.with_session("shared", |s| s.add_mana(0.0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let reg = Arc::clone(&reg);
                thread::spawn(move || {
                    for _ in 0..50 {
                        reg.with_session("shared", |s| s.add_mana(-1.0));
                        reg.with_session("shared", |s| s.add_mana(1.0));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let mana = reg.with_session("shared", |s| s.mana());
        assert_eq!(mana, archmage_types::ManaLevel::Finite(100.0));
    }

    #[test]
    fn poisoned_session_is_recovered() {
        let reg = Arc::new(registry());
        let handle = reg.get_or_create("fragile");
        let poison = Arc::clone(&handle);
        let _ = thread::spawn(move || {
            let _guard = poison.lock().unwrap();
            panic!("boom");
        })
        .join();
        assert!(handle.is_poisoned());

        let combo = reg.with_session("fragile", |s| s.combo());
        assert_eq!(combo, 0);
    }
}
