//! Session Registry
//!
//! Process-wide map of active matches. Lookups and inserts on different
//! matches never contend; each match serializes its own operations behind
//! the lock inside [`GameSession`].

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, info};

use crate::core::ids::MatchId;
use crate::core::rng::DeterministicRng;
use crate::game::rules::GameRules;
use crate::game::state::GameSession;

/// Registry of active match sessions.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: DashMap<MatchId, Arc<GameSession>>,
    rules: GameRules,
}

impl SessionRegistry {
    /// Create an empty registry; new sessions use `rules`.
    pub fn new(rules: GameRules) -> Self {
        Self {
            sessions: DashMap::new(),
            rules,
        }
    }

    /// Rules applied to newly created sessions.
    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    /// Create an empty session for `match_id`.
    ///
    /// Returns false if a session with that id already exists.
    pub fn create(&self, match_id: &MatchId) -> bool {
        let rng = DeterministicRng::for_match(match_id, &[]);
        self.insert(GameSession::new(match_id.clone(), self.rules.clone(), rng))
    }

    /// Register a prepared session.
    ///
    /// Returns false (and drops `session`) if its id is taken.
    pub fn insert(&self, session: GameSession) -> bool {
        match self.sessions.entry(session.match_id().clone()) {
            Entry::Occupied(_) => {
                debug!(match_id = %session.match_id(), "session already exists");
                false
            }
            Entry::Vacant(slot) => {
                info!(match_id = %session.match_id(), "session created");
                slot.insert(Arc::new(session));
                true
            }
        }
    }

    /// Look up a session.
    pub fn get(&self, match_id: &MatchId) -> Option<Arc<GameSession>> {
        self.sessions.get(match_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Remove a session. Returns whether it existed.
    pub fn remove(&self, match_id: &MatchId) -> bool {
        let removed = self.sessions.remove(match_id).is_some();
        if removed {
            info!(%match_id, "session removed");
        }
        removed
    }

    /// Whether a session exists.
    pub fn exists(&self, match_id: &MatchId) -> bool {
        self.sessions.contains_key(match_id)
    }

    /// Every active session.
    pub fn all_sessions(&self) -> Vec<Arc<GameSession>> {
        self.sessions.iter().map(|entry| Arc::clone(entry.value())).collect()
    }

    /// Number of active sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session is active.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(GameRules::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn id(raw: &str) -> MatchId {
        MatchId::parse(raw).unwrap()
    }

    #[test]
    fn test_create_get_remove() {
        let registry = SessionRegistry::default();
        assert!(registry.is_empty());

        assert!(registry.create(&id("m1")));
        assert!(!registry.create(&id("m1")));
        assert!(registry.exists(&id("m1")));
        assert_eq!(registry.get(&id("m1")).unwrap().match_id(), &id("m1"));
        assert_eq!(registry.len(), 1);

        assert!(registry.remove(&id("m1")));
        assert!(!registry.remove(&id("m1")));
        assert!(registry.get(&id("m1")).is_none());
    }

    #[test]
    fn test_sessions_use_registry_rules() {
        let rules = GameRules {
            hand_size: 7,
            ..GameRules::default()
        };
        let registry = SessionRegistry::new(rules);
        registry.create(&id("m1"));
        assert_eq!(registry.get(&id("m1")).unwrap().lock().rules.hand_size, 7);
    }

    #[test]
    fn test_concurrent_create_has_single_winner() {
        let registry = Arc::new(SessionRegistry::default());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.create(&id("contested")))
            })
            .collect();

        let created = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(created, 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_all_sessions() {
        let registry = SessionRegistry::default();
        for raw in ["a", "b", "c"] {
            registry.create(&id(raw));
        }
        let mut ids: Vec<String> = registry
            .all_sessions()
            .iter()
            .map(|s| s.match_id().to_string())
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
