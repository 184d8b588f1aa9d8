use cardscore_types::Ledger;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError, RwLock},
};
use tracing::{debug, error};

/// Holds one [Ledger] per session key.
///
/// Ledgers are created on first use and live as long as the store.
pub trait LedgerStore: Send + Sync + 'static {
    /// Runs `f` against the ledger for `session`, creating an empty one if
    /// needed. Calls for the same session never overlap.
    fn with_ledger<R>(&self, session: &str, f: impl FnOnce(&mut Ledger) -> R) -> R;

    /// Copy of the current ledger for `session`.
    fn snapshot(&self, session: &str) -> Ledger {
        self.with_ledger(session, |ledger| ledger.clone())
    }
}

/// Process-local [LedgerStore]. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    ledgers: RwLock<HashMap<String, Arc<Mutex<Ledger>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions that have been referenced so far.
    pub fn sessions(&self) -> usize {
        self.ledgers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn entry(&self, session: &str) -> Arc<Mutex<Ledger>> {
        let existing = self
            .ledgers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session)
            .cloned();
        if let Some(ledger) = existing {
            return ledger;
        }

        let mut ledgers = self.ledgers.write().unwrap_or_else(PoisonError::into_inner);
        ledgers
            .entry(session.to_string())
            .or_insert_with(|| {
                debug!(session, "created ledger");
                Arc::default()
            })
            .clone()
    }
}

impl LedgerStore for MemoryStore {
    fn with_ledger<R>(&self, session: &str, f: impl FnOnce(&mut Ledger) -> R) -> R {
        let ledger = self.entry(session);
        let mut ledger = ledger.lock().unwrap_or_else(|poisoned| {
            error!(session, "ledger lock poisoned, continuing with last state");
            poisoned.into_inner()
        });
        f(&mut ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardscore_execution::{apply_round, setup};
    use cardscore_types::Phase;
    use std::thread;

    #[test]
    fn test_ledgers_created_lazily() {
        let store = MemoryStore::new();
        assert_eq!(store.sessions(), 0);

        let ledger = store.snapshot("table-1");
        assert_eq!(ledger, Ledger::default());
        assert_eq!(store.sessions(), 1);

        store.snapshot("table-1");
        assert_eq!(store.sessions(), 1);
    }

    #[test]
    fn test_sessions_are_independent() {
        let store = MemoryStore::new();
        store.with_ledger("a", |ledger| setup(ledger, 2, None, &[]));

        assert_eq!(store.snapshot("a").phase, Phase::Playing);
        assert_eq!(store.snapshot("b").phase, Phase::Setup);
    }

    #[test]
    fn test_same_session_is_serialized() {
        let store = Arc::new(MemoryStore::new());
        store.with_ledger("busy", |ledger| setup(ledger, 4, Some(1), &[]));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                thread::spawn(move || {
                    for _ in 0..50 {
                        store.with_ledger("busy", |ledger| apply_round(ledger, 1));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let ledger = store.snapshot("busy");
        assert_eq!(ledger.round_history.len(), 400);
        // 2 base rounds at 3, then 398 streak rounds at 9
        assert_eq!(ledger.player(1).map(|p| p.score), Some(6 + 398 * 9));
        assert_eq!(ledger.player(0).map(|p| p.score), Some(-400));
    }
}
