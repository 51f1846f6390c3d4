//! Injectable shared state for hosting applications.
//!
//! The store replaces ambient module-level globals: the host owns one
//! `LoomStore`, hands it to whatever drives the builder, and UI layers
//! subscribe for change broadcasts. Readers only ever see cloned snapshots,
//! so no subscriber can observe a partially mutated tree.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::tree::Token;

/// Snapshot of the host-visible loom state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoomState {
    pub roots: Vec<Token>,
    /// Whether a build or expand call is currently running.
    pub in_progress: bool,
}

type Listener = Arc<dyn Fn(&LoomState) + Send + Sync>;

/// Explicit state store with broadcast-on-update semantics.
#[derive(Default)]
pub struct LoomStore {
    state: Mutex<LoomState>,
    listeners: Mutex<Vec<Listener>>,
}

impl LoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cloned snapshot of the current state.
    pub fn get_state(&self) -> LoomState {
        lock_unpoisoned(&self.state).clone()
    }

    /// Apply `update` under the lock, then notify every subscriber with the
    /// resulting snapshot. No lock is held while a listener runs, so
    /// listeners may call back into the store.
    pub fn update_state(&self, update: impl FnOnce(&mut LoomState)) {
        let snapshot = {
            let mut state = lock_unpoisoned(&self.state);
            update(&mut state);
            state.clone()
        };

        let listeners: Vec<Listener> = lock_unpoisoned(&self.listeners).clone();
        for listener in &listeners {
            listener(&snapshot);
        }
    }

    /// Register a listener invoked after every update.
    pub fn subscribe(&self, listener: impl Fn(&LoomState) + Send + Sync + 'static) {
        lock_unpoisoned(&self.listeners).push(Arc::new(listener));
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::LoomStore;
    use crate::tree::Token;

    #[test]
    fn update_state_broadcasts_the_new_snapshot() {
        let store = LoomStore::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_by_listener = Arc::clone(&seen);
        store.subscribe(move |state| {
            seen_by_listener.store(state.roots.len(), Ordering::SeqCst);
        });

        store.update_state(|state| {
            state.roots.push(Token::from_logprob("a", -0.3));
            state.in_progress = true;
        });

        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert!(store.get_state().in_progress);
    }

    #[test]
    fn get_state_returns_an_independent_clone() {
        let store = LoomStore::new();
        store.update_state(|state| state.roots.push(Token::from_logprob("a", -0.3)));

        let mut snapshot = store.get_state();
        snapshot.roots.clear();

        assert_eq!(store.get_state().roots.len(), 1);
    }

    #[test]
    fn listeners_may_reenter_the_store() {
        let store = Arc::new(LoomStore::new());
        let late_seen = Arc::new(AtomicUsize::new(0));
        let subscribed = Arc::new(AtomicBool::new(false));

        let store_in_listener = Arc::clone(&store);
        let late_seen_for_listener = Arc::clone(&late_seen);
        let subscribed_in_listener = Arc::clone(&subscribed);
        store.subscribe(move |state| {
            // Reads back and registers a second listener from inside the
            // broadcast.
            assert_eq!(store_in_listener.get_state(), *state);
            if !subscribed_in_listener.swap(true, Ordering::SeqCst) {
                let late_seen = Arc::clone(&late_seen_for_listener);
                store_in_listener.subscribe(move |state| {
                    late_seen.store(state.roots.len(), Ordering::SeqCst);
                });
            }
        });

        store.update_state(|state| state.roots.push(Token::from_logprob("a", -0.3)));
        store.update_state(|state| state.roots.push(Token::from_logprob("b", -0.7)));

        assert_eq!(late_seen.load(Ordering::SeqCst), 2);
    }
}
