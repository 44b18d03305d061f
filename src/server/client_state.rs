//! Per-client server-side state
//!
//! Every browser is identified by its [`ClientToken`]. The registry keeps one
//! [`ClientState`] per token behind an async mutex: a handler holds the lock
//! for its whole run, so each client's events are processed one at a time.
//! Sub-states (auth state, login form, one CRUD state per model) are stored
//! by type.

use super::token::ClientToken;
use axum::http::Extensions;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Type-keyed sub-states of one client
#[derive(Debug)]
pub struct ClientState {
    substates: Extensions,
    last_seen: Instant,
}

impl ClientState {
    pub fn new() -> Self {
        Self {
            substates: Extensions::new(),
            last_seen: Instant::now(),
        }
    }

    pub fn get<T: Clone + Send + Sync + 'static>(&self) -> Option<&T> {
        self.substates.get::<T>()
    }

    pub fn get_mut<T: Clone + Send + Sync + 'static>(&mut self) -> Option<&mut T> {
        self.substates.get_mut::<T>()
    }

    /// The sub-state of type `T`, created on first access
    pub fn get_or_insert_with<T: Clone + Send + Sync + 'static>(
        &mut self,
        init: impl FnOnce() -> T,
    ) -> &mut T {
        self.substates.get_or_insert_with(init)
    }

    pub fn contains<T: Clone + Send + Sync + 'static>(&self) -> bool {
        self.substates.get::<T>().is_some()
    }

    /// Mark the client as active now
    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_seen.elapsed()
    }
}

impl Default for ClientState {
    fn default() -> Self {
        Self::new()
    }
}

/// A client's state, locked for the duration of one request
pub type ClientGuard = OwnedMutexGuard<ClientState>;

/// All known clients, keyed by token
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: RwLock<HashMap<ClientToken, Arc<Mutex<ClientState>>>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The state slot for `token`, created on first use
    pub fn checkout(&self, token: &ClientToken) -> Arc<Mutex<ClientState>> {
        if let Some(slot) = self
            .clients
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token)
        {
            return slot.clone();
        }

        self.clients
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(token.clone())
            .or_default()
            .clone()
    }

    /// Lock the state for `token` and mark it active
    pub async fn lock(&self, token: &ClientToken) -> ClientGuard {
        let mut guard = self.checkout(token).lock_owned().await;
        guard.touch();
        guard
    }

    pub fn len(&self) -> usize {
        self.clients
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop clients idle for longer than `max_idle`
    ///
    /// Clients whose state is locked by a running request are kept.
    pub fn prune_idle(&self, max_idle: Duration) -> usize {
        let mut clients = self.clients.write().unwrap_or_else(PoisonError::into_inner);
        let before = clients.len();
        clients.retain(|_, slot| match slot.try_lock() {
            Ok(state) => state.idle_for() <= max_idle,
            Err(_) => true,
        });
        let removed = before - clients.len();
        if removed > 0 {
            tracing::debug!(removed, remaining = clients.len(), "pruned idle admin clients");
        }
        removed
    }
}
