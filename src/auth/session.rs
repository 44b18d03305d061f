//! Session authentication bound to the client token
//!
//! A client is authenticated while an [`AuthSession`] row with its token and
//! a future expiration exists. Logging in replaces any row for the token;
//! logging out deletes them, which ends authentication immediately.

use super::models::{AuthSession, User};
use crate::core::access::AccessContext;
use crate::core::error::StorageError;
use crate::core::events::{AdminEvent, EventBus, SessionEvent};
use crate::core::store::RecordStore;
use crate::server::client_state::ClientState;
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Sentinel user id of an unauthenticated client
pub const ANONYMOUS_USER_ID: i64 = -1;

/// Token-tracking sub-state attached to every client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    /// Token persisted in the browser, empty until the browser reports one
    persistent_token: String,

    /// Fallback token for this connection
    connection_token: String,
}

impl AuthState {
    fn new() -> Self {
        Self {
            persistent_token: String::new(),
            connection_token: Uuid::new_v4().to_string(),
        }
    }

    /// Persisted token if non-empty, otherwise the connection token
    pub fn current_token(&self) -> &str {
        if self.persistent_token.is_empty() {
            &self.connection_token
        } else {
            &self.persistent_token
        }
    }

    /// Record the browser's token; returns whether it changed
    pub fn set_persistent_token(&mut self, token: &str) -> bool {
        if self.persistent_token == token {
            return false;
        }
        self.persistent_token = token.to_string();
        true
    }
}

/// Login, logout and user resolution over the user and session stores
#[derive(Clone)]
pub struct SessionAuth {
    users: Arc<dyn RecordStore<User>>,
    sessions: Arc<dyn RecordStore<AuthSession>>,
    ttl: Duration,
    event_bus: Option<Arc<EventBus>>,
}

impl SessionAuth {
    /// Sessions last 7 days unless configured otherwise
    pub fn new(users: Arc<dyn RecordStore<User>>, sessions: Arc<dyn RecordStore<AuthSession>>) -> Self {
        Self {
            users,
            sessions,
            ttl: Duration::days(7),
            event_bus: None,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn users(&self) -> &Arc<dyn RecordStore<User>> {
        &self.users
    }

    pub fn sessions(&self) -> &Arc<dyn RecordStore<AuthSession>> {
        &self.sessions
    }

    /// Attach the auth sub-state to a client and record its browser token
    ///
    /// Idempotent: the sub-state is created once, later calls only update
    /// the persisted token when it differs.
    pub fn attach<'a>(state: &'a mut ClientState, persistent_token: &str) -> &'a mut AuthState {
        let auth = state.get_or_insert_with(AuthState::new);
        auth.set_persistent_token(persistent_token);
        auth
    }

    /// Id of the user holding a live session for the token, or `-1`
    ///
    /// Storage failures are logged and treated as unauthenticated.
    pub async fn authenticated_user_id(&self, auth: &AuthState) -> i64 {
        match self.live_session(auth.current_token()).await {
            Ok(Some(session)) => session.user_id,
            Ok(None) => ANONYMOUS_USER_ID,
            Err(e) => {
                tracing::warn!(error = %e, "session lookup failed");
                ANONYMOUS_USER_ID
            }
        }
    }

    /// The authenticated user record, if any
    pub async fn authenticated_user(&self, auth: &AuthState) -> Option<User> {
        let user_id = self.authenticated_user_id(auth).await;
        if user_id < 0 {
            return None;
        }
        match self.users.get(user_id).await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, user_id, "user lookup failed");
                None
            }
        }
    }

    /// Access context for guarded CRUD operations
    pub async fn access_context(&self, auth: &AuthState) -> AccessContext {
        let user_id = self.authenticated_user_id(auth).await;
        if user_id < 0 {
            return AccessContext::anonymous();
        }
        let user = self.users.get(user_id).await.ok().flatten();
        AccessContext { user_id, user }
    }

    /// Open a session for `user_id` on the client's token
    ///
    /// No-op when the client is already authenticated or `user_id` is
    /// negative. Any previous session row for the token is removed first.
    pub async fn login(&self, auth: &AuthState, user_id: i64) -> Result<(), StorageError> {
        if user_id < 0 || self.authenticated_user_id(auth).await >= 0 {
            return Ok(());
        }

        let token = auth.current_token().to_string();
        self.delete_sessions(&token).await?;
        self.sessions
            .upsert(AuthSession {
                user_id,
                session_id: token,
                expiration: Utc::now() + self.ttl,
                ..Default::default()
            })
            .await?;

        tracing::info!(user_id, "user logged in");
        self.publish(SessionEvent::Started { user_id });
        Ok(())
    }

    /// Delete every session row for the client's token
    pub async fn logout(&self, auth: &AuthState) -> Result<(), StorageError> {
        let user_id = self.authenticated_user_id(auth).await;
        let removed = self.delete_sessions(auth.current_token()).await?;

        tracing::info!(user_id, removed, "user logged out");
        self.publish(SessionEvent::Ended { user_id });
        Ok(())
    }

    async fn live_session(&self, token: &str) -> Result<Option<AuthSession>, StorageError> {
        if token.is_empty() {
            return Ok(None);
        }
        let token = token.to_string();
        let now = Utc::now();
        self.sessions
            .find_one(Arc::new(move |s: &AuthSession| s.session_id == token && s.is_live(now)))
            .await
    }

    async fn delete_sessions(&self, token: &str) -> Result<usize, StorageError> {
        let token = token.to_string();
        self.sessions
            .delete_where(Arc::new(move |s: &AuthSession| s.session_id == token))
            .await
    }

    fn publish(&self, event: SessionEvent) {
        if let Some(bus) = &self.event_bus {
            bus.publish(AdminEvent::Session(event));
        }
    }
}
