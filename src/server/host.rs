//! Admin host: the shared state behind every route
//!
//! The host owns configuration, the model registry, the auth stores and the
//! per-client states. Routers are built from it by
//! [`HtmlExposure`](super::exposure::HtmlExposure).

use super::client_state::{ClientGuard, ClientRegistry};
use super::exposure::html::templates::Templates;
use super::model_registry::ModelRegistry;
use super::token::ClientToken;
use crate::auth::{LoginComponent, SessionAuth};
use crate::config::AdminConfig;
use crate::core::events::EventBus;
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Host context containing all admin state
pub struct AdminHost {
    /// Validated configuration
    pub config: Arc<AdminConfig>,

    /// Registered models, in index order
    pub models: ModelRegistry,

    /// Session authentication over the user and session stores
    pub auth: SessionAuth,

    /// Server-side state of every known browser
    pub clients: ClientRegistry,

    pub templates: Templates,

    /// UI served in place of pages that require a login
    pub login_ui: Arc<dyn LoginComponent>,

    /// Optional bus receiving record and session events
    pub event_bus: Option<Arc<EventBus>>,
}

/// One request's view of its client
///
/// Holds the client lock until dropped. `jar` must be returned with the
/// response so a newly issued token cookie reaches the browser.
pub struct ClientSession {
    pub jar: CookieJar,
    pub token: ClientToken,
    pub state: ClientGuard,
}

impl AdminHost {
    /// Resolve the request's client and lock its state
    ///
    /// Issues a token cookie when the browser has none and attaches the
    /// auth sub-state bound to that token.
    pub async fn open_client(&self, jar: CookieJar) -> ClientSession {
        let (jar, token) = ClientToken::from_jar(jar, self.config.secure_cookies());
        let mut state = self.clients.lock(&token).await;
        SessionAuth::attach(&mut state, token.as_str());
        ClientSession { jar, token, state }
    }
}
