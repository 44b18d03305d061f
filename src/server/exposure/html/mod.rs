//! Server-rendered HTML exposure of the admin
//!
//! Consumes an [`AdminHost`] and produces the axum `Router` serving the
//! index, list and edit screens, the login endpoints and health checks.

pub mod handlers;
pub mod templates;

use crate::server::host::AdminHost;
use anyhow::Result;
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use templates::Templates;

/// HTML exposure implementation
pub struct HtmlExposure;

impl HtmlExposure {
    /// Build the router from a host
    ///
    /// `custom_routes` receive the host as state, so they can gate pages
    /// with [`require_login`](crate::auth::require_login).
    pub fn build_router(
        host: Arc<AdminHost>,
        custom_routes: Vec<Router<Arc<AdminHost>>>,
    ) -> Result<Router> {
        let login_path = host.config.login_path();
        let logout_path = host.config.logout_path();

        let mut app: Router<Arc<AdminHost>> = Router::new()
            .route("/health", get(handlers::health))
            .route("/healthz", get(handlers::health))
            .route(&host.config.prefix, get(handlers::index))
            .route(&login_path, get(handlers::login_page).post(handlers::login))
            .route(&logout_path, post(handlers::logout));

        for custom_router in custom_routes {
            app = app.merge(custom_router);
        }

        let app = app
            .with_state(host.clone())
            .merge(host.models.build_routes(host.clone()))
            .layer(TraceLayer::new_for_http());

        tracing::info!(
            prefix = %host.config.prefix,
            models = host.models.len(),
            "admin routes built"
        );
        Ok(app)
    }
}
