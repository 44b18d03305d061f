//! AdminBuilder: fluent setup of the admin host and router

use super::client_state::ClientRegistry;
use super::exposure::HtmlExposure;
use super::exposure::html::templates::Templates;
use super::host::AdminHost;
use super::model_registry::{CrudDescriptor, ModelDescriptor, ModelRegistry};
use crate::auth::{AuthSession, DefaultLoginComponent, LoginComponent, SessionAuth, User};
use crate::config::AdminConfig;
use crate::core::access::AccessPolicy;
use crate::core::events::EventBus;
use crate::core::model::Model;
use crate::core::store::RecordStore;
use crate::crud::CrudController;
use crate::storage::InMemoryStore;
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Settings a model registration is completed with at build time
struct RegistrationContext<'a> {
    prefix: &'a str,
    default_page_size: usize,
    policy: &'a AccessPolicy,
    event_bus: Option<&'a Arc<EventBus>>,
}

type PendingModel = Box<dyn FnOnce(&RegistrationContext<'_>) -> Arc<dyn ModelDescriptor> + Send>;

/// Builder for the admin router
///
/// # Example
///
/// ```ignore
/// let app = AdminBuilder::new(AdminConfig::default())
///     .with_access(AccessPolicy::AdminOnly)
///     .register::<Hero>(InMemoryStore::new())
///     .register_users()
///     .build()?;
/// ```
pub struct AdminBuilder {
    config: AdminConfig,
    users: Arc<dyn RecordStore<User>>,
    sessions: Arc<dyn RecordStore<AuthSession>>,
    policy: AccessPolicy,
    pending: Vec<PendingModel>,
    custom_routes: Vec<Router<Arc<AdminHost>>>,
    event_bus: Option<EventBus>,
    login_ui: Arc<dyn LoginComponent>,
    templates: Vec<(String, String)>,
}

impl AdminBuilder {
    /// Builder with in-memory user and session stores
    pub fn new(config: AdminConfig) -> Self {
        Self {
            config,
            users: Arc::new(InMemoryStore::<User>::new()),
            sessions: Arc::new(InMemoryStore::<AuthSession>::new()),
            policy: AccessPolicy::default(),
            pending: Vec::new(),
            custom_routes: Vec::new(),
            event_bus: None,
            login_ui: Arc::new(DefaultLoginComponent),
            templates: Vec::new(),
        }
    }

    pub fn with_user_store(mut self, store: impl RecordStore<User> + 'static) -> Self {
        self.users = Arc::new(store);
        self
    }

    pub fn with_session_store(mut self, store: impl RecordStore<AuthSession> + 'static) -> Self {
        self.sessions = Arc::new(store);
        self
    }

    /// Access policy of models registered without their own
    pub fn with_access(mut self, policy: AccessPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Enable the event bus receiving record and session events
    ///
    /// * `capacity` - Buffer size of the broadcast channel (recommended: 1024)
    pub fn with_event_bus(mut self, capacity: usize) -> Self {
        self.event_bus = Some(EventBus::new(capacity));
        self
    }

    /// Replace the UI served in place of protected pages
    pub fn with_login_component(mut self, component: impl LoginComponent + 'static) -> Self {
        self.login_ui = Arc::new(component);
        self
    }

    /// Add or override a template (`login.html`, `list.html`, ...)
    pub fn with_template(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.templates.push((name.into(), content.into()));
        self
    }

    /// Add routes that share the host as state
    ///
    /// # Example
    ///
    /// ```ignore
    /// let pages = Router::new().route("/protected", get(protected_page));
    ///
    /// AdminBuilder::new(config)
    ///     .with_custom_routes(pages)
    ///     .build()?;
    /// ```
    pub fn with_custom_routes(mut self, routes: Router<Arc<AdminHost>>) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Expose `M` under the builder's access policy
    pub fn register<M: Model>(self, store: impl RecordStore<M> + 'static) -> Self {
        self.register_store::<M>(Arc::new(store), None)
    }

    /// Expose `M` under its own access policy
    pub fn register_with_access<M: Model>(
        self,
        store: impl RecordStore<M> + 'static,
        policy: AccessPolicy,
    ) -> Self {
        self.register_store::<M>(Arc::new(store), Some(policy))
    }

    /// Expose the user store (passwords are hashed on save)
    pub fn register_users(self) -> Self {
        let store = self.users.clone();
        self.register_store::<User>(store, None)
    }

    /// Expose the session store
    pub fn register_sessions(self) -> Self {
        let store = self.sessions.clone();
        self.register_store::<AuthSession>(store, None)
    }

    fn register_store<M: Model>(
        mut self,
        store: Arc<dyn RecordStore<M>>,
        policy: Option<AccessPolicy>,
    ) -> Self {
        self.pending.push(Box::new(move |ctx: &RegistrationContext<'_>| {
            let mut controller = CrudController::new(store, ctx.prefix)
                .with_policy(policy.unwrap_or_else(|| ctx.policy.clone()))
                .with_default_page_size(ctx.default_page_size);
            if let Some(bus) = ctx.event_bus {
                controller = controller.with_event_bus(bus.clone());
            }
            Arc::new(CrudDescriptor::new(controller)) as Arc<dyn ModelDescriptor>
        }));
        self
    }

    /// Build the host shared by all routes
    pub fn build_host(self) -> Result<Arc<AdminHost>> {
        Ok(self.into_parts()?.0)
    }

    fn into_parts(self) -> Result<(Arc<AdminHost>, Vec<Router<Arc<AdminHost>>>)> {
        self.config.validate()?;
        let event_bus = self.event_bus.map(Arc::new);

        let mut models = ModelRegistry::new();
        let ctx = RegistrationContext {
            prefix: &self.config.prefix,
            default_page_size: self.config.default_page_size,
            policy: &self.policy,
            event_bus: event_bus.as_ref(),
        };
        for pending in self.pending {
            models.register(pending(&ctx))?;
        }

        let mut templates = Templates::new()?;
        for (name, content) in &self.templates {
            templates.add_template(name, content)?;
        }

        let mut auth = SessionAuth::new(self.users, self.sessions).with_ttl(self.config.session_ttl());
        if let Some(bus) = &event_bus {
            auth = auth.with_event_bus(bus.clone());
        }

        let host = AdminHost {
            config: Arc::new(self.config),
            models,
            auth,
            clients: ClientRegistry::new(),
            templates,
            login_ui: self.login_ui,
            event_bus,
        };
        Ok((Arc::new(host), self.custom_routes))
    }

    /// Build the final router
    pub fn build(self) -> Result<Router> {
        let (host, custom_routes) = self.into_parts()?;
        HtmlExposure::build_router(host, custom_routes)
    }

    /// Serve the admin on `config.bind` with graceful shutdown
    ///
    /// Idle client states are pruned in the background.
    pub async fn serve(self) -> Result<()> {
        let (host, custom_routes) = self.into_parts()?;
        let addr = host.config.bind.clone();
        let app = HtmlExposure::build_router(host.clone(), custom_routes)?;
        let listener = TcpListener::bind(&addr).await?;

        let pruner = tokio::spawn(prune_clients(host));

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        pruner.abort();
        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

async fn prune_clients(host: Arc<AdminHost>) {
    let max_idle = host.config.client_idle();
    let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
    loop {
        interval.tick().await;
        let removed = host.clients.prune_idle(max_idle);
        if removed > 0 {
            tracing::info!(removed, remaining = host.clients.len(), "pruned idle clients");
        }
    }
}

/// Wait for a shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin_model;
    use crate::core::model::ModelHooks;

    admin_model!(Widget, "Widget", {
        label: String,
    });

    impl ModelHooks for Widget {}

    #[test]
    fn test_build_host_registers_models_in_order() {
        let host = AdminBuilder::new(AdminConfig::default())
            .register::<Widget>(InMemoryStore::new())
            .register_users()
            .register_sessions()
            .build_host()
            .expect("host should build");

        assert_eq!(host.models.model_names(), vec!["Widget", "User", "AuthSession"]);
        assert_eq!(host.models.links()[0].1, "/crud/Widget");
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let result = AdminBuilder::new(AdminConfig::default())
            .register::<Widget>(InMemoryStore::new())
            .register::<Widget>(InMemoryStore::new())
            .build_host();
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_config_fails() {
        let config = AdminConfig {
            prefix: "crud".to_string(),
            ..Default::default()
        };
        assert!(AdminBuilder::new(config).build().is_err());
    }

    #[test]
    fn test_template_override_must_compile() {
        let result = AdminBuilder::new(AdminConfig::default())
            .with_template("login.html", "{% if %}")
            .build_host();
        assert!(result.is_err());
    }

    #[test]
    fn test_event_bus_is_shared() {
        let host = AdminBuilder::new(AdminConfig::default())
            .with_event_bus(16)
            .build_host()
            .expect("host should build");
        assert!(host.event_bus.is_some());
    }
}
