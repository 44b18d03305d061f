//! Model registry: one route set per registered model, in registration order

use super::exposure::html::handlers;
use super::host::AdminHost;
use crate::core::model::Model;
use crate::crud::CrudController;
use anyhow::{Result, bail};
use axum::Router;
use axum::routing::{get, post};
use indexmap::IndexMap;
use std::sync::Arc;

/// Describes how to build the screens of one model
pub trait ModelDescriptor: Send + Sync {
    /// Model name used in routes (`Hero` in `/crud/Hero`)
    fn model_name(&self) -> &'static str;

    /// Route of the list screen
    fn list_path(&self) -> &str;

    /// Build the list and edit routes
    ///
    /// - GET/POST `{list_path}`
    /// - GET `{list_path}/{id}`
    /// - POST `{list_path}/{id}/field/{name}`, `.../reset`
    /// - POST `{list_path}/{id}/save`, `/delete`, `/discard`
    fn build_routes(&self, host: Arc<AdminHost>) -> Router;
}

/// State of the routes of one model
pub struct CrudRouteState<M: Model> {
    pub host: Arc<AdminHost>,
    pub controller: Arc<CrudController<M>>,
}

impl<M: Model> Clone for CrudRouteState<M> {
    fn clone(&self) -> Self {
        Self {
            host: self.host.clone(),
            controller: self.controller.clone(),
        }
    }
}

/// [`ModelDescriptor`] serving a model through a [`CrudController`]
pub struct CrudDescriptor<M: Model> {
    controller: Arc<CrudController<M>>,
}

impl<M: Model> CrudDescriptor<M> {
    pub fn new(controller: CrudController<M>) -> Self {
        Self {
            controller: Arc::new(controller),
        }
    }

    pub fn controller(&self) -> &Arc<CrudController<M>> {
        &self.controller
    }
}

impl<M: Model> ModelDescriptor for CrudDescriptor<M> {
    fn model_name(&self) -> &'static str {
        M::NAME
    }

    fn list_path(&self) -> &str {
        self.controller.list_path()
    }

    fn build_routes(&self, host: Arc<AdminHost>) -> Router {
        let list = self.controller.list_path();
        let state = CrudRouteState {
            host,
            controller: self.controller.clone(),
        };

        Router::new()
            .route(
                list,
                get(handlers::list_page::<M>).post(handlers::list_action::<M>),
            )
            .route(&format!("{list}/{{id}}"), get(handlers::edit_page::<M>))
            .route(
                &format!("{list}/{{id}}/field/{{name}}"),
                post(handlers::set_field::<M>),
            )
            .route(
                &format!("{list}/{{id}}/field/{{name}}/reset"),
                post(handlers::reset_field::<M>),
            )
            .route(&format!("{list}/{{id}}/save"), post(handlers::save::<M>))
            .route(&format!("{list}/{{id}}/delete"), post(handlers::delete::<M>))
            .route(&format!("{list}/{{id}}/discard"), post(handlers::discard::<M>))
            .with_state(state)
    }
}

/// Registry of all models exposed by the admin
#[derive(Default)]
pub struct ModelRegistry {
    descriptors: IndexMap<&'static str, Arc<dyn ModelDescriptor>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor; model names must be unique
    pub fn register(&mut self, descriptor: Arc<dyn ModelDescriptor>) -> Result<()> {
        let name = descriptor.model_name();
        if self.descriptors.contains_key(name) {
            bail!("Model '{}' is already registered", name);
        }
        tracing::debug!(model = name, path = descriptor.list_path(), "registered model");
        self.descriptors.insert(name, descriptor);
        Ok(())
    }

    /// Merge the routes of every registered model
    pub fn build_routes(&self, host: Arc<AdminHost>) -> Router {
        self.descriptors
            .values()
            .fold(Router::new(), |router, descriptor| {
                router.merge(descriptor.build_routes(host.clone()))
            })
    }

    /// Model names in registration order
    pub fn model_names(&self) -> Vec<&'static str> {
        self.descriptors.keys().copied().collect()
    }

    /// `(name, list path)` pairs for the index page
    pub fn links(&self) -> Vec<(&'static str, String)> {
        self.descriptors
            .values()
            .map(|d| (d.model_name(), d.list_path().to_string()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubDescriptor {
        name: &'static str,
        path: String,
    }

    impl ModelDescriptor for StubDescriptor {
        fn model_name(&self) -> &'static str {
            self.name
        }

        fn list_path(&self) -> &str {
            &self.path
        }

        fn build_routes(&self, _host: Arc<AdminHost>) -> Router {
            Router::new()
        }
    }

    fn stub(name: &'static str) -> Arc<dyn ModelDescriptor> {
        Arc::new(StubDescriptor {
            name,
            path: format!("/crud/{}", name),
        })
    }

    #[test]
    fn test_registration_order_is_kept() {
        let mut registry = ModelRegistry::new();
        registry.register(stub("Stuff")).expect("register should succeed");
        registry.register(stub("Hero")).expect("register should succeed");
        registry.register(stub("AuthSession")).expect("register should succeed");

        assert_eq!(registry.model_names(), vec!["Stuff", "Hero", "AuthSession"]);
        assert_eq!(registry.links()[1], ("Hero", "/crud/Hero".to_string()));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_duplicate_model_rejected() {
        let mut registry = ModelRegistry::new();
        registry.register(stub("Hero")).expect("register should succeed");
        assert!(registry.register(stub("Hero")).is_err());
        assert_eq!(registry.len(), 1);
    }
}
