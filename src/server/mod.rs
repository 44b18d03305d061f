//! Server module: host, client states, model routes and the HTML exposure
//!
//! [`AdminBuilder`] collects models, stores and settings and produces either
//! the shared [`AdminHost`] or a ready-to-serve axum `Router`.

pub mod builder;
pub mod client_state;
pub mod exposure;
pub mod host;
pub mod model_registry;
pub mod token;

pub use builder::AdminBuilder;
pub use client_state::{ClientGuard, ClientRegistry, ClientState};
pub use exposure::HtmlExposure;
pub use exposure::html::Templates;
pub use host::{AdminHost, ClientSession};
pub use model_registry::{CrudDescriptor, CrudRouteState, ModelDescriptor, ModelRegistry};
pub use token::{ClientToken, TOKEN_COOKIE};
