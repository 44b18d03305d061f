//! # Admin-RS
//!
//! An add-on for axum applications providing session authentication and a
//! generic CRUD back office over any number of record types.
//!
//! ## Features
//!
//! - **Declarative models**: `admin_model!` derives field metadata, default
//!   values and typed field access
//! - **Generic CRUD screens**: paginated, filterable lists and per-field
//!   edit forms with coercion of every submitted value
//! - **Session authentication**: argon2 password hashes, sessions bound to a
//!   persistent browser token, first-login admin bootstrap
//! - **Access policies**: allow-all by default, admin-only or custom
//!   predicates globally or per model
//! - **Per-client state**: unsaved edits and list position survive across
//!   requests of the same browser
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use admin::prelude::*;
//!
//! admin_model!(Hero, "Hero", {
//!     name: String,
//!     secret_name: String,
//!     age: Option<i64>,
//! });
//!
//! impl ModelHooks for Hero {}
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AdminConfig::default().with_env_overrides()?;
//!     config.init_tracing()?;
//!
//!     AdminBuilder::new(config)
//!         .with_access(AccessPolicy::AdminOnly)
//!         .register::<Hero>(InMemoryStore::new())
//!         .register_users()
//!         .serve()
//!         .await
//! }
//! ```

pub mod auth;
pub mod config;
pub mod core;
pub mod crud;
pub mod entities;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core Traits ===
    pub use crate::core::{
        access::{AccessContext, AccessPolicy},
        error::{AdminError, StorageError, ValidationError},
        events::{AdminEvent, EventBus, RecordEvent, SessionEvent},
        field::{FieldDef, FieldKind, FieldType, FieldValue},
        model::{Model, ModelHooks, RowFilter},
        query::ListParams,
        store::RecordStore,
    };

    // === Macros ===
    pub use crate::{admin_enum, admin_model};

    // === Auth ===
    pub use crate::auth::{
        AuthSession, AuthState, LoginComponent, LoginPage, LoginRequired, SessionAuth, User,
        require_login,
    };

    // === CRUD ===
    pub use crate::crud::{CrudController, CrudState, Navigation};

    // === Storage ===
    pub use crate::storage::InMemoryStore;

    // === Config ===
    pub use crate::config::{AdminConfig, Environment};

    // === Server ===
    pub use crate::server::{AdminBuilder, AdminHost, HtmlExposure, Templates};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use uuid::Uuid;

    // === Axum ===
    pub use axum::{
        Router,
        extract::{Path, State},
        response::{Html, IntoResponse, Response},
        routing::{get, post},
    };
    pub use axum_extra::extract::cookie::CookieJar;
}
