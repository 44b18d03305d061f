//! Core module containing fundamental traits and types for the admin

pub mod access;
pub mod error;
pub mod events;
pub mod field;
pub mod model;
pub mod query;
pub mod store;

pub use access::{AccessContext, AccessPolicy};
pub use error::{AdminError, StorageError, ValidationError};
pub use events::{AdminEvent, EventBus, EventEnvelope, RecordEvent, SessionEvent};
pub use field::{FieldDef, FieldKind, FieldType, FieldValue};
pub use model::{Model, ModelHooks, RowFilter, default_filter, filter_for};
pub use query::{DEFAULT_PAGE_SIZE, ListParams};
pub use store::RecordStore;
