//! Typed errors for the admin layer
//!
//! Errors are split by where they surface in the UI:
//!
//! - [`ValidationError`]: a field value could not be coerced. Shown inline as
//!   the form message; the record is left unchanged.
//! - [`StorageError`]: the record store refused or failed an operation. Shown
//!   as the db message; never retried.
//! - [`AdminError`]: everything that aborts a request (template rendering,
//!   configuration, unexpected hook failures). Rendered as a 500 page.
//!
//! Authorization denial is not an error: guarded operations
//! return without effect.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;

/// A raw form value could not be applied to a field
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// The model has no field with this name
    #[error("unknown field '{field}' on {model}")]
    UnknownField { model: &'static str, field: String },

    /// The field cannot be edited (primary key)
    #[error("field '{0}' is read-only")]
    ReadOnly(String),

    /// The field's type has no form control
    #[error("field '{field}' has unsupported type {type_name}")]
    Unsupported {
        field: String,
        type_name: &'static str,
    },

    /// The raw value does not parse as the field's type
    #[error("invalid {expected} for '{field}': {value:?} ({reason})")]
    InvalidValue {
        field: String,
        expected: &'static str,
        value: String,
        reason: String,
    },

    /// The raw value is not a member name of the field's enumeration
    #[error("'{value}' is not a member of {type_name}")]
    UnknownMember {
        type_name: &'static str,
        value: String,
    },

    /// A coerced value did not match the Rust type backing the field
    #[error("value for '{0}' does not match the field type")]
    TypeMismatch(String),
}

/// Failures reported by a [`RecordStore`](crate::core::store::RecordStore)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StorageError {
    /// Another record already holds this value in a unique column
    #[error("UNIQUE constraint failed: {model}.{field} = {value}")]
    UniqueViolation {
        model: &'static str,
        field: &'static str,
        value: String,
    },

    /// A lock protecting in-process data was poisoned by a panicking writer
    #[error("storage lock poisoned: {0}")]
    LockPoisoned(String),

    /// Backend-specific failure (connection, query, constraint)
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Request-level failure rendered as an error page
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("template rendering failed: {0}")]
    Template(#[from] tera::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AdminError {
    /// HTTP status used when the error reaches a handler boundary
    pub fn status_code(&self) -> StatusCode {
        match self {
            AdminError::Storage(StorageError::UniqueViolation { .. }) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        tracing::error!(error = %self, status = status.as_u16(), "admin request failed");

        let body = format!(
            "<!doctype html><html><head><title>Admin error</title></head>\
             <body><h1>{}</h1><p>{}</p></body></html>",
            status,
            tera::escape_html(&self.to_string())
        );
        (status, Html(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::InvalidValue {
            field: "age".to_string(),
            expected: "int",
            value: "abc".to_string(),
            reason: "invalid digit found in string".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid int for 'age': \"abc\" (invalid digit found in string)"
        );

        let err = ValidationError::UnknownMember {
            type_name: "F4",
            value: "o9".to_string(),
        };
        assert_eq!(err.to_string(), "'o9' is not a member of F4");
    }

    #[test]
    fn test_unique_violation_maps_to_conflict() {
        let err = AdminError::from(StorageError::UniqueViolation {
            model: "User",
            field: "username",
            value: "alice".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert!(err.to_string().contains("User.username"));
    }

    #[test]
    fn test_error_page_escapes_message() {
        let err = AdminError::Config("<script>".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
