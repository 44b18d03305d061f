//! Model traits: static field metadata plus optional lifecycle hooks
//!
//! A type becomes editable in the admin by implementing [`Model`] (usually
//! generated by [`admin_model!`](crate::admin_model)) and [`ModelHooks`]
//! (every hook has a no-op default, so `impl ModelHooks for Hero {}` is
//! enough).

use super::error::ValidationError;
use super::field::{FieldDef, FieldValue};
use std::fmt;
use std::sync::Arc;

/// Row predicate used by stores to filter records in memory
pub type RowFilter<M> = Arc<dyn Fn(&M) -> bool + Send + Sync>;

/// Optional per-model callbacks invoked by the CRUD controller
pub trait ModelHooks: Sized {
    /// Reduced field list for forms and list columns; `None` exposes all fields
    fn admin_fields() -> Option<&'static [&'static str]> {
        None
    }

    /// Runs on the current record before it is upserted
    ///
    /// An error aborts the save and is shown as the db message.
    fn before_save(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs after a record is loaded into the edit form
    fn after_load(&mut self) {}

    /// Runs before a persisted record is deleted; an error aborts the delete
    fn before_delete(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs on every row of a list page
    fn after_load_row(&mut self) {}

    /// Custom predicate for the list filter box
    ///
    /// Returning `None` falls back to [`default_filter`].
    fn filter_predicate(_filter: &str) -> Option<RowFilter<Self>> {
        None
    }
}

/// A record type the admin can list, edit, save and delete
pub trait Model: ModelHooks + Clone + Default + fmt::Debug + Send + Sync + 'static {
    /// Name used in routes and headings (`/crud/{NAME}`)
    const NAME: &'static str;

    /// All fields in declaration order; the primary key `id` comes first
    fn fields() -> &'static [FieldDef];

    /// Fields whose non-NULL values must be unique across records
    fn unique_fields() -> &'static [&'static str] {
        &[]
    }

    fn id(&self) -> Option<i64>;

    fn set_id(&mut self, id: Option<i64>);

    /// Read a field by name; `None` for unknown names
    fn get_field(&self, name: &str) -> Option<FieldValue>;

    /// Write a coerced value; the record is unchanged on error
    fn put_field(&mut self, name: &str, value: FieldValue) -> Result<(), ValidationError>;

    fn field(name: &str) -> Option<&'static FieldDef> {
        Self::fields().iter().find(|f| f.name == name)
    }

    /// Fields shown by the admin, honouring [`ModelHooks::admin_fields`]
    fn admin_field_defs() -> Vec<&'static FieldDef> {
        match Self::admin_fields() {
            Some(selected) => selected.iter().filter_map(|name| Self::field(name)).collect(),
            None => Self::fields().iter().collect(),
        }
    }
}

/// Case-insensitive substring match over the model's admin fields
///
/// NULL values never match. Used when the model has no
/// [`ModelHooks::filter_predicate`] of its own.
pub fn default_filter<M: Model>(filter: &str) -> RowFilter<M> {
    let needle = filter.to_lowercase();
    let fields: Vec<&'static str> = M::admin_field_defs().iter().map(|f| f.name).collect();

    Arc::new(move |record: &M| {
        fields.iter().any(|name| match record.get_field(name) {
            Some(FieldValue::Null) | None => false,
            Some(value) => value.display().to_lowercase().contains(&needle),
        })
    })
}

/// The model's own filter predicate, or [`default_filter`]
pub fn filter_for<M: Model>(filter: &str) -> RowFilter<M> {
    M::filter_predicate(filter).unwrap_or_else(|| default_filter::<M>(filter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin_model;

    admin_model!(Gadget, "Gadget", {
        label: String,
        serial: Option<i64>,
        active: bool = true,
        secret: String = "hidden".to_string(),
    });

    impl ModelHooks for Gadget {
        fn admin_fields() -> Option<&'static [&'static str]> {
            Some(&["id", "label", "serial", "active"])
        }
    }

    fn gadget(label: &str, serial: Option<i64>) -> Gadget {
        Gadget {
            label: label.to_string(),
            serial,
            ..Default::default()
        }
    }

    #[test]
    fn test_admin_field_defs_respects_selection() {
        let names: Vec<_> = Gadget::admin_field_defs().iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["id", "label", "serial", "active"]);
        assert_eq!(Gadget::fields().len(), 5);
    }

    #[test]
    fn test_default_filter_is_case_insensitive() {
        let filter = default_filter::<Gadget>("WIDG");
        assert!(filter(&gadget("Blue widget", None)));
        assert!(!filter(&gadget("Spanner", None)));
    }

    #[test]
    fn test_default_filter_matches_non_string_columns() {
        let filter = default_filter::<Gadget>("42");
        assert!(filter(&gadget("x", Some(1423))));
        assert!(!filter(&gadget("x", None)));

        let by_bool = default_filter::<Gadget>("TRUE");
        assert!(by_bool(&gadget("x", None)));
    }

    #[test]
    fn test_default_filter_skips_hidden_fields() {
        let filter = default_filter::<Gadget>("hidden");
        assert!(!filter(&gadget("x", None)));
    }

    #[test]
    fn test_filter_for_falls_back_to_default() {
        let filter = filter_for::<Gadget>("span");
        assert!(filter(&gadget("Spanner", None)));
    }
}
