//! View models for the edit form and the list table

use crate::core::field::{FieldDef, FieldKind, FieldValue};
use crate::core::model::Model;
use serde::Serialize;

/// One `<option>` of an enum select
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectOption {
    /// Member name posted back to the server
    pub value: &'static str,
    /// `name: label`
    pub label: String,
    pub selected: bool,
}

/// Form control chosen from the field kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "control", rename_all = "snake_case")]
pub enum Control {
    ReadOnly {
        display: String,
    },
    Text {
        value: String,
        /// Offer the `random` shorthand (UUID fields)
        randomize: bool,
    },
    Number {
        value: String,
    },
    DateTime {
        value: String,
    },
    Select {
        options: Vec<SelectOption>,
        nullable: bool,
    },
    /// Submits the negated value on change
    Checkbox {
        checked: bool,
        toggle_to: &'static str,
    },
    Unsupported {
        type_name: &'static str,
    },
}

impl Control {
    pub fn for_field(def: &FieldDef, value: &FieldValue) -> Self {
        match def.kind {
            FieldKind::PrimaryKey => Control::ReadOnly {
                display: match value {
                    FieldValue::Null => "(new)".to_string(),
                    other => other.display(),
                },
            },
            FieldKind::String | FieldKind::Float => Control::Text {
                value: value.display(),
                randomize: false,
            },
            FieldKind::Uuid => Control::Text {
                value: value.display(),
                randomize: true,
            },
            FieldKind::Integer => Control::Number {
                value: value.display(),
            },
            FieldKind::DateTime => Control::DateTime {
                value: value.display(),
            },
            FieldKind::Boolean => {
                let checked = value.as_bool().unwrap_or(false);
                Control::Checkbox {
                    checked,
                    toggle_to: if checked { "false" } else { "true" },
                }
            }
            FieldKind::Enum { members, .. } => {
                let current = value.as_string().unwrap_or_default();
                Control::Select {
                    options: members
                        .iter()
                        .map(|&(name, label)| SelectOption {
                            value: name,
                            label: format!("{}: {}", name, label),
                            selected: name == current,
                        })
                        .collect(),
                    nullable: def.nullable,
                }
            }
            FieldKind::Unsupported(type_name) => Control::Unsupported { type_name },
        }
    }
}

/// Everything the edit template needs for one field
#[derive(Debug, Clone, Serialize)]
pub struct FieldView {
    pub name: &'static str,
    pub label: String,
    pub control: Control,
    /// Value equals the model default
    pub is_default: bool,
    pub is_null: bool,
    pub resettable: bool,
    /// URL the control posts its value to
    pub action: String,
    pub reset_action: String,
}

/// Field views of `record`, posting to routes under `edit_path`
pub fn field_views<M: Model>(record: &M, edit_path: &str) -> Vec<FieldView> {
    let defaults = M::default();

    M::admin_field_defs()
        .into_iter()
        .map(|def| {
            let value = record.get_field(def.name).unwrap_or(FieldValue::Null);
            let is_default = defaults.get_field(def.name).as_ref() == Some(&value);
            FieldView {
                name: def.name,
                label: def.label(),
                control: Control::for_field(def, &value),
                is_default,
                is_null: value.is_null(),
                resettable: def.kind.is_editable() && !is_default,
                action: format!("{}/field/{}", edit_path, def.name),
                reset_action: format!("{}/field/{}/reset", edit_path, def.name),
            }
        })
        .collect()
}

/// Table cell text; booleans render as marks
pub fn format_cell(value: &FieldValue) -> String {
    match value {
        FieldValue::Boolean(true) => "✅".to_string(),
        FieldValue::Boolean(false) => "❌".to_string(),
        other => other.display(),
    }
}

/// Column headers of the list table
pub fn column_names<M: Model>() -> Vec<&'static str> {
    M::admin_field_defs().iter().map(|def| def.name).collect()
}

/// One list row as cell strings in column order
pub fn row_cells<M: Model>(record: &M) -> Vec<String> {
    M::admin_field_defs()
        .iter()
        .map(|def| format_cell(&record.get_field(def.name).unwrap_or(FieldValue::Null)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::ModelHooks;
    use crate::{admin_enum, admin_model};

    admin_enum!(Size {
        Small => ("s", "small"),
        Large => ("l", "large"),
    });

    admin_model!(Crate, "Crate", {
        label: String,
        weight: Option<f64>,
        fragile: bool,
        size: Option<Size>,
        hidden: String,
    });

    impl ModelHooks for Crate {
        fn admin_fields() -> Option<&'static [&'static str]> {
            Some(&["id", "label", "weight", "fragile", "size"])
        }
    }

    fn view<'a>(views: &'a [FieldView], name: &str) -> &'a FieldView {
        views
            .iter()
            .find(|v| v.name == name)
            .expect("field view should exist")
    }

    #[test]
    fn test_controls_follow_field_kind() {
        let record = Crate {
            label: "box".to_string(),
            fragile: true,
            size: Some(Size::Large),
            ..Default::default()
        };
        let views = field_views(&record, "/crud/Crate/new");

        assert_eq!(
            view(&views, "id").control,
            Control::ReadOnly {
                display: "(new)".to_string()
            }
        );
        assert_eq!(
            view(&views, "fragile").control,
            Control::Checkbox {
                checked: true,
                toggle_to: "false"
            }
        );
        match &view(&views, "size").control {
            Control::Select { options, nullable } => {
                assert!(*nullable);
                assert_eq!(options.len(), 2);
                assert_eq!(options[1].label, "l: large");
                assert!(options[1].selected);
                assert!(!options[0].selected);
            }
            other => panic!("unexpected control {:?}", other),
        }
    }

    #[test]
    fn test_admin_fields_restrict_views_and_columns() {
        let views = field_views(&Crate::default(), "/crud/Crate/new");
        assert!(views.iter().all(|v| v.name != "hidden"));
        assert_eq!(column_names::<Crate>(), vec!["id", "label", "weight", "fragile", "size"]);
    }

    #[test]
    fn test_default_and_null_markers() {
        let record = Crate {
            label: "box".to_string(),
            ..Default::default()
        };
        let views = field_views(&record, "/crud/Crate/4");

        let label = view(&views, "label");
        assert!(!label.is_default);
        assert!(label.resettable);
        assert_eq!(label.action, "/crud/Crate/4/field/label");
        assert_eq!(label.reset_action, "/crud/Crate/4/field/label/reset");

        let weight = view(&views, "weight");
        assert!(weight.is_default);
        assert!(weight.is_null);
        assert!(!weight.resettable);
        assert!(!view(&views, "id").resettable);
    }

    #[test]
    fn test_row_cells() {
        let record = Crate {
            id: Some(3),
            label: "box".to_string(),
            weight: Some(2.5),
            fragile: false,
            ..Default::default()
        };
        assert_eq!(row_cells(&record), vec!["3", "box", "2.5", "❌", ""]);
        assert_eq!(format_cell(&FieldValue::Boolean(true)), "✅");
    }
}
