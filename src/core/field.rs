//! Field values, field kinds and form-input coercion
//!
//! Every model field is described by a [`FieldDef`]: its name, a closed
//! [`FieldKind`] and whether it accepts NULL. The kind decides both how a raw
//! form string is coerced ([`FieldDef::coerce`]) and which control the edit
//! form renders for it (see `crud::form`).

use super::error::ValidationError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A polymorphic field value that can hold different types
///
/// Enumeration members are carried as `String` holding the member name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Uuid(Uuid),
    DateTime(DateTime<Utc>),
    Null,
}

impl FieldValue {
    /// Get the value as a string if possible
    pub fn as_string(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as an integer if possible
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the value as a float, widening integers
    pub fn as_float(&self) -> Option<f64> {
        match self {
            FieldValue::Float(f) => Some(*f),
            FieldValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the value as a UUID if possible
    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            FieldValue::Uuid(u) => Some(*u),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// String form used in inputs, table cells and the default filter
    ///
    /// NULL renders as the empty string. Datetimes use RFC 3339 so that the
    /// rendered value parses back through [`FieldKind::DateTime`].
    pub fn display(&self) -> String {
        match self {
            FieldValue::String(s) => s.clone(),
            FieldValue::Integer(i) => i.to_string(),
            FieldValue::Float(f) => f.to_string(),
            FieldValue::Boolean(b) => b.to_string(),
            FieldValue::Uuid(u) => u.to_string(),
            FieldValue::DateTime(dt) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            FieldValue::Null => String::new(),
        }
    }
}

/// Closed set of field kinds the admin knows how to edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Integer primary key, assigned by the store
    PrimaryKey,
    String,
    Integer,
    Float,
    Boolean,
    Uuid,
    DateTime,
    /// Enumeration with `(member name, label)` pairs in declaration order
    Enum {
        type_name: &'static str,
        members: &'static [(&'static str, &'static str)],
    },
    /// A type with no form control; rendered as a placeholder
    Unsupported(&'static str),
}

impl FieldKind {
    /// Short type label shown next to the field name
    pub fn type_label(&self) -> &'static str {
        match self {
            FieldKind::PrimaryKey => "int",
            FieldKind::String => "str",
            FieldKind::Integer => "int",
            FieldKind::Float => "float",
            FieldKind::Boolean => "bool",
            FieldKind::Uuid => "UUID",
            FieldKind::DateTime => "datetime",
            FieldKind::Enum { type_name, .. } => type_name,
            FieldKind::Unsupported(type_name) => type_name,
        }
    }

    /// Whether the edit form can change values of this kind
    pub fn is_editable(&self) -> bool {
        !matches!(self, FieldKind::PrimaryKey | FieldKind::Unsupported(_))
    }
}

/// Static description of one model field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
    pub nullable: bool,
}

impl FieldDef {
    pub const fn new(name: &'static str, kind: FieldKind, nullable: bool) -> Self {
        Self {
            name,
            kind,
            nullable,
        }
    }

    /// `name (type)` label used by forms
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.kind.type_label())
    }

    /// Coerce a raw form value into a value of this field's kind
    ///
    /// Shorthands: `"now"` for datetimes, `"random"` for UUIDs. UUIDs also
    /// accept their integer form. Blank input on a nullable field that is not
    /// a string yields NULL.
    pub fn coerce(&self, raw: &str) -> Result<FieldValue, ValidationError> {
        let trimmed = raw.trim();

        match self.kind {
            FieldKind::PrimaryKey => Err(ValidationError::ReadOnly(self.name.to_string())),
            FieldKind::Unsupported(type_name) => Err(ValidationError::Unsupported {
                field: self.name.to_string(),
                type_name,
            }),
            FieldKind::String => Ok(FieldValue::String(raw.to_string())),
            _ if self.nullable && trimmed.is_empty() => Ok(FieldValue::Null),
            FieldKind::Integer => trimmed
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|e| self.invalid("int", raw, e)),
            FieldKind::Float => trimmed
                .parse::<f64>()
                .map(FieldValue::Float)
                .map_err(|e| self.invalid("float", raw, e)),
            FieldKind::Boolean => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "on" | "1" | "yes" => Ok(FieldValue::Boolean(true)),
                "false" | "off" | "0" | "no" | "" => Ok(FieldValue::Boolean(false)),
                _ => Err(self.invalid("bool", raw, "expected true or false")),
            },
            FieldKind::Uuid => parse_uuid(trimmed)
                .map(FieldValue::Uuid)
                .map_err(|e| self.invalid("UUID", raw, e)),
            FieldKind::DateTime => parse_datetime(trimmed)
                .map(FieldValue::DateTime)
                .map_err(|e| self.invalid("datetime", raw, e)),
            FieldKind::Enum { type_name, members } => members
                .iter()
                .find(|(name, _)| *name == trimmed)
                .map(|(name, _)| FieldValue::String((*name).to_string()))
                .ok_or_else(|| ValidationError::UnknownMember {
                    type_name,
                    value: raw.to_string(),
                }),
        }
    }

    fn invalid(
        &self,
        expected: &'static str,
        raw: &str,
        reason: impl std::fmt::Display,
    ) -> ValidationError {
        ValidationError::InvalidValue {
            field: self.name.to_string(),
            expected,
            value: raw.to_string(),
            reason: reason.to_string(),
        }
    }
}

fn parse_uuid(value: &str) -> Result<Uuid, uuid::Error> {
    if value == "random" {
        return Ok(Uuid::new_v4());
    }
    if let Ok(int) = value.parse::<u128>() {
        return Ok(Uuid::from_u128(int));
    }
    Uuid::parse_str(value)
}

fn parse_datetime(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    if value == "now" {
        return Ok(Utc::now());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    // Naive forms are taken as UTC
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")?;
    Ok(date.and_time(NaiveTime::default()).and_utc())
}

/// Rust types that can back a model field
///
/// Implemented for the scalar types the admin edits, for `Option<T>` (which
/// makes the field nullable) and for `serde_json::Value` (unsupported in
/// forms, still listed and stored).
pub trait FieldType: Sized {
    const KIND: FieldKind;
    const NULLABLE: bool = false;

    fn to_value(&self) -> FieldValue;

    /// Convert back from a coerced value; `None` when the variant does not fit
    fn from_value(value: FieldValue) -> Option<Self>;
}

impl FieldType for String {
    const KIND: FieldKind = FieldKind::String;

    fn to_value(&self) -> FieldValue {
        FieldValue::String(self.clone())
    }

    fn from_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl FieldType for i64 {
    const KIND: FieldKind = FieldKind::Integer;

    fn to_value(&self) -> FieldValue {
        FieldValue::Integer(*self)
    }

    fn from_value(value: FieldValue) -> Option<Self> {
        value.as_integer()
    }
}

impl FieldType for i32 {
    const KIND: FieldKind = FieldKind::Integer;

    fn to_value(&self) -> FieldValue {
        FieldValue::Integer(i64::from(*self))
    }

    fn from_value(value: FieldValue) -> Option<Self> {
        value.as_integer().and_then(|i| i32::try_from(i).ok())
    }
}

impl FieldType for f64 {
    const KIND: FieldKind = FieldKind::Float;

    fn to_value(&self) -> FieldValue {
        FieldValue::Float(*self)
    }

    fn from_value(value: FieldValue) -> Option<Self> {
        value.as_float()
    }
}

impl FieldType for bool {
    const KIND: FieldKind = FieldKind::Boolean;

    fn to_value(&self) -> FieldValue {
        FieldValue::Boolean(*self)
    }

    fn from_value(value: FieldValue) -> Option<Self> {
        value.as_bool()
    }
}

impl FieldType for Uuid {
    const KIND: FieldKind = FieldKind::Uuid;

    fn to_value(&self) -> FieldValue {
        FieldValue::Uuid(*self)
    }

    fn from_value(value: FieldValue) -> Option<Self> {
        value.as_uuid()
    }
}

impl FieldType for DateTime<Utc> {
    const KIND: FieldKind = FieldKind::DateTime;

    fn to_value(&self) -> FieldValue {
        FieldValue::DateTime(*self)
    }

    fn from_value(value: FieldValue) -> Option<Self> {
        value.as_datetime()
    }
}

impl FieldType for serde_json::Value {
    const KIND: FieldKind = FieldKind::Unsupported("json");

    fn to_value(&self) -> FieldValue {
        FieldValue::String(self.to_string())
    }

    fn from_value(value: FieldValue) -> Option<Self> {
        value.as_string().and_then(|s| serde_json::from_str(s).ok())
    }
}

impl<T: FieldType> FieldType for Option<T> {
    const KIND: FieldKind = T::KIND;
    const NULLABLE: bool = true;

    fn to_value(&self) -> FieldValue {
        match self {
            Some(inner) => inner.to_value(),
            None => FieldValue::Null,
        }
    }

    fn from_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEMBERS: &[(&str, &str)] = &[("o1", "option 1"), ("o2", "option 2")];

    fn def(kind: FieldKind, nullable: bool) -> FieldDef {
        FieldDef::new("f", kind, nullable)
    }

    #[test]
    fn test_field_value_display() {
        assert_eq!(FieldValue::Integer(42).display(), "42");
        assert_eq!(FieldValue::Boolean(false).display(), "false");
        assert_eq!(FieldValue::Null.display(), "");
        let dt = DateTime::parse_from_rfc3339("2024-03-01T10:00:00Z")
            .expect("valid datetime")
            .with_timezone(&Utc);
        assert_eq!(FieldValue::DateTime(dt).display(), "2024-03-01T10:00:00Z");
    }

    #[test]
    fn test_coerce_numbers() {
        assert_eq!(
            def(FieldKind::Integer, false).coerce(" 7 "),
            Ok(FieldValue::Integer(7))
        );
        assert_eq!(
            def(FieldKind::Float, false).coerce("2.5"),
            Ok(FieldValue::Float(2.5))
        );
        assert!(matches!(
            def(FieldKind::Integer, false).coerce("seven"),
            Err(ValidationError::InvalidValue { expected: "int", .. })
        ));
    }

    #[test]
    fn test_coerce_blank_nullable_is_null() {
        assert_eq!(def(FieldKind::Integer, true).coerce(""), Ok(FieldValue::Null));
        assert_eq!(def(FieldKind::Uuid, true).coerce("  "), Ok(FieldValue::Null));
        // Strings keep the empty value
        assert_eq!(
            def(FieldKind::String, true).coerce(""),
            Ok(FieldValue::String(String::new()))
        );
        assert!(def(FieldKind::Integer, false).coerce("").is_err());
    }

    #[test]
    fn test_coerce_enum_by_member_name() {
        let kind = FieldKind::Enum {
            type_name: "F4",
            members: MEMBERS,
        };
        assert_eq!(
            def(kind, false).coerce("o2"),
            Ok(FieldValue::String("o2".to_string()))
        );
        // Labels are not member names
        assert!(matches!(
            def(kind, false).coerce("option 2"),
            Err(ValidationError::UnknownMember { type_name: "F4", .. })
        ));
    }

    #[test]
    fn test_coerce_uuid_forms() {
        let field = def(FieldKind::Uuid, false);
        let random = field.coerce("random").expect("random should succeed");
        assert!(random.as_uuid().is_some());

        assert_eq!(field.coerce("1"), Ok(FieldValue::Uuid(Uuid::from_u128(1))));

        let canonical = "67e55044-10b1-426f-9247-bb680e5fe0c8";
        assert_eq!(
            field.coerce(canonical),
            Ok(FieldValue::Uuid(Uuid::parse_str(canonical).expect("valid uuid")))
        );
        assert!(field.coerce("not-a-uuid").is_err());
    }

    #[test]
    fn test_coerce_datetime_forms() {
        let field = def(FieldKind::DateTime, false);
        let before = Utc::now();
        let now = field
            .coerce("now")
            .expect("now should succeed")
            .as_datetime()
            .expect("datetime value");
        assert!(now >= before);

        let expected = NaiveDate::from_ymd_opt(2024, 5, 17)
            .and_then(|d| d.and_hms_opt(8, 30, 0))
            .expect("valid date")
            .and_utc();
        assert_eq!(
            field.coerce("2024-05-17T08:30"),
            Ok(FieldValue::DateTime(expected))
        );
        assert_eq!(
            field.coerce("2024-05-17T10:30:00+02:00"),
            Ok(FieldValue::DateTime(expected))
        );
        assert!(field.coerce("yesterday").is_err());
    }

    #[test]
    fn test_coerce_boolean() {
        let field = def(FieldKind::Boolean, false);
        assert_eq!(field.coerce("on"), Ok(FieldValue::Boolean(true)));
        assert_eq!(field.coerce("false"), Ok(FieldValue::Boolean(false)));
        assert!(field.coerce("maybe").is_err());
    }

    #[test]
    fn test_primary_key_and_unsupported_reject_input() {
        assert_eq!(
            FieldDef::new("id", FieldKind::PrimaryKey, true).coerce("3"),
            Err(ValidationError::ReadOnly("id".to_string()))
        );
        assert!(matches!(
            def(FieldKind::Unsupported("json"), false).coerce("{}"),
            Err(ValidationError::Unsupported { type_name: "json", .. })
        ));
    }

    #[test]
    fn test_field_type_option_is_nullable() {
        assert!(<Option<i64> as FieldType>::NULLABLE);
        assert_eq!(<Option<i64> as FieldType>::KIND, FieldKind::Integer);
        assert_eq!(Option::<i64>::from_value(FieldValue::Null), Some(None));
        assert_eq!(Option::<i64>::from_value(FieldValue::Integer(3)), Some(Some(3)));
        assert_eq!(Option::<i64>::from_value(FieldValue::Boolean(true)), None);
    }

    #[test]
    fn test_label() {
        assert_eq!(def(FieldKind::Float, true).label(), "f (float)");
    }
}
