//! Macros for reducing boilerplate when defining admin models
//!
//! These macros generate the struct, its `Default` and the
//! [`Model`](crate::core::model::Model) / [`FieldType`](crate::core::field::FieldType)
//! implementations the CRUD screens need. Hooks stay hand-written in an
//! `impl ModelHooks for ...` block.

/// Define an admin model with an injected `id: Option<i64>` primary key
///
/// Fields may carry a default (`= expr`); fields without one use
/// `Default::default()`. `unique: [...]` lists columns the store keeps
/// unique.
///
/// # Example
///
/// ```rust,ignore
/// use admin::prelude::*;
///
/// admin_model!(Hero, "Hero", {
///     name: String,
///     secret_name: String,
///     age: Option<i64>,
/// });
///
/// impl ModelHooks for Hero {}
///
/// admin_model!(Account, "Account", unique: [email], {
///     email: String,
///     active: bool = true,
/// });
/// ```
#[macro_export]
macro_rules! admin_model {
    (@default) => {
        ::core::default::Default::default()
    };
    (@default $default:expr) => {
        $default
    };
    (
        $type:ident,
        $name:expr,
        $( unique: [ $( $unique:ident ),* $(,)? ], )?
        {
            $( $field:ident : $ftype:ty $( = $default:expr )? ),* $(,)?
        }
    ) => {
        #[derive(Debug, Clone, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
        pub struct $type {
            /// Primary key, assigned by the store on first save
            pub id: Option<i64>,
            $( pub $field : $ftype ),*
        }

        impl ::core::default::Default for $type {
            fn default() -> Self {
                Self {
                    id: None,
                    $( $field: $crate::admin_model!(@default $( $default )?) ),*
                }
            }
        }

        impl ::std::fmt::Display for $type {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self.id {
                    Some(id) => write!(f, "{} #{}", $name, id),
                    None => write!(f, "{} (new)", $name),
                }
            }
        }

        impl $crate::core::model::Model for $type {
            const NAME: &'static str = $name;

            fn fields() -> &'static [$crate::core::field::FieldDef] {
                const FIELDS: &[$crate::core::field::FieldDef] = &[
                    $crate::core::field::FieldDef::new(
                        "id",
                        $crate::core::field::FieldKind::PrimaryKey,
                        true,
                    ),
                    $(
                        $crate::core::field::FieldDef::new(
                            stringify!($field),
                            <$ftype as $crate::core::field::FieldType>::KIND,
                            <$ftype as $crate::core::field::FieldType>::NULLABLE,
                        ),
                    )*
                ];
                FIELDS
            }

            $(
                fn unique_fields() -> &'static [&'static str] {
                    &[ $( stringify!($unique) ),* ]
                }
            )?

            fn id(&self) -> Option<i64> {
                self.id
            }

            fn set_id(&mut self, id: Option<i64>) {
                self.id = id;
            }

            fn get_field(&self, name: &str) -> Option<$crate::core::field::FieldValue> {
                use $crate::core::field::FieldType as _;

                if name == "id" {
                    return Some(self.id.to_value());
                }
                $(
                    if name == stringify!($field) {
                        return Some(self.$field.to_value());
                    }
                )*
                None
            }

            fn put_field(
                &mut self,
                name: &str,
                value: $crate::core::field::FieldValue,
            ) -> Result<(), $crate::core::error::ValidationError> {
                if name == "id" {
                    return Err($crate::core::error::ValidationError::ReadOnly(name.to_string()));
                }
                $(
                    if name == stringify!($field) {
                        self.$field = <$ftype as $crate::core::field::FieldType>::from_value(value)
                            .ok_or_else(|| {
                                $crate::core::error::ValidationError::TypeMismatch(name.to_string())
                            })?;
                        return Ok(());
                    }
                )*
                Err($crate::core::error::ValidationError::UnknownField {
                    model: $name,
                    field: name.to_string(),
                })
            }
        }
    };
}

/// Define an enumeration usable as a model field
///
/// Each variant maps to a member name (what the form submits and the store
/// sees) and a label (what the dropdown shows next to the name).
///
/// # Example
///
/// ```rust,ignore
/// admin_enum!(Priority {
///     Low => ("low", "can wait"),
///     High => ("high", "drop everything"),
/// });
/// ```
#[macro_export]
macro_rules! admin_enum {
    (
        $type:ident {
            $( $variant:ident => ( $member:literal, $label:literal ) ),+ $(,)?
        }
    ) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize,
        )]
        pub enum $type {
            $(
                #[serde(rename = $member)]
                $variant
            ),+
        }

        impl $type {
            /// `(member name, label)` pairs in declaration order
            pub const MEMBERS: &'static [(&'static str, &'static str)] =
                &[ $( ($member, $label) ),+ ];

            pub fn member_name(&self) -> &'static str {
                match self {
                    $( $type::$variant => $member ),+
                }
            }

            pub fn label(&self) -> &'static str {
                match self {
                    $( $type::$variant => $label ),+
                }
            }

            pub fn from_member(name: &str) -> Option<Self> {
                $(
                    if name == $member {
                        return Some($type::$variant);
                    }
                )+
                None
            }
        }

        impl $crate::core::field::FieldType for $type {
            const KIND: $crate::core::field::FieldKind = $crate::core::field::FieldKind::Enum {
                type_name: stringify!($type),
                members: $type::MEMBERS,
            };

            fn to_value(&self) -> $crate::core::field::FieldValue {
                $crate::core::field::FieldValue::String(self.member_name().to_string())
            }

            fn from_value(value: $crate::core::field::FieldValue) -> Option<Self> {
                value.as_string().and_then(Self::from_member)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::core::error::ValidationError;
    use crate::core::field::{FieldKind, FieldValue};
    use crate::core::model::{Model, ModelHooks};
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    crate::admin_enum!(Shade {
        Light => ("light", "pale"),
        Dark => ("dark", "deep"),
    });

    crate::admin_model!(Swatch, "Swatch", unique: [code], {
        code: String,
        count: i64 = 42,
        shade: Option<Shade>,
        tag: Option<Uuid>,
        seen_at: DateTime<Utc>,
        ratio: Option<f64>,
        extra: serde_json::Value,
    });

    impl ModelHooks for Swatch {}

    #[test]
    fn test_generated_defaults() {
        let swatch = Swatch::default();
        assert_eq!(swatch.id, None);
        assert_eq!(swatch.count, 42);
        assert_eq!(swatch.shade, None);
        assert_eq!(swatch.to_string(), "Swatch (new)");
    }

    #[test]
    fn test_generated_field_defs() {
        let fields = Swatch::fields();
        assert_eq!(fields[0].name, "id");
        assert_eq!(fields[0].kind, FieldKind::PrimaryKey);
        let shade = Swatch::field("shade").expect("shade should be declared");
        assert!(shade.nullable);
        assert!(matches!(shade.kind, FieldKind::Enum { type_name: "Shade", .. }));
        assert_eq!(
            Swatch::field("extra").map(|f| f.kind),
            Some(FieldKind::Unsupported("json"))
        );
        assert_eq!(Swatch::unique_fields(), &["code"]);
    }

    #[test]
    fn test_get_and_put_field() {
        let mut swatch = Swatch::default();
        swatch
            .put_field("shade", FieldValue::String("dark".to_string()))
            .expect("put should succeed");
        assert_eq!(swatch.shade, Some(Shade::Dark));
        assert_eq!(
            swatch.get_field("shade"),
            Some(FieldValue::String("dark".to_string()))
        );
        assert_eq!(swatch.get_field("id"), Some(FieldValue::Null));
        assert_eq!(swatch.get_field("nope"), None);
    }

    #[test]
    fn test_put_field_rejects_mismatch_and_keeps_value() {
        let mut swatch = Swatch::default();
        let err = swatch
            .put_field("count", FieldValue::String("x".to_string()))
            .expect_err("mismatch should fail");
        assert_eq!(err, ValidationError::TypeMismatch("count".to_string()));
        assert_eq!(swatch.count, 42);

        assert!(matches!(
            swatch.put_field("id", FieldValue::Integer(9)),
            Err(ValidationError::ReadOnly(_))
        ));
        assert!(matches!(
            swatch.put_field("missing", FieldValue::Null),
            Err(ValidationError::UnknownField { model: "Swatch", .. })
        ));
    }

    #[test]
    fn test_enum_members() {
        assert_eq!(Shade::MEMBERS, &[("light", "pale"), ("dark", "deep")]);
        assert_eq!(Shade::from_member("light"), Some(Shade::Light));
        assert_eq!(Shade::Dark.label(), "deep");
        assert_eq!(Shade::from_member("pale"), None);
    }
}
