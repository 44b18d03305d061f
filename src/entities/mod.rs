//! Model definition macros (`admin_model!`, `admin_enum!`)

pub mod macros;
