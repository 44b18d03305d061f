//! Generic CRUD controller and view models shared by every registered model

pub mod form;
pub mod state;

pub use form::{Control, FieldView, SelectOption, column_names, field_views, format_cell, row_cells};
pub use state::{CrudController, CrudState, ListAction, Navigation};
