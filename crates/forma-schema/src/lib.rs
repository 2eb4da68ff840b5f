mod date;
mod draft;
mod error;
mod field;
mod form;
mod value;

pub use date::parse_date;
pub use draft::{FormDraft, parse_parents};
pub use error::SchemaError;
pub use field::{Bound, DerivedSpec, FieldOption, FieldSchema, FieldType, ValidationRules};
pub use form::FormSchema;
pub use value::FieldValue;
