use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SchemaError;
use crate::field::FieldSchema;

/// A named, ordered list of fields. Field order is render order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSchema {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub fields: Vec<FieldSchema>,
}

impl FormSchema {
    /// Stamps a fresh id and the current time. Does not run [`check`](Self::check).
    pub fn new(name: impl Into<String>, fields: Vec<FieldSchema>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            created_at: Utc::now(),
            fields,
        }
    }

    pub fn field(&self, key: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn field_by_id(&self, id: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn derived_fields(&self) -> impl Iterator<Item = &FieldSchema> {
        self.fields.iter().filter(|f| f.is_derived())
    }

    /// Authoring invariants: a name, a label and key on every field, unique
    /// keys and ids, and unique option values within each field.
    pub fn check(&self) -> Result<(), SchemaError> {
        if self.name.trim().is_empty() {
            return Err(SchemaError::EmptyFormName);
        }

        let mut keys = HashSet::with_capacity(self.fields.len());
        let mut ids = HashSet::with_capacity(self.fields.len());
        for field in &self.fields {
            check_field(field)?;
            if !ids.insert(field.id.as_str()) {
                return Err(SchemaError::DuplicateFieldId {
                    id: field.id.clone(),
                });
            }
            if !keys.insert(field.key.as_str()) {
                return Err(SchemaError::DuplicateKey {
                    key: field.key.clone(),
                });
            }
        }
        Ok(())
    }
}

pub(crate) fn check_label(field: &FieldSchema) -> Result<(), SchemaError> {
    if field.label.trim().is_empty() {
        return Err(SchemaError::EmptyLabel {
            field: field.id.clone(),
        });
    }
    Ok(())
}

fn check_field(field: &FieldSchema) -> Result<(), SchemaError> {
    check_label(field)?;
    if field.key.trim().is_empty() {
        return Err(SchemaError::EmptyKey {
            field: field.id.clone(),
        });
    }

    let mut values = HashSet::with_capacity(field.options.len());
    for option in &field.options {
        if !values.insert(option.value.as_str()) {
            return Err(SchemaError::DuplicateOptionValue {
                field: field.key.clone(),
                value: option.value.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{DerivedSpec, FieldOption, FieldType};

    fn text(key: &str) -> FieldSchema {
        FieldSchema::new(FieldType::Text, key.to_uppercase()).with_key(key)
    }

    #[test]
    fn valid_form_passes() {
        let form = FormSchema::new("Signup", vec![text("name"), text("email")]);
        assert!(form.check().is_ok());
    }

    #[test]
    fn blank_name_rejected() {
        let form = FormSchema::new("   ", vec![text("name")]);
        assert_eq!(form.check(), Err(SchemaError::EmptyFormName));
    }

    #[test]
    fn duplicate_key_rejected() {
        let form = FormSchema::new("Signup", vec![text("name"), text("name")]);
        assert_eq!(
            form.check(),
            Err(SchemaError::DuplicateKey { key: "name".into() })
        );
    }

    #[test]
    fn duplicate_option_value_rejected() {
        let field = FieldSchema::new(FieldType::Select, "Size")
            .with_key("size")
            .with_options(vec![FieldOption::new("Small", "s"), FieldOption::new("Tiny", "s")]);
        let form = FormSchema::new("Order", vec![field]);
        assert!(matches!(
            form.check(),
            Err(SchemaError::DuplicateOptionValue { value, .. }) if value == "s"
        ));
    }

    #[test]
    fn empty_label_rejected() {
        let mut field = text("name");
        field.label = String::new();
        let form = FormSchema::new("Signup", vec![field]);
        assert!(matches!(form.check(), Err(SchemaError::EmptyLabel { .. })));
    }

    #[test]
    fn derived_fields_in_order() {
        let total = text("total").with_derived(DerivedSpec::new(["a"], "a"));
        let form = FormSchema::new("Calc", vec![text("a"), total]);
        let keys: Vec<&str> = form.derived_fields().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, ["total"]);
    }

    #[test]
    fn record_format_round_trips() {
        let form = FormSchema::new("Signup", vec![text("name")]);
        let json = serde_json::to_value(&form).unwrap();
        assert!(json["createdAt"].is_string());
        assert_eq!(json["fields"][0]["key"], "name");
        let back: FormSchema = serde_json::from_value(json).unwrap();
        assert_eq!(back, form);
    }
}
