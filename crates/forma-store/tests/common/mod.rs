#![allow(dead_code)]

use forma_schema::{DerivedSpec, FieldSchema, FieldType, FormSchema, ValidationRules};

pub fn contact_form(name: &str) -> FormSchema {
    FormSchema::new(
        name,
        vec![
            FieldSchema::new(FieldType::Text, "Name")
                .with_key("name")
                .with_validations(ValidationRules::required()),
            FieldSchema::new(FieldType::Number, "Qty").with_key("qty"),
            FieldSchema::new(FieldType::Number, "Total")
                .with_key("total")
                .with_derived(DerivedSpec::new(["qty"], "qty * 3")),
        ],
    )
}

pub fn names(forms: &[FormSchema]) -> Vec<&str> {
    forms.iter().map(|f| f.name.as_str()).collect()
}
