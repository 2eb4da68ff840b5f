use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value::{FieldValue, fmt_number};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Number,
    Textarea,
    Select,
    Radio,
    Checkbox,
    Date,
}

impl FieldType {
    pub const ALL: [FieldType; 7] = [
        FieldType::Text,
        FieldType::Number,
        FieldType::Textarea,
        FieldType::Select,
        FieldType::Radio,
        FieldType::Checkbox,
        FieldType::Date,
    ];

    /// Types whose input is picked from `options`.
    pub fn is_choice(self) -> bool {
        matches!(self, FieldType::Select | FieldType::Radio | FieldType::Checkbox)
    }

    /// Value a field of this type starts with when it has no default.
    /// Checkboxes hold the list of selected option values.
    pub fn empty_value(self) -> FieldValue {
        match self {
            FieldType::Checkbox => FieldValue::List(Vec::new()),
            _ => FieldValue::Text(String::new()),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Textarea => "textarea",
            FieldType::Select => "select",
            FieldType::Radio => "radio",
            FieldType::Checkbox => "checkbox",
            FieldType::Date => "date",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One selectable choice of a select/radio/checkbox field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOption {
    pub id: String,
    pub label: String,
    pub value: String,
}

impl FieldOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Lower or upper bound for `min`/`max`: a number, or a date string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Bound {
    Number(f64),
    Date(String),
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Number(n) => fmt_number(*n, f),
            Bound::Date(s) => f.write_str(s),
        }
    }
}

/// Validation rules for one field. Every rule is optional and they combine
/// freely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationRules {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<Bound>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<Bound>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub email: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub password_rule: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Replaces the default message of every failing rule except numeric
    /// and date bounds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_error: Option<String>,
}

impl ValidationRules {
    pub fn required() -> Self {
        Self {
            required: true,
            ..Default::default()
        }
    }
}

/// Marks a field as computed from other fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedSpec {
    pub is_derived: bool,
    /// Keys of the fields bound as variables inside `formula`, in order.
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub formula: String,
}

impl DerivedSpec {
    pub fn new<I, S>(parents: I, formula: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            is_derived: true,
            parents: parents.into_iter().map(Into::into).collect(),
            formula: formula.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    pub id: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub label: String,
    /// Unique within a form. Names the field in runtime state and inside
    /// derived formulas.
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validations: Option<ValidationRules>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derived: Option<DerivedSpec>,
}

impl FieldSchema {
    /// A new plain input field with a fresh id and a generated key.
    pub fn new(field_type: FieldType, label: impl Into<String>) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self {
            id: Uuid::new_v4().to_string(),
            field_type,
            label: label.into(),
            key: format!("field_{}", &suffix[..6]),
            placeholder: None,
            default_value: None,
            options: Vec::new(),
            validations: None,
            derived: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_default(mut self, value: impl Into<FieldValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_options(mut self, options: Vec<FieldOption>) -> Self {
        self.options = options;
        self
    }

    pub fn with_validations(mut self, rules: ValidationRules) -> Self {
        self.validations = Some(rules);
        self
    }

    pub fn with_derived(mut self, derived: DerivedSpec) -> Self {
        self.derived = Some(derived);
        self
    }

    /// The derived spec, only when it is switched on.
    pub fn derived_spec(&self) -> Option<&DerivedSpec> {
        self.derived.as_ref().filter(|d| d.is_derived)
    }

    pub fn is_derived(&self) -> bool {
        self.derived_spec().is_some()
    }

    /// The configured default, or the type's empty value.
    pub fn initial_value(&self) -> FieldValue {
        match &self.default_value {
            Some(v) if !v.is_null() => v.clone(),
            _ => self.field_type.empty_value(),
        }
    }
}
