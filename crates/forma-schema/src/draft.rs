use crate::error::SchemaError;
use crate::field::FieldSchema;
use crate::form::{FormSchema, check_label};

/// An in-memory form being authored. Fields are added, edited and removed
/// one at a time; edits replace a field by its `id`.
#[derive(Debug, Clone, Default)]
pub struct FormDraft {
    name: String,
    fields: Vec<FieldSchema>,
}

impl FormDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    pub fn add_field(&mut self, field: FieldSchema) -> Result<(), SchemaError> {
        check_label(&field)?;
        if self.position(&field.id).is_some() {
            return Err(SchemaError::DuplicateFieldId { id: field.id });
        }
        self.fields.push(field);
        Ok(())
    }

    pub fn update_field(&mut self, field: FieldSchema) -> Result<(), SchemaError> {
        check_label(&field)?;
        let idx = self.require(&field.id)?;
        self.fields[idx] = field;
        Ok(())
    }

    pub fn remove_field(&mut self, id: &str) -> Result<FieldSchema, SchemaError> {
        let idx = self.require(id)?;
        Ok(self.fields.remove(idx))
    }

    /// Moves a field to `index`, clamped to the end of the list.
    pub fn move_field(&mut self, id: &str, index: usize) -> Result<(), SchemaError> {
        let idx = self.require(id)?;
        let field = self.fields.remove(idx);
        let index = index.min(self.fields.len());
        self.fields.insert(index, field);
        Ok(())
    }

    /// Snapshot the draft as a checked [`FormSchema`] with a fresh id and
    /// creation time. The draft itself is left untouched.
    pub fn finish(&self) -> Result<FormSchema, SchemaError> {
        let form = FormSchema::new(self.name.trim(), self.fields.clone());
        form.check()?;
        Ok(form)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.id == id)
    }

    fn require(&self, id: &str) -> Result<usize, SchemaError> {
        self.position(id)
            .ok_or_else(|| SchemaError::UnknownField { id: id.to_string() })
    }
}

/// Split an author-entered parent list (`"a, b,,c"`) into trimmed keys.
pub fn parse_parents(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldType;

    fn field(key: &str) -> FieldSchema {
        FieldSchema::new(FieldType::Text, key).with_key(key)
    }

    #[test]
    fn parents_are_trimmed_and_filtered() {
        assert_eq!(parse_parents(" a, b,,c ,"), ["a", "b", "c"]);
        assert!(parse_parents("  ").is_empty());
    }

    #[test]
    fn add_rejects_empty_label() {
        let mut draft = FormDraft::new("Form");
        let mut f = field("a");
        f.label = "  ".into();
        assert!(matches!(draft.add_field(f), Err(SchemaError::EmptyLabel { .. })));
        assert!(draft.fields().is_empty());
    }

    #[test]
    fn update_replaces_by_id() {
        let mut draft = FormDraft::new("Form");
        let f = field("a");
        let id = f.id.clone();
        draft.add_field(f.clone()).unwrap();
        draft.add_field(field("b")).unwrap();

        let edited = FieldSchema {
            label: "Renamed".into(),
            ..f
        };
        draft.update_field(edited).unwrap();
        assert_eq!(draft.fields()[0].label, "Renamed");
        assert_eq!(draft.fields()[0].id, id);
        assert_eq!(draft.fields().len(), 2);
    }

    #[test]
    fn update_unknown_field_errors() {
        let mut draft = FormDraft::new("Form");
        let err = draft.update_field(field("a")).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownField { .. }));
    }

    #[test]
    fn remove_and_move() {
        let mut draft = FormDraft::new("Form");
        let a = field("a");
        let c = field("c");
        let (a_id, c_id) = (a.id.clone(), c.id.clone());
        draft.add_field(a).unwrap();
        draft.add_field(field("b")).unwrap();
        draft.add_field(c).unwrap();

        draft.move_field(&c_id, 0).unwrap();
        let keys: Vec<&str> = draft.fields().iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, ["c", "a", "b"]);

        let removed = draft.remove_field(&a_id).unwrap();
        assert_eq!(removed.key, "a");
        assert_eq!(draft.fields().len(), 2);
    }

    #[test]
    fn finish_requires_name_and_unique_keys() {
        let mut draft = FormDraft::new("");
        draft.add_field(field("a")).unwrap();
        assert_eq!(draft.finish(), Err(SchemaError::EmptyFormName));

        draft.set_name("Survey");
        draft.add_field(field("a")).unwrap();
        assert_eq!(
            draft.finish(),
            Err(SchemaError::DuplicateKey { key: "a".into() })
        );
    }

    #[test]
    fn finish_snapshots_fields() {
        let mut draft = FormDraft::new(" Survey ");
        draft.add_field(field("a")).unwrap();
        let form = draft.finish().unwrap();
        assert_eq!(form.name, "Survey");
        assert_eq!(form.fields.len(), 1);
        assert!(!form.id.is_empty());
    }
}
