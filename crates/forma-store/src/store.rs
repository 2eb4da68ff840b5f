use forma_schema::{FormDraft, FormSchema};

use crate::error::StoreError;

/// Where saved form definitions live. Saved forms are immutable snapshots:
/// there is no update or delete.
pub trait FormStore {
    /// Checks the form and stores it. Fails if the id is already taken.
    fn save(&self, form: &FormSchema) -> Result<(), StoreError>;

    /// Every saved form, most recently saved first.
    fn list(&self) -> Result<Vec<FormSchema>, StoreError>;

    fn get(&self, id: &str) -> Result<Option<FormSchema>, StoreError>;
}

/// Finish an authoring draft and save the result.
pub fn publish<S: FormStore + ?Sized>(
    store: &S,
    draft: &FormDraft,
) -> Result<FormSchema, StoreError> {
    let form = draft.finish()?;
    store.save(&form)?;
    Ok(form)
}
