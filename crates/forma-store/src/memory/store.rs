use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use forma_schema::FormSchema;
use imbl::{OrdMap, Vector};

use crate::error::StoreError;
use crate::store::FormStore;

/// Encoded forms in save order, plus an id index into them.
#[derive(Clone, Default)]
struct Snapshot {
    forms: Vector<Arc<[u8]>>,
    ids: OrdMap<String, usize>,
}

/// In-process store. Forms are kept as encoded snapshots, so what comes back
/// is always a fresh copy of what was saved.
pub struct MemoryStore {
    data: ArcSwap<Snapshot>,
    write_lock: Mutex<()>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            data: ArcSwap::from_pointee(Snapshot::default()),
            write_lock: Mutex::new(()),
        }
    }

    pub fn len(&self) -> usize {
        self.data.load().forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FormStore for MemoryStore {
    fn save(&self, form: &FormSchema) -> Result<(), StoreError> {
        form.check()?;
        let encoded: Arc<[u8]> = serde_json::to_vec(form)?.into();

        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| StoreError::Storage(format!("write lock poisoned: {e}")))?;

        // Readers keep the old snapshot; imbl makes the clone cheap.
        let mut next = (**self.data.load()).clone();
        if next.ids.contains_key(form.id.as_str()) {
            return Err(StoreError::AlreadyExists(form.id.clone()));
        }
        next.ids.insert(form.id.clone(), next.forms.len());
        next.forms.push_back(encoded);
        self.data.store(Arc::new(next));

        tracing::info!(id = %form.id, name = %form.name, "saved form");
        Ok(())
    }

    fn list(&self) -> Result<Vec<FormSchema>, StoreError> {
        let snapshot = self.data.load();
        snapshot
            .forms
            .iter()
            .rev()
            .map(|bytes| serde_json::from_slice(bytes).map_err(StoreError::from))
            .collect()
    }

    fn get(&self, id: &str) -> Result<Option<FormSchema>, StoreError> {
        let snapshot = self.data.load();
        let Some(bytes) = snapshot.ids.get(id).and_then(|&i| snapshot.forms.get(i)) else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_slice(bytes)?))
    }
}
