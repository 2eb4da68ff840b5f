use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use forma_schema::FormSchema;

use super::config::StoreConfig;
use crate::error::StoreError;
use crate::store::FormStore;

/// Keeps every saved form in one JSON array file, oldest first.
///
/// A missing file is an empty store. Writes go to a sibling temp file that
/// is then renamed over the original.
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn open(config: StoreConfig) -> Self {
        Self {
            path: config.path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Vec<FormSchema>, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Corrupt(format!("{}: {e}", self.path.display())))
    }

    fn write_all(&self, forms: &[FormSchema]) -> Result<(), StoreError> {
        let encoded = serde_json::to_vec_pretty(forms)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, encoded)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl FormStore for FileStore {
    fn save(&self, form: &FormSchema) -> Result<(), StoreError> {
        form.check()?;

        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| StoreError::Storage(format!("write lock poisoned: {e}")))?;

        let mut forms = self.read_all()?;
        if forms.iter().any(|f| f.id == form.id) {
            return Err(StoreError::AlreadyExists(form.id.clone()));
        }
        forms.push(form.clone());
        self.write_all(&forms)?;

        tracing::info!(id = %form.id, path = %self.path.display(), "saved form");
        Ok(())
    }

    fn list(&self) -> Result<Vec<FormSchema>, StoreError> {
        let mut forms = self.read_all()?;
        forms.reverse();
        Ok(forms)
    }

    fn get(&self, id: &str) -> Result<Option<FormSchema>, StoreError> {
        Ok(self.read_all()?.into_iter().find(|f| f.id == id))
    }
}
