use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("forma_forms.json"),
        }
    }
}

impl StoreConfig {
    /// `FORMA_STORE_PATH`, or `forma_forms.json` in the working directory.
    pub fn from_env() -> Self {
        std::env::var("FORMA_STORE_PATH")
            .ok()
            .filter(|p| !p.is_empty())
            .map(|path| Self {
                path: PathBuf::from(path),
            })
            .unwrap_or_default()
    }
}
