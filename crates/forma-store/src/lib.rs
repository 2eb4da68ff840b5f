mod error;
mod store;

pub use error::StoreError;
pub use store::{FormStore, publish};

#[cfg(feature = "memory")]
mod memory;

#[cfg(feature = "memory")]
pub use memory::MemoryStore;

#[cfg(feature = "file")]
mod file;

#[cfg(feature = "file")]
pub use file::{FileStore, StoreConfig};
