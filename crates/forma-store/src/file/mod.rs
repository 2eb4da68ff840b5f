mod config;
mod store;

pub use config::StoreConfig;
pub use store::FileStore;
