mod config;
mod error;
mod runtime;
mod validate;

pub use config::RuntimeConfig;
pub use error::RuntimeError;
pub use runtime::{Convergence, FormRuntime, Submission};
pub use validate::{CompiledRules, messages, validate};
