use forma_expr::EvalLimits;
use serde::Deserialize;

/// Tuning for a [`FormRuntime`](crate::FormRuntime).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Upper bound on recomputation passes. `None` uses the number of
    /// derived fields plus one, enough for any acyclic form.
    pub max_passes: Option<usize>,
    pub max_formula_len: usize,
    pub max_formula_depth: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        let limits = EvalLimits::default();
        Self {
            max_passes: None,
            max_formula_len: limits.max_len,
            max_formula_depth: limits.max_depth,
        }
    }
}

impl RuntimeConfig {
    /// Defaults overridden by `FORMA_MAX_PASSES`, `FORMA_MAX_FORMULA_LEN` and
    /// `FORMA_MAX_FORMULA_DEPTH` when they hold valid numbers.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_passes: env_usize("FORMA_MAX_PASSES").or(defaults.max_passes),
            max_formula_len: env_usize("FORMA_MAX_FORMULA_LEN")
                .unwrap_or(defaults.max_formula_len),
            max_formula_depth: env_usize("FORMA_MAX_FORMULA_DEPTH")
                .unwrap_or(defaults.max_formula_depth),
        }
    }

    pub fn eval_limits(&self) -> EvalLimits {
        EvalLimits {
            max_len: self.max_formula_len,
            max_depth: self.max_formula_depth,
        }
    }
}

fn env_usize(name: &str) -> Option<usize> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}
