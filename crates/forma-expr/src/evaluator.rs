use std::collections::HashMap;

use chrono::{DateTime, Utc};
use forma_schema::FieldValue;

use crate::ast::Expr;
use crate::error::EvalError;
use crate::eval::{Scope, eval};
use crate::helpers::Helpers;
use crate::parser::parse;

/// Bound variables: parent field key → current value.
pub type Context = HashMap<String, FieldValue>;

/// Resource caps applied before a formula runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalLimits {
    /// Maximum formula length in bytes.
    pub max_len: usize,
    /// Maximum nesting of parentheses, unary operators and sub-expressions.
    pub max_depth: usize,
}

impl Default for EvalLimits {
    fn default() -> Self {
        Self {
            max_len: 4096,
            max_depth: 64,
        }
    }
}

/// Where `now` comes from for time-dependent helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Clock {
    #[default]
    System,
    Fixed(DateTime<Utc>),
}

impl Clock {
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(at) => *at,
        }
    }
}

/// A formula parsed once, ready to evaluate against many contexts.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    pub fn parse(source: &str, limits: &EvalLimits) -> Result<Self, EvalError> {
        if source.len() > limits.max_len {
            return Err(EvalError::FormulaTooLong {
                len: source.len(),
                max: limits.max_len,
            });
        }
        let expr = parse(source, limits.max_depth)?;
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Variables the formula reads. Anything here that is not bound in the
    /// context fails evaluation.
    pub fn variables(&self) -> Vec<&str> {
        self.expr.variables()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    helpers: Helpers,
    limits: EvalLimits,
    clock: Clock,
}

impl Evaluator {
    pub fn new(helpers: Helpers, limits: EvalLimits) -> Self {
        Self {
            helpers,
            limits,
            clock: Clock::System,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn helpers(&self) -> &Helpers {
        &self.helpers
    }

    pub fn limits(&self) -> &EvalLimits {
        &self.limits
    }

    pub fn compile(&self, source: &str) -> Result<Formula, EvalError> {
        Formula::parse(source, &self.limits)
    }

    pub fn run(&self, formula: &Formula, context: &Context) -> Result<FieldValue, EvalError> {
        let scope = Scope {
            vars: context,
            helpers: &self.helpers,
            now: self.clock.now(),
        };
        eval(&formula.expr, &scope)
    }

    pub fn try_evaluate(&self, source: &str, context: &Context) -> Result<FieldValue, EvalError> {
        let formula = self.compile(source)?;
        self.run(&formula, context)
    }

    /// Like [`try_evaluate`](Self::try_evaluate), but every failure becomes
    /// `null`. Failures are logged, never returned.
    pub fn evaluate(&self, source: &str, context: &Context) -> FieldValue {
        self.try_evaluate(source, context).unwrap_or_else(|error| {
            tracing::debug!(formula = source, %error, "formula evaluation failed");
            FieldValue::Null
        })
    }
}

/// Evaluate with the standard helpers, default limits and the system clock.
pub fn evaluate(source: &str, context: &Context) -> FieldValue {
    Evaluator::default().evaluate(source, context)
}
