//! Sandboxed evaluation of derived-field formulas.
//!
//! A formula is a single expression. Its only free names are the parent
//! field keys bound in the evaluation context and the `helpers` namespace.
//! There is no assignment, no statement form, and no way to reach anything
//! outside the context and the helper table.

mod ast;
mod error;
mod eval;
mod evaluator;
pub mod helpers;
mod lexer;
mod parser;

pub use ast::{BinaryOp, Expr, LogicalOp, UnaryOp};
pub use error::EvalError;
pub use evaluator::{Clock, Context, EvalLimits, Evaluator, Formula, evaluate};
pub use helpers::{HelperCall, HelperFn, Helpers};
