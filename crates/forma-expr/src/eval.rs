use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use forma_schema::FieldValue;

use crate::ast::{BinaryOp, Expr, LogicalOp, UnaryOp};
use crate::error::EvalError;
use crate::evaluator::Context;
use crate::helpers::{HelperCall, Helpers};

/// Everything an expression can see while it runs.
pub(crate) struct Scope<'a> {
    pub vars: &'a Context,
    pub helpers: &'a Helpers,
    pub now: DateTime<Utc>,
}

pub(crate) fn eval(expr: &Expr, scope: &Scope<'_>) -> Result<FieldValue, EvalError> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Var(name) => scope
            .vars
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::UnknownIdentifier(name.clone())),
        Expr::Property { base, name } => property(eval(base, scope)?, name),
        Expr::HelperCall { name, args } => {
            let helper = scope
                .helpers
                .get(name)
                .ok_or_else(|| EvalError::UnknownHelper(name.clone()))?;
            let args = args
                .iter()
                .map(|a| eval(a, scope))
                .collect::<Result<Vec<_>, _>>()?;
            helper(&HelperCall {
                name,
                args: &args,
                now: scope.now,
            })
        }
        Expr::Unary { op, operand } => {
            let v = eval(operand, scope)?;
            match op {
                UnaryOp::Not => Ok(FieldValue::Bool(!truthy(&v))),
                UnaryOp::Neg => finite(-number(&v, "-")?),
            }
        }
        Expr::Binary { op, left, right } => binary(*op, eval(left, scope)?, eval(right, scope)?),
        Expr::Logical { op, left, right } => {
            let l = eval(left, scope)?;
            // Yields the deciding operand itself, not a coerced bool.
            match (op, truthy(&l)) {
                (LogicalOp::And, false) | (LogicalOp::Or, true) => Ok(l),
                _ => eval(right, scope),
            }
        }
        Expr::Conditional {
            cond,
            then,
            otherwise,
        } => {
            if truthy(&eval(cond, scope)?) {
                eval(then, scope)
            } else {
                eval(otherwise, scope)
            }
        }
    }
}

fn property(base: FieldValue, name: &str) -> Result<FieldValue, EvalError> {
    match (name, &base) {
        ("length", FieldValue::Text(s)) => Ok(FieldValue::Number(s.chars().count() as f64)),
        ("length", FieldValue::List(items)) => Ok(FieldValue::Number(items.len() as f64)),
        ("length", other) => Err(EvalError::Type(format!(
            "{} has no length",
            other.type_name()
        ))),
        _ => Err(EvalError::UnknownProperty(name.to_string())),
    }
}

fn binary(op: BinaryOp, l: FieldValue, r: FieldValue) -> Result<FieldValue, EvalError> {
    match op {
        BinaryOp::Add => add(l, r),
        BinaryOp::Sub => finite(number(&l, "-")? - number(&r, "-")?),
        BinaryOp::Mul => finite(number(&l, "*")? * number(&r, "*")?),
        BinaryOp::Div => finite(number(&l, "/")? / number(&r, "/")?),
        BinaryOp::Rem => finite(number(&l, "%")? % number(&r, "%")?),
        BinaryOp::Eq => Ok(FieldValue::Bool(l == r)),
        BinaryOp::Ne => Ok(FieldValue::Bool(l != r)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ord = compare(&l, &r, op)?;
            let result = match op {
                BinaryOp::Lt => ord == Ordering::Less,
                BinaryOp::Le => ord != Ordering::Greater,
                BinaryOp::Gt => ord == Ordering::Greater,
                BinaryOp::Ge => ord != Ordering::Less,
                _ => unreachable!(),
            };
            Ok(FieldValue::Bool(result))
        }
    }
}

/// Text on either side concatenates; otherwise both sides must be numeric.
fn add(l: FieldValue, r: FieldValue) -> Result<FieldValue, EvalError> {
    match (&l, &r) {
        (FieldValue::List(_), _) | (_, FieldValue::List(_)) => Err(EvalError::Type(format!(
            "cannot apply '+' to {} and {}",
            l.type_name(),
            r.type_name()
        ))),
        (FieldValue::Text(_), _) | (_, FieldValue::Text(_)) => {
            Ok(FieldValue::Text(format!("{l}{r}")))
        }
        _ => finite(number(&l, "+")? + number(&r, "+")?),
    }
}

fn compare(l: &FieldValue, r: &FieldValue, op: BinaryOp) -> Result<Ordering, EvalError> {
    if let (FieldValue::Text(a), FieldValue::Text(b)) = (l, r) {
        return Ok(a.cmp(b));
    }
    let (a, b) = (number(l, op.symbol())?, number(r, op.symbol())?);
    // Both operands are finite, so partial_cmp always succeeds.
    Ok(a.partial_cmp(&b).unwrap_or(Ordering::Equal))
}

/// Numeric coercion: `null` and blank text are 0, booleans are 0/1, text
/// must parse as a finite decimal.
pub(crate) fn to_number(v: &FieldValue) -> Option<f64> {
    match v {
        FieldValue::Null => Some(0.0),
        FieldValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        FieldValue::Number(n) => Some(*n),
        FieldValue::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                Some(0.0)
            } else {
                s.parse::<f64>().ok().filter(|n| n.is_finite())
            }
        }
        FieldValue::List(_) => None,
    }
}

fn number(v: &FieldValue, op: &str) -> Result<f64, EvalError> {
    to_number(v).ok_or_else(|| {
        EvalError::Type(format!("cannot apply '{op}' to {} {v:?}", v.type_name()))
    })
}

fn finite(n: f64) -> Result<FieldValue, EvalError> {
    if n.is_finite() {
        Ok(FieldValue::Number(n))
    } else {
        Err(EvalError::NotFinite)
    }
}

pub(crate) fn truthy(v: &FieldValue) -> bool {
    match v {
        FieldValue::Null => false,
        FieldValue::Bool(b) => *b,
        FieldValue::Number(n) => *n != 0.0 && !n.is_nan(),
        FieldValue::Text(s) => !s.is_empty(),
        FieldValue::List(_) => true,
    }
}
