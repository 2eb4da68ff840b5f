//! The fixed function table formulas reach through `helpers.<name>(...)`.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Timelike, Utc};
use forma_schema::FieldValue;

use crate::error::EvalError;

/// Arguments and ambient inputs handed to a helper.
pub struct HelperCall<'a> {
    pub name: &'a str,
    pub args: &'a [FieldValue],
    /// The evaluator's notion of "now"; the only time source a helper sees.
    pub now: DateTime<Utc>,
}

impl HelperCall<'_> {
    pub fn expect_args(&self, expected: usize) -> Result<(), EvalError> {
        if self.args.len() != expected {
            return Err(EvalError::HelperArity {
                name: self.name.to_string(),
                expected,
                got: self.args.len(),
            });
        }
        Ok(())
    }
}

/// Helpers are plain functions: they receive values and return a value,
/// with no handle on the runtime or the host.
pub type HelperFn = fn(&HelperCall<'_>) -> Result<FieldValue, EvalError>;

#[derive(Clone)]
pub struct Helpers {
    table: BTreeMap<&'static str, HelperFn>,
}

impl Helpers {
    pub fn empty() -> Self {
        Self {
            table: BTreeMap::new(),
        }
    }

    /// The built-in set: `getAge`.
    pub fn standard() -> Self {
        let mut helpers = Self::empty();
        helpers.register("getAge", get_age_helper);
        helpers
    }

    /// Adds or replaces a helper. Registration happens in Rust only; formulas
    /// cannot define helpers.
    pub fn register(&mut self, name: &'static str, f: HelperFn) {
        self.table.insert(name, f);
    }

    pub fn get(&self, name: &str) -> Option<HelperFn> {
        self.table.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.table.keys().copied()
    }
}

impl Default for Helpers {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for Helpers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.table.keys()).finish()
    }
}

fn get_age_helper(call: &HelperCall<'_>) -> Result<FieldValue, EvalError> {
    call.expect_args(1)?;
    Ok(match get_age(&call.args[0], call.now) {
        Some(years) => FieldValue::Number(years as f64),
        None => FieldValue::Null,
    })
}

/// Whole years between a date-like value and `now`, or `None` when the value
/// is not a date. Dates in the future count the same way in reverse, so the
/// result is never negative.
pub fn get_age(value: &FieldValue, now: DateTime<Utc>) -> Option<i64> {
    let date = value.to_date()?;
    let (earlier, later) = if date <= now { (date, now) } else { (now, date) };

    let mut years = i64::from(later.year() - earlier.year());
    let anniversary_passed = (later.month(), later.day(), later.num_seconds_from_midnight())
        >= (earlier.month(), earlier.day(), earlier.num_seconds_from_midnight());
    if !anniversary_passed {
        years -= 1;
    }
    Some(years)
}
