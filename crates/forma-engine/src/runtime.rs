use std::collections::HashMap;

use forma_expr::{Context, EvalError, Evaluator, Formula, Helpers};
use forma_schema::{FieldSchema, FieldType, FieldValue, FormSchema};

use crate::config::RuntimeConfig;
use crate::error::RuntimeError;
use crate::validate::CompiledRules;

/// How the last recomputation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convergence {
    /// No derived value changes any more. `passes` counts the passes that
    /// changed at least one value; the final confirming pass is not counted.
    Converged { passes: usize },
    /// The pass bound was hit (a formula cycle). Fields still changing in
    /// the last pass were put back to what they held before the
    /// recomputation started; fields that settled keep their new values.
    Diverged { passes: usize },
}

impl Convergence {
    pub fn is_converged(&self) -> bool {
        matches!(self, Convergence::Converged { .. })
    }
}

/// Outcome of [`FormRuntime::submit`].
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// Every field passed. Values in field order.
    Accepted(Vec<(String, FieldValue)>),
    /// Failing fields and their messages, in field order.
    Rejected(Vec<(String, String)>),
}

/// A derived field with its formula compiled once up front.
struct DerivedSlot {
    key: String,
    parents: Vec<String>,
    formula: Result<Formula, EvalError>,
}

/// Live state of one rendered form: the current value and validation error
/// of every field, with derived fields kept at their fixpoint.
///
/// All operations run to completion; nothing here blocks or is shared.
pub struct FormRuntime {
    schema: FormSchema,
    index: HashMap<String, usize>,
    values: HashMap<String, FieldValue>,
    errors: HashMap<String, Option<String>>,
    derivation_errors: HashMap<String, EvalError>,
    derived: Vec<DerivedSlot>,
    rules: HashMap<String, CompiledRules>,
    evaluator: Evaluator,
    max_passes: usize,
    last: Convergence,
}

impl FormRuntime {
    pub fn new(schema: FormSchema, config: RuntimeConfig) -> Result<Self, RuntimeError> {
        let evaluator = Evaluator::new(Helpers::standard(), config.eval_limits());
        Self::with_evaluator(schema, config, evaluator)
    }

    /// Use a custom evaluator (extra helpers, a fixed clock). Its own limits
    /// apply instead of the config's formula limits.
    pub fn with_evaluator(
        schema: FormSchema,
        config: RuntimeConfig,
        evaluator: Evaluator,
    ) -> Result<Self, RuntimeError> {
        schema.check()?;

        let index = schema
            .fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.key.clone(), i))
            .collect::<HashMap<_, _>>();

        let derived = schema
            .derived_fields()
            .filter_map(|field| {
                let spec = field.derived_spec()?;
                let formula = evaluator.compile(&spec.formula);
                audit_formula(field, &formula, &index);
                Some(DerivedSlot {
                    key: field.key.clone(),
                    parents: spec.parents.clone(),
                    formula,
                })
            })
            .collect::<Vec<_>>();

        let rules = schema
            .fields
            .iter()
            .filter_map(|f| Some((f.key.clone(), CompiledRules::new(f.validations.as_ref()?))))
            .collect();

        let max_passes = config.max_passes.unwrap_or(derived.len() + 1).max(1);

        let mut runtime = Self {
            schema,
            index,
            values: HashMap::new(),
            errors: HashMap::new(),
            derivation_errors: HashMap::new(),
            derived,
            rules,
            evaluator,
            max_passes,
            last: Convergence::Converged { passes: 0 },
        };
        runtime.reset();
        Ok(runtime)
    }

    /// Back to every field's initial value with no errors, then recompute.
    pub fn reset(&mut self) {
        self.values = self
            .schema
            .fields
            .iter()
            .map(|f| (f.key.clone(), f.initial_value()))
            .collect();
        self.errors = self
            .schema
            .fields
            .iter()
            .map(|f| (f.key.clone(), None))
            .collect();
        self.derivation_errors.clear();
        self.recompute();
    }

    // ── Accessors ───────────────────────────────────────────────

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn field(&self, key: &str) -> Option<&FieldSchema> {
        self.index.get(key).map(|&i| &self.schema.fields[i])
    }

    pub fn value(&self, key: &str) -> Option<&FieldValue> {
        self.values.get(key)
    }

    pub fn values(&self) -> &HashMap<String, FieldValue> {
        &self.values
    }

    /// Values in field order.
    pub fn ordered_values(&self) -> Vec<(String, FieldValue)> {
        self.schema
            .fields
            .iter()
            .map(|f| {
                let v = self.values.get(&f.key).cloned().unwrap_or(FieldValue::Null);
                (f.key.clone(), v)
            })
            .collect()
    }

    pub fn error(&self, key: &str) -> Option<&str> {
        self.errors.get(key).and_then(|e| e.as_deref())
    }

    pub fn errors(&self) -> &HashMap<String, Option<String>> {
        &self.errors
    }

    /// Why a derived field currently holds `null`, if its formula failed.
    pub fn derivation_error(&self, key: &str) -> Option<&EvalError> {
        self.derivation_errors.get(key)
    }

    pub fn last_convergence(&self) -> Convergence {
        self.last
    }

    pub fn max_passes(&self) -> usize {
        self.max_passes
    }

    // ── Transitions ─────────────────────────────────────────────

    /// Write a user edit, validate that field, then bring derived fields back
    /// to a fixpoint.
    pub fn set_value(
        &mut self,
        key: &str,
        value: impl Into<FieldValue>,
    ) -> Result<Convergence, RuntimeError> {
        let value = value.into();
        let field = self
            .field(key)
            .ok_or_else(|| RuntimeError::UnknownField(key.to_string()))?;

        if field.is_derived() {
            return Err(RuntimeError::DerivedReadOnly(key.to_string()));
        }
        if field.field_type == FieldType::Checkbox && !matches!(value, FieldValue::List(_)) {
            return Err(RuntimeError::NotAList(key.to_string()));
        }

        let error = self.check(key, &value);
        self.values.insert(key.to_string(), value);
        self.errors.insert(key.to_string(), error);
        Ok(self.recompute())
    }

    /// Re-evaluate every derived field until a pass changes nothing, or the
    /// pass bound is hit.
    ///
    /// Fields are evaluated in declaration order and each sees the values
    /// written earlier in the same pass.
    pub fn recompute(&mut self) -> Convergence {
        if self.derived.is_empty() {
            self.last = Convergence::Converged { passes: 0 };
            return self.last;
        }

        let before: HashMap<String, (FieldValue, Option<EvalError>)> = self
            .derived
            .iter()
            .map(|slot| {
                let v = self.values.get(&slot.key).cloned().unwrap_or(FieldValue::Null);
                let e = self.derivation_errors.get(&slot.key).cloned();
                (slot.key.clone(), (v, e))
            })
            .collect();

        let mut passes = 0;
        let mut changed = Vec::new();
        while passes < self.max_passes {
            changed.clear();
            for slot in &self.derived {
                let value = match self.derive(slot) {
                    Ok(v) => {
                        self.derivation_errors.remove(&slot.key);
                        v
                    }
                    Err(error) => {
                        tracing::debug!(field = %slot.key, %error, "derived field evaluation failed");
                        self.derivation_errors.insert(slot.key.clone(), error);
                        FieldValue::Null
                    }
                };
                if self.values.get(&slot.key) != Some(&value) {
                    self.values.insert(slot.key.clone(), value);
                    changed.push(slot.key.clone());
                }
            }

            if changed.is_empty() {
                self.last = Convergence::Converged { passes };
                return self.last;
            }
            passes += 1;
        }

        tracing::warn!(
            passes,
            unsettled = ?changed,
            "derived fields did not converge; keeping their last stable values"
        );
        for key in changed {
            let Some((value, error)) = before.get(&key).cloned() else {
                continue;
            };
            match error {
                Some(error) => self.derivation_errors.insert(key.clone(), error),
                None => self.derivation_errors.remove(&key),
            };
            self.values.insert(key, value);
        }
        self.last = Convergence::Diverged { passes };
        self.last
    }

    fn derive(&self, slot: &DerivedSlot) -> Result<FieldValue, EvalError> {
        let formula = slot.formula.as_ref().map_err(Clone::clone)?;
        let context: Context = slot
            .parents
            .iter()
            .map(|p| {
                let v = self.values.get(p).cloned().unwrap_or(FieldValue::Null);
                (p.clone(), v)
            })
            .collect();
        self.evaluator.run(formula, &context)
    }

    fn check(&self, key: &str, value: &FieldValue) -> Option<String> {
        self.rules.get(key)?.check(value)
    }

    /// Validate every field, replacing all errors. True when all pass.
    pub fn validate_all(&mut self) -> bool {
        let errors: HashMap<String, Option<String>> = self
            .schema
            .fields
            .iter()
            .map(|f| {
                let value = self.values.get(&f.key).unwrap_or(&FieldValue::Null);
                (f.key.clone(), self.check(&f.key, value))
            })
            .collect();
        let ok = errors.values().all(Option::is_none);
        self.errors = errors;
        ok
    }

    /// Accept or reject the current values. Nothing is sent or stored.
    pub fn submit(&mut self) -> Submission {
        if self.validate_all() {
            return Submission::Accepted(self.ordered_values());
        }
        let failures = self
            .schema
            .fields
            .iter()
            .filter_map(|f| Some((f.key.clone(), self.error(&f.key)?.to_string())))
            .collect();
        Submission::Rejected(failures)
    }
}

/// Log formula problems visible at load time: parse failures, parents that
/// name no field, and variables that are not declared parents.
fn audit_formula(
    field: &FieldSchema,
    formula: &Result<Formula, EvalError>,
    index: &HashMap<String, usize>,
) {
    let Some(spec) = field.derived_spec() else {
        return;
    };
    for parent in spec.parents.iter().filter(|p| !index.contains_key(*p)) {
        tracing::warn!(field = %field.key, %parent, "derived field names an unknown parent");
    }
    match formula {
        Ok(formula) => {
            for var in formula.variables() {
                if !spec.parents.iter().any(|p| p == var) {
                    tracing::warn!(field = %field.key, variable = var, "formula reads an undeclared parent");
                }
            }
        }
        Err(error) => {
            tracing::warn!(field = %field.key, %error, "derived formula does not compile");
        }
    }
}
