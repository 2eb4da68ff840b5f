use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use forma_schema::{Bound, FieldValue, ValidationRules, parse_date};
use regex::Regex;

/// Default messages. `customError` replaces all of them except the bound
/// messages.
pub mod messages {
    pub const REQUIRED: &str = "This field is required.";
    pub const EMAIL: &str = "Enter a valid email.";
    pub const PASSWORD: &str = "Password must be min 8 chars and contain a number.";
    pub const PATTERN: &str = "Value does not match the required pattern.";
    pub const NUMBER: &str = "Enter a valid number.";
    pub const DATE: &str = "Enter a valid date.";
}

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid"));

/// Check one value against one rule set. Returns the first failing rule's
/// message, or `None` when the value passes.
///
/// Order:
/// 1. `required` (an empty value never reaches later rules; an optional
///    empty value always passes)
/// 2. text rules: `minLength`, `maxLength`, `email`, `passwordRule`, `pattern`
/// 3. bounds: `min`, `max`
///
/// Compiles `pattern` on every call; use [`CompiledRules`] to check many
/// values against the same rules.
pub fn validate(value: &FieldValue, rules: Option<&ValidationRules>) -> Option<String> {
    CompiledRules::new(rules?).check(value)
}

/// A rule set with its `pattern` compiled once. A malformed pattern is
/// logged here and the rule is skipped on every check.
#[derive(Debug, Clone)]
pub struct CompiledRules {
    rules: ValidationRules,
    pattern: Option<Regex>,
}

impl CompiledRules {
    pub fn new(rules: &ValidationRules) -> Self {
        let pattern = rules
            .pattern
            .as_deref()
            .filter(|p| !p.is_empty())
            .and_then(|pattern| match Regex::new(pattern) {
                Ok(re) => Some(re),
                Err(error) => {
                    tracing::warn!(pattern, %error, "skipping malformed validation pattern");
                    None
                }
            });
        Self {
            rules: rules.clone(),
            pattern,
        }
    }

    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    /// Whether a usable `pattern` rule is in force.
    pub fn has_pattern(&self) -> bool {
        self.pattern.is_some()
    }

    /// Same verdict as [`validate`] with these rules.
    pub fn check(&self, value: &FieldValue) -> Option<String> {
        let rules = &self.rules;
        if value.is_empty() {
            return rules.required.then(|| fail(rules, messages::REQUIRED.to_string()));
        }

        if let FieldValue::Text(text) = value {
            if let Some(message) = check_text(text, rules, self.pattern.as_ref()) {
                return Some(message);
            }
        }

        check_bounds(value, rules)
    }
}

fn fail(rules: &ValidationRules, default: String) -> String {
    match &rules.custom_error {
        Some(custom) if !custom.is_empty() => custom.clone(),
        _ => default,
    }
}

fn check_text(text: &str, rules: &ValidationRules, pattern: Option<&Regex>) -> Option<String> {
    let len = text.chars().count();

    if let Some(min) = rules.min_length {
        if len < min as usize {
            return Some(fail(rules, format!("Minimum length is {min}.")));
        }
    }
    if let Some(max) = rules.max_length {
        if len > max as usize {
            return Some(fail(rules, format!("Maximum length is {max}.")));
        }
    }
    if rules.email && !EMAIL.is_match(text) {
        return Some(fail(rules, messages::EMAIL.to_string()));
    }
    if rules.password_rule && (len < 8 || !text.chars().any(|c| c.is_ascii_digit())) {
        return Some(fail(rules, messages::PASSWORD.to_string()));
    }
    if pattern.is_some_and(|re| !re.is_match(text)) {
        return Some(fail(rules, messages::PATTERN.to_string()));
    }
    None
}

// ── Bounds ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
enum Limit {
    Number(f64),
    Date(DateTime<Utc>),
}

/// A date-string bound is compared as a date when it parses as one, and as
/// a number when it is numeric text. Anything else is skipped.
fn resolve(bound: &Bound) -> Option<Limit> {
    match bound {
        Bound::Number(n) if n.is_finite() => Some(Limit::Number(*n)),
        Bound::Number(_) => None,
        Bound::Date(s) => {
            if let Some(date) = parse_date(s) {
                return Some(Limit::Date(date));
            }
            let n = s.trim().parse::<f64>().ok().filter(|n| n.is_finite());
            if n.is_none() {
                tracing::warn!(bound = %s, "skipping unparseable min/max bound");
            }
            n.map(Limit::Number)
        }
    }
}

fn check_bounds(value: &FieldValue, rules: &ValidationRules) -> Option<String> {
    let limits = [
        (rules.min.as_ref(), std::cmp::Ordering::Less, "Minimum"),
        (rules.max.as_ref(), std::cmp::Ordering::Greater, "Maximum"),
    ];

    for (bound, outside, label) in limits {
        let Some(bound) = bound else { continue };
        let Some(limit) = resolve(bound) else { continue };

        let ord = match limit {
            Limit::Number(limit) => match coerce_number(value) {
                Some(n) => n.partial_cmp(&limit),
                None => return Some(messages::NUMBER.to_string()),
            },
            Limit::Date(limit) => match coerce_date(value) {
                Some(d) => Some(d.cmp(&limit)),
                None => return Some(messages::DATE.to_string()),
            },
        };
        if ord == Some(outside) {
            return Some(format!("{label} value is {bound}."));
        }
    }
    None
}

fn coerce_number(value: &FieldValue) -> Option<f64> {
    match value {
        FieldValue::Number(n) => Some(*n),
        FieldValue::Text(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

fn coerce_date(value: &FieldValue) -> Option<DateTime<Utc>> {
    match value {
        FieldValue::Text(s) => parse_date(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> ValidationRules {
        ValidationRules::default()
    }

    fn check(value: impl Into<FieldValue>, rules: &ValidationRules) -> Option<String> {
        validate(&value.into(), Some(rules))
    }

    #[test]
    fn no_rules_always_pass() {
        assert_eq!(validate(&FieldValue::Null, None), None);
        assert_eq!(validate(&FieldValue::from("x"), None), None);
    }

    #[test]
    fn required_rejects_every_empty_shape() {
        let r = ValidationRules::required();
        for empty in [
            FieldValue::Null,
            FieldValue::from(""),
            FieldValue::List(vec![]),
        ] {
            assert_eq!(
                validate(&empty, Some(&r)).as_deref(),
                Some(messages::REQUIRED),
                "{empty:?}"
            );
        }
        assert_eq!(check(0, &r), None);
        assert_eq!(check(vec!["a"], &r), None);
    }

    #[test]
    fn required_uses_custom_error() {
        let r = ValidationRules {
            required: true,
            custom_error: Some("Tell us your name".into()),
            ..rules()
        };
        assert_eq!(check("", &r).as_deref(), Some("Tell us your name"));
    }

    #[test]
    fn optional_empty_skips_everything() {
        let r = ValidationRules {
            min_length: Some(10),
            email: true,
            password_rule: true,
            pattern: Some("^x$".into()),
            min: Some(Bound::Number(5.0)),
            ..rules()
        };
        assert_eq!(check("", &r), None);
        assert_eq!(validate(&FieldValue::Null, Some(&r)), None);
    }

    #[test]
    fn length_limits() {
        let r = ValidationRules {
            min_length: Some(2),
            max_length: Some(4),
            ..rules()
        };
        assert_eq!(check("a", &r).as_deref(), Some("Minimum length is 2."));
        assert_eq!(check("abcde", &r).as_deref(), Some("Maximum length is 4."));
        assert_eq!(check("abc", &r), None);
        // Counted in characters, not bytes.
        assert_eq!(check("éééé", &r), None);
    }

    #[test]
    fn email_format() {
        let r = ValidationRules {
            email: true,
            ..rules()
        };
        assert_eq!(check("abc@def.com", &r), None);
        assert_eq!(check("not-an-email", &r).as_deref(), Some(messages::EMAIL));
        assert!(check("a b@c.d", &r).is_some());
        assert!(check("a@b", &r).is_some());
    }

    #[test]
    fn password_rule() {
        let r = ValidationRules {
            password_rule: true,
            ..rules()
        };
        assert_eq!(check("abcdefgh", &r).as_deref(), Some(messages::PASSWORD));
        assert_eq!(check("abc123", &r).as_deref(), Some(messages::PASSWORD));
        assert_eq!(check("abcd1234", &r), None);
    }

    #[test]
    fn first_failing_rule_wins() {
        let r = ValidationRules {
            min_length: Some(20),
            email: true,
            ..rules()
        };
        assert_eq!(check("nope", &r).as_deref(), Some("Minimum length is 20."));
    }

    #[test]
    fn custom_error_overrides_text_rules() {
        let r = ValidationRules {
            email: true,
            custom_error: Some("Work email please".into()),
            ..rules()
        };
        assert_eq!(check("nope", &r).as_deref(), Some("Work email please"));
    }

    #[test]
    fn pattern_match_and_malformed_pattern() {
        let r = ValidationRules {
            pattern: Some(r"^\d{5}$".into()),
            ..rules()
        };
        assert_eq!(check("12345", &r), None);
        assert_eq!(check("1234a", &r).as_deref(), Some(messages::PATTERN));

        let broken = ValidationRules {
            pattern: Some("[unclosed".into()),
            ..rules()
        };
        assert_eq!(check("anything", &broken), None);
    }

    #[test]
    fn compiled_rules_reuse_one_pattern() {
        let compiled = CompiledRules::new(&ValidationRules {
            required: true,
            pattern: Some(r"^[A-Z]{3}-\d+$".into()),
            ..rules()
        });
        assert!(compiled.has_pattern());
        for (input, expected) in [
            ("ABC-1", None),
            ("abc-1", Some(messages::PATTERN)),
            ("XYZ-42", None),
            ("", Some(messages::REQUIRED)),
        ] {
            let value = FieldValue::from(input);
            assert_eq!(compiled.check(&value).as_deref(), expected, "{input:?}");
            assert_eq!(compiled.check(&value), validate(&value, Some(compiled.rules())));
        }

        let broken = CompiledRules::new(&ValidationRules {
            pattern: Some("(".into()),
            ..rules()
        });
        assert!(!broken.has_pattern());
        assert_eq!(broken.check(&FieldValue::from("anything")), None);
    }

    #[test]
    fn numeric_bounds() {
        let min = ValidationRules {
            min: Some(Bound::Number(10.0)),
            ..rules()
        };
        assert_eq!(check(5, &min).as_deref(), Some("Minimum value is 10."));

        let range = ValidationRules {
            min: Some(Bound::Number(10.0)),
            max: Some(Bound::Number(20.0)),
            ..rules()
        };
        assert_eq!(check(15, &range), None);
        assert_eq!(check(20, &range), None);
        assert_eq!(check(20.5, &range).as_deref(), Some("Maximum value is 20."));
        assert_eq!(check("12", &range), None);
    }

    #[test]
    fn bounds_ignore_custom_error() {
        let r = ValidationRules {
            min: Some(Bound::Number(10.0)),
            custom_error: Some("custom".into()),
            ..rules()
        };
        assert_eq!(check(5, &r).as_deref(), Some("Minimum value is 10."));
    }

    #[test]
    fn non_numeric_value_with_numeric_bound() {
        let r = ValidationRules {
            max: Some(Bound::Number(3.0)),
            ..rules()
        };
        assert_eq!(check("three", &r).as_deref(), Some(messages::NUMBER));
        assert_eq!(check(true, &r).as_deref(), Some(messages::NUMBER));
    }

    #[test]
    fn date_bounds() {
        let r = ValidationRules {
            min: Some(Bound::Date("2020-01-01".into())),
            max: Some(Bound::Date("2020-12-31".into())),
            ..rules()
        };
        assert_eq!(check("2020-06-01", &r), None);
        assert_eq!(
            check("2019-12-31", &r).as_deref(),
            Some("Minimum value is 2020-01-01.")
        );
        assert_eq!(
            check("2021-01-01", &r).as_deref(),
            Some("Maximum value is 2020-12-31.")
        );
        assert_eq!(check("June", &r).as_deref(), Some(messages::DATE));
    }

    #[test]
    fn numeric_text_bound_compares_numbers() {
        let r = ValidationRules {
            min: Some(Bound::Date("18".into())),
            ..rules()
        };
        assert_eq!(check(17, &r).as_deref(), Some("Minimum value is 18."));
        assert_eq!(check(18, &r), None);
    }

    #[test]
    fn garbage_bound_is_skipped() {
        let r = ValidationRules {
            min: Some(Bound::Date("soon".into())),
            ..rules()
        };
        assert_eq!(check(1, &r), None);
    }

    #[test]
    fn text_rules_do_not_apply_to_lists() {
        let r = ValidationRules {
            required: true,
            min_length: Some(5),
            ..rules()
        };
        assert_eq!(check(vec!["a"], &r), None);
    }
}
