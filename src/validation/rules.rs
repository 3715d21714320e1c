use email_address::EmailAddress;
use time::macros::format_description;
use time::Date;
use tracing::warn;

use super::value::RawValue;

/// A single parsed rule token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule<'r> {
    Required,
    Email,
    Numeric,
    /// Minimum string length in characters. `None` when the argument is not a number.
    Min(Option<usize>),
    In(Vec<&'r str>),
    Date,
    Array,
    Boolean,
    Unknown(&'r str),
}

impl<'r> Rule<'r> {
    pub fn parse(token: &'r str) -> Self {
        let (name, arg) = match token.split_once(':') {
            Some((name, arg)) => (name, Some(arg)),
            None => (token, None),
        };

        match name {
            "required" => Rule::Required,
            "email" => Rule::Email,
            "numeric" => Rule::Numeric,
            "min" => Rule::Min(arg.and_then(|arg| arg.trim().parse().ok())),
            "in" => Rule::In(arg.map(|arg| arg.split(',').collect()).unwrap_or_default()),
            "date" => Rule::Date,
            "array" => Rule::Array,
            "boolean" => Rule::Boolean,
            _ => Rule::Unknown(token),
        }
    }

    pub fn passes(&self, value: &RawValue<'_>) -> bool {
        match self {
            Rule::Required => match value {
                RawValue::Absent | RawValue::Null => false,
                RawValue::String(s) => !s.is_empty(),
                RawValue::Array(items) => !items.is_empty(),
                RawValue::Bool(_) | RawValue::Number(_) | RawValue::Object(_) => true,
            },
            Rule::Email => value.as_str().is_some_and(EmailAddress::is_valid),
            Rule::Numeric => matches!(value, RawValue::Number(_)),
            Rule::Min(min) => match (min, value.as_str()) {
                (Some(min), Some(s)) => s.chars().count() >= *min,
                _ => false,
            },
            Rule::In(options) => value
                .as_str()
                .is_some_and(|s| options.iter().any(|option| *option == s)),
            Rule::Date => value
                .as_str()
                .is_some_and(|s| Date::parse(s, format_description!("[year]-[month]-[day]")).is_ok()),
            Rule::Array => matches!(value, RawValue::Array(_)),
            Rule::Boolean => matches!(value, RawValue::Bool(_)),
            Rule::Unknown(token) => {
                warn!(rule = %token, "Unknown validation rule, treating as passed");
                true
            }
        }
    }
}

/// Evaluate every rule in `rules` against `value`, stopping at the first
/// failure. The failing rule token (e.g. `min:6`) is returned as the error.
pub fn evaluate<'r>(value: &RawValue<'_>, rules: &'r str) -> Result<(), &'r str> {
    for token in rules.split('|').filter(|token| !token.is_empty()) {
        if !Rule::parse(token).passes(value) {
            return Err(token);
        }
    }
    Ok(())
}
