//! Validation rules for [`PropertyValidator`](crate::views::PropertyValidator).

use crate::error::{PropertyError, Result};
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;

/// A rule a value must satisfy before it may be written.
pub trait Validator: Send + Sync {
    fn is_valid(&self, value: &Value) -> bool;
}

/// JSON value kinds a [`TypeValidator`] can require.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    /// Signed or unsigned integer.
    Integer,
    /// Floating point number (not integer-valued in JSON representation).
    Float,
    /// Any number.
    Number,
    String,
    Array,
    Object,
}

impl ValueKind {
    pub fn matches(self, value: &Value) -> bool {
        match self {
            ValueKind::Null => value.is_null(),
            ValueKind::Bool => value.is_boolean(),
            ValueKind::Integer => value.is_i64() || value.is_u64(),
            ValueKind::Float => value.is_f64(),
            ValueKind::Number => value.is_number(),
            ValueKind::String => value.is_string(),
            ValueKind::Array => value.is_array(),
            ValueKind::Object => value.is_object(),
        }
    }
}

/// Accepts values of one JSON kind.
#[derive(Clone, Copy, Debug)]
pub struct TypeValidator {
    kind: ValueKind,
}

impl TypeValidator {
    pub fn new(kind: ValueKind) -> Self {
        Self { kind }
    }

    pub fn integer() -> Self {
        Self::new(ValueKind::Integer)
    }

    pub fn float() -> Self {
        Self::new(ValueKind::Float)
    }

    pub fn number() -> Self {
        Self::new(ValueKind::Number)
    }

    pub fn string() -> Self {
        Self::new(ValueKind::String)
    }

    pub fn boolean() -> Self {
        Self::new(ValueKind::Bool)
    }
}

impl Validator for TypeValidator {
    fn is_valid(&self, value: &Value) -> bool {
        self.kind.matches(value)
    }
}

/// Accepts strings whose whole text matches a pattern.
#[derive(Clone, Debug)]
pub struct RegexValidator {
    regex: Regex,
}

impl RegexValidator {
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            regex: Regex::new(&format!("^(?:{pattern})$"))?,
        })
    }
}

impl Validator for RegexValidator {
    fn is_valid(&self, value: &Value) -> bool {
        value.as_str().is_some_and(|s| self.regex.is_match(s))
    }
}

/// Accepts numbers within an inclusive range.
#[derive(Clone, Copy, Debug)]
pub struct RangeValidator {
    min: f64,
    max: f64,
}

impl RangeValidator {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

impl Validator for RangeValidator {
    fn is_valid(&self, value: &Value) -> bool {
        value
            .as_f64()
            .is_some_and(|n| n >= self.min && n <= self.max)
    }
}

/// Accepts values for which a closure returns true.
pub struct LambdaValidator<F> {
    check: F,
}

impl<F> LambdaValidator<F>
where
    F: Fn(&Value) -> bool + Send + Sync,
{
    pub fn new(check: F) -> Self {
        Self { check }
    }
}

impl<F> Validator for LambdaValidator<F>
where
    F: Fn(&Value) -> bool + Send + Sync,
{
    fn is_valid(&self, value: &Value) -> bool {
        (self.check)(value)
    }
}

/// Accepts values that pass any of its rules.
#[derive(Clone, Default)]
pub struct OrValidator {
    rules: Vec<Arc<dyn Validator>>,
}

impl OrValidator {
    pub fn new(rules: Vec<Arc<dyn Validator>>) -> Self {
        Self { rules }
    }

    pub fn or(mut self, rule: impl Validator + 'static) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }
}

impl Validator for OrValidator {
    fn is_valid(&self, value: &Value) -> bool {
        self.rules.iter().any(|rule| rule.is_valid(value))
    }
}

/// Look up a type rule by name, for rules named in configuration.
pub fn by_name(name: &str) -> Result<Arc<dyn Validator>> {
    let kind = match name {
        "integer" | "int" => ValueKind::Integer,
        "float" => ValueKind::Float,
        "number" | "num" => ValueKind::Number,
        "string" | "str" => ValueKind::String,
        "boolean" | "bool" => ValueKind::Bool,
        other => return Err(PropertyError::UnknownValidator(other.to_string())),
    };
    Ok(Arc::new(TypeValidator::new(kind)))
}
