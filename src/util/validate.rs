//! Structural checks for JSON responses.
//!
//! The parser runs a short list of [`ValidationRule`]s against a raw response
//! before mapping it, so a shape mismatch is reported with every offending
//! field instead of the first serde complaint.

use serde_json::Value;
use std::fmt;

use crate::error::{Error, Result};

/// JSON type a field is expected to have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
    Array,
    Object,
}

impl FieldType {
    fn matches(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Array => value.is_array(),
            FieldType::Object => value.is_object(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Array => "array",
            FieldType::Object => "object",
        };
        f.write_str(name)
    }
}

/// Expectation for one field, addressed with a dot-separated path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRule {
    pub field: String,
    pub field_type: FieldType,
    pub required: bool,
}

impl ValidationRule {
    pub fn required(field: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            field: field.into(),
            field_type,
            required: true,
        }
    }

    pub fn optional(field: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            field: field.into(),
            field_type,
            required: false,
        }
    }
}

/// Outcome of [`validate_response`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Converts a failed report into a parse error naming `context`.
    pub fn into_result(self, context: &str) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(Error::parse(format!(
                "Invalid {} response: {}",
                context,
                self.errors.join("; ")
            )))
        }
    }
}

/// Checks every rule against `response` and collects all violations.
///
/// `null` counts as missing. Optional fields are only type-checked when present.
///
/// # Examples
///
/// ```rust
/// use goctruyen::util::{FieldType, ValidationRule, validate_response};
/// use serde_json::json;
///
/// let body = json!({ "result": { "data": "not-a-list" } });
/// let report = validate_response(&body, &[
///     ValidationRule::required("result", FieldType::Object),
///     ValidationRule::required("result.data", FieldType::Array),
/// ]);
///
/// assert!(!report.is_valid());
/// assert_eq!(report.errors, vec!["Field 'result.data' should be of type array"]);
/// ```
pub fn validate_response(response: &Value, rules: &[ValidationRule]) -> ValidationReport {
    let mut errors = Vec::new();

    for rule in rules {
        let value = rule
            .field
            .split('.')
            .try_fold(response, |current, key| current.get(key))
            .filter(|value| !value.is_null());

        match value {
            None if rule.required => {
                errors.push(format!("Required field '{}' is missing", rule.field));
            }
            Some(value) if !rule.field_type.matches(value) => {
                errors.push(format!(
                    "Field '{}' should be of type {}",
                    rule.field, rule.field_type
                ));
            }
            _ => {}
        }
    }

    ValidationReport { errors }
}
