//! Schema - Define type schemas for resources
//!
//! Providers define schemas for each resource type, enabling type validation
//! before any request is built. Attribute declaration order is significant:
//! it is the order in which the differ emits operations.

use std::collections::HashMap;
use std::fmt;

use crate::resource::Value;

/// Attribute type
#[derive(Debug, Clone)]
pub enum AttributeType {
    /// String
    String,
    /// Integer
    Int,
    /// Boolean
    Bool,
    /// Enum (list of allowed values)
    Enum(Vec<String>),
    /// Configuration API formatted duration (e.g., "10 s", "500 ms")
    Duration,
    /// Custom type (with validation function)
    Custom {
        name: String,
        base: Box<AttributeType>,
        validate: fn(&Value) -> Result<(), String>,
    },
    /// Ordered list
    List(Box<AttributeType>),
    /// Unordered set
    Set(Box<AttributeType>),
}

impl AttributeType {
    /// Check if a value conforms to this type
    pub fn validate(&self, value: &Value) -> Result<(), TypeError> {
        match (self, value) {
            (AttributeType::String, Value::String(_)) => Ok(()),
            (AttributeType::Int, Value::Int(_)) => Ok(()),
            (AttributeType::Bool, Value::Bool(_)) => Ok(()),

            (AttributeType::Enum(variants), Value::String(s)) => {
                if variants.iter().any(|v| v == s) {
                    Ok(())
                } else {
                    Err(TypeError::InvalidEnumVariant {
                        value: s.clone(),
                        expected: variants.clone(),
                    })
                }
            }

            (AttributeType::Duration, Value::String(s)) => match duration_millis(s) {
                Some(_) => Ok(()),
                None => Err(TypeError::InvalidDuration { value: s.clone() }),
            },

            (AttributeType::Custom { validate, .. }, v) => {
                validate(v).map_err(|msg| TypeError::ValidationFailed { message: msg })
            }

            (AttributeType::List(inner) | AttributeType::Set(inner), Value::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    inner.validate(item).map_err(|e| TypeError::ListItemError {
                        index: i,
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            _ => Err(TypeError::TypeMismatch {
                expected: self.type_name(),
                got: value.type_name(),
            }),
        }
    }

    /// Compare two values the way the Configuration API does
    ///
    /// Durations compare by their millisecond value, sets ignore order.
    pub fn semantically_equal(&self, a: &Value, b: &Value) -> bool {
        match (self, a, b) {
            (AttributeType::Duration, Value::String(x), Value::String(y)) => {
                match (duration_millis(x), duration_millis(y)) {
                    (Some(x), Some(y)) => x == y,
                    _ => x == y,
                }
            }
            (AttributeType::Custom { base, .. }, _, _) => base.semantically_equal(a, b),
            (AttributeType::Set(inner), Value::List(xs), Value::List(ys)) => {
                xs.iter()
                    .all(|x| ys.iter().any(|y| inner.semantically_equal(x, y)))
                    && ys
                        .iter()
                        .all(|y| xs.iter().any(|x| inner.semantically_equal(x, y)))
            }
            (AttributeType::List(inner), Value::List(xs), Value::List(ys)) => {
                xs.len() == ys.len()
                    && xs
                        .iter()
                        .zip(ys)
                        .all(|(x, y)| inner.semantically_equal(x, y))
            }
            _ => a == b,
        }
    }

    /// Whether the server may echo this value back in a different spelling
    pub fn is_format_normalized(&self) -> bool {
        match self {
            AttributeType::Duration => true,
            AttributeType::Custom { base, .. } => base.is_format_normalized(),
            _ => false,
        }
    }

    fn type_name(&self) -> String {
        match self {
            AttributeType::String => "String".to_string(),
            AttributeType::Int => "Int".to_string(),
            AttributeType::Bool => "Bool".to_string(),
            AttributeType::Enum(variants) => format!("Enum({})", variants.join(" | ")),
            AttributeType::Duration => "Duration".to_string(),
            AttributeType::Custom { name, .. } => name.clone(),
            AttributeType::List(inner) => format!("List<{}>", inner.type_name()),
            AttributeType::Set(inner) => format!("Set<{}>", inner.type_name()),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Type error
#[derive(Debug, Clone, thiserror::Error)]
pub enum TypeError {
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Invalid enum variant '{value}', expected one of: {}", expected.join(", "))]
    InvalidEnumVariant {
        value: String,
        expected: Vec<String>,
    },

    #[error("Invalid duration '{value}', expected a number followed by a unit (e.g., \"10 s\")")]
    InvalidDuration { value: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Required attribute '{name}' is missing")]
    MissingRequired { name: String },

    #[error("Unknown attribute '{name}'")]
    UnknownAttribute { name: String },

    #[error("Attribute '{name}' is read-only and cannot be set")]
    ReadOnlyAttribute { name: String },

    #[error("Attribute '{name}': {inner}")]
    InvalidAttribute { name: String, inner: Box<TypeError> },

    #[error("List item at index {index}: {inner}")]
    ListItemError { index: usize, inner: Box<TypeError> },
}

/// Attribute schema
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: String,
    pub attr_type: AttributeType,
    pub required: bool,
    /// Optional attribute the server fills in when left unset
    pub computed: bool,
    /// Never read back from the server
    pub sensitive: bool,
    /// Set only by the provider (bookkeeping)
    pub read_only: bool,
    /// Changing this attribute means delete and create
    pub requires_replace: bool,
    pub default: Option<Value>,
    pub description: Option<String>,
    /// Provider-side property name (e.g., "awsRegionName")
    pub provider_name: Option<String>,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            required: false,
            computed: false,
            sensitive: false,
            read_only: false,
            requires_replace: false,
            default: None,
            description: None,
            provider_name: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn requires_replace(mut self) -> Self {
        self.requires_replace = true;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn with_provider_name(mut self, name: impl Into<String>) -> Self {
        self.provider_name = Some(name.into());
        self
    }
}

/// Resource schema
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub resource_type: String,
    attributes: Vec<AttributeSchema>,
    pub description: Option<String>,
}

impl ResourceSchema {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: Vec::new(),
            description: None,
        }
    }

    /// Add an attribute, replacing an earlier declaration with the same name
    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        if let Some(existing) = self.attributes.iter_mut().find(|a| a.name == schema.name) {
            *existing = schema;
        } else {
            self.attributes.push(schema);
        }
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Attributes in declaration order
    pub fn attributes(&self) -> impl Iterator<Item = &AttributeSchema> {
        self.attributes.iter()
    }

    pub fn get(&self, name: &str) -> Option<&AttributeSchema> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Fill in declared defaults for attributes the user left unset
    pub fn apply_defaults(&self, attributes: &mut HashMap<String, Value>) {
        for schema in &self.attributes {
            if let Some(default) = &schema.default {
                let unset = attributes
                    .get(&schema.name)
                    .is_none_or(|v| v.is_empty_string());
                if unset {
                    attributes.insert(schema.name.clone(), default.clone());
                }
            }
        }
    }

    /// Validate resource attributes
    ///
    /// Empty strings are treated as unset.
    pub fn validate(&self, attributes: &HashMap<String, Value>) -> Result<(), Vec<TypeError>> {
        let mut errors = Vec::new();

        for schema in &self.attributes {
            let missing = attributes
                .get(&schema.name)
                .is_none_or(|v| v.is_empty_string());
            if schema.required && missing && schema.default.is_none() {
                errors.push(TypeError::MissingRequired {
                    name: schema.name.clone(),
                });
            }
        }

        let mut names: Vec<&String> = attributes.keys().collect();
        names.sort();

        for name in names {
            let value = &attributes[name];
            if value.is_empty_string() {
                continue;
            }
            match self.get(name) {
                None => errors.push(TypeError::UnknownAttribute { name: name.clone() }),
                Some(schema) if schema.read_only => {
                    errors.push(TypeError::ReadOnlyAttribute { name: name.clone() })
                }
                Some(schema) => {
                    if let Err(e) = schema.attr_type.validate(value) {
                        errors.push(TypeError::InvalidAttribute {
                            name: name.clone(),
                            inner: Box::new(e),
                        });
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Helper functions for common types
pub mod types {
    use super::*;

    /// TCP/UDP port number
    pub fn port() -> AttributeType {
        AttributeType::Custom {
            name: "Port".to_string(),
            base: Box::new(AttributeType::Int),
            validate: |value| {
                if let Value::Int(n) = value {
                    if (1..=65535).contains(n) {
                        Ok(())
                    } else {
                        Err(format!("Port {} is out of range 1-65535", n))
                    }
                } else {
                    Err("Expected integer".to_string())
                }
            },
        }
    }

    /// Set of strings
    pub fn string_set() -> AttributeType {
        AttributeType::Set(Box::new(AttributeType::String))
    }

    pub fn enumeration(values: &[&str]) -> AttributeType {
        AttributeType::Enum(values.iter().map(|v| v.to_string()).collect())
    }
}

/// Convert a Configuration API duration (e.g., "10 s", "1.5 h") to milliseconds
pub fn duration_millis(s: &str) -> Option<u64> {
    let s = s.trim();
    let split = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    let (number, unit) = s.split_at(split);
    if number.is_empty() {
        return None;
    }
    let number: f64 = number.parse().ok()?;

    let factor: f64 = match unit.trim() {
        "ms" | "millisecond" | "milliseconds" => 1.0,
        "s" | "sec" | "second" | "seconds" => 1_000.0,
        "m" | "min" | "minute" | "minutes" => 60_000.0,
        "h" | "hr" | "hour" | "hours" => 3_600_000.0,
        "d" | "day" | "days" => 86_400_000.0,
        "w" | "week" | "weeks" => 604_800_000.0,
        _ => return None,
    };

    let millis = number * factor;
    if millis.is_finite() && millis >= 0.0 {
        Some(millis.round() as u64)
    } else {
        None
    }
}
