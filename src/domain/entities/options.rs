//! Command options and conversion of raw interaction arguments

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::application::errors::CommandError;
use super::interaction::UserId;

/// Declared type of a command option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OptionKind {
    Integer,
    User,
}

impl OptionKind {
    /// Numeric option type used in the platform's command manifest
    pub fn manifest_type(&self) -> u8 {
        match self {
            OptionKind::Integer => 4,
            OptionKind::User => 6,
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            OptionKind::Integer => "an integer",
            OptionKind::User => "a user",
        }
    }
}

/// One option a command accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSpec {
    pub name: String,
    pub description: String,
    pub kind: OptionKind,
    pub required: bool,
}

impl OptionSpec {
    pub fn required(name: impl Into<String>, kind: OptionKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, kind: OptionKind, description: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }
}

/// A converted argument value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Integer(i64),
    User(UserId),
}

/// Arguments after conversion against a command's option specs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandArgs {
    values: BTreeMap<String, ArgValue>,
}

impl CommandArgs {
    /// Convert raw arguments. The error text is safe to show to the caller.
    pub fn convert(specs: &[OptionSpec], raw: &serde_json::Map<String, Value>) -> Result<Self, String> {
        if let Some(unknown) = raw.keys().find(|k| !specs.iter().any(|s| &s.name == *k)) {
            return Err(format!("Unknown option `{}`.", unknown));
        }

        let mut values = BTreeMap::new();
        for spec in specs {
            match raw.get(&spec.name) {
                None | Some(Value::Null) => {
                    if spec.required {
                        return Err(format!("Missing required option `{}`.", spec.name));
                    }
                }
                Some(value) => {
                    let converted = convert_value(spec.kind, value).ok_or_else(|| {
                        format!("Option `{}` expects {}.", spec.name, spec.kind.describe())
                    })?;
                    values.insert(spec.name.clone(), converted);
                }
            }
        }

        Ok(Self { values })
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(ArgValue::Integer(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn user(&self, name: &str) -> Option<UserId> {
        match self.values.get(name) {
            Some(ArgValue::User(id)) => Some(*id),
            _ => None,
        }
    }

    pub fn require_integer(&self, name: &str) -> Result<i64, CommandError> {
        self.integer(name)
            .ok_or_else(|| CommandError::InvalidArgs(format!("Missing required option `{}`.", name)))
    }

    pub fn require_user(&self, name: &str) -> Result<UserId, CommandError> {
        self.user(name)
            .ok_or_else(|| CommandError::InvalidArgs(format!("Missing required option `{}`.", name)))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn convert_value(kind: OptionKind, value: &Value) -> Option<ArgValue> {
    match (kind, value) {
        (OptionKind::Integer, Value::Number(n)) => n.as_i64().map(ArgValue::Integer),
        (OptionKind::Integer, Value::String(s)) => s.trim().parse().ok().map(ArgValue::Integer),
        // Snowflakes arrive as strings on the wire
        (OptionKind::User, Value::String(s)) => s.trim().parse().ok().map(ArgValue::User),
        (OptionKind::User, Value::Number(n)) => n.as_u64().map(ArgValue::User),
        _ => None,
    }
}
