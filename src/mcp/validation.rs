//! Tool argument validation driven by the tool's input schema
//!
//! Supported schema keys: `type`, `properties`, `required`, `default`,
//! `minimum`, `maximum`, `maxLength`, `maxItems` and `items.type`. Properties
//! the schema does not declare are dropped. Failures carry a user-facing
//! Czech message and are reported as tool results, not protocol errors.

use serde_json::{Map, Value};
use thiserror::Error;

/// A rejected argument, with the message shown to the caller
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    fn non_empty_string(name: &str) -> Self {
        Self(format!("Parametr '{}' musí být neprázdný řetězec.", name))
    }

    fn string(name: &str) -> Self {
        Self(format!("Parametr '{}' musí být řetězec.", name))
    }

    fn too_long(name: &str, max: u64) -> Self {
        Self(format!("Parametr '{}' může mít nejvýše {} znaků.", name, max))
    }

    fn boolean(name: &str) -> Self {
        Self(format!("Parametr '{}' musí být logická hodnota (true/false).", name))
    }

    fn array(name: &str) -> Self {
        Self(format!("Parametr '{}' musí být pole.", name))
    }

    fn too_many_items(name: &str, max: u64) -> Self {
        Self(format!("Parametr '{}' může obsahovat nejvýše {} položek.", name, max))
    }

    fn item_type(name: &str) -> Self {
        Self(format!("Parametr '{}' smí obsahovat pouze řetězce.", name))
    }
}

/// Validate and coerce `arguments` against an object schema.
///
/// Returns the cleaned argument object: strings trimmed, empty optional
/// strings removed, numbers rounded and clamped, defaults filled in.
pub fn validate_arguments(schema: &Value, arguments: &Value) -> Result<Map<String, Value>, ValidationError> {
    let Some(input) = arguments.as_object() else {
        return Err(ValidationError("Parametr 'arguments' musí být objekt.".into()));
    };

    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|r| r.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let mut output = Map::new();
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Ok(output);
    };

    for (name, property) in properties {
        let is_required = required.contains(&name.as_str());
        let value = input.get(name).filter(|v| !v.is_null());

        let coerced = match property.get("type").and_then(Value::as_str) {
            Some("string") => coerce_string(name, property, value, is_required)?,
            Some("number") | Some("integer") => coerce_number(property, value),
            Some("boolean") => coerce_boolean(name, property, value)?,
            Some("array") => coerce_array(name, property, value, is_required)?,
            _ => value.cloned(),
        };

        if let Some(coerced) = coerced {
            output.insert(name.clone(), coerced);
        }
    }

    Ok(output)
}

fn coerce_string(
    name: &str,
    property: &Value,
    value: Option<&Value>,
    required: bool,
) -> Result<Option<Value>, ValidationError> {
    let text = match value {
        None if required => return Err(ValidationError::non_empty_string(name)),
        None => return Ok(None),
        Some(Value::String(s)) => s.trim(),
        Some(_) if required => return Err(ValidationError::non_empty_string(name)),
        Some(_) => return Err(ValidationError::string(name)),
    };

    if text.is_empty() {
        return if required {
            Err(ValidationError::non_empty_string(name))
        } else {
            Ok(None)
        };
    }

    if let Some(max) = property.get("maxLength").and_then(Value::as_u64) {
        if text.chars().count() as u64 > max {
            return Err(ValidationError::too_long(name, max));
        }
    }

    Ok(Some(Value::String(text.to_string())))
}

/// Numbers never fail: unusable input falls back to the default
fn coerce_number(property: &Value, value: Option<&Value>) -> Option<Value> {
    let default = property.get("default").and_then(Value::as_f64);
    let number = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
    .or(default)?;

    let mut number = number.round();
    if let Some(min) = property.get("minimum").and_then(Value::as_f64) {
        number = number.max(min);
    }
    if let Some(max) = property.get("maximum").and_then(Value::as_f64) {
        number = number.min(max);
    }

    Some(Value::from(number as i64))
}

fn coerce_boolean(
    name: &str,
    property: &Value,
    value: Option<&Value>,
) -> Result<Option<Value>, ValidationError> {
    match value {
        Some(Value::Bool(b)) => Ok(Some(Value::Bool(*b))),
        Some(_) => Err(ValidationError::boolean(name)),
        None => Ok(property.get("default").filter(|d| d.is_boolean()).cloned()),
    }
}

fn coerce_array(
    name: &str,
    property: &Value,
    value: Option<&Value>,
    required: bool,
) -> Result<Option<Value>, ValidationError> {
    let items = match value {
        None if required => return Err(ValidationError::array(name)),
        None => return Ok(None),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(ValidationError::array(name)),
    };

    if let Some(max) = property.get("maxItems").and_then(Value::as_u64) {
        if items.len() as u64 > max {
            return Err(ValidationError::too_many_items(name, max));
        }
    }

    let item_type = property
        .get("items")
        .and_then(|i| i.get("type"))
        .and_then(Value::as_str);
    if item_type == Some("string") && !items.iter().all(Value::is_string) {
        return Err(ValidationError::item_type(name));
    }

    Ok(Some(Value::Array(items.clone())))
}
