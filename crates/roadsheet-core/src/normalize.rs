//! Flat form fields to the nested materials document.

use serde_json::{Map, Value};

use crate::catalog::Category;
use crate::materials::{Header, Materials, Quantity};

/// Coerce a submitted value to a line-item count.
///
/// Absent, empty, unparsable, non-finite and negative inputs all become 0 so
/// a stored count is always a non-negative number.
pub fn coerce_count(value: Option<&Value>) -> f64 {
    let number = match value {
        None | Some(Value::Null) => return 0.0,
        Some(Value::Bool(b)) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse::<f64>().unwrap_or(0.0)
            }
        }
        Some(Value::Array(_)) | Some(Value::Object(_)) => 0.0,
    };

    if number.is_finite() && number > 0.0 {
        number
    } else {
        0.0
    }
}

/// Coerce a submitted value to header text; absent and null become `""`.
pub fn coerce_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Truthiness of a submitted checkbox value
pub fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Build the canonical document from submitted form fields.
///
/// Unknown fields are dropped.
pub fn normalize(form: &Map<String, Value>) -> Materials {
    let mut header = Header::default();
    for field in Header::TEXT_FIELDS {
        header.set_text(field, coerce_text(form.get(field)));
    }
    header.dot_employee = truthy(form.get("dot_employee"));

    let mut materials = Materials {
        header,
        ..Materials::default()
    };

    for category in Category::ALL {
        let items = materials.items_mut(category);
        for key in category.stored_keys() {
            let count = coerce_count(form.get(&category.field_name(key)));
            items.insert((*key).to_string(), Quantity(count));
        }
    }

    materials
}

/// Shallow-merge a freshly normalized document over the stored one.
///
/// Every top-level key of `update` replaces the stored key wholesale;
/// category objects are not merged key-by-key. Stored keys the normalizer
/// does not produce survive. A stored value that is not an object is
/// treated as empty.
pub fn merge_over(previous: &Value, update: &Materials) -> Value {
    let mut merged = match previous {
        Value::Object(fields) => fields.clone(),
        _ => Map::new(),
    };
    for (key, value) in update.to_fields() {
        merged.insert(key, value);
    }
    Value::Object(merged)
}
