//! Reading stored materials documents of any historical shape.

use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::catalog::{lookup_chain, Category, KeyLocation};
use crate::materials::{Header, Materials, Quantity};

static NO_FIELDS: Lazy<Map<String, Value>> = Lazy::new(Map::new);

/// Shape tag of a stored document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Empty,
    Flat,
    Nested,
    Mixed,
}

/// A stored materials document, classified by shape
#[derive(Debug, Clone, PartialEq)]
pub enum StoredMaterials {
    /// Missing or not a JSON object
    Empty,
    /// One top-level key per field (`paint_4_yel_sld: 120`)
    Flat(Map<String, Value>),
    /// Category objects (`paint: { "4_yel_sld": 120 }`) plus header fields
    Nested(Map<String, Value>),
    /// Category objects with leftover flat line items
    Mixed(Map<String, Value>),
}

impl StoredMaterials {
    /// Documents written by the normalizer always carry category objects;
    /// anything without one predates it and reads as `Flat`
    pub fn classify(value: &Value) -> Self {
        let fields = match value {
            Value::Object(fields) if !fields.is_empty() => fields,
            _ => return StoredMaterials::Empty,
        };

        let nested = Category::ALL
            .iter()
            .any(|category| matches!(fields.get(category.key()), Some(Value::Object(_))));
        let flat = fields.keys().any(|key| {
            Category::ALL
                .iter()
                .any(|category| key.starts_with(&format!("{}_", category.key())))
        });

        match (nested, flat) {
            (true, true) => StoredMaterials::Mixed(fields.clone()),
            (true, false) => StoredMaterials::Nested(fields.clone()),
            (false, _) => StoredMaterials::Flat(fields.clone()),
        }
    }

    pub fn shape(&self) -> Shape {
        match self {
            StoredMaterials::Empty => Shape::Empty,
            StoredMaterials::Flat(_) => Shape::Flat,
            StoredMaterials::Nested(_) => Shape::Nested,
            StoredMaterials::Mixed(_) => Shape::Mixed,
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        match self {
            StoredMaterials::Empty => &NO_FIELDS,
            StoredMaterials::Flat(fields)
            | StoredMaterials::Nested(fields)
            | StoredMaterials::Mixed(fields) => fields,
        }
    }

    /// Header text; numbers are stringified, anything else reads as absent
    pub fn text(&self, field: &str) -> Option<String> {
        match self.fields().get(field)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn flag(&self, field: &str) -> bool {
        crate::normalize::truthy(self.fields().get(field))
    }

    fn at(&self, category: Category, location: &KeyLocation) -> Option<f64> {
        let value = match location {
            KeyLocation::Nested(key) => match self.fields().get(category.key())? {
                Value::Object(items) => items.get(key)?,
                _ => return None,
            },
            KeyLocation::Flat(key) => self.fields().get(key)?,
        };
        stored_number(value)
    }

    /// Value printed for a report label, following the lookup chain
    pub fn line_item(&self, category: Category, label: &str) -> Option<f64> {
        lookup_chain(category, label)
            .iter()
            .find_map(|location| self.at(category, location))
    }

    /// Value of a normalizer key, nested first then flat
    pub fn stored_item(&self, category: Category, key: &str) -> Option<f64> {
        self.at(category, &KeyLocation::Nested(key.to_string()))
            .or_else(|| self.at(category, &KeyLocation::Flat(category.field_name(key))))
    }

    /// Convert any shape into the canonical document.
    ///
    /// Known keys are always present; extra numeric items found under a
    /// category (nested or flat) are carried over rather than dropped.
    pub fn upgrade(&self) -> Materials {
        let mut header = Header::default();
        for field in Header::TEXT_FIELDS {
            if let Some(text) = self.text(field) {
                header.set_text(field, text);
            }
        }
        header.dot_employee = self.flag("dot_employee");

        let mut materials = Materials {
            header,
            ..Materials::default()
        };

        for category in Category::ALL {
            let mut items = std::mem::take(materials.items_mut(category));
            for key in category.stored_keys() {
                let count = self.stored_item(category, key).unwrap_or(0.0);
                items.insert((*key).to_string(), Quantity(count.max(0.0)));
            }

            if let Some(Value::Object(nested)) = self.fields().get(category.key()) {
                for (key, value) in nested {
                    if let Some(count) = stored_number(value) {
                        items
                            .entry(key.clone())
                            .or_insert(Quantity(count.max(0.0)));
                    }
                }
            }

            let prefix = format!("{}_", category.key());
            for (key, value) in self.fields() {
                if let (Some(item), Some(count)) = (key.strip_prefix(&prefix), stored_number(value))
                {
                    items
                        .entry(item.to_string())
                        .or_insert(Quantity(count.max(0.0)));
                }
            }

            *materials.items_mut(category) = items;
        }

        materials
    }
}

fn stored_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}
