use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::catalog::Category;

/// A non-negative line-item count.
///
/// Integral counts serialize as JSON integers so stored documents read
/// `"4_yel_sld": 120` rather than `120.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Deserialize)]
#[serde(transparent)]
pub struct Quantity(pub f64);

impl Quantity {
    pub const ZERO: Quantity = Quantity(0.0);

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn to_json(&self) -> Value {
        if self.0.fract() == 0.0 && self.0.abs() < 1e15 {
            Value::Number(Number::from(self.0 as i64))
        } else {
            Number::from_f64(self.0)
                .map(Value::Number)
                .unwrap_or_else(|| Value::Number(Number::from(0)))
        }
    }

    /// Text used on the printed report
    pub fn display(&self) -> String {
        if self.0.fract() == 0.0 && self.0.abs() < 1e15 {
            format!("{}", self.0 as i64)
        } else {
            format!("{}", self.0)
        }
    }
}

impl Serialize for Quantity {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.fract() == 0.0 && self.0.abs() < 1e15 {
            serializer.serialize_i64(self.0 as i64)
        } else {
            serializer.serialize_f64(self.0)
        }
    }
}

impl From<f64> for Quantity {
    fn from(value: f64) -> Self {
        Quantity(value)
    }
}

pub type LineItems = BTreeMap<String, Quantity>;

/// Job metadata and invoice fields stored at the top level of the document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
    #[serde(default)]
    pub road_name: String,
    #[serde(default)]
    pub contract_number: String,
    #[serde(default)]
    pub contractor: String,
    #[serde(default)]
    pub workers: String,
    #[serde(default)]
    pub dot_employee: bool,
    #[serde(default)]
    pub dot_employee_name: String,
    #[serde(default)]
    pub dot_employee_email: String,
    #[serde(default)]
    pub invoice_number: String,
    #[serde(default)]
    pub fed_payroll: String,
    #[serde(default)]
    pub job_totals: String,
    #[serde(default)]
    pub daily_minimum: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub job_time_arrived: String,
    #[serde(default)]
    pub job_time_finished: String,
}

impl Header {
    /// Names of the free-text header fields
    pub const TEXT_FIELDS: [&'static str; 13] = [
        "road_name",
        "contract_number",
        "contractor",
        "workers",
        "dot_employee_name",
        "dot_employee_email",
        "invoice_number",
        "fed_payroll",
        "job_totals",
        "daily_minimum",
        "location",
        "job_time_arrived",
        "job_time_finished",
    ];

    pub const FLAG_FIELDS: [&'static str; 1] = ["dot_employee"];

    pub fn text(&self, field: &str) -> Option<&str> {
        let value = match field {
            "road_name" => &self.road_name,
            "contract_number" => &self.contract_number,
            "contractor" => &self.contractor,
            "workers" => &self.workers,
            "dot_employee_name" => &self.dot_employee_name,
            "dot_employee_email" => &self.dot_employee_email,
            "invoice_number" => &self.invoice_number,
            "fed_payroll" => &self.fed_payroll,
            "job_totals" => &self.job_totals,
            "daily_minimum" => &self.daily_minimum,
            "location" => &self.location,
            "job_time_arrived" => &self.job_time_arrived,
            "job_time_finished" => &self.job_time_finished,
            _ => return None,
        };
        Some(value.as_str())
    }

    pub fn set_text(&mut self, field: &str, value: String) -> bool {
        let slot = match field {
            "road_name" => &mut self.road_name,
            "contract_number" => &mut self.contract_number,
            "contractor" => &mut self.contractor,
            "workers" => &mut self.workers,
            "dot_employee_name" => &mut self.dot_employee_name,
            "dot_employee_email" => &mut self.dot_employee_email,
            "invoice_number" => &mut self.invoice_number,
            "fed_payroll" => &mut self.fed_payroll,
            "job_totals" => &mut self.job_totals,
            "daily_minimum" => &mut self.daily_minimum,
            "location" => &mut self.location,
            "job_time_arrived" => &mut self.job_time_arrived,
            "job_time_finished" => &mut self.job_time_finished,
            _ => return false,
        };
        *slot = value;
        true
    }
}

/// The canonical nested materials document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Materials {
    #[serde(flatten)]
    pub header: Header,
    #[serde(default)]
    pub paint: LineItems,
    #[serde(default)]
    pub thermo: LineItems,
    #[serde(default)]
    pub rpm: LineItems,
    #[serde(default)]
    pub grinding: LineItems,
}

impl Materials {
    pub fn items(&self, category: Category) -> &LineItems {
        match category {
            Category::Paint => &self.paint,
            Category::Thermo => &self.thermo,
            Category::Rpm => &self.rpm,
            Category::Grinding => &self.grinding,
        }
    }

    pub fn items_mut(&mut self, category: Category) -> &mut LineItems {
        match category {
            Category::Paint => &mut self.paint,
            Category::Thermo => &mut self.thermo,
            Category::Rpm => &mut self.rpm,
            Category::Grinding => &mut self.grinding,
        }
    }

    pub fn get(&self, category: Category, key: &str) -> Option<f64> {
        self.items(category).get(key).map(Quantity::value)
    }

    /// Top-level JSON fields of the stored shape
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        for name in Header::TEXT_FIELDS {
            if let Some(text) = self.header.text(name) {
                fields.insert(name.to_string(), Value::String(text.to_string()));
            }
        }
        fields.insert(
            "dot_employee".to_string(),
            Value::Bool(self.header.dot_employee),
        );
        for category in Category::ALL {
            let items: Map<String, Value> = self
                .items(category)
                .iter()
                .map(|(key, quantity)| (key.clone(), quantity.to_json()))
                .collect();
            fields.insert(category.key().to_string(), Value::Object(items));
        }
        fields
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.to_fields())
    }
}
