use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{Result, ServiceError};

use super::{generate_id, now};

/// A customer record. Payment conditions (skonto/abschlag/rabatt) are plain
/// percentages; whether and how they apply is decided at invoicing time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    #[serde(rename = "vorname", default)]
    pub first_name: String,
    #[serde(rename = "firma", default)]
    pub company: String,
    #[serde(rename = "strasse", default)]
    pub street: String,
    #[serde(rename = "plz", default)]
    pub postal_code: String,
    #[serde(rename = "ort", default)]
    pub city: String,
    #[serde(rename = "telefon", default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "ust_id", default)]
    pub tax_id: String,
    #[serde(rename = "notizen", default)]
    pub notes: String,
    #[serde(rename = "skonto", default)]
    pub cash_discount: f64,
    #[serde(rename = "abschlag", default)]
    pub deduction: f64,
    #[serde(rename = "rabatt", default)]
    pub rebate: f64,
    #[serde(rename = "erstellt_am", default = "now")]
    pub created_at: NaiveDateTime,
}

impl Customer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: generate_id("K"),
            name: name.into(),
            first_name: String::new(),
            company: String::new(),
            street: String::new(),
            postal_code: String::new(),
            city: String::new(),
            phone: String::new(),
            email: String::new(),
            tax_id: String::new(),
            notes: String::new(),
            cash_discount: 0.0,
            deduction: 0.0,
            rebate: 0.0,
            created_at: now(),
        }
    }

    /// Company name when set, otherwise "first_name name".
    pub fn display_name(&self) -> String {
        if !self.company.is_empty() {
            return self.company.clone();
        }
        format!("{} {}", self.first_name, self.name)
            .trim()
            .to_string()
    }

    /// Street line plus "postal_code city" line, skipping empty parts.
    pub fn full_address(&self) -> String {
        let mut lines = Vec::new();
        if !self.street.is_empty() {
            lines.push(self.street.clone());
        }
        if !self.postal_code.is_empty() || !self.city.is_empty() {
            lines.push(format!("{} {}", self.postal_code, self.city).trim().to_string());
        }
        lines.join("\n")
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| ServiceError::malformed("customer", e))
    }
}
