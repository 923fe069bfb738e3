use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{Result, ServiceError};

use super::{default_quantity, default_unit, generate_id, now};

fn default_bill_number() -> String {
    BillOfMaterials::generate_bill_number()
}

/// One material line in a bill of materials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialEntry {
    pub id: String,
    pub material: String,
    #[serde(rename = "menge", default = "default_quantity")]
    pub quantity: f64,
    #[serde(rename = "einheit", default = "default_unit")]
    pub unit: String,
    #[serde(rename = "einzelpreis", default)]
    pub unit_price: f64,
    #[serde(rename = "gesamtpreis", default)]
    pub line_total: f64,
    #[serde(rename = "beschreibung", default)]
    pub description: String,
}

impl MaterialEntry {
    pub fn new(material: impl Into<String>, quantity: f64, unit_price: f64) -> Self {
        let mut entry = Self {
            id: generate_id("SE"),
            material: material.into(),
            quantity,
            unit: default_unit(),
            unit_price,
            line_total: 0.0,
            description: String::new(),
        };
        entry.recalculate();
        entry
    }

    pub fn recalculate(&mut self) {
        self.line_total = self.quantity * self.unit_price;
    }
}

/// A bill of materials (parts list) for one order position; at most one
/// exists per position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillOfMaterials {
    pub id: String,
    #[serde(rename = "auftrag_id")]
    pub order_id: String,
    #[serde(rename = "position_id")]
    pub position_id: String,
    #[serde(rename = "projekt", default)]
    pub project: String,
    #[serde(rename = "kunde_id", default)]
    pub customer_id: String,
    #[serde(rename = "auftragsnummer", default)]
    pub order_number: String,
    #[serde(rename = "notizen", default)]
    pub notes: String,
    #[serde(rename = "stuecklisten_nummer", default = "default_bill_number")]
    pub bill_number: String,
    #[serde(rename = "erstellt_am", default = "now")]
    pub created_at: NaiveDateTime,
    #[serde(rename = "eintraege", default)]
    pub entries: Vec<MaterialEntry>,
}

impl BillOfMaterials {
    pub fn new(order_id: impl Into<String>, position_id: impl Into<String>) -> Self {
        Self {
            id: generate_id("SL"),
            order_id: order_id.into(),
            position_id: position_id.into(),
            project: String::new(),
            customer_id: String::new(),
            order_number: String::new(),
            notes: String::new(),
            bill_number: Self::generate_bill_number(),
            created_at: now(),
            entries: Vec::new(),
        }
    }

    /// Timestamp-derived bill number, `SLYYYYMMDDHHMMSS`.
    fn generate_bill_number() -> String {
        format!("SL{}", chrono::Local::now().format("%Y%m%d%H%M%S"))
    }

    /// Sum of all entry line totals, recomputed on demand.
    pub fn total_amount(&self) -> f64 {
        self.entries.iter().map(|e| e.line_total).sum()
    }

    pub fn add_entry(&mut self, mut entry: MaterialEntry) {
        entry.recalculate();
        self.entries.push(entry);
    }

    pub fn remove_entry(&mut self, entry_id: &str) {
        self.entries.retain(|e| e.id != entry_id);
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let mut bom: BillOfMaterials =
            serde_json::from_value(value).map_err(|e| ServiceError::malformed("bill of materials", e))?;
        for entry in &mut bom.entries {
            entry.recalculate();
        }
        Ok(bom)
    }
}
