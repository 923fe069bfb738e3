use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{Result, ServiceError};

use super::{default_quantity, default_tax_rate, default_unit, generate_id, now};

/// Workflow status a position must reach before its order can be invoiced.
pub const POSITION_STATUS_READY: &str = "Rechnung";

fn default_position_status() -> String {
    "zur Freigabe".to_string()
}

fn default_order_status() -> String {
    "Angebot".to_string()
}

/// One line item of an order. `line_total` is derived and kept current by
/// [`Position::recalculate`]; it is recomputed rather than trusted whenever
/// the record comes from disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: String,
    #[serde(rename = "bezeichnung")]
    pub label: String,
    #[serde(rename = "menge", default = "default_quantity")]
    pub quantity: f64,
    #[serde(rename = "einheit", default = "default_unit")]
    pub unit: String,
    #[serde(rename = "einzelpreis", default)]
    pub unit_price: f64,
    #[serde(rename = "gesamtpreis", default)]
    pub line_total: f64,
    #[serde(default = "default_position_status")]
    pub status: String,
}

impl Position {
    pub fn new(label: impl Into<String>, quantity: f64, unit_price: f64) -> Self {
        let mut position = Self {
            id: generate_id("POS"),
            label: label.into(),
            quantity,
            unit: default_unit(),
            unit_price,
            line_total: 0.0,
            status: default_position_status(),
        };
        position.recalculate();
        position
    }

    pub fn recalculate(&mut self) {
        self.line_total = self.quantity * self.unit_price;
    }

    pub fn is_ready_to_invoice(&self) -> bool {
        self.status == POSITION_STATUS_READY
    }
}

/// An order with its positions. The human-facing `number` uses the
/// `YYYY-NNNN` format and is distinct from the internal `id`.
///
/// Totals (`net_total`, `tax_amount`, `grand_total`) are a pure function of
/// the positions and the tax rate. Every structural mutation goes through
/// [`Order::recalculate`], and deserialization recomputes them as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    #[serde(rename = "kunde_id")]
    pub customer_id: String,
    #[serde(rename = "auftragsnummer", default)]
    pub number: String,
    #[serde(rename = "bezeichnung")]
    pub title: String,
    #[serde(rename = "beschreibung", default)]
    pub description: String,
    #[serde(rename = "erstellt_am", default = "now")]
    pub created_at: NaiveDateTime,
    #[serde(rename = "faellig_am", default)]
    pub due_at: Option<NaiveDateTime>,
    #[serde(default = "default_order_status")]
    pub status: String,
    #[serde(rename = "positionen", default)]
    pub positions: Vec<Position>,
    #[serde(rename = "gesamtpreis", default)]
    pub net_total: f64,
    #[serde(rename = "mwst_satz", default = "default_tax_rate")]
    pub tax_rate: f64,
    #[serde(rename = "mwst_betrag", default)]
    pub tax_amount: f64,
    #[serde(rename = "endpreis", default)]
    pub grand_total: f64,
    #[serde(rename = "notizen", default)]
    pub notes: String,
}

impl Order {
    pub fn new(customer_id: impl Into<String>, title: impl Into<String>) -> Self {
        let mut order = Self {
            id: generate_id("A"),
            customer_id: customer_id.into(),
            number: String::new(),
            title: title.into(),
            description: String::new(),
            created_at: now(),
            due_at: None,
            status: default_order_status(),
            positions: Vec::new(),
            net_total: 0.0,
            tax_rate: default_tax_rate(),
            tax_amount: 0.0,
            grand_total: 0.0,
            notes: String::new(),
        };
        order.recalculate();
        order
    }

    pub fn add_position(&mut self, position: Position) {
        self.positions.push(position);
        self.recalculate();
    }

    pub fn remove_position(&mut self, position_id: &str) {
        self.positions.retain(|p| p.id != position_id);
        self.recalculate();
    }

    /// Recomputes every position's line total and the order totals.
    /// Idempotent; call after any add/remove/edit of positions or tax rate.
    pub fn recalculate(&mut self) {
        for position in &mut self.positions {
            position.recalculate();
        }
        self.net_total = self.positions.iter().map(|p| p.line_total).sum();
        self.tax_amount = self.net_total * (self.tax_rate / 100.0);
        self.grand_total = self.net_total + self.tax_amount;
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let mut order: Order =
            serde_json::from_value(value).map_err(|e| ServiceError::malformed("order", e))?;
        order.recalculate();
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn totals_follow_positions_and_tax_rate() {
        let mut order = Order::new("K1", "Geländer");
        order.add_position(Position::new("Fertigung", 2.0, 100.0));
        order.add_position(Position::new("Montage", 1.5, 80.0));
        assert_eq!(order.net_total, 320.0);
        assert_eq!(order.tax_amount, 320.0 * 0.19);
        assert_eq!(order.grand_total, 320.0 * 1.19);

        let first_id = order.positions[0].id.clone();
        order.remove_position(&first_id);
        assert_eq!(order.net_total, 120.0);
    }

    #[test]
    fn line_total_tracks_quantity_and_price() {
        let mut position = Position::new("Fertigung", 3.0, 10.0);
        assert_eq!(position.line_total, 30.0);
        position.quantity = 4.0;
        position.unit_price = 12.5;
        position.recalculate();
        assert_eq!(position.line_total, 50.0);
    }

    #[test]
    fn stored_totals_are_not_trusted() {
        let value = json!({
            "id": "A1",
            "kunde_id": "K1",
            "bezeichnung": "Tor",
            "positionen": [
                { "id": "POS1", "bezeichnung": "Stahl", "menge": 2.0, "einzelpreis": 50.0, "gesamtpreis": 999.0 }
            ],
            "mwst_satz": 19.0,
            "endpreis": 123456.0
        });
        let order = Order::from_value(value).unwrap();
        assert_eq!(order.positions[0].line_total, 100.0);
        assert_eq!(order.net_total, 100.0);
        assert_eq!(order.grand_total, 119.0);
    }

    #[test]
    fn missing_customer_reference_is_malformed() {
        let err = Order::from_value(json!({ "id": "A1", "bezeichnung": "Tor" })).unwrap_err();
        assert!(matches!(
            err,
            crate::errors::ServiceError::MalformedRecord { kind: "order", .. }
        ));
    }

    #[test]
    fn round_trip_preserves_fields() {
        let mut order = Order::new("K1", "Zaun");
        order.number = "2025-0001".into();
        order.add_position(Position::new("Pfosten", 8.0, 45.0));
        let back = Order::from_value(order.to_value().unwrap()).unwrap();
        assert_eq!(back, order);
    }
}
