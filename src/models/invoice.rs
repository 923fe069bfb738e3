use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::Display;

use crate::errors::{Result, ServiceError};

use super::{default_tax_rate, generate_id, now, Position};

/// Invoice lifecycle status. Wire values are the German strings the data
/// files have always carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
pub enum InvoiceStatus {
    #[default]
    #[serde(rename = "Offen")]
    #[strum(serialize = "Offen")]
    Open,
    #[serde(rename = "Bezahlt")]
    #[strum(serialize = "Bezahlt")]
    Paid,
    #[serde(rename = "Überfällig")]
    #[strum(serialize = "Überfällig")]
    Overdue,
    #[serde(rename = "Storniert")]
    #[strum(serialize = "Storniert")]
    Cancelled,
}

fn default_payment_method() -> String {
    "Überweisung".to_string()
}

fn default_invoice_number() -> String {
    Invoice::generate_number()
}

/// An invoice derived from an order. Line items are independent copies of
/// the order's positions (plus synthesized material lines); totals follow
/// the same recompute-on-demand rule as [`super::Order`].
///
/// `lump_sum` marks invoices for orders without any bill of materials:
/// material cost is folded into the position prices instead of itemized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    #[serde(rename = "rechnungsnummer", default = "default_invoice_number")]
    pub number: String,
    #[serde(rename = "auftrag_id")]
    pub order_id: String,
    #[serde(rename = "kunde_id")]
    pub customer_id: String,
    /// Denormalized order number, written when the invoice lands in its
    /// order's scoped file.
    #[serde(rename = "auftragsnummer", default, skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
    #[serde(rename = "rechnungsdatum", default = "now")]
    pub invoice_date: NaiveDateTime,
    #[serde(rename = "leistungsdatum", default = "now")]
    pub service_date: NaiveDateTime,
    #[serde(rename = "faelligkeitsdatum", default = "now")]
    pub due_date: NaiveDateTime,
    #[serde(default)]
    pub status: InvoiceStatus,
    #[serde(rename = "positionen", default)]
    pub positions: Vec<Position>,
    #[serde(rename = "nettobetrag", default)]
    pub net_total: f64,
    #[serde(rename = "mwst_satz", default = "default_tax_rate")]
    pub tax_rate: f64,
    #[serde(rename = "mwst_betrag", default)]
    pub tax_amount: f64,
    #[serde(rename = "bruttobetrag", default)]
    pub gross_total: f64,
    #[serde(rename = "zahlungsart", default = "default_payment_method")]
    pub payment_method: String,
    #[serde(rename = "notizen", default)]
    pub notes: String,
    #[serde(rename = "pauschal", default)]
    pub lump_sum: bool,
}

impl Invoice {
    /// A fresh invoice for an order. Invoice/service date default to now,
    /// the due date to now + `net_term_days`.
    pub fn new(
        order_id: impl Into<String>,
        customer_id: impl Into<String>,
        tax_rate: f64,
        net_term_days: i64,
    ) -> Self {
        let invoice_date = now();
        let mut invoice = Self {
            id: generate_id("R"),
            number: Self::generate_number(),
            order_id: order_id.into(),
            customer_id: customer_id.into(),
            order_number: None,
            invoice_date,
            service_date: invoice_date,
            due_date: invoice_date + Duration::days(net_term_days),
            status: InvoiceStatus::default(),
            positions: Vec::new(),
            net_total: 0.0,
            tax_rate,
            tax_amount: 0.0,
            gross_total: 0.0,
            payment_method: default_payment_method(),
            notes: String::new(),
            lump_sum: false,
        };
        invoice.recalculate();
        invoice
    }

    /// Timestamp-derived invoice number, `REYYYYMMDDHHMMSS`.
    fn generate_number() -> String {
        format!("RE{}", chrono::Local::now().format("%Y%m%d%H%M%S"))
    }

    pub fn add_position(&mut self, position: Position) {
        self.positions.push(position);
        self.recalculate();
    }

    pub fn remove_position(&mut self, position_id: &str) {
        self.positions.retain(|p| p.id != position_id);
        self.recalculate();
    }

    pub fn recalculate(&mut self) {
        for position in &mut self.positions {
            position.recalculate();
        }
        self.net_total = self.positions.iter().map(|p| p.line_total).sum();
        self.tax_amount = self.net_total * (self.tax_rate / 100.0);
        self.gross_total = self.net_total + self.tax_amount;
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let mut invoice: Invoice =
            serde_json::from_value(value).map_err(|e| ServiceError::malformed("invoice", e))?;
        invoice.recalculate();
        Ok(invoice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn due_date_uses_net_term() {
        let invoice = Invoice::new("A1", "K1", 19.0, 14);
        assert_eq!(invoice.due_date - invoice.invoice_date, Duration::days(14));
        assert_eq!(invoice.service_date, invoice.invoice_date);
        assert!(invoice.number.starts_with("RE"));
    }

    #[test]
    fn status_round_trips_through_german_wire_values() {
        let mut invoice = Invoice::new("A1", "K1", 19.0, 14);
        invoice.status = InvoiceStatus::Overdue;
        let value = invoice.to_value().unwrap();
        assert_eq!(value["status"], json!("Überfällig"));
        let back = Invoice::from_value(value).unwrap();
        assert_eq!(back.status, InvoiceStatus::Overdue);
    }

    #[test]
    fn totals_recompute_from_positions() {
        let mut invoice = Invoice::new("A1", "K1", 19.0, 14);
        invoice.add_position(Position::new("Arbeit", 10.0, 50.0));
        assert_eq!(invoice.net_total, 500.0);
        assert_eq!(invoice.gross_total, 595.0);
    }

    #[test]
    fn missing_order_reference_is_malformed() {
        let err = Invoice::from_value(json!({
            "id": "R1",
            "rechnungsnummer": "RE1",
            "kunde_id": "K1"
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            crate::errors::ServiceError::MalformedRecord { kind: "invoice", .. }
        ));
    }
}
