//! Document rendering seam.
//!
//! The actual PDF layout lives outside this crate; the manager-facing code
//! only needs something that takes a finalized record plus an output path
//! and writes a file there. Renderers get read-only access and must not
//! write back into the data store.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::CompanyInfo;
use crate::errors::Result;
use crate::models::{BillOfMaterials, Customer, Invoice, Timesheet};

pub trait DocumentRenderer {
    /// Renders an invoice for the given customer to `output`, returning the
    /// path actually written.
    fn render_invoice(
        &self,
        invoice: &Invoice,
        customer: &Customer,
        output: &Path,
    ) -> Result<PathBuf>;

    fn render_timesheet(&self, timesheet: &Timesheet, output: &Path) -> Result<PathBuf>;

    fn render_bom(&self, bom: &BillOfMaterials, output: &Path) -> Result<PathBuf>;
}

/// Reference renderer that dumps the record as pretty JSON. Good enough for
/// tests and the CLI; a real letterhead renderer implements the same trait.
pub struct JsonRenderer {
    pub company: CompanyInfo,
}

impl JsonRenderer {
    pub fn new(company: CompanyInfo) -> Self {
        Self { company }
    }

    fn write(&self, record: serde_json::Value, output: &Path) -> Result<PathBuf> {
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(output, serde_json::to_string_pretty(&record)?)?;
        Ok(output.to_path_buf())
    }
}

impl DocumentRenderer for JsonRenderer {
    fn render_invoice(
        &self,
        invoice: &Invoice,
        customer: &Customer,
        output: &Path,
    ) -> Result<PathBuf> {
        let record = serde_json::json!({
            "absender": self.company.name,
            "empfaenger": customer.display_name(),
            "anschrift": customer.full_address(),
            "rechnung": invoice.to_value()?,
        });
        self.write(record, output)
    }

    fn render_timesheet(&self, timesheet: &Timesheet, output: &Path) -> Result<PathBuf> {
        let mut record = timesheet.to_value()?;
        record["gesamtstunden"] = serde_json::json!(timesheet.total_hours());
        record["gesamtstrecke_km"] = serde_json::json!(timesheet.total_distance_km());
        self.write(record, output)
    }

    fn render_bom(&self, bom: &BillOfMaterials, output: &Path) -> Result<PathBuf> {
        let mut record = bom.to_value()?;
        record["gesamtbetrag"] = serde_json::json!(bom.total_amount());
        self.write(record, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_invoice_without_touching_the_record() {
        let dir = tempfile::tempdir().unwrap();
        let customer = Customer::new("Muster");
        let invoice = Invoice::new("A1", &customer.id, 19.0, 14);
        let before = invoice.clone();

        let renderer = JsonRenderer::new(CompanyInfo::default());
        let path = renderer
            .render_invoice(&invoice, &customer, &dir.path().join("out").join("re.json"))
            .unwrap();

        assert!(path.is_file());
        assert_eq!(invoice, before);
    }
}
