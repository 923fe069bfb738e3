//! Typed records for the five entity kinds and their child entries.
//!
//! The JSON field names and well-known string values are the wire format of
//! the data files on disk and are therefore German; Rust-side names are
//! English and mapped with `#[serde(rename)]`. Derived totals are stored for
//! the benefit of external readers but are never trusted on load: every
//! deserialization path ends in an explicit `recalculate()`.

use chrono::{Local, NaiveDateTime};
use uuid::Uuid;

mod bom;
mod customer;
mod invoice;
mod order;
mod timesheet;

pub use bom::{BillOfMaterials, MaterialEntry};
pub use customer::Customer;
pub use invoice::{Invoice, InvoiceStatus};
pub use order::{Order, Position, POSITION_STATUS_READY};
pub use timesheet::{TimeEntry, Timesheet};

/// Generates an entity id: type prefix + local timestamp with microseconds
/// + 8 random hex chars. Ids are opaque; nothing may rely on their ordering.
pub(crate) fn generate_id(prefix: &str) -> String {
    let stamp = Local::now().format("%Y%m%d%H%M%S%6f");
    let tail = Uuid::new_v4().simple().to_string();
    format!("{prefix}{stamp}{}", &tail[..8])
}

pub(crate) fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Rounds to two decimal places, matching the precision the original files
/// carry for hour totals.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub(crate) fn default_quantity() -> f64 {
    1.0
}

pub(crate) fn default_unit() -> String {
    "Stk".to_string()
}

pub(crate) fn default_tax_rate() -> f64 {
    19.0
}
