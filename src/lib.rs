//! Auftragsverwaltung core library
//!
//! Order management for a small workshop business: customers, orders with
//! line-item positions, invoices, timesheets and bills of materials, all
//! persisted as JSON files in a year/order-number folder hierarchy. The GUI
//! and PDF layout live outside this crate and talk exclusively to
//! [`manager::DataManager`]; see [`render::DocumentRenderer`] for the
//! rendering seam.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod errors;
pub mod manager;
pub mod models;
pub mod render;
pub mod store;

pub use config::AppConfig;
pub use errors::{Result, ServiceError};
pub use manager::{DataManager, InvoiceOptions};
