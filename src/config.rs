use std::fs;
use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::{Result, ServiceError};

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_DATA_ROOT: &str = "data";
const DEFAULT_NET_TERM_DAYS: i64 = 14;
const DEFAULT_TAX_RATE: f64 = 19.0;

/// Letterhead data consumed by document rendering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyInfo {
    pub name: String,
    pub owner: String,
    pub street: String,
    pub postal_code: String,
    pub city: String,
    pub phone: String,
    pub email: String,
    pub tax_id: String,
    pub bank_name: String,
    pub iban: String,
}

/// Application configuration, stored as a single JSON document and read once
/// at startup. `save` exists because changing the data root writes the new
/// path back into this document.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AppConfig {
    pub company: CompanyInfo,

    /// VAT percentage applied to new orders.
    #[validate(range(min = 0.0, max = 100.0))]
    pub default_tax_rate: f64,

    /// Payment term in days used for invoice due dates.
    #[validate(range(min = 0))]
    pub net_term_days: i64,

    /// Selectable order statuses (open enumeration; free strings allowed).
    pub order_status_options: Vec<String>,

    /// Selectable position statuses. "Rechnung" is the sentinel gating
    /// invoice creation and must stay in this list.
    pub position_status_options: Vec<String>,

    /// Root of the on-disk data tree.
    pub data_root: String,

    pub log_level: String,
    pub log_json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            company: CompanyInfo::default(),
            default_tax_rate: DEFAULT_TAX_RATE,
            net_term_days: DEFAULT_NET_TERM_DAYS,
            order_status_options: vec![
                "Angebot".to_string(),
                "Beauftragt".to_string(),
                "In Arbeit".to_string(),
                "Abgeschlossen".to_string(),
                "Storniert".to_string(),
            ],
            position_status_options: vec![
                "zur Freigabe".to_string(),
                "Freigegeben".to_string(),
                "In Arbeit".to_string(),
                "Rechnung".to_string(),
            ],
            data_root: DEFAULT_DATA_ROOT.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_json: false,
        }
    }
}

impl AppConfig {
    /// Loads the JSON config file (missing file yields pure defaults) with
    /// `APP__`-prefixed environment overrides, then validates ranges.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;
        let cfg: AppConfig = settings.try_deserialize()?;
        cfg.validate()
            .map_err(|e| ServiceError::ValidationError(format!("invalid configuration: {e}")))?;
        Ok(cfg)
    }

    /// Writes the document back as pretty JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Initializes the tracing subscriber: env-filter with the configured level
/// as fallback, optional JSON output.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default_directive = format!("auftragsverwaltung={level}");
    let filter = std::env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let registry = tracing_subscriber::registry().with(EnvFilter::new(filter));
    if json {
        let _ = registry.with(fmt::layer().json()).try_init();
    } else {
        let _ = registry.with(fmt::layer()).try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_invoice_sentinel_available() {
        let cfg = AppConfig::default();
        assert!(cfg
            .position_status_options
            .iter()
            .any(|s| s == crate::models::POSITION_STATUS_READY));
        assert_eq!(cfg.net_term_days, 14);
        assert_eq!(cfg.default_tax_rate, 19.0);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config").join("config.json");
        let mut cfg = AppConfig::default();
        cfg.data_root = "/tmp/auftraege".to_string();
        cfg.company.name = "Metallbau Muster".to_string();
        cfg.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.data_root, "/tmp/auftraege");
        assert_eq!(loaded.company.name, "Metallbau Muster");
    }

    #[test]
    fn out_of_range_tax_rate_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "default_tax_rate": 250.0 }"#).unwrap();
        assert!(AppConfig::load(&path).is_err());
    }
}
