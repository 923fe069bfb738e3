//! File-backed persistence for the order data tree.
//!
//! The store owns every path decision and speaks only `serde_json::Value`;
//! it never constructs domain objects and never looks at manager state.
//! Layout (compatibility format, reproduced exactly):
//!
//! ```text
//! <data_root>/
//!   customers.json
//!   orders.json
//!   <year>/<order_number>/
//!     stundennachweise.json
//!     stuecklisten.json
//!     rechnungen.json
//!     <NN>_<sanitized position label>/
//!       Dokumentation/{Fotos,Skizzen,Berechnungen}/
//!       Rechnungen/{Belege,Kundenrechnungen}/
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Local};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::errors::Result;

/// Characters that may not appear in a folder name derived from free text.
const FORBIDDEN_PATH_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// The two global top-level collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Customers,
    Orders,
}

impl CollectionKind {
    fn file_name(self) -> &'static str {
        match self {
            CollectionKind::Customers => "customers.json",
            CollectionKind::Orders => "orders.json",
        }
    }
}

/// The three JSON files living inside each order folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopedFile {
    Timesheets,
    Boms,
    Invoices,
}

impl ScopedFile {
    pub fn file_name(self) -> &'static str {
        match self {
            ScopedFile::Timesheets => "stundennachweise.json",
            ScopedFile::Boms => "stuecklisten.json",
            ScopedFile::Invoices => "rechnungen.json",
        }
    }
}

const SCOPED_FILES: [ScopedFile; 3] = [ScopedFile::Timesheets, ScopedFile::Boms, ScopedFile::Invoices];

/// Replaces every filesystem-hostile character with `_`, 1:1. Applied to
/// every free-text label that becomes a path segment.
pub fn sanitize_label(label: &str) -> String {
    label
        .chars()
        .map(|c| if FORBIDDEN_PATH_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Year segment of an order number (`YYYY-NNNN` → `YYYY`). Numbers without a
/// `-` fall back to the current calendar year instead of failing; old data
/// occasionally carries free-form numbers.
fn year_segment(order_number: &str) -> String {
    match order_number.split_once('-') {
        Some((year, _)) => year.to_string(),
        None => Local::now().year().to_string(),
    }
}

pub struct FileStore {
    data_root: PathBuf,
}

impl FileStore {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
        }
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    /// Points the store at a new root and (re)creates the directory.
    /// Existing files are NOT migrated; that is the caller's business.
    pub fn set_data_root(&mut self, data_root: impl Into<PathBuf>) -> Result<()> {
        self.data_root = data_root.into();
        fs::create_dir_all(&self.data_root)?;
        Ok(())
    }

    fn collection_path(&self, kind: CollectionKind) -> PathBuf {
        self.data_root.join(kind.file_name())
    }

    fn order_folder(&self, order_number: &str) -> PathBuf {
        self.data_root.join(year_segment(order_number)).join(order_number)
    }

    /// Reads a JSON array file. Missing, empty, or unparseable files all
    /// yield an empty vec: a broken global file must never take startup
    /// down. This tolerant-read policy is deliberate, not an oversight.
    fn read_array(&self, path: &Path) -> Vec<Value> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => return Vec::new(),
        };
        if raw.trim().is_empty() {
            return Vec::new();
        }
        match serde_json::from_str::<Vec<Value>>(&raw) {
            Ok(items) => items,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable collection file, treating as empty");
                Vec::new()
            }
        }
    }

    /// Pretty-printed JSON, non-ASCII written literally, parent directories
    /// created on demand.
    fn write_array(&self, path: &Path, items: &[Value]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_string_pretty(items)?;
        fs::write(path, body)?;
        debug!(path = %path.display(), count = items.len(), "collection written");
        Ok(())
    }

    pub fn read_collection(&self, kind: CollectionKind) -> Vec<Value> {
        self.read_array(&self.collection_path(kind))
    }

    pub fn write_collection(&self, kind: CollectionKind, items: &[Value]) -> Result<()> {
        self.write_array(&self.collection_path(kind), items)
    }

    pub fn read_order_scoped(&self, order_number: &str, file: ScopedFile) -> Vec<Value> {
        self.read_array(&self.order_folder(order_number).join(file.file_name()))
    }

    pub fn write_order_scoped(
        &self,
        order_number: &str,
        file: ScopedFile,
        items: &[Value],
    ) -> Result<()> {
        self.write_array(&self.order_folder(order_number).join(file.file_name()), items)
    }

    /// Creates the year and order directories and seeds the three scoped
    /// JSON files with `[]`, but only files that do not exist yet, so a
    /// repeated call never resets populated data. Safe to call any time.
    #[instrument(skip(self))]
    pub fn provision_order_layout(&self, order_number: &str) -> Result<PathBuf> {
        let folder = self.order_folder(order_number);
        fs::create_dir_all(&folder)?;
        for scoped in SCOPED_FILES {
            let file = folder.join(scoped.file_name());
            if !file.exists() {
                fs::write(&file, "[]")?;
            }
        }
        Ok(folder)
    }

    /// Creates the folder for one position (`NN_<label>`, 1-based 2-digit
    /// index) with its fixed documentation/receipt subtree. Idempotent.
    #[instrument(skip(self, label))]
    pub fn provision_position_layout(
        &self,
        order_number: &str,
        position_index: usize,
        label: &str,
    ) -> Result<PathBuf> {
        let folder = self
            .order_folder(order_number)
            .join(format!("{:02}_{}", position_index, sanitize_label(label)));
        for sub in [
            "Dokumentation/Fotos",
            "Dokumentation/Skizzen",
            "Dokumentation/Berechnungen",
            "Rechnungen/Belege",
            "Rechnungen/Kundenrechnungen",
        ] {
            fs::create_dir_all(folder.join(sub))?;
        }
        Ok(folder)
    }

    /// The order's folder if it exists on disk. Never creates anything.
    pub fn locate_order_folder(&self, order_number: &str) -> Option<PathBuf> {
        let folder = self.order_folder(order_number);
        folder.is_dir().then_some(folder)
    }

    /// Every order folder on disk: directories with a `-` in their name
    /// under numeric-named year directories. This scan is how order-scoped
    /// collections get aggregated without a global index file.
    pub fn list_all_order_folders(&self) -> Vec<PathBuf> {
        let mut folders = Vec::new();
        let Ok(years) = fs::read_dir(&self.data_root) else {
            return folders;
        };
        for year in years.flatten() {
            let year_path = year.path();
            let is_year_dir = year_path.is_dir()
                && year
                    .file_name()
                    .to_string_lossy()
                    .chars()
                    .all(|c| c.is_ascii_digit());
            if !is_year_dir {
                continue;
            }
            let Ok(orders) = fs::read_dir(&year_path) else {
                continue;
            };
            for order in orders.flatten() {
                let path = order.path();
                if path.is_dir() && order.file_name().to_string_lossy().contains('-') {
                    folders.push(path);
                }
            }
        }
        folders.sort();
        folders
    }

    /// Reads one scoped file from an already-located order folder, with the
    /// same tolerant-read contract as everywhere else.
    pub fn read_scoped_in_folder(&self, folder: &Path, file: ScopedFile) -> Vec<Value> {
        self.read_array(&folder.join(file.file_name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("A/B: C?", "A_B_ C_" ; "slashes colon question mark")]
    #[test_case("Tor \"Süd\" <neu>|alt", "Tor _Süd_ _neu__alt" ; "quotes and brackets")]
    #[test_case("Geländer EG", "Geländer EG" ; "clean label unchanged")]
    fn sanitizes_labels(input: &str, expected: &str) {
        assert_eq!(sanitize_label(input), expected);
    }

    #[test]
    fn year_segment_splits_on_first_dash() {
        assert_eq!(year_segment("2025-0007"), "2025");
        assert_eq!(year_segment("2025-00-07"), "2025");
    }

    #[test]
    fn year_segment_falls_back_to_current_year() {
        let current = Local::now().year().to_string();
        assert_eq!(year_segment("altbestand"), current);
    }
}
