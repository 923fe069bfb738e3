//! The in-memory source of truth over the file store.
//!
//! The manager loads the full object graph eagerly at startup and keeps it
//! for the process lifetime; reads never touch disk afterwards. Every
//! mutating call writes through synchronously before returning, so the disk
//! matches memory at every point control goes back to the caller.
//!
//! Single-threaded by design: the GUI drives the manager from one thread,
//! there is no internal locking, and no safety against a second process on
//! the same data root is claimed.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::config::AppConfig;
use crate::errors::{Result, ServiceError};
use crate::models::{BillOfMaterials, Customer, Invoice, Order, Position, Timesheet};
use crate::store::{CollectionKind, FileStore, ScopedFile};

/// Knobs for [`DataManager::create_invoice_from_order`].
#[derive(Debug, Clone)]
pub struct InvoiceOptions {
    /// Payment term for the due date.
    pub net_term_days: i64,
    /// Append material-cost lines (plus the 30% markup) for the order's
    /// bills of materials.
    pub attach_boms: bool,
    /// Require every position to carry the "Rechnung" status first.
    pub status_check: bool,
}

impl Default for InvoiceOptions {
    fn default() -> Self {
        Self {
            net_term_days: 14,
            attach_boms: true,
            status_check: true,
        }
    }
}

/// Markup applied on top of the summed bill-of-materials totals.
const MATERIAL_MARKUP: f64 = 0.30;

pub struct DataManager {
    store: FileStore,
    config: AppConfig,
    config_path: PathBuf,
    customers: Vec<Customer>,
    orders: Vec<Order>,
    invoices: Vec<Invoice>,
    timesheets: Vec<Timesheet>,
    boms: Vec<BillOfMaterials>,
}

/// Converts a list of raw values into records, skipping (with a warning)
/// every record that fails to deserialize. A half-corrupt file loses the
/// broken records, never the whole collection.
fn collect_tolerant<T>(
    kind: &'static str,
    values: Vec<Value>,
    mut convert: impl FnMut(Value) -> Result<T>,
) -> Vec<T> {
    let mut records = Vec::with_capacity(values.len());
    for value in values {
        match convert(value) {
            Ok(record) => records.push(record),
            Err(e) => warn!(kind, error = %e, "skipping malformed record"),
        }
    }
    records
}

impl DataManager {
    /// Builds the manager and eagerly loads the whole object graph.
    pub fn new(config: AppConfig, config_path: impl Into<PathBuf>) -> Result<Self> {
        let store = FileStore::new(config.data_root.clone());
        let mut manager = Self {
            store,
            config,
            config_path: config_path.into(),
            customers: Vec::new(),
            orders: Vec::new(),
            invoices: Vec::new(),
            timesheets: Vec::new(),
            boms: Vec::new(),
        };
        manager.load_all();
        Ok(manager)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn data_root(&self) -> &Path {
        self.store.data_root()
    }

    /// Reloads everything from disk. Customers and orders come from the two
    /// global files; invoices are gathered per loaded order, timesheets and
    /// bills of materials by scanning every order folder. Association back
    /// to orders happens via the `auftrag_id` stored in each record, not via
    /// the folder it was found in.
    pub fn load_all(&mut self) {
        self.customers = collect_tolerant(
            "customer",
            self.store.read_collection(CollectionKind::Customers),
            Customer::from_value,
        );
        self.orders = collect_tolerant(
            "order",
            self.store.read_collection(CollectionKind::Orders),
            Order::from_value,
        );

        self.invoices = Vec::new();
        for number in self.orders.iter().map(|o| o.number.clone()).collect::<Vec<_>>() {
            let values = self.store.read_order_scoped(&number, ScopedFile::Invoices);
            self.invoices
                .extend(collect_tolerant("invoice", values, Invoice::from_value));
        }

        self.timesheets = Vec::new();
        self.boms = Vec::new();
        for folder in self.store.list_all_order_folders() {
            let values = self.store.read_scoped_in_folder(&folder, ScopedFile::Timesheets);
            self.timesheets
                .extend(collect_tolerant("timesheet", values, Timesheet::from_value));
            let values = self.store.read_scoped_in_folder(&folder, ScopedFile::Boms);
            self.boms.extend(collect_tolerant(
                "bill of materials",
                values,
                BillOfMaterials::from_value,
            ));
        }

        info!(
            customers = self.customers.len(),
            orders = self.orders.len(),
            invoices = self.invoices.len(),
            timesheets = self.timesheets.len(),
            boms = self.boms.len(),
            "data loaded"
        );
    }

    /// Full rewrite of everything the manager holds: both global files plus
    /// every resolvable order's scoped files. The targeted CRUD paths are
    /// preferred; this is the explicit recovery path used when a record's
    /// owning order cannot be resolved, and the simplest way to bring a
    /// fresh data root up to date.
    #[instrument(skip(self))]
    pub fn reconcile_and_persist_all(&mut self) -> Result<()> {
        self.save_customers()?;
        self.save_orders()?;

        for order in &self.orders {
            let number = &order.number;

            let invoices: Vec<Value> = self
                .invoices
                .iter_mut()
                .filter(|i| i.order_id == order.id)
                .map(|i| {
                    i.order_number = Some(number.clone());
                    i.to_value()
                })
                .collect::<Result<_>>()?;
            if !invoices.is_empty() {
                self.store
                    .write_order_scoped(number, ScopedFile::Invoices, &invoices)?;
            }

            let timesheets: Vec<Value> = self
                .timesheets
                .iter()
                .filter(|t| t.order_id == order.id)
                .map(Timesheet::to_value)
                .collect::<Result<_>>()?;
            if !timesheets.is_empty() {
                self.store
                    .write_order_scoped(number, ScopedFile::Timesheets, &timesheets)?;
            }

            let boms: Vec<Value> = self
                .boms
                .iter()
                .filter(|b| b.order_id == order.id)
                .map(BillOfMaterials::to_value)
                .collect::<Result<_>>()?;
            if !boms.is_empty() {
                self.store.write_order_scoped(number, ScopedFile::Boms, &boms)?;
            }
        }

        let order_ids: Vec<&str> = self.orders.iter().map(|o| o.id.as_str()).collect();
        for invoice in &self.invoices {
            if !order_ids.contains(&invoice.order_id.as_str()) {
                warn!(invoice_id = %invoice.id, order_id = %invoice.order_id, "invoice references unknown order, not persisted");
            }
        }
        Ok(())
    }

    fn save_customers(&self) -> Result<()> {
        let values: Vec<Value> = self
            .customers
            .iter()
            .map(Customer::to_value)
            .collect::<Result<_>>()?;
        self.store.write_collection(CollectionKind::Customers, &values)
    }

    fn save_orders(&self) -> Result<()> {
        let values: Vec<Value> = self
            .orders
            .iter()
            .map(Order::to_value)
            .collect::<Result<_>>()?;
        self.store.write_collection(CollectionKind::Orders, &values)
    }

    // ----- customers -----------------------------------------------------

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    pub fn customer(&self, id: &str) -> Option<&Customer> {
        self.customers.iter().find(|c| c.id == id)
    }

    #[instrument(skip(self, customer), fields(customer_id = %customer.id))]
    pub fn add_customer(&mut self, customer: Customer) -> Result<bool> {
        if self.customers.iter().any(|c| c.id == customer.id) {
            return Ok(false);
        }
        self.customers.push(customer);
        self.save_customers()?;
        info!("customer added");
        Ok(true)
    }

    #[instrument(skip(self, customer), fields(customer_id = %customer.id))]
    pub fn update_customer(&mut self, customer: Customer) -> Result<bool> {
        match self.customers.iter_mut().find(|c| c.id == customer.id) {
            Some(slot) => {
                *slot = customer;
                self.save_customers()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Deletes a customer. Refused while any order still references them;
    /// the orders must go (or move) first.
    #[instrument(skip(self))]
    pub fn delete_customer(&mut self, customer_id: &str) -> Result<bool> {
        if !self.customers.iter().any(|c| c.id == customer_id) {
            return Ok(false);
        }
        let referencing: Vec<&str> = self
            .orders
            .iter()
            .filter(|o| o.customer_id == customer_id)
            .map(|o| o.number.as_str())
            .collect();
        if !referencing.is_empty() {
            return Err(ServiceError::ValidationError(format!(
                "Der Kunde kann nicht gelöscht werden, solange Aufträge auf ihn verweisen: {}",
                referencing.join(", ")
            )));
        }
        self.customers.retain(|c| c.id != customer_id);
        self.save_customers()?;
        info!("customer deleted");
        Ok(true)
    }

    // ----- orders --------------------------------------------------------

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn order(&self, id: &str) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == id)
    }

    pub fn orders_for_customer(&self, customer_id: &str) -> Vec<&Order> {
        self.orders
            .iter()
            .filter(|o| o.customer_id == customer_id)
            .collect()
    }

    /// Next free order number for the current year, `YYYY-NNNN`.
    pub fn generate_next_order_number(&self) -> String {
        self.next_order_number_for_year(chrono::Datelike::year(&chrono::Local::now()))
    }

    /// Max numeric suffix among this year's numbers, plus one (or 0001 when
    /// the year has none). Other years and unparseable suffixes are ignored.
    pub fn next_order_number_for_year(&self, year: i32) -> String {
        let prefix = format!("{year}-");
        let next = self
            .orders
            .iter()
            .filter_map(|o| o.number.strip_prefix(&prefix))
            .filter_map(|suffix| suffix.parse::<u32>().ok())
            .max()
            .map_or(1, |max| max + 1);
        format!("{year}-{next:04}")
    }

    /// Registers a new order and provisions its folder skeleton: the year/
    /// order directories, the three scoped files, and one folder per
    /// already-present position. A missing or legacy (`AUF…`) number is
    /// replaced with the next free one; an explicitly supplied number is
    /// taken as-is; uniqueness across different order ids is deliberately
    /// not enforced.
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    pub fn add_order(&mut self, mut order: Order) -> Result<bool> {
        if self.orders.iter().any(|o| o.id == order.id) {
            return Ok(false);
        }
        if order.number.is_empty() || order.number.starts_with("AUF") {
            order.number = self.generate_next_order_number();
        }
        order.recalculate();

        let number = order.number.clone();
        let positions: Vec<String> = order.positions.iter().map(|p| p.label.clone()).collect();

        self.orders.push(order);
        self.save_orders()?;
        self.store.provision_order_layout(&number)?;
        for (index, label) in positions.iter().enumerate() {
            self.store.provision_position_layout(&number, index + 1, label)?;
        }
        info!(order_number = %number, "order added");
        Ok(true)
    }

    /// Replaces an order in place and provisions folders for any position
    /// added since creation.
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    pub fn update_order(&mut self, mut order: Order) -> Result<bool> {
        order.recalculate();
        let number = order.number.clone();
        let positions: Vec<String> = order.positions.iter().map(|p| p.label.clone()).collect();
        let Some(slot) = self.orders.iter_mut().find(|o| o.id == order.id) else {
            return Ok(false);
        };
        *slot = order;
        self.save_orders()?;
        for (index, label) in positions.iter().enumerate() {
            self.store.provision_position_layout(&number, index + 1, label)?;
        }
        Ok(true)
    }

    /// Removes the order from the working set and rewrites the master file.
    /// The order's folder stays on disk; deletion is non-destructive there.
    #[instrument(skip(self))]
    pub fn delete_order(&mut self, order_id: &str) -> Result<bool> {
        let before = self.orders.len();
        self.orders.retain(|o| o.id != order_id);
        if self.orders.len() == before {
            return Ok(false);
        }
        self.save_orders()?;
        info!("order deleted, folder left in place");
        Ok(true)
    }

    // ----- invoices ------------------------------------------------------

    pub fn invoices(&self) -> &[Invoice] {
        &self.invoices
    }

    pub fn invoice(&self, id: &str) -> Option<&Invoice> {
        self.invoices.iter().find(|i| i.id == id)
    }

    pub fn invoices_for_customer(&self, customer_id: &str) -> Vec<&Invoice> {
        self.invoices
            .iter()
            .filter(|i| i.customer_id == customer_id)
            .collect()
    }

    pub fn invoices_for_order(&self, order_id: &str) -> Vec<&Invoice> {
        self.invoices
            .iter()
            .filter(|i| i.order_id == order_id)
            .collect()
    }

    #[instrument(skip(self, invoice), fields(invoice_id = %invoice.id))]
    pub fn add_invoice(&mut self, mut invoice: Invoice) -> Result<bool> {
        if self.invoices.iter().any(|i| i.id == invoice.id) {
            return Ok(false);
        }
        match self.order(&invoice.order_id).map(|o| o.number.clone()) {
            Some(number) => {
                invoice.order_number = Some(number.clone());
                let mut values = self.store.read_order_scoped(&number, ScopedFile::Invoices);
                values.push(invoice.to_value()?);
                self.invoices.push(invoice);
                self.store.write_order_scoped(&number, ScopedFile::Invoices, &values)?;
            }
            None => {
                warn!(order_id = %invoice.order_id, "invoice order not resolvable, falling back to full persist");
                self.invoices.push(invoice);
                self.reconcile_and_persist_all()?;
            }
        }
        Ok(true)
    }

    #[instrument(skip(self, invoice), fields(invoice_id = %invoice.id))]
    pub fn update_invoice(&mut self, mut invoice: Invoice) -> Result<bool> {
        if !self.invoices.iter().any(|i| i.id == invoice.id) {
            return Ok(false);
        }
        match self.order(&invoice.order_id).map(|o| o.number.clone()) {
            Some(number) => {
                invoice.order_number = Some(number.clone());
                let value = invoice.to_value()?;
                let id = invoice.id.clone();
                if let Some(slot) = self.invoices.iter_mut().find(|i| i.id == id) {
                    *slot = invoice;
                }
                let mut values = self.store.read_order_scoped(&number, ScopedFile::Invoices);
                splice_record(&mut values, &id, value);
                self.store.write_order_scoped(&number, ScopedFile::Invoices, &values)?;
            }
            None => {
                warn!(order_id = %invoice.order_id, "invoice order not resolvable, falling back to full persist");
                let id = invoice.id.clone();
                if let Some(slot) = self.invoices.iter_mut().find(|i| i.id == id) {
                    *slot = invoice;
                }
                self.reconcile_and_persist_all()?;
            }
        }
        Ok(true)
    }

    #[instrument(skip(self))]
    pub fn delete_invoice(&mut self, invoice_id: &str) -> Result<bool> {
        let Some(invoice) = self.invoices.iter().find(|i| i.id == invoice_id) else {
            return Ok(false);
        };
        let order_number = self.order(&invoice.order_id).map(|o| o.number.clone());
        self.invoices.retain(|i| i.id != invoice_id);
        match order_number {
            Some(number) => {
                let mut values = self.store.read_order_scoped(&number, ScopedFile::Invoices);
                remove_record(&mut values, invoice_id);
                self.store.write_order_scoped(&number, ScopedFile::Invoices, &values)?;
            }
            None => self.reconcile_and_persist_all()?,
        }
        Ok(true)
    }

    /// Derives an invoice from an order: the one genuinely non-trivial
    /// business operation.
    ///
    /// Every order position is copied as an invoice line. Orders without a
    /// bill of materials become lump-sum ("pauschal") invoices; otherwise
    /// each BOM contributes a material-cost line and a single 30% markup
    /// line closes the material block. With `status_check` on, any position
    /// not yet at "Rechnung" aborts with a [`ServiceError::ValidationError`]
    /// listing every offender.
    ///
    /// `Ok(None)` when the order id is unknown.
    #[instrument(skip(self, options))]
    pub fn create_invoice_from_order(
        &mut self,
        order_id: &str,
        options: InvoiceOptions,
    ) -> Result<Option<Invoice>> {
        let Some(order) = self.order(order_id) else {
            return Ok(None);
        };

        if options.status_check && !order.positions.is_empty() {
            let not_ready: Vec<String> = order
                .positions
                .iter()
                .enumerate()
                .filter(|(_, p)| !p.is_ready_to_invoice())
                .map(|(i, p)| format!("{:02}_{} (Status: {})", i + 1, p.label, p.status))
                .collect();
            if !not_ready.is_empty() {
                return Err(ServiceError::ValidationError(format!(
                    "Nicht alle Positionen haben den Status 'Rechnung'.\n\n\
                     Folgende Positionen müssen zuerst auf 'Rechnung' gesetzt werden:\n\n{}\n\n\
                     Bitte setzen Sie alle Positionen auf 'Rechnung', bevor Sie eine Rechnung erstellen.",
                    not_ready.join("\n")
                )));
            }
        }

        let mut invoice = Invoice::new(
            order.id.clone(),
            order.customer_id.clone(),
            order.tax_rate,
            options.net_term_days,
        );
        for position in &order.positions {
            invoice.add_position(position.clone());
        }

        let boms = self.boms_for_order(order_id);
        let material_total: f64 = boms.iter().map(|b| b.total_amount()).sum();
        if boms.is_empty() {
            invoice.lump_sum = true;
            if !invoice.notes.is_empty() {
                invoice.notes.push_str("\n\n");
            }
            invoice
                .notes
                .push_str("PAUSCHAL - Materialkosten sind bereits in den Positionen enthalten.");
        } else if options.attach_boms {
            for bom in &boms {
                let mut label = format!("Materialkosten - {}", bom.project);
                if !bom.bill_number.is_empty() {
                    label.push_str(&format!(" (Stückliste: {})", bom.bill_number));
                }
                invoice.add_position(Position::new(label, 1.0, bom.total_amount()));
            }
            let markup = material_total * MATERIAL_MARKUP;
            if markup > 0.0 {
                invoice.add_position(Position::new("Materialaufschlag (30%)", 1.0, markup));
            }
        }

        self.add_invoice(invoice.clone())?;
        info!(invoice_id = %invoice.id, line_items = invoice.positions.len(), lump_sum = invoice.lump_sum, "invoice derived from order");
        Ok(Some(invoice))
    }

    // ----- timesheets ----------------------------------------------------

    pub fn timesheets(&self) -> &[Timesheet] {
        &self.timesheets
    }

    pub fn timesheet(&self, id: &str) -> Option<&Timesheet> {
        self.timesheets.iter().find(|t| t.id == id)
    }

    /// The (at most one) timesheet of a position.
    pub fn timesheet_for_position(&self, order_id: &str, position_id: &str) -> Option<&Timesheet> {
        self.timesheets
            .iter()
            .find(|t| t.order_id == order_id && t.position_id == position_id)
    }

    #[instrument(skip(self, timesheet), fields(timesheet_id = %timesheet.id))]
    pub fn add_timesheet(&mut self, timesheet: Timesheet) -> Result<bool> {
        if self.timesheets.iter().any(|t| t.id == timesheet.id) {
            return Ok(false);
        }
        match self.order(&timesheet.order_id).map(|o| o.number.clone()) {
            Some(number) => {
                let mut values = self.store.read_order_scoped(&number, ScopedFile::Timesheets);
                values.push(timesheet.to_value()?);
                self.timesheets.push(timesheet);
                self.store.write_order_scoped(&number, ScopedFile::Timesheets, &values)?;
            }
            None => {
                warn!(order_id = %timesheet.order_id, "timesheet order not resolvable, falling back to full persist");
                self.timesheets.push(timesheet);
                self.reconcile_and_persist_all()?;
            }
        }
        Ok(true)
    }

    #[instrument(skip(self, timesheet), fields(timesheet_id = %timesheet.id))]
    pub fn update_timesheet(&mut self, timesheet: Timesheet) -> Result<bool> {
        if !self.timesheets.iter().any(|t| t.id == timesheet.id) {
            return Ok(false);
        }
        match self.order(&timesheet.order_id).map(|o| o.number.clone()) {
            Some(number) => {
                let value = timesheet.to_value()?;
                let id = timesheet.id.clone();
                if let Some(slot) = self.timesheets.iter_mut().find(|t| t.id == id) {
                    *slot = timesheet;
                }
                let mut values = self.store.read_order_scoped(&number, ScopedFile::Timesheets);
                splice_record(&mut values, &id, value);
                self.store.write_order_scoped(&number, ScopedFile::Timesheets, &values)?;
            }
            None => {
                let id = timesheet.id.clone();
                if let Some(slot) = self.timesheets.iter_mut().find(|t| t.id == id) {
                    *slot = timesheet;
                }
                self.reconcile_and_persist_all()?;
            }
        }
        Ok(true)
    }

    #[instrument(skip(self))]
    pub fn delete_timesheet(&mut self, timesheet_id: &str) -> Result<bool> {
        let Some(timesheet) = self.timesheets.iter().find(|t| t.id == timesheet_id) else {
            return Ok(false);
        };
        let order_number = self.order(&timesheet.order_id).map(|o| o.number.clone());
        self.timesheets.retain(|t| t.id != timesheet_id);
        match order_number {
            Some(number) => {
                let mut values = self.store.read_order_scoped(&number, ScopedFile::Timesheets);
                remove_record(&mut values, timesheet_id);
                self.store.write_order_scoped(&number, ScopedFile::Timesheets, &values)?;
            }
            None => self.reconcile_and_persist_all()?,
        }
        Ok(true)
    }

    // ----- bills of materials --------------------------------------------

    pub fn boms(&self) -> &[BillOfMaterials] {
        &self.boms
    }

    pub fn bom(&self, id: &str) -> Option<&BillOfMaterials> {
        self.boms.iter().find(|b| b.id == id)
    }

    /// The (at most one) bill of materials of a position.
    pub fn bom_for_position(&self, order_id: &str, position_id: &str) -> Option<&BillOfMaterials> {
        self.boms
            .iter()
            .find(|b| b.order_id == order_id && b.position_id == position_id)
    }

    pub fn boms_for_order(&self, order_id: &str) -> Vec<&BillOfMaterials> {
        self.boms.iter().filter(|b| b.order_id == order_id).collect()
    }

    /// The bills of materials whose cost lines appear on the given invoice,
    /// resolved by exact project-string equality against the
    /// "Materialkosten - {projekt}" lines. Duplicate project names within
    /// one order stay ambiguous; the literal matching rule is kept as-is.
    pub fn attached_boms_for_invoice(&self, invoice: &Invoice) -> Vec<&BillOfMaterials> {
        self.boms_for_order(&invoice.order_id)
            .into_iter()
            .filter(|bom| {
                let base = format!("Materialkosten - {}", bom.project);
                invoice
                    .positions
                    .iter()
                    .any(|p| p.label == base || p.label.starts_with(&format!("{base} (Stückliste:")))
            })
            .collect()
    }

    #[instrument(skip(self, bom), fields(bom_id = %bom.id))]
    pub fn add_bom(&mut self, bom: BillOfMaterials) -> Result<bool> {
        if self.boms.iter().any(|b| b.id == bom.id) {
            return Ok(false);
        }
        match self.order(&bom.order_id).map(|o| o.number.clone()) {
            Some(number) => {
                let mut values = self.store.read_order_scoped(&number, ScopedFile::Boms);
                values.push(bom.to_value()?);
                self.boms.push(bom);
                self.store.write_order_scoped(&number, ScopedFile::Boms, &values)?;
            }
            None => {
                warn!(order_id = %bom.order_id, "bill of materials order not resolvable, falling back to full persist");
                self.boms.push(bom);
                self.reconcile_and_persist_all()?;
            }
        }
        Ok(true)
    }

    #[instrument(skip(self, bom), fields(bom_id = %bom.id))]
    pub fn update_bom(&mut self, bom: BillOfMaterials) -> Result<bool> {
        if !self.boms.iter().any(|b| b.id == bom.id) {
            return Ok(false);
        }
        match self.order(&bom.order_id).map(|o| o.number.clone()) {
            Some(number) => {
                let value = bom.to_value()?;
                let id = bom.id.clone();
                if let Some(slot) = self.boms.iter_mut().find(|b| b.id == id) {
                    *slot = bom;
                }
                let mut values = self.store.read_order_scoped(&number, ScopedFile::Boms);
                splice_record(&mut values, &id, value);
                self.store.write_order_scoped(&number, ScopedFile::Boms, &values)?;
            }
            None => {
                let id = bom.id.clone();
                if let Some(slot) = self.boms.iter_mut().find(|b| b.id == id) {
                    *slot = bom;
                }
                self.reconcile_and_persist_all()?;
            }
        }
        Ok(true)
    }

    #[instrument(skip(self))]
    pub fn delete_bom(&mut self, bom_id: &str) -> Result<bool> {
        let Some(bom) = self.boms.iter().find(|b| b.id == bom_id) else {
            return Ok(false);
        };
        let order_number = self.order(&bom.order_id).map(|o| o.number.clone());
        self.boms.retain(|b| b.id != bom_id);
        match order_number {
            Some(number) => {
                let mut values = self.store.read_order_scoped(&number, ScopedFile::Boms);
                remove_record(&mut values, bom_id);
                self.store.write_order_scoped(&number, ScopedFile::Boms, &values)?;
            }
            None => self.reconcile_and_persist_all()?,
        }
        Ok(true)
    }

    // ----- data root -----------------------------------------------------

    /// Moves the store to a new data root and persists the path into the
    /// config document. Existing files are not migrated.
    #[instrument(skip(self, path))]
    pub fn set_data_root(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        self.store.set_data_root(path.clone())?;
        self.config.data_root = path.to_string_lossy().into_owned();
        self.config.save(&self.config_path)?;
        info!(data_root = %path.display(), "data root changed");
        Ok(())
    }
}

/// Replaces the record with the given id inside a raw scoped collection, or
/// appends it when absent.
fn splice_record(values: &mut Vec<Value>, id: &str, record: Value) {
    match values
        .iter_mut()
        .find(|v| v.get("id").and_then(Value::as_str) == Some(id))
    {
        Some(slot) => *slot = record,
        None => values.push(record),
    }
}

fn remove_record(values: &mut Vec<Value>, id: &str) {
    values.retain(|v| v.get("id").and_then(Value::as_str) != Some(id));
}
