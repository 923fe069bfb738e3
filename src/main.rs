use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;

use auftragsverwaltung::config::{self, AppConfig};
use auftragsverwaltung::models::{Customer, Order, Position};
use auftragsverwaltung::render::{DocumentRenderer, JsonRenderer};
use auftragsverwaltung::{DataManager, InvoiceOptions};

#[derive(Parser)]
#[command(name = "auftragsverwaltung", about = "Order management over a JSON data tree", version)]
struct Cli {
    /// Path to the configuration document.
    #[arg(long, default_value = "config/config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List all customers.
    Customers,
    /// List all orders with their totals.
    Orders,
    /// Print the next free order number for the current year.
    NextNumber,
    /// Create a customer.
    AddCustomer {
        name: String,
        #[arg(long, default_value = "")]
        company: String,
    },
    /// Create an order (provisions its folder hierarchy).
    AddOrder {
        customer_id: String,
        title: String,
        /// Explicit order number; autogenerated when omitted.
        #[arg(long)]
        number: Option<String>,
        /// Positions as "label:quantity:unit_price", repeatable.
        #[arg(long = "position")]
        positions: Vec<String>,
    },
    /// Derive an invoice from an order.
    Invoice {
        order_id: String,
        #[arg(long)]
        skip_status_check: bool,
        #[arg(long)]
        no_boms: bool,
    },
    /// Render an invoice as a JSON document.
    Render {
        invoice_id: String,
        output: PathBuf,
    },
    /// Point the data tree at a new root directory (no migration).
    SetDataRoot { path: PathBuf },
}

fn parse_position(raw: &str) -> anyhow::Result<Position> {
    let mut parts = raw.splitn(3, ':');
    let label = parts.next().unwrap_or_default();
    if label.is_empty() {
        bail!("position needs at least a label: {raw:?}");
    }
    let quantity = parts.next().map_or(Ok(1.0), |s| s.parse::<f64>())?;
    let unit_price = parts.next().map_or(Ok(0.0), |s| s.parse::<f64>())?;
    Ok(Position::new(label, quantity, unit_price))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = AppConfig::load(&cli.config).context("loading configuration")?;
    config::init_tracing(&cfg.log_level, cfg.log_json);

    let default_tax_rate = cfg.default_tax_rate;
    let net_term_days = cfg.net_term_days;
    let company = cfg.company.clone();
    let mut manager = DataManager::new(cfg, &cli.config)?;

    match cli.command {
        Command::Customers => {
            for customer in manager.customers() {
                println!("{}  {}", customer.id, customer.display_name());
            }
        }
        Command::Orders => {
            for order in manager.orders() {
                println!(
                    "{}  {}  {}  {:.2} EUR ({})",
                    order.number, order.id, order.title, order.grand_total, order.status
                );
            }
        }
        Command::NextNumber => println!("{}", manager.generate_next_order_number()),
        Command::AddCustomer { name, company } => {
            let mut customer = Customer::new(name);
            customer.company = company;
            let id = customer.id.clone();
            if manager.add_customer(customer)? {
                println!("{id}");
            } else {
                bail!("customer id already exists");
            }
        }
        Command::AddOrder {
            customer_id,
            title,
            number,
            positions,
        } => {
            if manager.customer(&customer_id).is_none() {
                bail!("unknown customer: {customer_id}");
            }
            let mut order = Order::new(customer_id, title);
            order.tax_rate = default_tax_rate;
            if let Some(number) = number {
                order.number = number;
            }
            for raw in &positions {
                order.add_position(parse_position(raw)?);
            }
            let id = order.id.clone();
            if manager.add_order(order)? {
                let order = manager.order(&id).context("order vanished after insert")?;
                println!("{}  {}", order.number, order.id);
            } else {
                bail!("order id already exists");
            }
        }
        Command::Invoice {
            order_id,
            skip_status_check,
            no_boms,
        } => {
            let options = InvoiceOptions {
                net_term_days,
                attach_boms: !no_boms,
                status_check: !skip_status_check,
            };
            match manager.create_invoice_from_order(&order_id, options)? {
                Some(invoice) => println!(
                    "{}  {}  {:.2} EUR brutto",
                    invoice.number, invoice.id, invoice.gross_total
                ),
                None => bail!("unknown order: {order_id}"),
            }
        }
        Command::Render { invoice_id, output } => {
            let invoice = manager
                .invoice(&invoice_id)
                .with_context(|| format!("unknown invoice: {invoice_id}"))?;
            let customer = manager
                .customer(&invoice.customer_id)
                .with_context(|| format!("unknown customer: {}", invoice.customer_id))?;
            let renderer = JsonRenderer::new(company);
            let path = renderer.render_invoice(invoice, customer, &output)?;
            info!(path = %path.display(), "document written");
            println!("{}", path.display());
        }
        Command::SetDataRoot { path } => {
            manager.set_data_root(path)?;
            println!("{}", manager.data_root().display());
        }
    }
    Ok(())
}
