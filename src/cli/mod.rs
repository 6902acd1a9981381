pub mod clients;
pub mod deposits;
pub mod init;
pub mod match_group;
pub mod orders;
pub mod reconcile;
pub mod status;

use clap::{Parser, Subcommand};
use rusqlite::Connection;

use crate::db::{get_connection, DB_FILE};
use crate::error::Result;
use crate::settings::get_data_dir;

pub(crate) fn open_db() -> Result<Connection> {
    get_connection(&get_data_dir().join(DB_FILE))
}

#[derive(Parser)]
#[command(name = "paymatch", about = "Receivables and bank-deposit reconciliation for print and design shops.")]
pub struct Cli {
    /// Show debug logging (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up paymatch: choose a data directory and initialize the database.
    Init {
        /// Path for paymatch data (default: ~/Documents/paymatch)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// Business name shown by `paymatch status`
        #[arg(long = "business-name")]
        business_name: Option<String>,
        /// VAT rate in percent applied to new orders (default 10)
        #[arg(long = "vat-rate")]
        vat_rate: Option<u32>,
    },
    /// Manage clients and sub-clients.
    Clients {
        #[command(subcommand)]
        command: ClientsCommands,
    },
    /// Manage orders.
    Orders {
        #[command(subcommand)]
        command: OrdersCommands,
    },
    /// Import and list bank deposits.
    Deposits {
        #[command(subcommand)]
        command: DepositsCommands,
    },
    /// Match unmatched deposits to outstanding orders.
    Reconcile {
        /// Record the proposed matches as paid
        #[arg(long)]
        apply: bool,
        /// Print proposals as JSON
        #[arg(long, conflicts_with = "apply")]
        json: bool,
    },
    /// Pay several orders with one deposit by hand.
    MatchGroup {
        /// Deposit ID (shown in `paymatch deposits list`)
        #[arg(long)]
        deposit: i64,
        /// Order ID; repeat for each order in the split
        #[arg(long = "order", required = true)]
        orders: Vec<i64>,
        /// Record the match as paid
        #[arg(long)]
        apply: bool,
    },
    /// Show current database and summary statistics.
    Status,
}

#[derive(Subcommand)]
pub enum ClientsCommands {
    /// Add a client.
    Add {
        /// Client name as registered, e.g. '(주)블루디자인'
        name: String,
        /// Parent client name, making this a sub-client
        #[arg(long)]
        parent: Option<String>,
        /// Contact person or phone
        #[arg(long)]
        contact: Option<String>,
    },
    /// List clients grouped under their parents.
    List,
}

#[derive(Subcommand)]
pub enum OrdersCommands {
    /// Add an order.
    Add {
        /// Client name
        #[arg(long)]
        client: Option<String>,
        /// What is being made
        #[arg(long)]
        title: String,
        /// Net supply price; VAT is added on top
        #[arg(long, conflicts_with = "total", required_unless_present = "total")]
        supply: Option<i64>,
        /// VAT-inclusive total
        #[arg(long)]
        total: Option<i64>,
        /// No VAT on this order
        #[arg(long = "no-vat")]
        no_vat: bool,
        /// Order date: YYYY-MM-DD
        #[arg(long)]
        date: Option<String>,
    },
    /// List outstanding orders.
    List {
        /// Include paid orders
        #[arg(long)]
        all: bool,
    },
    /// Move an order to its next stage (quote, design, production).
    Advance {
        /// Order ID
        id: i64,
    },
    /// Mark an order paid outside of deposit matching.
    Pay {
        /// Order ID
        id: i64,
        /// Payment date: YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// Paid by card
        #[arg(long)]
        card: bool,
    },
}

#[derive(Subcommand)]
pub enum DepositsCommands {
    /// Import deposits from a bank CSV export.
    Import {
        /// Path to CSV file
        file: String,
        /// Importer format key: normalized, bank
        #[arg(long)]
        format: Option<String>,
    },
    /// List unmatched deposits.
    List {
        /// Include matched deposits
        #[arg(long)]
        all: bool,
    },
}
