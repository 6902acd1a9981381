mod cli;
mod combination;
mod db;
mod error;
mod fmt;
mod group;
mod hierarchy;
mod importer;
mod manual;
mod matcher;
mod models;
mod names;
mod reconciler;
mod settings;

use clap::Parser;
use tracing_subscriber::{prelude::*, EnvFilter};

use cli::{ClientsCommands, Cli, Commands, DepositsCommands, OrdersCommands};

fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose; logs go to stderr so tables stay clean.
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();

    let result = match cli.command {
        Commands::Init {
            data_dir,
            business_name,
            vat_rate,
        } => cli::init::run(data_dir, business_name, vat_rate),
        Commands::Clients { command } => match command {
            ClientsCommands::Add {
                name,
                parent,
                contact,
            } => cli::clients::add(&name, parent.as_deref(), contact.as_deref()),
            ClientsCommands::List => cli::clients::list(),
        },
        Commands::Orders { command } => match command {
            OrdersCommands::Add {
                client,
                title,
                supply,
                total,
                no_vat,
                date,
            } => cli::orders::add(client.as_deref(), &title, supply, total, no_vat, date.as_deref()),
            OrdersCommands::List { all } => cli::orders::list(all),
            OrdersCommands::Advance { id } => cli::orders::advance(id),
            OrdersCommands::Pay { id, date, card } => cli::orders::pay(id, &date, card),
        },
        Commands::Deposits { command } => match command {
            DepositsCommands::Import { file, format } => cli::deposits::import(&file, format.as_deref()),
            DepositsCommands::List { all } => cli::deposits::list(all),
        },
        Commands::Reconcile { apply, json } => cli::reconcile::run(apply, json),
        Commands::MatchGroup {
            deposit,
            orders,
            apply,
        } => cli::match_group::run(deposit, &orders, apply),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
