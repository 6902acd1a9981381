use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::open_db;
use crate::db::{find_client_id, load_transaction, load_transactions, save_status};
use crate::error::{PaymatchError, Result};
use crate::fmt::money;
use crate::models::{parse_date, Pricing, TransactionStatus};
use crate::settings::load_settings;

pub fn add(
    client: Option<&str>,
    title: &str,
    supply: Option<i64>,
    total: Option<i64>,
    no_vat: bool,
    date: Option<&str>,
) -> Result<()> {
    let conn = open_db()?;
    let rate = load_settings().vat_rate_percent;

    let pricing = match (supply, total) {
        (Some(s), _) if s > 0 && no_vat => Pricing::vat_exempt(s),
        (Some(s), _) if s > 0 => Pricing::from_supply(s, rate)?,
        (None, Some(t)) if t > 0 && no_vat => Pricing::vat_exempt(t),
        (None, Some(t)) if t > 0 => Pricing::from_total(t, rate)?,
        (Some(bad), _) | (None, Some(bad)) => return Err(PaymatchError::InvalidAmount(bad.to_string())),
        (None, None) => return Err(PaymatchError::Other("Give --supply or --total".to_string())),
    };
    let client_id = client.map(|name| find_client_id(&conn, name)).transpose()?;
    let order_date = date.map(parse_date).transpose()?;

    conn.execute(
        "INSERT INTO transactions (client_id, title, supply_amount, vat_amount, amount, status, order_date) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            client_id,
            title,
            pricing.supply,
            pricing.vat,
            pricing.total(),
            TransactionStatus::Quote,
            order_date,
        ],
    )?;
    println!(
        "Added order {}: {title} {} (supply {}, VAT {})",
        conn.last_insert_rowid(),
        money(pricing.total()),
        money(pricing.supply),
        money(pricing.vat)
    );
    Ok(())
}

fn status_cell(status: TransactionStatus) -> String {
    if status.is_paid() {
        status.as_str().green().to_string()
    } else {
        status.as_str().yellow().to_string()
    }
}

pub fn list(all: bool) -> Result<()> {
    let conn = open_db()?;
    let orders = load_transactions(&conn, !all)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Client", "Title", "Supply", "VAT", "Total", "Status", "Ordered", "Paid"]);
    for t in &orders {
        table.add_row(vec![
            Cell::new(t.id),
            Cell::new(t.client_name().unwrap_or("")),
            Cell::new(&t.title),
            Cell::new(money(t.supply_amount)),
            Cell::new(money(t.vat_amount)),
            Cell::new(money(t.amount)),
            Cell::new(status_cell(t.status)),
            Cell::new(t.order_date.map(|d| d.to_string()).unwrap_or_default()),
            Cell::new(t.paid_at.map(|d| d.to_string()).unwrap_or_default()),
        ]);
    }
    let outstanding: i64 = orders.iter().filter(|t| t.is_outstanding()).map(|t| t.amount).sum();
    println!("Orders\n{table}");
    println!("Outstanding: {}", money(outstanding));
    Ok(())
}

pub fn advance(id: i64) -> Result<()> {
    let conn = open_db()?;
    let mut txn = load_transaction(&conn, id)?;
    let from = txn.status;
    let to = txn.advance()?;
    save_status(&conn, &txn)?;
    println!("Order {id}: {from} \u{2192} {to}");
    Ok(())
}

pub fn pay(id: i64, date: &str, card: bool) -> Result<()> {
    let conn = open_db()?;
    let mut txn = load_transaction(&conn, id)?;
    let status = if card {
        TransactionStatus::Card
    } else {
        TransactionStatus::Completed
    };
    txn.mark_paid(status, parse_date(date)?)?;
    save_status(&conn, &txn)?;
    println!("Order {id} marked {status} on {date}");
    Ok(())
}
