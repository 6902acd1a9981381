use comfy_table::{Cell, Table};

use crate::cli::open_db;
use crate::db::{apply_matches, load_clients, load_records, load_transactions};
use crate::error::{PaymatchError, Result};
use crate::fmt::money;
use crate::models::{GroupMatchResult, MatchResult};
use crate::reconciler::reconcile;

fn single_table(matches: &[MatchResult]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Order", "Client", "Amount", "Deposit", "Depositor", "Date"]);
    for m in matches {
        table.add_row(vec![
            Cell::new(m.transaction.id),
            Cell::new(m.transaction.client_name().unwrap_or("")),
            Cell::new(money(m.transaction.amount)),
            Cell::new(m.record.id),
            Cell::new(&m.record.depositor),
            Cell::new(m.record.date),
        ]);
    }
    table
}

fn group_table(groups: &[GroupMatchResult]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Deposit", "Depositor", "Date", "Client", "Orders", "Total"]);
    for g in groups {
        let orders: Vec<String> = g
            .transactions
            .iter()
            .map(|t| format!("#{} {}", t.id, money(t.amount)))
            .collect();
        table.add_row(vec![
            Cell::new(g.record.id),
            Cell::new(&g.record.depositor),
            Cell::new(g.record.date),
            Cell::new(&g.client_name),
            Cell::new(orders.join("\n")),
            Cell::new(money(g.total)),
        ]);
    }
    table
}

pub fn run(apply: bool, json: bool) -> Result<()> {
    let conn = open_db()?;
    let transactions = load_transactions(&conn, true)?;
    let records = load_records(&conn, true)?;
    let run = reconcile(&load_clients(&conn)?, &transactions, &records)?;

    if json {
        let out = serde_json::to_string_pretty(&run).map_err(|e| PaymatchError::Other(e.to_string()))?;
        println!("{out}");
        return Ok(());
    }

    if run.is_empty() {
        println!("No matches found.");
    }
    if !run.matches.is_empty() {
        println!("Single matches\n{}", single_table(&run.matches));
    }
    if !run.group_matches.is_empty() {
        println!("Group matches\n{}", group_table(&run.group_matches));
    }
    println!(
        "{} deposits and {} orders still outstanding",
        run.leftover_records(&records).len(),
        run.leftover_transactions(&transactions).len()
    );

    if apply && !run.is_empty() {
        let applied = apply_matches(&conn, &run.matches, &run.group_matches)?;
        println!(
            "Applied: {} orders marked completed, {} deposits matched",
            applied.transactions, applied.records
        );
    } else if !run.is_empty() {
        println!("Re-run with --apply to record these payments.");
    }
    Ok(())
}
