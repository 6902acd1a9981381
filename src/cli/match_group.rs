use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::open_db;
use crate::db::{apply_matches, load_clients, load_records, load_transactions};
use crate::error::Result;
use crate::fmt::{money, signed_money};
use crate::hierarchy::ClientTree;
use crate::manual::ManualSession;
use crate::reconciler::reconcile;

pub fn run(deposit: i64, orders: &[i64], apply: bool) -> Result<()> {
    let conn = open_db()?;
    let clients = load_clients(&conn)?;
    let transactions = load_transactions(&conn, true)?;
    let records = load_records(&conn, true)?;

    // Only what the automatic passes could not place is offered here.
    let auto = reconcile(&clients, &transactions, &records)?;
    let tree = ClientTree::build(&clients)?;
    let mut session = ManualSession::new(
        auto.leftover_records(&records),
        auto.leftover_transactions(&transactions),
        &tree,
    );

    let record = session.select_record(deposit)?.clone();
    for id in orders {
        session.toggle_transaction(*id)?;
    }

    let mut table = Table::new();
    table.set_header(vec!["Order", "Client", "Title", "Ordered", "Amount"]);
    for t in session.selection() {
        table.add_row(vec![
            Cell::new(t.id),
            Cell::new(t.client_name().unwrap_or("")),
            Cell::new(&t.title),
            Cell::new(t.order_date.map(|d| d.to_string()).unwrap_or_default()),
            Cell::new(money(t.amount)),
        ]);
    }
    println!("Deposit {} from {} on {}: {}", record.id, record.depositor, record.date, money(record.amount));
    println!("{table}");

    let variance = session.variance().unwrap_or_default();
    let shown = if session.can_confirm() {
        signed_money(variance).green()
    } else {
        signed_money(variance).red()
    };
    println!("Selected: {}  Variance: {shown}", money(session.selection_sum()));

    let confirmed = session.confirm()?;
    if apply {
        let applied = apply_matches(&conn, &[], session.accepted())?;
        println!(
            "Applied: {} orders paid by deposit {}",
            applied.transactions, confirmed.record.id
        );
    } else {
        // Preview only: hand the deposit and orders back.
        session.cancel(confirmed.record.id)?;
        println!(
            "Match for {} is balanced. Re-run with --apply to record it.",
            confirmed.client_name
        );
    }
    Ok(())
}
