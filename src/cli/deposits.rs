use std::path::PathBuf;

use comfy_table::{Cell, Table};

use crate::cli::open_db;
use crate::db::load_records;
use crate::error::Result;
use crate::fmt::money;
use crate::importer::import_file;

pub fn import(file: &str, format: Option<&str>) -> Result<()> {
    let conn = open_db()?;
    let result = import_file(&conn, &PathBuf::from(file), format)?;

    if result.duplicate_file {
        println!("This file has already been imported (duplicate checksum).");
        return Ok(());
    }
    println!("{} deposits imported, {} skipped (duplicates)", result.imported, result.skipped);
    Ok(())
}

pub fn list(all: bool) -> Result<()> {
    let conn = open_db()?;
    let records = load_records(&conn, !all)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Depositor", "Description", "Amount", "Balance", "Matched"]);
    for r in &records {
        table.add_row(vec![
            Cell::new(r.id),
            Cell::new(r.date),
            Cell::new(&r.depositor),
            Cell::new(&r.description),
            Cell::new(money(r.amount)),
            Cell::new(r.balance.map(money).unwrap_or_default()),
            Cell::new(if r.is_matched { "yes" } else { "" }),
        ]);
    }
    println!("Deposits\n{table}");
    Ok(())
}
