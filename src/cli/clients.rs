use comfy_table::{Cell, Table};

use crate::cli::open_db;
use crate::db::{find_client_id, load_clients};
use crate::error::{PaymatchError, Result};
use crate::hierarchy::ClientTree;

pub fn add(name: &str, parent: Option<&str>, contact: Option<&str>) -> Result<()> {
    let conn = open_db()?;

    let parent_id = match parent {
        Some(parent_name) => {
            let id = find_client_id(&conn, parent_name)?;
            let grandparent: Option<i64> =
                conn.query_row("SELECT parent_id FROM clients WHERE id = ?1", [id], |row| row.get(0))?;
            if grandparent.is_some() {
                return Err(PaymatchError::Other(format!(
                    "{parent_name} is a sub-client and cannot have sub-clients"
                )));
            }
            Some(id)
        }
        None => None,
    };

    conn.execute(
        "INSERT INTO clients (name, parent_id, contact) VALUES (?1, ?2, ?3)",
        rusqlite::params![name, parent_id, contact],
    )?;
    match parent {
        Some(p) => println!("Added client: {name} (under {p})"),
        None => println!("Added client: {name}"),
    }
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = open_db()?;
    let tree = ClientTree::build(&load_clients(&conn)?)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Contact"]);
    for root in tree.roots() {
        table.add_row(vec![
            Cell::new(root.id),
            Cell::new(&root.name),
            Cell::new(root.contact.as_deref().unwrap_or("")),
        ]);
        for child in tree.children(root.id) {
            table.add_row(vec![
                Cell::new(child.id),
                Cell::new(format!("  \u{2514} {}", child.name)),
                Cell::new(child.contact.as_deref().unwrap_or("")),
            ]);
        }
    }
    println!("Clients\n{table}");
    Ok(())
}
