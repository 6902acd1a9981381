use std::path::Path;

use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OptionalExtension, Row};
use tracing::debug;

use crate::error::{PaymatchError, Result};
use crate::models::{BankRecord, Client, GroupMatchResult, MatchResult, Transaction, TransactionStatus};

pub const DB_FILE: &str = "paymatch.db";

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS clients (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    parent_id INTEGER,
    contact TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (parent_id) REFERENCES clients(id)
);

CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY,
    client_id INTEGER,
    title TEXT NOT NULL,
    supply_amount INTEGER NOT NULL,
    vat_amount INTEGER NOT NULL DEFAULT 0,
    amount INTEGER NOT NULL,
    status TEXT NOT NULL DEFAULT 'quote',
    order_date TEXT,
    paid_at TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    CHECK ((status IN ('completed', 'card')) = (paid_at IS NOT NULL)),
    FOREIGN KEY (client_id) REFERENCES clients(id)
);

CREATE TABLE IF NOT EXISTS imports (
    id INTEGER PRIMARY KEY,
    filename TEXT NOT NULL,
    import_date TEXT DEFAULT (datetime('now')),
    record_count INTEGER,
    date_range_start TEXT,
    date_range_end TEXT,
    checksum TEXT
);

CREATE TABLE IF NOT EXISTS bank_records (
    id INTEGER PRIMARY KEY,
    date TEXT NOT NULL,
    depositor TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    amount INTEGER NOT NULL CHECK (amount > 0),
    balance INTEGER,
    is_matched INTEGER DEFAULT 0,
    import_id INTEGER,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (import_id) REFERENCES imports(id)
);
";

const TRANSACTION_COLUMNS: &str = "t.id, t.client_id, t.title, t.supply_amount, t.vat_amount, t.amount, \
     t.status, t.order_date, t.paid_at, c.id, c.name, c.parent_id, c.contact";

impl FromSql for TransactionStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = value.as_str()?;
        raw.parse()
            .map_err(|e: PaymatchError| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for TransactionStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

fn client_from_row(row: &Row<'_>) -> rusqlite::Result<Client> {
    Ok(Client {
        id: row.get(0)?,
        name: row.get(1)?,
        parent_id: row.get(2)?,
        contact: row.get(3)?,
    })
}

fn transaction_from_row(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    let client = match row.get::<_, Option<i64>>(9)? {
        Some(id) => Some(Client {
            id,
            name: row.get(10)?,
            parent_id: row.get(11)?,
            contact: row.get(12)?,
        }),
        None => None,
    };
    Ok(Transaction {
        id: row.get(0)?,
        client_id: row.get(1)?,
        client,
        title: row.get(2)?,
        supply_amount: row.get(3)?,
        vat_amount: row.get(4)?,
        amount: row.get(5)?,
        status: row.get(6)?,
        order_date: row.get(7)?,
        paid_at: row.get(8)?,
    })
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<BankRecord> {
    Ok(BankRecord {
        id: row.get(0)?,
        date: row.get(1)?,
        depositor: row.get(2)?,
        description: row.get(3)?,
        amount: row.get(4)?,
        balance: row.get(5)?,
        is_matched: row.get(6)?,
    })
}

pub fn find_client_id(conn: &Connection, name: &str) -> Result<i64> {
    conn.query_row("SELECT id FROM clients WHERE name = ?1", [name], |row| row.get(0))
        .optional()?
        .ok_or_else(|| PaymatchError::UnknownClient(name.to_string()))
}

pub fn load_clients(conn: &Connection) -> Result<Vec<Client>> {
    let mut stmt = conn.prepare("SELECT id, name, parent_id, contact FROM clients ORDER BY id")?;
    let rows = stmt
        .query_map([], client_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Orders in id order with their client joined. `outstanding_only` keeps
/// unpaid orders only.
pub fn load_transactions(conn: &Connection, outstanding_only: bool) -> Result<Vec<Transaction>> {
    let filter = if outstanding_only {
        "WHERE t.status NOT IN ('completed', 'card') AND t.paid_at IS NULL"
    } else {
        ""
    };
    let sql = format!(
        "SELECT {TRANSACTION_COLUMNS} FROM transactions t LEFT JOIN clients c ON t.client_id = c.id \
         {filter} ORDER BY t.id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], transaction_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn load_transaction(conn: &Connection, id: i64) -> Result<Transaction> {
    let sql = format!(
        "SELECT {TRANSACTION_COLUMNS} FROM transactions t LEFT JOIN clients c ON t.client_id = c.id \
         WHERE t.id = ?1"
    );
    conn.query_row(&sql, [id], transaction_from_row)
        .optional()?
        .ok_or(PaymatchError::UnknownTransaction(id))
}

/// Deposits in id order. `unmatched_only` drops deposits already applied.
pub fn load_records(conn: &Connection, unmatched_only: bool) -> Result<Vec<BankRecord>> {
    let filter = if unmatched_only { "WHERE is_matched = 0" } else { "" };
    let sql = format!(
        "SELECT id, date, depositor, description, amount, balance, is_matched FROM bank_records \
         {filter} ORDER BY id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], record_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn save_status(conn: &Connection, txn: &Transaction) -> Result<()> {
    let changed = conn.execute(
        "UPDATE transactions SET status = ?1, paid_at = ?2 WHERE id = ?3",
        rusqlite::params![txn.status, txn.paid_at, txn.id],
    )?;
    if changed == 0 {
        return Err(PaymatchError::UnknownTransaction(txn.id));
    }
    Ok(())
}

pub fn mark_transaction_paid(conn: &Connection, id: i64, paid_at: NaiveDate) -> Result<()> {
    let changed = conn.execute(
        "UPDATE transactions SET status = 'completed', paid_at = ?1 WHERE id = ?2",
        rusqlite::params![paid_at, id],
    )?;
    if changed == 0 {
        return Err(PaymatchError::UnknownTransaction(id));
    }
    Ok(())
}

pub fn mark_record_matched(conn: &Connection, id: i64) -> Result<()> {
    let changed = conn.execute("UPDATE bank_records SET is_matched = 1 WHERE id = ?1", [id])?;
    if changed == 0 {
        return Err(PaymatchError::UnknownRecord(id));
    }
    Ok(())
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ApplyResult {
    pub transactions: usize,
    pub records: usize,
}

/// Write accepted matches back: every order becomes completed, paid on the
/// deposit's date, and every deposit is flagged matched.
///
/// Updates are issued one row at a time without an enclosing transaction.
/// If one fails, the rows already written stay written and the error is
/// returned; running reconcile again picks up what is left.
pub fn apply_matches(
    conn: &Connection,
    matches: &[MatchResult],
    groups: &[GroupMatchResult],
) -> Result<ApplyResult> {
    let mut applied = ApplyResult::default();

    for m in matches {
        mark_transaction_paid(conn, m.transaction.id, m.record.date)?;
        applied.transactions += 1;
        mark_record_matched(conn, m.record.id)?;
        applied.records += 1;
    }
    for g in groups {
        for t in &g.transactions {
            mark_transaction_paid(conn, t.id, g.record.date)?;
            applied.transactions += 1;
        }
        mark_record_matched(conn, g.record.id)?;
        applied.records += 1;
    }

    debug!(
        transactions = applied.transactions,
        records = applied.records,
        "applied matches"
    );
    Ok(applied)
}
