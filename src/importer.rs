use std::path::Path;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use rusqlite::Connection;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{PaymatchError, Result};
use crate::models::{parse_date, ParsedBankRecord};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a won amount such as `"50,000"`, `"₩1,200"` or `"30000원"`.
/// Blank cells are `None`.
pub fn parse_amount(raw: &str) -> Option<i64> {
    let s: String = raw
        .chars()
        .filter(|c| !matches!(c, ',' | '"' | '₩' | '원') && !c.is_whitespace())
        .collect();
    if s.is_empty() {
        return None;
    }
    s.parse::<i64>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().map(|v| v.round() as i64))
}

fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(\d{4})\s*[.\-/]\s*(\d{1,2})\s*[.\-/]\s*(\d{1,2})").expect("date pattern compiles")
    })
}

/// Pull the date out of a bank timestamp like `2024.01.05 13:22:10` or
/// `2024/1/5`.
pub fn parse_bank_date(raw: &str) -> Option<NaiveDate> {
    let caps = date_pattern().captures(raw)?;
    let y: i32 = caps[1].parse().ok()?;
    let m: u32 = caps[2].parse().ok()?;
    let d: u32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(y, m, d)
}

fn compute_checksum(file_path: &Path) -> Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

/// Whether an earlier import already stored this deposit. Rows of the
/// current import are never compared with each other: identical lines in
/// one statement are separate payments. A balance on both sides must agree.
fn is_duplicate_row(conn: &Connection, row: &ParsedBankRecord, import_id: i64) -> Result<bool> {
    let mut stmt = conn.prepare_cached(
        "SELECT 1 FROM bank_records \
         WHERE date = ?1 AND amount = ?2 AND depositor = ?3 AND description = ?4 \
         AND (?5 IS NULL OR balance IS NULL OR balance = ?5) \
         AND import_id IS NOT ?6",
    )?;
    Ok(stmt.exists(rusqlite::params![
        row.date,
        row.amount,
        row.depositor,
        row.description,
        row.balance,
        import_id
    ])?)
}

fn reader(file_path: &Path, has_headers: bool) -> Result<csv::Reader<std::io::BufReader<std::fs::File>>> {
    let file = std::fs::File::open(file_path)?;
    Ok(csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(std::io::BufReader::new(file)))
}

// ---------------------------------------------------------------------------
// Importer kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImporterKind {
    /// `date,description,depositor,amount,balance` with ISO dates.
    Normalized,
    /// Internet-banking transaction history export.
    Bank,
}

const ALL_IMPORTERS: &[ImporterKind] = &[ImporterKind::Normalized, ImporterKind::Bank];

impl ImporterKind {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Normalized => "normalized",
            Self::Bank => "bank",
        }
    }

    pub fn detect(&self, file_path: &Path) -> bool {
        match self {
            Self::Normalized => detect_normalized(file_path),
            Self::Bank => find_bank_header(file_path).is_some(),
        }
    }

    /// Deposit rows only; withdrawals are dropped here.
    pub fn parse(&self, file_path: &Path) -> Result<Vec<ParsedBankRecord>> {
        match self {
            Self::Normalized => parse_normalized(file_path),
            Self::Bank => parse_bank(file_path),
        }
    }
}

pub fn get_by_key(key: &str) -> Option<ImporterKind> {
    ALL_IMPORTERS.iter().find(|i| i.key() == key).copied()
}

pub fn get_for_file(file_path: &Path) -> Option<ImporterKind> {
    ALL_IMPORTERS.iter().find(|i| i.detect(file_path)).copied()
}

// ---------------------------------------------------------------------------
// import_file
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ImportResult {
    pub imported: usize,
    pub skipped: usize,
    pub duplicate_file: bool,
}

pub fn import_file(conn: &Connection, file_path: &Path, format_key: Option<&str>) -> Result<ImportResult> {
    let checksum = compute_checksum(file_path)?;
    {
        let mut stmt = conn.prepare("SELECT 1 FROM imports WHERE checksum = ?1")?;
        if stmt.exists([&checksum])? {
            return Ok(ImportResult {
                imported: 0,
                skipped: 0,
                duplicate_file: true,
            });
        }
    }

    let importer = match format_key {
        Some(key) => get_by_key(key).ok_or_else(|| PaymatchError::UnknownFormat(key.to_string()))?,
        None => get_for_file(file_path).ok_or_else(|| {
            PaymatchError::UnknownFormat(file_path.display().to_string())
        })?,
    };
    debug!(format = importer.key(), file = %file_path.display(), "importing deposits");

    let parsed_rows = importer.parse(file_path)?;

    let min_date = parsed_rows.iter().map(|r| r.date).min();
    let max_date = parsed_rows.iter().map(|r| r.date).max();
    conn.execute(
        "INSERT INTO imports (filename, record_count, date_range_start, date_range_end, checksum) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            file_path.file_name().and_then(|n| n.to_str()).unwrap_or(""),
            parsed_rows.len() as i64,
            min_date,
            max_date,
            checksum,
        ],
    )?;
    let import_id = conn.last_insert_rowid();

    let mut imported = 0usize;
    let mut skipped = 0usize;
    for row in &parsed_rows {
        if is_duplicate_row(conn, row, import_id)? {
            skipped += 1;
            continue;
        }
        conn.execute(
            "INSERT INTO bank_records (date, depositor, description, amount, balance, import_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![row.date, row.depositor, row.description, row.amount, row.balance, import_id],
        )?;
        imported += 1;
    }

    info!(imported, skipped, "deposit import finished");
    Ok(ImportResult {
        imported,
        skipped,
        duplicate_file: false,
    })
}

// ---------------------------------------------------------------------------
// Normalized CSV parser
// ---------------------------------------------------------------------------

const NORMALIZED_HEADER: [&str; 5] = ["date", "description", "depositor", "amount", "balance"];

fn detect_normalized(file_path: &Path) -> bool {
    let Ok(mut rdr) = reader(file_path, true) else {
        return false;
    };
    let Ok(headers) = rdr.headers() else {
        return false;
    };
    NORMALIZED_HEADER[..4]
        .iter()
        .all(|name| headers.iter().any(|h| h.eq_ignore_ascii_case(name)))
}

fn parse_normalized(file_path: &Path) -> Result<Vec<ParsedBankRecord>> {
    let mut rdr = reader(file_path, true)?;
    let headers = rdr.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    let (Some(idx_date), Some(idx_desc), Some(idx_depositor), Some(idx_amount)) =
        (column("date"), column("description"), column("depositor"), column("amount"))
    else {
        return Err(PaymatchError::UnknownFormat(format!(
            "{}: expected columns {}",
            file_path.display(),
            NORMALIZED_HEADER.join(",")
        )));
    };
    let idx_balance = column("balance");

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let field = |i: usize| record.get(i).unwrap_or("");
        if field(idx_date).is_empty() {
            continue;
        }
        let date = parse_date(field(idx_date))?;
        let amount = parse_amount(field(idx_amount))
            .ok_or_else(|| PaymatchError::InvalidAmount(field(idx_amount).to_string()))?;
        if amount <= 0 {
            continue;
        }
        rows.push(ParsedBankRecord {
            date,
            description: field(idx_desc).to_string(),
            depositor: field(idx_depositor).to_string(),
            amount,
            balance: idx_balance.and_then(|i| parse_amount(field(i))),
        });
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Bank history export parser
// ---------------------------------------------------------------------------

struct BankColumns {
    date: usize,
    description: Option<usize>,
    depositor: usize,
    credit: usize,
    balance: Option<usize>,
}

fn bank_columns(header: &csv::StringRecord) -> Option<BankColumns> {
    let find = |names: &[&str]| header.iter().position(|h| names.iter().any(|n| h.contains(n)));
    let date = find(&["거래일시", "거래일자", "거래일"])?;
    let depositor = find(&["기재내용", "의뢰인", "입금자", "보낸분", "내용"])?;
    let credit = header
        .iter()
        .position(|h| (h.contains("입금") && !h.contains("입금자")) || h.contains("맡기신"))?;
    Some(BankColumns {
        date,
        description: find(&["적요", "거래구분"]),
        depositor,
        credit,
        balance: find(&["잔액"]),
    })
}

/// Position of the header row and its column layout. Bank exports put a few
/// lines of account info above the table.
fn find_bank_header(file_path: &Path) -> Option<(usize, BankColumns)> {
    let mut rdr = reader(file_path, false).ok()?;
    rdr.records()
        .take(20)
        .enumerate()
        .filter_map(|(i, r)| r.ok().map(|r| (i, r)))
        .find_map(|(i, record)| bank_columns(&record).map(|cols| (i, cols)))
}

fn parse_bank(file_path: &Path) -> Result<Vec<ParsedBankRecord>> {
    let (header_row, cols) = find_bank_header(file_path).ok_or_else(|| {
        PaymatchError::UnknownFormat(format!("{}: no bank header row", file_path.display()))
    })?;
    let mut rdr = reader(file_path, false)?;
    let mut rows = Vec::new();

    for result in rdr.records().skip(header_row + 1) {
        let Ok(record) = result else { continue };
        let field = |i: usize| record.get(i).unwrap_or("");
        let Some(date) = parse_bank_date(field(cols.date)) else {
            continue;
        };
        let Some(amount) = parse_amount(field(cols.credit)).filter(|a| *a > 0) else {
            continue;
        };
        rows.push(ParsedBankRecord {
            date,
            description: cols.description.map(field).unwrap_or("").to_string(),
            depositor: field(cols.depositor).to_string(),
            amount,
            balance: cols.balance.and_then(|i| parse_amount(field(i))),
        });
    }
    Ok(rows)
}
