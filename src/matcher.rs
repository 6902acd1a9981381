use std::collections::HashSet;

use chrono::Datelike;

use crate::models::{BankRecord, MatchKind, MatchResult, Transaction};
use crate::names::names_match;

/// Whether `record` can pay `txn` on its own: same amount, same year as the
/// order, not dated before the order, and paid under the client's name.
pub fn is_single_candidate(txn: &Transaction, record: &BankRecord) -> bool {
    if record.amount != txn.amount {
        return false;
    }
    if let Some(ordered) = txn.order_date {
        if ordered.year() != record.date.year() || ordered > record.date {
            return false;
        }
    }
    match txn.client_name() {
        Some(name) => names_match(name, &record.depositor),
        None => false,
    }
}

/// Pair deposits with single orders, first fit in input order.
///
/// Each deposit and each order appears in at most one result. The first
/// eligible deposit wins even if a later one would fit better.
pub fn single_match(transactions: &[Transaction], records: &[BankRecord]) -> Vec<MatchResult> {
    let mut used: HashSet<i64> = HashSet::new();
    let mut matches = Vec::new();

    for txn in transactions.iter().filter(|t| t.is_outstanding()) {
        let hit = records
            .iter()
            .filter(|r| !r.is_matched && !used.contains(&r.id))
            .find(|r| is_single_candidate(txn, r));
        if let Some(record) = hit {
            used.insert(record.id);
            matches.push(MatchResult {
                transaction: txn.clone(),
                record: record.clone(),
                kind: MatchKind::Exact,
            });
        }
    }
    matches
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::NaiveDate;

    use crate::models::{BankRecord, Client, Pricing, Transaction};

    pub fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    pub fn client(id: i64, name: &str, parent_id: Option<i64>) -> Client {
        Client {
            id,
            name: name.to_string(),
            parent_id,
            contact: None,
        }
    }

    pub fn order(id: i64, client: Option<&Client>, amount: i64, ordered: Option<&str>) -> Transaction {
        let mut txn = Transaction::new(id, "order", Pricing::vat_exempt(amount), ordered.map(date));
        txn.client_id = client.map(|c| c.id);
        txn.client = client.cloned();
        txn
    }

    pub fn deposit(id: i64, depositor: &str, amount: i64, on: &str) -> BankRecord {
        BankRecord {
            id,
            date: date(on),
            depositor: depositor.to_string(),
            description: "입금".to_string(),
            amount,
            balance: None,
            is_matched: false,
        }
    }
}
