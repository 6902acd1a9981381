use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::group::{group_match, Consumed};
use crate::hierarchy::ClientTree;
use crate::matcher::single_match;
use crate::models::{BankRecord, Client, GroupMatchResult, MatchResult, Transaction};

/// Proposed matches from one run. Nothing here is applied yet.
#[derive(Debug, Default, Serialize)]
pub struct Reconciliation {
    pub matches: Vec<MatchResult>,
    pub group_matches: Vec<GroupMatchResult>,
    #[serde(skip)]
    pub consumed: Consumed,
}

impl Reconciliation {
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty() && self.group_matches.is_empty()
    }

    /// Deposits no pass used, in input order.
    pub fn leftover_records(&self, records: &[BankRecord]) -> Vec<BankRecord> {
        records
            .iter()
            .filter(|r| !r.is_matched && !self.consumed.has_record(r.id))
            .cloned()
            .collect()
    }

    /// Outstanding orders no pass used, in input order.
    pub fn leftover_transactions(&self, transactions: &[Transaction]) -> Vec<Transaction> {
        transactions
            .iter()
            .filter(|t| t.is_outstanding() && !self.consumed.has_transaction(t.id))
            .cloned()
            .collect()
    }
}

/// Run the single pass, then the group pass over what it left.
pub fn reconcile(
    clients: &[Client],
    transactions: &[Transaction],
    records: &[BankRecord],
) -> Result<Reconciliation> {
    let tree = ClientTree::build(clients)?;

    let matches = single_match(transactions, records);
    let pass = group_match(transactions, records, &tree, &Consumed::from_matches(&matches));

    info!(
        orders = transactions.len(),
        deposits = records.len(),
        single = matches.len(),
        group = pass.matches.len(),
        "reconciliation run"
    );

    Ok(Reconciliation {
        matches,
        group_matches: pass.matches,
        consumed: pass.consumed,
    })
}
