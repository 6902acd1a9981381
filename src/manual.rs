use std::collections::{BTreeSet, HashMap};

use chrono::Datelike;
use thiserror::Error;

use crate::hierarchy::ClientTree;
use crate::models::{BankRecord, GroupMatchResult, Transaction};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ManualMatchError {
    #[error("Select a deposit first")]
    NoRecordSelected,

    #[error("Deposit {0} is not waiting to be matched")]
    UnknownRecord(i64),

    #[error("Order {0} cannot be paid by the selected deposit")]
    NotEligible(i64),

    #[error("Select at least two orders (selected {0})")]
    TooFewTransactions(usize),

    #[error("Selected orders do not add up to the deposit (difference {variance:+})")]
    AmountMismatch { variance: i64 },

    #[error("Deposit {0} has no confirmed group match")]
    NotConfirmed(i64),
}

/// Operator-driven split matching for deposits the automatic passes left
/// over. Confirmed matches stay cancellable until the caller applies them.
#[derive(Debug)]
pub struct ManualSession {
    records: Vec<BankRecord>,
    transactions: Vec<Transaction>,
    group_names: HashMap<i64, String>,
    taken_records: BTreeSet<i64>,
    taken_transactions: BTreeSet<i64>,
    accepted: Vec<GroupMatchResult>,
    selected_record: Option<i64>,
    selected: Vec<i64>,
}

impl ManualSession {
    pub fn new(records: Vec<BankRecord>, transactions: Vec<Transaction>, tree: &ClientTree) -> Self {
        let records: Vec<BankRecord> = records.into_iter().filter(|r| !r.is_matched).collect();
        let transactions: Vec<Transaction> =
            transactions.into_iter().filter(|t| t.is_outstanding()).collect();
        let group_names = transactions
            .iter()
            .filter_map(|t| {
                let client_id = t.client_id?;
                let name = tree
                    .display_name(client_id)
                    .or_else(|| t.client_name())?;
                Some((t.id, name.to_string()))
            })
            .collect();

        Self {
            records,
            transactions,
            group_names,
            taken_records: BTreeSet::new(),
            taken_transactions: BTreeSet::new(),
            accepted: Vec::new(),
            selected_record: None,
            selected: Vec::new(),
        }
    }

    pub fn unmatched_records(&self) -> impl Iterator<Item = &BankRecord> {
        self.records
            .iter()
            .filter(|r| !self.taken_records.contains(&r.id))
    }

    pub fn unmatched_transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions
            .iter()
            .filter(|t| !self.taken_transactions.contains(&t.id))
    }

    /// Pick the deposit to split. Clears any previous order selection.
    pub fn select_record(&mut self, record_id: i64) -> Result<&BankRecord, ManualMatchError> {
        if !self.unmatched_records().any(|r| r.id == record_id) {
            return Err(ManualMatchError::UnknownRecord(record_id));
        }
        self.selected_record = Some(record_id);
        self.selected.clear();
        self.selected_record()
            .ok_or(ManualMatchError::UnknownRecord(record_id))
    }

    pub fn selected_record(&self) -> Option<&BankRecord> {
        let id = self.selected_record?;
        self.records.iter().find(|r| r.id == id)
    }

    /// Orders the selected deposit could pay: undated, or ordered in the
    /// deposit's year on or before the deposit date.
    pub fn eligible_transactions(&self) -> Vec<&Transaction> {
        let Some(record) = self.selected_record() else {
            return Vec::new();
        };
        self.unmatched_transactions()
            .filter(|t| match t.order_date {
                None => true,
                Some(ordered) => ordered.year() == record.date.year() && ordered <= record.date,
            })
            .collect()
    }

    /// Add or remove an order from the selection. Returns whether it is now
    /// selected.
    pub fn toggle_transaction(&mut self, transaction_id: i64) -> Result<bool, ManualMatchError> {
        if self.selected_record.is_none() {
            return Err(ManualMatchError::NoRecordSelected);
        }
        if let Some(pos) = self.selected.iter().position(|&id| id == transaction_id) {
            self.selected.remove(pos);
            return Ok(false);
        }
        if !self.eligible_transactions().iter().any(|t| t.id == transaction_id) {
            return Err(ManualMatchError::NotEligible(transaction_id));
        }
        self.selected.push(transaction_id);
        Ok(true)
    }

    pub fn selection(&self) -> Vec<&Transaction> {
        self.selected
            .iter()
            .filter_map(|id| self.transactions.iter().find(|t| t.id == *id))
            .collect()
    }

    pub fn selection_sum(&self) -> i64 {
        self.selection().iter().map(|t| t.amount).sum()
    }

    /// Selected total minus the deposit amount; negative means short.
    pub fn variance(&self) -> Option<i64> {
        self.selected_record()
            .map(|r| self.selection_sum() - r.amount)
    }

    pub fn can_confirm(&self) -> bool {
        self.selected.len() >= 2 && self.variance() == Some(0)
    }

    pub fn confirm(&mut self) -> Result<GroupMatchResult, ManualMatchError> {
        let record = self
            .selected_record()
            .cloned()
            .ok_or(ManualMatchError::NoRecordSelected)?;
        if self.selected.len() < 2 {
            return Err(ManualMatchError::TooFewTransactions(self.selected.len()));
        }
        let variance = self.selection_sum() - record.amount;
        if variance != 0 {
            return Err(ManualMatchError::AmountMismatch { variance });
        }

        let transactions: Vec<Transaction> = self.selection().into_iter().cloned().collect();
        let client_name = transactions
            .iter()
            .find_map(|t| self.group_names.get(&t.id).cloned())
            .unwrap_or_else(|| record.depositor.clone());
        let result = GroupMatchResult {
            transactions,
            total: record.amount,
            client_name,
            record,
        };

        self.taken_records.insert(result.record.id);
        self.taken_transactions
            .extend(result.transactions.iter().map(|t| t.id));
        self.selected_record = None;
        self.selected.clear();
        self.accepted.push(result.clone());
        Ok(result)
    }

    /// Undo a confirmed match, returning its deposit and orders to the pools.
    pub fn cancel(&mut self, record_id: i64) -> Result<GroupMatchResult, ManualMatchError> {
        let pos = self
            .accepted
            .iter()
            .position(|g| g.record.id == record_id)
            .ok_or(ManualMatchError::NotConfirmed(record_id))?;
        let removed = self.accepted.remove(pos);
        self.taken_records.remove(&removed.record.id);
        for t in &removed.transactions {
            self.taken_transactions.remove(&t.id);
        }
        Ok(removed)
    }

    pub fn accepted(&self) -> &[GroupMatchResult] {
        &self.accepted
    }
}
