use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{PaymatchError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    pub contact: Option<String>,
}

/// Order lifecycle. `Completed` and `Card` are the two paid states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Quote,
    Design,
    Production,
    Completed,
    Card,
}

impl TransactionStatus {
    pub const ALL: [TransactionStatus; 5] = [
        Self::Quote,
        Self::Design,
        Self::Production,
        Self::Completed,
        Self::Card,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quote => "quote",
            Self::Design => "design",
            Self::Production => "production",
            Self::Completed => "completed",
            Self::Card => "card",
        }
    }

    pub fn is_paid(&self) -> bool {
        matches!(self, Self::Completed | Self::Card)
    }

    /// Next step in the normal progression. Paid states are terminal.
    pub fn next(&self) -> Option<TransactionStatus> {
        match self {
            Self::Quote => Some(Self::Design),
            Self::Design => Some(Self::Production),
            Self::Production => Some(Self::Completed),
            Self::Completed | Self::Card => None,
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = PaymatchError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .find(|st| st.as_str() == s.trim().to_lowercase())
            .copied()
            .ok_or_else(|| PaymatchError::UnknownStatus(s.to_string()))
    }
}

/// Net supply price and VAT for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pricing {
    pub supply: i64,
    pub vat: i64,
}

impl Pricing {
    /// VAT is `rate_percent` of the supply price, truncated.
    pub fn from_supply(supply: i64, rate_percent: u32) -> Result<Self> {
        let vat = supply
            .checked_mul(i64::from(rate_percent))
            .map(|v| v / 100)
            .ok_or_else(|| PaymatchError::InvalidAmount(supply.to_string()))?;
        Self::checked(supply, vat)
    }

    /// Split a VAT-inclusive total, rounding the supply price half-up.
    pub fn from_total(total: i64, rate_percent: u32) -> Result<Self> {
        let divisor = 100 + i64::from(rate_percent);
        let supply = total
            .checked_mul(100)
            .and_then(|v| v.checked_add(divisor / 2))
            .map(|v| v / divisor)
            .ok_or_else(|| PaymatchError::InvalidAmount(total.to_string()))?;
        Self::checked(supply, total - supply)
    }

    fn checked(supply: i64, vat: i64) -> Result<Self> {
        supply
            .checked_add(vat)
            .ok_or_else(|| PaymatchError::InvalidAmount(supply.to_string()))?;
        Ok(Self { supply, vat })
    }

    pub fn vat_exempt(total: i64) -> Self {
        Self { supply: total, vat: 0 }
    }

    pub fn total(&self) -> i64 {
        self.supply + self.vat
    }
}

/// An order. `amount` is the VAT-inclusive total in the smallest currency unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub id: i64,
    pub client_id: Option<i64>,
    pub client: Option<Client>,
    pub title: String,
    pub supply_amount: i64,
    pub vat_amount: i64,
    pub amount: i64,
    pub status: TransactionStatus,
    pub order_date: Option<NaiveDate>,
    pub paid_at: Option<NaiveDate>,
}

impl Transaction {
    #[cfg(test)]
    pub fn new(id: i64, title: &str, pricing: Pricing, order_date: Option<NaiveDate>) -> Self {
        Self {
            id,
            client_id: None,
            client: None,
            title: title.to_string(),
            supply_amount: pricing.supply,
            vat_amount: pricing.vat,
            amount: pricing.total(),
            status: TransactionStatus::Quote,
            order_date,
            paid_at: None,
        }
    }

    pub fn is_outstanding(&self) -> bool {
        !self.status.is_paid() && self.paid_at.is_none()
    }

    pub fn client_name(&self) -> Option<&str> {
        self.client
            .as_ref()
            .map(|c| c.name.as_str())
            .filter(|name| !name.is_empty())
    }

    /// Move one step along quote -> design -> production. Reaching a paid
    /// state needs a date, so that goes through [`Transaction::mark_paid`].
    pub fn advance(&mut self) -> Result<TransactionStatus> {
        match self.status.next() {
            Some(next) if !next.is_paid() => {
                self.status = next;
                Ok(next)
            }
            Some(next) => Err(self.invalid_change(next)),
            None => Err(PaymatchError::InvalidStatusChange {
                id: self.id,
                from: self.status.to_string(),
                to: "-".to_string(),
            }),
        }
    }

    pub fn mark_paid(&mut self, status: TransactionStatus, paid_at: NaiveDate) -> Result<()> {
        if !status.is_paid() || !self.is_outstanding() {
            return Err(self.invalid_change(status));
        }
        self.status = status;
        self.paid_at = Some(paid_at);
        Ok(())
    }

    fn invalid_change(&self, to: TransactionStatus) -> PaymatchError {
        PaymatchError::InvalidStatusChange {
            id: self.id,
            from: self.status.to_string(),
            to: to.to_string(),
        }
    }
}

/// A stored credit line from a bank statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BankRecord {
    pub id: i64,
    pub date: NaiveDate,
    pub depositor: String,
    pub description: String,
    pub amount: i64,
    pub balance: Option<i64>,
    pub is_matched: bool,
}

/// Deposit row as produced by an importer, before it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedBankRecord {
    pub date: NaiveDate,
    pub description: String,
    pub depositor: String,
    pub amount: i64,
    pub balance: Option<i64>,
}

#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Exact,
    /// Reserved. No matching path produces it.
    Partial,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub transaction: Transaction,
    pub record: BankRecord,
    pub kind: MatchKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupMatchResult {
    pub transactions: Vec<Transaction>,
    pub record: BankRecord,
    pub client_name: String,
    pub total: i64,
}

pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| PaymatchError::InvalidDate(raw.to_string()))
}
