use thiserror::Error;

use crate::manual::ManualMatchError;

#[derive(Error, Debug)]
pub enum PaymatchError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{0}")]
    Manual(#[from] ManualMatchError),

    #[error("Unknown client: {0}")]
    UnknownClient(String),

    #[error("Unknown order: {0}")]
    UnknownTransaction(i64),

    #[error("Unknown deposit: {0}")]
    UnknownRecord(i64),

    #[error("Unknown status: {0}")]
    UnknownStatus(String),

    #[error("Invalid date (expected YYYY-MM-DD): {0}")]
    InvalidDate(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    #[error("Client {client_id} has parent {parent_id}, which is itself a sub-client")]
    HierarchyTooDeep { client_id: i64, parent_id: i64 },

    #[error("Client {client_id} refers to missing parent {parent_id}")]
    UnknownParent { client_id: i64, parent_id: i64 },

    #[error("Client {0} lists itself as its parent")]
    SelfParent(i64),

    #[error("Cannot change order {id} from {from} to {to}")]
    InvalidStatusChange { id: i64, from: String, to: String },

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, PaymatchError>;
