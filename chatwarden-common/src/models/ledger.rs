// File: chatwarden-common/src/models/ledger.rs

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One scoring event. Never mutated once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub timestamp: NaiveDateTime,
    pub user: String,
    pub message: String,
    pub score: f64,
}

/// Per-user total derived from a ledger scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreAggregate {
    pub user: String,
    pub total: f64,
}
