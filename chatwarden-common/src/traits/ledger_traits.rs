use async_trait::async_trait;

use crate::error::Error;
use crate::models::LedgerEntry;

/// Append-only score log.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn append(&self, entry: &LedgerEntry) -> Result<(), Error>;

    /// Snapshot of every entry in append order.
    async fn entries(&self) -> Result<Vec<LedgerEntry>, Error>;
}
