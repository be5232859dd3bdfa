// File: chatwarden-common/src/models/mod.rs
pub mod message;
pub mod verdict;
pub mod ledger;

pub use message::{RawMessage, SessionHandle, TransportSource};
pub use verdict::{ModerationReason, PassKind, Verdict};
pub use ledger::{LedgerEntry, ScoreAggregate};
