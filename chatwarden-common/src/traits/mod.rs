// File: chatwarden-common/src/traits/mod.rs
pub mod transport_traits;
pub mod classifier_traits;
pub mod ledger_traits;

pub use transport_traits::ChatTransport;
pub use classifier_traits::Classifier;
pub use ledger_traits::LedgerStore;
