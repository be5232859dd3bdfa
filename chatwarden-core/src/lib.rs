// src/lib.rs

pub mod config;
pub mod counters;
pub mod dedup;
pub mod eventbus;
pub mod ledger;
pub mod meaningful;
pub mod memory;
pub mod novelty;
pub mod pipeline;
pub mod platforms;
pub mod responder;
pub mod tasks;

pub use chatwarden_common::error::Error;
pub use chatwarden_common::http::{DefaultHttpClient, HttpClient};
