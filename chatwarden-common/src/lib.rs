// File: chatwarden-common/src/lib.rs

pub mod error;
pub mod http;
pub mod models;
pub mod traits;
pub mod test_utils;

pub use error::Error;
pub use http::{DefaultHttpClient, HttpClient, HttpResponse};
