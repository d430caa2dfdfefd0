//! Shared HTTP client used by the PBX client and calendar feeds.

pub mod client;

pub use client::{HttpClient, HttpClientBuilder};
