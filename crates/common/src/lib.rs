//! Modular common utilities shared across the pbxpresence crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: error types and the wall-clock abstraction
//! - `runtime`: async primitives (request spacing for outbound calls)
//! - `crypto`: AES-256-GCM encryption for secrets at rest

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod error;
#[cfg(feature = "foundation")]
pub mod time;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod resilience;

// Crypto tier
// ---------------------------------------------------------------------
#[cfg(feature = "crypto")]
pub mod crypto;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "crypto")]
pub use crypto::EncryptionService;
#[cfg(feature = "foundation")]
pub use error::{CommonError, CommonResult};
#[cfg(feature = "runtime")]
pub use resilience::RequestSpacer;
#[cfg(feature = "foundation")]
pub use time::{Clock, MockClock, SystemClock};
