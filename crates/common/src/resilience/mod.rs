//! Resilience primitives for outbound calls.
//!
//! - **Request spacing**: a minimum interval between consecutive requests,
//!   shared by every client that holds a clone of the same [`RequestSpacer`].

pub mod rate_limiter;

pub use rate_limiter::RequestSpacer;
