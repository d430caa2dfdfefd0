//! Client for the PBX OpenAPI (token auth, extension search and update).

pub mod client;
pub mod errors;
pub mod token;
pub mod types;

pub use client::{PbxClient, PbxClientConfig};
pub use errors::PbxApiError;
pub use token::TokenState;
