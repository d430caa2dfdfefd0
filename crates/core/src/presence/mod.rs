//! Presence resolution and manual actions.

pub mod ports;
pub mod resolver;
pub mod service;

pub use resolver::PresenceResolver;
pub use service::PresenceService;
