//! Adapters for external services other than the PBX.

pub mod calendar;
