//! Calendar resync: turns external calendar events into dated schedule
//! entries.

pub mod ports;
pub mod rules;
pub mod service;

pub use ports::{CalendarEvent, CalendarFeed};
pub use rules::status_for_summary;
pub use service::{CalendarSyncReport, CalendarSyncService};
