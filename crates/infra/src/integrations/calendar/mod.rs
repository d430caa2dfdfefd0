//! iCalendar feed adapter used by calendar resync.

pub mod ics_feed;

pub use ics_feed::{parse_ics, IcsCalendarFeed};
