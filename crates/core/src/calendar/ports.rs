//! Calendar feed port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pbxpresence_domain::Result;
use serde::{Deserialize, Serialize};

/// One timed event from a calendar feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub summary: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Supplier of calendar events for a feed URL.
#[async_trait]
pub trait CalendarFeed: Send + Sync {
    async fn fetch_events(&self, url: &str) -> Result<Vec<CalendarEvent>>;
}
