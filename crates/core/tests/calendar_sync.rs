//! Calendar resync into dated schedule entries.

mod support;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Weekday};
use chrono_tz::Europe::Paris;
use pbxpresence_core::{CalendarEvent, CalendarFeed, CalendarSyncService};
use pbxpresence_domain::{PresenceError, PresenceStatus, Result, ScheduleSlot, ScheduleSource};
use support::*;

/// Feed answering from a fixed map of URL to events.
#[derive(Default)]
struct StaticFeed {
    feeds: HashMap<String, Vec<CalendarEvent>>,
}

impl StaticFeed {
    fn with(mut self, url: &str, events: Vec<CalendarEvent>) -> Self {
        self.feeds.insert(url.to_string(), events);
        self
    }
}

#[async_trait]
impl CalendarFeed for StaticFeed {
    async fn fetch_events(&self, url: &str) -> Result<Vec<CalendarEvent>> {
        self.feeds
            .get(url)
            .cloned()
            .ok_or_else(|| PresenceError::Transport(format!("404 for {url}")))
    }
}

fn event(summary: &str, start: chrono::DateTime<chrono::Utc>, minutes: i64) -> CalendarEvent {
    CalendarEvent { summary: summary.into(), start, end: start + Duration::minutes(minutes) }
}

fn with_calendar(id: i64, url: &str) -> pbxpresence_domain::Extension {
    let mut ext = extension(id);
    ext.calendar_url = Some(url.into());
    ext
}

fn service(store: &InMemoryStore, feed: StaticFeed) -> CalendarSyncService {
    let shared = Arc::new(store.clone());
    CalendarSyncService::new(Arc::new(feed), shared.clone(), shared, Paris)
}

#[tokio::test]
async fn events_become_dated_calendar_entries_in_local_time() {
    let now = monday_at(8, 0);
    let store = InMemoryStore::default().with_extension(with_calendar(1, "https://cal/a"));
    let feed = StaticFeed::default()
        .with("https://cal/a", vec![event("Cours : Réseaux", paris(2024, 1, 3, 9, 0), 120)]);

    let written = service(&store, feed)
        .sync_extension(&store.extension(1).unwrap(), now)
        .await
        .unwrap();

    assert_eq!(written, 1);
    let entries = store.schedule();
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.slot, ScheduleSlot::Date(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()));
    assert_eq!(entry.start_time, wall("09:00"));
    assert_eq!(entry.end_time, wall("11:00"));
    assert_eq!(entry.status, PresenceStatus::Lunch);
    assert_eq!(entry.source, ScheduleSource::Calendar);
    assert_eq!(store.extension(1).unwrap().last_calendar_sync_at, Some(now));
}

#[tokio::test]
async fn past_and_far_future_events_are_dropped() {
    let now = monday_at(8, 0);
    let store = InMemoryStore::default().with_extension(with_calendar(1, "https://cal/a"));
    let feed = StaticFeed::default().with(
        "https://cal/a",
        vec![
            event("Formation", now - Duration::days(2), 60),
            event("Formation", now + Duration::days(45), 60),
            event("Réunion", now - Duration::minutes(30), 60),
        ],
    );

    let written = service(&store, feed)
        .sync_extension(&store.extension(1).unwrap(), now)
        .await
        .unwrap();

    assert_eq!(written, 1);
    assert_eq!(store.schedule()[0].status, PresenceStatus::DoNotDisturb);
}

#[tokio::test]
async fn resync_replaces_only_calendar_entries() {
    let now = monday_at(8, 0);
    let store = InMemoryStore::default()
        .with_extension(with_calendar(1, "https://cal/a"))
        .with_entry(recurring(1, 1, Weekday::Mon, "09:00", "17:00", PresenceStatus::Available));
    let feed = StaticFeed::default().with(
        "https://cal/a",
        vec![event("Serv : accueil", paris(2024, 1, 2, 14, 0), 60)],
    );
    let svc = service(&store, feed);
    let ext = store.extension(1).unwrap();

    svc.sync_extension(&ext, now).await.unwrap();
    svc.sync_extension(&ext, now).await.unwrap();

    let entries = store.schedule();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries.iter().filter(|e| e.source == ScheduleSource::Calendar).count(), 1);
    assert_eq!(entries.iter().filter(|e| e.source == ScheduleSource::Manual).count(), 1);
}

#[tokio::test]
async fn extension_without_url_is_rejected() {
    let store = InMemoryStore::default().with_extension(extension(1));
    let svc = service(&store, StaticFeed::default());

    let err = svc.sync_extension(&store.extension(1).unwrap(), monday_at(8, 0)).await.unwrap_err();

    assert!(matches!(err, PresenceError::InvalidInput(_)));
}

#[tokio::test]
async fn sync_all_counts_failures_without_propagating() {
    let now = monday_at(8, 0);
    let store = InMemoryStore::default()
        .with_extension(with_calendar(1, "https://cal/a"))
        .with_extension(with_calendar(2, "https://cal/missing"))
        .with_extension(extension(3));
    let feed = StaticFeed::default().with(
        "https://cal/a",
        vec![event("Formation SST", paris(2024, 1, 4, 9, 0), 480)],
    );

    let report = service(&store, feed).sync_all(now).await.unwrap();

    assert_eq!((report.synced, report.failed, report.entries), (1, 1, 1));
    assert_eq!(store.schedule()[0].status, PresenceStatus::BusinessTrip);
}
