//! Fetches iCalendar (RFC 5545) feeds over HTTP and extracts timed events.
//!
//! Only what resync needs is parsed: `VEVENT` blocks with `SUMMARY`,
//! `DTSTART` and `DTEND`. All-day events (`VALUE=DATE`) are skipped. Times
//! without a zone are read in the configured timezone, and so are unknown
//! `TZID`s.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use pbxpresence_core::{CalendarEvent, CalendarFeed};
use pbxpresence_domain::{PresenceError, Result};
use reqwest::Method;
use tracing::{debug, instrument};

use crate::http::HttpClient;

const CALENDAR_TIMEOUT: Duration = Duration::from_secs(30);
const ICS_DATE_TIME: &str = "%Y%m%dT%H%M%S";

/// [`CalendarFeed`] reading iCalendar documents over HTTP.
pub struct IcsCalendarFeed {
    http: HttpClient,
    timezone: Tz,
}

impl IcsCalendarFeed {
    pub fn new(timezone: Tz) -> Result<Self> {
        // Feeds are frequently served from intranet hosts with self-signed certs.
        let http = HttpClient::builder()
            .timeout(CALENDAR_TIMEOUT)
            .accept_invalid_certs(true)
            .build()?;
        Ok(Self { http, timezone })
    }
}

#[async_trait]
impl CalendarFeed for IcsCalendarFeed {
    #[instrument(skip_all)]
    async fn fetch_events(&self, url: &str) -> Result<Vec<CalendarEvent>> {
        let response = self.http.send(self.http.request(Method::GET, url)).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PresenceError::Transport(format!(
                "calendar feed returned HTTP {}",
                status.as_u16()
            )));
        }

        let body = response.text().await.map_err(|err| {
            PresenceError::Transport(format!("failed to read calendar feed: {err}"))
        })?;

        let events = parse_ics(&body, self.timezone);
        debug!(bytes = body.len(), events = events.len(), "calendar feed parsed");
        Ok(events)
    }
}

/// Extract timed events from an iCalendar document.
pub fn parse_ics(content: &str, timezone: Tz) -> Vec<CalendarEvent> {
    let mut events = Vec::new();
    let mut current: Option<EventBuilder> = None;

    for line in unfold(content) {
        let Some((name, params, value)) = split_property(&line) else {
            continue;
        };

        match name.as_str() {
            "BEGIN" if value.eq_ignore_ascii_case("VEVENT") => {
                current = Some(EventBuilder::default());
            }
            "END" if value.eq_ignore_ascii_case("VEVENT") => {
                if let Some(event) = current.take().and_then(EventBuilder::build) {
                    events.push(event);
                }
            }
            "SUMMARY" | "DTSTART" | "DTEND" => {
                if let Some(builder) = current.as_mut() {
                    builder.apply(&name, params, value, timezone);
                }
            }
            _ => {}
        }
    }

    events
}

#[derive(Default)]
struct EventBuilder {
    summary: Option<String>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

impl EventBuilder {
    fn apply(&mut self, name: &str, params: &str, value: &str, timezone: Tz) {
        match name {
            "SUMMARY" => self.summary = Some(unescape_text(value)),
            "DTSTART" => self.start = parse_date_time(params, value, timezone),
            "DTEND" => self.end = parse_date_time(params, value, timezone),
            _ => {}
        }
    }

    fn build(self) -> Option<CalendarEvent> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => {
                Some(CalendarEvent { summary: self.summary.unwrap_or_default(), start, end })
            }
            _ => None,
        }
    }
}

/// Join continuation lines (leading space or tab) onto the previous line.
fn unfold(content: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for raw in content.lines() {
        let raw = raw.trim_end_matches('\r');
        if let Some(rest) = raw.strip_prefix(|c: char| c == ' ' || c == '\t') {
            if let Some(previous) = lines.last_mut() {
                previous.push_str(rest);
                continue;
            }
        }
        lines.push(raw.to_string());
    }
    lines
}

/// `NAME;PARAM=V;...:VALUE` into upper-cased name, raw params and value.
fn split_property(line: &str) -> Option<(String, &str, &str)> {
    let mut in_quotes = false;
    let colon = line.char_indices().find_map(|(idx, ch)| match ch {
        '"' => {
            in_quotes = !in_quotes;
            None
        }
        ':' if !in_quotes => Some(idx),
        _ => None,
    })?;

    let (head, value) = (&line[..colon], &line[colon + 1..]);
    let (name, params) = head.split_once(';').unwrap_or((head, ""));
    Some((name.trim().to_ascii_uppercase(), params, value.trim()))
}

fn param<'a>(params: &'a str, key: &str) -> Option<&'a str> {
    params.split(';').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        k.trim().eq_ignore_ascii_case(key).then(|| v.trim().trim_matches('"'))
    })
}

fn parse_date_time(params: &str, value: &str, fallback: Tz) -> Option<DateTime<Utc>> {
    if param(params, "VALUE").is_some_and(|v| v.eq_ignore_ascii_case("DATE")) {
        return None;
    }

    if let Some(utc) = value.strip_suffix('Z') {
        let naive = NaiveDateTime::parse_from_str(utc, ICS_DATE_TIME).ok()?;
        return Some(Utc.from_utc_datetime(&naive));
    }

    let naive = NaiveDateTime::parse_from_str(value, ICS_DATE_TIME).ok()?;
    let tz = param(params, "TZID").and_then(|id| id.parse::<Tz>().ok()).unwrap_or(fallback);
    tz.from_local_datetime(&naive).earliest().map(|local| local.with_timezone(&Utc))
}

fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
