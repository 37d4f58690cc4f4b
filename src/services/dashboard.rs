//! The read/aggregate/render cycle and the write path.
//!
//! Refresh cycles hold the cache lock from lookup to aggregation, so at most
//! one cycle runs at a time; a tick that arrives mid-cycle waits for it.
//! Submissions go straight to the store and never touch the cache, so a new
//! entry shows up once the freshness window has lapsed or after a manual
//! refresh.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::cache::MoodCache;
use crate::error::AppResult;
use crate::models::mood::MoodEntry;
use crate::services::aggregate::{aggregate, local_date, MoodCounts};
use crate::store::MoodStore;

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshTrigger {
    Tick,
    PageLoad,
    Api,
    Manual,
    Probe,
}

/// Today's chart data as of the most recent cache refresh.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub date: NaiveDate,
    pub timezone: String,
    pub total: usize,
    pub counts: MoodCounts,
    /// When the underlying snapshot was read from the store.
    pub as_of: DateTime<Utc>,
}

pub struct Dashboard {
    store: Arc<dyn MoodStore>,
    cache: Mutex<MoodCache>,
    timezone: Tz,
    refresh_interval: Duration,
    events: broadcast::Sender<String>,
}

impl Dashboard {
    pub fn new(
        store: Arc<dyn MoodStore>,
        cache_ttl: Duration,
        timezone: Tz,
        refresh_interval: Duration,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            cache: Mutex::new(MoodCache::new(store.clone(), cache_ttl)),
            store,
            timezone,
            refresh_interval,
            events,
        }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }

    /// Live feed of `dashboard_refreshed` and `entry_logged` events as JSON.
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.events.subscribe()
    }

    /// One cycle: cached read, filter to today, count. A manual refresh
    /// skips the freshness check and goes to the store. Only scheduled and
    /// manual cycles are broadcast; page loads and probes stay quiet.
    pub async fn refresh(&self, trigger: RefreshTrigger) -> AppResult<DashboardView> {
        let mut cache = self.cache.lock().await;
        let entries = match trigger {
            RefreshTrigger::Manual => cache.refresh().await?,
            _ => cache.get().await?,
        };

        let now = Utc::now();
        let as_of = cache
            .age()
            .and_then(|age| chrono::Duration::from_std(age).ok())
            .map_or(now, |age| now - age);
        drop(cache);

        let date = local_date(now, self.timezone);
        let counts = aggregate(&entries, date, self.timezone);
        let view = DashboardView {
            date,
            timezone: self.timezone.name().to_string(),
            total: counts.total(),
            counts,
            as_of,
        };

        tracing::debug!(
            trigger = ?trigger,
            date = %view.date,
            total = view.total,
            "Dashboard refreshed"
        );

        if matches!(trigger, RefreshTrigger::Tick | RefreshTrigger::Manual) {
            self.publish(serde_json::json!({
                "type": "dashboard_refreshed",
                "view": view,
            }));
        }

        Ok(view)
    }

    /// Validate and append one entry, bypassing the cache.
    pub async fn submit(&self, mood: Option<&str>, note: Option<&str>) -> AppResult<MoodEntry> {
        let entry = MoodEntry::from_input(Utc::now(), mood, note)?;
        self.store.append_entry(&entry).await?;

        tracing::info!(
            mood = %entry.mood,
            note_chars = entry.note.chars().count(),
            "Mood logged"
        );

        self.publish(serde_json::json!({
            "type": "entry_logged",
            "mood": entry.mood,
            "timestamp": entry.timestamp,
        }));

        Ok(entry)
    }

    fn publish(&self, event: serde_json::Value) {
        // No subscribers is fine.
        let _ = self.events.send(event.to_string());
    }
}

/// Run a refresh cycle on every tick of the fixed interval.
pub fn spawn_refresh_worker(dashboard: Arc<Dashboard>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(dashboard.refresh_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if let Err(e) = dashboard.refresh(RefreshTrigger::Tick).await {
                tracing::warn!(error = %e, "Scheduled dashboard refresh failed");
            }
        }
    })
}
