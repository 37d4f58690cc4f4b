use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::models::mood::{Mood, MoodEntry};

/// Per-mood counts for one calendar day. Every mood of the catalogue is
/// present, zero-count ones included, in catalogue order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MoodCounts(BTreeMap<Mood, usize>);

impl MoodCounts {
    fn zeroed() -> Self {
        Self(Mood::ALL.into_iter().map(|m| (m, 0)).collect())
    }

    #[cfg(test)]
    pub fn get(&self, mood: Mood) -> usize {
        self.0.get(&mood).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (Mood, usize)> + '_ {
        self.0.iter().map(|(m, c)| (*m, *c))
    }
}

/// The calendar date of `now` in the dashboard's timezone.
pub fn local_date(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// Count entries per mood, keeping only those whose timestamp falls on
/// `reference_date` in `tz`.
pub fn aggregate(entries: &[MoodEntry], reference_date: NaiveDate, tz: Tz) -> MoodCounts {
    let mut counts = MoodCounts::zeroed();
    for entry in entries
        .iter()
        .filter(|e| local_date(e.timestamp, tz) == reference_date)
    {
        *counts.0.entry(entry.mood).or_insert(0) += 1;
    }
    counts
}
