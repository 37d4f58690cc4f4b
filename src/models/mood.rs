use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Longest note accepted with an entry, in characters.
pub const NOTE_MAX_CHARS: usize = 120;

/// The fixed mood catalogue. Declaration order is the chart's x-axis order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Mood {
    Delighted,
    Satisfied,
    Neutral,
    Frustrated,
    Angry,
}

impl Mood {
    pub const ALL: [Mood; 5] = [
        Mood::Delighted,
        Mood::Satisfied,
        Mood::Neutral,
        Mood::Frustrated,
        Mood::Angry,
    ];

    pub fn emoji(self) -> &'static str {
        match self {
            Mood::Delighted => "😄",
            Mood::Satisfied => "🙂",
            Mood::Neutral => "😐",
            Mood::Frustrated => "😕",
            Mood::Angry => "😠",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mood::Delighted => "Delighted",
            Mood::Satisfied => "Satisfied",
            Mood::Neutral => "Neutral",
            Mood::Frustrated => "Frustrated",
            Mood::Angry => "Angry",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.emoji())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown mood: {0}")]
pub struct UnknownMood(pub String);

/// Accepts the emoji (as stored in the sheet) or the label, case-insensitively.
impl FromStr for Mood {
    type Err = UnknownMood;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Mood::ALL
            .into_iter()
            .find(|m| m.emoji() == s || m.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownMood(s.to_string()))
    }
}

impl TryFrom<String> for Mood {
    type Error = UnknownMood;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Mood> for String {
    fn from(mood: Mood) -> Self {
        mood.emoji().to_string()
    }
}

/// Catalogue item served to the UI (legend and selector).
#[derive(Debug, Clone, Serialize)]
pub struct MoodOption {
    pub emoji: &'static str,
    pub label: &'static str,
}

impl From<Mood> for MoodOption {
    fn from(mood: Mood) -> Self {
        Self {
            emoji: mood.emoji(),
            label: mood.label(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntryError {
    #[error("Please pick a mood first.")]
    MissingMood,

    #[error(transparent)]
    UnknownMood(#[from] UnknownMood),

    #[error("Note must be at most 120 characters (got {0})")]
    NoteTooLong(usize),
}

/// One logged ticket mood. Entries are append-only; nothing mutates them
/// after they are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodEntry {
    pub timestamp: DateTime<Utc>,
    pub mood: Mood,
    pub note: String,
}

impl MoodEntry {
    /// Build a validated entry. The note is trimmed and then rejected if it
    /// exceeds [`NOTE_MAX_CHARS`].
    pub fn new(timestamp: DateTime<Utc>, mood: Mood, note: &str) -> Result<Self, EntryError> {
        let note = note.trim();
        let len = note.chars().count();
        if len > NOTE_MAX_CHARS {
            return Err(EntryError::NoteTooLong(len));
        }
        Ok(Self {
            timestamp,
            mood,
            note: note.to_string(),
        })
    }

    /// Parse the optional raw selector value and note coming from a form or
    /// JSON body.
    pub fn from_input(
        timestamp: DateTime<Utc>,
        mood: Option<&str>,
        note: Option<&str>,
    ) -> Result<Self, EntryError> {
        let mood = match mood.map(str::trim) {
            None | Some("") => return Err(EntryError::MissingMood),
            Some(raw) => raw.parse::<Mood>()?,
        };
        Self::new(timestamp, mood, note.unwrap_or_default())
    }

    /// Row layout of the backing sheet: timestamp, mood, note.
    pub fn to_row(&self) -> [String; 3] {
        [
            self.timestamp.to_rfc3339(),
            self.mood.emoji().to_string(),
            self.note.clone(),
        ]
    }
}
