//! Request/response shapes for the HTTP surface.
//!
//! `SubmitMoodRequest` is shared by the HTML form (`POST /submit`) and the
//! JSON API (`POST /api/moods`), so both paths reject the same input.

use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::error::AppError;
use crate::models::mood::NOTE_MAX_CHARS;

/// POST /submit (form) and POST /api/moods (JSON)
#[derive(Debug, Default, Deserialize, Validate)]
pub struct SubmitMoodRequest {
    /// Emoji or label from the fixed mood set
    #[validate(required(message = "Please pick a mood first."))]
    pub mood: Option<String>,

    /// Optional free-text note
    #[validate(custom = "validate_note")]
    pub note: Option<String>,
}

impl SubmitMoodRequest {
    /// Run the derive validations and turn the first failure into a
    /// user-facing message. Mood problems are reported before note problems.
    pub fn check(&self) -> Result<(), AppError> {
        self.validate().map_err(|errors| {
            let fields = errors.field_errors();
            let message = ["mood", "note"]
                .iter()
                .filter_map(|field| fields.get(field))
                .flat_map(|errs| errs.iter())
                .find_map(|e| e.message.clone())
                .map(|m| m.into_owned())
                .unwrap_or_else(|| errors.to_string());
            AppError::InvalidInput(message)
        })
    }
}

/// Length is counted in characters, after trimming, to match what gets stored.
fn validate_note(note: &str) -> Result<(), ValidationError> {
    if note.trim().chars().count() > NOTE_MAX_CHARS {
        let mut err = ValidationError::new("note_length");
        err.message = Some("Note must be at most 120 characters".into());
        return Err(err);
    }
    Ok(())
}
