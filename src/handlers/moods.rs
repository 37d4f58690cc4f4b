use axum::{extract::State, http::StatusCode, Json};

use crate::dto::SubmitMoodRequest;
use crate::error::AppResult;
use crate::models::mood::{Mood, MoodEntry, MoodOption};
use crate::services::dashboard::{DashboardView, RefreshTrigger};
use crate::AppState;

pub async fn list_moods() -> Json<Vec<MoodOption>> {
    Json(Mood::ALL.into_iter().map(MoodOption::from).collect())
}

pub async fn today(State(state): State<AppState>) -> AppResult<Json<DashboardView>> {
    let view = state.dashboard.refresh(RefreshTrigger::Api).await?;
    Ok(Json(view))
}

pub async fn create_mood(
    State(state): State<AppState>,
    Json(body): Json<SubmitMoodRequest>,
) -> AppResult<(StatusCode, Json<MoodEntry>)> {
    body.check()?;

    let entry = state
        .dashboard
        .submit(body.mood.as_deref(), body.note.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(entry)))
}
