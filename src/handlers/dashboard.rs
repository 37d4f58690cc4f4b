use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::Deserialize;

use crate::dto::SubmitMoodRequest;
use crate::error::{AppError, AppResult};
use crate::services::dashboard::{DashboardView, RefreshTrigger};
use crate::services::render::{render_dashboard, Flash};
use crate::AppState;

const LOGGED_FLASH: &str = "logged";

#[derive(Debug, Default, Deserialize)]
pub struct IndexQuery {
    pub flash: Option<String>,
}

/// GET /
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<IndexQuery>,
) -> AppResult<Response> {
    let flash = match query.flash.as_deref() {
        Some(LOGGED_FLASH) => Some(Flash::success("Logged!")),
        _ => None,
    };
    render_page(&state, StatusCode::OK, flash).await
}

/// POST /submit. Success redirects (303) to `/?flash=logged` so reloading
/// the page cannot post the entry twice. Rejected or failed submissions
/// re-render the page with a warning and the matching status.
pub async fn submit_form(
    State(state): State<AppState>,
    Form(body): Form<SubmitMoodRequest>,
) -> AppResult<Response> {
    let outcome = match body.check() {
        Ok(()) => state
            .dashboard
            .submit(body.mood.as_deref(), body.note.as_deref())
            .await
            .map(|_| ()),
        Err(e) => Err(e),
    };

    match outcome {
        Ok(()) => Ok(Redirect::to(&format!("/?flash={}", LOGGED_FLASH)).into_response()),
        Err(e @ AppError::Internal(_)) => Err(e),
        Err(e) => {
            if let AppError::Store(inner) = &e {
                tracing::error!(error = %inner, "Submission failed");
            }
            render_page(&state, e.status(), Some(Flash::warning(e.user_message()))).await
        }
    }
}

/// POST /api/dashboard/refresh
pub async fn refresh(State(state): State<AppState>) -> AppResult<Json<DashboardView>> {
    let view = state.dashboard.refresh(RefreshTrigger::Manual).await?;
    Ok(Json(view))
}

async fn render_page(
    state: &AppState,
    status: StatusCode,
    flash: Option<Flash>,
) -> AppResult<Response> {
    let (view, flash) = match state.dashboard.refresh(RefreshTrigger::PageLoad).await {
        Ok(view) => (Some(view), flash),
        Err(e) => {
            tracing::warn!(error = %e, "Dashboard data unavailable");
            (None, flash.or_else(|| Some(Flash::warning(e.user_message()))))
        }
    };

    let html = render_dashboard(
        view.as_ref(),
        flash.as_ref(),
        state.dashboard.refresh_interval().as_secs(),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to render dashboard: {}", e)))?;

    Ok((status, Html(html)).into_response())
}
