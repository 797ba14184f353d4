// ABOUTME: HTTP handlers for the foreclosure timeline calculator
// ABOUTME: One-off generation, saved trackers with checklist progress, and PDF export

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use porchlight_leads::{TimelineSignupInput, UtmParams};
use porchlight_timeline::{
    generate_today, parse_notice_date, timeline_html, ActionProgress, Timeline, TimelineTracker,
    TimelineVariant, TrackedTimeline, TrackerCreateInput,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiResult;
use crate::response::{created, ok, ApiResponse};
use crate::state::AppState;

const PDF_FILENAME: &str = "foreclosure-timeline.pdf";

fn parse_variant(variant: Option<&str>) -> ApiResult<TimelineVariant> {
    match variant.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => Ok(v.parse::<TimelineVariant>()?),
        None => Ok(TimelineVariant::default()),
    }
}

#[derive(Deserialize)]
pub struct TimelineQuery {
    pub notice_date: String,
    pub variant: Option<String>,
}

/// Generate a timeline without saving anything
pub async fn get_timeline(
    Query(query): Query<TimelineQuery>,
) -> ApiResult<Json<ApiResponse<Timeline>>> {
    let notice_date = parse_notice_date(&query.notice_date)?;
    let variant = parse_variant(query.variant.as_deref())?;

    info!("Generating {} timeline for {}", variant, notice_date);
    Ok(ok(generate_today(notice_date, variant)?))
}

/// Request body for saving a timeline
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTimelineRequest {
    pub notice_date: String,
    pub variant: Option<String>,
    /// With an email the visitor also becomes a lead and gets a link by mail
    pub email: Option<String>,
    pub name: Option<String>,
    #[serde(flatten)]
    pub utm: UtmParams,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTimeline {
    pub tracker: TimelineTracker,
    pub timeline: TrackedTimeline,
}

pub async fn create_timeline(
    State(state): State<AppState>,
    Json(body): Json<CreateTimelineRequest>,
) -> ApiResult<impl IntoResponse> {
    let variant = parse_variant(body.variant.as_deref())?;
    let email = body.email.filter(|e| !e.trim().is_empty());

    let tracker = match email {
        Some(email) => {
            let signup = state
                .intake
                .submit_timeline_signup(TimelineSignupInput {
                    email,
                    name: body.name,
                    notice_date: body.notice_date,
                    variant,
                    utm: body.utm,
                })
                .await?;
            signup.tracker
        }
        None => {
            let notice_date = parse_notice_date(&body.notice_date)?;
            state
                .trackers
                .create_tracker(TrackerCreateInput {
                    notice_date,
                    variant,
                    email: None,
                    lead_id: None,
                })
                .await?
        }
    };

    info!("Saved timeline {} (lead: {:?})", tracker.id, tracker.lead_id);

    let timeline = state
        .trackers
        .load_tracked(&tracker.id, Utc::now().date_naive())
        .await?;
    Ok(created(SavedTimeline { tracker, timeline }))
}

pub async fn get_saved_timeline(
    State(state): State<AppState>,
    Path(tracker_id): Path<String>,
) -> ApiResult<Json<ApiResponse<TrackedTimeline>>> {
    let timeline = state
        .trackers
        .load_tracked(&tracker_id, Utc::now().date_naive())
        .await?;
    Ok(ok(timeline))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNoticeDateRequest {
    pub notice_date: String,
}

/// Move the seed date; ticked checklist items stay ticked
pub async fn update_notice_date(
    State(state): State<AppState>,
    Path(tracker_id): Path<String>,
    Json(body): Json<UpdateNoticeDateRequest>,
) -> ApiResult<Json<ApiResponse<TrackedTimeline>>> {
    let notice_date = parse_notice_date(&body.notice_date)?;
    info!("Updating notice date on {} to {}", tracker_id, notice_date);

    state
        .trackers
        .update_notice_date(&tracker_id, notice_date)
        .await?;
    let timeline = state
        .trackers
        .load_tracked(&tracker_id, Utc::now().date_naive())
        .await?;
    Ok(ok(timeline))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdateRequest {
    pub milestone_id: String,
    pub action_index: usize,
    pub completed: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdateResponse {
    pub progress: ActionProgress,
    pub timeline: TrackedTimeline,
}

pub async fn update_progress(
    State(state): State<AppState>,
    Path(tracker_id): Path<String>,
    Json(body): Json<ProgressUpdateRequest>,
) -> ApiResult<Json<ApiResponse<ProgressUpdateResponse>>> {
    let progress = state
        .trackers
        .set_action_completed(
            &tracker_id,
            &body.milestone_id,
            body.action_index,
            body.completed,
        )
        .await?;
    let timeline = state
        .trackers
        .load_tracked(&tracker_id, Utc::now().date_naive())
        .await?;

    Ok(ok(ProgressUpdateResponse { progress, timeline }))
}

/// Render the saved timeline through the PDF service
pub async fn download_pdf(
    State(state): State<AppState>,
    Path(tracker_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let timeline = state
        .trackers
        .load_tracked(&tracker_id, Utc::now().date_naive())
        .await?;
    let html = timeline_html(&timeline, None);
    let pdf = state.integrations.pdf.render_html(&html).await?;

    info!("Rendered PDF for timeline {} ({} bytes)", tracker_id, pdf.len());

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", PDF_FILENAME),
            ),
        ],
        pdf,
    ))
}
