// ABOUTME: HTTP handlers for A/B experiments
// ABOUTME: Visitor assignment and event tracking plus admin lifecycle and results

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use porchlight_core::{PaginatedResponse, PaginationParams};
use porchlight_experiments::{
    Assignment, EventKind, Experiment, ExperimentCreateInput, ExperimentResults,
    ExperimentStatus, ExperimentUpdateInput,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiResult;
use crate::response::{created, ok, ApiResponse};
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentQuery {
    pub visitor_id: String,
}

pub async fn get_assignment(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<AssignmentQuery>,
) -> ApiResult<Json<ApiResponse<Assignment>>> {
    Ok(ok(state.experiments.assign(&key, &query.visitor_id).await?))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    pub visitor_id: String,
    pub kind: EventKind,
}

#[derive(Serialize)]
pub struct EventRecorded {
    /// False for repeats and for experiments that are not running
    pub recorded: bool,
}

pub async fn record_event(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(body): Json<EventRequest>,
) -> ApiResult<Json<ApiResponse<EventRecorded>>> {
    let recorded = state
        .experiments
        .record_event(&key, &body.visitor_id, body.kind)
        .await?;
    Ok(ok(EventRecorded { recorded }))
}

// Admin

#[derive(Deserialize)]
pub struct ExperimentListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<ExperimentStatus>,
}

pub async fn list_experiments(
    State(state): State<AppState>,
    Query(query): Query<ExperimentListQuery>,
) -> ApiResult<Json<ApiResponse<PaginatedResponse<Experiment>>>> {
    let pagination = PaginationParams::from_parts(query.page, query.limit);
    let (experiments, total) = state
        .experiments
        .list_experiments_paginated(
            query.status,
            Some(pagination.limit()),
            Some(pagination.offset()),
        )
        .await?;

    Ok(ok(PaginatedResponse::new(experiments, &pagination, total)))
}

pub async fn create_experiment(
    State(state): State<AppState>,
    Json(body): Json<ExperimentCreateInput>,
) -> ApiResult<impl IntoResponse> {
    let experiment = state.experiments.create_experiment(body).await?;
    info!("Created experiment {} ({})", experiment.id, experiment.key);
    Ok(created(experiment))
}

pub async fn get_experiment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Experiment>>> {
    Ok(ok(state.experiments.get_experiment(&id).await?))
}

pub async fn update_experiment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ExperimentUpdateInput>,
) -> ApiResult<Json<ApiResponse<Experiment>>> {
    Ok(ok(state.experiments.update_experiment(&id, body).await?))
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: ExperimentStatus,
}

pub async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<StatusRequest>,
) -> ApiResult<Json<ApiResponse<Experiment>>> {
    Ok(ok(state.experiments.set_status(&id, body.status).await?))
}

pub async fn delete_experiment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<()>>> {
    info!("Deleting experiment {}", id);
    state.experiments.delete_experiment(&id).await?;
    Ok(ok(()))
}

pub async fn get_results(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<ExperimentResults>>> {
    Ok(ok(state.experiments.results(&id).await?))
}
