// ABOUTME: Admin HTTP handlers for leads and cash-offer requests
// ABOUTME: Filtering, pipeline status, notes, CRM re-sync and soft deletion

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use porchlight_core::{PaginatedResponse, PaginationParams};
use porchlight_leads::{
    CashOfferRequest, Lead, LeadFilter, LeadSource, LeadStatus, OfferStatus, OfferStatusUpdate,
    SyncSummary,
};
use serde::Deserialize;
use tracing::info;

use crate::error::ApiResult;
use crate::response::{ok, ApiResponse};
use crate::state::AppState;

const DEFAULT_SYNC_BATCH: i64 = 50;
const MAX_SYNC_BATCH: i64 = 500;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<LeadStatus>,
    pub source: Option<LeadSource>,
    pub search: Option<String>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    #[serde(default)]
    pub include_deleted: bool,
}

pub async fn list_leads(
    State(state): State<AppState>,
    Query(query): Query<LeadListQuery>,
) -> ApiResult<Json<ApiResponse<PaginatedResponse<Lead>>>> {
    let pagination = PaginationParams::from_parts(query.page, query.limit);
    let filter = LeadFilter {
        status: query.status,
        source: query.source,
        search: query.search,
        created_after: query.created_after,
        created_before: query.created_before,
        include_deleted: query.include_deleted,
    };

    info!("Listing leads (page: {})", pagination.page());

    let (leads, total) = state
        .leads
        .list_leads_paginated(&filter, Some(pagination.limit()), Some(pagination.offset()))
        .await?;

    Ok(ok(PaginatedResponse::new(leads, &pagination, total)))
}

pub async fn get_lead(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Lead>>> {
    Ok(ok(state.leads.get_lead(&id).await?))
}

#[derive(Deserialize)]
pub struct LeadStatusRequest {
    pub status: LeadStatus,
}

pub async fn update_lead_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<LeadStatusRequest>,
) -> ApiResult<Json<ApiResponse<Lead>>> {
    info!("Updating lead {} status to {}", id, body.status);
    Ok(ok(state.leads.update_status(&id, body.status).await?))
}

#[derive(Deserialize)]
pub struct LeadNotesRequest {
    pub notes: Option<String>,
}

pub async fn update_lead_notes(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<LeadNotesRequest>,
) -> ApiResult<Json<ApiResponse<Lead>>> {
    Ok(ok(state.leads.update_notes(&id, body.notes).await?))
}

pub async fn sync_lead(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Lead>>> {
    info!("Re-syncing lead {} to CRM", id);
    Ok(ok(state.intake.retry_crm_sync(&id).await?))
}

#[derive(Deserialize, Default)]
pub struct SyncPendingRequest {
    pub limit: Option<i64>,
}

pub async fn sync_pending(
    State(state): State<AppState>,
    body: Option<Json<SyncPendingRequest>>,
) -> ApiResult<Json<ApiResponse<SyncSummary>>> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let limit = body.limit.unwrap_or(DEFAULT_SYNC_BATCH).clamp(1, MAX_SYNC_BATCH);
    Ok(ok(state.intake.sync_pending(limit).await?))
}

pub async fn delete_lead(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<()>>> {
    info!("Deleting lead {}", id);
    state.leads.soft_delete(&id).await?;
    Ok(ok(()))
}

pub async fn restore_lead(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Lead>>> {
    info!("Restoring lead {}", id);
    Ok(ok(state.leads.restore(&id).await?))
}

#[derive(Deserialize)]
pub struct OfferListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<OfferStatus>,
}

pub async fn list_offers(
    State(state): State<AppState>,
    Query(query): Query<OfferListQuery>,
) -> ApiResult<Json<ApiResponse<PaginatedResponse<CashOfferRequest>>>> {
    let pagination = PaginationParams::from_parts(query.page, query.limit);
    let (offers, total) = state
        .offers
        .list_paginated(
            query.status,
            Some(pagination.limit()),
            Some(pagination.offset()),
        )
        .await?;

    Ok(ok(PaginatedResponse::new(offers, &pagination, total)))
}

pub async fn get_offer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<CashOfferRequest>>> {
    Ok(ok(state.offers.get(&id).await?))
}

pub async fn update_offer_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<OfferStatusUpdate>,
) -> ApiResult<Json<ApiResponse<CashOfferRequest>>> {
    info!("Updating offer {} status to {}", id, body.status);
    Ok(ok(state.offers.update_status(&id, body).await?))
}

pub async fn delete_offer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<()>>> {
    info!("Deleting offer {}", id);
    state.offers.soft_delete(&id).await?;
    Ok(ok(()))
}
