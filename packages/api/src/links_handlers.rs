// ABOUTME: HTTP handlers for short links
// ABOUTME: Public redirect with click recording plus admin CRUD and analytics

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Redirect},
    Json,
};
use porchlight_core::{PaginatedResponse, PaginationParams};
use porchlight_links::{
    ClickInput, Link, LinkAnalytics, LinkCreateInput, LinkOverview, LinkUpdateInput,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::ApiResult;
use crate::response::{created, ok, ApiResponse};
use crate::state::AppState;

const DEFAULT_ANALYTICS_DAYS: i64 = 30;

fn header_string(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// 307 to the destination. A failed click insert still redirects.
pub async fn follow_link(
    State(state): State<AppState>,
    Path(code): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Redirect> {
    let link = state.links.resolve(&code).await?;

    let click = ClickInput {
        referrer: header_string(&headers, header::REFERER),
        user_agent: header_string(&headers, header::USER_AGENT),
    };
    if let Err(e) = state.links.record_click(&link.id, &click).await {
        warn!("Failed to record click on {}: {}", link.code, e);
    }

    Ok(Redirect::temporary(&link.destination))
}

// Admin

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    #[serde(default)]
    pub include_archived: bool,
}

pub async fn list_links(
    State(state): State<AppState>,
    Query(query): Query<LinkListQuery>,
) -> ApiResult<Json<ApiResponse<PaginatedResponse<Link>>>> {
    let pagination = PaginationParams::from_parts(query.page, query.limit);
    let (links, total) = state
        .links
        .list_links_paginated(
            query.include_archived,
            Some(pagination.limit()),
            Some(pagination.offset()),
        )
        .await?;

    Ok(ok(PaginatedResponse::new(links, &pagination, total)))
}

pub async fn create_link(
    State(state): State<AppState>,
    Json(body): Json<LinkCreateInput>,
) -> ApiResult<impl IntoResponse> {
    let link = state.links.create_link(body).await?;
    info!("Created short link /l/{} -> {}", link.code, link.destination);
    Ok(created(link))
}

pub async fn get_link(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Link>>> {
    Ok(ok(state.links.get_link(&id).await?))
}

pub async fn update_link(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<LinkUpdateInput>,
) -> ApiResult<Json<ApiResponse<Link>>> {
    Ok(ok(state.links.update_link(&id, body).await?))
}

pub async fn delete_link(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<()>>> {
    info!("Deleting link {}", id);
    state.links.delete_link(&id).await?;
    Ok(ok(()))
}

pub async fn archive_link(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Link>>> {
    Ok(ok(state.links.archive(&id).await?))
}

pub async fn unarchive_link(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Link>>> {
    Ok(ok(state.links.unarchive(&id).await?))
}

#[derive(Deserialize)]
pub struct DaysQuery {
    pub days: Option<i64>,
}

pub async fn link_analytics(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<DaysQuery>,
) -> ApiResult<Json<ApiResponse<LinkAnalytics>>> {
    let days = query.days.unwrap_or(DEFAULT_ANALYTICS_DAYS);
    Ok(ok(state.links.analytics(&id, days).await?))
}

pub async fn links_overview(
    State(state): State<AppState>,
    Query(query): Query<DaysQuery>,
) -> ApiResult<Json<ApiResponse<LinkOverview>>> {
    let days = query.days.unwrap_or(DEFAULT_ANALYTICS_DAYS);
    Ok(ok(state.links.overview(days).await?))
}
