// ABOUTME: HTTP handlers for testimonials
// ABOUTME: Public submission and listing plus admin moderation

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use porchlight_core::{PaginatedResponse, PaginationParams};
use porchlight_testimonials::{Testimonial, TestimonialInput, TestimonialStatus};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiResult;
use crate::response::{created, ok, ApiResponse};
use crate::state::AppState;

const DEFAULT_PUBLIC_LIMIT: i64 = 12;
const MAX_PUBLIC_LIMIT: i64 = 50;

/// Public view; moderation fields stay internal
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicTestimonial {
    pub id: String,
    pub author_name: String,
    pub location: Option<String>,
    pub rating: i64,
    pub content: String,
    pub situation: Option<String>,
    pub featured: bool,
}

impl From<Testimonial> for PublicTestimonial {
    fn from(t: Testimonial) -> Self {
        Self {
            id: t.id,
            author_name: t.author_name,
            location: t.location,
            rating: t.rating,
            content: t.content,
            situation: t.situation,
            featured: t.featured,
        }
    }
}

#[derive(Deserialize)]
pub struct PublicListQuery {
    pub limit: Option<i64>,
}

pub async fn list_public(
    State(state): State<AppState>,
    Query(query): Query<PublicListQuery>,
) -> ApiResult<Json<ApiResponse<Vec<PublicTestimonial>>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PUBLIC_LIMIT)
        .clamp(1, MAX_PUBLIC_LIMIT);
    let testimonials = state.testimonials.list_public(limit).await?;

    Ok(ok(testimonials.into_iter().map(PublicTestimonial::from).collect()))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedTestimonial {
    pub id: String,
    pub status: TestimonialStatus,
}

/// New testimonials wait for moderation
pub async fn submit(
    State(state): State<AppState>,
    Json(body): Json<TestimonialInput>,
) -> ApiResult<impl IntoResponse> {
    let testimonial = state.testimonials.submit(body).await?;
    info!("Testimonial submitted: {}", testimonial.id);

    Ok(created(SubmittedTestimonial {
        id: testimonial.id,
        status: testimonial.status,
    }))
}

#[derive(Deserialize)]
pub struct AdminListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<TestimonialStatus>,
}

pub async fn list_admin(
    State(state): State<AppState>,
    Query(query): Query<AdminListQuery>,
) -> ApiResult<Json<ApiResponse<PaginatedResponse<Testimonial>>>> {
    let pagination = PaginationParams::from_parts(query.page, query.limit);
    let (testimonials, total) = state
        .testimonials
        .list_paginated(
            query.status,
            Some(pagination.limit()),
            Some(pagination.offset()),
        )
        .await?;

    Ok(ok(PaginatedResponse::new(testimonials, &pagination, total)))
}

#[derive(Deserialize)]
pub struct ModerateRequest {
    pub status: TestimonialStatus,
}

pub async fn moderate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ModerateRequest>,
) -> ApiResult<Json<ApiResponse<Testimonial>>> {
    info!("Moderating testimonial {}: {}", id, body.status);
    Ok(ok(state.testimonials.moderate(&id, body.status).await?))
}

#[derive(Deserialize)]
pub struct FeatureRequest {
    pub featured: bool,
}

pub async fn set_featured(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<FeatureRequest>,
) -> ApiResult<Json<ApiResponse<Testimonial>>> {
    Ok(ok(state.testimonials.set_featured(&id, body.featured).await?))
}

pub async fn delete_testimonial(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<()>>> {
    info!("Deleting testimonial {}", id);
    state.testimonials.soft_delete(&id).await?;
    Ok(ok(()))
}
