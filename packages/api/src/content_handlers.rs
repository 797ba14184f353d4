// ABOUTME: HTTP handlers for articles, guides and the FAQ
// ABOUTME: Public reads of published content plus admin editing

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use porchlight_content::{
    Article, ArticleInput, ArticleKind, ArticleUpdateInput, FaqCategory, FaqEntry, FaqInput,
};
use porchlight_core::{PaginatedResponse, PaginationParams};
use serde::Deserialize;
use tracing::info;

use crate::error::ApiResult;
use crate::response::{created, ok, ApiResponse};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ArticleListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub kind: Option<String>,
}

impl ArticleListQuery {
    fn kind(&self) -> ApiResult<Option<ArticleKind>> {
        match self.kind.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            Some(kind) => Ok(Some(kind.parse()?)),
            None => Ok(None),
        }
    }
}

pub async fn list_published(
    State(state): State<AppState>,
    Query(query): Query<ArticleListQuery>,
) -> ApiResult<Json<ApiResponse<PaginatedResponse<Article>>>> {
    let kind = query.kind()?;
    let pagination = PaginationParams::from_parts(query.page, query.limit);
    let (articles, total) = state
        .articles
        .list_published(kind, Some(pagination.limit()), Some(pagination.offset()))
        .await?;

    Ok(ok(PaginatedResponse::new(articles, &pagination, total)))
}

pub async fn get_published(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<ApiResponse<Article>>> {
    Ok(ok(state.articles.get_published_by_slug(&slug).await?))
}

pub async fn list_faq(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<FaqCategory>>>> {
    Ok(ok(state.faq.list_grouped().await?))
}

// Admin

pub async fn list_articles(
    State(state): State<AppState>,
    Query(query): Query<ArticleListQuery>,
) -> ApiResult<Json<ApiResponse<PaginatedResponse<Article>>>> {
    let kind = query.kind()?;
    let pagination = PaginationParams::from_parts(query.page, query.limit);
    let (articles, total) = state
        .articles
        .list_all(kind, Some(pagination.limit()), Some(pagination.offset()))
        .await?;

    Ok(ok(PaginatedResponse::new(articles, &pagination, total)))
}

pub async fn create_article(
    State(state): State<AppState>,
    Json(body): Json<ArticleInput>,
) -> ApiResult<impl IntoResponse> {
    let article = state.articles.create_article(body).await?;
    info!("Created article {} ({})", article.id, article.slug);
    Ok(created(article))
}

pub async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Article>>> {
    Ok(ok(state.articles.get_article(&id).await?))
}

pub async fn update_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ArticleUpdateInput>,
) -> ApiResult<Json<ApiResponse<Article>>> {
    Ok(ok(state.articles.update_article(&id, body).await?))
}

pub async fn publish_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Article>>> {
    info!("Publishing article {}", id);
    Ok(ok(state.articles.publish(&id).await?))
}

pub async fn unpublish_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Article>>> {
    info!("Unpublishing article {}", id);
    Ok(ok(state.articles.unpublish(&id).await?))
}

pub async fn delete_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<()>>> {
    info!("Deleting article {}", id);
    state.articles.delete_article(&id).await?;
    Ok(ok(()))
}

pub async fn create_faq_entry(
    State(state): State<AppState>,
    Json(body): Json<FaqInput>,
) -> ApiResult<impl IntoResponse> {
    let entry = state.faq.create_entry(body).await?;
    Ok(created(entry))
}

pub async fn update_faq_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<FaqInput>,
) -> ApiResult<Json<ApiResponse<FaqEntry>>> {
    Ok(ok(state.faq.update_entry(&id, body).await?))
}

pub async fn delete_faq_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<()>>> {
    state.faq.delete_entry(&id).await?;
    Ok(ok(()))
}
