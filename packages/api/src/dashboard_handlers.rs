// ABOUTME: Admin dashboard overview
// ABOUTME: Lead, offer, testimonial and link statistics in one payload

use axum::{
    extract::{Query, State},
    Json,
};
use porchlight_leads::{LeadStats, OfferStats};
use porchlight_links::LinkOverview;
use porchlight_testimonials::TestimonialStats;
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::response::{ok, ApiResponse};
use crate::state::AppState;

const DEFAULT_WINDOW_DAYS: i64 = 30;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    pub leads: LeadStats,
    pub offers: OfferStats,
    pub testimonials: TestimonialStats,
    pub links: LinkOverview,
}

#[derive(Deserialize)]
pub struct OverviewQuery {
    pub days: Option<i64>,
}

pub async fn overview(
    State(state): State<AppState>,
    Query(query): Query<OverviewQuery>,
) -> ApiResult<Json<ApiResponse<DashboardOverview>>> {
    let days = query.days.unwrap_or(DEFAULT_WINDOW_DAYS);

    Ok(ok(DashboardOverview {
        leads: state.leads.stats().await?,
        offers: state.offers.stats().await?,
        testimonials: state.testimonials.stats().await?,
        links: state.links.overview(days).await?,
    }))
}
