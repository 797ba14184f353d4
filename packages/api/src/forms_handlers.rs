// ABOUTME: HTTP handlers for the public lead forms
// ABOUTME: Returns a small receipt; CRM and email follow-ups never fail a submission

use axum::{extract::State, response::IntoResponse, Json};
use porchlight_content::ArticleKind;
use porchlight_leads::{
    CashOfferInput, ContactFormInput, ExitIntentInput, GuideDownloadInput, Lead,
};
use serde::Serialize;
use tracing::info;

use crate::error::{ApiResult, AppError};
use crate::response::created;
use crate::state::AppState;

/// What a visitor gets back after submitting a form
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub lead_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guide_slug: Option<String>,
    pub message: &'static str,
}

impl SubmissionReceipt {
    fn for_lead(lead: &Lead, message: &'static str) -> Self {
        Self {
            lead_id: lead.id.clone(),
            offer_id: None,
            guide_slug: None,
            message,
        }
    }
}

pub async fn submit_contact(
    State(state): State<AppState>,
    Json(body): Json<ContactFormInput>,
) -> ApiResult<impl IntoResponse> {
    let lead = state.intake.submit_contact(body).await?;
    info!("Contact form submitted: {}", lead.id);

    Ok(created(SubmissionReceipt::for_lead(
        &lead,
        "Thanks for reaching out. We'll be in touch within one business day.",
    )))
}

pub async fn submit_exit_intent(
    State(state): State<AppState>,
    Json(body): Json<ExitIntentInput>,
) -> ApiResult<impl IntoResponse> {
    let lead = state.intake.submit_exit_intent(body).await?;
    info!("Exit-intent form submitted: {}", lead.id);

    Ok(created(SubmissionReceipt::for_lead(
        &lead,
        "Thanks. Check your inbox for next steps.",
    )))
}

pub async fn submit_cash_offer(
    State(state): State<AppState>,
    Json(body): Json<CashOfferInput>,
) -> ApiResult<impl IntoResponse> {
    let offer = state.intake.submit_cash_offer(body).await?;
    info!("Cash offer form submitted: {}", offer.id);

    Ok(created(SubmissionReceipt {
        lead_id: offer.lead_id,
        offer_id: Some(offer.id),
        guide_slug: None,
        message: "Request received. Expect a no-obligation offer within 24 hours.",
    }))
}

/// Only published guides can be requested
pub async fn submit_guide_download(
    State(state): State<AppState>,
    Json(body): Json<GuideDownloadInput>,
) -> ApiResult<impl IntoResponse> {
    let guide = state
        .articles
        .get_published_by_slug(body.guide_slug.trim())
        .await?;
    if guide.kind != ArticleKind::Guide {
        return Err(AppError::not_found(format!("Guide '{}'", guide.slug)));
    }

    let lead = state.intake.submit_guide_download(body).await?;
    info!("Guide '{}' requested: {}", guide.slug, lead.id);

    Ok(created(SubmissionReceipt {
        guide_slug: Some(guide.slug),
        ..SubmissionReceipt::for_lead(&lead, "Your guide is on its way.")
    }))
}
