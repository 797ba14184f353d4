// ABOUTME: Form submission pipeline: validate, store, then sync and notify
// ABOUTME: CRM and email failures are logged and recorded, never returned to the visitor

use porchlight_integrations::templates::{
    cash_offer_receipt, guide_delivery, lead_notification, timeline_link, visitor_confirmation,
    RenderedEmail,
};
use porchlight_integrations::{CrmContact, EmailMessage, Integrations};
use porchlight_storage::StorageResult;
use porchlight_timeline::{generate_today, ProgressStorage, TimelineTracker, TrackerCreateInput};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::offers::{CashOfferInput, CashOfferRequest, OfferStorage};
use crate::storage::{CrmSyncOutcome, LeadStorage};
use crate::types::{
    ContactFormInput, ExitIntentInput, GuideDownloadInput, Lead, LeadCreateInput,
    TimelineSignupInput,
};
use crate::validation;

/// Result of a timeline-calculator signup
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSignup {
    pub lead: Lead,
    pub tracker: TimelineTracker,
}

/// Counts from a bulk CRM re-sync
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub attempted: usize,
    pub synced: usize,
    pub failed: usize,
    pub skipped: usize,
}

pub struct LeadIntake {
    leads: LeadStorage,
    offers: OfferStorage,
    trackers: ProgressStorage,
    integrations: Integrations,
    public_base_url: Option<String>,
}

impl LeadIntake {
    pub fn new(pool: SqlitePool, integrations: Integrations) -> Self {
        Self {
            leads: LeadStorage::new(pool.clone()),
            offers: OfferStorage::new(pool.clone()),
            trackers: ProgressStorage::new(pool),
            integrations,
            public_base_url: None,
        }
    }

    /// Base URL used to build links in visitor emails
    pub fn with_public_base_url(mut self, url: Option<String>) -> Self {
        self.public_base_url = url.map(|u| u.trim_end_matches('/').to_string());
        self
    }

    pub async fn submit_contact(&self, input: ContactFormInput) -> StorageResult<Lead> {
        let lead = self.store(validation::contact_form(input)?).await?;
        let lead = self.sync_lead(lead).await;

        self.notify_admin(&lead).await;
        self.send_to_visitor(&lead, visitor_confirmation(lead.name.as_deref()))
            .await;
        Ok(lead)
    }

    pub async fn submit_exit_intent(&self, input: ExitIntentInput) -> StorageResult<Lead> {
        let lead = self.store(validation::exit_intent(input)?).await?;
        let lead = self.sync_lead(lead).await;

        self.notify_admin(&lead).await;
        self.send_to_visitor(&lead, visitor_confirmation(lead.name.as_deref()))
            .await;
        Ok(lead)
    }

    pub async fn submit_guide_download(&self, input: GuideDownloadInput) -> StorageResult<Lead> {
        let slug = input.guide_slug.trim().to_string();
        let lead = self.store(validation::guide_download(input)?).await?;
        let lead = self.sync_lead(lead).await;

        self.notify_admin(&lead).await;
        match &self.public_base_url {
            Some(base) => {
                let url = format!("{}/guides/{}", base, slug);
                self.send_to_visitor(&lead, guide_delivery(lead.name.as_deref(), &url))
                    .await;
            }
            None => warn!("PUBLIC_BASE_URL not set; guide email not sent for {}", slug),
        }
        Ok(lead)
    }

    /// Store the lead and a saved timeline, then email the visitor a link to it
    pub async fn submit_timeline_signup(
        &self,
        input: TimelineSignupInput,
    ) -> StorageResult<TimelineSignup> {
        let variant = input.variant;
        let validated = validation::timeline_signup(input)?;
        let Some(notice_date) = validated.notice_date else {
            return Err(porchlight_core::ValidationError::single("noticeDate", "is required").into());
        };

        let lead = self.store(validated).await?;
        let tracker = self
            .trackers
            .create_tracker(TrackerCreateInput {
                notice_date,
                variant,
                email: Some(lead.email.clone()),
                lead_id: Some(lead.id.clone()),
            })
            .await?;

        let lead = self.sync_lead(lead).await;
        self.notify_admin(&lead).await;

        let next_step = generate_today(notice_date, variant)
            .ok()
            .and_then(|t| t.next_milestone().map(|m| m.title.clone()));
        match &self.public_base_url {
            Some(base) => {
                let url = format!("{}/timeline/{}", base, tracker.id);
                let email = timeline_link(lead.name.as_deref(), &url, next_step.as_deref());
                self.send_to_visitor(&lead, email).await;
            }
            None => warn!("PUBLIC_BASE_URL not set; timeline link email not sent for {}", tracker.id),
        }

        Ok(TimelineSignup { lead, tracker })
    }

    pub async fn submit_cash_offer(&self, input: CashOfferInput) -> StorageResult<CashOfferRequest> {
        let offer = self
            .offers
            .create_offer_request(validation::cash_offer(input)?)
            .await?;
        info!("Cash offer request captured: {} (lead: {})", offer.id, offer.lead_id);

        let lead = self.leads.get_lead(&offer.lead_id).await?;
        let lead = self.sync_lead(lead).await;

        self.notify_admin(&lead).await;
        self.send_to_visitor(
            &lead,
            cash_offer_receipt(Some(&offer.name), &offer.full_address()),
        )
        .await;
        Ok(offer)
    }

    /// Push one lead to the CRM again, whatever its current sync state
    pub async fn retry_crm_sync(&self, lead_id: &str) -> StorageResult<Lead> {
        let lead = self.leads.get_lead(lead_id).await?;
        let outcome = self.push_to_crm(&lead).await;
        self.leads.record_crm_sync(&lead.id, outcome).await
    }

    /// Re-send leads whose CRM sync is pending or failed
    pub async fn sync_pending(&self, limit: i64) -> StorageResult<SyncSummary> {
        let mut summary = SyncSummary::default();

        for lead in self.leads.pending_crm_sync(limit).await? {
            summary.attempted += 1;
            let outcome = self.push_to_crm(&lead).await;
            match outcome {
                CrmSyncOutcome::Synced { .. } => summary.synced += 1,
                CrmSyncOutcome::Failed { .. } => summary.failed += 1,
                CrmSyncOutcome::Skipped => summary.skipped += 1,
            }
            self.leads.record_crm_sync(&lead.id, outcome).await?;
        }

        info!(
            "CRM sync run: {} attempted, {} synced, {} failed, {} skipped",
            summary.attempted, summary.synced, summary.failed, summary.skipped
        );
        Ok(summary)
    }

    async fn store(&self, input: LeadCreateInput) -> StorageResult<Lead> {
        let lead = self.leads.create_lead(input).await?;
        info!("Lead captured: {} (source: {})", lead.id, lead.source);
        Ok(lead)
    }

    /// Best-effort CRM push; returns the lead with its recorded sync state
    async fn sync_lead(&self, lead: Lead) -> Lead {
        let outcome = self.push_to_crm(&lead).await;
        match self.leads.record_crm_sync(&lead.id, outcome).await {
            Ok(updated) => updated,
            Err(e) => {
                warn!("Failed to record CRM sync state for {}: {}", lead.id, e);
                lead
            }
        }
    }

    async fn push_to_crm(&self, lead: &Lead) -> CrmSyncOutcome {
        match self.integrations.crm.upsert_contact(&crm_contact(lead)).await {
            Ok(contact_id) => CrmSyncOutcome::Synced { contact_id },
            Err(e) if e.is_not_configured() => CrmSyncOutcome::Skipped,
            Err(e) => {
                warn!("CRM sync failed for lead {}: {}", lead.id, e);
                CrmSyncOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    async fn notify_admin(&self, lead: &Lead) {
        let Some(recipient) = &self.integrations.admin_recipient else {
            return;
        };

        let email = lead_notification(lead.source.label(), &notification_fields(lead));
        let message =
            EmailMessage::new(recipient.clone(), email.subject, email.html).reply_to(lead.email.clone());

        if let Err(e) = self.integrations.email.send(&message).await {
            if !e.is_not_configured() {
                warn!("Admin notification failed for lead {}: {}", lead.id, e);
            }
        }
    }

    async fn send_to_visitor(&self, lead: &Lead, email: RenderedEmail) {
        let message = EmailMessage::new(lead.email.clone(), email.subject, email.html);
        if let Err(e) = self.integrations.email.send(&message).await {
            if !e.is_not_configured() {
                warn!("Visitor email failed for lead {}: {}", lead.id, e);
            }
        }
    }
}

fn crm_contact(lead: &Lead) -> CrmContact {
    let mut contact = CrmContact {
        email: lead.email.clone(),
        phone: lead.phone.clone(),
        address: lead.property_address.clone(),
        source: lead.source.as_str().to_string(),
        tags: vec!["website".to_string(), lead.source.as_str().to_string()],
        ..Default::default()
    }
    .with_full_name(lead.name.as_deref());

    contact.custom_fields.insert("leadId".to_string(), lead.id.clone());
    if let Some(date) = lead.notice_date {
        contact
            .custom_fields
            .insert("noticeOfDefaultDate".to_string(), date.to_string());
    }
    for (key, value) in [
        ("utmSource", &lead.utm_source),
        ("utmMedium", &lead.utm_medium),
        ("utmCampaign", &lead.utm_campaign),
    ] {
        if let Some(v) = value {
            contact.custom_fields.insert(key.to_string(), v.clone());
        }
    }
    contact
}

fn notification_fields(lead: &Lead) -> Vec<(&'static str, Option<String>)> {
    vec![
        ("Name", lead.name.clone()),
        ("Email", Some(lead.email.clone())),
        ("Phone", lead.phone.clone()),
        ("Property", lead.property_address.clone()),
        ("Notice of Default", lead.notice_date.map(|d| d.to_string())),
        ("Message", lead.message.clone()),
        ("Page", lead.page.clone()),
        ("Campaign", lead.utm_campaign.clone()),
        ("Lead ID", Some(lead.id.clone())),
    ]
}
