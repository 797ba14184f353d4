// ABOUTME: Lead type definitions
// ABOUTME: Sources, pipeline statuses, CRM sync state and public form inputs

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use porchlight_timeline::TimelineVariant;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeadSource {
    ContactForm,
    ExitIntent,
    CashOffer,
    TimelineCalculator,
    GuideDownload,
}

impl LeadSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadSource::ContactForm => "contact_form",
            LeadSource::ExitIntent => "exit_intent",
            LeadSource::CashOffer => "cash_offer",
            LeadSource::TimelineCalculator => "timeline_calculator",
            LeadSource::GuideDownload => "guide_download",
        }
    }

    /// Human label used in notification emails
    pub fn label(&self) -> &'static str {
        match self {
            LeadSource::ContactForm => "Contact Form",
            LeadSource::ExitIntent => "Exit-Intent Popup",
            LeadSource::CashOffer => "Cash Offer Request",
            LeadSource::TimelineCalculator => "Timeline Calculator",
            LeadSource::GuideDownload => "Guide Download",
        }
    }
}

impl fmt::Display for LeadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Qualified,
    Converted,
    Lost,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Qualified => "qualified",
            LeadStatus::Converted => "converted",
            LeadStatus::Lost => "lost",
        }
    }

    /// Whether an admin may move a lead from `self` to `next`
    pub fn can_transition_to(&self, next: LeadStatus) -> bool {
        use LeadStatus::*;

        if *self == next {
            return true;
        }
        matches!(
            (self, next),
            (New, Contacted | Qualified | Lost)
                | (Contacted, Qualified | Converted | Lost)
                | (Qualified, Converted | Lost | Contacted)
                | (Lost, Contacted)
        )
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CrmSyncStatus {
    #[default]
    Pending,
    Synced,
    Failed,
    Skipped,
}

impl CrmSyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrmSyncStatus::Pending => "pending",
            CrmSyncStatus::Synced => "synced",
            CrmSyncStatus::Failed => "failed",
            CrmSyncStatus::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    pub source: LeadSource,
    pub name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub property_address: Option<String>,
    pub message: Option<String>,
    pub notice_date: Option<NaiveDate>,
    pub page: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub status: LeadStatus,
    pub notes: Option<String>,
    pub crm_sync_status: CrmSyncStatus,
    pub crm_contact_id: Option<String>,
    pub crm_last_error: Option<String>,
    pub crm_synced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Campaign attribution carried by every public form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtmParams {
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
}

/// Normalised lead ready to be stored
#[derive(Debug, Clone, PartialEq)]
pub struct LeadCreateInput {
    pub source: LeadSource,
    pub name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub property_address: Option<String>,
    pub message: Option<String>,
    pub notice_date: Option<NaiveDate>,
    pub page: Option<String>,
    pub utm: UtmParams,
}

impl LeadCreateInput {
    pub fn new(source: LeadSource, email: impl Into<String>) -> Self {
        Self {
            source,
            name: None,
            email: email.into(),
            phone: None,
            property_address: None,
            message: None,
            notice_date: None,
            page: None,
            utm: UtmParams::default(),
        }
    }
}

/// Admin list filters
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadFilter {
    pub status: Option<LeadStatus>,
    pub source: Option<LeadSource>,
    /// Case-insensitive match on name or email
    pub search: Option<String>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    #[serde(default)]
    pub include_deleted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadStats {
    pub total: i64,
    pub by_status: BTreeMap<String, i64>,
    pub by_source: BTreeMap<String, i64>,
    pub last_7_days: i64,
    pub last_30_days: i64,
    pub crm_failed: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactFormInput {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub property_address: Option<String>,
    pub message: String,
    pub page: Option<String>,
    #[serde(flatten)]
    pub utm: UtmParams,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitIntentInput {
    pub email: String,
    pub name: Option<String>,
    pub page: Option<String>,
    #[serde(flatten)]
    pub utm: UtmParams,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSignupInput {
    pub email: String,
    pub name: Option<String>,
    pub notice_date: String,
    #[serde(default)]
    pub variant: TimelineVariant,
    #[serde(flatten)]
    pub utm: UtmParams,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideDownloadInput {
    pub email: String,
    pub name: Option<String>,
    pub guide_slug: String,
    #[serde(flatten)]
    pub utm: UtmParams,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(LeadStatus::New, LeadStatus::Contacted, true)]
    #[case(LeadStatus::New, LeadStatus::Converted, false)]
    #[case(LeadStatus::Contacted, LeadStatus::Converted, true)]
    #[case(LeadStatus::Contacted, LeadStatus::New, false)]
    #[case(LeadStatus::Qualified, LeadStatus::Contacted, true)]
    #[case(LeadStatus::Lost, LeadStatus::Contacted, true)]
    #[case(LeadStatus::Lost, LeadStatus::Qualified, false)]
    #[case(LeadStatus::Converted, LeadStatus::Lost, false)]
    #[case(LeadStatus::Converted, LeadStatus::Converted, true)]
    fn test_status_transitions(
        #[case] from: LeadStatus,
        #[case] to: LeadStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn test_source_serializes_snake_case() {
        let json = serde_json::to_string(&LeadSource::TimelineCalculator).unwrap();
        assert_eq!(json, "\"timeline_calculator\"");
    }

    #[test]
    fn test_contact_form_reads_utm_fields() {
        let input: ContactFormInput = serde_json::from_str(
            r#"{"name":"Dana","email":"d@example.com","message":"Help","utmSource":"google"}"#,
        )
        .unwrap();
        assert_eq!(input.utm.utm_source.as_deref(), Some("google"));
        assert!(input.phone.is_none());
    }
}
