// ABOUTME: Cash-offer request type definitions
// ABOUTME: Offer pipeline statuses, property details and the public request form

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{LeadCreateInput, UtmParams};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    #[default]
    Pending,
    Reviewing,
    OfferSent,
    Accepted,
    Declined,
    Closed,
    Withdrawn,
}

impl OfferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferStatus::Pending => "pending",
            OfferStatus::Reviewing => "reviewing",
            OfferStatus::OfferSent => "offer_sent",
            OfferStatus::Accepted => "accepted",
            OfferStatus::Declined => "declined",
            OfferStatus::Closed => "closed",
            OfferStatus::Withdrawn => "withdrawn",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OfferStatus::Closed | OfferStatus::Withdrawn)
    }

    pub fn can_transition_to(&self, next: OfferStatus) -> bool {
        use OfferStatus::*;

        if *self == next {
            return true;
        }
        matches!(
            (self, next),
            (Pending, Reviewing | Declined | Withdrawn)
                | (Reviewing, OfferSent | Declined | Withdrawn)
                | (OfferSent, Accepted | Declined | Withdrawn | Reviewing)
                | (Accepted, Closed | Withdrawn)
                | (Declined, Reviewing)
        )
    }
}

impl fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PropertyCondition {
    Excellent,
    Good,
    Fair,
    NeedsWork,
    Poor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SellTimeline {
    Asap,
    #[serde(rename = "within_30_days")]
    #[sqlx(rename = "within_30_days")]
    Within30Days,
    #[serde(rename = "within_90_days")]
    #[sqlx(rename = "within_90_days")]
    Within90Days,
    Flexible,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashOfferRequest {
    pub id: String,
    pub lead_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub property_address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub property_type: String,
    pub bedrooms: Option<i64>,
    pub bathrooms: Option<f64>,
    pub square_feet: Option<i64>,
    pub condition: PropertyCondition,
    pub sell_timeline: SellTimeline,
    pub mortgage_balance: Option<f64>,
    pub in_foreclosure: bool,
    pub notice_date: Option<NaiveDate>,
    pub status: OfferStatus,
    pub offer_amount: Option<f64>,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl CashOfferRequest {
    /// One-line address for emails and CRM records
    pub fn full_address(&self) -> String {
        format!(
            "{}, {}, {} {}",
            self.property_address, self.city, self.state, self.zip
        )
    }
}

/// Public cash-offer form body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashOfferInput {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub property_address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub property_type: String,
    pub bedrooms: Option<i64>,
    pub bathrooms: Option<f64>,
    pub square_feet: Option<i64>,
    pub condition: PropertyCondition,
    pub sell_timeline: SellTimeline,
    pub mortgage_balance: Option<f64>,
    #[serde(default)]
    pub in_foreclosure: bool,
    pub notice_date: Option<String>,
    pub message: Option<String>,
    #[serde(flatten)]
    pub utm: UtmParams,
}

/// Validated cash-offer request plus the lead stored alongside it
#[derive(Debug, Clone)]
pub struct NewCashOffer {
    pub lead: LeadCreateInput,
    /// Trimmed and normalised form fields
    pub details: CashOfferInput,
    pub notice_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferStatusUpdate {
    pub status: OfferStatus,
    pub offer_amount: Option<f64>,
    pub admin_notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferStats {
    pub total: i64,
    pub by_status: BTreeMap<String, i64>,
    /// Sum of offer amounts on accepted and closed requests
    pub accepted_value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(OfferStatus::Pending, OfferStatus::Reviewing, true)]
    #[case(OfferStatus::Pending, OfferStatus::OfferSent, false)]
    #[case(OfferStatus::OfferSent, OfferStatus::Reviewing, true)]
    #[case(OfferStatus::Accepted, OfferStatus::Closed, true)]
    #[case(OfferStatus::Declined, OfferStatus::Reviewing, true)]
    #[case(OfferStatus::Declined, OfferStatus::Accepted, false)]
    #[case(OfferStatus::Closed, OfferStatus::Reviewing, false)]
    #[case(OfferStatus::Withdrawn, OfferStatus::Pending, false)]
    fn test_offer_transitions(
        #[case] from: OfferStatus,
        #[case] to: OfferStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn test_condition_wire_names() {
        let condition: PropertyCondition = serde_json::from_str("\"needs_work\"").unwrap();
        assert_eq!(condition, PropertyCondition::NeedsWork);

        let timeline: SellTimeline = serde_json::from_str("\"within_30_days\"").unwrap();
        assert_eq!(timeline, SellTimeline::Within30Days);
    }
}
