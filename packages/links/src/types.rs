// ABOUTME: Short link type definitions and input checks
// ABOUTME: Codes, destinations, click records and analytics summaries

use chrono::{DateTime, NaiveDate, Utc};
use porchlight_core::{clean_optional, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use url::Url;

pub const GENERATED_CODE_LEN: usize = 7;
pub const MIN_CODE_LEN: usize = 3;
pub const MAX_CODE_LEN: usize = 32;
const MAX_DESTINATION_LEN: usize = 2048;
const MAX_TITLE_LEN: usize = 200;
const MAX_CAMPAIGN_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub id: String,
    pub code: String,
    pub destination: String,
    pub title: Option<String>,
    pub campaign: Option<String>,
    pub created_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
    pub click_count: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkCreateInput {
    /// Custom code; a random one is generated when absent
    pub code: Option<String>,
    pub destination: String,
    pub title: Option<String>,
    pub campaign: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkUpdateInput {
    pub destination: Option<String>,
    pub title: Option<String>,
    pub campaign: Option<String>,
}

/// Request metadata captured on redirect
#[derive(Debug, Clone, Default)]
pub struct ClickInput {
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyClicks {
    pub date: NaiveDate,
    pub clicks: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferrerCount {
    pub host: String,
    pub clicks: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkAnalytics {
    pub link: Link,
    pub days: i64,
    pub total_clicks: i64,
    pub window_clicks: i64,
    /// One entry per day in the window, oldest first, zero-filled
    pub daily: Vec<DailyClicks>,
    pub top_referrers: Vec<ReferrerCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkOverview {
    pub days: i64,
    pub total_links: i64,
    pub active_links: i64,
    pub total_clicks: i64,
    pub window_clicks: i64,
    pub top_links: Vec<Link>,
}

/// Check a custom short code: 3 to 32 of `A-Z a-z 0-9 _ -`
pub fn validate_code(code: &str) -> Result<(), ValidationError> {
    let len = code.chars().count();
    let mut v = Validator::new();
    v.check(
        (MIN_CODE_LEN..=MAX_CODE_LEN).contains(&len),
        "code",
        "must be between 3 and 32 characters",
    )
    .check(
        code.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
        "code",
        "may only contain letters, digits, '-' and '_'",
    );
    v.finish()
}

fn validate_destination(v: &mut Validator, destination: &str) {
    let parsed = Url::parse(destination.trim());
    let ok = matches!(&parsed, Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some());
    v.check(ok, "destination", "must be an absolute http or https URL")
        .max_len("destination", destination, MAX_DESTINATION_LEN);
}

impl LinkCreateInput {
    pub fn normalize(self) -> Result<Self, ValidationError> {
        let code = clean_optional(self.code);

        let mut v = Validator::new();
        if let Some(code) = &code {
            if let Err(e) = validate_code(code) {
                for err in e.errors {
                    v.check(false, &err.field, &err.message);
                }
            }
        }
        validate_destination(&mut v, &self.destination);
        v.optional_max_len("title", self.title.as_deref(), MAX_TITLE_LEN)
            .optional_max_len("campaign", self.campaign.as_deref(), MAX_CAMPAIGN_LEN);
        v.finish()?;

        Ok(Self {
            code,
            destination: self.destination.trim().to_string(),
            title: clean_optional(self.title),
            campaign: clean_optional(self.campaign),
        })
    }
}

impl LinkUpdateInput {
    pub fn normalize(self) -> Result<Self, ValidationError> {
        let mut v = Validator::new();
        if let Some(destination) = &self.destination {
            validate_destination(&mut v, destination);
        }
        v.optional_max_len("title", self.title.as_deref(), MAX_TITLE_LEN)
            .optional_max_len("campaign", self.campaign.as_deref(), MAX_CAMPAIGN_LEN);
        v.finish()?;

        Ok(Self {
            destination: self.destination.map(|d| d.trim().to_string()),
            title: self.title,
            campaign: self.campaign,
        })
    }
}

/// Host of a Referer header, lowercased and without a leading `www.`
pub fn referrer_host(referrer: &str) -> Option<String> {
    let url = Url::parse(referrer.trim()).ok()?;
    let host = url.host_str()?.to_lowercase();
    Some(host.strip_prefix("www.").map(str::to_string).unwrap_or(host))
}
