// ABOUTME: Timeline type definitions
// ABOUTME: Milestones, urgency and status classifications, timeline variants

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimelineError {
    #[error("Invalid notice date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("Notice date {date} plus {offset} days is outside the supported calendar")]
    DateOutOfRange { date: NaiveDate, offset: i64 },
    #[error("Unknown timeline variant '{0}'")]
    UnknownVariant(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Critical,
    Warning,
    Safe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MilestoneStatus {
    Past,
    Current,
    Upcoming,
}

/// Which fixed milestone table to use.
///
/// `Standard` backs the calculator page; `Statutory` backs the guide page,
/// which counts the full 90-day cure period before the notice of sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TimelineVariant {
    #[default]
    Standard,
    Statutory,
}

impl TimelineVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimelineVariant::Standard => "standard",
            TimelineVariant::Statutory => "statutory",
        }
    }
}

impl fmt::Display for TimelineVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimelineVariant {
    type Err = TimelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(TimelineVariant::Standard),
            "statutory" => Ok(TimelineVariant::Statutory),
            other => Err(TimelineError::UnknownVariant(other.to_string())),
        }
    }
}

/// Static description of one milestone, before a seed date is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MilestoneTemplate {
    pub id: &'static str,
    pub title: &'static str,
    pub day_offset: i64,
    pub description: &'static str,
    pub action_items: &'static [&'static str],
    pub urgency: Urgency,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    pub day_offset: i64,
    pub description: String,
    pub action_items: Vec<String>,
    pub urgency: Urgency,
    pub status: MilestoneStatus,
    /// Computed date minus today; negative once the milestone has passed
    pub days_until: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    pub notice_date: NaiveDate,
    pub variant: TimelineVariant,
    /// The "today" that statuses were classified against
    pub generated_for: NaiveDate,
    pub milestones: Vec<Milestone>,
}

impl Timeline {
    /// First milestone that has not passed yet
    pub fn next_milestone(&self) -> Option<&Milestone> {
        self.milestones
            .iter()
            .find(|m| m.status != MilestoneStatus::Past)
    }

    /// Days from today until the final milestone (the sale)
    pub fn days_until_sale(&self) -> Option<i64> {
        self.milestones.last().map(|m| m.days_until)
    }

    pub fn milestone(&self, id: &str) -> Option<&Milestone> {
        self.milestones.iter().find(|m| m.id == id)
    }
}
