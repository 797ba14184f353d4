// ABOUTME: Testimonial type definitions
// ABOUTME: Moderation status, public submission input and dashboard stats

use std::fmt;

use chrono::{DateTime, Utc};
use porchlight_core::validation::MAX_NAME_LEN;
use porchlight_core::{clean_optional, ValidationError, Validator};
use serde::{Deserialize, Serialize};

const MAX_LOCATION_LEN: usize = 100;
const MAX_CONTENT_LEN: usize = 2000;
const MIN_CONTENT_LEN: usize = 20;
const MAX_SITUATION_LEN: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TestimonialStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for TestimonialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TestimonialStatus::Pending => "pending",
            TestimonialStatus::Approved => "approved",
            TestimonialStatus::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub id: String,
    pub author_name: String,
    pub location: Option<String>,
    pub rating: i64,
    pub content: String,
    /// e.g. "Avoided foreclosure", "Sold as-is"
    pub situation: Option<String>,
    pub status: TestimonialStatus,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestimonialInput {
    pub author_name: String,
    pub location: Option<String>,
    pub rating: i64,
    pub content: String,
    pub situation: Option<String>,
}

impl TestimonialInput {
    /// Validate and trim a public submission
    pub fn normalize(self) -> Result<Self, ValidationError> {
        let mut v = Validator::new();
        v.required("authorName", &self.author_name)
            .max_len("authorName", &self.author_name, MAX_NAME_LEN)
            .optional_max_len("location", self.location.as_deref(), MAX_LOCATION_LEN)
            .range("rating", self.rating, 1, 5)
            .check(
                self.content.trim().chars().count() >= MIN_CONTENT_LEN,
                "content",
                "must be at least 20 characters",
            )
            .max_len("content", &self.content, MAX_CONTENT_LEN)
            .optional_max_len("situation", self.situation.as_deref(), MAX_SITUATION_LEN);
        v.finish()?;

        Ok(Self {
            author_name: self.author_name.trim().to_string(),
            location: clean_optional(self.location),
            rating: self.rating,
            content: self.content.trim().to_string(),
            situation: clean_optional(self.situation),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestimonialStats {
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
    pub featured: i64,
    /// Mean rating of approved testimonials, None when there are none
    pub average_rating: Option<f64>,
}
