// ABOUTME: Experiment type definitions
// ABOUTME: Lifecycle statuses, variants, tracked events and admin inputs

use std::fmt;

use chrono::{DateTime, Utc};
use porchlight_core::validation::MAX_NAME_LEN;
use porchlight_core::{clean_optional, slugify, ValidationError, Validator};
use serde::{Deserialize, Serialize};

const MAX_KEY_LEN: usize = 64;
const MAX_DESCRIPTION_LEN: usize = 1000;
pub const MIN_WEIGHT: i64 = 1;
pub const MAX_WEIGHT: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ExperimentStatus {
    #[default]
    Draft,
    Running,
    Paused,
    Completed,
}

impl ExperimentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperimentStatus::Draft => "draft",
            ExperimentStatus::Running => "running",
            ExperimentStatus::Paused => "paused",
            ExperimentStatus::Completed => "completed",
        }
    }

    pub fn can_transition_to(&self, next: ExperimentStatus) -> bool {
        use ExperimentStatus::*;

        matches!(
            (self, next),
            (Draft, Running) | (Running, Paused | Completed) | (Paused, Running | Completed)
        )
    }
}

impl fmt::Display for ExperimentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Impression,
    Conversion,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Impression => f.write_str("impression"),
            EventKind::Conversion => f.write_str("conversion"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: String,
    pub experiment_id: String,
    pub key: String,
    pub name: String,
    pub weight: i64,
    pub is_control: bool,
    pub position: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experiment {
    pub id: String,
    pub key: String,
    pub name: String,
    pub description: Option<String>,
    pub status: ExperimentStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Ordered by position
    pub variants: Vec<Variant>,
}

impl Experiment {
    pub fn control(&self) -> Option<&Variant> {
        self.variants.iter().find(|v| v.is_control)
    }

    pub fn variant_by_key(&self, key: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.key == key)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantInput {
    pub key: String,
    pub name: String,
    #[serde(default = "default_weight")]
    pub weight: i64,
    #[serde(default)]
    pub is_control: bool,
}

fn default_weight() -> i64 {
    50
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentCreateInput {
    /// Derived from the name when absent
    pub key: Option<String>,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub variants: Vec<VariantInput>,
}

impl ExperimentCreateInput {
    pub fn normalize(self) -> Result<Self, ValidationError> {
        let key = clean_optional(self.key)
            .map(|k| slugify(&k))
            .unwrap_or_else(|| slugify(&self.name));

        let mut v = Validator::new();
        v.required("name", &self.name)
            .max_len("name", &self.name, MAX_NAME_LEN)
            .check(!key.is_empty(), "key", "is required")
            .max_len("key", &key, MAX_KEY_LEN)
            .optional_max_len("description", self.description.as_deref(), MAX_DESCRIPTION_LEN);
        let variants = validate_variants(&mut v, self.variants);
        v.finish()?;

        Ok(Self {
            key: Some(key),
            name: self.name.trim().to_string(),
            description: clean_optional(self.description),
            variants,
        })
    }
}

/// Variants may only be replaced while the experiment is a draft
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentUpdateInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub variants: Option<Vec<VariantInput>>,
}

impl ExperimentUpdateInput {
    pub fn normalize(self) -> Result<Self, ValidationError> {
        let mut v = Validator::new();
        if let Some(name) = &self.name {
            v.required("name", name).max_len("name", name, MAX_NAME_LEN);
        }
        v.optional_max_len("description", self.description.as_deref(), MAX_DESCRIPTION_LEN);
        let variants = self.variants.map(|variants| validate_variants(&mut v, variants));
        v.finish()?;

        Ok(Self {
            name: self.name.map(|n| n.trim().to_string()),
            description: self.description,
            variants,
        })
    }
}

fn validate_variants(v: &mut Validator, variants: Vec<VariantInput>) -> Vec<VariantInput> {
    let mut seen: Vec<String> = Vec::with_capacity(variants.len());
    let mut out = Vec::with_capacity(variants.len());

    for input in variants {
        let key = slugify(&input.key);
        v.check(!key.is_empty(), "variants.key", "is required")
            .max_len("variants.key", &key, MAX_KEY_LEN)
            .required("variants.name", &input.name)
            .max_len("variants.name", &input.name, MAX_NAME_LEN)
            .range("variants.weight", input.weight, MIN_WEIGHT, MAX_WEIGHT)
            .check(!seen.contains(&key), "variants.key", "must be unique");
        seen.push(key.clone());

        out.push(VariantInput {
            key,
            name: input.name.trim().to_string(),
            weight: input.weight,
            is_control: input.is_control,
        });
    }

    out
}

/// Which variant a visitor sees
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub experiment_key: String,
    pub variant_key: String,
    pub variant_name: String,
    pub is_control: bool,
    /// False when the experiment is not running and the control is served
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantResult {
    pub variant_key: String,
    pub variant_name: String,
    pub is_control: bool,
    pub impressions: i64,
    pub conversions: i64,
    pub conversion_rate: f64,
    /// Relative lift over the control rate, None for the control or a zero control rate
    pub lift: Option<f64>,
    pub z_score: Option<f64>,
    pub significant: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentResults {
    pub experiment_id: String,
    pub experiment_key: String,
    pub status: ExperimentStatus,
    pub variants: Vec<VariantResult>,
    pub winner: Option<String>,
}
