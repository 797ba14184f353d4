// ABOUTME: Content type definitions
// ABOUTME: Articles and guides with tags, FAQ entries and their admin inputs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use porchlight_core::{clean_optional, slugify, ValidationError, Validator};
use serde::{Deserialize, Serialize};

const MAX_TITLE_LEN: usize = 200;
const MAX_SLUG_LEN: usize = 120;
const MAX_SUMMARY_LEN: usize = 500;
const MAX_BODY_LEN: usize = 100_000;
const MAX_TAGS: usize = 20;
const MAX_TAG_LEN: usize = 40;
const MAX_QUESTION_LEN: usize = 300;
const MAX_ANSWER_LEN: usize = 5000;
const MAX_CATEGORY_LEN: usize = 60;
pub const DEFAULT_FAQ_CATEGORY: &str = "general";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ArticleKind {
    #[default]
    Blog,
    Guide,
}

impl fmt::Display for ArticleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArticleKind::Blog => f.write_str("blog"),
            ArticleKind::Guide => f.write_str("guide"),
        }
    }
}

impl FromStr for ArticleKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blog" => Ok(ArticleKind::Blog),
            "guide" => Ok(ArticleKind::Guide),
            _ => Err(ValidationError::single("kind", "must be 'blog' or 'guide'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub summary: Option<String>,
    /// Markdown source; rendering happens in the site frontend
    pub body: String,
    pub kind: ArticleKind,
    pub tags: Vec<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Article {
    pub fn is_published(&self) -> bool {
        self.published_at.is_some()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleInput {
    pub slug: Option<String>,
    pub title: String,
    pub summary: Option<String>,
    pub body: String,
    #[serde(default)]
    pub kind: ArticleKind,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ArticleInput {
    pub fn normalize(self) -> Result<Self, ValidationError> {
        let slug = clean_optional(self.slug).map(|s| slugify(&s));

        let mut v = Validator::new();
        v.required("title", &self.title)
            .max_len("title", &self.title, MAX_TITLE_LEN)
            .check(
                !slugify(&self.title).is_empty() || slug.is_some(),
                "title",
                "must contain letters or digits",
            )
            .optional_max_len("summary", self.summary.as_deref(), MAX_SUMMARY_LEN)
            .required("body", &self.body)
            .max_len("body", &self.body, MAX_BODY_LEN);
        if let Some(slug) = &slug {
            v.check(!slug.is_empty(), "slug", "must contain letters or digits")
                .max_len("slug", slug, MAX_SLUG_LEN);
        }
        let tags = normalize_tags(&mut v, self.tags);
        v.finish()?;

        Ok(Self {
            slug,
            title: self.title.trim().to_string(),
            summary: clean_optional(self.summary),
            body: self.body,
            kind: self.kind,
            tags,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleUpdateInput {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub body: Option<String>,
    pub kind: Option<ArticleKind>,
    pub tags: Option<Vec<String>>,
}

impl ArticleUpdateInput {
    pub fn normalize(self) -> Result<Self, ValidationError> {
        let slug = self.slug.map(|s| slugify(&s));

        let mut v = Validator::new();
        if let Some(title) = &self.title {
            v.required("title", title).max_len("title", title, MAX_TITLE_LEN);
        }
        if let Some(slug) = &slug {
            v.check(!slug.is_empty(), "slug", "must contain letters or digits")
                .max_len("slug", slug, MAX_SLUG_LEN);
        }
        if let Some(body) = &self.body {
            v.required("body", body).max_len("body", body, MAX_BODY_LEN);
        }
        v.optional_max_len("summary", self.summary.as_deref(), MAX_SUMMARY_LEN);
        let tags = self.tags.map(|tags| normalize_tags(&mut v, tags));
        v.finish()?;

        Ok(Self {
            slug,
            title: self.title.map(|t| t.trim().to_string()),
            summary: self.summary,
            body: self.body,
            kind: self.kind,
            tags,
        })
    }
}

/// Lowercase, trim and de-duplicate tags, keeping first-seen order
fn normalize_tags(v: &mut Validator, tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if tag.is_empty() || out.contains(&tag) {
            continue;
        }
        v.max_len("tags", &tag, MAX_TAG_LEN);
        out.push(tag);
    }
    v.check(out.len() <= MAX_TAGS, "tags", "at most 20 tags are allowed");
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaqEntry {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub category: String,
    pub position: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaqInput {
    pub question: String,
    pub answer: String,
    pub category: Option<String>,
    /// Appended to the end of its category when absent
    pub position: Option<i64>,
}

impl FaqInput {
    pub fn normalize(self) -> Result<Self, ValidationError> {
        let category = clean_optional(self.category)
            .map(|c| c.to_lowercase())
            .unwrap_or_else(|| DEFAULT_FAQ_CATEGORY.to_string());

        let mut v = Validator::new();
        v.required("question", &self.question)
            .max_len("question", &self.question, MAX_QUESTION_LEN)
            .required("answer", &self.answer)
            .max_len("answer", &self.answer, MAX_ANSWER_LEN)
            .max_len("category", &category, MAX_CATEGORY_LEN);
        if let Some(position) = self.position {
            v.check(position >= 0, "position", "must not be negative");
        }
        v.finish()?;

        Ok(Self {
            question: self.question.trim().to_string(),
            answer: self.answer.trim().to_string(),
            category: Some(category),
            position: self.position,
        })
    }
}

/// FAQ entries of one category, in display order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaqCategory {
    pub category: String,
    pub entries: Vec<FaqEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article() -> ArticleInput {
        ArticleInput {
            title: "What Happens After a Notice of Default?".to_string(),
            body: "## The 90-day window\n...".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_tags_are_normalized() {
        let mut input = article();
        input.tags = vec![
            " Foreclosure ".to_string(),
            "foreclosure".to_string(),
            "".to_string(),
            "California".to_string(),
        ];
        let normalized = input.normalize().unwrap();
        assert_eq!(normalized.tags, vec!["foreclosure", "california"]);
    }

    #[test]
    fn test_explicit_slug_is_slugified() {
        let mut input = article();
        input.slug = Some("Notice Of Default".to_string());
        assert_eq!(
            input.normalize().unwrap().slug.as_deref(),
            Some("notice-of-default")
        );
    }

    #[test]
    fn test_article_requires_title_and_body() {
        let err = ArticleInput::default().normalize().unwrap_err();
        assert!(err.has_field("title"));
        assert!(err.has_field("body"));
    }

    #[test]
    fn test_faq_defaults_category() {
        let faq = FaqInput {
            question: "Can I stop the sale?".to_string(),
            answer: "Often, yes.".to_string(),
            ..Default::default()
        }
        .normalize()
        .unwrap();
        assert_eq!(faq.category.as_deref(), Some("general"));
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("guide".parse::<ArticleKind>().unwrap(), ArticleKind::Guide);
        assert!("news".parse::<ArticleKind>().is_err());
    }
}
