// ABOUTME: Article storage layer using SQLite
// ABOUTME: Drafts, publishing and public lookups for blog posts and guides

use chrono::Utc;
use porchlight_core::{clean_optional, generate_id, slugify};
use porchlight_storage::{StorageError, StorageResult};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::debug;

use crate::types::{Article, ArticleInput, ArticleKind, ArticleUpdateInput};

/// Suffixes tried for a title-derived slug before giving up
const SLUG_ATTEMPTS: usize = 50;

pub struct ArticleStorage {
    pool: SqlitePool,
}

impl ArticleStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create an unpublished article.
    ///
    /// A slug derived from the title gets a numeric suffix when taken;
    /// an explicit slug that is taken is a `Duplicate`.
    pub async fn create_article(&self, input: ArticleInput) -> StorageResult<Article> {
        let input = input.normalize()?;
        let slug = match &input.slug {
            Some(slug) => {
                if self.slug_taken(slug, None).await? {
                    return Err(StorageError::Duplicate(format!("article slug '{}'", slug)));
                }
                slug.clone()
            }
            None => self.unique_slug(&slugify(&input.title)).await?,
        };

        let article_id = generate_id("article");
        let now = Utc::now();

        debug!("Creating article: {} ({})", article_id, slug);

        sqlx::query(
            r#"
            INSERT INTO articles (id, slug, title, summary, body, kind, tags, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&article_id)
        .bind(&slug)
        .bind(&input.title)
        .bind(&input.summary)
        .bind(&input.body)
        .bind(input.kind)
        .bind(serde_json::to_string(&input.tags)?)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::from_insert(e, format!("article slug '{}'", slug)))?;

        self.get_article(&article_id).await
    }

    pub async fn get_article(&self, article_id: &str) -> StorageResult<Article> {
        let row = sqlx::query("SELECT * FROM articles WHERE id = ?")
            .bind(article_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::not_found(format!("Article {}", article_id)))?;

        row_to_article(&row)
    }

    /// Public lookup; drafts are invisible
    pub async fn get_published_by_slug(&self, slug: &str) -> StorageResult<Article> {
        let row = sqlx::query("SELECT * FROM articles WHERE slug = ? AND published_at IS NOT NULL")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::not_found(format!("Article '{}'", slug)))?;

        row_to_article(&row)
    }

    /// Published articles, newest first, optionally of one kind
    pub async fn list_published(
        &self,
        kind: Option<ArticleKind>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> StorageResult<(Vec<Article>, i64)> {
        self.list(kind, true, limit, offset).await
    }

    /// Admin listing including drafts, most recently edited first
    pub async fn list_all(
        &self,
        kind: Option<ArticleKind>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> StorageResult<(Vec<Article>, i64)> {
        self.list(kind, false, limit, offset).await
    }

    async fn list(
        &self,
        kind: Option<ArticleKind>,
        published_only: bool,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> StorageResult<(Vec<Article>, i64)> {
        debug!(
            "Fetching articles (kind: {:?}, published_only: {}, limit: {:?}, offset: {:?})",
            kind, published_only, limit, offset
        );

        let mut conditions: Vec<&str> = Vec::new();
        if kind.is_some() {
            conditions.push("kind = ?");
        }
        if published_only {
            conditions.push("published_at IS NOT NULL");
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        let order = if published_only {
            "published_at DESC, id DESC"
        } else {
            "updated_at DESC, id DESC"
        };

        let count_sql = format!("SELECT COUNT(*) FROM articles{}", where_clause);
        let list_sql = format!(
            "SELECT * FROM articles{} ORDER BY {} LIMIT ? OFFSET ?",
            where_clause, order
        );

        let mut count = sqlx::query_scalar(&count_sql);
        let mut list = sqlx::query(&list_sql);
        if let Some(kind) = kind {
            count = count.bind(kind);
            list = list.bind(kind);
        }

        let total: i64 = count.fetch_one(&self.pool).await?;
        let rows = list
            .bind(limit.unwrap_or(-1))
            .bind(offset.unwrap_or(0))
            .fetch_all(&self.pool)
            .await?;

        let articles = rows.iter().map(row_to_article).collect::<Result<Vec<_>, _>>()?;
        Ok((articles, total))
    }

    pub async fn update_article(
        &self,
        article_id: &str,
        input: ArticleUpdateInput,
    ) -> StorageResult<Article> {
        let input = input.normalize()?;
        let current = self.get_article(article_id).await?;

        if let Some(slug) = &input.slug {
            if *slug != current.slug && self.slug_taken(slug, Some(article_id)).await? {
                return Err(StorageError::Duplicate(format!("article slug '{}'", slug)));
            }
        }

        let slug = input.slug.unwrap_or(current.slug);
        let title = input.title.unwrap_or(current.title);
        let summary = match input.summary {
            Some(s) => clean_optional(Some(s)),
            None => current.summary,
        };
        let body = input.body.unwrap_or(current.body);
        let kind = input.kind.unwrap_or(current.kind);
        let tags = input.tags.unwrap_or(current.tags);

        debug!("Updating article {}", article_id);

        sqlx::query(
            r#"
            UPDATE articles
            SET slug = ?, title = ?, summary = ?, body = ?, kind = ?, tags = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&slug)
        .bind(&title)
        .bind(&summary)
        .bind(&body)
        .bind(kind)
        .bind(serde_json::to_string(&tags)?)
        .bind(Utc::now())
        .bind(article_id)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::from_insert(e, format!("article slug '{}'", slug)))?;

        self.get_article(article_id).await
    }

    /// Publishing an already published article keeps its original date
    pub async fn publish(&self, article_id: &str) -> StorageResult<Article> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE articles SET published_at = COALESCE(published_at, ?), updated_at = ? WHERE id = ?",
        )
        .bind(now)
        .bind(now)
        .bind(article_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found(format!("Article {}", article_id)));
        }
        self.get_article(article_id).await
    }

    pub async fn unpublish(&self, article_id: &str) -> StorageResult<Article> {
        let result =
            sqlx::query("UPDATE articles SET published_at = NULL, updated_at = ? WHERE id = ?")
                .bind(Utc::now())
                .bind(article_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found(format!("Article {}", article_id)));
        }
        self.get_article(article_id).await
    }

    pub async fn delete_article(&self, article_id: &str) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM articles WHERE id = ?")
            .bind(article_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found(format!("Article {}", article_id)));
        }
        Ok(())
    }

    async fn slug_taken(&self, slug: &str, except_id: Option<&str>) -> StorageResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles WHERE slug = ? AND id != ?")
            .bind(slug)
            .bind(except_id.unwrap_or(""))
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    async fn unique_slug(&self, base: &str) -> StorageResult<String> {
        if !self.slug_taken(base, None).await? {
            return Ok(base.to_string());
        }
        for n in 2..=SLUG_ATTEMPTS + 1 {
            let candidate = format!("{}-{}", base, n);
            if !self.slug_taken(&candidate, None).await? {
                return Ok(candidate);
            }
        }
        Err(StorageError::Duplicate(format!("article slug '{}'", base)))
    }
}

fn row_to_article(row: &SqliteRow) -> StorageResult<Article> {
    let tags_json: String = row.try_get("tags")?;

    Ok(Article {
        id: row.try_get("id")?,
        slug: row.try_get("slug")?,
        title: row.try_get("title")?,
        summary: row.try_get("summary")?,
        body: row.try_get("body")?,
        kind: row.try_get("kind")?,
        tags: serde_json::from_str(&tags_json)?,
        published_at: row.try_get("published_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
