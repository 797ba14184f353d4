// ABOUTME: Testimonial storage layer using SQLite
// ABOUTME: Submission, moderation, featuring and soft delete

use chrono::Utc;
use porchlight_core::{generate_id, ValidationError};
use porchlight_storage::{StorageError, StorageResult};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::debug;

use crate::types::{Testimonial, TestimonialInput, TestimonialStats, TestimonialStatus};

pub struct TestimonialStorage {
    pool: SqlitePool,
}

impl TestimonialStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a visitor submission; it stays hidden until approved
    pub async fn submit(&self, input: TestimonialInput) -> StorageResult<Testimonial> {
        let input = input.normalize()?;
        let testimonial_id = generate_id("testimonial");

        debug!("Creating testimonial: {} (rating: {})", testimonial_id, input.rating);

        sqlx::query(
            r#"
            INSERT INTO testimonials (id, author_name, location, rating, content, situation, status, featured, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?)
            "#,
        )
        .bind(&testimonial_id)
        .bind(&input.author_name)
        .bind(&input.location)
        .bind(input.rating)
        .bind(&input.content)
        .bind(&input.situation)
        .bind(TestimonialStatus::Pending)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.get(&testimonial_id).await
    }

    pub async fn get(&self, testimonial_id: &str) -> StorageResult<Testimonial> {
        let row = sqlx::query("SELECT * FROM testimonials WHERE id = ? AND deleted_at IS NULL")
            .bind(testimonial_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::not_found(format!("Testimonial {}", testimonial_id)))?;

        row_to_testimonial(&row)
    }

    /// Approved testimonials for the public site, featured first, then newest
    pub async fn list_public(&self, limit: i64) -> StorageResult<Vec<Testimonial>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM testimonials
            WHERE status = 'approved' AND deleted_at IS NULL
            ORDER BY featured DESC, created_at DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_testimonial).collect()
    }

    pub async fn list_paginated(
        &self,
        status: Option<TestimonialStatus>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> StorageResult<(Vec<Testimonial>, i64)> {
        debug!(
            "Fetching testimonials (status: {:?}, limit: {:?}, offset: {:?})",
            status, limit, offset
        );

        let (count_query, list_query) = match status {
            Some(_) => (
                "SELECT COUNT(*) FROM testimonials WHERE deleted_at IS NULL AND status = ?",
                "SELECT * FROM testimonials WHERE deleted_at IS NULL AND status = ? ORDER BY created_at DESC LIMIT ? OFFSET ?",
            ),
            None => (
                "SELECT COUNT(*) FROM testimonials WHERE deleted_at IS NULL",
                "SELECT * FROM testimonials WHERE deleted_at IS NULL ORDER BY created_at DESC LIMIT ? OFFSET ?",
            ),
        };

        let mut count = sqlx::query_scalar(count_query);
        let mut list = sqlx::query(list_query);
        if let Some(status) = status {
            count = count.bind(status);
            list = list.bind(status);
        }

        let total: i64 = count.fetch_one(&self.pool).await?;
        // LIMIT -1 means no limit in SQLite
        let rows = list
            .bind(limit.unwrap_or(-1))
            .bind(offset.unwrap_or(0))
            .fetch_all(&self.pool)
            .await?;

        let testimonials = rows.iter().map(row_to_testimonial).collect::<Result<Vec<_>, _>>()?;
        Ok((testimonials, total))
    }

    /// Approve or reject. Rejecting also clears the featured flag.
    pub async fn moderate(
        &self,
        testimonial_id: &str,
        status: TestimonialStatus,
    ) -> StorageResult<Testimonial> {
        if status == TestimonialStatus::Pending {
            return Err(ValidationError::single("status", "must be approved or rejected").into());
        }

        debug!("Moderating testimonial {}: {}", testimonial_id, status);

        let result = sqlx::query(
            r#"
            UPDATE testimonials
            SET status = ?, reviewed_at = ?, featured = CASE WHEN ? = 'approved' THEN featured ELSE 0 END
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(status)
        .bind(Utc::now())
        .bind(status)
        .bind(testimonial_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found(format!("Testimonial {}", testimonial_id)));
        }
        self.get(testimonial_id).await
    }

    pub async fn set_featured(&self, testimonial_id: &str, featured: bool) -> StorageResult<Testimonial> {
        let testimonial = self.get(testimonial_id).await?;
        if featured && testimonial.status != TestimonialStatus::Approved {
            return Err(StorageError::Conflict(
                "Only approved testimonials can be featured".to_string(),
            ));
        }

        sqlx::query("UPDATE testimonials SET featured = ? WHERE id = ?")
            .bind(featured)
            .bind(testimonial_id)
            .execute(&self.pool)
            .await?;

        self.get(testimonial_id).await
    }

    pub async fn soft_delete(&self, testimonial_id: &str) -> StorageResult<()> {
        let result = sqlx::query(
            "UPDATE testimonials SET deleted_at = ?, featured = 0 WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(Utc::now())
        .bind(testimonial_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found(format!("Testimonial {}", testimonial_id)));
        }
        Ok(())
    }

    pub async fn stats(&self) -> StorageResult<TestimonialStats> {
        let row = sqlx::query(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN status = 'pending' THEN 1 ELSE 0 END), 0) AS pending,
                COALESCE(SUM(CASE WHEN status = 'approved' THEN 1 ELSE 0 END), 0) AS approved,
                COALESCE(SUM(CASE WHEN status = 'rejected' THEN 1 ELSE 0 END), 0) AS rejected,
                COALESCE(SUM(featured), 0) AS featured,
                AVG(CASE WHEN status = 'approved' THEN CAST(rating AS REAL) END) AS average_rating
            FROM testimonials
            WHERE deleted_at IS NULL
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(TestimonialStats {
            pending: row.try_get("pending")?,
            approved: row.try_get("approved")?,
            rejected: row.try_get("rejected")?,
            featured: row.try_get("featured")?,
            average_rating: row.try_get("average_rating")?,
        })
    }
}

fn row_to_testimonial(row: &SqliteRow) -> StorageResult<Testimonial> {
    Ok(Testimonial {
        id: row.try_get("id")?,
        author_name: row.try_get("author_name")?,
        location: row.try_get("location")?,
        rating: row.try_get("rating")?,
        content: row.try_get("content")?,
        situation: row.try_get("situation")?,
        status: row.try_get("status")?,
        featured: row.try_get("featured")?,
        created_at: row.try_get("created_at")?,
        reviewed_at: row.try_get("reviewed_at")?,
        deleted_at: row.try_get("deleted_at")?,
    })
}
