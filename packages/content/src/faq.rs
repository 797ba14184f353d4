// ABOUTME: FAQ storage layer using SQLite
// ABOUTME: Entry CRUD and category-grouped listing in display order

use chrono::Utc;
use porchlight_core::generate_id;
use porchlight_storage::{StorageError, StorageResult};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::debug;

use crate::types::{FaqCategory, FaqEntry, FaqInput, DEFAULT_FAQ_CATEGORY};

pub struct FaqStorage {
    pool: SqlitePool,
}

impl FaqStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_entry(&self, input: FaqInput) -> StorageResult<FaqEntry> {
        let input = input.normalize()?;
        let category = input
            .category
            .unwrap_or_else(|| DEFAULT_FAQ_CATEGORY.to_string());
        let position = match input.position {
            Some(p) => p,
            None => self.next_position(&category).await?,
        };
        let entry_id = generate_id("faq");
        let now = Utc::now();

        debug!("Creating FAQ entry: {} ({} #{})", entry_id, category, position);

        sqlx::query(
            r#"
            INSERT INTO faq_entries (id, question, answer, category, position, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry_id)
        .bind(&input.question)
        .bind(&input.answer)
        .bind(&category)
        .bind(position)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get_entry(&entry_id).await
    }

    pub async fn get_entry(&self, entry_id: &str) -> StorageResult<FaqEntry> {
        let row = sqlx::query("SELECT * FROM faq_entries WHERE id = ?")
            .bind(entry_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::not_found(format!("FAQ entry {}", entry_id)))?;

        row_to_entry(&row)
    }

    /// Replace question, answer, category and position
    pub async fn update_entry(&self, entry_id: &str, input: FaqInput) -> StorageResult<FaqEntry> {
        let input = input.normalize()?;
        let current = self.get_entry(entry_id).await?;
        let category = input
            .category
            .unwrap_or_else(|| DEFAULT_FAQ_CATEGORY.to_string());
        let position = match input.position {
            Some(p) => p,
            None if category == current.category => current.position,
            None => self.next_position(&category).await?,
        };

        sqlx::query(
            r#"
            UPDATE faq_entries
            SET question = ?, answer = ?, category = ?, position = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&input.question)
        .bind(&input.answer)
        .bind(&category)
        .bind(position)
        .bind(Utc::now())
        .bind(entry_id)
        .execute(&self.pool)
        .await?;

        self.get_entry(entry_id).await
    }

    pub async fn delete_entry(&self, entry_id: &str) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM faq_entries WHERE id = ?")
            .bind(entry_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found(format!("FAQ entry {}", entry_id)));
        }
        Ok(())
    }

    /// All entries grouped by category (alphabetical), each in position order
    pub async fn list_grouped(&self) -> StorageResult<Vec<FaqCategory>> {
        let rows = sqlx::query(
            "SELECT * FROM faq_entries ORDER BY category ASC, position ASC, created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut groups: Vec<FaqCategory> = Vec::new();
        for row in &rows {
            let entry = row_to_entry(row)?;
            match groups.last_mut() {
                Some(group) if group.category == entry.category => group.entries.push(entry),
                _ => groups.push(FaqCategory {
                    category: entry.category.clone(),
                    entries: vec![entry],
                }),
            }
        }
        Ok(groups)
    }

    async fn next_position(&self, category: &str) -> StorageResult<i64> {
        let max: Option<i64> =
            sqlx::query_scalar("SELECT MAX(position) FROM faq_entries WHERE category = ?")
                .bind(category)
                .fetch_one(&self.pool)
                .await?;
        Ok(max.map(|m| m + 1).unwrap_or(0))
    }
}

fn row_to_entry(row: &SqliteRow) -> StorageResult<FaqEntry> {
    Ok(FaqEntry {
        id: row.try_get("id")?,
        question: row.try_get("question")?,
        answer: row.try_get("answer")?,
        category: row.try_get("category")?,
        position: row.try_get("position")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
