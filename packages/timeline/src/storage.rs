// ABOUTME: Timeline tracker storage layer using SQLite
// ABOUTME: Saved notice dates plus per-action checklist completion

use chrono::{DateTime, NaiveDate, Utc};
use porchlight_core::{generate_id, ValidationError};
use porchlight_storage::{StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::debug;

use crate::generator::generate;
use crate::progress::{merge, CompletionMap, TrackedTimeline};
use crate::templates::find_template;
use crate::types::{TimelineError, TimelineVariant};

impl From<TimelineError> for ValidationError {
    fn from(err: TimelineError) -> Self {
        let field = match err {
            TimelineError::UnknownVariant(_) => "variant",
            _ => "noticeDate",
        };
        ValidationError::single(field, err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineTracker {
    pub id: String,
    pub notice_date: NaiveDate,
    pub variant: TimelineVariant,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackerCreateInput {
    pub notice_date: NaiveDate,
    #[serde(default)]
    pub variant: TimelineVariant,
    pub email: Option<String>,
    pub lead_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionProgress {
    pub tracker_id: String,
    pub milestone_id: String,
    pub action_index: usize,
    pub completed: bool,
    pub updated_at: DateTime<Utc>,
}

pub struct ProgressStorage {
    pool: SqlitePool,
}

impl ProgressStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Save a notice date so the visitor can come back to their checklist
    pub async fn create_tracker(&self, input: TrackerCreateInput) -> StorageResult<TimelineTracker> {
        // Reject dates whose milestones would overflow the calendar
        generate(input.notice_date, input.variant, input.notice_date).map_err(ValidationError::from)?;

        let tracker_id = generate_id("tracker");
        let now = Utc::now();

        debug!(
            "Creating timeline tracker: {} (notice_date: {}, variant: {})",
            tracker_id, input.notice_date, input.variant
        );

        sqlx::query(
            r#"
            INSERT INTO timeline_trackers (id, notice_date, variant, email, lead_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&tracker_id)
        .bind(input.notice_date)
        .bind(input.variant)
        .bind(&input.email)
        .bind(&input.lead_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get_tracker(&tracker_id).await
    }

    pub async fn get_tracker(&self, tracker_id: &str) -> StorageResult<TimelineTracker> {
        debug!("Fetching timeline tracker: {}", tracker_id);

        let row = sqlx::query("SELECT * FROM timeline_trackers WHERE id = ?")
            .bind(tracker_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::not_found(format!("Timeline {}", tracker_id)))?;

        row_to_tracker(&row)
    }

    /// Change the seed date. Stored checklist rows are kept; milestone ids are
    /// stable across dates so progress carries over.
    pub async fn update_notice_date(
        &self,
        tracker_id: &str,
        notice_date: NaiveDate,
    ) -> StorageResult<TimelineTracker> {
        let tracker = self.get_tracker(tracker_id).await?;
        generate(notice_date, tracker.variant, notice_date).map_err(ValidationError::from)?;

        debug!("Updating notice date for {}: {}", tracker_id, notice_date);

        sqlx::query("UPDATE timeline_trackers SET notice_date = ?, updated_at = ? WHERE id = ?")
            .bind(notice_date)
            .bind(Utc::now())
            .bind(tracker_id)
            .execute(&self.pool)
            .await?;

        self.get_tracker(tracker_id).await
    }

    pub async fn link_lead(&self, tracker_id: &str, lead_id: &str) -> StorageResult<()> {
        let result = sqlx::query("UPDATE timeline_trackers SET lead_id = ?, updated_at = ? WHERE id = ?")
            .bind(lead_id)
            .bind(Utc::now())
            .bind(tracker_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found(format!("Timeline {}", tracker_id)));
        }
        Ok(())
    }

    /// Tick or untick one checklist item
    pub async fn set_action_completed(
        &self,
        tracker_id: &str,
        milestone_id: &str,
        action_index: usize,
        completed: bool,
    ) -> StorageResult<ActionProgress> {
        let tracker = self.get_tracker(tracker_id).await?;

        let template = find_template(tracker.variant, milestone_id).ok_or_else(|| {
            ValidationError::single(
                "milestone_id",
                format!("Unknown milestone '{}' for {} timelines", milestone_id, tracker.variant),
            )
        })?;
        if action_index >= template.action_items.len() {
            return Err(ValidationError::single(
                "action_index",
                format!(
                    "Milestone '{}' has {} action items",
                    milestone_id,
                    template.action_items.len()
                ),
            )
            .into());
        }

        debug!(
            "Setting action {}/{} on {} to {}",
            milestone_id, action_index, tracker_id, completed
        );

        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO milestone_progress (tracker_id, milestone_id, action_index, completed, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (tracker_id, milestone_id, action_index)
            DO UPDATE SET completed = excluded.completed, updated_at = excluded.updated_at
            "#,
        )
        .bind(tracker_id)
        .bind(milestone_id)
        .bind(action_index as i64)
        .bind(completed)
        .bind(now)
        .execute(&self.pool)
        .await?;

        sqlx::query("UPDATE timeline_trackers SET updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(tracker_id)
            .execute(&self.pool)
            .await?;

        Ok(ActionProgress {
            tracker_id: tracker_id.to_string(),
            milestone_id: milestone_id.to_string(),
            action_index,
            completed,
            updated_at: now,
        })
    }

    pub async fn completion_map(&self, tracker_id: &str) -> StorageResult<CompletionMap> {
        let rows = sqlx::query(
            "SELECT milestone_id, action_index, completed FROM milestone_progress WHERE tracker_id = ?",
        )
        .bind(tracker_id)
        .fetch_all(&self.pool)
        .await?;

        let mut map = CompletionMap::new();
        for row in rows {
            let milestone_id: String = row.try_get("milestone_id")?;
            let index: i64 = row.try_get("action_index")?;
            let completed: bool = row.try_get("completed")?;
            map.insert((milestone_id, index as usize), completed);
        }
        Ok(map)
    }

    /// Regenerate the tracker's timeline for `today` and merge stored progress
    pub async fn load_tracked(&self, tracker_id: &str, today: NaiveDate) -> StorageResult<TrackedTimeline> {
        let tracker = self.get_tracker(tracker_id).await?;
        let timeline =
            generate(tracker.notice_date, tracker.variant, today).map_err(ValidationError::from)?;
        let completion = self.completion_map(tracker_id).await?;

        let mut tracked = merge(timeline, &completion);
        tracked.tracker_id = Some(tracker.id);
        Ok(tracked)
    }
}

fn row_to_tracker(row: &SqliteRow) -> StorageResult<TimelineTracker> {
    Ok(TimelineTracker {
        id: row.try_get("id")?,
        notice_date: row.try_get("notice_date")?,
        variant: row.try_get("variant")?,
        email: row.try_get("email")?,
        lead_id: row.try_get("lead_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
