// ABOUTME: Experiment storage layer using SQLite
// ABOUTME: Experiment CRUD, lifecycle changes, event recording and results

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use porchlight_core::{clean_optional, generate_id, ValidationError};
use porchlight_storage::{StorageError, StorageResult};
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::assignment::assign_variant;
use crate::results::{compute_results, VariantCounts};
use crate::types::{
    Assignment, EventKind, Experiment, ExperimentCreateInput, ExperimentResults, ExperimentStatus,
    ExperimentUpdateInput, Variant, VariantInput,
};

pub struct ExperimentStorage {
    pool: SqlitePool,
}

impl ExperimentStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a draft experiment with its variants
    pub async fn create_experiment(&self, input: ExperimentCreateInput) -> StorageResult<Experiment> {
        let input = input.normalize()?;
        let key = input.key.unwrap_or_default();
        let experiment_id = generate_id("experiment");

        debug!("Creating experiment: {} ({})", experiment_id, key);

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO experiments (id, key, name, description, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&experiment_id)
        .bind(&key)
        .bind(&input.name)
        .bind(&input.description)
        .bind(ExperimentStatus::Draft)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::from_insert(e, format!("experiment key '{}'", key)))?;

        insert_variants(&mut *tx, &experiment_id, &input.variants).await?;
        tx.commit().await?;

        self.get_experiment(&experiment_id).await
    }

    pub async fn get_experiment(&self, experiment_id: &str) -> StorageResult<Experiment> {
        let row = sqlx::query("SELECT * FROM experiments WHERE id = ?")
            .bind(experiment_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::not_found(format!("Experiment {}", experiment_id)))?;

        self.with_variants(&row).await
    }

    pub async fn get_by_key(&self, key: &str) -> StorageResult<Experiment> {
        let row = sqlx::query("SELECT * FROM experiments WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::not_found(format!("Experiment '{}'", key)))?;

        self.with_variants(&row).await
    }

    pub async fn list_experiments_paginated(
        &self,
        status: Option<ExperimentStatus>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> StorageResult<(Vec<Experiment>, i64)> {
        debug!(
            "Fetching experiments (status: {:?}, limit: {:?}, offset: {:?})",
            status, limit, offset
        );

        let (count_query, list_query) = match status {
            Some(_) => (
                "SELECT COUNT(*) FROM experiments WHERE status = ?",
                "SELECT * FROM experiments WHERE status = ? ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            ),
            None => (
                "SELECT COUNT(*) FROM experiments",
                "SELECT * FROM experiments ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            ),
        };

        let mut count = sqlx::query_scalar(count_query);
        let mut list = sqlx::query(list_query);
        if let Some(status) = status {
            count = count.bind(status);
            list = list.bind(status);
        }

        let total: i64 = count.fetch_one(&self.pool).await?;
        let rows = list
            .bind(limit.unwrap_or(-1))
            .bind(offset.unwrap_or(0))
            .fetch_all(&self.pool)
            .await?;

        let mut experiments = Vec::with_capacity(rows.len());
        for row in &rows {
            experiments.push(self.with_variants(row).await?);
        }
        Ok((experiments, total))
    }

    /// Rename or describe an experiment; variants are only replaceable in draft
    pub async fn update_experiment(
        &self,
        experiment_id: &str,
        input: ExperimentUpdateInput,
    ) -> StorageResult<Experiment> {
        let input = input.normalize()?;
        let current = self.get_experiment(experiment_id).await?;

        if input.variants.is_some() && current.status != ExperimentStatus::Draft {
            return Err(StorageError::Conflict(format!(
                "Variants of a {} experiment cannot be changed",
                current.status
            )));
        }

        let name = input.name.unwrap_or(current.name);
        let description = match input.description {
            Some(d) => clean_optional(Some(d)),
            None => current.description,
        };

        debug!("Updating experiment {}", experiment_id);

        let mut tx = self.pool.begin().await?;
        sqlx::query("UPDATE experiments SET name = ?, description = ? WHERE id = ?")
            .bind(&name)
            .bind(&description)
            .bind(experiment_id)
            .execute(&mut *tx)
            .await?;

        if let Some(variants) = &input.variants {
            sqlx::query("DELETE FROM experiment_variants WHERE experiment_id = ?")
                .bind(experiment_id)
                .execute(&mut *tx)
                .await?;
            insert_variants(&mut *tx, experiment_id, variants).await?;
        }
        tx.commit().await?;

        self.get_experiment(experiment_id).await
    }

    /// Move through draft → running ⇄ paused → completed.
    ///
    /// Starting needs at least two variants and exactly one control.
    pub async fn set_status(
        &self,
        experiment_id: &str,
        status: ExperimentStatus,
    ) -> StorageResult<Experiment> {
        let current = self.get_experiment(experiment_id).await?;

        if current.status == status {
            return Ok(current);
        }
        if !current.status.can_transition_to(status) {
            return Err(StorageError::InvalidTransition {
                entity: "experiment",
                from: current.status.to_string(),
                to: status.to_string(),
            });
        }

        if status == ExperimentStatus::Running {
            let controls = current.variants.iter().filter(|v| v.is_control).count();
            let mut v = porchlight_core::Validator::new();
            v.check(
                current.variants.len() >= 2,
                "variants",
                "an experiment needs at least two variants to start",
            )
            .check(controls == 1, "variants", "exactly one variant must be the control");
            v.finish()?;
        }

        let now = Utc::now();
        let started_at: Option<DateTime<Utc>> = match status {
            ExperimentStatus::Running => current.started_at.or(Some(now)),
            _ => current.started_at,
        };
        let ended_at = match status {
            ExperimentStatus::Completed => Some(now),
            _ => None,
        };

        sqlx::query("UPDATE experiments SET status = ?, started_at = ?, ended_at = ? WHERE id = ?")
            .bind(status)
            .bind(started_at)
            .bind(ended_at)
            .bind(experiment_id)
            .execute(&self.pool)
            .await?;

        info!(
            "Experiment {} moved from {} to {}",
            current.key, current.status, status
        );
        self.get_experiment(experiment_id).await
    }

    /// Events go with the experiment
    pub async fn delete_experiment(&self, experiment_id: &str) -> StorageResult<()> {
        let current = self.get_experiment(experiment_id).await?;
        if current.status == ExperimentStatus::Running {
            return Err(StorageError::Conflict(
                "Pause or complete a running experiment before deleting it".to_string(),
            ));
        }

        sqlx::query("DELETE FROM experiments WHERE id = ?")
            .bind(experiment_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Which variant the visitor sees for the experiment with this key
    pub async fn assign(&self, key: &str, visitor_id: &str) -> StorageResult<Assignment> {
        let experiment = self.get_by_key(key).await?;
        let variant = assign_variant(&experiment, visitor_id).ok_or_else(|| {
            StorageError::Conflict(format!("Experiment '{}' has no variants", key))
        })?;

        Ok(Assignment {
            experiment_key: experiment.key.clone(),
            variant_key: variant.key.clone(),
            variant_name: variant.name.clone(),
            is_control: variant.is_control,
            active: experiment.status == ExperimentStatus::Running,
        })
    }

    /// Record an impression or conversion for the visitor's assigned variant.
    ///
    /// Returns false when the event was ignored: the experiment is not
    /// running, or the visitor already has an event of this kind.
    pub async fn record_event(
        &self,
        key: &str,
        visitor_id: &str,
        kind: EventKind,
    ) -> StorageResult<bool> {
        if visitor_id.trim().is_empty() {
            return Err(ValidationError::single("visitorId", "is required").into());
        }

        let experiment = self.get_by_key(key).await?;
        if experiment.status != ExperimentStatus::Running {
            debug!("Ignoring {} for {} experiment {}", kind, experiment.status, key);
            return Ok(false);
        }
        let Some(variant) = assign_variant(&experiment, visitor_id) else {
            return Ok(false);
        };

        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO experiment_events (experiment_id, variant_id, visitor_id, kind, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&experiment.id)
        .bind(&variant.id)
        .bind(visitor_id)
        .bind(kind)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn results(&self, experiment_id: &str) -> StorageResult<ExperimentResults> {
        let experiment = self.get_experiment(experiment_id).await?;

        let rows = sqlx::query(
            r#"
            SELECT variant_id,
                   SUM(CASE WHEN kind = 'impression' THEN 1 ELSE 0 END) AS impressions,
                   SUM(CASE WHEN kind = 'conversion' THEN 1 ELSE 0 END) AS conversions
            FROM experiment_events
            WHERE experiment_id = ?
            GROUP BY variant_id
            "#,
        )
        .bind(experiment_id)
        .fetch_all(&self.pool)
        .await?;

        let mut counts: HashMap<String, VariantCounts> = HashMap::new();
        for row in &rows {
            counts.insert(
                row.try_get("variant_id")?,
                VariantCounts {
                    impressions: row.try_get("impressions")?,
                    conversions: row.try_get("conversions")?,
                },
            );
        }

        Ok(compute_results(&experiment, |variant_id| {
            counts.get(variant_id).copied().unwrap_or_default()
        }))
    }

    async fn with_variants(&self, row: &SqliteRow) -> StorageResult<Experiment> {
        let experiment_id: String = row.try_get("id")?;
        let variant_rows = sqlx::query(
            "SELECT * FROM experiment_variants WHERE experiment_id = ? ORDER BY position ASC",
        )
        .bind(&experiment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Experiment {
            id: experiment_id,
            key: row.try_get("key")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
            started_at: row.try_get("started_at")?,
            ended_at: row.try_get("ended_at")?,
            variants: variant_rows
                .iter()
                .map(row_to_variant)
                .collect::<Result<Vec<_>, _>>()?,
        })
    }
}

async fn insert_variants(
    conn: &mut SqliteConnection,
    experiment_id: &str,
    variants: &[VariantInput],
) -> StorageResult<()> {
    for (position, variant) in variants.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO experiment_variants (id, experiment_id, key, name, weight, is_control, position)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(generate_id("variant"))
        .bind(experiment_id)
        .bind(&variant.key)
        .bind(&variant.name)
        .bind(variant.weight)
        .bind(variant.is_control)
        .bind(position as i64)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

fn row_to_variant(row: &SqliteRow) -> StorageResult<Variant> {
    Ok(Variant {
        id: row.try_get("id")?,
        experiment_id: row.try_get("experiment_id")?,
        key: row.try_get("key")?,
        name: row.try_get("name")?,
        weight: row.try_get("weight")?,
        is_control: row.try_get("is_control")?,
        position: row.try_get("position")?,
    })
}
