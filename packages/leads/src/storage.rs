// ABOUTME: Lead storage layer using SQLite
// ABOUTME: CRUD, pipeline status changes, CRM sync bookkeeping and soft delete

use std::collections::BTreeMap;

use chrono::{Duration, Utc};
use porchlight_core::generate_id;
use porchlight_storage::{StorageError, StorageResult};
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::types::{CrmSyncStatus, Lead, LeadCreateInput, LeadFilter, LeadStats, LeadStatus};

/// Outcome of a CRM push, recorded against the lead
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrmSyncOutcome {
    Synced { contact_id: String },
    Failed { error: String },
    Skipped,
}

pub struct LeadStorage {
    pool: SqlitePool,
}

impl LeadStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_lead(&self, input: LeadCreateInput) -> StorageResult<Lead> {
        let mut conn = self.pool.acquire().await?;
        let lead_id = insert_lead(&mut *conn, &input).await?;
        drop(conn);

        self.get_lead(&lead_id).await
    }

    pub async fn get_lead(&self, lead_id: &str) -> StorageResult<Lead> {
        debug!("Fetching lead: {}", lead_id);

        let row = sqlx::query("SELECT * FROM leads WHERE id = ?")
            .bind(lead_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::not_found(format!("Lead {}", lead_id)))?;

        row_to_lead(&row)
    }

    /// List leads, newest first, with the total matching count
    pub async fn list_leads_paginated(
        &self,
        filter: &LeadFilter,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> StorageResult<(Vec<Lead>, i64)> {
        debug!(
            "Fetching leads (filter: {:?}, limit: {:?}, offset: {:?})",
            filter, limit, offset
        );

        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM leads WHERE 1 = 1");
        push_filter(&mut count_query, filter);
        let total: i64 = count_query.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM leads WHERE 1 = 1");
        push_filter(&mut query, filter);
        query.push(" ORDER BY created_at DESC, id DESC");
        if let Some(lim) = limit {
            query.push(" LIMIT ").push_bind(lim);
            if let Some(off) = offset {
                query.push(" OFFSET ").push_bind(off);
            }
        }

        let rows = query.build().fetch_all(&self.pool).await?;
        let leads = rows.iter().map(row_to_lead).collect::<Result<Vec<_>, _>>()?;

        Ok((leads, total))
    }

    /// Move a lead through the pipeline. Same-status updates succeed unchanged.
    pub async fn update_status(&self, lead_id: &str, status: LeadStatus) -> StorageResult<Lead> {
        let lead = self.get_lead(lead_id).await?;

        if lead.status == status {
            return Ok(lead);
        }
        if !lead.status.can_transition_to(status) {
            return Err(StorageError::InvalidTransition {
                entity: "lead",
                from: lead.status.to_string(),
                to: status.to_string(),
            });
        }

        debug!("Updating lead {} status: {} -> {}", lead_id, lead.status, status);

        sqlx::query("UPDATE leads SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status)
            .bind(Utc::now())
            .bind(lead_id)
            .execute(&self.pool)
            .await?;

        self.get_lead(lead_id).await
    }

    pub async fn update_notes(&self, lead_id: &str, notes: Option<String>) -> StorageResult<Lead> {
        let result = sqlx::query("UPDATE leads SET notes = ?, updated_at = ? WHERE id = ?")
            .bind(porchlight_core::clean_optional(notes))
            .bind(Utc::now())
            .bind(lead_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found(format!("Lead {}", lead_id)));
        }
        self.get_lead(lead_id).await
    }

    pub async fn record_crm_sync(&self, lead_id: &str, outcome: CrmSyncOutcome) -> StorageResult<Lead> {
        let now = Utc::now();
        debug!("Recording CRM sync for {}: {:?}", lead_id, outcome);

        let query = match &outcome {
            CrmSyncOutcome::Synced { contact_id } => sqlx::query(
                "UPDATE leads SET crm_sync_status = ?, crm_contact_id = ?, crm_last_error = NULL, crm_synced_at = ?, updated_at = ? WHERE id = ?",
            )
            .bind(CrmSyncStatus::Synced)
            .bind(contact_id)
            .bind(now),
            CrmSyncOutcome::Failed { error } => sqlx::query(
                "UPDATE leads SET crm_sync_status = ?, crm_last_error = ?, updated_at = ? WHERE id = ?",
            )
            .bind(CrmSyncStatus::Failed)
            .bind(error),
            CrmSyncOutcome::Skipped => {
                sqlx::query("UPDATE leads SET crm_sync_status = ?, updated_at = ? WHERE id = ?")
                    .bind(CrmSyncStatus::Skipped)
            }
        };

        let result = query.bind(now).bind(lead_id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::not_found(format!("Lead {}", lead_id)));
        }

        self.get_lead(lead_id).await
    }

    /// Leads whose CRM push is still outstanding, oldest first
    pub async fn pending_crm_sync(&self, limit: i64) -> StorageResult<Vec<Lead>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM leads
            WHERE deleted_at IS NULL AND crm_sync_status IN ('pending', 'failed')
            ORDER BY created_at ASC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_lead).collect()
    }

    pub async fn soft_delete(&self, lead_id: &str) -> StorageResult<()> {
        debug!("Soft-deleting lead: {}", lead_id);

        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE leads SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(now)
        .bind(lead_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found(format!("Lead {}", lead_id)));
        }
        Ok(())
    }

    pub async fn restore(&self, lead_id: &str) -> StorageResult<Lead> {
        let result = sqlx::query(
            "UPDATE leads SET deleted_at = NULL, updated_at = ? WHERE id = ? AND deleted_at IS NOT NULL",
        )
        .bind(Utc::now())
        .bind(lead_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found(format!("Deleted lead {}", lead_id)));
        }
        self.get_lead(lead_id).await
    }

    /// Dashboard counts; soft-deleted leads are excluded
    pub async fn stats(&self) -> StorageResult<LeadStats> {
        let mut stats = LeadStats::default();

        let rows = sqlx::query(
            "SELECT status, COUNT(*) AS count FROM leads WHERE deleted_at IS NULL GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;
        for row in rows {
            let status: String = row.try_get("status")?;
            let count: i64 = row.try_get("count")?;
            stats.total += count;
            stats.by_status.insert(status, count);
        }

        let rows = sqlx::query(
            "SELECT source, COUNT(*) AS count FROM leads WHERE deleted_at IS NULL GROUP BY source",
        )
        .fetch_all(&self.pool)
        .await?;
        let mut by_source = BTreeMap::new();
        for row in rows {
            let source: String = row.try_get("source")?;
            let count: i64 = row.try_get("count")?;
            by_source.insert(source, count);
        }
        stats.by_source = by_source;

        let now = Utc::now();
        stats.last_7_days = self.count_since(now - Duration::days(7)).await?;
        stats.last_30_days = self.count_since(now - Duration::days(30)).await?;

        stats.crm_failed = sqlx::query_scalar(
            "SELECT COUNT(*) FROM leads WHERE deleted_at IS NULL AND crm_sync_status = 'failed'",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }

    async fn count_since(&self, since: chrono::DateTime<Utc>) -> StorageResult<i64> {
        let count = sqlx::query_scalar(
            "SELECT COUNT(*) FROM leads WHERE deleted_at IS NULL AND created_at >= ?",
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

/// Insert a lead on an existing connection so callers can wrap it in a transaction
pub(crate) async fn insert_lead(
    conn: &mut SqliteConnection,
    input: &LeadCreateInput,
) -> StorageResult<String> {
    let lead_id = generate_id("lead");
    let now = Utc::now();

    debug!("Creating lead: {} (source: {})", lead_id, input.source);

    sqlx::query(
        r#"
        INSERT INTO leads (
            id, source, name, email, phone, property_address, message, notice_date, page,
            utm_source, utm_medium, utm_campaign, status, crm_sync_status, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&lead_id)
    .bind(input.source)
    .bind(&input.name)
    .bind(&input.email)
    .bind(&input.phone)
    .bind(&input.property_address)
    .bind(&input.message)
    .bind(input.notice_date)
    .bind(&input.page)
    .bind(&input.utm.utm_source)
    .bind(&input.utm.utm_medium)
    .bind(&input.utm.utm_campaign)
    .bind(LeadStatus::New)
    .bind(CrmSyncStatus::Pending)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(lead_id)
}

fn push_filter(query: &mut QueryBuilder<'_, Sqlite>, filter: &LeadFilter) {
    if !filter.include_deleted {
        query.push(" AND deleted_at IS NULL");
    }
    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status);
    }
    if let Some(source) = filter.source {
        query.push(" AND source = ").push_bind(source);
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search.to_lowercase());
        query
            .push(" AND (LOWER(COALESCE(name, '')) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR LOWER(email) LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(after) = filter.created_after {
        query.push(" AND created_at >= ").push_bind(after);
    }
    if let Some(before) = filter.created_before {
        query.push(" AND created_at < ").push_bind(before);
    }
}

pub(crate) fn row_to_lead(row: &SqliteRow) -> StorageResult<Lead> {
    Ok(Lead {
        id: row.try_get("id")?,
        source: row.try_get("source")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        property_address: row.try_get("property_address")?,
        message: row.try_get("message")?,
        notice_date: row.try_get("notice_date")?,
        page: row.try_get("page")?,
        utm_source: row.try_get("utm_source")?,
        utm_medium: row.try_get("utm_medium")?,
        utm_campaign: row.try_get("utm_campaign")?,
        status: row.try_get("status")?,
        notes: row.try_get("notes")?,
        crm_sync_status: row.try_get("crm_sync_status")?,
        crm_contact_id: row.try_get("crm_contact_id")?,
        crm_last_error: row.try_get("crm_last_error")?,
        crm_synced_at: row.try_get("crm_synced_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        deleted_at: row.try_get("deleted_at")?,
    })
}
