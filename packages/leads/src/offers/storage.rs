// ABOUTME: Cash-offer request storage layer using SQLite
// ABOUTME: Offer and linked lead are written in one transaction

use std::collections::BTreeMap;

use chrono::Utc;
use porchlight_core::{clean_optional, generate_id, ValidationError};
use porchlight_storage::{StorageError, StorageResult};
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite, SqlitePool};
use tracing::debug;

use super::types::{CashOfferRequest, NewCashOffer, OfferStats, OfferStatus, OfferStatusUpdate};
use crate::storage::insert_lead;

pub struct OfferStorage {
    pool: SqlitePool,
}

impl OfferStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a validated request together with its `cash_offer` lead
    pub async fn create_offer_request(&self, offer: NewCashOffer) -> StorageResult<CashOfferRequest> {
        let offer_id = generate_id("offer");
        let now = Utc::now();
        let details = &offer.details;

        let mut tx = self.pool.begin().await?;
        let lead_id = insert_lead(&mut *tx, &offer.lead).await?;

        debug!("Creating cash offer request: {} (lead: {})", offer_id, lead_id);

        sqlx::query(
            r#"
            INSERT INTO cash_offer_requests (
                id, lead_id, name, email, phone, property_address, city, state, zip,
                property_type, bedrooms, bathrooms, square_feet, condition, sell_timeline,
                mortgage_balance, in_foreclosure, notice_date, status, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&offer_id)
        .bind(&lead_id)
        .bind(&details.name)
        .bind(&details.email)
        .bind(&details.phone)
        .bind(&details.property_address)
        .bind(&details.city)
        .bind(&details.state)
        .bind(&details.zip)
        .bind(&details.property_type)
        .bind(details.bedrooms)
        .bind(details.bathrooms)
        .bind(details.square_feet)
        .bind(details.condition)
        .bind(details.sell_timeline)
        .bind(details.mortgage_balance)
        .bind(details.in_foreclosure)
        .bind(offer.notice_date)
        .bind(OfferStatus::Pending)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get(&offer_id).await
    }

    pub async fn get(&self, offer_id: &str) -> StorageResult<CashOfferRequest> {
        debug!("Fetching cash offer request: {}", offer_id);

        let row = sqlx::query("SELECT * FROM cash_offer_requests WHERE id = ?")
            .bind(offer_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::not_found(format!("Cash offer request {}", offer_id)))?;

        row_to_offer(&row)
    }

    pub async fn list_paginated(
        &self,
        status: Option<OfferStatus>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> StorageResult<(Vec<CashOfferRequest>, i64)> {
        debug!(
            "Fetching cash offer requests (status: {:?}, limit: {:?}, offset: {:?})",
            status, limit, offset
        );

        let mut count_query = QueryBuilder::<Sqlite>::new(
            "SELECT COUNT(*) FROM cash_offer_requests WHERE deleted_at IS NULL",
        );
        let mut query =
            QueryBuilder::<Sqlite>::new("SELECT * FROM cash_offer_requests WHERE deleted_at IS NULL");
        if let Some(status) = status {
            count_query.push(" AND status = ").push_bind(status);
            query.push(" AND status = ").push_bind(status);
        }

        let total: i64 = count_query.build_query_scalar().fetch_one(&self.pool).await?;

        query.push(" ORDER BY created_at DESC, id DESC");
        if let Some(lim) = limit {
            query.push(" LIMIT ").push_bind(lim);
            if let Some(off) = offset {
                query.push(" OFFSET ").push_bind(off);
            }
        }

        let rows = query.build().fetch_all(&self.pool).await?;
        let offers = rows.iter().map(row_to_offer).collect::<Result<Vec<_>, _>>()?;

        Ok((offers, total))
    }

    /// Move an offer through the pipeline, optionally recording the amount and notes
    pub async fn update_status(
        &self,
        offer_id: &str,
        update: OfferStatusUpdate,
    ) -> StorageResult<CashOfferRequest> {
        let current = self.get(offer_id).await?;
        if current.deleted_at.is_some() {
            return Err(StorageError::not_found(format!("Cash offer request {}", offer_id)));
        }

        if !current.status.can_transition_to(update.status) {
            return Err(StorageError::InvalidTransition {
                entity: "cash offer",
                from: current.status.to_string(),
                to: update.status.to_string(),
            });
        }

        if let Some(amount) = update.offer_amount {
            if !amount.is_finite() || amount <= 0.0 {
                return Err(ValidationError::single("offerAmount", "must be greater than zero").into());
            }
        }
        let offer_amount = update.offer_amount.or(current.offer_amount);
        if update.status == OfferStatus::OfferSent && offer_amount.is_none() {
            return Err(ValidationError::single(
                "offerAmount",
                "is required before an offer can be sent",
            )
            .into());
        }

        let admin_notes = match update.admin_notes {
            Some(notes) => clean_optional(Some(notes)),
            None => current.admin_notes,
        };

        debug!(
            "Updating cash offer {} status: {} -> {}",
            offer_id, current.status, update.status
        );

        sqlx::query(
            "UPDATE cash_offer_requests SET status = ?, offer_amount = ?, admin_notes = ?, updated_at = ? WHERE id = ?",
        )
        .bind(update.status)
        .bind(offer_amount)
        .bind(&admin_notes)
        .bind(Utc::now())
        .bind(offer_id)
        .execute(&self.pool)
        .await?;

        self.get(offer_id).await
    }

    pub async fn soft_delete(&self, offer_id: &str) -> StorageResult<()> {
        debug!("Soft-deleting cash offer request: {}", offer_id);

        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE cash_offer_requests SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(now)
        .bind(offer_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found(format!("Cash offer request {}", offer_id)));
        }
        Ok(())
    }

    pub async fn stats(&self) -> StorageResult<OfferStats> {
        let rows = sqlx::query(
            "SELECT status, COUNT(*) AS count FROM cash_offer_requests WHERE deleted_at IS NULL GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut total = 0;
        let mut by_status = BTreeMap::new();
        for row in rows {
            let status: String = row.try_get("status")?;
            let count: i64 = row.try_get("count")?;
            total += count;
            by_status.insert(status, count);
        }

        let accepted_value: Option<f64> = sqlx::query_scalar(
            r#"
            SELECT SUM(offer_amount) FROM cash_offer_requests
            WHERE deleted_at IS NULL AND status IN ('accepted', 'closed')
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(OfferStats {
            total,
            by_status,
            accepted_value: accepted_value.unwrap_or(0.0),
        })
    }
}

fn row_to_offer(row: &SqliteRow) -> StorageResult<CashOfferRequest> {
    Ok(CashOfferRequest {
        id: row.try_get("id")?,
        lead_id: row.try_get("lead_id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        property_address: row.try_get("property_address")?,
        city: row.try_get("city")?,
        state: row.try_get("state")?,
        zip: row.try_get("zip")?,
        property_type: row.try_get("property_type")?,
        bedrooms: row.try_get("bedrooms")?,
        bathrooms: row.try_get("bathrooms")?,
        square_feet: row.try_get("square_feet")?,
        condition: row.try_get("condition")?,
        sell_timeline: row.try_get("sell_timeline")?,
        mortgage_balance: row.try_get("mortgage_balance")?,
        in_foreclosure: row.try_get("in_foreclosure")?,
        notice_date: row.try_get("notice_date")?,
        status: row.try_get("status")?,
        offer_amount: row.try_get("offer_amount")?,
        admin_notes: row.try_get("admin_notes")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        deleted_at: row.try_get("deleted_at")?,
    })
}
