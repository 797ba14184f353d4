// ABOUTME: Short link storage layer using SQLite
// ABOUTME: Link CRUD, redirect resolution, click recording and click analytics

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use porchlight_core::{generate_code, generate_id, truncate};
use porchlight_storage::{StorageError, StorageResult};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::{debug, warn};

use crate::types::{
    referrer_host, ClickInput, DailyClicks, Link, LinkAnalytics, LinkCreateInput, LinkOverview,
    LinkUpdateInput, ReferrerCount, GENERATED_CODE_LEN,
};

const MAX_USER_AGENT_LEN: usize = 512;
const CODE_ATTEMPTS: usize = 5;
const MAX_WINDOW_DAYS: i64 = 365;
const TOP_REFERRERS: i64 = 10;
const TOP_LINKS: i64 = 5;

const LINK_SELECT: &str = r#"
    SELECT l.*, (SELECT COUNT(*) FROM link_clicks c WHERE c.link_id = l.id) AS click_count
    FROM links l
"#;

pub struct LinkStorage {
    pool: SqlitePool,
}

impl LinkStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a link with the requested code, or a generated one.
    ///
    /// A taken custom code is a `Duplicate`; generated codes are retried.
    pub async fn create_link(&self, input: LinkCreateInput) -> StorageResult<Link> {
        let input = input.normalize()?;
        let link_id = generate_id("link");

        let attempts = if input.code.is_some() { 1 } else { CODE_ATTEMPTS };
        for attempt in 1..=attempts {
            let code = input
                .code
                .clone()
                .unwrap_or_else(|| generate_code(GENERATED_CODE_LEN));

            debug!("Creating link {} with code '{}' (attempt {})", link_id, code, attempt);

            let result = sqlx::query(
                r#"
                INSERT INTO links (id, code, destination, title, campaign, created_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&link_id)
            .bind(&code)
            .bind(&input.destination)
            .bind(&input.title)
            .bind(&input.campaign)
            .bind(Utc::now())
            .execute(&self.pool)
            .await;

            match result {
                Ok(_) => return self.get_link(&link_id).await,
                Err(e) => match StorageError::from_insert(e, format!("link code '{}'", code)) {
                    StorageError::Duplicate(what) if input.code.is_none() => {
                        warn!("Generated {} already taken, retrying", what);
                    }
                    other => return Err(other),
                },
            }
        }

        Err(StorageError::Conflict(
            "Could not generate a unique link code".to_string(),
        ))
    }

    pub async fn get_link(&self, link_id: &str) -> StorageResult<Link> {
        let row = sqlx::query(&format!("{} WHERE l.id = ?", LINK_SELECT))
            .bind(link_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::not_found(format!("Link {}", link_id)))?;

        row_to_link(&row)
    }

    /// Look up an active link by code for redirecting
    pub async fn resolve(&self, code: &str) -> StorageResult<Link> {
        let row = sqlx::query(&format!(
            "{} WHERE l.code = ? AND l.archived_at IS NULL",
            LINK_SELECT
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StorageError::not_found(format!("Link code '{}'", code)))?;

        row_to_link(&row)
    }

    pub async fn list_links_paginated(
        &self,
        include_archived: bool,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> StorageResult<(Vec<Link>, i64)> {
        debug!(
            "Fetching links (include_archived: {}, limit: {:?}, offset: {:?})",
            include_archived, limit, offset
        );

        let filter = if include_archived {
            ""
        } else {
            " WHERE l.archived_at IS NULL"
        };

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM links l{}", filter))
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query(&format!(
            "{}{} ORDER BY l.created_at DESC, l.id DESC LIMIT ? OFFSET ?",
            LINK_SELECT, filter
        ))
        .bind(limit.unwrap_or(-1))
        .bind(offset.unwrap_or(0))
        .fetch_all(&self.pool)
        .await?;

        let links = rows.iter().map(row_to_link).collect::<Result<Vec<_>, _>>()?;
        Ok((links, total))
    }

    /// Change destination, title or campaign. The code is immutable.
    pub async fn update_link(&self, link_id: &str, input: LinkUpdateInput) -> StorageResult<Link> {
        let input = input.normalize()?;
        let current = self.get_link(link_id).await?;

        let destination = input.destination.unwrap_or(current.destination);
        let title = match input.title {
            Some(t) => porchlight_core::clean_optional(Some(t)),
            None => current.title,
        };
        let campaign = match input.campaign {
            Some(c) => porchlight_core::clean_optional(Some(c)),
            None => current.campaign,
        };

        debug!("Updating link {}", link_id);

        sqlx::query("UPDATE links SET destination = ?, title = ?, campaign = ? WHERE id = ?")
            .bind(&destination)
            .bind(&title)
            .bind(&campaign)
            .bind(link_id)
            .execute(&self.pool)
            .await?;

        self.get_link(link_id).await
    }

    /// Hard delete; clicks go with it
    pub async fn delete_link(&self, link_id: &str) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM links WHERE id = ?")
            .bind(link_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found(format!("Link {}", link_id)));
        }
        Ok(())
    }

    pub async fn archive(&self, link_id: &str) -> StorageResult<Link> {
        self.set_archived(link_id, Some(Utc::now())).await
    }

    pub async fn unarchive(&self, link_id: &str) -> StorageResult<Link> {
        self.set_archived(link_id, None).await
    }

    async fn set_archived(
        &self,
        link_id: &str,
        archived_at: Option<DateTime<Utc>>,
    ) -> StorageResult<Link> {
        debug!("Setting link {} archived_at to {:?}", link_id, archived_at);

        let result = sqlx::query("UPDATE links SET archived_at = ? WHERE id = ?")
            .bind(archived_at)
            .bind(link_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found(format!("Link {}", link_id)));
        }
        self.get_link(link_id).await
    }

    pub async fn record_click(&self, link_id: &str, click: &ClickInput) -> StorageResult<()> {
        self.record_click_at(link_id, click, Utc::now()).await
    }

    pub async fn record_click_at(
        &self,
        link_id: &str,
        click: &ClickInput,
        clicked_at: DateTime<Utc>,
    ) -> StorageResult<()> {
        let host = click.referrer.as_deref().and_then(referrer_host);
        let user_agent = click
            .user_agent
            .as_deref()
            .map(|ua| truncate(ua, MAX_USER_AGENT_LEN));

        sqlx::query(
            "INSERT INTO link_clicks (link_id, clicked_at, referrer_host, user_agent) VALUES (?, ?, ?, ?)",
        )
        .bind(link_id)
        .bind(clicked_at)
        .bind(&host)
        .bind(&user_agent)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Click analytics for one link over the last `days` days (1..=365)
    pub async fn analytics(&self, link_id: &str, days: i64) -> StorageResult<LinkAnalytics> {
        self.analytics_at(link_id, days, Utc::now()).await
    }

    pub async fn analytics_at(
        &self,
        link_id: &str,
        days: i64,
        now: DateTime<Utc>,
    ) -> StorageResult<LinkAnalytics> {
        let link = self.get_link(link_id).await?;
        let days = days.clamp(1, MAX_WINDOW_DAYS);
        let first_day = window_start(now, days);
        let since = day_start(first_day);

        let rows = sqlx::query(
            r#"
            SELECT substr(clicked_at, 1, 10) AS day, COUNT(*) AS clicks
            FROM link_clicks
            WHERE link_id = ? AND clicked_at >= ?
            GROUP BY day
            "#,
        )
        .bind(link_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        let mut per_day: HashMap<String, i64> = HashMap::new();
        for row in &rows {
            per_day.insert(row.try_get("day")?, row.try_get("clicks")?);
        }
        let daily = fill_days(first_day, days, &per_day);
        let window_clicks = daily.iter().map(|d| d.clicks).sum();

        let referrer_rows = sqlx::query(
            r#"
            SELECT referrer_host AS host, COUNT(*) AS clicks
            FROM link_clicks
            WHERE link_id = ? AND clicked_at >= ? AND referrer_host IS NOT NULL
            GROUP BY referrer_host
            ORDER BY clicks DESC, host ASC
            LIMIT ?
            "#,
        )
        .bind(link_id)
        .bind(since)
        .bind(TOP_REFERRERS)
        .fetch_all(&self.pool)
        .await?;

        let top_referrers = referrer_rows
            .iter()
            .map(|row| {
                Ok(ReferrerCount {
                    host: row.try_get("host")?,
                    clicks: row.try_get("clicks")?,
                })
            })
            .collect::<StorageResult<Vec<_>>>()?;

        Ok(LinkAnalytics {
            total_clicks: link.click_count,
            link,
            days,
            window_clicks,
            daily,
            top_referrers,
        })
    }

    /// Dashboard summary across all links
    pub async fn overview(&self, days: i64) -> StorageResult<LinkOverview> {
        let days = days.clamp(1, MAX_WINDOW_DAYS);
        let since = day_start(window_start(Utc::now(), days));

        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM links) AS total_links,
                (SELECT COUNT(*) FROM links WHERE archived_at IS NULL) AS active_links,
                (SELECT COUNT(*) FROM link_clicks) AS total_clicks,
                (SELECT COUNT(*) FROM link_clicks WHERE clicked_at >= ?) AS window_clicks
            "#,
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        let top_rows = sqlx::query(&format!(
            "{} ORDER BY click_count DESC, l.created_at DESC LIMIT ?",
            LINK_SELECT
        ))
        .bind(TOP_LINKS)
        .fetch_all(&self.pool)
        .await?;

        Ok(LinkOverview {
            days,
            total_links: row.try_get("total_links")?,
            active_links: row.try_get("active_links")?,
            total_clicks: row.try_get("total_clicks")?,
            window_clicks: row.try_get("window_clicks")?,
            top_links: top_rows.iter().map(row_to_link).collect::<Result<Vec<_>, _>>()?,
        })
    }
}

/// First calendar day (UTC) of a window ending today
fn window_start(now: DateTime<Utc>, days: i64) -> NaiveDate {
    now.date_naive() - Duration::days(days - 1)
}

fn day_start(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(chrono::NaiveTime::MIN).and_utc()
}

fn fill_days(first_day: NaiveDate, days: i64, per_day: &HashMap<String, i64>) -> Vec<DailyClicks> {
    (0..days)
        .map(|offset| {
            let date = first_day + Duration::days(offset);
            let key = date.format("%Y-%m-%d").to_string();
            DailyClicks {
                date,
                clicks: per_day.get(&key).copied().unwrap_or(0),
            }
        })
        .collect()
}

fn row_to_link(row: &SqliteRow) -> StorageResult<Link> {
    Ok(Link {
        id: row.try_get("id")?,
        code: row.try_get("code")?,
        destination: row.try_get("destination")?,
        title: row.try_get("title")?,
        campaign: row.try_get("campaign")?,
        created_at: row.try_get("created_at")?,
        archived_at: row.try_get("archived_at")?,
        click_count: row.try_get("click_count")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_days_is_zero_filled_oldest_first() {
        let first = NaiveDate::from_ymd_opt(2026, 3, 30).unwrap();
        let mut per_day = HashMap::new();
        per_day.insert("2026-03-31".to_string(), 4);

        let daily = fill_days(first, 3, &per_day);
        let counts: Vec<i64> = daily.iter().map(|d| d.clicks).collect();

        assert_eq!(counts, vec![0, 4, 0]);
        assert_eq!(daily[2].date, NaiveDate::from_ymd_opt(2026, 4, 1).unwrap());
    }

    #[test]
    fn test_window_start_includes_today() {
        let now = NaiveDate::from_ymd_opt(2026, 5, 10)
            .unwrap()
            .and_hms_opt(15, 0, 0)
            .unwrap()
            .and_utc();
        assert_eq!(window_start(now, 1), now.date_naive());
        assert_eq!(
            window_start(now, 7),
            NaiveDate::from_ymd_opt(2026, 5, 4).unwrap()
        );
    }
}
