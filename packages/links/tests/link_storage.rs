// ABOUTME: Integration tests for short links and click analytics
// ABOUTME: Runs against an in-memory SQLite database with migrations applied

use chrono::{Duration, NaiveDate, Utc};
use porchlight_links::{ClickInput, LinkCreateInput, LinkStorage, LinkUpdateInput};
use porchlight_storage::{connect_in_memory, StorageError};
use pretty_assertions::assert_eq;

async fn setup() -> LinkStorage {
    LinkStorage::new(connect_in_memory().await.unwrap())
}

fn create(code: Option<&str>) -> LinkCreateInput {
    LinkCreateInput {
        code: code.map(str::to_string),
        destination: "https://porchlight.test/timeline?utm_source=mailer".to_string(),
        title: Some("Spring mailer".to_string()),
        campaign: Some("spring-2026".to_string()),
    }
}

fn click(referrer: Option<&str>) -> ClickInput {
    ClickInput {
        referrer: referrer.map(str::to_string),
        user_agent: Some("Mozilla/5.0".to_string()),
    }
}

#[tokio::test]
async fn test_create_with_custom_and_generated_codes() {
    let storage = setup().await;

    let custom = storage.create_link(create(Some("mailer-1"))).await.unwrap();
    assert_eq!(custom.code, "mailer-1");
    assert!(custom.id.starts_with("link-"));
    assert_eq!(custom.click_count, 0);

    let generated = storage.create_link(create(None)).await.unwrap();
    assert_eq!(generated.code.len(), 7);
    assert!(generated.code.chars().all(|c| c.is_ascii_alphanumeric()));
}

#[tokio::test]
async fn test_duplicate_custom_code_is_rejected() {
    let storage = setup().await;
    storage.create_link(create(Some("mailer-1"))).await.unwrap();

    let err = storage.create_link(create(Some("mailer-1"))).await.unwrap_err();
    assert!(matches!(err, StorageError::Duplicate(_)));
}

#[tokio::test]
async fn test_invalid_input_is_rejected() {
    let storage = setup().await;
    let mut input = create(Some("no"));
    input.destination = "mailto:someone@example.com".to_string();

    match storage.create_link(input).await.unwrap_err() {
        StorageError::Validation(v) => {
            assert!(v.has_field("code"));
            assert!(v.has_field("destination"));
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_resolve_skips_archived_links() {
    let storage = setup().await;
    let link = storage.create_link(create(Some("mailer-1"))).await.unwrap();

    assert_eq!(storage.resolve("mailer-1").await.unwrap().id, link.id);

    let archived = storage.archive(&link.id).await.unwrap();
    assert!(archived.archived_at.is_some());
    assert!(matches!(
        storage.resolve("mailer-1").await.unwrap_err(),
        StorageError::NotFound(_)
    ));

    let (active, total) = storage.list_links_paginated(false, None, None).await.unwrap();
    assert!(active.is_empty());
    assert_eq!(total, 0);
    let (_, total) = storage.list_links_paginated(true, None, None).await.unwrap();
    assert_eq!(total, 1);

    storage.unarchive(&link.id).await.unwrap();
    assert!(storage.resolve("mailer-1").await.is_ok());
}

#[tokio::test]
async fn test_update_and_delete() {
    let storage = setup().await;
    let link = storage.create_link(create(Some("mailer-1"))).await.unwrap();

    let updated = storage
        .update_link(
            &link.id,
            LinkUpdateInput {
                destination: Some("https://porchlight.test/cash-offer".to_string()),
                title: Some("".to_string()),
                campaign: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.destination, "https://porchlight.test/cash-offer");
    assert_eq!(updated.title, None);
    assert_eq!(updated.campaign.as_deref(), Some("spring-2026"));
    assert_eq!(updated.code, "mailer-1");

    storage.record_click(&link.id, &click(None)).await.unwrap();
    storage.delete_link(&link.id).await.unwrap();
    assert!(matches!(
        storage.get_link(&link.id).await.unwrap_err(),
        StorageError::NotFound(_)
    ));
    assert!(matches!(
        storage.delete_link(&link.id).await.unwrap_err(),
        StorageError::NotFound(_)
    ));
}

#[tokio::test]
async fn test_analytics_daily_series_and_referrers() {
    let storage = setup().await;
    let link = storage.create_link(create(Some("mailer-1"))).await.unwrap();

    let now = NaiveDate::from_ymd_opt(2026, 4, 10)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
        .and_utc();

    // Outside a 7-day window
    storage
        .record_click_at(&link.id, &click(Some("https://old.example.com/")), now - Duration::days(30))
        .await
        .unwrap();
    for _ in 0..3 {
        storage
            .record_click_at(&link.id, &click(Some("https://www.google.com/search")), now)
            .await
            .unwrap();
    }
    storage
        .record_click_at(&link.id, &click(Some("https://facebook.com/")), now - Duration::days(2))
        .await
        .unwrap();
    storage
        .record_click_at(&link.id, &click(None), now - Duration::days(2))
        .await
        .unwrap();

    let analytics = storage.analytics_at(&link.id, 7, now).await.unwrap();

    assert_eq!(analytics.total_clicks, 6);
    assert_eq!(analytics.window_clicks, 5);
    assert_eq!(analytics.daily.len(), 7);
    assert_eq!(
        analytics.daily.first().unwrap().date,
        NaiveDate::from_ymd_opt(2026, 4, 4).unwrap()
    );
    let counts: Vec<i64> = analytics.daily.iter().map(|d| d.clicks).collect();
    assert_eq!(counts, vec![0, 0, 0, 0, 2, 0, 3]);

    let hosts: Vec<(&str, i64)> = analytics
        .top_referrers
        .iter()
        .map(|r| (r.host.as_str(), r.clicks))
        .collect();
    assert_eq!(hosts, vec![("google.com", 3), ("facebook.com", 1)]);
}

#[tokio::test]
async fn test_analytics_clamps_window() {
    let storage = setup().await;
    let link = storage.create_link(create(None)).await.unwrap();

    let analytics = storage.analytics(&link.id, 0).await.unwrap();
    assert_eq!(analytics.days, 1);
    assert_eq!(analytics.daily.len(), 1);

    let analytics = storage.analytics(&link.id, 10_000).await.unwrap();
    assert_eq!(analytics.days, 365);
}

#[tokio::test]
async fn test_overview_ranks_links_by_clicks() {
    let storage = setup().await;
    let quiet = storage.create_link(create(Some("quiet"))).await.unwrap();
    let busy = storage.create_link(create(Some("busy"))).await.unwrap();
    let archived = storage.create_link(create(Some("old-one"))).await.unwrap();
    storage.archive(&archived.id).await.unwrap();

    storage.record_click(&quiet.id, &click(None)).await.unwrap();
    for _ in 0..4 {
        storage.record_click(&busy.id, &click(None)).await.unwrap();
    }
    storage
        .record_click_at(&busy.id, &click(None), Utc::now() - Duration::days(60))
        .await
        .unwrap();

    let overview = storage.overview(30).await.unwrap();
    assert_eq!(overview.total_links, 3);
    assert_eq!(overview.active_links, 2);
    assert_eq!(overview.total_clicks, 6);
    assert_eq!(overview.window_clicks, 5);
    assert_eq!(overview.top_links[0].code, "busy");
    assert_eq!(overview.top_links[0].click_count, 5);
    assert_eq!(overview.top_links[1].code, "quiet");
}
