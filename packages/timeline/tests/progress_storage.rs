// ABOUTME: Integration tests for timeline trackers and checklist progress
// ABOUTME: Runs against an in-memory SQLite database with migrations applied

use chrono::NaiveDate;
use porchlight_storage::{connect_in_memory, StorageError};
use porchlight_timeline::{
    parse_notice_date, MilestoneStatus, ProgressStorage, TimelineVariant, TrackerCreateInput,
};
use pretty_assertions::assert_eq;

fn date(s: &str) -> NaiveDate {
    parse_notice_date(s).unwrap()
}

async fn setup() -> ProgressStorage {
    let pool = connect_in_memory().await.unwrap();
    ProgressStorage::new(pool)
}

fn input(notice_date: &str, variant: TimelineVariant) -> TrackerCreateInput {
    TrackerCreateInput {
        notice_date: date(notice_date),
        variant,
        email: Some("owner@example.com".to_string()),
        lead_id: None,
    }
}

#[tokio::test]
async fn test_create_and_get_tracker() {
    let storage = setup().await;

    let tracker = storage
        .create_tracker(input("2026-03-02", TimelineVariant::Statutory))
        .await
        .unwrap();

    assert!(tracker.id.starts_with("tracker-"));
    assert_eq!(tracker.notice_date, date("2026-03-02"));
    assert_eq!(tracker.variant, TimelineVariant::Statutory);

    let fetched = storage.get_tracker(&tracker.id).await.unwrap();
    assert_eq!(fetched, tracker);
}

#[tokio::test]
async fn test_get_missing_tracker_is_not_found() {
    let storage = setup().await;
    let err = storage.get_tracker("tracker-missing").await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
}

#[tokio::test]
async fn test_overflowing_notice_date_is_rejected() {
    let storage = setup().await;
    let err = storage
        .create_tracker(TrackerCreateInput {
            notice_date: NaiveDate::MAX,
            variant: TimelineVariant::Standard,
            email: None,
            lead_id: None,
        })
        .await
        .unwrap_err();

    match err {
        StorageError::Validation(v) => assert!(v.has_field("noticeDate")),
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_progress_is_merged_into_timeline() {
    let storage = setup().await;
    let tracker = storage
        .create_tracker(input("2026-01-15", TimelineVariant::Standard))
        .await
        .unwrap();

    storage
        .set_action_completed(&tracker.id, "notice-of-default", 0, true)
        .await
        .unwrap();
    storage
        .set_action_completed(&tracker.id, "notice-of-default", 3, true)
        .await
        .unwrap();
    storage
        .set_action_completed(&tracker.id, "trustee-sale", 2, true)
        .await
        .unwrap();

    let tracked = storage
        .load_tracked(&tracker.id, date("2026-02-04"))
        .await
        .unwrap();

    assert_eq!(tracked.tracker_id.as_deref(), Some(tracker.id.as_str()));
    assert_eq!(tracked.completed_actions, 3);
    assert_eq!(tracked.total_actions, 17);
    assert_eq!(tracked.completion_percent, 17);
    assert_eq!(tracked.milestones[0].status, MilestoneStatus::Past);
    assert_eq!(tracked.milestones[1].status, MilestoneStatus::Current);
    assert!(tracked.milestones[0].actions[0].completed);
    assert!(!tracked.milestones[0].actions[1].completed);
    assert!(tracked.milestones[4].actions[2].completed);
}

#[tokio::test]
async fn test_unticking_overwrites_previous_value() {
    let storage = setup().await;
    let tracker = storage
        .create_tracker(input("2026-01-15", TimelineVariant::Standard))
        .await
        .unwrap();

    storage
        .set_action_completed(&tracker.id, "notice-of-sale", 1, true)
        .await
        .unwrap();
    storage
        .set_action_completed(&tracker.id, "notice-of-sale", 1, false)
        .await
        .unwrap();

    let map = storage.completion_map(&tracker.id).await.unwrap();
    assert_eq!(map.len(), 1);
    assert_eq!(map.get(&("notice-of-sale".to_string(), 1)), Some(&false));
}

#[tokio::test]
async fn test_unknown_milestone_and_index_are_rejected() {
    let storage = setup().await;
    let tracker = storage
        .create_tracker(input("2026-01-15", TimelineVariant::Standard))
        .await
        .unwrap();

    // cure-period-ends only exists on statutory timelines
    let err = storage
        .set_action_completed(&tracker.id, "cure-period-ends", 0, true)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Validation(ref v) if v.has_field("milestone_id")));

    let err = storage
        .set_action_completed(&tracker.id, "cash-offer-window", 3, true)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Validation(ref v) if v.has_field("action_index")));

    let err = storage
        .set_action_completed("tracker-missing", "trustee-sale", 0, true)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
}

#[tokio::test]
async fn test_progress_survives_notice_date_change() {
    let storage = setup().await;
    let tracker = storage
        .create_tracker(input("2026-01-15", TimelineVariant::Standard))
        .await
        .unwrap();
    storage
        .set_action_completed(&tracker.id, "cash-offer-window", 0, true)
        .await
        .unwrap();

    let updated = storage
        .update_notice_date(&tracker.id, date("2026-02-01"))
        .await
        .unwrap();
    assert_eq!(updated.notice_date, date("2026-02-01"));

    let tracked = storage
        .load_tracked(&tracker.id, date("2026-02-01"))
        .await
        .unwrap();
    assert_eq!(tracked.milestones[1].date, date("2026-02-21"));
    assert!(tracked.milestones[1].actions[0].completed);
}

#[tokio::test]
async fn test_link_lead() {
    let pool = connect_in_memory().await.unwrap();
    sqlx::query(
        "INSERT INTO leads (id, source, email, created_at, updated_at) VALUES ('lead-1', 'timeline_calculator', 'a@example.com', '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')",
    )
    .execute(&pool)
    .await
    .unwrap();

    let storage = ProgressStorage::new(pool);
    let tracker = storage
        .create_tracker(input("2026-01-15", TimelineVariant::Standard))
        .await
        .unwrap();

    storage.link_lead(&tracker.id, "lead-1").await.unwrap();
    let fetched = storage.get_tracker(&tracker.id).await.unwrap();
    assert_eq!(fetched.lead_id.as_deref(), Some("lead-1"));

    let err = storage.link_lead("tracker-missing", "lead-1").await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
}
