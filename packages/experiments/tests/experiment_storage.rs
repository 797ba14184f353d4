// ABOUTME: Integration tests for experiment lifecycle, events and results
// ABOUTME: Runs against an in-memory SQLite database with migrations applied

use porchlight_experiments::{
    EventKind, ExperimentCreateInput, ExperimentStatus, ExperimentStorage, ExperimentUpdateInput,
    VariantInput,
};
use porchlight_storage::{connect_in_memory, StorageError};
use pretty_assertions::assert_eq;

async fn setup() -> ExperimentStorage {
    ExperimentStorage::new(connect_in_memory().await.unwrap())
}

fn variant(key: &str, control: bool) -> VariantInput {
    VariantInput {
        key: key.to_string(),
        name: format!("Headline {}", key),
        weight: 50,
        is_control: control,
    }
}

fn input(variants: Vec<VariantInput>) -> ExperimentCreateInput {
    ExperimentCreateInput {
        key: None,
        name: "Hero Headline".to_string(),
        description: Some("Urgency vs reassurance".to_string()),
        variants,
    }
}

#[tokio::test]
async fn test_create_starts_as_draft_with_ordered_variants() {
    let storage = setup().await;
    let exp = storage
        .create_experiment(input(vec![variant("control", true), variant("urgent", false)]))
        .await
        .unwrap();

    assert_eq!(exp.key, "hero-headline");
    assert_eq!(exp.status, ExperimentStatus::Draft);
    let keys: Vec<&str> = exp.variants.iter().map(|v| v.key.as_str()).collect();
    assert_eq!(keys, vec!["control", "urgent"]);

    let by_key = storage.get_by_key("hero-headline").await.unwrap();
    assert_eq!(by_key.id, exp.id);

    let err = storage
        .create_experiment(input(vec![variant("a", true)]))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Duplicate(_)));
}

#[tokio::test]
async fn test_start_requires_two_variants_and_one_control() {
    let storage = setup().await;
    let exp = storage
        .create_experiment(input(vec![variant("a", true)]))
        .await
        .unwrap();
    let err = storage
        .set_status(&exp.id, ExperimentStatus::Running)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Validation(_)));

    storage
        .update_experiment(
            &exp.id,
            ExperimentUpdateInput {
                variants: Some(vec![variant("a", true), variant("b", true)]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let err = storage
        .set_status(&exp.id, ExperimentStatus::Running)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Validation(_)));

    storage
        .update_experiment(
            &exp.id,
            ExperimentUpdateInput {
                variants: Some(vec![variant("a", true), variant("b", false)]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let running = storage
        .set_status(&exp.id, ExperimentStatus::Running)
        .await
        .unwrap();
    assert_eq!(running.status, ExperimentStatus::Running);
    assert!(running.started_at.is_some());

    // Variants are frozen once started
    let err = storage
        .update_experiment(
            &exp.id,
            ExperimentUpdateInput {
                variants: Some(vec![variant("x", true), variant("y", false)]),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict(_)));
}

#[tokio::test]
async fn test_lifecycle_transitions() {
    let storage = setup().await;
    let exp = storage
        .create_experiment(input(vec![variant("a", true), variant("b", false)]))
        .await
        .unwrap();

    let err = storage
        .set_status(&exp.id, ExperimentStatus::Completed)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::InvalidTransition { .. }));

    storage.set_status(&exp.id, ExperimentStatus::Running).await.unwrap();
    assert!(matches!(
        storage.delete_experiment(&exp.id).await.unwrap_err(),
        StorageError::Conflict(_)
    ));

    storage.set_status(&exp.id, ExperimentStatus::Paused).await.unwrap();
    let done = storage
        .set_status(&exp.id, ExperimentStatus::Completed)
        .await
        .unwrap();
    assert!(done.ended_at.is_some());

    let err = storage
        .set_status(&exp.id, ExperimentStatus::Running)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::InvalidTransition { .. }));

    storage.delete_experiment(&exp.id).await.unwrap();
    assert!(matches!(
        storage.get_experiment(&exp.id).await.unwrap_err(),
        StorageError::NotFound(_)
    ));
}

#[tokio::test]
async fn test_assignment_serves_control_until_running() {
    let storage = setup().await;
    let exp = storage
        .create_experiment(input(vec![variant("a", true), variant("b", false)]))
        .await
        .unwrap();

    for i in 0..10 {
        let a = storage
            .assign(&exp.key, &format!("visitor-{}", i))
            .await
            .unwrap();
        assert!(a.is_control);
        assert!(!a.active);
    }

    storage.set_status(&exp.id, ExperimentStatus::Running).await.unwrap();
    let first = storage.assign(&exp.key, "visitor-42").await.unwrap();
    let again = storage.assign(&exp.key, "visitor-42").await.unwrap();
    assert!(first.active);
    assert_eq!(first, again);
}

#[tokio::test]
async fn test_events_are_deduplicated_and_counted() {
    let storage = setup().await;
    let exp = storage
        .create_experiment(input(vec![variant("a", true), variant("b", false)]))
        .await
        .unwrap();

    // Ignored while in draft
    assert!(!storage
        .record_event(&exp.key, "visitor-1", EventKind::Impression)
        .await
        .unwrap());

    storage.set_status(&exp.id, ExperimentStatus::Running).await.unwrap();

    for i in 0..40 {
        let visitor = format!("visitor-{}", i);
        assert!(storage
            .record_event(&exp.key, &visitor, EventKind::Impression)
            .await
            .unwrap());
        assert!(!storage
            .record_event(&exp.key, &visitor, EventKind::Impression)
            .await
            .unwrap());
        if i % 4 == 0 {
            storage
                .record_event(&exp.key, &visitor, EventKind::Conversion)
                .await
                .unwrap();
        }
    }

    let results = storage.results(&exp.id).await.unwrap();
    let impressions: i64 = results.variants.iter().map(|v| v.impressions).sum();
    let conversions: i64 = results.variants.iter().map(|v| v.conversions).sum();
    assert_eq!(impressions, 40);
    assert_eq!(conversions, 10);
    assert!(results.variants[0].is_control);
    assert_eq!(results.status, ExperimentStatus::Running);

    let err = storage
        .record_event(&exp.key, " ", EventKind::Impression)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Validation(_)));
}

#[tokio::test]
async fn test_list_filters_by_status() {
    let storage = setup().await;
    let a = storage
        .create_experiment(ExperimentCreateInput {
            key: Some("cta-color".to_string()),
            ..input(vec![variant("a", true), variant("b", false)])
        })
        .await
        .unwrap();
    storage
        .create_experiment(ExperimentCreateInput {
            key: Some("exit-offer".to_string()),
            ..input(vec![])
        })
        .await
        .unwrap();
    storage.set_status(&a.id, ExperimentStatus::Running).await.unwrap();

    let (all, total) = storage
        .list_experiments_paginated(None, None, None)
        .await
        .unwrap();
    assert_eq!(total, 2);
    assert_eq!(all.len(), 2);

    let (running, total) = storage
        .list_experiments_paginated(Some(ExperimentStatus::Running), Some(10), Some(0))
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(running[0].key, "cta-color");
    assert_eq!(running[0].variants.len(), 2);
}
