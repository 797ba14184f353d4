// ABOUTME: Integration tests for articles and FAQ entries
// ABOUTME: Runs against an in-memory SQLite database with migrations applied

use porchlight_content::{
    ArticleInput, ArticleKind, ArticleStorage, ArticleUpdateInput, FaqInput, FaqStorage,
};
use porchlight_storage::{connect_in_memory, StorageError};
use pretty_assertions::assert_eq;
use sqlx::SqlitePool;

async fn pool() -> SqlitePool {
    connect_in_memory().await.unwrap()
}

fn article(title: &str, kind: ArticleKind) -> ArticleInput {
    ArticleInput {
        title: title.to_string(),
        summary: Some("Plain-language walkthrough".to_string()),
        body: "## Step one\nCall your servicer.".to_string(),
        kind,
        tags: vec!["Foreclosure".to_string()],
        ..Default::default()
    }
}

#[tokio::test]
async fn test_slug_is_derived_and_made_unique() {
    let storage = ArticleStorage::new(pool().await);

    let first = storage
        .create_article(article("Stop a Trustee Sale", ArticleKind::Blog))
        .await
        .unwrap();
    let second = storage
        .create_article(article("Stop a Trustee Sale!", ArticleKind::Blog))
        .await
        .unwrap();

    assert_eq!(first.slug, "stop-a-trustee-sale");
    assert_eq!(second.slug, "stop-a-trustee-sale-2");
    assert_eq!(first.tags, vec!["foreclosure".to_string()]);
    assert!(!first.is_published());

    let mut explicit = article("Another", ArticleKind::Blog);
    explicit.slug = Some("stop-a-trustee-sale".to_string());
    let err = storage.create_article(explicit).await.unwrap_err();
    assert!(matches!(err, StorageError::Duplicate(_)));
}

#[tokio::test]
async fn test_drafts_are_hidden_until_published() {
    let storage = ArticleStorage::new(pool().await);
    let draft = storage
        .create_article(article("Loan Modification Basics", ArticleKind::Guide))
        .await
        .unwrap();

    assert!(matches!(
        storage.get_published_by_slug(&draft.slug).await.unwrap_err(),
        StorageError::NotFound(_)
    ));

    let published = storage.publish(&draft.id).await.unwrap();
    let first_date = published.published_at.unwrap();
    let found = storage.get_published_by_slug(&draft.slug).await.unwrap();
    assert_eq!(found.id, draft.id);

    // Re-publishing keeps the original date
    let again = storage.publish(&draft.id).await.unwrap();
    assert_eq!(again.published_at, Some(first_date));

    storage.unpublish(&draft.id).await.unwrap();
    assert!(storage.get_published_by_slug(&draft.slug).await.is_err());
}

#[tokio::test]
async fn test_list_published_by_kind_newest_first() {
    let storage = ArticleStorage::new(pool().await);
    let older = storage
        .create_article(article("Older Post", ArticleKind::Blog))
        .await
        .unwrap();
    let newer = storage
        .create_article(article("Newer Post", ArticleKind::Blog))
        .await
        .unwrap();
    let guide = storage
        .create_article(article("Short Sale Guide", ArticleKind::Guide))
        .await
        .unwrap();
    storage
        .create_article(article("Unpublished Draft", ArticleKind::Blog))
        .await
        .unwrap();

    storage.publish(&older.id).await.unwrap();
    storage.publish(&newer.id).await.unwrap();
    storage.publish(&guide.id).await.unwrap();

    let (blogs, total) = storage
        .list_published(Some(ArticleKind::Blog), None, None)
        .await
        .unwrap();
    assert_eq!(total, 2);
    let slugs: Vec<&str> = blogs.iter().map(|a| a.slug.as_str()).collect();
    assert_eq!(slugs, vec!["newer-post", "older-post"]);

    let (everything, total) = storage.list_published(None, None, None).await.unwrap();
    assert_eq!(total, 3);
    assert_eq!(everything.len(), 3);

    let (all, total) = storage.list_all(None, Some(2), Some(0)).await.unwrap();
    assert_eq!(total, 4);
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn test_update_and_delete_article() {
    let storage = ArticleStorage::new(pool().await);
    let a = storage
        .create_article(article("First Title", ArticleKind::Blog))
        .await
        .unwrap();
    let b = storage
        .create_article(article("Second Title", ArticleKind::Blog))
        .await
        .unwrap();

    let updated = storage
        .update_article(
            &a.id,
            ArticleUpdateInput {
                title: Some("Renamed".to_string()),
                kind: Some(ArticleKind::Guide),
                tags: Some(vec!["Options".to_string(), "options".to_string()]),
                summary: Some("".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "Renamed");
    assert_eq!(updated.slug, "first-title");
    assert_eq!(updated.kind, ArticleKind::Guide);
    assert_eq!(updated.tags, vec!["options".to_string()]);
    assert_eq!(updated.summary, None);
    assert!(updated.updated_at >= a.updated_at);

    let err = storage
        .update_article(
            &a.id,
            ArticleUpdateInput {
                slug: Some(b.slug.clone()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Duplicate(_)));

    storage.delete_article(&a.id).await.unwrap();
    assert!(matches!(
        storage.get_article(&a.id).await.unwrap_err(),
        StorageError::NotFound(_)
    ));
}

fn faq(question: &str, category: Option<&str>) -> FaqInput {
    FaqInput {
        question: question.to_string(),
        answer: "It depends on your sale date.".to_string(),
        category: category.map(str::to_string),
        position: None,
    }
}

#[tokio::test]
async fn test_faq_grouped_and_ordered() {
    let storage = FaqStorage::new(pool().await);

    let first = storage.create_entry(faq("Can I stay in my home?", None)).await.unwrap();
    let second = storage
        .create_entry(faq("How long does it take?", None))
        .await
        .unwrap();
    storage
        .create_entry(faq("Do you buy as-is?", Some("Cash Offers")))
        .await
        .unwrap();
    assert_eq!(first.position, 0);
    assert_eq!(second.position, 1);

    // Negative positions are rejected
    storage
        .update_entry(
            &second.id,
            FaqInput {
                position: Some(-1),
                ..faq("How long does it take?", None)
            },
        )
        .await
        .unwrap_err();
    let moved = storage
        .update_entry(
            &first.id,
            FaqInput {
                position: Some(5),
                ..faq("Can I stay in my home?", None)
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.position, 5);

    let groups = storage.list_grouped().await.unwrap();
    let categories: Vec<&str> = groups.iter().map(|g| g.category.as_str()).collect();
    assert_eq!(categories, vec!["cash offers", "general"]);

    let general: Vec<&str> = groups[1].entries.iter().map(|e| e.question.as_str()).collect();
    assert_eq!(general, vec!["How long does it take?", "Can I stay in my home?"]);

    storage.delete_entry(&first.id).await.unwrap();
    assert!(matches!(
        storage.delete_entry(&first.id).await.unwrap_err(),
        StorageError::NotFound(_)
    ));
}
