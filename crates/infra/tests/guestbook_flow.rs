//! End-to-end flow: form input -> validated entry -> repository -> listing.

use std::sync::Arc;

use guestbook_core::{DomainError, Entity};
use guestbook_entries::GuestbookEntry;
use guestbook_infra::config::connect_repository;
use guestbook_infra::{
    GuestbookRepository, InMemoryGuestbookRepository, InfraConfig, RepositoryError,
};

/// Form submission path: validate, then store.
async fn submit(
    repo: &dyn GuestbookRepository,
    name: &str,
    email: &str,
    text: &str,
) -> Result<GuestbookEntry, RepositoryError> {
    let entry = GuestbookEntry::new(name, email, text)?;
    repo.save(entry).await
}

#[tokio::test]
async fn submitted_entries_are_listed_with_ids() -> anyhow::Result<()> {
    guestbook_observability::init();
    let repo = connect_repository(&InfraConfig::default()).await?;

    let submissions = [
        ("Ollie", "ollie@ollie.de", "May the 4th be with you!"),
        ("Paul", "paul@example.com", "Greetings from Dresden"),
    ];
    for (name, email, text) in submissions {
        let entry = GuestbookEntry::new(name, email, text)?;
        assert!(!entry.is_persisted());

        let saved = repo.save(entry).await?;
        assert!(saved.is_persisted());
    }

    let listed = repo.find_all().await?;
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|e| e.id().is_some()));
    assert_eq!(listed[0].name(), "Ollie");
    assert_eq!(listed[1].name(), "Paul");

    Ok(())
}

#[tokio::test]
async fn rejected_submission_never_reaches_storage() -> anyhow::Result<()> {
    let repo = InMemoryGuestbookRepository::new();

    let rejected = [
        ("", "test@testing.com", "May the 4th be with you!", "name"),
        ("Olli", "", "Great", "email"),
        ("Ollie", "ollie@ollie.de", "", "text"),
        ("Ollie", "not-an-email", "Hi", "email"),
    ];
    for (name, email, text, field) in rejected {
        match submit(&repo, name, email, text).await {
            Err(RepositoryError::Domain(err)) => assert_eq!(err.field(), Some(field)),
            other => panic!("expected {field} to be rejected, got {other:?}"),
        }
    }
    assert_eq!(repo.count().await?, 0);
    assert!(repo.find_all().await?.is_empty());

    let err = submit(&repo, "Ollie", "not-an-email", "Hi").await.unwrap_err();
    assert_eq!(
        err,
        RepositoryError::Domain(DomainError::invalid_argument("email", "Email must be valid"))
    );

    let saved = submit(&repo, "Ollie", "ollie@ollie.de", "Hi").await?;
    assert_eq!(saved.id().map(|id| id.get()), Some(1));
    assert_eq!(repo.count().await?, 1);
    Ok(())
}

#[tokio::test]
async fn concurrent_saves_get_unique_ids() -> anyhow::Result<()> {
    let repo: Arc<dyn GuestbookRepository> = Arc::new(InMemoryGuestbookRepository::new());

    let mut handles = Vec::new();
    for i in 0..16 {
        let repo = repo.clone();
        handles.push(tokio::spawn(async move {
            let entry = GuestbookEntry::new(format!("guest {i}"), "guest@example.com", "hello")?;
            Ok::<_, RepositoryError>(repo.save(entry).await?)
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        let saved = handle.await??;
        ids.push(saved.id().expect("saved entries have ids"));
    }
    ids.sort();
    ids.dedup();

    assert_eq!(ids.len(), 16);
    assert_eq!(repo.count().await?, 16);
    Ok(())
}
