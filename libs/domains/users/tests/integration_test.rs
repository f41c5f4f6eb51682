//! Integration tests for the users domain
//!
//! These tests use real PostgreSQL via testcontainers. They need Docker:
//! `cargo test -p domain_users -- --ignored`

use chrono::Utc;
use domain_users::tokens;
use domain_users::*;
use test_utils::{assertions::*, TestDataBuilder, TestDatabase};

// ============================================================================
// Repository Tests
// ============================================================================

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_create_and_find_user() {
    let db = TestDatabase::new().await;
    let repo = PgUserRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("pg_create_user");

    let user = User::new("Ada".into(), builder.email("ada"), "hash".into());
    let created = repo.create(user.clone()).await.unwrap();
    assert_uuid_eq(created.id, user.id, "user id");

    let by_email = assert_some(
        repo.get_by_email(&user.email).await.unwrap(),
        "user should be found by email",
    );
    assert_eq!(by_email.name, "Ada");
    assert!(repo.email_exists(&user.email).await.unwrap());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_duplicate_email_is_reported() {
    let db = TestDatabase::new().await;
    let repo = PgUserRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("pg_duplicate_email");
    let email = builder.email("dup");

    repo.create(User::new("A".into(), email.clone(), "h".into()))
        .await
        .unwrap();
    let result = repo.create(User::new("B".into(), email, "h".into())).await;

    assert!(matches!(result, Err(UserError::DuplicateEmail(_))));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_token_roundtrip_and_revocation() {
    let db = TestDatabase::new().await;
    let user_id = db.create_test_user(uuid::Uuid::now_v7()).await;
    let repo = PgTokenRepository::new(db.connection());

    let issued = tokens::issue(user_id, "auth_token");
    repo.create(issued.record.clone()).await.unwrap();

    let found = assert_some(
        repo.find_by_hash(&issued.record.token_hash).await.unwrap(),
        "token should be found by digest",
    );
    assert_uuid_eq(found.id, issued.record.id, "token id");
    assert!(found.last_used_at.is_none());

    repo.touch(found.id, Utc::now()).await.unwrap();
    let touched = assert_some(repo.get_by_id(found.id).await.unwrap(), "token exists");
    assert!(touched.last_used_at.is_some());

    assert!(repo.delete(found.id).await.unwrap());
    assert!(repo.get_by_id(found.id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_auth_service_against_postgres() {
    let db = TestDatabase::new().await;
    let builder = TestDataBuilder::from_test_name("pg_auth_service");
    let service = AuthService::new(
        PgUserRepository::new(db.connection()),
        PgTokenRepository::new(db.connection()),
    );

    let registered = service
        .register(RegisterRequest {
            name: "Ada".into(),
            email: builder.email("auth"),
            password: "password123".into(),
        })
        .await
        .unwrap();

    let context = assert_some(
        service.verify_token(&registered.token).await.unwrap(),
        "token should verify",
    );
    service.logout(&context).await.unwrap();
    assert!(service.verify_token(&registered.token).await.unwrap().is_none());
}
