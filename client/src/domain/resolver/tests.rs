//! Behaviour coverage for session/identity resolution.

use std::sync::Arc;
use std::time::Duration;

use mockall::Sequence;
use rstest::{fixture, rstest};
use serde_json::{Map, Value, json};
use uuid::Uuid;

use super::IdentityResolver;
use crate::config::{Config, RetryPolicy};
use crate::domain::member::Role;
use crate::domain::ports::{MockTableStore, StoreError, Table, WireRow};
use crate::domain::session::{AuthSession, AuthUser};

const ADMIN_EMAIL: &str = "admin@org.com";

fn config() -> Config {
    // Zero delay keeps the retry loop instantaneous under test.
    Config::new().with_retry(RetryPolicy::new(3, Duration::ZERO))
}

fn session_for(email: &str, metadata: Map<String, Value>) -> AuthSession {
    AuthSession {
        user: AuthUser {
            id: Uuid::new_v4(),
            email: email.to_owned(),
            metadata,
        },
        access_token: "token".to_owned(),
    }
}

fn wire_profile(id: Uuid, name: &str, role: &str) -> WireRow {
    let value = json!({
        "id": id,
        "name": name,
        "email": "someone@uni.edu",
        "role": role,
        "student_id": "S-100",
        "membership_paid": false,
    });
    match value {
        Value::Object(map) => map,
        _ => unreachable!("profile literal is an object"),
    }
}

fn resolver(store: MockTableStore) -> IdentityResolver<MockTableStore> {
    IdentityResolver::new(Arc::new(store), &config())
}

#[fixture]
fn admin_session() -> AuthSession {
    session_for(ADMIN_EMAIL, Map::new())
}

#[tokio::test]
async fn null_session_resolves_to_none() {
    let service = resolver(MockTableStore::new());
    assert!(service.resolve(None).await.is_none());
}

#[rstest]
#[case(ADMIN_EMAIL)]
#[case("ADMIN@ORG.COM")]
#[tokio::test]
async fn admin_email_overrides_stored_role(#[case] email: &str) {
    let session = session_for(email, Map::new());
    let profile = wire_profile(session.user.id, "Ada", "student");

    let mut store = MockTableStore::new();
    store
        .expect_find_by_id()
        .times(1)
        .return_once(move |_, _| Ok(Some(profile)));
    store.expect_insert().times(0);

    let user = resolver(store)
        .resolve(Some(&session))
        .await
        .expect("authenticated session resolves");
    assert_eq!(user.role, Role::Admin);
    assert_eq!(user.name, "Ada");
    assert!(user.profile.is_some());
}

#[tokio::test]
async fn missing_profile_falls_back_to_placeholder() {
    let session = session_for("fresh@uni.edu", Map::new());

    let mut store = MockTableStore::new();
    store
        .expect_find_by_id()
        .times(3)
        .returning(|_, _| Ok(None));

    let user = resolver(store)
        .resolve(Some(&session))
        .await
        .expect("authenticated session resolves");
    assert_eq!(user.role, Role::Student);
    assert_eq!(user.name, "New User");
    assert!(user.profile.is_none());
}

#[tokio::test]
async fn signup_metadata_prefills_identity() {
    let mut metadata = Map::new();
    metadata.insert("name".to_owned(), json!("Grace Hopper"));
    metadata.insert("role".to_owned(), json!("student"));
    let session = session_for("grace@uni.edu", metadata);

    let mut store = MockTableStore::new();
    store
        .expect_find_by_id()
        .times(3)
        .returning(|_, _| Ok(None));

    let user = resolver(store)
        .resolve(Some(&session))
        .await
        .expect("authenticated session resolves");
    assert_eq!(user.name, "Grace Hopper");
    assert_eq!(user.role, Role::Student);
}

#[rstest]
#[tokio::test]
async fn admin_bootstrap_creates_exactly_one_profile(admin_session: AuthSession) {
    let expected_id = admin_session.user.id;

    let mut store = MockTableStore::new();
    store
        .expect_find_by_id()
        .times(3)
        .returning(|_, _| Ok(None));
    store
        .expect_insert()
        .withf(move |table, row, _| {
            *table == Table::Profiles
                && row.get("id") == Some(&json!(expected_id))
                && row.get("role") == Some(&json!("admin"))
                && row.get("student_id") == Some(&json!("ADMIN"))
                && row.get("membership_paid") == Some(&json!(true))
                && row.get("membership_expiry") == Some(&json!("2099-12-31"))
        })
        .times(1)
        .returning(|_, row, _| Ok(row));

    let user = resolver(store)
        .resolve(Some(&admin_session))
        .await
        .expect("authenticated session resolves");
    assert_eq!(user.role, Role::Admin);
    assert_eq!(user.name, "Admin");
    let profile = user.profile.expect("bootstrapped profile attached");
    assert!(profile.membership_paid);
    assert_eq!(profile.organization.as_deref(), Some("Core Team"));
}

#[rstest]
#[tokio::test]
async fn bootstrap_failure_falls_back_to_memory_admin(admin_session: AuthSession) {
    let mut store = MockTableStore::new();
    store
        .expect_find_by_id()
        .times(3)
        .returning(|_, _| Ok(None));
    store
        .expect_insert()
        .times(1)
        .returning(|_, _, _| Err(StoreError::unauthorized("row security rejected the write")));

    let user = resolver(store)
        .resolve(Some(&admin_session))
        .await
        .expect("authenticated session resolves");
    assert_eq!(user.role, Role::Admin);
    assert_eq!(user.name, "Admin (Fallback)");
    assert!(user.profile.is_none());
}

#[tokio::test]
async fn profile_visible_on_third_attempt_resolves() {
    let session = session_for("slow@uni.edu", Map::new());
    let profile = wire_profile(session.user.id, "Slow Starter", "student");

    let mut sequence = Sequence::new();
    let mut store = MockTableStore::new();
    store
        .expect_find_by_id()
        .times(2)
        .in_sequence(&mut sequence)
        .returning(|_, _| Ok(None));
    store
        .expect_find_by_id()
        .times(1)
        .in_sequence(&mut sequence)
        .return_once(move |_, _| Ok(Some(profile)));

    let user = resolver(store)
        .resolve(Some(&session))
        .await
        .expect("authenticated session resolves");
    assert_eq!(user.name, "Slow Starter");
    assert!(user.profile.is_some());
}

#[tokio::test]
async fn transient_fetch_errors_are_tolerated() {
    let session = session_for("flaky@uni.edu", Map::new());
    let profile = wire_profile(session.user.id, "Flaky Network", "student");

    let mut sequence = Sequence::new();
    let mut store = MockTableStore::new();
    store
        .expect_find_by_id()
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|_, _| Err(StoreError::timeout("read deadline exceeded")));
    store
        .expect_find_by_id()
        .times(1)
        .in_sequence(&mut sequence)
        .return_once(move |_, _| Ok(Some(profile)));

    let user = resolver(store)
        .resolve(Some(&session))
        .await
        .expect("authenticated session resolves");
    assert_eq!(user.name, "Flaky Network");
}
