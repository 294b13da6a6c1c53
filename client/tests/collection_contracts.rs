//! Collection contracts for [`Directory`] over the shared in-memory store.
//!
//! These suites bypass the session pipeline and drive the data layer
//! directly, pinning the load, ordering, confirmation, and isolation
//! rules every store adapter must uphold.

mod support;

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;
use uuid::Uuid;

use client::domain::ports::Table;
use client::domain::{
    Directory, ErrorCode, EventKind, EventPatch, MemberPatch, NewAnnouncement, NewEvent,
    NewPayment, PaymentPatch, PaymentStatus, Role, SessionUser,
};

use support::{InMemoryStore, init_test_logging, object};

fn viewer() -> SessionUser {
    SessionUser {
        id: Uuid::new_v4(),
        email: "committee@org.com".to_owned(),
        name: "Committee".to_owned(),
        role: Role::Admin,
        profile: None,
    }
}

fn date(value: &str) -> NaiveDate {
    value.parse().expect("valid date literal")
}

async fn loaded(store: &Arc<InMemoryStore>) -> Directory<InMemoryStore> {
    init_test_logging();
    let mut directory = Directory::new(Arc::clone(store));
    directory.reload(Some(&viewer())).await;
    directory
}

fn seed_event(store: &InMemoryStore, id: Uuid, title: &str, date: &str, kind: &str) {
    store.seed(
        Table::Events,
        object(json!({
            "id": id,
            "title": title,
            "description": format!("{title} details"),
            "date": date,
            "time": "18:00",
            "location": "Main hall",
            "type": kind,
            "created_at": "2025-04-01T08:00:00Z",
        })),
    );
}

fn seed_profile(store: &InMemoryStore, id: Uuid, name: &str, student_id: &str, paid: bool) {
    store.seed(
        Table::Profiles,
        object(json!({
            "id": id,
            "name": name,
            "email": format!("{student_id}@uni.edu"),
            "role": "student",
            "student_id": student_id,
            "course": "Computer Science",
            "year": "2",
            "organization": "Chess Club",
            "membership_paid": paid,
            "membership_expiry": "2025-12-31",
        })),
    );
}

fn seed_payment(store: &InMemoryStore, id: Uuid, user_id: Uuid, amount: f64, status: &str) {
    store.seed(
        Table::Payments,
        object(json!({
            "id": id,
            "user_id": user_id,
            "amount": amount,
            "status": status,
            "transaction_id": Option::<String>::None,
            "created_at": "2025-05-02T10:00:00Z",
        })),
    );
}

#[tokio::test]
async fn reload_normalizes_wire_rows_into_typed_records() {
    let store = Arc::new(InMemoryStore::new());
    let ada = Uuid::new_v4();
    seed_profile(&store, ada, "Ada Lovelace", "S-001", true);
    seed_event(&store, Uuid::new_v4(), "Rust workshop", "2025-06-20", "workshop");
    store.seed(
        Table::Announcements,
        object(json!({
            "id": Uuid::new_v4(),
            "title": "Welcome week",
            "content": "Schedule inside.",
            "author": "Committee",
            "created_at": "2025-05-01T09:00:00Z",
        })),
    );
    seed_payment(&store, Uuid::new_v4(), ada, 50.0, "Pending");

    let directory = loaded(&store).await;

    let event = &directory.events()[0];
    assert_eq!(event.kind, EventKind::Workshop);
    assert_eq!(event.date, date("2025-06-20"));

    let member = &directory.members()[0];
    assert_eq!(member.name, "Ada Lovelace");
    assert!(member.membership_paid);
    assert_eq!(member.membership_expiry, Some(date("2025-12-31")));

    let payment = &directory.payments()[0];
    assert_eq!(payment.status, PaymentStatus::Pending);
    assert_eq!(payment.student_name, "Ada Lovelace");
    assert_eq!(payment.student_id, "S-001");
    assert_eq!(payment.date, payment.created_at);
}

#[tokio::test]
async fn collections_keep_their_canonical_order() {
    let store = Arc::new(InMemoryStore::new());
    seed_event(&store, Uuid::new_v4(), "Late", "2025-07-01", "meeting");
    seed_event(&store, Uuid::new_v4(), "Early", "2025-06-01", "meeting");
    seed_event(&store, Uuid::new_v4(), "Middle", "2025-06-15", "meeting");
    seed_profile(&store, Uuid::new_v4(), "zoe", "S-010", true);
    seed_profile(&store, Uuid::new_v4(), "Ada", "S-011", true);

    let directory = loaded(&store).await;

    let titles: Vec<&str> = directory.events().iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, ["Early", "Middle", "Late"]);

    let names: Vec<&str> = directory.members().iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["Ada", "zoe"]);
}

#[tokio::test]
async fn added_records_receive_backend_defaults() {
    let store = Arc::new(InMemoryStore::new());
    let mut directory = loaded(&store).await;

    let announcement = directory
        .add_announcement(NewAnnouncement {
            title: "AGM".to_owned(),
            content: "Agenda attached.".to_owned(),
            author: "Committee".to_owned(),
        })
        .await
        .expect("announcement insert succeeds");

    assert!(!announcement.id.is_nil());
    assert_eq!(directory.announcements().len(), 1);
    assert_eq!(store.row_count(Table::Announcements), 1);

    // No profile rows exist, so the enrichment falls back to placeholders.
    let payment = directory
        .add_payment(NewPayment {
            user_id: Some(Uuid::new_v4()),
            amount: 25.0,
            status: PaymentStatus::Pending,
            transaction_id: None,
        })
        .await
        .expect("payment insert succeeds");

    assert_eq!(payment.student_name, "Unknown");
    assert_eq!(payment.student_id, "N/A");
    assert_eq!(store.row_count(Table::Payments), 1);
}

#[tokio::test]
async fn event_mutations_keep_the_calendar_ordered() {
    let store = Arc::new(InMemoryStore::new());
    let meeting = Uuid::new_v4();
    seed_event(&store, meeting, "Monthly meeting", "2025-06-10", "meeting");
    let mut directory = loaded(&store).await;

    let added = directory
        .add_event(NewEvent {
            title: "Park cleanup".to_owned(),
            description: "Bring gloves.".to_owned(),
            date: date("2025-05-20"),
            time: "09:00".to_owned(),
            location: "Riverside".to_owned(),
            kind: EventKind::Volunteer,
        })
        .await
        .expect("event insert succeeds");
    assert_eq!(directory.events()[0].id, added.id);

    let moved = directory
        .update_event(
            meeting,
            EventPatch {
                date: Some(date("2025-05-01")),
                ..EventPatch::default()
            },
        )
        .await
        .expect("event update succeeds");
    assert_eq!(moved.date, date("2025-05-01"));
    assert_eq!(directory.events()[0].id, meeting);

    directory.delete_event(added.id).await.expect("event delete succeeds");
    assert_eq!(directory.events().len(), 1);
    assert_eq!(store.row_count(Table::Events), 1);
}

#[tokio::test]
async fn updating_an_absent_id_fails_and_changes_nothing() {
    let store = Arc::new(InMemoryStore::new());
    seed_event(&store, Uuid::new_v4(), "Monthly meeting", "2025-06-10", "meeting");
    let mut directory = loaded(&store).await;
    let before = directory.events().to_vec();

    let err = directory
        .update_event(
            Uuid::new_v4(),
            EventPatch {
                title: Some("Renamed".to_owned()),
                ..EventPatch::default()
            },
        )
        .await
        .expect_err("absent id is rejected");

    assert_eq!(err.code(), ErrorCode::NotFound);
    assert_eq!(directory.events(), before.as_slice());
}

#[tokio::test]
async fn deleting_an_absent_id_is_accepted() {
    let store = Arc::new(InMemoryStore::new());
    seed_event(&store, Uuid::new_v4(), "Monthly meeting", "2025-06-10", "meeting");
    let mut directory = loaded(&store).await;

    directory
        .delete_event(Uuid::new_v4())
        .await
        .expect("absent delete is a no-op");

    assert_eq!(directory.events().len(), 1);
    assert_eq!(store.row_count(Table::Events), 1);
}

#[tokio::test]
async fn payment_update_confirms_against_the_store() {
    let store = Arc::new(InMemoryStore::new());
    let ada = Uuid::new_v4();
    let pending = Uuid::new_v4();
    let sibling = Uuid::new_v4();
    seed_profile(&store, ada, "Ada Lovelace", "S-001", true);
    seed_payment(&store, pending, ada, 50.0, "Pending");
    seed_payment(&store, sibling, ada, 100.0, "Paid");
    let mut directory = loaded(&store).await;

    let settled = directory
        .update_payment(
            pending,
            PaymentPatch {
                status: Some(PaymentStatus::Paid),
                transaction_id: Some("TXN900".to_owned()),
                ..PaymentPatch::default()
            },
        )
        .await
        .expect("payment update succeeds");

    assert_eq!(settled.status, PaymentStatus::Paid);
    assert_eq!(settled.transaction_id.as_deref(), Some("TXN900"));
    assert_eq!(settled.student_name, "Ada Lovelace");

    let untouched = directory
        .payments()
        .iter()
        .find(|p| p.id == sibling)
        .expect("sibling payment is retained");
    assert_eq!(untouched.amount, 100.0);
    assert_eq!(untouched.transaction_id, None);

    assert_eq!(directory.total_revenue(), 150.0);
}

#[tokio::test]
async fn member_updates_merge_and_deletes_remove_the_profile() {
    let store = Arc::new(InMemoryStore::new());
    let ada = Uuid::new_v4();
    let bob = Uuid::new_v4();
    seed_profile(&store, ada, "Ada Lovelace", "S-001", false);
    seed_profile(&store, bob, "Bob Byte", "S-002", true);
    let mut directory = loaded(&store).await;

    let renewed = directory
        .update_member(
            ada,
            MemberPatch {
                membership_paid: Some(true),
                membership_expiry: Some(date("2026-12-31")),
                ..MemberPatch::default()
            },
        )
        .await
        .expect("member update succeeds");

    // The store merges the patch into the stored row, so untouched
    // columns survive the round trip.
    assert_eq!(renewed.name, "Ada Lovelace");
    assert!(renewed.membership_paid);
    assert_eq!(renewed.membership_expiry, Some(date("2026-12-31")));

    directory.delete_member(bob).await.expect("member delete succeeds");
    assert_eq!(store.row_count(Table::Profiles), 1);
    assert_eq!(directory.members().len(), 1);
    assert_eq!(directory.members()[0].id, ada);
}
