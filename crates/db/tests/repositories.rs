//! Integration tests for the repository layer against the memory store:
//! - create/find/list per entity
//! - student-scoped reservation queries
//! - derived credited minutes

use chrono::NaiveDate;
use practicum_core::reservation::ReservationStatus;
use practicum_core::types::TrainingType;
use practicum_db::models::reservation::Reservation;
use practicum_db::models::slot::Slot;
use practicum_db::models::student::Student;
use practicum_db::repositories::{ReservationRepo, SlotRepo, StudentRepo};
use practicum_db::{DocumentStore, MemoryStore};

fn slot(date: (i32, u32, u32), capacity: u32) -> Slot {
    Slot {
        date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
        start_time: "08:30".to_string(),
        end_time: "18:20".to_string(),
        training_type: TrainingType::I,
        max_capacity: capacity,
        is_active: true,
        availability_cache: Vec::new(),
    }
}

fn student(name: &str, email: &str) -> Student {
    Student {
        name: name.to_string(),
        email: email.to_string(),
    }
}

async fn reservation(
    store: &dyn DocumentStore,
    student_id: &str,
    slot_id: &str,
    status: ReservationStatus,
) -> String {
    let s = SlotRepo::find_by_id(store, slot_id).await.unwrap().unwrap();
    let r = Reservation::new(student_id, slot_id, &s.data, "08:30", "10:30", status, None);
    ReservationRepo::create(store, r).await.unwrap().id
}

#[tokio::test]
async fn slot_create_and_find_round_trip() {
    let store = MemoryStore::new();
    let created = SlotRepo::create(&store, slot((2025, 6, 10), 5)).await.unwrap();
    let found = SlotRepo::find_by_id(&store, &created.id).await.unwrap().unwrap();
    assert_eq!(found.data, created.data);
}

#[tokio::test]
async fn slot_batch_create_lands_every_date() {
    let store = MemoryStore::new();
    let slots = vec![slot((2025, 6, 10), 5), slot((2025, 6, 11), 5)];
    let ids = SlotRepo::create_batch(&store, slots).await.unwrap();
    assert_eq!(ids.len(), 2);
    assert_eq!(SlotRepo::list_all(&store).await.unwrap().len(), 2);
}

#[tokio::test]
async fn list_active_on_filters_date_and_flag() {
    let store = MemoryStore::new();
    SlotRepo::create(&store, slot((2025, 6, 10), 5)).await.unwrap();
    let mut inactive = slot((2025, 6, 10), 5);
    inactive.is_active = false;
    SlotRepo::create(&store, inactive).await.unwrap();
    SlotRepo::create(&store, slot((2025, 6, 11), 5)).await.unwrap();

    let date = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
    assert_eq!(SlotRepo::list_active_on(&store, date).await.unwrap().len(), 1);
}

#[tokio::test]
async fn student_lookup_by_email() {
    let store = MemoryStore::new();
    let created = StudentRepo::create(&store, student("Aoi", "aoi@example.ac.jp"))
        .await
        .unwrap();
    let found = StudentRepo::find_by_email(&store, "aoi@example.ac.jp")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, created.id);
    assert!(StudentRepo::find_by_email(&store, "nobody@example.ac.jp")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn reservation_queries_scope_by_student_and_slot() {
    let store = MemoryStore::new();
    let s1 = SlotRepo::create(&store, slot((2025, 6, 10), 5)).await.unwrap().id;
    let s2 = SlotRepo::create(&store, slot((2025, 6, 11), 5)).await.unwrap().id;

    reservation(&store, "alice", &s1, ReservationStatus::Confirmed).await;
    reservation(&store, "alice", &s2, ReservationStatus::Applied).await;
    reservation(&store, "bob", &s1, ReservationStatus::Cancelled).await;

    assert_eq!(ReservationRepo::list_by_student(&store, "alice").await.unwrap().len(), 2);
    assert_eq!(ReservationRepo::list_by_slot(&store, &s1).await.unwrap().len(), 2);
    assert_eq!(ReservationRepo::list_applied(&store).await.unwrap().len(), 1);

    // Cancelled reservations do not block a re-booking of the same slot.
    assert!(ReservationRepo::find_active_for_student_slot(&store, "bob", &s1)
        .await
        .unwrap()
        .is_none());
    assert!(ReservationRepo::find_active_for_student_slot(&store, "alice", &s1)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn duplicate_priority_detection() {
    let store = MemoryStore::new();
    let s1 = SlotRepo::create(&store, slot((2025, 6, 10), 5)).await.unwrap();
    let mut r = Reservation::new(
        "alice",
        &s1.id,
        &s1.data,
        "08:30",
        "10:30",
        ReservationStatus::Applied,
        Some(1),
    );
    ReservationRepo::create(&store, r.clone()).await.unwrap();

    assert!(ReservationRepo::has_application_at_priority(&store, "alice", 1)
        .await
        .unwrap());
    assert!(!ReservationRepo::has_application_at_priority(&store, "alice", 2)
        .await
        .unwrap());

    // A cancelled application frees the rank.
    r.status = ReservationStatus::Cancelled;
    ReservationRepo::create(&store, r).await.unwrap();
    assert!(!ReservationRepo::has_application_at_priority(&store, "bob", 1)
        .await
        .unwrap());
}

#[tokio::test]
async fn credited_minutes_are_derived_from_completed_records() {
    let store = MemoryStore::new();
    let s1 = SlotRepo::create(&store, slot((2025, 6, 10), 5)).await.unwrap();

    for (status, minutes) in [
        (ReservationStatus::Completed, Some(120u16)),
        (ReservationStatus::Completed, Some(150)),
        (ReservationStatus::Confirmed, Some(999)),
    ] {
        let mut r = Reservation::new(
            "alice",
            &s1.id,
            &s1.data,
            "08:30",
            "10:30",
            status,
            None,
        );
        r.actual_minutes = minutes;
        ReservationRepo::create(&store, r).await.unwrap();
    }

    assert_eq!(
        ReservationRepo::credited_minutes_for_student(&store, "alice")
            .await
            .unwrap(),
        270
    );
}
