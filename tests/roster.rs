mod common;

use alumnet::{
    events::roster::{self, NewEvent},
    users::Role,
    AppError,
};
use sqlx::SqlitePool;
use uuid::Uuid;

fn meetup(max_attendees: Option<i64>) -> NewEvent {
    NewEvent {
        title: "Alumni Meetup".to_owned(),
        description: "Annual get-together".to_owned(),
        date: "2026-03-14".to_owned(),
        time: "18:00".to_owned(),
        location: "Main Auditorium".to_owned(),
        event_type: "networking".to_owned(),
        max_attendees,
    }
}

async fn attendee_count(pool: &SqlitePool, event_id: Uuid) -> usize {
    roster::attendees(pool, event_id).await.unwrap().len()
}

#[tokio::test]
async fn only_alumni_can_create() {
    let pool = common::pool().await;
    let s = common::student(&pool, "s@test.edu").await;

    let err = roster::create(&pool, s.id, Role::Student, meetup(None))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn capacity_ceiling_is_enforced() {
    let pool = common::pool().await;
    let host = common::alumni(&pool, "host@test.edu").await;
    let event = roster::create(&pool, host.id, Role::Alumni, meetup(Some(2)))
        .await
        .unwrap();

    let s1 = common::student(&pool, "s1@test.edu").await;
    let s2 = common::student(&pool, "s2@test.edu").await;
    let s3 = common::student(&pool, "s3@test.edu").await;

    roster::register(&pool, event.id, s1.id).await.unwrap();
    roster::register(&pool, event.id, s2.id).await.unwrap();

    let err = roster::register(&pool, event.id, s3.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(ref m) if m == "Event is full"));
    assert_eq!(attendee_count(&pool, event.id).await, 2);
}

#[tokio::test]
async fn concurrent_registrations_cannot_overfill() {
    let pool = common::pool().await;
    let host = common::alumni(&pool, "host@test.edu").await;
    let event = roster::create(&pool, host.id, Role::Alumni, meetup(Some(1)))
        .await
        .unwrap();

    let s1 = common::student(&pool, "s1@test.edu").await;
    let s2 = common::student(&pool, "s2@test.edu").await;

    // both can pass the membership check; the guarded insert admits one
    let (r1, r2) = tokio::join!(
        roster::register(&pool, event.id, s1.id),
        roster::register(&pool, event.id, s2.id),
    );
    assert_eq!(r1.is_ok() as u8 + r2.is_ok() as u8, 1);
    assert_eq!(attendee_count(&pool, event.id).await, 1);

    let err = r1.err().or(r2.err()).unwrap();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn duplicate_registration_is_reported_before_capacity() {
    let pool = common::pool().await;
    let host = common::alumni(&pool, "host@test.edu").await;
    let event = roster::create(&pool, host.id, Role::Alumni, meetup(Some(1)))
        .await
        .unwrap();

    let s1 = common::student(&pool, "s1@test.edu").await;
    roster::register(&pool, event.id, s1.id).await.unwrap();

    // the event is now full, but a repeat from a member must still read as
    // a duplicate, not as the event being full
    let err = roster::register(&pool, event.id, s1.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(ref m) if m == "Already registered for this event"));
    assert_eq!(attendee_count(&pool, event.id).await, 1);
}

#[tokio::test]
async fn unregister_is_idempotent_and_reopens_capacity() {
    let pool = common::pool().await;
    let host = common::alumni(&pool, "host@test.edu").await;
    let event = roster::create(&pool, host.id, Role::Alumni, meetup(Some(1)))
        .await
        .unwrap();

    let s1 = common::student(&pool, "s1@test.edu").await;
    let s2 = common::student(&pool, "s2@test.edu").await;

    // removing a non-member is a success no-op
    roster::unregister(&pool, event.id, s2.id).await.unwrap();

    roster::register(&pool, event.id, s1.id).await.unwrap();
    let err = roster::register(&pool, event.id, s2.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(ref m) if m == "Event is full"));

    roster::unregister(&pool, event.id, s1.id).await.unwrap();
    assert_eq!(attendee_count(&pool, event.id).await, 0);

    // freed slot admits the previously rejected user; no lingering state
    roster::register(&pool, event.id, s2.id).await.unwrap();
    assert_eq!(
        roster::attendees(&pool, event.id).await.unwrap(),
        vec![s2.id]
    );

    // and the one who left can come back once the slot frees again
    roster::unregister(&pool, event.id, s2.id).await.unwrap();
    roster::register(&pool, event.id, s1.id).await.unwrap();
}

#[tokio::test]
async fn uncapped_event_admits_everyone() {
    let pool = common::pool().await;
    let host = common::alumni(&pool, "host@test.edu").await;
    let event = roster::create(&pool, host.id, Role::Alumni, meetup(None))
        .await
        .unwrap();

    for i in 0..5 {
        let s = common::student(&pool, &format!("s{i}@test.edu")).await;
        roster::register(&pool, event.id, s.id).await.unwrap();
    }
    assert_eq!(attendee_count(&pool, event.id).await, 5);
}

#[tokio::test]
async fn missing_event_is_not_found() {
    let pool = common::pool().await;
    let s = common::student(&pool, "s@test.edu").await;

    let err = roster::register(&pool, Uuid::now_v7(), s.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = roster::unregister(&pool, Uuid::now_v7(), s.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn only_the_organizer_deletes() {
    let pool = common::pool().await;
    let host = common::alumni(&pool, "host@test.edu").await;
    let other = common::alumni(&pool, "other@test.edu").await;
    let event = roster::create(&pool, host.id, Role::Alumni, meetup(None))
        .await
        .unwrap();

    let s1 = common::student(&pool, "s1@test.edu").await;
    roster::register(&pool, event.id, s1.id).await.unwrap();

    let err = roster::delete(&pool, event.id, other.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    roster::delete(&pool, event.id, host.id).await.unwrap();
    assert!(roster::fetch(&pool, event.id).await.unwrap().is_none());

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM event_attendees")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}
