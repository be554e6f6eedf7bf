//! End-to-end service scenarios against both backends.

mod common;

use calendrier_core::store::FileBackend;
use calendrier_core::{
    AggregateStore, CalendarError, CalendarQueryService, CreateCalendarRequest, EventDraft,
    EventPatch, NotFound, PartitionKey, PartitionService,
};
use common::{file_store, memory_store, services};
use pretty_assertions::assert_eq;
use std::sync::Arc;

#[tokio::test]
async fn test_create_then_append_general() {
    let store = memory_store();
    let query = CalendarQueryService::new(store.clone());
    let general = PartitionService::new(store, PartitionKey::General);

    query
        .create_calendar(&CreateCalendarRequest::default())
        .await
        .unwrap();
    let record = general
        .append(&EventDraft::new("2025-09-01", "Rentrée", "Début des cours"))
        .await
        .unwrap();

    let listed = general.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0], record);
    assert!(!record.id.is_empty());
    assert_eq!(record.date.to_string(), "2025-09-01");
    assert_eq!(record.titre, "Rentrée");
    assert_eq!(record.description, "Début des cours");
}

#[tokio::test]
async fn test_update_title_in_s1() {
    let (store, _dir) = file_store();
    let [s1, _, _] = services(&store);

    let e1 = s1
        .append(&EventDraft::new("2025-10-06", "Partiel", "Amphi B"))
        .await
        .unwrap();
    s1.update(
        &e1.id,
        &EventPatch {
            titre: Some("Nouveau titre".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let listed = s1.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].titre, "Nouveau titre");
    assert_eq!(listed[0].date, e1.date);
    assert_eq!(listed[0].description, "Amphi B");
}

#[tokio::test]
async fn test_delete_twice_in_s1() {
    let store = memory_store();
    let [s1, _, _] = services(&store);

    let e1 = s1
        .append(&EventDraft::new("2025-11-11", "Férié", "Pas de cours"))
        .await
        .unwrap();
    s1.remove(&e1.id).await.unwrap();

    assert!(s1.list().await.unwrap().is_empty());
    assert!(matches!(
        s1.remove(&e1.id).await,
        Err(CalendarError::NotFound(NotFound::Event { .. }))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_s1_s2_appends_on_fresh_calendar() {
    let (store, _dir) = file_store();
    let query = CalendarQueryService::new(store.clone());
    query
        .create_calendar(&CreateCalendarRequest::default())
        .await
        .unwrap();
    let [s1, s2, _] = services(&store);

    let (a, b) = tokio::join!(
        tokio::spawn(async move {
            s1.append(&EventDraft::new("2025-09-08", "TD", "Groupe 1")).await
        }),
        tokio::spawn(async move {
            s2.append(&EventDraft::new("2026-02-02", "TD", "Groupe 2")).await
        }),
    );
    let a = a.unwrap().unwrap();
    let b = b.unwrap().unwrap();

    let calendar = query.get_full_calendar().await.unwrap().unwrap();
    assert_eq!(calendar.partition(PartitionKey::S1), &[a][..]);
    assert_eq!(calendar.partition(PartitionKey::S2), &[b][..]);
    assert!(calendar.partition(PartitionKey::General).is_empty());
}

#[tokio::test]
async fn test_file_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("calendar.json");

    let first = Arc::new(AggregateStore::new(FileBackend::new(&path)));
    let general = PartitionService::new(first, PartitionKey::General);
    let record = general
        .append(&EventDraft::new("2025-12-20T18:00:00Z", "Vacances", "Fin du semestre"))
        .await
        .unwrap();
    drop(general);

    let reopened = Arc::new(AggregateStore::new(FileBackend::new(&path)));
    let general = PartitionService::new(reopened, PartitionKey::General);
    assert_eq!(general.list().await.unwrap(), vec![record]);
}
