use anyhow::Result;
use httpmock::prelude::*;
use httpmock::Method::PATCH;
use clinic_slots::domain::model::NewBooking;
use clinic_slots::domain::time::{parse_date, parse_time};
use clinic_slots::{
    BookingError, BookingResult, BookingStatus, BookingStore, EngineSettings, HttpStore,
    RequestContext, SlotEngine, TimeSlot,
};
use serde_json::json;
use std::time::Duration;

fn store_for(server: &MockServer) -> HttpStore {
    HttpStore::new(&server.url("/api"), Duration::from_secs(5)).unwrap()
}

fn mock_schedule(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET).path("/api/providers/doc-1/working-hours");
        then.status(200)
            .json_body(json!({"providerId": "doc-1", "startHour": 8, "endHour": 10}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/services/checkup");
        then.status(200).json_body(json!({
            "id": "checkup",
            "providerId": "doc-1",
            "name": "General checkup",
            "price": 50,
            "durationMinutes": 30
        }));
    });
}

fn booked(id: &str, start: &str, end: &str, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "providerId": "doc-1",
        "patientId": "pat-9",
        "serviceId": "checkup",
        "date": "2024-05-01",
        "startTime": start,
        "endTime": end,
        "status": status
    })
}

#[tokio::test]
async fn test_list_available_slots_over_http() {
    let server = MockServer::start();
    mock_schedule(&server);
    let bookings_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/providers/doc-1/bookings")
            .query_param("date", "2024-05-01");
        then.status(200).json_body(json!([
            booked("b-1", "09:00", "09:30", "confirmed"),
            booked("b-2", "08:00", "08:30", "cancelled")
        ]));
    });

    let engine = SlotEngine::new(store_for(&server), EngineSettings::default());
    let slots = engine
        .list_available_slots("doc-1", "checkup", parse_date("2024-05-01").unwrap())
        .await
        .unwrap();

    bookings_mock.assert();
    let labels: Vec<String> = slots.iter().map(|s| s.to_string()).collect();
    assert_eq!(labels, vec!["08:00-08:30", "08:30-09:00", "09:30-10:00"]);
}

#[tokio::test]
async fn test_confirm_booking_posts_conditional_write() {
    let server = MockServer::start();
    mock_schedule(&server);
    server.mock(|when, then| {
        when.method(GET).path("/api/providers/doc-1/bookings");
        then.status(200).json_body(json!([]));
    });
    let create_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/providers/doc-1/bookings")
            .body_contains("\"startTime\":\"09:00\"")
            .body_contains("\"status\":\"confirmed\"");
        then.status(201)
            .json_body(booked("b-new", "09:00", "09:30", "confirmed"));
    });

    let engine = SlotEngine::new(store_for(&server), EngineSettings::default());
    let slot = TimeSlot::new(parse_time("09:00").unwrap(), parse_time("09:30").unwrap()).unwrap();
    let result = engine
        .confirm_booking(
            &RequestContext::patient("pat-9"),
            "doc-1",
            "pat-9",
            "checkup",
            parse_date("2024-05-01").unwrap(),
            slot,
        )
        .await;

    create_mock.assert();
    match result {
        BookingResult::Confirmed(booking) => assert_eq!(booking.id, "b-new"),
        other => panic!("expected confirmation, got {:?}", other),
    }
}

#[tokio::test]
async fn test_conflict_status_maps_to_slot_taken() {
    let server = MockServer::start();
    mock_schedule(&server);
    server.mock(|when, then| {
        when.method(GET).path("/api/providers/doc-1/bookings");
        then.status(200).json_body(json!([]));
    });
    server.mock(|when, then| {
        when.method(POST).path("/api/providers/doc-1/bookings");
        then.status(409);
    });

    let engine = SlotEngine::new(store_for(&server), EngineSettings::default());
    let slot = TimeSlot::new(parse_time("08:00").unwrap(), parse_time("08:30").unwrap()).unwrap();
    let result = engine
        .confirm_booking(
            &RequestContext::patient("pat-9"),
            "doc-1",
            "pat-9",
            "checkup",
            parse_date("2024-05-01").unwrap(),
            slot,
        )
        .await;

    assert!(matches!(result, BookingResult::SlotNoLongerAvailable));
}

#[tokio::test]
async fn test_server_error_on_write_is_persist_failure() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/providers/doc-1/bookings");
        then.status(503);
    });

    let outcome = store_for(&server)
        .insert_if_vacant(NewBooking {
            provider_id: "doc-1".to_string(),
            patient_id: "pat-9".to_string(),
            service_id: "checkup".to_string(),
            date: parse_date("2024-05-01").unwrap(),
            start_time: parse_time("08:00").unwrap(),
            end_time: parse_time("08:30").unwrap(),
            status: BookingStatus::Confirmed,
            notes: String::new(),
        })
        .await;

    let err = outcome.unwrap_err();
    assert!(matches!(err, BookingError::PersistFailed { .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_read_failures_are_fetch_errors() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/providers/doc-1/working-hours");
        then.status(500);
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/services/missing");
        then.status(404);
    });

    let store = store_for(&server);
    assert!(matches!(
        store.get_working_hours("doc-1").await,
        Err(BookingError::DataFetchFailed { .. })
    ));
    assert!(matches!(
        store.get_service_by_id("missing").await,
        Err(BookingError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_status_update_and_delete_requests() -> Result<()> {
    let server = MockServer::start();
    let patch_mock = server.mock(|when, then| {
        when.method(PATCH)
            .path("/api/bookings/b-1")
            .json_body(json!({"status": "no-show"}));
        then.status(200)
            .json_body(booked("b-1", "09:00", "09:30", "no-show"));
    });
    let delete_mock = server.mock(|when, then| {
        when.method(DELETE).path("/api/bookings/b-1");
        then.status(204);
    });

    let store = HttpStore::new(&server.url("/api"), Duration::from_secs(5))?;
    let updated = store
        .update_booking_status("b-1", BookingStatus::NoShow)
        .await?;
    assert_eq!(updated.status, BookingStatus::NoShow);
    store.delete_booking("b-1").await?;

    patch_mock.assert();
    delete_mock.assert();
    Ok(())
}
