// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Appointment panel tests, driven through `/appointments`.

use axum::http::StatusCode;
use clinic_desk::services::memory::ops;
use common::{body_json, body_text, create_test_app, location, seed, Browser};
use serde_json::json;

mod common;

async fn signed_in() -> (
    Browser,
    std::sync::Arc<clinic_desk::services::MemoryBackend>,
    String,
) {
    let (app, _, backend) = create_test_app();
    let appointment_id = seed(&backend).await;
    let mut browser = Browser::json(&app);
    browser.sign_in_new_account("desk@example.com").await;
    let response = browser.get("/appointments").await;
    assert_eq!(response.status(), StatusCode::OK);
    (browser, backend, appointment_id)
}

#[tokio::test]
async fn test_fresh_panel_shows_nothing() {
    let (mut browser, _, _) = signed_in().await;
    let body = body_json(browser.get("/appointments").await).await;
    assert_eq!(body["view"]["active_view"], serde_json::Value::Null);
    assert_eq!(body["view"]["visible"], json!({ "kind": "nothing" }));
}

#[tokio::test]
async fn test_fetch_all_appointments() {
    let (mut browser, _, appointment_id) = signed_in().await;

    let response = browser
        .post("/appointments", &[("action", "fetch_all")])
        .await;
    let body = body_json(response).await;
    let view = &body["view"];
    assert_eq!(view["active_view"], "all_appointments");
    assert_eq!(view["visible"]["kind"], "appointments");
    assert_eq!(
        view["visible"]["data"][0],
        json!({
            "id": appointment_id,
            "patient_name": "John Doe",
            "date": "2025-05-01",
            "status": "completed"
        })
    );
}

#[tokio::test]
async fn test_treatment_cost_is_formatted() {
    let (mut browser, _, _) = signed_in().await;

    let body = body_json(
        browser
            .post("/appointments", &[("action", "fetch_treatments")])
            .await,
    )
    .await;
    assert_eq!(body["view"]["visible"]["data"][0]["cost"], "$50");
    assert_eq!(body["view"]["visible"]["data"][0]["duration"], "30");
}

#[tokio::test]
async fn test_switching_views_does_not_refetch() {
    let (mut browser, backend, _) = signed_in().await;

    for action in ["fetch_all", "fetch_treatments", "fetch_all", "fetch_treatments"] {
        browser.post("/appointments", &[("action", action)]).await;
    }
    assert_eq!(backend.calls(ops::LIST_APPOINTMENTS), 1);
    assert_eq!(backend.calls(ops::LIST_TREATMENTS), 1);

    let body = body_json(
        browser
            .post("/appointments", &[("action", "refresh")])
            .await,
    )
    .await;
    assert_eq!(backend.calls(ops::LIST_TREATMENTS), 2);
    assert_eq!(body["view"]["active_view"], "all_treatments");

    // A new visit starts from scratch.
    browser.get("/appointments").await;
    browser.post("/appointments", &[("action", "fetch_all")]).await;
    assert_eq!(backend.calls(ops::LIST_APPOINTMENTS), 2);
}

#[tokio::test]
async fn test_fetch_one_found_and_not_found() {
    let (mut browser, backend, appointment_id) = signed_in().await;

    let body = body_json(
        browser
            .post(
                "/appointments",
                &[("action", "fetch_one"), ("appointment_id", &appointment_id)],
            )
            .await,
    )
    .await;
    let detail = &body["view"]["visible"]["data"];
    assert_eq!(body["view"]["visible"]["kind"], "appointment");
    assert_eq!(detail["patient_name"], "John Doe");
    assert_eq!(detail["time"], "09:00");
    assert_eq!(detail["doctor"], "Dentist (Orthodontics)");
    assert_eq!(detail["notes"], "Bring x-rays");
    assert_eq!(detail["unrecorded"], json!(["Duration", "Room"]));

    // Same id again: already loaded.
    browser
        .post(
            "/appointments",
            &[("action", "fetch_one"), ("appointment_id", &appointment_id)],
        )
        .await;
    assert_eq!(backend.calls(ops::FIND_APPOINTMENT), 1);

    let response = browser
        .post(
            "/appointments",
            &[("action", "fetch_one"), ("appointment_id", "999")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["view"]["error"], "No appointment found with ID 999");
    assert_eq!(body["view"]["visible"], json!({ "kind": "nothing" }));

    let body = body_json(
        browser
            .post("/appointments", &[("action", "fetch_one"), ("appointment_id", " ")])
            .await,
    )
    .await;
    assert_eq!(body["view"]["error"], "Please enter an appointment ID");
    assert_eq!(backend.calls(ops::FIND_APPOINTMENT), 2);
}

#[tokio::test]
async fn test_backend_error_is_shown_with_fallback() {
    let (mut browser, backend, _) = signed_in().await;
    backend.fail(ops::LIST_APPOINTMENTS, "");

    let body = body_json(
        browser
            .post("/appointments", &[("action", "fetch_all")])
            .await,
    )
    .await;
    assert_eq!(body["view"]["error"], "Failed to fetch appointments");
    assert_eq!(body["view"]["loading"], false);
}

#[tokio::test]
async fn test_create_button_navigates() {
    let (mut browser, _, _) = signed_in().await;
    let response = browser
        .post("/appointments", &[("action", "create")])
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/add-appointment"));
}

#[tokio::test]
async fn test_html_rendering() {
    let (app, _, backend) = create_test_app();
    seed(&backend).await;
    let mut browser = Browser::html(&app);
    browser.sign_in_new_account("desk@example.com").await;
    browser.get("/appointments").await;

    let page = body_text(
        browser
            .post("/appointments", &[("action", "fetch_treatments")])
            .await,
    )
    .await;
    assert!(page.contains("<td>Cleaning</td>"));
    assert!(page.contains("<td>$50</td>"));
}
