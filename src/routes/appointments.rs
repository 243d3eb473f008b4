// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Appointment panel route (`/appointments`).

use axum::{extract::Form, http::HeaderMap, response::Response, routing::get, Extension, Router};
use serde::Deserialize;
use std::sync::Arc;

use crate::client::ClientState;
use crate::error::Result;
use crate::navigation::Route;
use crate::routes::{moved_on, render, unknown_action};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route(Route::Appointments.path(), get(show).post(handle))
}

/// Events posted by the panel.
#[derive(Debug, Deserialize)]
pub struct PanelEvent {
    #[serde(default)]
    action: String,
    #[serde(default)]
    appointment_id: String,
}

async fn show(Extension(client): Extension<Arc<ClientState>>, headers: HeaderMap) -> Response {
    client.mount(Route::Appointments).await;
    render::panel(&headers, client.panel.view().await)
}

async fn handle(
    Extension(client): Extension<Arc<ClientState>>,
    headers: HeaderMap,
    Form(event): Form<PanelEvent>,
) -> Result<Response> {
    client.ensure_mounted(Route::Appointments).await;
    let panel = &client.panel;

    match event.action.as_str() {
        "fetch_all" => panel.fetch_all().await,
        "fetch_one" => panel.fetch_one(&event.appointment_id).await,
        "fetch_treatments" => panel.fetch_treatments().await,
        "refresh" => panel.refresh().await,
        "create" => panel.open_create_form(),
        "logout" => panel.logout().await,
        other => return Err(unknown_action(other)),
    }

    if let Some(redirect) = moved_on(&client, Route::Appointments) {
        return Ok(redirect);
    }
    Ok(render::panel(&headers, panel.view().await))
}
