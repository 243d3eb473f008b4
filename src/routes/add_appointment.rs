// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Appointment creation route (`/add-appointment`).

use axum::{extract::Form, http::HeaderMap, response::Response, routing::get, Extension, Router};
use serde::Deserialize;
use std::sync::Arc;

use crate::client::ClientState;
use crate::error::Result;
use crate::models::{AppointmentDraft, AppointmentStatus};
use crate::navigation::Route;
use crate::routes::{moved_on, render, unknown_action};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route(Route::AddAppointment.path(), get(show).post(handle))
}

/// Events posted by the creation form. Status arrives as its wire spelling.
#[derive(Debug, Deserialize)]
pub struct FormEvent {
    #[serde(default)]
    action: String,
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    staff_id: String,
    #[serde(default)]
    appointment_date: String,
    #[serde(default)]
    appointment_time: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    virtual_link: String,
    #[serde(default)]
    notes: String,
}

impl FormEvent {
    fn into_draft(self) -> Result<AppointmentDraft> {
        let status = match self.status.trim() {
            "" => AppointmentStatus::default(),
            s => s.parse()?,
        };
        Ok(AppointmentDraft {
            user_id: self.user_id,
            staff_id: self.staff_id,
            appointment_date: self.appointment_date,
            appointment_time: self.appointment_time,
            status,
            virtual_link: self.virtual_link,
            notes: self.notes,
        })
    }
}

async fn show(Extension(client): Extension<Arc<ClientState>>, headers: HeaderMap) -> Response {
    client.mount(Route::AddAppointment).await;
    render::create_form(&headers, client.form.view().await)
}

async fn handle(
    Extension(client): Extension<Arc<ClientState>>,
    headers: HeaderMap,
    Form(mut event): Form<FormEvent>,
) -> Result<Response> {
    client.ensure_mounted(Route::AddAppointment).await;

    let action = std::mem::take(&mut event.action);
    match action.as_str() {
        "submit" => client.form.submit(event.into_draft()?).await,
        "cancel" => client.form.cancel().await,
        other => return Err(unknown_action(other)),
    }

    if let Some(redirect) = moved_on(&client, Route::AddAppointment) {
        return Ok(redirect);
    }
    Ok(render::create_form(&headers, client.form.view().await))
}
