// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.
//!
//! Each client route answers GET by mounting its view (a new visit) and POST
//! by delivering an event to the mounted view. When an event makes the view
//! navigate, the response is a redirect to the new path.

pub mod add_appointment;
pub mod appointments;
pub mod login;
pub mod render;

use crate::client::ClientState;
use crate::error::AppError;
use crate::middleware::{attach_client, route_guard};
use crate::navigation::Route;
use crate::AppState;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(feature = "binding-generation", ts(export, export_to = "bindings/"))]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id,
    })
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Html(render::not_found_html()))
}

/// Redirect if handling an event on `route` moved the browser elsewhere.
pub(crate) fn moved_on(client: &ClientState, route: Route) -> Option<Response> {
    let current = client.current_route();
    (current != route).then(|| Redirect::to(current.path()).into_response())
}

pub(crate) fn unknown_action(action: &str) -> AppError {
    AppError::Validation(format!("Unknown action: {}", action))
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // Client views: every request gets its browser's client state, and the
    // guard runs on matched view routes only.
    let view_routes = Router::new()
        .merge(login::routes())
        .merge(appointments::routes())
        .merge(add_appointment::routes())
        .route_layer(middleware::from_fn(route_guard))
        .layer(middleware::from_fn_with_state(state.clone(), attach_client));

    Router::new()
        .route("/health", get(health_check))
        .merge(view_routes)
        .fallback(not_found)
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
