// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Route guard.
//!
//! Protected routes need a session; the login routes send signed-in browsers
//! on to the appointments list. A session check that fails because the
//! backend is unreachable is not treated as "signed out".

use axum::{
    extract::Request,
    http::Method,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Extension,
};
use std::sync::Arc;

use crate::client::ClientState;
use crate::navigation::Route;
use crate::routes::render;
use crate::services::AuthGateway;

pub const UNAVAILABLE_FALLBACK: &str = "Service temporarily unavailable";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    Redirect(Route),
    /// Session state unknown; the message says why.
    Unavailable(String),
}

/// Decide what to do with a visit of `route`.
pub async fn check(auth: &AuthGateway, route: Route) -> GuardDecision {
    match auth.current_session().await {
        Ok(Some(_)) if !route.is_protected() => GuardDecision::Redirect(Route::Appointments),
        Ok(None) if route.is_protected() => GuardDecision::Redirect(Route::Login),
        Ok(_) => GuardDecision::Proceed,
        Err(e) if route.is_protected() => {
            tracing::warn!(error = %e, path = route.path(), "Session check failed");
            GuardDecision::Unavailable(e.user_message(UNAVAILABLE_FALLBACK))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Session check failed, showing login anyway");
            GuardDecision::Proceed
        }
    }
}

/// Guard middleware for the view routes. Login routes are only guarded on
/// GET so that their own form posts go through.
pub async fn route_guard(
    Extension(client): Extension<Arc<ClientState>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(route) = Route::from_path(request.uri().path()) else {
        return next.run(request).await;
    };
    if !route.is_protected() && request.method() != Method::GET {
        return next.run(request).await;
    }

    match check(&client.auth, route).await {
        GuardDecision::Proceed => next.run(request).await,
        GuardDecision::Redirect(to) => {
            tracing::debug!(from = route.path(), to = to.path(), "Guard redirect");
            Redirect::to(to.path()).into_response()
        }
        GuardDecision::Unavailable(message) => {
            render::unavailable(request.headers(), route, &message)
        }
    }
}
