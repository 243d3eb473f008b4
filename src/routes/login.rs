// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login / signup routes (`/` and `/login`).

use axum::{
    extract::Form,
    http::{HeaderMap, Uri},
    response::Response,
    routing::get,
    Extension, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::client::ClientState;
use crate::error::Result;
use crate::navigation::Route;
use crate::routes::{moved_on, render, unknown_action};
use crate::views::{AuthTab, SignupFields};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(Route::Root.path(), get(show).post(handle))
        .route(Route::Login.path(), get(show).post(handle))
}

/// Events posted by the login page.
#[derive(Debug, Deserialize)]
pub struct LoginEvent {
    #[serde(default)]
    action: String,
    #[serde(default)]
    tab: Option<AuthTab>,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    full_name: String,
    #[serde(default)]
    confirm_password: String,
}

fn route_of(uri: &Uri) -> Route {
    match Route::from_path(uri.path()) {
        Some(Route::Root) => Route::Root,
        _ => Route::Login,
    }
}

async fn show(
    Extension(client): Extension<Arc<ClientState>>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let route = route_of(&uri);
    client.mount(route).await;
    render::login(&headers, route, client.login.view().await)
}

async fn handle(
    Extension(client): Extension<Arc<ClientState>>,
    uri: Uri,
    headers: HeaderMap,
    Form(event): Form<LoginEvent>,
) -> Result<Response> {
    let route = route_of(&uri);
    client.ensure_mounted(route).await;

    match event.action.as_str() {
        "login" => {
            client
                .login
                .submit_login(&event.email, &event.password)
                .await
        }
        "signup" => {
            client
                .login
                .submit_signup(SignupFields {
                    full_name: event.full_name,
                    email: event.email,
                    password: event.password,
                    confirm_password: event.confirm_password,
                })
                .await
        }
        "tab" => client.login.switch_tab(event.tab.unwrap_or_default()).await,
        other => return Err(unknown_action(other)),
    }

    if let Some(redirect) = moved_on(&client, route) {
        return Ok(redirect);
    }
    Ok(render::login(&headers, route, client.login.view().await))
}
