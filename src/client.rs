// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-browser client state.
//!
//! A browser is identified by its signed client cookie. Each one gets its own
//! session context, navigator and view models; nothing is shared between
//! browsers apart from the backend handle.

use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use crate::config::Config;
use crate::navigation::{Navigator, Route, View};
use crate::services::{AuthGateway, Backend, SessionContext};
use crate::views::{AppointmentPanel, CreateAppointmentForm, LoginPage};

pub struct ClientState {
    pub id: String,
    pub auth: AuthGateway,
    pub nav: Navigator,
    pub login: LoginPage,
    pub panel: AppointmentPanel,
    pub form: CreateAppointmentForm,
    last_seen: Mutex<Instant>,
}

impl ClientState {
    pub fn new(id: String, backend: Arc<dyn Backend>, config: &Config) -> Self {
        let auth = AuthGateway::new(backend.clone(), SessionContext::new());
        let nav = Navigator::new(Route::Root);
        Self {
            login: LoginPage::new(auth.clone(), nav.clone(), config.delays),
            panel: AppointmentPanel::new(backend.clone(), auth.clone(), nav.clone()),
            form: CreateAppointmentForm::new(
                backend,
                auth.clone(),
                nav.clone(),
                config.cancel_behavior,
                config.delays.create_redirect,
            ),
            id,
            auth,
            nav,
            last_seen: Mutex::new(Instant::now()),
        }
    }

    /// Start a new visit of `route` and mount its view.
    pub async fn mount(&self, route: Route) {
        self.nav.navigate(route);
        self.mount_view(route.view()).await;
    }

    /// Make sure events posted to `route` reach a view mounted in the current
    /// visit. Another route starts a fresh visit; the current route whose
    /// view is missing or left over from an earlier visit (a new client, or a
    /// delayed navigation) is mounted in place.
    pub async fn ensure_mounted(&self, route: Route) {
        if self.current_route() != route {
            self.mount(route).await;
        } else if !self.view_is_current(route.view()).await {
            tracing::debug!(client_id = %self.id, path = route.path(), "Mounting view in place");
            self.mount_view(route.view()).await;
        }
    }

    async fn mount_view(&self, view: View) {
        match view {
            View::LoginSignup => self.login.mount().await,
            View::AppointmentPanel => self.panel.mount().await,
            View::CreateAppointment => self.form.mount().await,
        }
    }

    async fn view_is_current(&self, view: View) -> bool {
        match view {
            View::LoginSignup => self.login.is_current().await,
            View::AppointmentPanel => self.panel.is_current().await,
            View::CreateAppointment => self.form.is_current().await,
        }
    }

    pub fn current_route(&self) -> Route {
        self.nav.location().route
    }

    pub fn touch(&self) {
        let mut last_seen = self.last_seen.lock().unwrap_or_else(|e| e.into_inner());
        *last_seen = Instant::now();
    }

    fn idle_for(&self, now: Instant) -> Duration {
        let last_seen = self.last_seen.lock().unwrap_or_else(|e| e.into_inner());
        now.saturating_duration_since(*last_seen)
    }
}

/// All live client states, keyed by client id.
#[derive(Clone, Default)]
pub struct ClientRegistry {
    clients: Arc<DashMap<String, Arc<ClientState>>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<Arc<ClientState>> {
        self.clients.get(id).map(|c| c.clone())
    }

    pub fn get_or_create(
        &self,
        id: &str,
        backend: &Arc<dyn Backend>,
        config: &Config,
    ) -> Arc<ClientState> {
        self.clients
            .entry(id.to_string())
            .or_insert_with(|| {
                tracing::debug!(client_id = %id, "New client state");
                Arc::new(ClientState::new(id.to_string(), backend.clone(), config))
            })
            .clone()
    }

    /// Drop clients idle for longer than `timeout`. Returns how many went.
    pub fn purge_idle(&self, timeout: Duration) -> usize {
        let now = Instant::now();
        let before = self.clients.len();
        self.clients.retain(|_, client| client.idle_for(now) <= timeout);
        let purged = before.saturating_sub(self.clients.len());
        if purged > 0 {
            tracing::info!(purged, remaining = self.clients.len(), "Evicted idle clients");
        }
        purged
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
