// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Appointment query panel.
//!
//! Three fetches (all appointments, one appointment, all treatments) share a
//! single loading flag and error slot; an active-view selector decides which
//! result set is visible. Loaded sets are kept when switching views, and
//! switching back to a loaded set does not fetch again; `refresh` does.

use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::models::{AppointmentDetail, AppointmentSummary, Treatment};
use crate::navigation::{Mount, Navigator, Route};
use crate::services::{AuthGateway, Backend};
use crate::views::EXPIRED_MESSAGE;

pub const FETCH_ALL_FALLBACK: &str = "Failed to fetch appointments";
pub const FETCH_ONE_FALLBACK: &str = "Failed to fetch appointment details";
pub const FETCH_TREATMENTS_FALLBACK: &str = "Failed to fetch treatments";
pub const MISSING_ID_MESSAGE: &str = "Please enter an appointment ID";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(feature = "binding-generation", ts(export, export_to = "bindings/"))]
pub enum ActiveView {
    AllAppointments,
    SingleAppointment,
    AllTreatments,
}

#[derive(Debug, Default)]
struct PanelState {
    mount: Mount,
    active_view: Option<ActiveView>,
    appointment_id: String,
    loading: bool,
    error: Option<String>,
    appointments: Option<Vec<AppointmentSummary>>,
    appointment: Option<AppointmentDetail>,
    treatments: Option<Vec<Treatment>>,
}

/// The result set currently shown.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(feature = "binding-generation", ts(export, export_to = "bindings/"))]
pub enum Visible {
    Nothing,
    Appointments(Vec<AppointmentSummary>),
    Appointment(AppointmentDetail),
    Treatments(Vec<Treatment>),
}

/// Render-ready snapshot of the panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(feature = "binding-generation", ts(export, export_to = "bindings/"))]
pub struct PanelView {
    pub active_view: Option<ActiveView>,
    pub appointment_id: String,
    pub loading: bool,
    pub error: Option<String>,
    pub visible: Visible,
}

pub struct AppointmentPanel {
    backend: Arc<dyn Backend>,
    auth: AuthGateway,
    nav: Navigator,
    state: Mutex<PanelState>,
}

impl AppointmentPanel {
    pub fn new(backend: Arc<dyn Backend>, auth: AuthGateway, nav: Navigator) -> Self {
        Self {
            backend,
            auth,
            nav,
            state: Mutex::new(PanelState::default()),
        }
    }

    /// Fresh state for the current visit.
    pub async fn mount(&self) {
        let mut state = self.state.lock().await;
        *state = PanelState::default();
        state.mount.mount(self.nav.location());
    }

    pub async fn is_current(&self) -> bool {
        self.state.lock().await.mount.is_current(&self.nav)
    }

    pub async fn view(&self) -> PanelView {
        let state = self.state.lock().await;
        // Results are hidden while a fetch is in flight.
        let visible = match (state.loading, state.active_view) {
            (true, _) | (false, None) => Visible::Nothing,
            (false, Some(ActiveView::AllAppointments)) => state
                .appointments
                .clone()
                .map_or(Visible::Nothing, Visible::Appointments),
            (false, Some(ActiveView::SingleAppointment)) => state
                .appointment
                .clone()
                .map_or(Visible::Nothing, Visible::Appointment),
            (false, Some(ActiveView::AllTreatments)) => state
                .treatments
                .clone()
                .map_or(Visible::Nothing, Visible::Treatments),
        };

        PanelView {
            active_view: state.active_view,
            appointment_id: state.appointment_id.clone(),
            loading: state.loading,
            error: state.error.clone(),
            visible,
        }
    }

    /// Show all appointments, fetching them the first time.
    pub async fn fetch_all(&self) {
        self.run(
            ActiveView::AllAppointments,
            FETCH_ALL_FALLBACK,
            |s| s.appointments.is_some(),
            || self.load_appointments(),
            |s, result| s.appointments = result.ok(),
        )
        .await;
    }

    /// Show one appointment by id. A blank id is rejected without a fetch.
    pub async fn fetch_one(&self, id: &str) {
        let id = id.trim().to_string();
        {
            let mut state = self.state.lock().await;
            state.appointment_id = id.clone();
            if id.is_empty() {
                state.error = Some(MISSING_ID_MESSAGE.to_string());
                return;
            }
        }

        let wanted = id.clone();
        self.run(
            ActiveView::SingleAppointment,
            FETCH_ONE_FALLBACK,
            move |s| s.appointment.as_ref().is_some_and(|a| a.id == wanted),
            || self.load_appointment(id.clone()),
            |s, result| s.appointment = result.ok(),
        )
        .await;
    }

    /// Show all treatments, fetching them the first time.
    pub async fn fetch_treatments(&self) {
        self.run(
            ActiveView::AllTreatments,
            FETCH_TREATMENTS_FALLBACK,
            |s| s.treatments.is_some(),
            || self.load_treatments(),
            |s, result| s.treatments = result.ok(),
        )
        .await;
    }

    /// Fetch the active view again, ignoring what is loaded.
    pub async fn refresh(&self) {
        let (active, id) = {
            let mut state = self.state.lock().await;
            if state.loading {
                return;
            }
            match state.active_view {
                Some(ActiveView::AllAppointments) => state.appointments = None,
                Some(ActiveView::SingleAppointment) => state.appointment = None,
                Some(ActiveView::AllTreatments) => state.treatments = None,
                None => return,
            }
            (state.active_view, state.appointment_id.clone())
        };

        match active {
            Some(ActiveView::AllAppointments) => self.fetch_all().await,
            Some(ActiveView::SingleAppointment) => self.fetch_one(&id).await,
            Some(ActiveView::AllTreatments) => self.fetch_treatments().await,
            None => {}
        }
    }

    pub fn open_create_form(&self) {
        self.nav.navigate(Route::AddAppointment);
    }

    pub async fn logout(&self) {
        match self.auth.logout().await {
            Ok(()) => {
                self.nav.navigate(Route::Login);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Logout failed");
                self.state.lock().await.error = Some(e.user_message("Failed to log out"));
            }
        }
    }

    /// Shared flow of the three fetches: switch view, reuse loaded data or
    /// fetch with the loading flag set, then apply unless the visit is over.
    async fn run<T, C, F, Fut, A>(
        &self,
        view: ActiveView,
        fallback: &str,
        cached: C,
        fetch: F,
        apply: A,
    ) where
        C: FnOnce(&PanelState) -> bool,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
        A: FnOnce(&mut PanelState, Result<T>),
    {
        let ticket = {
            let mut state = self.state.lock().await;
            if state.loading {
                tracing::debug!("Fetch ignored while another is in flight");
                return;
            }
            let Some(ticket) = state.mount.current_ticket(&self.nav) else {
                tracing::warn!(?view, "Panel event outside its visit");
                state.error = Some(EXPIRED_MESSAGE.to_string());
                return;
            };
            state.active_view = Some(view);
            state.error = None;
            if cached(&*state) {
                return;
            }
            state.loading = true;
            ticket
        };

        let result = fetch().await;

        let mut state = self.state.lock().await;
        if !state.mount.is_live(ticket, &self.nav) {
            tracing::debug!(?view, "Discarding result for a finished visit");
            return;
        }
        state.loading = false;
        if let Err(e) = &result {
            tracing::warn!(error = %e, ?view, "Panel fetch failed");
            state.error = Some(e.user_message(fallback));
        }
        apply(&mut *state, result);
    }

    async fn load_appointments(&self) -> Result<Vec<AppointmentSummary>> {
        let token = self.auth.access_token().await?;
        let rows = self.backend.list_appointments(&token).await?;
        Ok(rows.into_iter().map(AppointmentSummary::from).collect())
    }

    async fn load_appointment(&self, id: String) -> Result<AppointmentDetail> {
        let token = self.auth.access_token().await?;
        let mut rows = self.backend.find_appointment(&token, &id).await?;
        match rows.len() {
            1 => Ok(AppointmentDetail::from(rows.remove(0))),
            0 => Err(AppError::NotFound(format!(
                "No appointment found with ID {}",
                id
            ))),
            _ => Err(AppError::NotFound(format!(
                "More than one appointment matches ID {}",
                id
            ))),
        }
    }

    async fn load_treatments(&self) -> Result<Vec<Treatment>> {
        let token = self.auth.access_token().await?;
        let rows = self.backend.list_treatments(&token).await?;
        Ok(rows.into_iter().map(Treatment::from).collect())
    }
}
