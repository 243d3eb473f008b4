// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Appointment creation form.
//!
//! On mount the patient and staff selectors load concurrently; each list is
//! its own [`Task`] so one failing does not block the other.

use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::config::CancelBehavior;
use crate::error::Result;
use crate::models::{AppointmentDraft, Patient, StaffMember};
use crate::navigation::{Mount, Navigator, RedirectHint, Route};
use crate::services::{AuthGateway, Backend};
use crate::views::{after_delay, Mounted, Task, EXPIRED_MESSAGE};

pub const CREATE_SUCCESS_MESSAGE: &str = "Appointment created successfully!";
pub const CREATE_FALLBACK: &str = "Failed to create appointment";
pub const PATIENTS_FALLBACK: &str = "Failed to load patients";
pub const STAFF_FALLBACK: &str = "Failed to load staff";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(feature = "binding-generation", ts(export, export_to = "bindings/"))]
pub enum FormPhase {
    #[default]
    Idle,
    Validating,
    Submitting,
}

#[derive(Debug, Default)]
struct FormState {
    mount: Mount,
    phase: FormPhase,
    draft: AppointmentDraft,
    patients: Task<Vec<Patient>>,
    staff: Task<Vec<StaffMember>>,
    welcome_email: Option<String>,
    error: Option<String>,
    success: Option<String>,
    redirect: Option<RedirectHint>,
}

impl Mounted for FormState {
    fn mount(&self) -> &Mount {
        &self.mount
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(feature = "binding-generation", ts(export, export_to = "bindings/"))]
pub struct FormView {
    pub phase: FormPhase,
    pub draft: AppointmentDraft,
    pub patients: Task<Vec<Patient>>,
    pub staff: Task<Vec<StaffMember>>,
    pub welcome_email: Option<String>,
    pub error: Option<String>,
    pub success: Option<String>,
    pub redirect: Option<RedirectHint>,
}

pub struct CreateAppointmentForm {
    backend: Arc<dyn Backend>,
    auth: AuthGateway,
    nav: Navigator,
    cancel_behavior: CancelBehavior,
    redirect_delay: Duration,
    state: Arc<Mutex<FormState>>,
}

impl CreateAppointmentForm {
    pub fn new(
        backend: Arc<dyn Backend>,
        auth: AuthGateway,
        nav: Navigator,
        cancel_behavior: CancelBehavior,
        redirect_delay: Duration,
    ) -> Self {
        Self {
            backend,
            auth,
            nav,
            cancel_behavior,
            redirect_delay,
            state: Arc::new(Mutex::new(FormState::default())),
        }
    }

    /// Reset the form and load both reference lists and the welcome banner.
    pub async fn mount(&self) {
        let ticket = {
            let mut state = self.state.lock().await;
            *state = FormState::default();
            state.mount.mount(self.nav.location());
            state.patients = Task::Pending;
            state.staff = Task::Pending;
            match state.mount.ticket() {
                Some(ticket) => ticket,
                None => return,
            }
        };

        let patients = async {
            let result = self.load_patients().await;
            let mut state = self.state.lock().await;
            if state.mount.is_live(ticket, &self.nav) {
                if let Err(e) = &result {
                    tracing::warn!(error = %e, "Loading patients failed");
                }
                state.patients = Task::settle(result, PATIENTS_FALLBACK);
            }
        };

        let staff = async {
            let result = self.load_staff().await;
            let mut state = self.state.lock().await;
            if state.mount.is_live(ticket, &self.nav) {
                if let Err(e) = &result {
                    tracing::warn!(error = %e, "Loading staff failed");
                }
                state.staff = Task::settle(result, STAFF_FALLBACK);
            }
        };

        let welcome = async {
            let email = match self.auth.current_user().await {
                Ok(user) => user.and_then(|u| u.email),
                Err(e) => {
                    tracing::debug!(error = %e, "No user for the welcome banner");
                    None
                }
            };
            let mut state = self.state.lock().await;
            if state.mount.is_live(ticket, &self.nav) {
                state.welcome_email = email;
            }
        };

        futures_util::join!(patients, staff, welcome);
    }

    pub async fn is_current(&self) -> bool {
        self.state.lock().await.mount.is_current(&self.nav)
    }

    pub async fn view(&self) -> FormView {
        let state = self.state.lock().await;
        FormView {
            phase: state.phase,
            draft: state.draft.clone(),
            patients: state.patients.clone(),
            staff: state.staff.clone(),
            welcome_email: state.welcome_email.clone(),
            error: state.error.clone(),
            success: state.success.clone(),
            redirect: state.redirect,
        }
    }

    /// Validate and insert `draft`. A submit while one is in flight is
    /// ignored.
    pub async fn submit(&self, draft: AppointmentDraft) {
        let ticket = {
            let mut state = self.state.lock().await;
            if state.phase == FormPhase::Submitting {
                tracing::debug!("Submit ignored while submitting");
                return;
            }
            let Some(ticket) = state.mount.current_ticket(&self.nav) else {
                tracing::warn!("Form submitted outside its visit");
                state.error = Some(EXPIRED_MESSAGE.to_string());
                return;
            };
            state.phase = FormPhase::Validating;
            state.draft = draft.clone();
            state.error = None;
            state.success = None;

            if let Err(e) = draft.validate() {
                state.error = Some(e.user_message(CREATE_FALLBACK));
                state.phase = FormPhase::Idle;
                return;
            }
            state.phase = FormPhase::Submitting;
            ticket
        };

        let result = self.insert(&draft).await;

        let mut state = self.state.lock().await;
        if !state.mount.is_live(ticket, &self.nav) {
            return;
        }
        state.phase = FormPhase::Idle;
        match result {
            Ok(()) => {
                tracing::info!(appointment_date = %draft.appointment_date, "Appointment created");
                state.draft = AppointmentDraft::default();
                state.success = Some(CREATE_SUCCESS_MESSAGE.to_string());
                state.redirect = Some(RedirectHint {
                    to: Route::Appointments.path(),
                    after_ms: self.redirect_delay.as_millis() as u64,
                });
                after_delay(
                    self.state.clone(),
                    self.nav.clone(),
                    ticket,
                    self.redirect_delay,
                    |s: &mut FormState| {
                        s.success = None;
                        s.redirect = None;
                    },
                    |nav| {
                        nav.navigate(Route::Appointments);
                    },
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "Creating appointment failed");
                state.error = Some(e.user_message(CREATE_FALLBACK));
            }
        }
    }

    pub async fn cancel(&self) {
        match self.cancel_behavior {
            CancelBehavior::Reset => {
                let mut state = self.state.lock().await;
                if state.phase == FormPhase::Submitting {
                    return;
                }
                state.draft = AppointmentDraft::default();
                state.error = None;
                state.success = None;
            }
            CancelBehavior::Navigate => {
                self.nav.navigate(Route::Appointments);
            }
        }
    }

    async fn insert(&self, draft: &AppointmentDraft) -> Result<()> {
        let token = self.auth.access_token().await?;
        self.backend
            .insert_appointment(&token, &draft.to_record())
            .await
    }

    /// Distinct patients referenced by existing appointments, first-seen order.
    async fn load_patients(&self) -> Result<Vec<Patient>> {
        let token = self.auth.access_token().await?;
        let refs = self.backend.list_patient_refs(&token).await?;
        let mut seen = HashSet::new();
        Ok(refs
            .into_iter()
            .filter(|r| seen.insert(r.id.clone()))
            .map(Patient::from)
            .collect())
    }

    async fn load_staff(&self) -> Result<Vec<StaffMember>> {
        let token = self.auth.access_token().await?;
        self.backend.list_staff(&token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::{AppointmentStatus, NewAppointment};
    use crate::services::memory::{ops, MemoryBackend};
    use crate::services::SessionContext;

    struct Fixture {
        backend: Arc<MemoryBackend>,
        nav: Navigator,
        form: CreateAppointmentForm,
        patient_id: String,
    }

    async fn fixture(cancel: CancelBehavior) -> Fixture {
        let backend = Arc::new(MemoryBackend::new());
        let auth = AuthGateway::new(backend.clone(), SessionContext::new());
        auth.sign_up("Front Desk", "desk@example.com", "hunter22")
            .await
            .unwrap();

        backend
            .add_profile("p1", "John Doe", "john@example.com")
            .await;
        for date in ["2025-05-01T09:00:00", "2025-05-02T09:00:00"] {
            backend
                .add_appointment(NewAppointment {
                    user_id: "p1".to_string(),
                    staff_id: None,
                    appointment_date: date.to_string(),
                    status: AppointmentStatus::Completed,
                    virtual_link: None,
                    notes: None,
                })
                .await;
        }
        backend
            .add_staff(StaffMember {
                user_id: "s1".to_string(),
                full_name: Some("Dr. Robert Johnson".to_string()),
                role: "Dentist".to_string(),
                specialty: Some("Orthodontics".to_string()),
            })
            .await;

        let nav = Navigator::new(Route::Root);
        let form = CreateAppointmentForm::new(
            backend.clone(),
            auth,
            nav.clone(),
            cancel,
            Duration::from_millis(3000),
        );
        nav.navigate(Route::AddAppointment);
        form.mount().await;
        Fixture {
            backend,
            nav,
            form,
            patient_id: "p1".to_string(),
        }
    }

    fn complete_draft(patient_id: &str) -> AppointmentDraft {
        AppointmentDraft {
            user_id: patient_id.to_string(),
            staff_id: "s1".to_string(),
            appointment_date: "2025-06-01".to_string(),
            appointment_time: "14:30".to_string(),
            status: AppointmentStatus::Confirmed,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_mount_loads_deduplicated_lists() {
        let f = fixture(CancelBehavior::Reset).await;
        let view = f.form.view().await;

        let patients = view.patients.value().unwrap();
        assert_eq!(patients.len(), 1);
        assert_eq!(patients[0].label(), "John Doe (john@example.com)");
        assert_eq!(view.staff.value().unwrap()[0].label(), "Dr. Robert Johnson - Dentist");
        assert_eq!(view.welcome_email.as_deref(), Some("desk@example.com"));
    }

    #[tokio::test]
    async fn test_one_list_failing_does_not_block_the_other() {
        let f = fixture(CancelBehavior::Reset).await;
        f.backend.fail(ops::LIST_STAFF, "");
        f.nav.navigate(Route::AddAppointment);
        f.form.mount().await;

        let view = f.form.view().await;
        assert!(view.patients.value().is_some());
        assert_eq!(view.staff.error(), Some(STAFF_FALLBACK));
    }

    #[tokio::test]
    async fn test_missing_fields_never_reach_backend() {
        let f = fixture(CancelBehavior::Reset).await;
        let mut draft = complete_draft(&f.patient_id);
        draft.appointment_time.clear();

        f.form.submit(draft.clone()).await;

        let view = f.form.view().await;
        assert_eq!(
            view.error.as_deref(),
            Some(crate::models::appointment::REQUIRED_FIELDS_MESSAGE)
        );
        assert_eq!(view.draft, draft, "form contents are kept");
        assert_eq!(view.phase, FormPhase::Idle);
        assert_eq!(f.backend.calls(ops::INSERT_APPOINTMENT), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_submit_resets_and_redirects() {
        let f = fixture(CancelBehavior::Reset).await;
        f.form.submit(complete_draft(&f.patient_id)).await;

        let view = f.form.view().await;
        assert_eq!(view.success.as_deref(), Some(CREATE_SUCCESS_MESSAGE));
        assert_eq!(view.draft, AppointmentDraft::default());
        let stored = f.backend.appointments().await;
        assert_eq!(stored.last().unwrap().appointment_date, "2025-06-01T14:30:00");

        tokio::time::sleep(Duration::from_millis(2900)).await;
        assert_eq!(f.nav.location().route, Route::AddAppointment);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(f.nav.location().route, Route::Appointments);
        assert_eq!(f.form.view().await.success, None);
    }

    #[tokio::test]
    async fn test_backend_failure_keeps_draft() {
        let f = fixture(CancelBehavior::Reset).await;
        let draft = AppointmentDraft {
            staff_id: "unknown-staff".to_string(),
            ..complete_draft(&f.patient_id)
        };
        f.form.submit(draft.clone()).await;

        let view = f.form.view().await;
        assert!(view.error.unwrap().contains("foreign key"));
        assert_eq!(view.draft, draft);
        assert_eq!(view.phase, FormPhase::Idle);
    }

    #[tokio::test]
    async fn test_cancel_behaviors() {
        let f = fixture(CancelBehavior::Reset).await;
        f.form.submit(AppointmentDraft::default()).await;
        f.form.cancel().await;
        let view = f.form.view().await;
        assert_eq!(view.error, None);
        assert_eq!(f.nav.location().route, Route::AddAppointment);

        let f = fixture(CancelBehavior::Navigate).await;
        f.form.cancel().await;
        assert_eq!(f.nav.location().route, Route::Appointments);
    }

    #[test]
    fn test_validation_error_is_not_a_backend_error() {
        let err = AppointmentDraft::default().validate().unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
