// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory backend for tests and offline development.
//!
//! Mirrors the hosted backend's observable behavior: auth rules and messages,
//! foreign-key joins, inner-join filtering on the detail query. Call counts,
//! injected failures and artificial latency let tests observe and steer it.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::appointment::{PatientName, StaffRef};
use crate::models::{
    AppointmentDetailRow, AppointmentListRow, AuthUser, NewAppointment, PatientRef, Session,
    SignUpOutcome, StaffMember, TreatmentRow,
};
use crate::services::backend::{tables, Backend};

/// Operation names used for call counts, failures and latency.
pub mod ops {
    pub const SIGN_UP: &str = "sign_up";
    pub const SIGN_IN: &str = "sign_in";
    pub const REFRESH: &str = "refresh";
    pub const SIGN_OUT: &str = "sign_out";
    pub const GET_USER: &str = "get_user";
    pub const LIST_APPOINTMENTS: &str = "list_appointments";
    pub const FIND_APPOINTMENT: &str = "find_appointment";
    pub const LIST_TREATMENTS: &str = "list_treatments";
    pub const LIST_PATIENT_REFS: &str = "list_patient_refs";
    pub const LIST_STAFF: &str = "list_staff";
    pub const INSERT_APPOINTMENT: &str = "insert_appointment";
}

const MIN_PASSWORD_LEN: usize = 6;

struct Account {
    id: String,
    password: String,
}

#[derive(Clone)]
struct Profile {
    full_name: Option<String>,
    email: Option<String>,
}

#[derive(Default)]
struct Store {
    accounts: HashMap<String, Account>,
    profiles: HashMap<String, Profile>,
    /// access token → (user id, refresh token)
    sessions: HashMap<String, (String, String)>,
    /// refresh token → user id
    refresh_tokens: HashMap<String, String>,
    appointments: Vec<(String, NewAppointment)>,
    treatments: Vec<TreatmentRow>,
    staff: Vec<StaffMember>,
}

/// In-memory [`Backend`].
pub struct MemoryBackend {
    store: Mutex<Store>,
    calls: DashMap<&'static str, usize>,
    failures: DashMap<&'static str, String>,
    latency: DashMap<&'static str, Duration>,
    unavailable: AtomicBool,
    next_id: AtomicU64,
    session_ttl: Mutex<ChronoDuration>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            store: Mutex::new(Store::default()),
            calls: DashMap::new(),
            failures: DashMap::new(),
            latency: DashMap::new(),
            unavailable: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
            session_ttl: Mutex::new(ChronoDuration::hours(1)),
        }
    }

    // ─── Seeding ─────────────────────────────────────────────

    /// Add a profile without an account (e.g. imported patients).
    pub async fn add_profile(&self, id: &str, full_name: &str, email: &str) {
        self.store.lock().await.profiles.insert(
            id.to_string(),
            Profile {
                full_name: Some(full_name.to_string()),
                email: Some(email.to_string()),
            },
        );
    }

    pub async fn add_staff(&self, member: StaffMember) {
        self.store.lock().await.staff.push(member);
    }

    pub async fn add_treatment(&self, treatment: TreatmentRow) {
        self.store.lock().await.treatments.push(treatment);
    }

    /// Store an appointment directly and return its id.
    pub async fn add_appointment(&self, record: NewAppointment) -> String {
        let id = self.next_id().to_string();
        self.store.lock().await.appointments.push((id.clone(), record));
        id
    }

    /// All stored appointment records, in insertion order.
    pub async fn appointments(&self) -> Vec<NewAppointment> {
        self.store
            .lock()
            .await
            .appointments
            .iter()
            .map(|(_, record)| record.clone())
            .collect()
    }

    // ─── Steering ────────────────────────────────────────────

    /// Number of times `op` was called.
    pub fn calls(&self, op: &str) -> usize {
        self.calls.get(op).map(|c| *c).unwrap_or(0)
    }

    /// Make every call to `op` fail with a backend error carrying `message`.
    pub fn fail(&self, op: &'static str, message: &str) {
        self.failures.insert(op, message.to_string());
    }

    pub fn clear_failure(&self, op: &str) {
        self.failures.remove(op);
    }

    /// Make every call fail as if the service were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Delay every call to `op` by `delay` (tokio time).
    pub fn set_latency(&self, op: &'static str, delay: Duration) {
        self.latency.insert(op, delay);
    }

    /// Lifetime of sessions issued from now on.
    pub async fn set_session_ttl(&self, ttl: ChronoDuration) {
        *self.session_ttl.lock().await = ttl;
    }

    // ─── Internals ───────────────────────────────────────────

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    async fn enter(&self, op: &'static str) -> Result<()> {
        *self.calls.entry(op).or_insert(0) += 1;

        let delay = self.latency.get(op).map(|d| *d);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Backend(
                "error sending request: connection refused".to_string(),
            ));
        }
        if let Some(message) = self.failures.get(op) {
            return Err(AppError::Backend(message.clone()));
        }
        Ok(())
    }

    async fn issue_session(&self, store: &mut Store, user_id: &str) -> Session {
        let n = self.next_id();
        let access_token = format!("mem-access-{}", n);
        let refresh_token = format!("mem-refresh-{}", n);
        store
            .sessions
            .insert(access_token.clone(), (user_id.to_string(), refresh_token.clone()));
        store
            .refresh_tokens
            .insert(refresh_token.clone(), user_id.to_string());

        let ttl = *self.session_ttl.lock().await;
        Session {
            access_token,
            refresh_token,
            expires_at: Utc::now() + ttl,
            user: user_of(store, user_id),
        }
    }

    async fn authorize(&self, access_token: &str) -> Result<()> {
        if self.store.lock().await.sessions.contains_key(access_token) {
            Ok(())
        } else {
            Err(AppError::Auth("invalid JWT".to_string()))
        }
    }
}

fn user_of(store: &Store, user_id: &str) -> AuthUser {
    let profile = store.profiles.get(user_id);
    AuthUser {
        id: user_id.to_string(),
        email: profile.and_then(|p| p.email.clone()),
        full_name: profile.and_then(|p| p.full_name.clone()),
    }
}

fn patient_name(store: &Store, user_id: &str) -> Option<PatientName> {
    store.profiles.get(user_id).map(|p| PatientName {
        full_name: p.full_name.clone(),
    })
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn sign_up(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> Result<SignUpOutcome> {
        self.enter(ops::SIGN_UP).await?;

        if password.len() < MIN_PASSWORD_LEN {
            return Err(AppError::Auth(format!(
                "Password should be at least {} characters.",
                MIN_PASSWORD_LEN
            )));
        }

        let mut store = self.store.lock().await;
        let key = email.to_ascii_lowercase();
        if store.accounts.contains_key(&key) {
            return Err(AppError::Auth("User already registered".to_string()));
        }

        let id = format!("user-{}", self.next_id());
        store.accounts.insert(
            key,
            Account {
                id: id.clone(),
                password: password.to_string(),
            },
        );
        store.profiles.insert(
            id.clone(),
            Profile {
                full_name: Some(full_name.to_string()),
                email: Some(email.to_string()),
            },
        );

        let session = self.issue_session(&mut store, &id).await;
        Ok(SignUpOutcome {
            user: session.user.clone(),
            session: Some(session),
        })
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        self.enter(ops::SIGN_IN).await?;

        let mut store = self.store.lock().await;
        let user_id = match store.accounts.get(&email.to_ascii_lowercase()) {
            Some(account) if account.password == password => account.id.clone(),
            _ => return Err(AppError::Auth("Invalid login credentials".to_string())),
        };
        Ok(self.issue_session(&mut store, &user_id).await)
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session> {
        self.enter(ops::REFRESH).await?;

        let mut store = self.store.lock().await;
        let user_id = store
            .refresh_tokens
            .remove(refresh_token)
            .ok_or_else(|| AppError::Auth("Invalid Refresh Token: Refresh Token Not Found".to_string()))?;
        store.sessions.retain(|_, (_, r)| r.as_str() != refresh_token);
        Ok(self.issue_session(&mut store, &user_id).await)
    }

    async fn sign_out(&self, access_token: &str) -> Result<()> {
        self.enter(ops::SIGN_OUT).await?;

        let mut store = self.store.lock().await;
        match store.sessions.remove(access_token) {
            Some((_, refresh)) => {
                store.refresh_tokens.remove(&refresh);
                Ok(())
            }
            None => Err(AppError::Auth("invalid JWT".to_string())),
        }
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser> {
        self.enter(ops::GET_USER).await?;

        let store = self.store.lock().await;
        let (user_id, _) = store
            .sessions
            .get(access_token)
            .ok_or_else(|| AppError::Auth("invalid JWT".to_string()))?;
        Ok(user_of(&store, user_id))
    }

    async fn list_appointments(&self, access_token: &str) -> Result<Vec<AppointmentListRow>> {
        self.enter(ops::LIST_APPOINTMENTS).await?;
        self.authorize(access_token).await?;

        let store = self.store.lock().await;
        Ok(store
            .appointments
            .iter()
            .map(|(id, record)| AppointmentListRow {
                id: id.clone(),
                patient: patient_name(&store, &record.user_id),
                appointment_date: record.appointment_date.clone(),
                status: record.status,
            })
            .collect())
    }

    async fn find_appointment(
        &self,
        access_token: &str,
        id: &str,
    ) -> Result<Vec<AppointmentDetailRow>> {
        self.enter(ops::FIND_APPOINTMENT).await?;
        self.authorize(access_token).await?;

        let store = self.store.lock().await;
        Ok(store
            .appointments
            .iter()
            .filter(|(row_id, _)| row_id == id)
            .filter_map(|(row_id, record)| {
                // Inner join on the patient profile.
                let patient = patient_name(&store, &record.user_id)?;
                let staff = record.staff_id.as_ref().and_then(|staff_id| {
                    store
                        .staff
                        .iter()
                        .find(|s| &s.user_id == staff_id)
                        .map(|s| StaffRef {
                            role: Some(s.role.clone()),
                            specialty: s.specialty.clone(),
                        })
                });
                Some(AppointmentDetailRow {
                    id: row_id.clone(),
                    patient: Some(patient),
                    staff,
                    appointment_date: record.appointment_date.clone(),
                    status: record.status,
                    virtual_link: record.virtual_link.clone(),
                    notes: record.notes.clone(),
                })
            })
            .take(2)
            .collect())
    }

    async fn list_treatments(&self, access_token: &str) -> Result<Vec<TreatmentRow>> {
        self.enter(ops::LIST_TREATMENTS).await?;
        self.authorize(access_token).await?;
        Ok(self.store.lock().await.treatments.clone())
    }

    async fn list_patient_refs(&self, access_token: &str) -> Result<Vec<PatientRef>> {
        self.enter(ops::LIST_PATIENT_REFS).await?;
        self.authorize(access_token).await?;

        let store = self.store.lock().await;
        Ok(store
            .appointments
            .iter()
            .filter_map(|(_, record)| {
                store.profiles.get(&record.user_id).map(|p| PatientRef {
                    id: record.user_id.clone(),
                    full_name: p.full_name.clone(),
                    email: p.email.clone(),
                })
            })
            .collect())
    }

    async fn list_staff(&self, access_token: &str) -> Result<Vec<StaffMember>> {
        self.enter(ops::LIST_STAFF).await?;
        self.authorize(access_token).await?;
        Ok(self.store.lock().await.staff.clone())
    }

    async fn insert_appointment(&self, access_token: &str, record: &NewAppointment) -> Result<()> {
        self.enter(ops::INSERT_APPOINTMENT).await?;
        self.authorize(access_token).await?;

        let id = self.next_id().to_string();
        let mut store = self.store.lock().await;
        if !store.profiles.contains_key(&record.user_id) {
            return Err(AppError::Backend(format!(
                "insert or update on table \"{}\" violates foreign key constraint \"{}_user_id_fkey\"",
                tables::APPOINTMENTS,
                tables::APPOINTMENTS
            )));
        }
        if let Some(staff_id) = &record.staff_id {
            let known: HashSet<&str> = store.staff.iter().map(|s| s.user_id.as_str()).collect();
            if !known.contains(staff_id.as_str()) {
                return Err(AppError::Backend(format!(
                    "insert or update on table \"{}\" violates foreign key constraint \"{}_staff_id_fkey\"",
                    tables::APPOINTMENTS,
                    tables::STAFF_PROFILES
                )));
            }
        }
        store.appointments.push((id, record.clone()));
        Ok(())
    }
}
