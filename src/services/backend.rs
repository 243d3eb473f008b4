// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! The remote backend seam.
//!
//! Every call the views make to the hosted backend goes through [`Backend`].
//! Data calls take the caller's access token so row-level policies apply.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    AppointmentDetailRow, AppointmentListRow, AuthUser, NewAppointment, PatientRef, Session,
    SignUpOutcome, StaffMember, TreatmentRow,
};

/// Table names as constants.
pub mod tables {
    pub const APPOINTMENTS: &str = "appointments";
    pub const TREATMENTS: &str = "treatments";
    pub const STAFF_PROFILES: &str = "staff_profiles";
}

/// Auth and table operations of the hosted backend.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Register an account. The full name goes into the user metadata.
    async fn sign_up(&self, full_name: &str, email: &str, password: &str)
        -> Result<SignUpOutcome>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session>;

    /// Exchange a refresh token for a new session.
    async fn refresh_session(&self, refresh_token: &str) -> Result<Session>;

    /// Revoke the session behind `access_token`.
    async fn sign_out(&self, access_token: &str) -> Result<()>;

    async fn get_user(&self, access_token: &str) -> Result<AuthUser>;

    /// All appointments joined with the patient's display name.
    async fn list_appointments(&self, access_token: &str) -> Result<Vec<AppointmentListRow>>;

    /// Appointments with the given id, joined with patient name and staff
    /// role/specialty. At most two rows are returned so callers can tell
    /// "exactly one" from "ambiguous".
    async fn find_appointment(&self, access_token: &str, id: &str)
        -> Result<Vec<AppointmentDetailRow>>;

    async fn list_treatments(&self, access_token: &str) -> Result<Vec<TreatmentRow>>;

    /// Patient reference of every appointment, duplicates included.
    async fn list_patient_refs(&self, access_token: &str) -> Result<Vec<PatientRef>>;

    async fn list_staff(&self, access_token: &str) -> Result<Vec<StaffMember>>;

    async fn insert_appointment(&self, access_token: &str, record: &NewAppointment) -> Result<()>;
}
