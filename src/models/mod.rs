// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod appointment;
pub mod treatment;
pub mod user;

pub use appointment::{
    compose_date_time, AppointmentDetail, AppointmentDetailRow, AppointmentDraft,
    AppointmentListRow, AppointmentStatus, AppointmentSummary, NewAppointment,
};
pub use treatment::{format_cost, Treatment, TreatmentRow};
pub use user::{AuthUser, Patient, PatientRef, Session, SignUpOutcome, StaffMember};

use serde::{Deserialize, Deserializer};

/// Row ids come back as strings (uuid) or numbers (bigint) depending on the
/// table; both are carried as text.
pub(crate) fn de_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Int(n) => n.to_string(),
        RawId::Float(n) => n.to_string(),
    })
}

/// Render a JSON scalar the way a template literal would.
pub(crate) fn display_scalar(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => f.to_string(),
            _ => n.to_string(),
        },
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
