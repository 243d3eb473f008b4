// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Appointment model: backend rows, display shapes, and the form draft.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::ValidateUrl;

use crate::error::{AppError, Result};
use crate::models::de_id;
use crate::time_utils::{date_only, is_form_date, is_form_time, time_of_day};

/// Shown when any of patient, date or time is missing.
pub const REQUIRED_FIELDS_MESSAGE: &str = "Please fill in all required fields";

/// Lifecycle status of an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(feature = "binding-generation", ts(export, export_to = "bindings/"))]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Confirmed,
    Cancelled,
    Completed,
    NoShow,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 5] = [
        AppointmentStatus::Scheduled,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::Completed,
        AppointmentStatus::NoShow,
    ];

    /// Wire spelling, as stored by the backend.
    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::NoShow => "no-show",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "Scheduled",
            AppointmentStatus::Confirmed => "Confirmed",
            AppointmentStatus::Cancelled => "Cancelled",
            AppointmentStatus::Completed => "Completed",
            AppointmentStatus::NoShow => "No Show",
        }
    }
}

impl std::str::FromStr for AppointmentStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        AppointmentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| AppError::Validation(format!("Unknown appointment status: {}", s)))
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Backend rows ────────────────────────────────────────────

/// Joined `profiles` columns embedded under the `user_id` key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientName {
    pub full_name: Option<String>,
}

/// Joined `staff_profiles` columns embedded under the `staff_id` key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaffRef {
    pub role: Option<String>,
    pub specialty: Option<String>,
}

/// Row of the all-appointments query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentListRow {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(rename = "user_id", default)]
    pub patient: Option<PatientName>,
    pub appointment_date: String,
    pub status: AppointmentStatus,
}

/// Row of the single-appointment query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentDetailRow {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(rename = "user_id", default)]
    pub patient: Option<PatientName>,
    #[serde(rename = "staff_id", default)]
    pub staff: Option<StaffRef>,
    pub appointment_date: String,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub virtual_link: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Record inserted by the creation form. Empty optionals are sent as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAppointment {
    pub user_id: String,
    pub staff_id: Option<String>,
    pub appointment_date: String,
    pub status: AppointmentStatus,
    pub virtual_link: Option<String>,
    pub notes: Option<String>,
}

// ─── Display shapes ──────────────────────────────────────────

/// One line of the appointments table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(feature = "binding-generation", ts(export, export_to = "bindings/"))]
pub struct AppointmentSummary {
    pub id: String,
    pub patient_name: String,
    /// Date only, `YYYY-MM-DD` (UTC)
    pub date: String,
    pub status: AppointmentStatus,
}

impl From<AppointmentListRow> for AppointmentSummary {
    fn from(row: AppointmentListRow) -> Self {
        Self {
            id: row.id,
            patient_name: row
                .patient
                .and_then(|p| p.full_name)
                .unwrap_or_else(|| "Unknown".to_string()),
            date: date_only(&row.appointment_date),
            status: row.status,
        }
    }
}

/// Detail card for one appointment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(feature = "binding-generation", ts(export, export_to = "bindings/"))]
pub struct AppointmentDetail {
    pub id: String,
    pub patient_name: String,
    pub date: String,
    pub time: Option<String>,
    pub status: AppointmentStatus,
    /// "role (specialty)" of the linked staff member
    pub doctor: Option<String>,
    pub virtual_link: Option<String>,
    pub notes: Option<String>,
    /// Fields the backend does not record yet; shown as "Not yet available".
    pub unrecorded: Vec<String>,
}

/// Labels for detail fields with no backend column.
pub const UNRECORDED_DETAIL_FIELDS: [&str; 2] = ["Duration", "Room"];

impl From<AppointmentDetailRow> for AppointmentDetail {
    fn from(row: AppointmentDetailRow) -> Self {
        let doctor = row.staff.and_then(|staff| match (staff.role, staff.specialty) {
            (Some(role), Some(specialty)) => Some(format!("{} ({})", role, specialty)),
            (Some(role), None) => Some(role),
            (None, Some(specialty)) => Some(specialty),
            (None, None) => None,
        });

        Self {
            id: row.id,
            patient_name: row
                .patient
                .and_then(|p| p.full_name)
                .unwrap_or_else(|| "Unknown".to_string()),
            date: date_only(&row.appointment_date),
            time: time_of_day(&row.appointment_date),
            status: row.status,
            doctor,
            virtual_link: row.virtual_link,
            notes: row.notes,
            unrecorded: UNRECORDED_DETAIL_FIELDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

// ─── Form draft ──────────────────────────────────────────────

/// In-memory state of the creation form, mirroring an appointment minus id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(feature = "binding-generation", ts(export, export_to = "bindings/"))]
pub struct AppointmentDraft {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub staff_id: String,
    #[serde(default)]
    pub appointment_date: String,
    #[serde(default)]
    pub appointment_time: String,
    #[serde(default)]
    pub status: AppointmentStatus,
    #[serde(default)]
    pub virtual_link: String,
    #[serde(default)]
    pub notes: String,
}

impl AppointmentDraft {
    /// Check the draft before anything is sent.
    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty()
            || self.appointment_date.trim().is_empty()
            || self.appointment_time.trim().is_empty()
        {
            return Err(AppError::Validation(REQUIRED_FIELDS_MESSAGE.to_string()));
        }
        if !is_form_date(self.appointment_date.trim()) {
            return Err(AppError::Validation(
                "Please enter a valid date (YYYY-MM-DD)".to_string(),
            ));
        }
        if !is_form_time(self.appointment_time.trim()) {
            return Err(AppError::Validation(
                "Please enter a valid time (HH:MM)".to_string(),
            ));
        }
        let link = self.virtual_link.trim();
        if !link.is_empty() && !(is_web_link(link) && link.validate_url()) {
            return Err(AppError::Validation(
                "Virtual meeting link must be a valid URL".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the insert record. Call [`validate`](Self::validate) first.
    pub fn to_record(&self) -> NewAppointment {
        NewAppointment {
            user_id: self.user_id.trim().to_string(),
            staff_id: non_empty(&self.staff_id),
            appointment_date: compose_date_time(
                self.appointment_date.trim(),
                self.appointment_time.trim(),
            ),
            status: self.status,
            virtual_link: non_empty(&self.virtual_link),
            notes: non_empty(&self.notes),
        }
    }
}

/// `date` + `T` + `time` + `:00`, no timezone normalization.
pub fn compose_date_time(date: &str, time: &str) -> String {
    format!("{}T{}:00", date, time)
}

/// Only http(s) links are rendered as meeting links.
fn is_web_link(link: &str) -> bool {
    let scheme = link.split_once("://").map(|(scheme, _)| scheme);
    matches!(scheme, Some(s) if s.eq_ignore_ascii_case("http") || s.eq_ignore_ascii_case("https"))
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_draft() -> AppointmentDraft {
        AppointmentDraft {
            user_id: "85ea84f6-6707-417e-b50e-4c7566e688fb".to_string(),
            appointment_date: "2025-06-01".to_string(),
            appointment_time: "14:30".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_compose_date_time() {
        assert_eq!(compose_date_time("2025-06-01", "14:30"), "2025-06-01T14:30:00");
    }

    #[test]
    fn test_status_wire_spelling() {
        assert_eq!(
            serde_json::to_value(AppointmentStatus::NoShow).unwrap(),
            json!("no-show")
        );
        let status: AppointmentStatus = serde_json::from_value(json!("confirmed")).unwrap();
        assert_eq!(status, AppointmentStatus::Confirmed);
        assert!(serde_json::from_value::<AppointmentStatus>(json!("pending")).is_err());
        assert_eq!("no-show".parse::<AppointmentStatus>().unwrap(), AppointmentStatus::NoShow);
    }

    #[test]
    fn test_required_fields() {
        for blank in ["user_id", "appointment_date", "appointment_time"] {
            let mut draft = valid_draft();
            match blank {
                "user_id" => draft.user_id.clear(),
                "appointment_date" => draft.appointment_date.clear(),
                _ => draft.appointment_time = "  ".to_string(),
            }
            match draft.validate() {
                Err(AppError::Validation(msg)) => assert_eq!(msg, REQUIRED_FIELDS_MESSAGE),
                other => panic!("expected validation error for {}, got {:?}", blank, other),
            }
        }
    }

    #[test]
    fn test_malformed_link_rejected() {
        let mut draft = valid_draft();
        draft.virtual_link = "not a url".to_string();
        assert!(matches!(draft.validate(), Err(AppError::Validation(_))));
        for link in ["javascript:alert(1)", "JavaScript:alert(1)", "data:text/html,hi", "ftp://files.example.com/"] {
            draft.virtual_link = link.to_string();
            assert!(
                matches!(draft.validate(), Err(AppError::Validation(_))),
                "{} accepted",
                link
            );
        }
        draft.virtual_link = "HTTP://meet.example.com/room".to_string();
        assert!(draft.validate().is_ok());
        draft.virtual_link = "https://meet.example.com/room-id".to_string();
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_unpadded_date_rejected() {
        let mut draft = valid_draft();
        draft.appointment_date = "2025-6-1".to_string();
        match draft.validate() {
            Err(AppError::Validation(msg)) => assert!(msg.contains("YYYY-MM-DD")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_record_maps_empty_optionals_to_null() {
        let record = valid_draft().to_record();
        assert_eq!(record.appointment_date, "2025-06-01T14:30:00");
        assert_eq!(record.status, AppointmentStatus::Scheduled);

        let body = serde_json::to_value(&record).unwrap();
        assert_eq!(body["staff_id"], serde_json::Value::Null);
        assert_eq!(body["virtual_link"], serde_json::Value::Null);
        assert_eq!(body["notes"], serde_json::Value::Null);
    }

    #[test]
    fn test_summary_from_row() {
        let row: AppointmentListRow = serde_json::from_value(json!({
            "id": 7,
            "user_id": null,
            "appointment_date": "2025-06-01T14:30:00+00:00",
            "status": "scheduled"
        }))
        .unwrap();
        let summary = AppointmentSummary::from(row);
        assert_eq!(summary.id, "7");
        assert_eq!(summary.patient_name, "Unknown");
        assert_eq!(summary.date, "2025-06-01");
    }

    #[test]
    fn test_detail_from_row() {
        let row: AppointmentDetailRow = serde_json::from_value(json!({
            "id": "apt-1",
            "user_id": { "full_name": "Jane Smith" },
            "staff_id": { "role": "Dentist", "specialty": "Orthodontics" },
            "appointment_date": "2025-06-01T14:30:00",
            "status": "confirmed",
            "notes": "Bring x-rays"
        }))
        .unwrap();
        let detail = AppointmentDetail::from(row);
        assert_eq!(detail.patient_name, "Jane Smith");
        assert_eq!(detail.date, "2025-06-01");
        assert_eq!(detail.time.as_deref(), Some("14:30"));
        assert_eq!(detail.doctor.as_deref(), Some("Dentist (Orthodontics)"));
        assert_eq!(detail.virtual_link, None);
        assert_eq!(detail.unrecorded, vec!["Duration", "Room"]);
    }
}
