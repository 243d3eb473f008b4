//! User, session and reference-list models.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::de_id;

/// Authenticated account as reported by the auth service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(feature = "binding-generation", ts(export, export_to = "bindings/"))]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
}

/// Server-issued session. Opaque apart from expiry.
#[derive(Clone, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: AuthUser,
}

impl Session {
    /// True when the session expires within `margin` of `now`.
    pub fn expires_within(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        now + margin >= self.expires_at
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

/// Result of a sign-up. `session` is present only when the backend confirms
/// the account immediately.
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    pub user: AuthUser,
    pub session: Option<Session>,
}

/// Patient reference as embedded in an appointment row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRef {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Entry of the patient selector.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(feature = "binding-generation", ts(export, export_to = "bindings/"))]
pub struct Patient {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
}

impl Patient {
    pub fn label(&self) -> String {
        match &self.email {
            Some(email) => format!("{} ({})", self.name, email),
            None => self.name.clone(),
        }
    }
}

impl From<PatientRef> for Patient {
    fn from(r: PatientRef) -> Self {
        Self {
            id: r.id,
            name: r.full_name.unwrap_or_else(|| "Unknown".to_string()),
            email: r.email,
        }
    }
}

/// Row of the `staff_profiles` directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(feature = "binding-generation", ts(export, export_to = "bindings/"))]
pub struct StaffMember {
    #[serde(deserialize_with = "de_id")]
    pub user_id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub specialty: Option<String>,
}

impl StaffMember {
    pub fn label(&self) -> String {
        let name = self.full_name.as_deref().unwrap_or(&self.user_id);
        if self.role.is_empty() {
            name.to_string()
        } else {
            format!("{} - {}", name, self.role)
        }
    }
}
