// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP client for the hosted backend.
//!
//! Handles:
//! - Password sign-up, login, refresh and logout (`/auth/v1`)
//! - Table reads and inserts with foreign-key embedding (`/rest/v1`)
//! - Turning error bodies into [`AppError`] with the backend's own message

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{
    AppointmentDetailRow, AppointmentListRow, AuthUser, NewAppointment, PatientRef, Session,
    SignUpOutcome, StaffMember, TreatmentRow,
};
use crate::services::backend::{tables, Backend};

const LIST_SELECT: &str = "id,user_id(full_name),appointment_date,status";
const DETAIL_SELECT: &str = "*,user_id!inner(full_name),staff_id(role,specialty)";
const PATIENT_SELECT: &str = "patient:user_id(id,full_name,email)";

/// Lifetime assumed when the token response carries no expiry.
const DEFAULT_SESSION_SECS: i64 = 3600;

/// Which API an error came from; auth rejections map to [`AppError::Auth`].
#[derive(Clone, Copy)]
enum Api {
    Auth,
    Rest,
}

/// Backend client over HTTP.
#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    /// Create a client for the project at `base_url`.
    pub fn new(base_url: &str, anon_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        }
    }

    fn auth_request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let url = format!("{}/auth/v1/{}", self.base_url, path);
        self.with_keys(self.http.request(method, url), token)
    }

    fn rest_request(&self, method: Method, table: &str, token: &str) -> RequestBuilder {
        let url = format!("{}/rest/v1/{}", self.base_url, table);
        self.with_keys(self.http.request(method, url), Some(token))
    }

    fn with_keys(&self, request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(token.unwrap_or(&self.anon_key))
    }

    /// Generic table read with JSON response.
    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        token: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let response = self
            .rest_request(Method::GET, table, token)
            .query(query)
            .send()
            .await?;

        check_response_json(Api::Rest, response).await
    }

    async fn token_grant(&self, grant_type: &str, body: serde_json::Value) -> Result<Session> {
        let response = self
            .auth_request(Method::POST, "token", None)
            .query(&[("grant_type", grant_type)])
            .json(&body)
            .send()
            .await?;

        let token: TokenResponse = check_response_json(Api::Auth, response).await?;
        Ok(token.into_session())
    }
}

#[async_trait]
impl Backend for SupabaseClient {
    async fn sign_up(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> Result<SignUpOutcome> {
        let body = serde_json::json!({
            "email": email,
            "password": password,
            // Same key as the `profiles.full_name` column the joins read.
            "data": { "full_name": full_name },
        });

        let response = self
            .auth_request(Method::POST, "signup", None)
            .json(&body)
            .send()
            .await?;

        let value: serde_json::Value = check_response_json(Api::Auth, response).await?;
        let outcome = parse_sign_up(value)?;
        tracing::info!(
            user_id = %outcome.user.id,
            confirmed = outcome.session.is_some(),
            "Account created"
        );
        Ok(outcome)
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        self.token_grant(
            "password",
            serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session> {
        self.token_grant(
            "refresh_token",
            serde_json::json!({ "refresh_token": refresh_token }),
        )
        .await
    }

    async fn sign_out(&self, access_token: &str) -> Result<()> {
        let response = self
            .auth_request(Method::POST, "logout", Some(access_token))
            .send()
            .await?;

        check_response(Api::Auth, response).await?;
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser> {
        let response = self
            .auth_request(Method::GET, "user", Some(access_token))
            .send()
            .await?;

        let user: UserResponse = check_response_json(Api::Auth, response).await?;
        Ok(user.into())
    }

    async fn list_appointments(&self, access_token: &str) -> Result<Vec<AppointmentListRow>> {
        self.select(
            tables::APPOINTMENTS,
            access_token,
            &[("select", LIST_SELECT.to_string())],
        )
        .await
    }

    async fn find_appointment(
        &self,
        access_token: &str,
        id: &str,
    ) -> Result<Vec<AppointmentDetailRow>> {
        self.select(
            tables::APPOINTMENTS,
            access_token,
            &[
                ("select", DETAIL_SELECT.to_string()),
                ("id", format!("eq.{}", id)),
                ("limit", "2".to_string()),
            ],
        )
        .await
    }

    async fn list_treatments(&self, access_token: &str) -> Result<Vec<TreatmentRow>> {
        self.select(tables::TREATMENTS, access_token, &[("select", "*".to_string())])
            .await
    }

    async fn list_patient_refs(&self, access_token: &str) -> Result<Vec<PatientRef>> {
        #[derive(Deserialize)]
        struct Embedded {
            patient: Option<PatientRef>,
        }

        let rows: Vec<Embedded> = self
            .select(
                tables::APPOINTMENTS,
                access_token,
                &[("select", PATIENT_SELECT.to_string())],
            )
            .await?;
        Ok(rows.into_iter().filter_map(|row| row.patient).collect())
    }

    async fn list_staff(&self, access_token: &str) -> Result<Vec<StaffMember>> {
        self.select(
            tables::STAFF_PROFILES,
            access_token,
            &[("select", "*".to_string())],
        )
        .await
    }

    async fn insert_appointment(&self, access_token: &str, record: &NewAppointment) -> Result<()> {
        let response = self
            .rest_request(Method::POST, tables::APPOINTMENTS, access_token)
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await?;

        check_response(Api::Rest, response).await?;
        tracing::info!(patient = %record.user_id, date = %record.appointment_date, "Appointment inserted");
        Ok(())
    }
}

// ─── Wire formats ────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct UserMetadata {
    #[serde(default, alias = "fullName")]
    full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadata,
}

impl From<UserResponse> for AuthUser {
    fn from(user: UserResponse) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.user_metadata.full_name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: UserResponse,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
            .unwrap_or_else(|| {
                Utc::now() + Duration::seconds(self.expires_in.unwrap_or(DEFAULT_SESSION_SECS))
            });

        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user.into(),
        }
    }
}

/// Sign-up answers with a full token response when the account is confirmed
/// right away, and with the bare user (or `{ "user": … }`) otherwise.
fn parse_sign_up(value: serde_json::Value) -> Result<SignUpOutcome> {
    let malformed = |e: serde_json::Error| AppError::Backend(format!("JSON parse error: {}", e));

    if value.get("access_token").is_some() {
        let token: TokenResponse = serde_json::from_value(value).map_err(malformed)?;
        let session = token.into_session();
        return Ok(SignUpOutcome {
            user: session.user.clone(),
            session: Some(session),
        });
    }

    let user_value = match value.get("user") {
        Some(user) => user.clone(),
        None => value,
    };
    let user: UserResponse = serde_json::from_value(user_value).map_err(malformed)?;
    Ok(SignUpOutcome {
        user: user.into(),
        session: None,
    })
}

/// Pull the human-readable message out of an error body.
fn error_message(status: StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body).ok().and_then(|v| {
        ["msg", "message", "error_description", "error"]
            .iter()
            .find_map(|key| v.get(*key).and_then(|m| m.as_str()).map(str::to_string))
    });

    from_json
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("HTTP {}", status))
}

/// Check response status and return error if not successful.
async fn check_response(api: Api, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(status, &body);

    if status.as_u16() == 429 {
        tracing::warn!("Backend rate limit hit (429)");
    }

    match api {
        Api::Auth if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS => {
            Err(AppError::Auth(message))
        }
        Api::Rest if status == StatusCode::UNAUTHORIZED => Err(AppError::Auth(message)),
        _ => {
            tracing::debug!(status = %status, body = %body, "Backend request failed");
            Err(AppError::Backend(message))
        }
    }
}

/// Check response and parse JSON body.
async fn check_response_json<T: DeserializeOwned>(
    api: Api,
    response: reqwest::Response,
) -> Result<T> {
    check_response(api, response)
        .await?
        .json()
        .await
        .map_err(|e| AppError::Backend(format!("JSON parse error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_message_fields() {
        let status = StatusCode::BAD_REQUEST;
        assert_eq!(
            error_message(status, r#"{"code":400,"msg":"Invalid login credentials"}"#),
            "Invalid login credentials"
        );
        assert_eq!(
            error_message(status, r#"{"error":"invalid_grant","error_description":"Token expired"}"#),
            "Token expired"
        );
        assert_eq!(
            error_message(status, r#"{"code":"42P01","message":"relation does not exist"}"#),
            "relation does not exist"
        );
        assert_eq!(error_message(status, "<html>"), "HTTP 400 Bad Request");
    }

    #[test]
    fn test_parse_sign_up_confirmed() {
        let outcome = parse_sign_up(json!({
            "access_token": "a",
            "refresh_token": "r",
            "expires_in": 3600,
            "user": {
                "id": "u1",
                "email": "jane@example.com",
                "user_metadata": { "full_name": "Jane Smith" }
            }
        }))
        .unwrap();
        assert_eq!(outcome.user.full_name.as_deref(), Some("Jane Smith"));
        assert!(outcome.session.is_some());
    }

    #[test]
    fn test_parse_sign_up_unconfirmed() {
        let outcome = parse_sign_up(json!({
            "id": "u2",
            "email": "john@example.com",
            "user_metadata": { "fullName": "John Doe" }
        }))
        .unwrap();
        assert_eq!(outcome.user.id, "u2");
        assert_eq!(outcome.user.full_name.as_deref(), Some("John Doe"));
        assert!(outcome.session.is_none());
    }

    #[test]
    fn test_token_expiry_prefers_expires_at() {
        let token: TokenResponse = serde_json::from_value(json!({
            "access_token": "a",
            "refresh_token": "r",
            "expires_in": 3600,
            "expires_at": 1_900_000_000,
            "user": { "id": "u1" }
        }))
        .unwrap();
        assert_eq!(token.into_session().expires_at.timestamp(), 1_900_000_000);
    }
}
