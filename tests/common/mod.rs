// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
    Router,
};
use clinic_desk::config::Config;
use clinic_desk::models::{AppointmentStatus, NewAppointment, StaffMember, TreatmentRow};
use clinic_desk::routes::create_router;
use clinic_desk::services::MemoryBackend;
use clinic_desk::AppState;
use std::sync::Arc;
use tower::ServiceExt;

/// Create a test app backed by the in-memory backend.
/// Returns the router, the shared state and the backend.
#[allow(dead_code)]
pub fn create_test_app() -> (Router, Arc<AppState>, Arc<MemoryBackend>) {
    create_test_app_with_config(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (Router, Arc<AppState>, Arc<MemoryBackend>) {
    let backend = Arc::new(MemoryBackend::new());
    let state = Arc::new(AppState::new(config, backend.clone()));
    (create_router(state.clone()), state, backend)
}

/// Seed a patient with one past appointment, a staff member and a treatment.
#[allow(dead_code)]
pub async fn seed(backend: &MemoryBackend) -> String {
    backend
        .add_profile("p1", "John Doe", "john@example.com")
        .await;
    backend
        .add_staff(StaffMember {
            user_id: "s1".to_string(),
            full_name: Some("Dr. Robert Johnson".to_string()),
            role: "Dentist".to_string(),
            specialty: Some("Orthodontics".to_string()),
        })
        .await;
    backend
        .add_treatment(TreatmentRow {
            id: "t1".to_string(),
            name: "Cleaning".to_string(),
            duration: Some(serde_json::json!(30)),
            cost: Some(serde_json::json!(50)),
            description: Some("Routine cleaning".to_string()),
        })
        .await;
    backend
        .add_appointment(NewAppointment {
            user_id: "p1".to_string(),
            staff_id: Some("s1".to_string()),
            appointment_date: "2025-05-01T09:00:00".to_string(),
            status: AppointmentStatus::Completed,
            virtual_link: None,
            notes: Some("Bring x-rays".to_string()),
        })
        .await
}

/// One browser: remembers its client cookie between requests.
#[allow(dead_code)]
pub struct Browser {
    app: Router,
    cookie: Option<String>,
    json: bool,
}

#[allow(dead_code)]
impl Browser {
    /// Browser asking for JSON snapshots.
    pub fn json(app: &Router) -> Self {
        Self {
            app: app.clone(),
            cookie: None,
            json: true,
        }
    }

    /// Browser asking for HTML pages.
    pub fn html(app: &Router) -> Self {
        Self {
            app: app.clone(),
            cookie: None,
            json: false,
        }
    }

    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    /// Replace the stored cookie header value.
    pub fn set_cookie(&mut self, cookie: &str) {
        self.cookie = Some(cookie.to_string());
    }

    /// Client id carried in the cookie.
    pub fn client_id(&self) -> Option<String> {
        let (_, value) = self.cookie.as_ref()?.split_once('=')?;
        value.split_once('.').map(|(id, _)| id.to_string())
    }

    /// Second handle on the same browser, e.g. for a concurrent request.
    pub fn same_client(&self) -> Self {
        Self {
            app: self.app.clone(),
            cookie: self.cookie.clone(),
            json: self.json,
        }
    }

    pub async fn get(&mut self, path: &str) -> Response {
        let request = self.builder("GET", path).body(Body::empty()).unwrap();
        self.send(request).await
    }

    /// POST a form. `fields` are url-encoded here.
    pub async fn post(&mut self, path: &str, fields: &[(&str, &str)]) -> Response {
        let body = fields
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let request = self
            .builder("POST", path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    fn builder(&self, method: &str, path: &str) -> axum::http::request::Builder {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header(header::HOST, "localhost:8080");
        if self.json {
            builder = builder.header(header::ACCEPT, "application/json");
        }
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder
    }

    async fn send(&mut self, request: Request<Body>) -> Response {
        let response = self.app.clone().oneshot(request).await.unwrap();
        if let Some(set_cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
        {
            // Keep only "name=value".
            let pair = set_cookie.split(';').next().unwrap_or_default();
            self.cookie = Some(pair.to_string());
        }
        response
    }

    /// Sign up through the login page, which also signs this browser in.
    pub async fn sign_in_new_account(&mut self, email: &str) {
        self.get("/login").await;
        self.post(
            "/login",
            &[
                ("action", "signup"),
                ("full_name", "Front Desk"),
                ("email", email),
                ("password", "hunter22"),
                ("confirm_password", "hunter22"),
            ],
        )
        .await;
    }
}

#[allow(dead_code)]
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[allow(dead_code)]
pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[allow(dead_code)]
pub fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}
