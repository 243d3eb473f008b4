// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login / signup page.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::config::ViewDelays;
use crate::error::AppError;
use crate::navigation::{Mount, Navigator, RedirectHint, Route};
use crate::services::AuthGateway;
use crate::views::{after_delay, Mounted, EXPIRED_MESSAGE};

pub const LOGIN_SUCCESS_MESSAGE: &str = "Login successful! Redirecting...";
pub const SIGNUP_SUCCESS_MESSAGE: &str = "Account created successfully! You can now log in.";
pub const PASSWORD_MISMATCH_MESSAGE: &str = "Passwords do not match.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(feature = "binding-generation", ts(export, export_to = "bindings/"))]
pub enum AuthTab {
    #[default]
    Login,
    Signup,
}

/// Signup form as submitted. Passwords are never echoed back.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupFields {
    #[serde(default, alias = "fullName")]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, alias = "confirmPassword")]
    pub confirm_password: String,
}

#[derive(Debug, Default)]
struct LoginState {
    mount: Mount,
    tab: AuthTab,
    login_email: String,
    signup_full_name: String,
    signup_email: String,
    loading: bool,
    error: Option<String>,
    success: Option<String>,
    redirect: Option<RedirectHint>,
}

impl Mounted for LoginState {
    fn mount(&self) -> &Mount {
        &self.mount
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(feature = "binding-generation", ts(export, export_to = "bindings/"))]
pub struct LoginView {
    pub tab: AuthTab,
    pub login_email: String,
    pub signup_full_name: String,
    pub signup_email: String,
    pub loading: bool,
    pub error: Option<String>,
    pub success: Option<String>,
    pub redirect: Option<RedirectHint>,
}

pub struct LoginPage {
    auth: AuthGateway,
    nav: Navigator,
    delays: ViewDelays,
    state: Arc<Mutex<LoginState>>,
}

impl LoginPage {
    pub fn new(auth: AuthGateway, nav: Navigator, delays: ViewDelays) -> Self {
        Self {
            auth,
            nav,
            delays,
            state: Arc::new(Mutex::new(LoginState::default())),
        }
    }

    pub async fn mount(&self) {
        let mut state = self.state.lock().await;
        *state = LoginState::default();
        state.mount.mount(self.nav.location());
    }

    /// Whether this page is mounted in the browser's current visit.
    pub async fn is_current(&self) -> bool {
        self.state.lock().await.mount.is_current(&self.nav)
    }

    pub async fn view(&self) -> LoginView {
        let state = self.state.lock().await;
        LoginView {
            tab: state.tab,
            login_email: state.login_email.clone(),
            signup_full_name: state.signup_full_name.clone(),
            signup_email: state.signup_email.clone(),
            loading: state.loading,
            error: state.error.clone(),
            success: state.success.clone(),
            redirect: state.redirect,
        }
    }

    pub async fn switch_tab(&self, tab: AuthTab) {
        let mut state = self.state.lock().await;
        if state.loading {
            return;
        }
        state.tab = tab;
        state.error = None;
        state.success = None;
    }

    pub async fn submit_login(&self, email: &str, password: &str) {
        let ticket = {
            let mut state = self.state.lock().await;
            if state.loading {
                return;
            }
            let Some(ticket) = state.mount.current_ticket(&self.nav) else {
                tracing::warn!("Login page event outside its visit");
                state.error = Some(EXPIRED_MESSAGE.to_string());
                return;
            };
            state.tab = AuthTab::Login;
            state.login_email = email.trim().to_string();
            state.loading = true;
            state.error = None;
            state.success = None;
            ticket
        };

        let result = self.auth.login(email, password).await;

        let mut state = self.state.lock().await;
        if !state.mount.is_live(ticket, &self.nav) {
            return;
        }
        state.loading = false;
        match result {
            Ok(_) => {
                state.success = Some(LOGIN_SUCCESS_MESSAGE.to_string());
                let delay = self.delays.login_redirect;
                state.redirect = Some(RedirectHint {
                    to: Route::Appointments.path(),
                    after_ms: delay.as_millis() as u64,
                });
                after_delay(
                    self.state.clone(),
                    self.nav.clone(),
                    ticket,
                    delay,
                    |s: &mut LoginState| {
                        s.success = None;
                        s.redirect = None;
                    },
                    |nav| {
                        nav.navigate(Route::Appointments);
                    },
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "Login failed");
                state.error = Some(e.user_message("Login failed"));
            }
        }
    }

    pub async fn submit_signup(&self, fields: SignupFields) {
        let ticket = {
            let mut state = self.state.lock().await;
            if state.loading {
                return;
            }
            let Some(ticket) = state.mount.current_ticket(&self.nav) else {
                tracing::warn!("Login page event outside its visit");
                state.error = Some(EXPIRED_MESSAGE.to_string());
                return;
            };
            state.tab = AuthTab::Signup;
            state.signup_full_name = fields.full_name.trim().to_string();
            state.signup_email = fields.email.trim().to_string();
            state.error = None;
            state.success = None;

            if fields.password != fields.confirm_password {
                let err = AppError::Auth(PASSWORD_MISMATCH_MESSAGE.to_string());
                tracing::debug!(error = %err, "Sign-up rejected locally");
                state.error = Some(err.to_string());
                return;
            }
            state.loading = true;
            ticket
        };

        let result = self
            .auth
            .sign_up(&fields.full_name, &fields.email, &fields.password)
            .await;

        let mut state = self.state.lock().await;
        if !state.mount.is_live(ticket, &self.nav) {
            return;
        }
        state.loading = false;
        match result {
            Ok(_) => {
                state.success = Some(SIGNUP_SUCCESS_MESSAGE.to_string());
                let delay = self.delays.signup_reset;
                state.redirect = Some(RedirectHint {
                    to: self.nav.location().route.path(),
                    after_ms: delay.as_millis() as u64,
                });
                after_delay(
                    self.state.clone(),
                    self.nav.clone(),
                    ticket,
                    delay,
                    |s: &mut LoginState| {
                        s.success = None;
                        s.redirect = None;
                        s.tab = AuthTab::Login;
                        s.signup_full_name.clear();
                        s.signup_email.clear();
                    },
                    |_| {},
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "Sign-up failed");
                state.error = Some(e.user_message("Sign-up failed"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory::{ops, MemoryBackend};
    use crate::services::{Backend, SessionContext};
    use std::time::Duration;

    fn page() -> (Arc<MemoryBackend>, Navigator, LoginPage) {
        let backend = Arc::new(MemoryBackend::new());
        let auth = AuthGateway::new(backend.clone(), SessionContext::new());
        let nav = Navigator::new(Route::Root);
        let page = LoginPage::new(auth, nav.clone(), ViewDelays::default());
        (backend, nav, page)
    }

    fn signup(password: &str, confirm: &str) -> SignupFields {
        SignupFields {
            full_name: "Jane Smith".to_string(),
            email: "jane@example.com".to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
        }
    }

    #[tokio::test]
    async fn test_password_mismatch_skips_backend() {
        let (backend, nav, page) = page();
        nav.navigate(Route::Login);
        page.mount().await;

        page.submit_signup(signup("hunter22", "hunter23")).await;

        let view = page.view().await;
        assert_eq!(view.error.as_deref(), Some(PASSWORD_MISMATCH_MESSAGE));
        assert_eq!(view.tab, AuthTab::Signup);
        assert_eq!(backend.calls(ops::SIGN_UP), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_redirects_after_delay() {
        let (backend, nav, page) = page();
        backend
            .sign_up("Jane Smith", "jane@example.com", "hunter22")
            .await
            .unwrap();
        nav.navigate(Route::Login);
        page.mount().await;

        page.submit_login("jane@example.com", "hunter22").await;
        let view = page.view().await;
        assert_eq!(view.success.as_deref(), Some(LOGIN_SUCCESS_MESSAGE));
        assert_eq!(view.redirect.map(|r| r.to), Some("/appointments"));
        assert_eq!(nav.location().route, Route::Login);

        tokio::time::sleep(Duration::from_millis(1600)).await;
        assert_eq!(nav.location().route, Route::Appointments);
    }

    #[tokio::test(start_paused = true)]
    async fn test_signup_returns_to_login_tab() {
        let (_, nav, page) = page();
        nav.navigate(Route::Root);
        page.mount().await;

        page.submit_signup(signup("hunter22", "hunter22")).await;
        let view = page.view().await;
        assert_eq!(view.success.as_deref(), Some(SIGNUP_SUCCESS_MESSAGE));
        assert_eq!(view.signup_email, "jane@example.com");

        tokio::time::sleep(Duration::from_millis(2100)).await;
        let view = page.view().await;
        assert_eq!(view.tab, AuthTab::Login);
        assert_eq!(view.success, None);
        assert!(view.signup_email.is_empty());
        assert_eq!(nav.location().route, Route::Root);
    }

    #[tokio::test]
    async fn test_bad_credentials_show_backend_message() {
        let (_, nav, page) = page();
        nav.navigate(Route::Login);
        page.mount().await;

        page.submit_login("nobody@example.com", "whatever").await;
        let view = page.view().await;
        assert_eq!(view.error.as_deref(), Some("Invalid login credentials"));
        assert!(!view.loading);
        assert_eq!(view.redirect, None);
    }
}
