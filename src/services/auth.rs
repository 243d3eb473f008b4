// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session/auth gateway.
//!
//! The only writer of a browser's [`SessionContext`]. Sessions close to
//! expiry are refreshed on read, under a lock so concurrent views do not
//! race on a rotating refresh token.

use chrono::{Duration, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use validator::ValidateEmail;

use crate::error::{AppError, Result};
use crate::models::{AuthUser, Session, SignUpOutcome};
use crate::services::backend::Backend;
use crate::services::session::SessionContext;

/// Refresh sessions that expire within this margin (1 minute).
const SESSION_REFRESH_MARGIN_SECS: i64 = 60;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Clone)]
pub struct AuthGateway {
    backend: Arc<dyn Backend>,
    session: SessionContext,
    refresh_lock: Arc<Mutex<()>>,
}

impl AuthGateway {
    pub fn new(backend: Arc<dyn Backend>, session: SessionContext) -> Self {
        Self {
            backend,
            session,
            refresh_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Create an account. Malformed email and weak passwords are rejected
    /// before the backend is contacted; duplicates are reported by it.
    pub async fn sign_up(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> Result<SignUpOutcome> {
        let email = email.trim();
        if !email.validate_email() {
            return Err(AppError::Auth(
                "Unable to validate email address: invalid format".to_string(),
            ));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Auth(format!(
                "Password should be at least {} characters.",
                MIN_PASSWORD_LEN
            )));
        }

        let outcome = self.backend.sign_up(full_name.trim(), email, password).await?;
        if let Some(session) = &outcome.session {
            self.session.replace(session.clone()).await;
        }
        tracing::info!(user_id = %outcome.user.id, "Sign-up completed");
        Ok(outcome)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let session = self
            .backend
            .sign_in_with_password(email.trim(), password)
            .await?;
        self.session.replace(session.clone()).await;
        tracing::info!(user_id = %session.user.id, "Login succeeded");
        Ok(session)
    }

    /// End the session. The local session is cleared even when the remote
    /// revoke fails.
    pub async fn logout(&self) -> Result<()> {
        let session = self
            .session
            .take()
            .await
            .ok_or_else(|| AppError::Auth("No active session".to_string()))?;

        if let Err(e) = self.backend.sign_out(&session.access_token).await {
            tracing::warn!(error = %e, user_id = %session.user.id, "Remote sign-out failed");
        }
        tracing::info!(user_id = %session.user.id, "Logged out");
        Ok(())
    }

    /// Current session, refreshed if it is about to expire.
    ///
    /// `Ok(None)` means "not signed in"; an error means the backend could not
    /// be reached to find out.
    pub async fn current_session(&self) -> Result<Option<Session>> {
        let margin = Duration::seconds(SESSION_REFRESH_MARGIN_SECS);

        match self.session.snapshot().await {
            None => return Ok(None),
            Some(session) if !session.expires_within(Utc::now(), margin) => {
                return Ok(Some(session))
            }
            Some(_) => {}
        }

        let _guard = self.refresh_lock.lock().await;

        // Another view may have refreshed while we waited.
        let session = match self.session.snapshot().await {
            None => return Ok(None),
            Some(session) if !session.expires_within(Utc::now(), margin) => {
                return Ok(Some(session))
            }
            Some(session) => session,
        };

        match self.backend.refresh_session(&session.refresh_token).await {
            Ok(refreshed) => {
                tracing::debug!(user_id = %refreshed.user.id, "Session refreshed");
                self.session.replace(refreshed.clone()).await;
                Ok(Some(refreshed))
            }
            Err(AppError::Auth(msg)) => {
                tracing::info!(reason = %msg, "Refresh rejected, clearing session");
                self.session.take().await;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// User of the current session, as the backend sees it now.
    pub async fn current_user(&self) -> Result<Option<AuthUser>> {
        let Some(session) = self.current_session().await? else {
            return Ok(None);
        };
        match self.backend.get_user(&session.access_token).await {
            Ok(user) => Ok(Some(user)),
            Err(AppError::Auth(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Access token for data calls.
    pub async fn access_token(&self) -> Result<String> {
        self.current_session()
            .await?
            .map(|s| s.access_token)
            .ok_or_else(|| AppError::Auth("You must be logged in".to_string()))
    }
}
