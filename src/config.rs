// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup. Missing or malformed values are a
//! hard error so the server never starts against an undefined backend.

use std::env;
use std::time::Duration;

/// Minimum length of the cookie signing key in bytes.
const MIN_SIGNING_KEY_LEN: usize = 32;

/// What the Cancel button on the creation form does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelBehavior {
    /// Clear the draft and stay on the form.
    Reset,
    /// Leave the form for the appointments list.
    Navigate,
}

impl std::str::FromStr for CancelBehavior {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reset" => Ok(CancelBehavior::Reset),
            "navigate" => Ok(CancelBehavior::Navigate),
            other => Err(ConfigError::Invalid(
                "CANCEL_BEHAVIOR",
                format!("expected 'reset' or 'navigate', got '{}'", other),
            )),
        }
    }
}

/// Delays used by the views before they navigate on their own.
#[derive(Debug, Clone, Copy)]
pub struct ViewDelays {
    /// Login success → appointments list
    pub login_redirect: Duration,
    /// Signup success → back to the login tab
    pub signup_reset: Duration,
    /// Appointment created → appointments list
    pub create_redirect: Duration,
}

impl Default for ViewDelays {
    fn default() -> Self {
        Self {
            login_redirect: Duration::from_millis(1500),
            signup_reset: Duration::from_millis(2000),
            create_redirect: Duration::from_millis(3000),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the hosted backend project
    pub supabase_url: String,
    /// Public (anon) API key sent with every backend request
    pub supabase_anon_key: String,
    /// HMAC key for the browser client cookie (raw bytes)
    pub cookie_signing_key: Vec<u8>,
    /// Server port
    pub port: u16,
    pub cancel_behavior: CancelBehavior,
    pub delays: ViewDelays,
    /// Client states untouched for this long are evicted
    pub client_idle_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let supabase_url = required("SUPABASE_URL")?;
        if !(supabase_url.starts_with("http://") || supabase_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(
                "SUPABASE_URL",
                "must start with http:// or https://".to_string(),
            ));
        }

        let cookie_signing_key = required("COOKIE_SIGNING_KEY")?.into_bytes();
        if cookie_signing_key.len() < MIN_SIGNING_KEY_LEN {
            return Err(ConfigError::Invalid(
                "COOKIE_SIGNING_KEY",
                format!("must be at least {} bytes", MIN_SIGNING_KEY_LEN),
            ));
        }

        let idle_secs: u64 = parsed("CLIENT_IDLE_TIMEOUT_SECS", 1800)?;
        if idle_secs == 0 {
            return Err(ConfigError::Invalid(
                "CLIENT_IDLE_TIMEOUT_SECS",
                "must be greater than zero".to_string(),
            ));
        }

        let defaults = ViewDelays::default();

        Ok(Self {
            supabase_url: supabase_url.trim_end_matches('/').to_string(),
            supabase_anon_key: required("SUPABASE_ANON_KEY")?,
            cookie_signing_key,
            port: parsed("PORT", 8080)?,
            cancel_behavior: match env::var("CANCEL_BEHAVIOR") {
                Ok(v) if !v.trim().is_empty() => v.parse()?,
                _ => CancelBehavior::Reset,
            },
            delays: ViewDelays {
                login_redirect: millis("LOGIN_REDIRECT_DELAY_MS", defaults.login_redirect)?,
                signup_reset: millis("SIGNUP_RESET_DELAY_MS", defaults.signup_reset)?,
                create_redirect: millis("CREATE_REDIRECT_DELAY_MS", defaults.create_redirect)?,
            },
            client_idle_timeout: Duration::from_secs(idle_secs),
        })
    }

    /// Fixed configuration for tests.
    pub fn test_default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test_anon_key".to_string(),
            cookie_signing_key: b"test_cookie_key_32_bytes_minimum!".to_vec(),
            port: 8080,
            cancel_behavior: CancelBehavior::Reset,
            delays: ViewDelays::default(),
            client_idle_timeout: Duration::from_secs(1800),
        }
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn parsed<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, format!("cannot parse '{}'", v))),
        _ => Ok(default),
    }
}

fn millis(name: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    parsed(name, default.as_millis() as u64).map(Duration::from_millis)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
