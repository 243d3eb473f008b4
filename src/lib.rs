// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Clinic Desk: front desk web client for booking medical appointments
//!
//! Server-rendered pages for signing in, browsing appointments and
//! treatments, and creating appointments against a hosted Supabase backend.

pub mod client;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod navigation;
pub mod routes;
pub mod services;
pub mod time_utils;
pub mod views;

use client::ClientRegistry;
use config::Config;
use services::Backend;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub backend: Arc<dyn Backend>,
    pub clients: ClientRegistry,
}

impl AppState {
    pub fn new(config: Config, backend: Arc<dyn Backend>) -> Self {
        Self {
            config,
            backend,
            clients: ClientRegistry::new(),
        }
    }
}
