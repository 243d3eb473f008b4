// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-browser session context.
//!
//! Every view of one browser shares a `SessionContext`. Reads are open to
//! all of them; writes are crate-private and only [`AuthGateway`] performs
//! them.
//!
//! [`AuthGateway`]: crate::services::auth::AuthGateway

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::Session;

#[derive(Clone, Default)]
pub struct SessionContext {
    inner: Arc<RwLock<Option<Session>>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the stored session, without validity checks.
    pub async fn snapshot(&self) -> Option<Session> {
        self.inner.read().await.clone()
    }

    pub async fn is_present(&self) -> bool {
        self.inner.read().await.is_some()
    }

    pub(crate) async fn replace(&self, session: Session) {
        *self.inner.write().await = Some(session);
    }

    pub(crate) async fn take(&self) -> Option<Session> {
        self.inner.write().await.take()
    }
}
