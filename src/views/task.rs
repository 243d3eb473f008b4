// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! State of one asynchronous load.

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(feature = "binding-generation", ts(export, export_to = "bindings/"))]
pub enum Task<T> {
    #[default]
    Idle,
    Pending,
    Resolved(T),
    /// Display message of the failure
    Rejected(String),
}

impl<T> Task<T> {
    /// Settle from a result, turning errors into display messages.
    pub fn settle(result: Result<T>, fallback: &str) -> Self {
        match result {
            Ok(value) => Task::Resolved(value),
            Err(e) => Task::Rejected(e.user_message(fallback)),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Task::Pending)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Task::Resolved(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Task::Rejected(msg) => Some(msg),
            _ => None,
        }
    }
}
