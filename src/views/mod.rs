// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! View models - per-browser state behind each page.
//!
//! Views recover their own errors and expose a serializable snapshot that the
//! route handlers render.

pub mod create_form;
pub mod login;
pub mod panel;
pub mod task;

pub use create_form::{CreateAppointmentForm, FormPhase, FormView};
pub use login::{AuthTab, LoginPage, LoginView, SignupFields};
pub use panel::{ActiveView, AppointmentPanel, PanelView, Visible};
pub use task::Task;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::navigation::{Mount, Navigator, Ticket};

/// Shown when an event reaches a view that belongs to an earlier visit.
pub const EXPIRED_MESSAGE: &str = "This page has expired. Please reload it.";

/// Anything holding the [`Mount`] of a view.
pub(crate) trait Mounted {
    fn mount(&self) -> &Mount;
}

/// After `delay`, run `finish` on the view state and then navigate with
/// `then`, unless the visit that scheduled it is over. Any navigation in the
/// meantime cancels it.
pub(crate) fn after_delay<S, F, N>(
    state: Arc<Mutex<S>>,
    nav: Navigator,
    ticket: Ticket,
    delay: Duration,
    finish: F,
    then: N,
) where
    S: Mounted + Send + 'static,
    F: FnOnce(&mut S) + Send + 'static,
    N: FnOnce(&Navigator) + Send + 'static,
{
    let mut moves = nav.subscribe();
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = moves.changed() => {
                tracing::debug!("Delayed action cancelled by navigation");
                return;
            }
        }
        let mut guard = state.lock().await;
        if !guard.mount().is_live(ticket, &nav) {
            tracing::debug!("Delayed action dropped for a finished visit");
            return;
        }
        finish(&mut *guard);
        drop(guard);
        then(&nav);
    });
}
