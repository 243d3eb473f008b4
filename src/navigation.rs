// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client-side routes and navigation.
//!
//! Each mount of a route is a numbered *visit*. Views stamp their async work
//! with a [`Ticket`] for the visit they were mounted in and drop results whose
//! visit is no longer current.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// The four client-visible paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(feature = "binding-generation", ts(export, export_to = "bindings/"))]
pub enum Route {
    Root,
    Login,
    Appointments,
    AddAppointment,
}

/// Components the routes render. `/` and `/login` share one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    LoginSignup,
    AppointmentPanel,
    CreateAppointment,
}

impl Route {
    pub const ALL: [Route; 4] = [
        Route::Root,
        Route::Login,
        Route::Appointments,
        Route::AddAppointment,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Route::Root => "/",
            Route::Login => "/login",
            Route::Appointments => "/appointments",
            Route::AddAppointment => "/add-appointment",
        }
    }

    /// Exact match only: no nested or parametrized segments.
    pub fn from_path(path: &str) -> Option<Route> {
        Route::ALL.into_iter().find(|r| r.path() == path)
    }

    pub fn view(self) -> View {
        match self {
            Route::Root | Route::Login => View::LoginSignup,
            Route::Appointments => View::AppointmentPanel,
            Route::AddAppointment => View::CreateAppointment,
        }
    }

    /// Whether the route guard requires a session.
    pub fn is_protected(self) -> bool {
        !matches!(self.view(), View::LoginSignup)
    }
}

/// Where a browser currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub route: Route,
    pub visit: u64,
}

/// Proof that an operation started during a given visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Per-view record of the visit it is mounted in.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mount {
    visit: Option<u64>,
}

impl Mount {
    pub fn mount(&mut self, location: Location) {
        self.visit = Some(location.visit);
    }

    pub fn ticket(&self) -> Option<Ticket> {
        self.visit.map(Ticket)
    }

    /// Ticket for the browser's current visit, or `None` if this view was
    /// mounted in an earlier one (or never).
    pub fn current_ticket(&self, nav: &Navigator) -> Option<Ticket> {
        self.visit
            .filter(|visit| *visit == nav.location().visit)
            .map(Ticket)
    }

    pub fn is_current(&self, nav: &Navigator) -> bool {
        self.current_ticket(nav).is_some()
    }

    /// True if `ticket` belongs to this mount and the browser has not moved on.
    pub fn is_live(&self, ticket: Ticket, nav: &Navigator) -> bool {
        self.visit == Some(ticket.0) && nav.location().visit == ticket.0
    }
}

/// A navigation the page should follow on its own after a delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(feature = "binding-generation", ts(export, export_to = "bindings/"))]
pub struct RedirectHint {
    pub to: &'static str,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub after_ms: u64,
}

/// Current location of one browser.
#[derive(Clone)]
pub struct Navigator {
    tx: Arc<watch::Sender<Location>>,
}

impl Navigator {
    pub fn new(route: Route) -> Self {
        let (tx, _) = watch::channel(Location { route, visit: 0 });
        Self { tx: Arc::new(tx) }
    }

    pub fn location(&self) -> Location {
        *self.tx.borrow()
    }

    /// Move to `route`, starting a new visit even if it is the same route.
    pub fn navigate(&self, route: Route) -> Location {
        self.tx.send_modify(|loc| {
            loc.route = route;
            loc.visit += 1;
        });
        let location = self.location();
        tracing::debug!(path = route.path(), visit = location.visit, "Navigated");
        location
    }

    /// Watch for navigations. The current location counts as seen.
    pub fn subscribe(&self) -> watch::Receiver<Location> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_table() {
        assert_eq!(Route::from_path("/"), Some(Route::Root));
        assert_eq!(Route::from_path("/login"), Some(Route::Login));
        assert_eq!(Route::from_path("/appointments"), Some(Route::Appointments));
        assert_eq!(Route::from_path("/add-appointment"), Some(Route::AddAppointment));
        assert_eq!(Route::from_path("/appointments/7"), None);
        assert_eq!(Route::Root.view(), Route::Login.view());
        assert!(!Route::Login.is_protected());
        assert!(Route::AddAppointment.is_protected());
    }

    #[test]
    fn test_ticket_goes_stale_on_navigation() {
        let nav = Navigator::new(Route::Root);
        let mut mount = Mount::default();
        mount.mount(nav.navigate(Route::Appointments));
        let ticket = mount.ticket().unwrap();
        assert!(mount.is_live(ticket, &nav));

        nav.navigate(Route::AddAppointment);
        assert!(!mount.is_live(ticket, &nav));
    }

    #[test]
    fn test_remount_same_route_invalidates_old_ticket() {
        let nav = Navigator::new(Route::Root);
        let mut mount = Mount::default();
        mount.mount(nav.navigate(Route::Appointments));
        let old = mount.ticket().unwrap();
        mount.mount(nav.navigate(Route::Appointments));
        assert!(!mount.is_live(old, &nav));
        assert!(mount.is_live(mount.ticket().unwrap(), &nav));
    }

    #[test]
    fn test_mount_from_earlier_visit_is_not_current() {
        let nav = Navigator::new(Route::Root);
        let mut mount = Mount::default();
        assert!(!mount.is_current(&nav));

        mount.mount(nav.location());
        assert!(mount.is_current(&nav));

        // Navigating without remounting leaves the view behind.
        nav.navigate(Route::Appointments);
        assert!(!mount.is_current(&nav));
        assert_eq!(mount.current_ticket(&nav), None);
        assert!(mount.ticket().is_some());
    }

    #[tokio::test]
    async fn test_subscriber_sees_navigation() {
        let nav = Navigator::new(Route::Root);
        let mut moves = nav.subscribe();
        assert!(!moves.has_changed().unwrap());

        nav.navigate(Route::Login);
        moves.changed().await.unwrap();
        assert_eq!(moves.borrow_and_update().route, Route::Login);
    }
}
