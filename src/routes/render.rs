// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Page rendering.
//!
//! Every view answers in HTML by default, or with its JSON snapshot when the
//! request asks for `application/json`.

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt::Write as _;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::{AppointmentDetail, AppointmentStatus, AppointmentSummary, Treatment};
use crate::navigation::{RedirectHint, Route};
use crate::views::{
    ActiveView, AuthTab, FormPhase, FormView, LoginView, PanelView, Task, Visible,
};

const NOT_YET_AVAILABLE: &str = "Not yet available";

const STYLE: &str = "body{font-family:sans-serif;max-width:56rem;margin:2rem auto;padding:0 1rem}\
.error{color:#b00020}.success{color:#1b5e20}\
table{border-collapse:collapse;width:100%}td,th{border:1px solid #ccc;padding:.4rem;text-align:left}\
label{display:block;margin:.5rem 0}";

/// JSON body of a page.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(feature = "binding-generation", ts(export, export_to = "bindings/"))]
pub struct PageEnvelope<T> {
    pub path: String,
    pub view: T,
}

/// Whether the client prefers a JSON snapshot over HTML.
pub fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|h| h.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json"))
}

fn respond<T: Serialize>(
    headers: &HeaderMap,
    status: StatusCode,
    route: Route,
    view: T,
    html: impl FnOnce(&T) -> String,
) -> Response {
    if wants_json(headers) {
        let body = PageEnvelope {
            path: route.path().to_string(),
            view,
        };
        (status, Json(body)).into_response()
    } else {
        (status, Html(html(&view))).into_response()
    }
}

pub fn login(headers: &HeaderMap, route: Route, view: LoginView) -> Response {
    respond(headers, StatusCode::OK, route, view, |v| {
        login_html(route, v)
    })
}

pub fn panel(headers: &HeaderMap, view: PanelView) -> Response {
    respond(headers, StatusCode::OK, Route::Appointments, view, panel_html)
}

pub fn create_form(headers: &HeaderMap, view: FormView) -> Response {
    respond(
        headers,
        StatusCode::OK,
        Route::AddAppointment,
        view,
        form_html,
    )
}

#[derive(Serialize)]
struct UnavailableView<'a> {
    error: &'a str,
}

/// 503 page shown when the session check could not reach the backend.
pub fn unavailable(headers: &HeaderMap, route: Route, message: &str) -> Response {
    respond(
        headers,
        StatusCode::SERVICE_UNAVAILABLE,
        route,
        UnavailableView { error: message },
        |v| {
            let body = format!(
                "<h1>Service unavailable</h1><p class=\"error\">{}</p>\
                 <p><a href=\"{}\">Retry</a></p>",
                escape(v.error),
                route.path()
            );
            page("Service unavailable", &body, None)
        },
    )
}

pub fn not_found_html() -> String {
    page(
        "Not found",
        "<h1>Page not found</h1><p><a href=\"/\">Back to login</a></p>",
        None,
    )
}

/// Minimal HTML escaping for text and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn page(title: &str, body: &str, redirect: Option<RedirectHint>) -> String {
    // Refresh no earlier than the server-side delay.
    let refresh = redirect
        .map(|r| {
            format!(
                "<meta http-equiv=\"refresh\" content=\"{};url={}\">",
                r.after_ms.div_ceil(1000),
                r.to
            )
        })
        .unwrap_or_default();
    format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
         <title>{} - Clinic Desk</title>{}<style>{}</style></head><body>{}</body></html>",
        escape(title),
        refresh,
        STYLE,
        body
    )
}

fn messages(out: &mut String, error: Option<&str>, success: Option<&str>) {
    if let Some(error) = error {
        let _ = write!(out, "<p class=\"error\" role=\"alert\">{}</p>", escape(error));
    }
    if let Some(success) = success {
        let _ = write!(out, "<p class=\"success\" role=\"status\">{}</p>", escape(success));
    }
}

fn disabled(flag: bool) -> &'static str {
    if flag {
        " disabled"
    } else {
        ""
    }
}

// ─── Login / signup ──────────────────────────────────────────

fn login_html(route: Route, view: &LoginView) -> String {
    let action = route.path();
    let mut body = String::from("<h1>Clinic Desk</h1>");
    let _ = write!(
        body,
        "<form method=\"post\" action=\"{a}\"><input type=\"hidden\" name=\"action\" value=\"tab\">\
         <button name=\"tab\" value=\"login\"{l}>Login</button>\
         <button name=\"tab\" value=\"signup\"{s}>Sign Up</button></form>",
        a = action,
        l = disabled(view.tab == AuthTab::Login),
        s = disabled(view.tab == AuthTab::Signup),
    );
    messages(&mut body, view.error.as_deref(), view.success.as_deref());

    match view.tab {
        AuthTab::Login => {
            let _ = write!(
                body,
                "<form method=\"post\" action=\"{}\"><input type=\"hidden\" name=\"action\" value=\"login\">\
                 <label>Email <input type=\"email\" name=\"email\" value=\"{}\" required></label>\
                 <label>Password <input type=\"password\" name=\"password\" required></label>\
                 <button type=\"submit\"{}>{}</button></form>",
                action,
                escape(&view.login_email),
                disabled(view.loading),
                if view.loading { "Logging in..." } else { "Login" },
            );
        }
        AuthTab::Signup => {
            let _ = write!(
                body,
                "<form method=\"post\" action=\"{}\"><input type=\"hidden\" name=\"action\" value=\"signup\">\
                 <label>Full Name <input name=\"full_name\" value=\"{}\" required></label>\
                 <label>Email <input type=\"email\" name=\"email\" value=\"{}\" required></label>\
                 <label>Password <input type=\"password\" name=\"password\" minlength=\"6\" required></label>\
                 <label>Confirm Password <input type=\"password\" name=\"confirm_password\" required></label>\
                 <button type=\"submit\"{}>{}</button></form>",
                action,
                escape(&view.signup_full_name),
                escape(&view.signup_email),
                disabled(view.loading),
                if view.loading { "Creating account..." } else { "Sign Up" },
            );
        }
    }
    page("Login", &body, view.redirect)
}

// ─── Appointment panel ───────────────────────────────────────

fn panel_html(view: &PanelView) -> String {
    let action = Route::Appointments.path();
    let mut body = String::from("<h1>Appointments</h1>");
    let busy = disabled(view.loading);

    let _ = write!(
        body,
        "<form method=\"post\" action=\"{a}\">\
         <button name=\"action\" value=\"fetch_all\"{b}>All Appointments</button> \
         <button name=\"action\" value=\"fetch_treatments\"{b}>All Treatments</button> \
         <button name=\"action\" value=\"refresh\"{b}>Refresh</button> \
         <button name=\"action\" value=\"create\">Create New Appointment</button> \
         <button name=\"action\" value=\"logout\">Logout</button></form>\
         <form method=\"post\" action=\"{a}\"><input type=\"hidden\" name=\"action\" value=\"fetch_one\">\
         <label>Appointment ID <input name=\"appointment_id\" value=\"{id}\"></label>\
         <button type=\"submit\"{b}>Find Appointment</button></form>",
        a = action,
        b = busy,
        id = escape(&view.appointment_id),
    );
    messages(&mut body, view.error.as_deref(), None);
    if view.loading {
        body.push_str("<p>Loading...</p>");
    }

    match &view.visible {
        Visible::Nothing => {}
        Visible::Appointments(rows) => appointments_table(&mut body, rows),
        Visible::Appointment(detail) => appointment_card(&mut body, detail),
        Visible::Treatments(rows) => treatments_table(&mut body, rows),
    }
    if view.active_view == Some(ActiveView::AllAppointments)
        && matches!(&view.visible, Visible::Appointments(rows) if rows.is_empty())
    {
        body.push_str("<p>No appointments found.</p>");
    }
    page("Appointments", &body, None)
}

fn appointments_table(out: &mut String, rows: &[AppointmentSummary]) {
    out.push_str(
        "<table><thead><tr><th>ID</th><th>Patient</th><th>Date</th><th>Status</th></tr></thead><tbody>",
    );
    for row in rows {
        let _ = write!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&row.id),
            escape(&row.patient_name),
            escape(&row.date),
            row.status.label()
        );
    }
    out.push_str("</tbody></table>");
}

fn appointment_card(out: &mut String, detail: &AppointmentDetail) {
    let _ = write!(
        out,
        "<section><h2>Appointment {}</h2><dl>\
         <dt>Patient</dt><dd>{}</dd><dt>Date</dt><dd>{}</dd><dt>Time</dt><dd>{}</dd>\
         <dt>Status</dt><dd>{}</dd>",
        escape(&detail.id),
        escape(&detail.patient_name),
        escape(&detail.date),
        escape(detail.time.as_deref().unwrap_or(NOT_YET_AVAILABLE)),
        detail.status.label(),
    );
    if let Some(doctor) = &detail.doctor {
        let _ = write!(out, "<dt>Doctor</dt><dd>{}</dd>", escape(doctor));
    }
    for field in &detail.unrecorded {
        let _ = write!(
            out,
            "<dt>{}</dt><dd>{}</dd>",
            escape(field),
            NOT_YET_AVAILABLE
        );
    }
    if let Some(link) = &detail.virtual_link {
        let _ = write!(
            out,
            "<dt>Virtual Link</dt><dd><a href=\"{0}\">{0}</a></dd>",
            escape(link)
        );
    }
    if let Some(notes) = &detail.notes {
        let _ = write!(out, "<dt>Notes</dt><dd>{}</dd>", escape(notes));
    }
    out.push_str("</dl></section>");
}

fn treatments_table(out: &mut String, rows: &[Treatment]) {
    out.push_str(
        "<table><thead><tr><th>Name</th><th>Duration</th><th>Cost</th><th>Description</th></tr></thead><tbody>",
    );
    for row in rows {
        let _ = write!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&row.name),
            escape(&row.duration),
            escape(&row.cost),
            escape(&row.description)
        );
    }
    out.push_str("</tbody></table>");
}

// ─── Creation form ───────────────────────────────────────────

fn select_options<T>(
    out: &mut String,
    task: &Task<Vec<T>>,
    selected: &str,
    key: impl Fn(&T) -> (&str, String),
) {
    match task {
        Task::Resolved(items) => {
            for item in items {
                let (value, label) = key(item);
                let _ = write!(
                    out,
                    "<option value=\"{}\"{}>{}</option>",
                    escape(value),
                    if value == selected { " selected" } else { "" },
                    escape(&label)
                );
            }
        }
        Task::Idle | Task::Pending => out.push_str("<option value=\"\">Loading...</option>"),
        Task::Rejected(_) => {}
    }
}

fn form_html(view: &FormView) -> String {
    let action = Route::AddAppointment.path();
    let draft = &view.draft;
    let submitting = view.phase == FormPhase::Submitting;
    let mut body = String::from("<h1>Create New Appointment</h1>");
    if let Some(email) = &view.welcome_email {
        let _ = write!(body, "<p>Welcome, {}</p>", escape(email));
    }
    messages(&mut body, view.error.as_deref(), view.success.as_deref());

    let _ = write!(
        body,
        "<form method=\"post\" action=\"{}\"><input type=\"hidden\" name=\"action\" value=\"submit\">\
         <label>Patient * <select name=\"user_id\"{}><option value=\"\">Select a patient</option>",
        action,
        disabled(view.patients.value().is_none()),
    );
    select_options(&mut body, &view.patients, &draft.user_id, |p| {
        (p.id.as_str(), p.label())
    });
    body.push_str("</select></label>");
    if let Some(error) = view.patients.error() {
        let _ = write!(body, "<p class=\"error\">{}</p>", escape(error));
    }

    let _ = write!(
        body,
        "<label>Staff Member <select name=\"staff_id\"{}><option value=\"\">Select a staff member (optional)</option>",
        disabled(view.staff.value().is_none()),
    );
    select_options(&mut body, &view.staff, &draft.staff_id, |s| {
        (s.user_id.as_str(), s.label())
    });
    body.push_str("</select></label>");
    if let Some(error) = view.staff.error() {
        let _ = write!(body, "<p class=\"error\">{}</p>", escape(error));
    }

    let _ = write!(
        body,
        "<label>Date * <input type=\"date\" name=\"appointment_date\" value=\"{}\" required></label>\
         <label>Time * <input type=\"time\" name=\"appointment_time\" value=\"{}\" required></label>\
         <label>Status <select name=\"status\">",
        escape(&draft.appointment_date),
        escape(&draft.appointment_time),
    );
    for status in AppointmentStatus::ALL {
        let _ = write!(
            body,
            "<option value=\"{}\"{}>{}</option>",
            status.as_str(),
            if status == draft.status { " selected" } else { "" },
            status.label()
        );
    }
    let _ = write!(
        body,
        "</select></label>\
         <label>Virtual Meeting Link <input type=\"url\" name=\"virtual_link\" value=\"{}\"></label>\
         <label>Notes <textarea name=\"notes\">{}</textarea></label>\
         <button type=\"submit\"{}>{}</button></form>\
         <form method=\"post\" action=\"{}\"><button name=\"action\" value=\"cancel\">Cancel</button></form>",
        escape(&draft.virtual_link),
        escape(&draft.notes),
        disabled(submitting),
        if submitting { "Creating..." } else { "Create Appointment" },
        action,
    );
    page("Create Appointment", &body, view.redirect)
}
