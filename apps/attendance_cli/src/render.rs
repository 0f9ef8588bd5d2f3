//! Plain-text rendering of the home view.

use std::fmt::Write as _;

use attendance_core::{
    presentation::{CloseFieldSet, RouteChoices},
    HomeView,
};

pub fn render_home(view: &HomeView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Salesperson: {}", view.salesperson_label);

    if let Some(reason) = &view.degraded {
        let _ = writeln!(out, "Status: unknown (could not reach backend: {reason})");
    }

    match &view.summary {
        Some(summary) => {
            let _ = writeln!(out, "Checked-In: {}", summary.opened_at);
            let _ = writeln!(out, "Route: {}", summary.route);
            let _ = writeln!(out, "Mode: {}", summary.mode);
        }
        None if view.degraded.is_none() => {
            let _ = writeln!(out, "No open check-in.");
        }
        None => {}
    }

    let mut actions = Vec::new();
    if view.check_in_visible {
        actions.push("check-in");
    }
    if view.check_out_visible {
        actions.push("check-out");
    }
    if actions.is_empty() {
        actions.push("status (retry)");
    }
    let _ = writeln!(out, "Available: {}", actions.join(", "));

    if let Some(fields) = view.checkout_fields {
        let _ = writeln!(out, "Check-out needs: {}", checkout_requirements(fields));
    }
    out
}

pub fn render_routes(choices: &RouteChoices) -> String {
    match choices {
        RouteChoices::Available(routes) => routes.iter().fold(String::new(), |mut out, route| {
            let _ = writeln!(out, "{route}");
            out
        }),
        RouteChoices::NoneFound => "(No routes found)\n".to_string(),
    }
}

fn checkout_requirements(fields: CloseFieldSet) -> &'static str {
    match fields {
        CloseFieldSet::BusTicket => "--bus-ticket-price and --bus-ticket-image",
        CloseFieldSet::BikeOdometer => "--bike-reading-out and --bike-odo-image-out",
        CloseFieldSet::CommonOnly => "nothing beyond optional expenses",
    }
}
