//! What the home screen should show for the current controller state. Pure
//! derivation; rendering is left to the caller.

use chrono::{DateTime, Local, TimeZone};
use shared::domain::{Identity, Session, TravelMode};

use crate::store::SessionStore;

const OPENED_AT_FORMAT: &str = "%d/%m/%Y, %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub opened_at: String,
    pub route: String,
    pub mode: String,
}

impl SessionSummary {
    pub fn from_session(session: &Session) -> Self {
        Self {
            opened_at: format_opened_at(&session.opened_at),
            route: session.route.clone(),
            mode: session.mode.to_string(),
        }
    }
}

/// Extra check-out inputs for the travel mode recorded at check-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseFieldSet {
    BusTicket,
    BikeOdometer,
    CommonOnly,
}

impl CloseFieldSet {
    pub fn for_mode(mode: &TravelMode) -> Self {
        match mode {
            TravelMode::Bus => CloseFieldSet::BusTicket,
            TravelMode::Bike => CloseFieldSet::BikeOdometer,
            TravelMode::Other(_) => CloseFieldSet::CommonOnly,
        }
    }
}

/// Whether the check-in form shows (and requires) the bike reading and odometer photo.
pub fn checkin_bike_fields_visible(mode: Option<&TravelMode>) -> bool {
    matches!(mode, Some(TravelMode::Bike))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteChoices {
    Available(Vec<String>),
    NoneFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeView {
    pub salesperson_label: String,
    pub check_in_visible: bool,
    pub check_out_visible: bool,
    pub degraded: Option<String>,
    pub summary: Option<SessionSummary>,
    pub checkout_fields: Option<CloseFieldSet>,
    pub route_choices: RouteChoices,
}

impl HomeView {
    /// While degraded the open/closed status is unknown, so check-in stays hidden
    /// even though the store is empty.
    pub fn derive(
        identity: &Identity,
        store: &SessionStore,
        routes: &[String],
        degraded: Option<&str>,
    ) -> Self {
        Self {
            salesperson_label: identity.display_name().to_string(),
            check_in_visible: store.can_open() && degraded.is_none(),
            check_out_visible: store.can_close(),
            degraded: degraded.map(str::to_string),
            summary: store.current().map(SessionSummary::from_session),
            checkout_fields: store.mode_of().map(CloseFieldSet::for_mode),
            route_choices: if routes.is_empty() {
                RouteChoices::NoneFound
            } else {
                RouteChoices::Available(routes.to_vec())
            },
        }
    }
}

pub fn format_opened_at(raw: &str) -> String {
    format_opened_at_in(raw, &Local)
}

/// Falls back to the raw text when the backend timestamp is not RFC 3339.
pub fn format_opened_at_in<Tz>(raw: &str, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    match DateTime::parse_from_rfc3339(raw.trim()) {
        Ok(parsed) => parsed
            .with_timezone(tz)
            .format(OPENED_AT_FORMAT)
            .to_string(),
        Err(_) => raw.to_string(),
    }
}

#[cfg(test)]
#[path = "tests/presentation_tests.rs"]
mod tests;
