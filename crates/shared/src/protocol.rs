use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    domain::{Identity, Session, SessionId, TravelMode},
    error::BackendError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BackendAction {
    Routes,
    CurrentCheckin,
    Checkin,
    Checkout,
}

impl BackendAction {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendAction::Routes => "routes",
            BackendAction::CurrentCheckin => "currentCheckin",
            BackendAction::Checkin => "checkin",
            BackendAction::Checkout => "checkout",
        }
    }
}

impl fmt::Display for BackendAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutesResponse {
    pub ok: bool,
    #[serde(default, deserialize_with = "crate::domain::texts_or_numbers")]
    pub routes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RoutesResponse {
    pub fn into_routes(self) -> Result<Vec<String>, BackendError> {
        if !self.ok {
            return Err(BackendError::from_envelope(
                BackendAction::Routes,
                self.error,
                "Failed to fetch routes",
            ));
        }
        Ok(self.routes)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentCheckinResponse {
    pub ok: bool,
    #[serde(default)]
    pub current: Option<Session>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CurrentCheckinResponse {
    pub fn into_current(self) -> Result<Option<Session>, BackendError> {
        if !self.ok {
            return Err(BackendError::from_envelope(
                BackendAction::CurrentCheckin,
                self.error,
                "Failed to fetch current check-in",
            ));
        }
        Ok(self.current)
    }
}

/// Opening evidence, shaped by travel mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenEvidence {
    Bike {
        reading: String,
        odometer_image_b64: String,
    },
    None,
}

/// Closing evidence, shaped by the travel mode recorded at check-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseEvidence {
    Bus {
        ticket_price: String,
        ticket_image_b64: String,
    },
    Bike {
        reading_out: String,
        odometer_image_out_b64: String,
    },
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckinRequest {
    pub salesperson_name: Identity,
    pub route: String,
    pub mode: TravelMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bike_reading: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bike_odo_image_base64: Option<String>,
}

impl CheckinRequest {
    pub fn new(
        salesperson_name: Identity,
        route: impl Into<String>,
        mode: TravelMode,
        evidence: OpenEvidence,
    ) -> Self {
        let (bike_reading, bike_odo_image_base64) = match evidence {
            OpenEvidence::Bike {
                reading,
                odometer_image_b64,
            } => (Some(reading), Some(odometer_image_b64)),
            OpenEvidence::None => (None, None),
        };
        Self {
            salesperson_name,
            route: route.into(),
            mode,
            bike_reading,
            bike_odo_image_base64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub salesperson_name: Identity,
    pub checkin_id: SessionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food_expense: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_expense: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bus_ticket_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bus_ticket_image_base64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bike_reading_out: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bike_odo_image_out_base64: Option<String>,
}

impl CheckoutRequest {
    pub fn new(
        salesperson_name: Identity,
        checkin_id: SessionId,
        food_expense: Option<String>,
        auto_expense: Option<String>,
        evidence: CloseEvidence,
    ) -> Self {
        let mut request = Self {
            salesperson_name,
            checkin_id,
            food_expense,
            auto_expense,
            bus_ticket_price: None,
            bus_ticket_image_base64: None,
            bike_reading_out: None,
            bike_odo_image_out_base64: None,
        };
        match evidence {
            CloseEvidence::Bus {
                ticket_price,
                ticket_image_b64,
            } => {
                request.bus_ticket_price = Some(ticket_price);
                request.bus_ticket_image_base64 = Some(ticket_image_b64);
            }
            CloseEvidence::Bike {
                reading_out,
                odometer_image_out_b64,
            } => {
                request.bike_reading_out = Some(reading_out);
                request.bike_odo_image_out_base64 = Some(odometer_image_out_b64);
            }
            CloseEvidence::None => {}
        }
        request
    }
}

/// Body of a POST to the backend; the `action` field selects the handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum WriteRequest {
    Checkin(CheckinRequest),
    Checkout(CheckoutRequest),
}

impl WriteRequest {
    pub fn action(&self) -> BackendAction {
        match self {
            WriteRequest::Checkin(_) => BackendAction::Checkin,
            WriteRequest::Checkout(_) => BackendAction::Checkout,
        }
    }
}
