use std::fmt;

use thiserror::Error;

/// Input fields named in validation failures, in the names the backend uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Route,
    Mode,
    BikeReading,
    BikeOdoImage,
    BusTicketPrice,
    BusTicketImage,
    BikeReadingOut,
    BikeOdoImageOut,
}

impl FormField {
    pub fn as_str(self) -> &'static str {
        match self {
            FormField::Route => "route",
            FormField::Mode => "mode",
            FormField::BikeReading => "bikeReading",
            FormField::BikeOdoImage => "bikeOdoImage",
            FormField::BusTicketPrice => "busTicketPrice",
            FormField::BusTicketImage => "busTicketImage",
            FormField::BikeReadingOut => "bikeReadingOut",
            FormField::BikeOdoImageOut => "bikeOdoImageOut",
        }
    }

    /// Short prompt suitable for showing next to the failing input.
    pub fn prompt(self) -> &'static str {
        match self {
            FormField::Route => "Please select Route",
            FormField::Mode => "Please select Mode",
            FormField::BikeReading => "Bike reading is required",
            FormField::BikeOdoImage => "Odometer image is required",
            FormField::BusTicketPrice => "Bus ticket price is required",
            FormField::BusTicketImage => "Bus ticket image is required",
            FormField::BikeReadingOut => "Bike end reading is required",
            FormField::BikeOdoImageOut => "End odometer image is required",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    Open,
    Close,
}

impl fmt::Display for SessionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionAction::Open => f.write_str("check-in"),
            SessionAction::Close => f.write_str("check-out"),
        }
    }
}

/// Every failure the session controller reports. None of them are fatal; each
/// leaves the controller in a state from which the triggering action can be retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("validation failed for {field}: {}", .field.prompt())]
    Validation { field: FormField },
    #[error("failed to encode evidence: {0}")]
    EncodingFailed(String),
    #[error("failed to submit to backend: {0}")]
    SubmissionFailed(String),
    #[error("route catalog unavailable: {0}")]
    CatalogUnavailable(String),
    #[error("failed to sync current check-in: {0}")]
    SyncFailed(String),
    #[error("{0} is not permitted in the current session state")]
    NotPermitted(SessionAction),
}

impl ClientError {
    pub fn validation(field: FormField) -> Self {
        ClientError::Validation { field }
    }

    pub fn field(&self) -> Option<FormField> {
        match self {
            ClientError::Validation { field } => Some(*field),
            _ => None,
        }
    }

    /// Display text for the status line, mirroring the short toasts a field user expects.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Validation { field } => field.prompt().to_string(),
            ClientError::CatalogUnavailable(_) => "Couldn't load routes".to_string(),
            ClientError::SyncFailed(_) => {
                "Couldn't confirm your check-in status; refresh before continuing".to_string()
            }
            other => format!("Error: {other}"),
        }
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Flattens an `anyhow` chain into one line for the taxonomy's reason text.
pub(crate) fn describe(err: &anyhow::Error) -> String {
    format!("{err:#}")
}
