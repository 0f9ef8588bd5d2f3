//! Check-in / check-out form validation and payload assembly.
//!
//! Checks run in a fixed order (route, mode, then the mode's own fields with
//! the reading or price ahead of its image) and stop at the first gap. Nothing
//! here talks to the backend.

use shared::{
    domain::{Identity, TravelMode},
    protocol::{CheckinRequest, CheckoutRequest, CloseEvidence, OpenEvidence},
};

use crate::{
    error::{ClientError, ClientResult, FormField, SessionAction},
    evidence::{self, Attachment},
    store::SessionStore,
};

#[derive(Debug, Clone, Default)]
pub struct CheckinForm {
    pub route: String,
    pub mode: Option<TravelMode>,
    pub bike_reading: String,
    pub bike_odo_image: Option<Attachment>,
}

/// Mode is deliberately absent: check-out always uses the mode recorded at check-in.
#[derive(Debug, Clone, Default)]
pub struct CheckoutForm {
    pub food_expense: String,
    pub auto_expense: String,
    pub bus_ticket_price: String,
    pub bus_ticket_image: Option<Attachment>,
    pub bike_reading_out: String,
    pub bike_odo_image_out: Option<Attachment>,
}

pub async fn build_checkin(
    identity: &Identity,
    store: &SessionStore,
    form: &CheckinForm,
) -> ClientResult<CheckinRequest> {
    if !store.can_open() {
        return Err(ClientError::NotPermitted(SessionAction::Open));
    }

    let route = required_text(&form.route, FormField::Route)?;
    let mode = match &form.mode {
        Some(mode) if !mode.as_str().trim().is_empty() => mode.clone(),
        _ => return Err(ClientError::validation(FormField::Mode)),
    };

    let evidence = match mode {
        TravelMode::Bike => {
            let reading = required_text(&form.bike_reading, FormField::BikeReading)?;
            let image = required_attachment(form.bike_odo_image.as_ref(), FormField::BikeOdoImage)?;
            OpenEvidence::Bike {
                reading,
                odometer_image_b64: encode_required(image, FormField::BikeOdoImage).await?,
            }
        }
        TravelMode::Bus | TravelMode::Other(_) => OpenEvidence::None,
    };

    Ok(CheckinRequest::new(identity.clone(), route, mode, evidence))
}

pub async fn build_checkout(
    identity: &Identity,
    store: &SessionStore,
    form: &CheckoutForm,
) -> ClientResult<CheckoutRequest> {
    let Some(session) = store.current() else {
        return Err(ClientError::NotPermitted(SessionAction::Close));
    };

    let evidence = match &session.mode {
        TravelMode::Bus => {
            let ticket_price = required_text(&form.bus_ticket_price, FormField::BusTicketPrice)?;
            let image =
                required_attachment(form.bus_ticket_image.as_ref(), FormField::BusTicketImage)?;
            CloseEvidence::Bus {
                ticket_price,
                ticket_image_b64: encode_required(image, FormField::BusTicketImage).await?,
            }
        }
        TravelMode::Bike => {
            let reading_out = required_text(&form.bike_reading_out, FormField::BikeReadingOut)?;
            let image =
                required_attachment(form.bike_odo_image_out.as_ref(), FormField::BikeOdoImageOut)?;
            CloseEvidence::Bike {
                reading_out,
                odometer_image_out_b64: encode_required(image, FormField::BikeOdoImageOut).await?,
            }
        }
        TravelMode::Other(_) => CloseEvidence::None,
    };

    Ok(CheckoutRequest::new(
        identity.clone(),
        session.session_id.clone(),
        optional_text(&form.food_expense),
        optional_text(&form.auto_expense),
        evidence,
    ))
}

fn required_text(value: &str, field: FormField) -> ClientResult<String> {
    optional_text(value).ok_or(ClientError::validation(field))
}

fn optional_text(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn required_attachment(attachment: Option<&Attachment>, field: FormField) -> ClientResult<&Attachment> {
    attachment.ok_or(ClientError::validation(field))
}

/// An attachment that encodes to nothing (an empty file) counts as missing.
async fn encode_required(attachment: &Attachment, field: FormField) -> ClientResult<String> {
    let encoded = evidence::encode(Some(attachment)).await?;
    if encoded.is_empty() {
        return Err(ClientError::validation(field));
    }
    Ok(encoded)
}

#[cfg(test)]
#[path = "tests/forms_tests.rs"]
mod tests;
