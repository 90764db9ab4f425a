//! Entry validation
//!
//! Rules depend on the application family: CVAR entries need PRC mail timing
//! unless they carry child records, XVA entries only need their key. Status
//! fields are checked against the tri-color set of their own family only.

use thiserror::Error;

use crate::domain::{
    is_blank, ApplicationFamily, EntryInput, RequiredField, StatusField, TicketNumber,
    TicketStatus, TriColor,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {}", .0.key())]
    MissingField(RequiredField),

    #[error("Invalid date format")]
    InvalidDate,

    #[error("{}", .0.invalid_message())]
    InvalidStatus(StatusField),

    #[error("Invalid PRB id number")]
    InvalidPrbNumber,

    #[error("Invalid PRB ID status in array")]
    InvalidPrbItemStatus,

    #[error("Invalid HIIM id number")]
    InvalidHiimNumber,

    #[error("Invalid HIIM ID status in array")]
    InvalidHiimItemStatus,

    #[error("Invalid PRB ID status")]
    InvalidPrbStatus,

    #[error("Invalid HIIM ID status")]
    InvalidHiimStatus,
}

/// Validate an entry payload. Updates pass the stored entry merged with the patch.
pub fn validate(input: &EntryInput) -> Result<(), ValidationError> {
    let family = ApplicationFamily::of(input.application_name.as_deref().unwrap_or_default());

    for field in family.required_fields() {
        if is_blank(required_value(input, *field)) {
            if field.waived_by_children() && input.has_children() {
                continue;
            }
            return Err(ValidationError::MissingField(*field));
        }
    }

    if input.parsed_date().is_none() {
        return Err(ValidationError::InvalidDate);
    }

    for field in family.status_fields() {
        if let Some(value) = supplied(status_value(input, *field)) {
            if value.parse::<TriColor>().is_err() {
                return Err(ValidationError::InvalidStatus(*field));
            }
        }
    }

    for prb in input.prbs.iter().flatten() {
        if !ticket_number_ok(&prb.prb_id_number) {
            return Err(ValidationError::InvalidPrbNumber);
        }
        if !ticket_status_ok(&prb.prb_id_status) {
            return Err(ValidationError::InvalidPrbItemStatus);
        }
    }

    for hiim in input.hiims.iter().flatten() {
        if !ticket_number_ok(&hiim.hiim_id_number) {
            return Err(ValidationError::InvalidHiimNumber);
        }
        if !ticket_status_ok(&hiim.hiim_id_status) {
            return Err(ValidationError::InvalidHiimItemStatus);
        }
    }

    if !ticket_status_ok(&input.prb_id_status) {
        return Err(ValidationError::InvalidPrbStatus);
    }
    if !ticket_status_ok(&input.hiim_id_status) {
        return Err(ValidationError::InvalidHiimStatus);
    }

    Ok(())
}

fn required_value(input: &EntryInput, field: RequiredField) -> &Option<String> {
    match field {
        RequiredField::Date => &input.date,
        RequiredField::ApplicationName => &input.application_name,
        RequiredField::PrcMailText => &input.prc_mail_text,
        RequiredField::PrcMailStatus => &input.prc_mail_status,
    }
}

fn status_value(input: &EntryInput, field: StatusField) -> &Option<String> {
    match field {
        StatusField::PrcMail => &input.prc_mail_status,
        StatusField::CpAlerts => &input.cp_alerts_status,
        StatusField::Quality => &input.quality_status,
        StatusField::Valo => &input.valo_status,
        StatusField::Sensi => &input.sensi_status,
        StatusField::CfRa => &input.cf_ra_status,
        StatusField::QualityLegacy => &input.quality_legacy,
        StatusField::QualityTarget => &input.quality_target,
    }
}

/// Present and non-empty
fn supplied(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn ticket_number_ok(number: &Option<TicketNumber>) -> bool {
    number.as_ref().map_or(true, TicketNumber::is_integer)
}

fn ticket_status_ok(status: &Option<String>) -> bool {
    supplied(status).map_or(true, |s| s.parse::<TicketStatus>().is_ok())
}
