//! Shared validation helpers for path and query parameters.

use serde_json::json;

use crate::domain::{Error, LookupCategory, TicketDimension, TicketId, UserId};

/// Validation error codes for HTTP parameter failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    InvalidUuid,
    UnsupportedValue,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::UnsupportedValue => "unsupported_value",
        }
    }
}

/// Newtype wrapper for HTTP field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &'static str {
        self.0
    }
}

fn parameter_error(field: FieldName, message: String, code: ErrorCode, value: &str) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "value": value,
        "code": code.as_str(),
    }))
}

pub(crate) fn invalid_uuid_error(field: FieldName, value: &str) -> Error {
    let name = field.as_str();
    parameter_error(
        field,
        format!("{name} must be a valid UUID"),
        ErrorCode::InvalidUuid,
        value,
    )
}

fn unsupported_value_error(field: FieldName, value: &str, allowed: &[&str]) -> Error {
    let name = field.as_str();
    Error::invalid_request(format!("{name} must be one of: {}", allowed.join(", "))).with_details(
        json!({
            "field": name,
            "value": value,
            "code": ErrorCode::UnsupportedValue.as_str(),
            "allowed": allowed,
        }),
    )
}

pub(crate) fn parse_ticket_id(raw: &str) -> Result<TicketId, Error> {
    TicketId::new(raw).map_err(|_| invalid_uuid_error(FieldName::new("id"), raw))
}

pub(crate) fn parse_user_id(raw: &str) -> Result<UserId, Error> {
    UserId::new(raw).map_err(|_| invalid_uuid_error(FieldName::new("id"), raw))
}

pub(crate) fn parse_lookup_category(raw: &str) -> Result<LookupCategory, Error> {
    raw.parse().map_err(|_| {
        let allowed: Vec<&str> = LookupCategory::ALL.iter().map(|c| c.as_str()).collect();
        unsupported_value_error(FieldName::new("category"), raw, &allowed)
    })
}

pub(crate) fn parse_dimension(raw: &str) -> Result<TicketDimension, Error> {
    match raw {
        "status" => Ok(TicketDimension::Status),
        "priority" => Ok(TicketDimension::Priority),
        "type" => Ok(TicketDimension::TicketType),
        other => Err(unsupported_value_error(
            FieldName::new("by"),
            other,
            &["status", "priority", "type"],
        )),
    }
}
