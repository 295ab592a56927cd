//! Accumulates field-level validation failures into one domain error.
//!
//! Write operations validate every input before touching a repository, so a
//! client sees all problems of a request at once instead of fixing them one
//! round trip at a time.

use serde_json::{Value, json};

use super::{Error, LookupMiss};

/// Machine-readable reason attached to a failing field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldErrorCode {
    MissingField,
    InvalidValue,
    TooShort,
    TooLong,
    UnknownLookup,
    DomainNotAllowed,
}

impl FieldErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::InvalidValue => "invalid_value",
            Self::TooShort => "too_short",
            Self::TooLong => "too_long",
            Self::UnknownLookup => "unknown_lookup",
            Self::DomainNotAllowed => "domain_not_allowed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FieldError {
    field: &'static str,
    code: FieldErrorCode,
    message: String,
}

/// Collector of validation failures for one request.
///
/// # Examples
/// ```
/// use helpdesk::domain::{ErrorCode, FieldErrorCode, FieldErrors};
///
/// let mut errors = FieldErrors::default();
/// errors.push("evidence", FieldErrorCode::MissingField, "evidence must not be empty");
/// let err = errors.into_result("invalid ticket").expect_err("one failure");
/// assert_eq!(err.code(), ErrorCode::InvalidRequest);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    fields: Vec<FieldError>,
    missing_lookups: Vec<LookupMiss>,
}

impl FieldErrors {
    /// Record a failing field.
    pub fn push(&mut self, field: &'static str, code: FieldErrorCode, message: impl Into<String>) {
        self.fields.push(FieldError {
            field,
            code,
            message: message.into(),
        });
    }

    /// Record a lookup description that matched nothing.
    pub fn push_lookup_miss(&mut self, field: &'static str, miss: LookupMiss) {
        self.push(
            field,
            FieldErrorCode::UnknownLookup,
            format!("unknown {} '{}'", miss.category, miss.description),
        );
        self.missing_lookups.push(miss);
    }

    /// Unwrap `result`, recording its error under `field` on failure.
    pub fn check<T, E: std::fmt::Display>(
        &mut self,
        field: &'static str,
        code: FieldErrorCode,
        result: Result<T, E>,
    ) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.push(field, code, err.to_string());
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn details(&self) -> Value {
        let fields: Vec<Value> = self
            .fields
            .iter()
            .map(|issue| {
                json!({
                    "field": issue.field,
                    "code": issue.code.as_str(),
                    "message": issue.message,
                })
            })
            .collect();
        let mut details = json!({ "fields": fields });
        if !self.missing_lookups.is_empty() {
            details["missingLookups"] = self
                .missing_lookups
                .iter()
                .map(|miss| {
                    json!({
                        "category": miss.category.as_str(),
                        "description": miss.description,
                    })
                })
                .collect();
        }
        details
    }

    /// `Ok(())` when nothing failed, otherwise an `invalid_request` error
    /// whose message lists every failure after `summary`.
    pub fn into_result(self, summary: &str) -> Result<(), Error> {
        if self.is_empty() {
            return Ok(());
        }
        let reasons: Vec<&str> = self.fields.iter().map(|issue| issue.message.as_str()).collect();
        let message = format!("{summary}: {}", reasons.join("; "));
        Err(Error::invalid_request(message).with_details(self.details()))
    }
}
