//! SAML timestamp formatting and parsing.

use chrono::{DateTime, Utc};

use crate::error::{SamlError, SamlResult};

/// Formats a timestamp the way assertions carry it: UTC, whole seconds, `Z`.
#[must_use]
pub fn saml_timestamp(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Parses an RFC 3339 timestamp, with or without fractional seconds.
///
/// # Errors
///
/// Returns [`SamlError::MalformedRequest`] naming `field` if the value does
/// not parse.
pub fn parse_timestamp(value: &str, field: &str) -> SamlResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SamlError::MalformedRequest(format!("invalid {field} {value:?}: {e}")))
}
