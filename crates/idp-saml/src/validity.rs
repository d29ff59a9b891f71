//! Freshness checks on inbound requests.
//!
//! `now` is always passed in so the checks are deterministic under test.

use chrono::{DateTime, Duration, Utc};

use crate::error::{SamlError, SamlResult};
use crate::types::{AuthnRequest, LogoutRequest};

/// Maximum age of a request's `IssueInstant`, in minutes.
pub const MAX_REQUEST_AGE_MINUTES: i64 = 10;

/// Returns true if `issue_instant` is more than ten minutes before `now`.
#[must_use]
pub fn is_stale(issue_instant: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now - issue_instant > Duration::minutes(MAX_REQUEST_AGE_MINUTES)
}

/// Returns true if `now` is past `not_on_or_after`.
#[must_use]
pub fn is_expired(not_on_or_after: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now > not_on_or_after
}

/// Rejects a stale AuthnRequest.
///
/// # Errors
///
/// Returns [`SamlError::StaleRequest`].
pub fn check_authn_request(request: &AuthnRequest, now: DateTime<Utc>) -> SamlResult<()> {
    if is_stale(request.issue_instant, now) {
        tracing::warn!(request_id = %request.id, issue_instant = %request.issue_instant, "stale authn request");
        return Err(SamlError::StaleRequest);
    }
    Ok(())
}

/// Rejects a stale or expired LogoutRequest. Staleness is checked first.
///
/// # Errors
///
/// Returns [`SamlError::StaleRequest`] or [`SamlError::ExpiredRequest`].
pub fn check_logout_request(request: &LogoutRequest, now: DateTime<Utc>) -> SamlResult<()> {
    if is_stale(request.issue_instant, now) {
        tracing::warn!(request_id = %request.id, issue_instant = %request.issue_instant, "stale logout request");
        return Err(SamlError::StaleRequest);
    }
    if is_expired(request.not_on_or_after, now) {
        tracing::warn!(request_id = %request.id, not_on_or_after = %request.not_on_or_after, "expired logout request");
        return Err(SamlError::ExpiredRequest);
    }
    Ok(())
}
