//! Credential expiry timestamp conversion.
//!
//! The backend stores `metadata.expiresAt` as a midnight-UTC instant; clients
//! send and receive loosely formatted ISO strings. Values that do not parse
//! are passed through unchanged.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::Value;

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (taken as UTC).
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Normalize to midnight UTC of the instant's UTC date, without fractional
/// seconds: `2025-08-15T00:00:00Z`.
#[must_use]
pub fn to_utc_iso(raw: &str) -> String {
    match parse_timestamp(raw) {
        Some(dt) => dt.date_naive().format("%Y-%m-%dT00:00:00Z").to_string(),
        None => raw.to_owned(),
    }
}

/// Render as a UTC ISO-8601 timestamp with milliseconds:
/// `2025-08-15T00:00:00.000Z`.
#[must_use]
pub fn to_client_iso(raw: &str) -> String {
    match parse_timestamp(raw) {
        Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => raw.to_owned(),
    }
}

/// Rewrite `metadata.expiresAt` of an outgoing credential payload in place.
pub fn convert_expiry_to_utc(payload: &mut Value) {
    rewrite_expiry(payload, to_utc_iso);
}

/// Rewrite `metadata.expiresAt` of a credential, or of every credential in
/// an array, for display by the client.
pub fn convert_expiry_to_client(payload: &mut Value) {
    match payload {
        Value::Array(items) => items.iter_mut().for_each(|item| rewrite_expiry(item, to_client_iso)),
        other => rewrite_expiry(other, to_client_iso),
    }
}

fn rewrite_expiry(payload: &mut Value, convert: fn(&str) -> String) {
    let Some(slot) = payload
        .get_mut("metadata")
        .and_then(|m| m.get_mut("expiresAt"))
    else {
        return;
    };
    if let Some(raw) = slot.as_str().filter(|s| !s.is_empty()) {
        *slot = Value::String(convert(raw));
    }
}
