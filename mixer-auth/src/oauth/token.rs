//! Token exchange response.

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::{Map, Value};

/// Parsed token endpoint response.
///
/// Owned by the callback phase and discarded once the normalized result is
/// produced. `raw_provider_fields` keeps the response verbatim, including
/// `error`/`error_description` when the provider reports an error in-band.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_type: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub scope: Option<String>,
    pub raw_provider_fields: Map<String, Value>,
}

impl TokenResponse {
    /// Parse a raw token endpoint JSON object.
    pub fn from_raw(raw: Map<String, Value>) -> Self {
        Self::from_raw_at(raw, Utc::now())
    }

    /// Parse a raw token response, resolving `expires_in` relative to `now`.
    ///
    /// An explicit `expires_at` (unix seconds) wins over `expires_in`. A
    /// lifetime that overflows the calendar is treated as no expiry.
    pub fn from_raw_at(raw: Map<String, Value>, now: DateTime<Utc>) -> Self {
        let expires_at = raw
            .get("expires_at")
            .and_then(value_as_i64)
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .or_else(|| {
                raw.get("expires_in")
                    .and_then(value_as_i64)
                    .and_then(TimeDelta::try_seconds)
                    .and_then(|lifetime| now.checked_add_signed(lifetime))
            });

        Self {
            access_token: string_field(&raw, "access_token"),
            refresh_token: string_field(&raw, "refresh_token"),
            token_type: string_field(&raw, "token_type"),
            expires_at,
            scope: string_field(&raw, "scope"),
            raw_provider_fields: raw,
        }
    }

    /// Provider error code reported in-band, e.g. `access_denied`.
    pub fn provider_error(&self) -> Option<&str> {
        self.raw_provider_fields.get("error").and_then(Value::as_str)
    }

    /// Human readable description accompanying [`Self::provider_error`].
    pub fn provider_error_description(&self) -> Option<&str> {
        self.raw_provider_fields
            .get("error_description")
            .and_then(Value::as_str)
    }

    /// Granted scopes: the returned `scope` split on commas.
    ///
    /// An empty or missing scope yields a single empty string.
    pub fn scopes(&self) -> Vec<String> {
        self.scope
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::to_string)
            .collect()
    }
}

fn string_field(raw: &Map<String, Value>, key: &str) -> Option<String> {
    raw.get(key).and_then(Value::as_str).map(str::to_string)
}

// Providers send lifetimes as numbers or numeric strings.
fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
