//! Provider-agnostic auth record consumed by the host.

use serde::Serialize;
use serde_json::{Map, Value};

/// Display information about the authenticated user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthInfo {
    pub name: String,
    pub nickname: String,
    pub avatar_url: Option<String>,
}

/// Token material granted by the provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Credentials {
    pub token: String,
    pub refresh_token: Option<String>,
    /// Unix seconds.
    pub expires_at: Option<i64>,
    pub token_type: Option<String>,
    pub expires: bool,
    pub scopes: Vec<String>,
}

/// Raw provider responses, verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extra {
    pub raw_token: Map<String, Value>,
    pub raw_user: Map<String, Value>,
}

/// Final output of a successful callback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedAuthResult {
    pub provider: String,
    pub uid: String,
    pub info: AuthInfo,
    pub credentials: Credentials,
    pub extra: Extra,
}
