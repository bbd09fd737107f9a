//! Provider user profile.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{oauth_error, Error, OAuthErrorKind};

/// Current user as returned by `GET /users/current`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub avatar_url: Option<String>,
    /// Full response body, kept verbatim for the host.
    pub raw_fields: Map<String, Value>,
}

impl UserProfile {
    /// Read a top-level field as a string. Numbers and booleans are stringified.
    pub fn field(&self, name: &str) -> Option<String> {
        self.raw_fields.get(name).and_then(scalar_to_string)
    }
}

impl TryFrom<Value> for UserProfile {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(raw_fields) = value else {
            return Err(oauth_error(
                OAuthErrorKind::InvalidResponse,
                "user profile is not a JSON object",
            ));
        };

        let id = raw_fields
            .get("id")
            .and_then(scalar_to_string)
            .ok_or_else(|| oauth_error(OAuthErrorKind::InvalidResponse, "user profile has no id"))?;
        let username = raw_fields
            .get("username")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                oauth_error(OAuthErrorKind::InvalidResponse, "user profile has no username")
            })?;
        let avatar_url = raw_fields
            .get("avatarUrl")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self {
            id,
            username,
            avatar_url,
            raw_fields,
        })
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
