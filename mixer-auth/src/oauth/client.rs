//! OAuth2 client bound to one provider's endpoints and credential quirks.

use std::fmt;
use std::sync::Arc;

use log::*;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use url::Url;

use super::authorization::{build_authorize_url, AuthorizationRequest};
use super::client_auth::{self, ClientAuth};
use super::token::TokenResponse;
use crate::error::{oauth_error, Error, ErrorKind, OAuthErrorKind};
use crate::providers::ProviderConfig;

/// Non-2xx or transport failure from a provider API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status, `None` when the request never got a response.
    pub status_code: Option<u16>,
    pub body: String,
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        self.status_code == Some(StatusCode::UNAUTHORIZED.as_u16())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.status_code {
            Some(status) => write!(f, "provider API returned {}: {}", status, self.body),
            None => write!(f, "provider API request failed: {}", self.body),
        }
    }
}

impl std::error::Error for ApiError {}

/// OAuth2 client for a single provider.
///
/// Cheap to share across concurrent flows: the configuration is immutable and
/// `reqwest::Client` pools connections internally.
pub struct OAuthClient {
    config: Arc<ProviderConfig>,
    http_client: reqwest::Client,
    auth: Box<dyn ClientAuth>,
}

impl OAuthClient {
    /// Create a client for the given provider configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Resolved provider configuration
    /// * `http_client` - HTTP client carrying the request timeout
    pub fn new(config: ProviderConfig, http_client: reqwest::Client) -> Self {
        let auth = client_auth::for_config(&config);
        Self {
            config: Arc::new(config),
            http_client,
            auth,
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Build the provider authorization URL. No network call is made.
    pub fn authorize_url(&self, request: &AuthorizationRequest) -> Url {
        build_authorize_url(&self.config, request)
    }

    /// Exchange an authorization code for a token.
    ///
    /// An OAuth error reported by the provider in the response body is not an
    /// `Err`: the returned token has no access token and carries
    /// `error`/`error_description` in its raw fields. `Err` is reserved for
    /// transport failures and unparseable responses.
    ///
    /// # Arguments
    ///
    /// * `code` - Authorization code from the callback
    /// * `redirect_uri` - Overrides the configured redirect URI when sent
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: Option<&str>,
    ) -> Result<TokenResponse, Error> {
        let mut form: Vec<(&str, String)> = vec![
            ("grant_type", "authorization_code".to_string()),
            ("code", code.to_string()),
        ];
        if self.config.send_redirect_uri() {
            let redirect_uri = redirect_uri.unwrap_or(self.config.redirect_uri());
            form.push(("redirect_uri", redirect_uri.to_string()));
        }
        form.extend(self.auth.token_form_params());

        debug!("Exchanging authorization code at {}", self.config.token_url());

        let request = self
            .http_client
            .post(self.config.token_url().as_str())
            .header(ACCEPT, "application/json")
            .form(&form);

        let response = self
            .auth
            .authenticate_token_request(request)
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to reach token endpoint: {:?}", e);
                Error::from(e)
            })?;

        let status = response.status();
        let body = response.text().await?;

        let raw: Map<String, Value> = serde_json::from_str(&body).map_err(|e| {
            warn!("Token endpoint returned {} with non-JSON body: {}", status, body);
            Error {
                source: Some(Box::new(e)),
                error_kind: ErrorKind::OAuth(OAuthErrorKind::InvalidResponse),
            }
        })?;

        if !status.is_success() && !raw.contains_key("error") {
            warn!("Token endpoint error {}: {}", status, body);
            return Err(oauth_error(
                OAuthErrorKind::TokenExchangeFailed,
                &format!("token endpoint returned {}", status),
            ));
        }

        let token = TokenResponse::from_raw(raw);
        match token.provider_error() {
            Some(error) => info!("Provider rejected authorization code: {}", error),
            None => info!("Successfully exchanged authorization code for token"),
        }
        Ok(token)
    }

    /// GET a provider API path with the token and client credentials attached.
    ///
    /// Any non-2xx status is returned as an [`ApiError`] so callers can tell
    /// 401 apart from other failures.
    pub async fn authenticated_get<T: DeserializeOwned>(
        &self,
        token: &TokenResponse,
        path: &str,
    ) -> Result<T, ApiError> {
        let Some(access_token) = token.access_token.as_deref() else {
            return Err(ApiError {
                status_code: None,
                body: "no access token".to_string(),
            });
        };

        // Logged before the client credentials are attached to the query.
        let url = self.config.api_url(path);
        debug!("GET {}", url);

        // reqwest errors embed the request URL, which carries the client secret.
        let request = self.http_client.get(&url).bearer_auth(access_token);
        let response = self
            .auth
            .authenticate_api_request(request)
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                warn!("Failed to reach provider API {}: {:?}", url, e);
                ApiError {
                    status_code: None,
                    body: e.to_string(),
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ApiError {
            status_code: Some(status.as_u16()),
            body: e.without_url().to_string(),
        })?;

        if !status.is_success() {
            return Err(ApiError {
                status_code: Some(status.as_u16()),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            warn!("Failed to parse response from {}: {}", url, e);
            ApiError {
                status_code: Some(status.as_u16()),
                body,
            }
        })
    }
}
