//! Provider endpoint and credential configuration.

use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::{config_error, ConfigErrorKind, Error};

/// Mixer REST API root. API paths such as `/users/current` are appended to it.
pub const MIXER_SITE_URL: &str = "https://mixer.com/api/v1";
/// Mixer authorization endpoint the user agent is redirected to.
pub const MIXER_AUTHORIZE_URL: &str = "https://mixer.com/oauth/authorize";
/// Mixer token endpoint for the authorization code exchange.
pub const MIXER_TOKEN_URL: &str = "https://mixer.com/api/v1/oauth/token";
/// Callback URL used when the host does not configure one.
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:3000/auth/mixer/callback";

/// How client credentials are presented to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientAuthMethod {
    /// `Client-ID` header on every call, credentials as token form fields and
    /// `client_secret` as an API query parameter (Mixer).
    #[default]
    ClientIdHeader,
    /// Standard HTTP Basic authentication on the token request.
    Basic,
}

/// Endpoint URLs of an OAuth2 provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoints {
    pub site_url: String,
    pub authorize_url: String,
    pub token_url: String,
}

/// Get the Mixer endpoints.
pub fn mixer_endpoints() -> ProviderEndpoints {
    ProviderEndpoints {
        site_url: MIXER_SITE_URL.to_string(),
        authorize_url: MIXER_AUTHORIZE_URL.to_string(),
        token_url: MIXER_TOKEN_URL.to_string(),
    }
}

/// Resolved provider configuration. Immutable once constructed.
#[derive(Debug)]
pub struct ProviderConfig {
    client_id: String,
    client_secret: SecretString,
    site_url: Url,
    authorize_url: Url,
    token_url: Url,
    redirect_uri: Url,
    send_redirect_uri: bool,
    client_auth: ClientAuthMethod,
}

impl ProviderConfig {
    /// Validate and build a provider configuration.
    ///
    /// # Arguments
    ///
    /// * `client_id` - OAuth client ID, must be non-empty
    /// * `client_secret` - OAuth client secret, must be non-empty
    /// * `redirect_uri` - Callback URL registered with the provider
    /// * `endpoints` - Provider endpoint URLs
    pub fn new(
        client_id: &str,
        client_secret: &str,
        redirect_uri: &str,
        endpoints: ProviderEndpoints,
    ) -> Result<Self, Error> {
        if client_id.trim().is_empty() {
            return Err(config_error(
                ConfigErrorKind::MissingClientId,
                "client_id must be a non-empty string",
            ));
        }
        if client_secret.trim().is_empty() {
            return Err(config_error(
                ConfigErrorKind::MissingClientSecret,
                "client_secret must be a non-empty string",
            ));
        }

        Ok(Self {
            client_id: client_id.to_string(),
            client_secret: SecretString::new(client_secret.to_string()),
            site_url: Url::parse(&endpoints.site_url)?,
            authorize_url: Url::parse(&endpoints.authorize_url)?,
            token_url: Url::parse(&endpoints.token_url)?,
            redirect_uri: Url::parse(redirect_uri)?,
            send_redirect_uri: true,
            client_auth: ClientAuthMethod::default(),
        })
    }

    /// Mixer configuration with the default endpoints.
    pub fn mixer(client_id: &str, client_secret: &str, redirect_uri: &str) -> Result<Self, Error> {
        Self::new(client_id, client_secret, redirect_uri, mixer_endpoints())
    }

    /// Control whether `redirect_uri` is sent on the authorize and token requests.
    pub fn with_send_redirect_uri(mut self, send_redirect_uri: bool) -> Self {
        self.send_redirect_uri = send_redirect_uri;
        self
    }

    /// Set how client credentials are presented to the provider.
    pub fn with_client_auth(mut self, client_auth: ClientAuthMethod) -> Self {
        self.client_auth = client_auth;
        self
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        self.client_secret.expose_secret()
    }

    pub fn site_url(&self) -> &Url {
        &self.site_url
    }

    pub fn authorize_url(&self) -> &Url {
        &self.authorize_url
    }

    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    pub fn redirect_uri(&self) -> &str {
        self.redirect_uri.as_str()
    }

    pub fn send_redirect_uri(&self) -> bool {
        self.send_redirect_uri
    }

    pub fn client_auth(&self) -> ClientAuthMethod {
        self.client_auth
    }

    /// Absolute URL for an API path relative to the site URL.
    ///
    /// The site URL may carry a path prefix (`/api/v1`), so the path is
    /// appended rather than resolved.
    pub fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.site_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
