//! Authorization URL construction.

use url::Url;

use crate::providers::ProviderConfig;

/// Parameters of a single login redirect. Consumed immediately, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    /// Comma-separated permission names, passed through verbatim.
    pub scope: String,
    /// Opaque value the provider echoes back on the callback.
    pub state: Option<String>,
    /// Callback URL the provider redirects to.
    pub redirect_uri: String,
}

/// Build the provider authorization URL for a login request.
///
/// Adds `redirect_uri` (when enabled), `scope`, `state` (when provided),
/// `client_id` and `response_type=code` to the configured authorize URL. No
/// network call is made. Credentials were validated when the config was built,
/// so construction cannot fail here.
pub fn build_authorize_url(config: &ProviderConfig, request: &AuthorizationRequest) -> Url {
    let mut url = config.authorize_url().clone();

    {
        let mut query = url.query_pairs_mut();
        if config.send_redirect_uri() {
            query.append_pair("redirect_uri", &request.redirect_uri);
        }
        query.append_pair("scope", &request.scope);
        if let Some(state) = &request.state {
            query.append_pair("state", state);
        }
        query
            .append_pair("client_id", config.client_id())
            .append_pair("response_type", "code");
    }

    url
}
