//! Mixer login strategy.

use async_trait::async_trait;
use log::*;

use super::{
    AuthFailure, AuthInfo, Credentials, Extra, FlowContext, NormalizedAuthResult, Params,
    RedirectInstruction, Strategy,
};
use crate::error::Error;
use crate::http::HttpClientBuilder;
use crate::oauth::{AuthorizationRequest, OAuthClient, StateManager, UserProfile};
use crate::providers::ProviderConfig;

/// API path of the authenticated user's profile.
pub const CURRENT_USER_PATH: &str = "/users/current";

/// Host-tunable strategy behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyOptions {
    /// Profile field used as the uid.
    pub uid_field: String,
    /// Scope requested when the login request does not name one.
    pub default_scope: String,
}

impl Default for StrategyOptions {
    fn default() -> Self {
        Self {
            uid_field: "id".to_string(),
            default_scope: String::new(),
        }
    }
}

/// Strategy for logging in with a Mixer account.
pub struct MixerStrategy {
    client: OAuthClient,
    options: StrategyOptions,
    state_guard: Option<StateManager>,
}

impl MixerStrategy {
    pub const NAME: &'static str = "mixer";

    /// Create a strategy with a default HTTP client.
    pub fn new(config: ProviderConfig, options: StrategyOptions) -> Result<Self, Error> {
        let http_client = HttpClientBuilder::new().build()?;
        Ok(Self::with_client(OAuthClient::new(config, http_client), options))
    }

    /// Create a strategy around an already configured OAuth client.
    pub fn with_client(client: OAuthClient, options: StrategyOptions) -> Self {
        Self {
            client,
            options,
            state_guard: None,
        }
    }

    /// Require callbacks to return a `state` issued by this strategy.
    pub fn with_state_guard(mut self, state_guard: StateManager) -> Self {
        self.state_guard = Some(state_guard);
        self
    }

    pub fn options(&self) -> &StrategyOptions {
        &self.options
    }

    fn normalize(&self, flow: &FlowContext) -> Option<NormalizedAuthResult> {
        Some(NormalizedAuthResult {
            provider: self.name().to_string(),
            uid: self.uid(flow)?,
            info: self.info(flow)?,
            credentials: self.credentials(flow)?,
            extra: self.extra(flow)?,
        })
    }

    /// Returns the host's own state for this flow.
    fn check_state(&self, params: &Params) -> Result<Option<String>, AuthFailure> {
        let Some(guard) = &self.state_guard else {
            return Ok(params.get("state").cloned());
        };

        match params.get("state").and_then(|state| guard.consume(state)) {
            Some(pending) => Ok(pending.passthrough),
            None => {
                warn!("Rejecting Mixer callback with unknown or expired state");
                Err(AuthFailure::csrf_detected())
            }
        }
    }
}

#[async_trait]
impl Strategy for MixerStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn handle_login_request(&self, params: &Params) -> RedirectInstruction {
        let scope = params
            .get("scope")
            .cloned()
            .unwrap_or_else(|| self.options.default_scope.clone());
        let requested_state = params.get("state").map(String::as_str);
        let state = match &self.state_guard {
            Some(guard) => Some(guard.issue(requested_state)),
            None => requested_state.map(str::to_string),
        };

        let request = AuthorizationRequest {
            scope,
            state: state.clone(),
            redirect_uri: self.client.config().redirect_uri().to_string(),
        };

        debug!("Redirecting to Mixer authorization with scope {:?}", request.scope);

        RedirectInstruction {
            location: self.client.authorize_url(&request),
            state,
        }
    }

    async fn handle_callback(
        &self,
        params: &Params,
        flow: &mut FlowContext,
    ) -> Result<NormalizedAuthResult, AuthFailure> {
        let Some(code) = params.get("code").filter(|code| !code.is_empty()) else {
            let provider_error = params
                .get("error_description")
                .or_else(|| params.get("error"))
                .cloned();
            warn!("Mixer callback without code: {:?}", provider_error);
            return Err(AuthFailure::missing_code(provider_error.unwrap_or_else(
                || "authorization code missing from callback".to_string(),
            )));
        };

        flow.set_state(self.check_state(params)?);

        let token = self.client.exchange_code(code, None).await.map_err(|e| {
            warn!("Mixer token exchange failed: {}", e);
            AuthFailure::from(&e)
        })?;

        if token.access_token.is_none() {
            let error = token.provider_error().unwrap_or("invalid_credentials");
            let description = token.provider_error_description().unwrap_or_default();
            return Err(AuthFailure::provider(error, description));
        }

        let profile: UserProfile = match self
            .client
            .authenticated_get(&token, CURRENT_USER_PATH)
            .await
        {
            Ok(profile) => profile,
            Err(e) if e.is_unauthorized() => {
                warn!("Mixer rejected access token: {}", e);
                return Err(AuthFailure::unauthorized());
            }
            Err(e) => {
                warn!("Failed to fetch Mixer user: {}", e);
                return Err(AuthFailure::unknown_api_error());
            }
        };

        flow.store(token, profile);

        let result = self
            .normalize(flow)
            .ok_or_else(AuthFailure::unknown_api_error)?;
        info!("Mixer user {} authenticated", result.uid);
        Ok(result)
    }

    fn uid(&self, flow: &FlowContext) -> Option<String> {
        let profile = flow.profile()?;
        profile.field(&self.options.uid_field).or_else(|| {
            warn!(
                "Mixer profile has no {:?} field, using id as uid",
                self.options.uid_field
            );
            Some(profile.id.clone())
        })
    }

    fn info(&self, flow: &FlowContext) -> Option<AuthInfo> {
        let profile = flow.profile()?;
        Some(AuthInfo {
            name: profile.username.clone(),
            nickname: profile.username.clone(),
            avatar_url: profile.avatar_url.clone(),
        })
    }

    fn credentials(&self, flow: &FlowContext) -> Option<Credentials> {
        let token = flow.token()?;
        Some(Credentials {
            token: token.access_token.clone()?,
            refresh_token: token.refresh_token.clone(),
            expires_at: token.expires_at.map(|at| at.timestamp()),
            token_type: token.token_type.clone(),
            expires: token.expires_at.is_some(),
            scopes: token.scopes(),
        })
    }

    fn extra(&self, flow: &FlowContext) -> Option<Extra> {
        Some(Extra {
            raw_token: flow.token()?.raw_provider_fields.clone(),
            raw_user: flow.profile()?.raw_fields.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderEndpoints;
    use crate::strategy::FailureReason;
    use mockito::{Matcher, Mock, Server, ServerGuard};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    const REDIRECT_URI: &str = "http://localhost:3000/auth/mixer/callback";

    fn config(server_url: &str) -> ProviderConfig {
        let endpoints = ProviderEndpoints {
            site_url: format!("{}/api/v1", server_url),
            authorize_url: format!("{}/oauth/authorize", server_url),
            token_url: format!("{}/api/v1/oauth/token", server_url),
        };
        ProviderConfig::new("cid", "csecret", REDIRECT_URI, endpoints).unwrap()
    }

    fn strategy(server: &ServerGuard) -> MixerStrategy {
        MixerStrategy::new(config(&server.url()), StrategyOptions::default()).unwrap()
    }

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn query(instruction: &RedirectInstruction) -> HashMap<String, String> {
        instruction.location.query_pairs().into_owned().collect()
    }

    async fn mock_token(server: &mut ServerGuard, body: Value) -> Mock {
        server
            .mock("POST", "/api/v1/oauth/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await
    }

    async fn mock_user(server: &mut ServerGuard, status: usize, body: Value) -> Mock {
        server
            .mock("GET", "/api/v1/users/current")
            .match_query(Matcher::Any)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await
    }

    fn alice() -> Value {
        json!({"id": "42", "username": "alice", "avatarUrl": "http://x/a.png"})
    }

    #[tokio::test]
    async fn test_login_request_passes_scope_through() {
        let server = Server::new_async().await;
        let strategy = strategy(&server);

        for scope in ["", "user:details:self", "a,b"] {
            let instruction = strategy.handle_login_request(&params(&[("scope", scope)]));
            assert_eq!(query(&instruction)["scope"], scope);
        }
    }

    #[tokio::test]
    async fn test_login_request_uses_default_scope_and_state() {
        let server = Server::new_async().await;
        let options = StrategyOptions {
            default_scope: "channel:details:self".to_string(),
            ..Default::default()
        };
        let strategy = MixerStrategy::new(config(&server.url()), options).unwrap();

        let instruction = strategy.handle_login_request(&params(&[("state", "abc")]));
        let query = query(&instruction);

        assert_eq!(query["scope"], "channel:details:self");
        assert_eq!(query["state"], "abc");
        assert_eq!(query["client_id"], "cid");
        assert_eq!(query["response_type"], "code");
        assert_eq!(query["redirect_uri"], REDIRECT_URI);
        assert_eq!(instruction.state.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_callback_without_code_makes_no_network_calls() {
        let mut server = Server::new_async().await;
        let mock = server.mock("POST", Matcher::Any).expect(0).create_async().await;
        let strategy = strategy(&server);
        let mut flow = FlowContext::new();

        let failure = strategy
            .handle_callback(&params(&[("state", "abc")]), &mut flow)
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert_eq!(failure.kind(), "missing_code");
        assert!(flow.is_empty());
    }

    #[tokio::test]
    async fn test_callback_with_provider_redirect_error_is_missing_code() {
        let server = Server::new_async().await;
        let strategy = strategy(&server);

        let failure = strategy
            .handle_callback(
                &params(&[("error", "access_denied"), ("error_description", "nope")]),
                &mut FlowContext::new(),
            )
            .await
            .unwrap_err();

        assert_eq!(failure.kind(), "missing_code");
        assert_eq!(failure.message, "nope");
    }

    #[tokio::test]
    async fn test_callback_provider_error() {
        let mut server = Server::new_async().await;
        mock_token(
            &mut server,
            json!({
                "access_token": null,
                "error": "access_denied",
                "error_description": "user declined"
            }),
        )
        .await;
        let user = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let failure = strategy(&server)
            .handle_callback(&params(&[("code", "c")]), &mut FlowContext::new())
            .await
            .unwrap_err();

        user.assert_async().await;
        assert_eq!(
            failure,
            AuthFailure::provider("access_denied", "user declined")
        );
    }

    #[tokio::test]
    async fn test_callback_unauthorized_profile() {
        let mut server = Server::new_async().await;
        mock_token(&mut server, json!({"access_token": "at"})).await;
        mock_user(&mut server, 401, json!({"message": "nope"})).await;

        let failure = strategy(&server)
            .handle_callback(&params(&[("code", "c")]), &mut FlowContext::new())
            .await
            .unwrap_err();

        assert_eq!(failure.kind(), "token");
        assert_eq!(failure.message, "unauthorized");
    }

    #[tokio::test]
    async fn test_callback_other_profile_error() {
        let mut server = Server::new_async().await;
        mock_token(&mut server, json!({"access_token": "at"})).await;
        mock_user(&mut server, 500, json!({"message": "boom"})).await;

        let failure = strategy(&server)
            .handle_callback(&params(&[("code", "c")]), &mut FlowContext::new())
            .await
            .unwrap_err();

        assert_eq!(failure, AuthFailure::unknown_api_error());
        assert_eq!(failure.kind(), "token");
    }

    #[tokio::test]
    async fn test_callback_success() {
        let mut server = Server::new_async().await;
        mock_token(
            &mut server,
            json!({
                "access_token": "at",
                "refresh_token": "rt",
                "token_type": "Bearer",
                "expires_at": 1_700_000_000,
                "scope": "a,b"
            }),
        )
        .await;
        let user = server
            .mock("GET", "/api/v1/users/current")
            .match_header("authorization", "Bearer at")
            .match_header("client-id", "cid")
            .match_query(Matcher::UrlEncoded("client_secret".into(), "csecret".into()))
            .with_status(200)
            .with_body(alice().to_string())
            .create_async()
            .await;

        let strategy = strategy(&server);
        let mut flow = FlowContext::new();
        let result = strategy
            .handle_callback(&params(&[("code", "c")]), &mut flow)
            .await
            .unwrap();

        user.assert_async().await;
        assert_eq!(result.provider, "mixer");
        assert_eq!(result.uid, "42");
        assert_eq!(result.info.name, "alice");
        assert_eq!(result.info.nickname, "alice");
        assert_eq!(result.info.avatar_url.as_deref(), Some("http://x/a.png"));
        assert_eq!(result.credentials.token, "at");
        assert_eq!(result.credentials.refresh_token.as_deref(), Some("rt"));
        assert_eq!(result.credentials.expires_at, Some(1_700_000_000));
        assert!(result.credentials.expires);
        assert_eq!(result.credentials.scopes, vec!["a", "b"]);
        assert_eq!(result.extra.raw_user["username"], "alice");
        assert_eq!(result.extra.raw_token["refresh_token"], "rt");

        assert_eq!(strategy.uid(&flow).as_deref(), Some("42"));
        assert_eq!(strategy.info(&flow), Some(result.info.clone()));
        assert_eq!(strategy.credentials(&flow), Some(result.credentials.clone()));
        assert_eq!(strategy.extra(&flow), Some(result.extra.clone()));
    }

    #[tokio::test]
    async fn test_callback_without_expiry_or_scope() {
        let mut server = Server::new_async().await;
        mock_token(&mut server, json!({"access_token": "at", "scope": ""})).await;
        mock_user(&mut server, 200, alice()).await;

        let result = strategy(&server)
            .handle_callback(&params(&[("code", "c")]), &mut FlowContext::new())
            .await
            .unwrap();

        assert!(!result.credentials.expires);
        assert_eq!(result.credentials.expires_at, None);
        assert_eq!(result.credentials.scopes, vec![""]);
    }

    #[tokio::test]
    async fn test_callback_with_alternate_uid_field() {
        let mut server = Server::new_async().await;
        mock_token(&mut server, json!({"access_token": "at"})).await;
        mock_user(
            &mut server,
            200,
            json!({"id": 42, "username": "alice", "channel": {"id": 7}, "userId": 99}),
        )
        .await;
        let options = StrategyOptions {
            uid_field: "userId".to_string(),
            ..Default::default()
        };
        let strategy = MixerStrategy::new(config(&server.url()), options).unwrap();

        let result = strategy
            .handle_callback(&params(&[("code", "c")]), &mut FlowContext::new())
            .await
            .unwrap();

        assert_eq!(result.uid, "99");
    }

    #[tokio::test]
    async fn test_cleanup_is_idempotent() {
        let mut server = Server::new_async().await;
        mock_token(&mut server, json!({"access_token": "at"})).await;
        mock_user(&mut server, 200, alice()).await;
        let strategy = strategy(&server);
        let mut flow = FlowContext::new();

        strategy
            .handle_callback(&params(&[("code", "c")]), &mut flow)
            .await
            .unwrap();
        assert!(!flow.is_empty());

        strategy.cleanup(&mut flow);
        assert!(flow.is_empty());
        assert_eq!(strategy.uid(&flow), None);
        strategy.cleanup(&mut flow);
        assert!(flow.is_empty());
    }

    #[tokio::test]
    async fn test_state_guard_rejects_unknown_state() {
        let mut server = Server::new_async().await;
        let token = server.mock("POST", Matcher::Any).expect(0).create_async().await;
        let strategy = strategy(&server).with_state_guard(StateManager::new());

        let failure = strategy
            .handle_callback(
                &params(&[("code", "c"), ("state", "forged")]),
                &mut FlowContext::new(),
            )
            .await
            .unwrap_err();

        token.assert_async().await;
        assert_eq!(failure.kind(), "csrf_detected");
    }

    #[tokio::test]
    async fn test_state_guard_accepts_issued_state() {
        let mut server = Server::new_async().await;
        mock_token(&mut server, json!({"access_token": "at"})).await;
        mock_user(&mut server, 200, alice()).await;
        let strategy = strategy(&server).with_state_guard(StateManager::new());

        let instruction = strategy.handle_login_request(&Params::new());
        let state = instruction.state.clone().unwrap();
        assert_eq!(query(&instruction)["state"], state);

        let result = strategy
            .handle_callback(
                &params(&[("code", "c"), ("state", state.as_str())]),
                &mut FlowContext::new(),
            )
            .await
            .unwrap();
        assert_eq!(result.uid, "42");
    }

    #[tokio::test]
    async fn test_state_guard_does_not_trust_host_supplied_state() {
        let mut server = Server::new_async().await;
        mock_token(&mut server, json!({"access_token": "at"})).await;
        mock_user(&mut server, 200, alice()).await;
        let strategy = strategy(&server).with_state_guard(StateManager::new());

        let instruction = strategy.handle_login_request(&params(&[("state", "return-to-home")]));
        let issued = instruction.state.clone().unwrap();
        assert_ne!(issued, "return-to-home");
        assert_eq!(query(&instruction)["state"], issued);

        let failure = strategy
            .handle_callback(
                &params(&[("code", "c"), ("state", "return-to-home")]),
                &mut FlowContext::new(),
            )
            .await
            .unwrap_err();
        assert_eq!(failure.kind(), "csrf_detected");

        let mut flow = FlowContext::new();
        strategy
            .handle_callback(&params(&[("code", "c"), ("state", issued.as_str())]), &mut flow)
            .await
            .unwrap();
        assert_eq!(flow.state(), Some("return-to-home"));
    }

    #[tokio::test]
    async fn test_callback_token_endpoint_timeout() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });

        let http = HttpClientBuilder::new()
            .with_timeout(std::time::Duration::from_secs(1))
            .build()
            .unwrap();
        let strategy = MixerStrategy::with_client(
            OAuthClient::new(config(&base), http),
            StrategyOptions::default(),
        );
        let mut flow = FlowContext::new();

        let failure = strategy
            .handle_callback(&params(&[("code", "c")]), &mut flow)
            .await
            .unwrap_err();

        assert_eq!(failure.reason, FailureReason::Timeout);
        assert_eq!(failure.kind(), "timeout");
        assert!(flow.token().is_none());
    }
}
