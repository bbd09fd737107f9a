//! Authentication strategies.
//!
//! A strategy drives one provider through the host's login lifecycle:
//!
//! 1. [`Strategy::handle_login_request`] turns incoming parameters into a
//!    redirect to the provider.
//! 2. [`Strategy::handle_callback`] exchanges the returned code, fetches the
//!    user and produces a [`NormalizedAuthResult`] or an [`AuthFailure`].
//! 3. [`Strategy::cleanup`] discards the flow's working state.
//!
//! Strategies are shared across concurrent requests and hold no per-request
//! fields. Working state lives in a [`FlowContext`] owned by the caller.

use std::collections::HashMap;

use async_trait::async_trait;
use url::Url;

use crate::oauth::{TokenResponse, UserProfile};

mod failure;
mod mixer;
mod registry;
mod result;

pub use failure::{AuthFailure, FailureReason};
pub use mixer::{MixerStrategy, StrategyOptions, CURRENT_USER_PATH};
pub use registry::StrategyRegistry;
pub use result::{AuthInfo, Credentials, Extra, NormalizedAuthResult};

/// Query parameters of an incoming login or callback request.
pub type Params = HashMap<String, String>;

/// Tells the host where to send the user agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectInstruction {
    pub location: Url,
    /// State sent to the provider, if any. With a state guard this is the
    /// issued token, not the host's own state.
    pub state: Option<String>,
}

/// Working state of a single login flow.
#[derive(Debug, Default)]
pub struct FlowContext {
    token: Option<TokenResponse>,
    profile: Option<UserProfile>,
    state: Option<String>,
}

impl FlowContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&mut self, token: TokenResponse, profile: UserProfile) {
        self.token = Some(token);
        self.profile = Some(profile);
    }

    pub fn token(&self) -> Option<&TokenResponse> {
        self.token.as_ref()
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    /// State the host passed to the login request, recovered on the callback.
    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    pub fn set_state(&mut self, state: Option<String>) {
        self.state = state;
    }

    pub fn is_empty(&self) -> bool {
        self.token.is_none() && self.profile.is_none() && self.state.is_none()
    }

    /// Drop the token, profile and state. Safe to call repeatedly.
    pub fn clear(&mut self) {
        self.token = None;
        self.profile = None;
        self.state = None;
    }
}

/// Host-facing contract implemented once per provider.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Provider name the host routes on, e.g. `mixer`.
    fn name(&self) -> &str;

    /// Build the redirect that starts a login.
    fn handle_login_request(&self, params: &Params) -> RedirectInstruction;

    /// Complete a login from the provider's callback parameters.
    ///
    /// On success the token and profile are left in `flow` for the accessors
    /// below until [`Strategy::cleanup`] is called.
    async fn handle_callback(
        &self,
        params: &Params,
        flow: &mut FlowContext,
    ) -> Result<NormalizedAuthResult, AuthFailure>;

    fn uid(&self, flow: &FlowContext) -> Option<String>;

    fn info(&self, flow: &FlowContext) -> Option<AuthInfo>;

    fn credentials(&self, flow: &FlowContext) -> Option<Credentials>;

    fn extra(&self, flow: &FlowContext) -> Option<Extra>;

    /// Discard the flow's working state.
    fn cleanup(&self, flow: &mut FlowContext) {
        flow.clear();
    }
}
