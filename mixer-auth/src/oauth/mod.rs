//! OAuth 2.0 authorization code client.
//!
//! Builds authorize URLs, exchanges codes for tokens and calls the provider
//! API with provider-specific client credentials attached.

mod authorization;
mod client;
mod profile;
mod state;
mod token;

pub mod client_auth;

pub use authorization::{build_authorize_url, AuthorizationRequest};
pub use client::{ApiError, OAuthClient};
pub use client_auth::ClientAuth;
pub use profile::UserProfile;
pub use state::{PendingState, StateManager};
pub use token::TokenResponse;
