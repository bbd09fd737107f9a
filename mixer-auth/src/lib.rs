//! # mixer-auth
//!
//! Login with Mixer for web authentication hosts:
//! - OAuth 2.0 authorization code client bound to Mixer's endpoints
//! - Client credential quirks (`Client-ID` header, secret as a parameter)
//! - A two-phase login strategy that maps token and profile into a
//!   provider-agnostic auth record
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mixer_auth::{
//!     providers::ProviderConfig,
//!     strategy::{FlowContext, MixerStrategy, Strategy, StrategyOptions},
//! };
//!
//! let config = ProviderConfig::mixer(&client_id, &client_secret, &redirect_uri)?;
//! let strategy = MixerStrategy::new(config, StrategyOptions::default())?;
//!
//! let redirect = strategy.handle_login_request(&params);
//! // ... user agent comes back to the callback ...
//! let mut flow = FlowContext::new();
//! let outcome = strategy.handle_callback(&callback_params, &mut flow).await;
//! strategy.cleanup(&mut flow);
//! ```

pub mod error;
pub mod http;
pub mod oauth;
pub mod providers;
pub mod strategy;

// Re-export commonly used types
pub use error::{Error, ErrorKind};
