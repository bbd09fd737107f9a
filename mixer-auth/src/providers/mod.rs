//! Provider configurations.

mod config;

pub use config::{
    mixer_endpoints, ClientAuthMethod, ProviderConfig, ProviderEndpoints,
    DEFAULT_REDIRECT_URI, MIXER_AUTHORIZE_URL, MIXER_SITE_URL, MIXER_TOKEN_URL,
};
