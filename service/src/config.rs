use clap::builder::TypedValueParser as _;
use clap::{Parser, ValueEnum};
use dotenvy::dotenv;
use log::LevelFilter;
use mixer_auth::providers::{
    ClientAuthMethod, ProviderEndpoints, DEFAULT_REDIRECT_URI, MIXER_AUTHORIZE_URL,
    MIXER_SITE_URL, MIXER_TOKEN_URL,
};
use std::fmt;

/// How the OAuth client presents its credentials to Mixer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ClientAuth {
    /// `Client-ID` header plus `client_secret` parameter.
    Header,
    /// HTTP Basic on the token endpoint.
    Basic,
}

impl fmt::Display for ClientAuth {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ClientAuth::Header => write!(f, "header"),
            ClientAuth::Basic => write!(f, "basic"),
        }
    }
}

impl From<ClientAuth> for ClientAuthMethod {
    fn from(client_auth: ClientAuth) -> Self {
        match client_auth {
            ClientAuth::Header => ClientAuthMethod::ClientIdHeader,
            ClientAuth::Basic => ClientAuthMethod::Basic,
        }
    }
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// The OAuth client ID issued by Mixer.
    #[arg(long, env)]
    mixer_client_id: Option<String>,

    /// The OAuth client secret issued by Mixer.
    #[arg(long, env, hide_env_values = true)]
    mixer_client_secret: Option<String>,

    /// The callback URL Mixer redirects the user agent to after consent.
    #[arg(long, env, default_value = DEFAULT_REDIRECT_URI)]
    mixer_redirect_uri: String,

    /// The Mixer REST API root. Override in tests to point at a mock server.
    #[arg(long, env, default_value = MIXER_SITE_URL)]
    mixer_site_url: String,

    /// The Mixer authorization endpoint.
    #[arg(long, env, default_value = MIXER_AUTHORIZE_URL)]
    mixer_authorize_url: String,

    /// The Mixer token endpoint.
    #[arg(long, env, default_value = MIXER_TOKEN_URL)]
    mixer_token_url: String,

    /// Profile field used as the authenticated user's uid.
    #[arg(long, env, default_value = "id")]
    pub mixer_uid_field: String,

    /// Comma-separated scopes requested when a login request names none.
    #[arg(long, env, default_value = "")]
    pub mixer_default_scope: String,

    /// Include `redirect_uri` in the authorize and token requests.
    #[arg(long, env, default_value_t = true, action = clap::ArgAction::Set)]
    pub mixer_send_redirect_uri: bool,

    /// How client credentials are sent to Mixer.
    #[arg(long, env, value_enum, default_value_t = ClientAuth::Header)]
    pub mixer_client_auth: ClientAuth,

    /// Reject callbacks whose `state` was not issued by this process.
    #[arg(long, env, default_value_t = false, action = clap::ArgAction::Set)]
    pub mixer_verify_state: bool,

    /// Timeout in seconds for each request to Mixer
    #[arg(long, env, default_value_t = 5)]
    pub http_timeout_secs: u64,

    /// Set the log level verbosity threshold (level) to control what gets displayed on
    /// console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(
            ["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"],
        )
        .map(|s| s.parse::<LevelFilter>().unwrap_or(LevelFilter::Info)),
        )]
    pub log_level_filter: LevelFilter,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    pub fn mixer_client_id(&self) -> Option<String> {
        self.mixer_client_id.clone()
    }

    pub fn mixer_client_secret(&self) -> Option<String> {
        self.mixer_client_secret.clone()
    }

    pub fn mixer_redirect_uri(&self) -> &str {
        &self.mixer_redirect_uri
    }

    pub fn set_mixer_endpoints(mut self, endpoints: ProviderEndpoints) -> Self {
        self.mixer_site_url = endpoints.site_url;
        self.mixer_authorize_url = endpoints.authorize_url;
        self.mixer_token_url = endpoints.token_url;
        self
    }

    /// Returns the configured Mixer endpoint URLs.
    pub fn mixer_endpoints(&self) -> ProviderEndpoints {
        ProviderEndpoints {
            site_url: self.mixer_site_url.clone(),
            authorize_url: self.mixer_authorize_url.clone(),
            token_url: self.mixer_token_url.clone(),
        }
    }
}
