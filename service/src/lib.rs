use config::Config;
use log::info;
use mixer_auth::http::HttpClientBuilder;
use mixer_auth::oauth::{OAuthClient, StateManager};
use mixer_auth::providers::ProviderConfig;
use mixer_auth::strategy::{MixerStrategy, Strategy, StrategyOptions, StrategyRegistry};
use mixer_auth::error::{config_error, ConfigErrorKind};
use mixer_auth::Error;
use std::sync::Arc;
use std::time::Duration;

pub mod config;
pub mod logging;

/// Resolves configuration into ready-to-use strategies. Runs once at startup.
///
/// Missing credentials or malformed URLs fail here rather than on the first
/// login request.
pub fn init_strategies(config: &Config) -> Result<StrategyRegistry, Error> {
    info!(
        "Mixer strategy config: redirect_uri={}, send_redirect_uri={}, client_auth={}, \
         verify_state={}, http_timeout={}s",
        config.mixer_redirect_uri(),
        config.mixer_send_redirect_uri,
        config.mixer_client_auth,
        config.mixer_verify_state,
        config.http_timeout_secs,
    );

    if config.http_timeout_secs == 0 {
        return Err(config_error(
            ConfigErrorKind::InvalidTimeout,
            "HTTP_TIMEOUT_SECS must be at least 1",
        ));
    }

    let provider_config = ProviderConfig::new(
        &config.mixer_client_id().unwrap_or_default(),
        &config.mixer_client_secret().unwrap_or_default(),
        config.mixer_redirect_uri(),
        config.mixer_endpoints(),
    )?
    .with_send_redirect_uri(config.mixer_send_redirect_uri)
    .with_client_auth(config.mixer_client_auth.into());

    let http_client = HttpClientBuilder::new()
        .with_timeout(Duration::from_secs(config.http_timeout_secs))
        .build()?;

    let options = StrategyOptions {
        uid_field: config.mixer_uid_field.clone(),
        default_scope: config.mixer_default_scope.clone(),
    };

    let mut strategy =
        MixerStrategy::with_client(OAuthClient::new(provider_config, http_client), options);
    if config.mixer_verify_state {
        strategy = strategy.with_state_guard(StateManager::new());
    }

    let mut registry = StrategyRegistry::new();
    registry.register(Arc::new(strategy));

    Ok(registry)
}

// Service-level state shared by every request handler
#[derive(Clone)]
pub struct AppState {
    pub strategies: Arc<StrategyRegistry>,
    pub config: Config,
}

impl AppState {
    pub fn new(app_config: Config, strategies: StrategyRegistry) -> Self {
        Self {
            strategies: Arc::new(strategies),
            config: app_config,
        }
    }

    pub fn strategy(&self, name: &str) -> Option<Arc<dyn Strategy>> {
        self.strategies.get(name)
    }
}
