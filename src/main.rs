use clap::{Parser, Subcommand};
use log::{error, info};
use mixer_auth::strategy::{FlowContext, MixerStrategy, Params, Strategy};
use service::{config::Config, logging::Logger, AppState};

#[derive(Debug, Parser)]
#[command(author, version, about = "Log in with Mixer from the command line", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the URL that starts a Mixer login
    Authorize {
        /// Comma-separated scopes, defaults to MIXER_DEFAULT_SCOPE
        #[arg(long)]
        scope: Option<String>,
        /// Opaque state echoed back on the callback
        #[arg(long)]
        state: Option<String>,
    },
    /// Complete a login from the callback parameters and print the auth record as JSON
    Callback {
        /// Authorization code from the callback
        #[arg(long)]
        code: Option<String>,
        /// State from the callback
        #[arg(long)]
        state: Option<String>,
    },
}

fn params(pairs: [(&str, Option<String>); 2]) -> Params {
    pairs
        .into_iter()
        .filter_map(|(key, value)| value.map(|value| (key.to_string(), value)))
        .collect()
}

// `authorize` and `callback` run in separate processes, so a state issued by
// one can never be found by the other.
fn check_cli_config(config: &Config) -> Result<(), &'static str> {
    if config.mixer_verify_state {
        return Err("MIXER_VERIFY_STATE needs a long-running host and cannot be used from the CLI");
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = Logger::init_logger(&cli.config) {
        eprintln!("Failed to start logger: {e}");
    }

    if let Err(e) = check_cli_config(&cli.config) {
        error!("{e}");
        std::process::exit(1);
    }

    let strategies = match service::init_strategies(&cli.config) {
        Ok(strategies) => strategies,
        Err(e) => {
            error!("Failed to initialize Mixer strategy: {e}");
            std::process::exit(1);
        }
    };

    let app_state = AppState::new(cli.config, strategies);
    let Some(strategy) = app_state.strategy(MixerStrategy::NAME) else {
        error!("No strategy registered for {}", MixerStrategy::NAME);
        std::process::exit(1);
    };

    match cli.command {
        Command::Authorize { scope, state } => {
            let redirect =
                strategy.handle_login_request(&params([("scope", scope), ("state", state)]));
            println!("{}", redirect.location);
        }
        Command::Callback { code, state } => {
            let mut flow = FlowContext::new();
            let outcome = strategy
                .handle_callback(&params([("code", code), ("state", state)]), &mut flow)
                .await;
            strategy.cleanup(&mut flow);

            match outcome {
                Ok(result) => {
                    info!("Authenticated {} user {}", result.provider, result.uid);
                    match serde_json::to_string_pretty(&result) {
                        Ok(json) => println!("{json}"),
                        Err(e) => {
                            error!("Failed to serialize auth result: {e}");
                            std::process::exit(1);
                        }
                    }
                }
                Err(failure) => {
                    error!("Authentication failed: {failure}");
                    std::process::exit(1);
                }
            }
        }
    }
}
