//! plexclean - remove Plex collections that fail a label retention policy.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use plexclean::formatter::{format_summary, rule, token_preview};
use plexclean::{Cli, Executor, LinePrompt, MediaServer, PlexClient, RunConfig};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = RunConfig::from_env(&cli)?;

    init_logging(config.debug);

    tracing::info!("PLEX COLLECTION CLEANUP");
    tracing::info!("{}", rule());
    config.log_startup();
    tracing::info!("{}", rule());

    let server = connect(&config)?;

    let confirmer = config.confirm.then(LinePrompt::stdin);
    let mut executor = Executor::new(&config.policy, config.dry_run, confirmer);
    let summary = executor.run(&server).inspect_err(|e| {
        tracing::error!("Critical error during cleanup: {e}");
    })?;

    println!("{}", format_summary(&summary, config.dry_run));
    Ok(())
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `--debug` selects the level and HTTP
/// internals stay at `warn`.
fn init_logging(debug: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if debug {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info,reqwest=warn,hyper_util=warn")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stdout))
        .with(filter)
        .init();

    tracing::debug!("Debug mode enabled - verbose output active");
}

/// Connect to the server, logging identity or troubleshooting tips.
fn connect(config: &RunConfig) -> Result<PlexClient> {
    tracing::info!("PLEX CONNECTION ATTEMPT");
    tracing::info!("Server URL: {}", config.server_url);
    tracing::info!("Token length: {} characters", config.token.chars().count());
    tracing::info!("Token preview: {}", token_preview(&config.token));

    let server = match PlexClient::connect(&config.server_url, &config.token) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("PLEX CONNECTION FAILED: {e}");
            tracing::error!("Troubleshooting tips:");
            tracing::error!("1. Verify server URL is correct and reachable");
            tracing::error!("2. Check if Plex server is running");
            tracing::error!("3. Verify authentication token is valid");
            tracing::error!("4. Ensure network connectivity to Plex server");
            if let Some(hint) = e.hint() {
                tracing::error!("5. {hint}");
            }
            return Err(e.into());
        }
    };

    let identity = server.identity();
    tracing::info!("Successfully connected to Plex server!");
    tracing::info!("Server Name: {}", identity.name);
    tracing::info!("Server Version: {}", identity.version);
    tracing::info!("Server Platform: {}", identity.platform);
    tracing::info!("Server Platform Version: {}", identity.platform_version);

    match server.account_username() {
        Ok(username) => tracing::info!("Authenticated as: {username}"),
        Err(e) => tracing::warn!("Could not get account info: {e}"),
    }

    tracing::info!("Connection verification complete!");
    Ok(server)
}
