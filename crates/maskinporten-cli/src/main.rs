mod cli;
mod observability;
mod output;
mod settings;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use maskinporten::{Handler, HandlerConfig};
use tokio_util::sync::CancellationToken;

use cli::Cli;
use output::print_error;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    let cli = Cli::parse();

    let config = match settings::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            print_error(&format!("Configuration error: {e:#}"));
            return ExitCode::from(2);
        }
    };

    observability::init_tracing(config.debug);

    let (config_path, _) = settings::resolve_path(cli.config.as_deref());
    tracing::debug!(
        path = %config_path.display(),
        issuer = %config.iss,
        endpoint = %config.token_endpoint,
        "Configuration loaded"
    );

    match run(&cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, config: HandlerConfig) -> Result<()> {
    let mut handler = Handler::new(config);
    handler
        .init()
        .context("Maskinporten handler initialization failed")?;

    if cli.assertion_only {
        let assertion = handler.create_assertion()?;
        tracing::debug!(jti = %assertion.jti(), "Created assertion");
        println!("{}", assertion.as_str());
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let token = handler
        .create_access_token_with_cancel(&cancel)
        .await
        .context("Failed to get access token")?;

    tracing::info!(
        expires_in = token.expires_in,
        scope = %token.scope,
        "Access token received"
    );

    output::print_token(&token, cli.json)
}
