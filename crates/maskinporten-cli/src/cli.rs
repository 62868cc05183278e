use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "maskinporten")]
#[command(about = "Fetch an access token with a JWT-Bearer assertion grant")]
#[command(version)]
pub struct Cli {
    /// Configuration file (YAML, TOML or JSON). Defaults to maskinporten.yaml
    #[arg(short, long, env = "MASKINPORTEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Print the full token response as JSON
    #[arg(long, conflicts_with = "assertion_only")]
    pub json: bool,

    /// Print a signed assertion and exit without contacting the token endpoint
    #[arg(long)]
    pub assertion_only: bool,

    /// Request timeout (e.g. 10s, 1m), overrides the configuration
    #[arg(long, value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,
}
