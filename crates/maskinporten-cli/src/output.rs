use anyhow::Result;
use colored::Colorize;
use maskinporten::TokenResponse;

pub fn print_token(token: &TokenResponse, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(token)?);
    } else {
        println!("{}", token.access_token);
    }
    Ok(())
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg.red());
}
