use anyhow::Context;
use clap::Parser;
use dotenv::dotenv;
use gcal_tools::calendar::{self, CalendarList};
use gcal_tools::AppConfig;
use std::path::PathBuf;

/// Lists the calendars visible to the authorized Google account as JSON.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the OAuth2 client secret downloaded from the Google Cloud console
    #[arg(long, value_name = "FILE", env = "GOOGLE_CREDENTIALS_FILE")]
    credentials_file: Option<PathBuf>,

    /// Path to the cached user credentials; written after the first authorization
    #[arg(long, value_name = "FILE", env = "GOOGLE_TOKEN_FILE")]
    token_file: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    dotenv().ok();

    let cli = Cli::parse();

    let mut config = AppConfig::load().context("loading configuration")?;

    if let Some(credentials_file) = cli.credentials_file {
        config.google.credentials_file = credentials_file;
    }

    if let Some(token_file) = cli.token_file {
        config.google.token_file = token_file;
    }

    let calendars = CalendarList::from_config(&config.google)
        .await
        .context("authorizing with Google Calendar")?
        .fetch_all()
        .await
        .context("listing calendars")?;

    println!("{}", calendar::to_json(&calendars)?);

    Ok(())
}
