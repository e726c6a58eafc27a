//! unifetch CLI
//!
//! Local entry point: runs a scrape against the university portals and
//! prints the result envelope as pretty JSON on stdout. Logs go to stderr.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use unifetch::{
    error::{Result, ScrapeError},
    fetch::Fetcher,
    models::{Config, Credential, ScrapeResult},
};

/// unifetch - University Portal Fetcher
#[derive(Parser, Debug)]
#[command(
    name = "unifetch",
    version,
    about = "Fetches grades, deadlines and enrolled courses from university portals"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the exam grade report
    Grades {
        #[command(flatten)]
        account: AccountArgs,

        /// Bypass the cache and scrape fresh
        #[arg(long)]
        force_refresh: bool,
    },

    /// Fetch due activities from the learning platform
    Deadlines {
        #[command(flatten)]
        account: AccountArgs,
    },

    /// Fetch enrolled courses from the course registry
    Classes {
        #[command(flatten)]
        account: AccountArgs,
    },

    /// Fetch deadlines and courses in one combined pass
    Overview {
        #[command(flatten)]
        account: AccountArgs,

        /// Bypass the cache and scrape fresh
        #[arg(long)]
        force_refresh: bool,
    },

    /// Validate the configuration file
    Validate,
}

#[derive(Args, Debug)]
struct AccountArgs {
    /// University account name
    #[arg(short, long)]
    username: String,

    /// Account password. Falls back to the UNIFETCH_PASSWORD environment
    /// variable so it can stay out of the shell history.
    #[arg(short, long)]
    password: Option<String>,

    /// Base32 TOTP seed for accounts with a second factor enrolled.
    /// Falls back to UNIFETCH_TOTP_SEED.
    #[arg(long)]
    totp_seed: Option<String>,
}

impl AccountArgs {
    fn into_credential(self) -> Result<Credential> {
        let password = self
            .password
            .or_else(|| std::env::var("UNIFETCH_PASSWORD").ok())
            .ok_or_else(|| {
                ScrapeError::config("password required (--password or UNIFETCH_PASSWORD)")
            })?;
        let mut credential = Credential::new(self.username, password);
        if let Some(seed) = self
            .totp_seed
            .or_else(|| std::env::var("UNIFETCH_TOTP_SEED").ok())
        {
            credential = credential.with_totp_seed(seed);
        }
        Ok(credential)
    }
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Print the envelope and exit nonzero on scrape failure.
fn print_result<T: Serialize>(result: &ScrapeResult<T>) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("unifetch starting...");
    let config = Config::load_or_default(&cli.config);
    log::debug!("Configuration source: {}", cli.config.display());

    match cli.command {
        Command::Grades {
            account,
            force_refresh,
        } => {
            config.validate()?;
            let credential = account.into_credential()?;
            let result = Fetcher::new(config)
                .fetch_grades(&credential, force_refresh)
                .await;
            print_result(&result)?;
        }

        Command::Deadlines { account } => {
            config.validate()?;
            let credential = account.into_credential()?;
            let result = Fetcher::new(config).fetch_deadlines(&credential).await;
            print_result(&result)?;
        }

        Command::Classes { account } => {
            config.validate()?;
            let credential = account.into_credential()?;
            let result = Fetcher::new(config).fetch_classes(&credential).await;
            print_result(&result)?;
        }

        Command::Overview {
            account,
            force_refresh,
        } => {
            config.validate()?;
            let credential = account.into_credential()?;
            let result = Fetcher::new(config)
                .fetch_overview(&credential, force_refresh)
                .await;
            print_result(&result)?;
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            // Unlike the scrape commands this must not fall back to
            // defaults, an unreadable file is exactly what it reports.
            let config = Config::load(&cli.config).inspect_err(|e| {
                log::error!("Config load failed: {e}");
            })?;
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {e}");
                return Err(e);
            }
            log::info!("✓ Config OK (driver, portals, cache, diagnostics)");
        }
    }

    log::info!("Done!");

    Ok(())
}
