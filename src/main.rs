mod callback;
mod commands;
mod config;
mod domain;
mod error;
mod lastfm_rs;
mod logging;
mod ports;
mod secrets;
mod services;
mod session;
mod spotify_rs;
#[cfg(test)]
mod test_utils;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args as ClapArgs, Parser, Subcommand};
use color_eyre::{Result, eyre::Context};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::{
    callback::HttpCallbackProvider,
    commands::pagination::Pagination,
    config::Config,
    logging::setup_logging,
    secrets::{SecretsLoader, TomlSecretsLoader},
    services::{available_services, spotify::Spotify},
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Sync loved tracks between music services", long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, env = "LOVESYNC_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Console log level (default: off)
    #[arg(long, default_value = "off", global = true, env = "LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// File log level (default: debug)
    #[arg(long, default_value = "debug", global = true)]
    log_file_level: log::LevelFilter,

    /// Path to log file
    #[arg(long, env = "LOVESYNC_LOG_FILE", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ClapArgs, Debug)]
struct PageArgs {
    /// Number of tracks per page. 0 walks every page, 50 tracks at a time
    #[arg(short, long, default_value_t = 10)]
    limit: u32,

    /// Page number to start from
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    page: u32,
}

impl PageArgs {
    fn pagination(&self) -> Pagination {
        Pagination::new(self.limit, self.page)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Log in on a service
    Login {
        /// The service to log in on
        service: String,

        /// Authorization code, read from the OAuth redirect when omitted
        code: Option<String>,
    },
    /// List loved tracks on a service
    List {
        /// The service to read loved tracks from
        service: String,

        #[command(flatten)]
        pages: PageArgs,
    },
    /// Love tracks loved on one service on another one
    Sync {
        /// The service to read loved tracks from
        source: String,

        /// The service to love the tracks on
        target: String,

        #[command(flatten)]
        pages: PageArgs,
    },
    /// Show the login state of every service
    Status,
    /// Create a Discover Daily playlist from Spotify recommendations
    Daily,
    /// Back up this week's Spotify Discover Weekly playlist
    Dump,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    setup_logging(args.log_level, args.log_file.clone(), args.log_file_level)?;

    log::debug!("Loading configuration");
    let config = {
        if let Some(config) = &args.config {
            Config::from_file(config)
        } else {
            Config::load()
        }
    }
    .wrap_err("Failed to load lovesync config")?;

    log::debug!("Reading secrets from {}", config.secrets_path().display());
    let secrets_loader: Arc<dyn SecretsLoader> =
        Arc::new(TomlSecretsLoader::new(config.secrets_path()));
    let mut out = std::io::stdout();

    match args.command {
        Commands::Login { service, code } => {
            let loader = available_services(secrets_loader);
            let callback = HttpCallbackProvider::new(config.redirect_url());
            commands::login::login(
                &loader,
                &callback,
                config.redirect_url(),
                &service,
                code,
                &mut out,
            )
            .await?;
        }
        Commands::List { service, pages } => {
            let loader = available_services(secrets_loader);
            commands::list::list(&loader, &service, pages.pagination(), &mut out).await?;
        }
        Commands::Sync {
            source,
            target,
            pages,
        } => {
            let loader = available_services(secrets_loader);
            commands::sync::sync(&loader, &source, &target, pages.pagination(), &mut out).await?;
        }
        Commands::Status => {
            let loader = available_services(secrets_loader);
            commands::status::status(&loader, &mut out).await?;
        }
        Commands::Daily => {
            let spotify = Spotify::load(secrets_loader.as_ref())?;
            let mut rng = StdRng::from_os_rng();
            commands::daily::daily(spotify, &mut out, &mut rng, chrono::Utc::now().date_naive())
                .await?;
        }
        Commands::Dump => {
            let spotify = Spotify::load(secrets_loader.as_ref())?;
            commands::dump::dump(spotify, &mut out, chrono::Utc::now().date_naive()).await?;
        }
    }

    Ok(())
}
