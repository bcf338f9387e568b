use clap::Parser;
use haulboard::args::{Args, Command};
use haulboard::{commands, Config, Mode, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().haulboard_home().path();

    // This allows for testing the program without hitting Google Maps or the dashboard API. When
    // HAULBOARD_IN_TEST_MODE is set and non-zero in length, then the mode will be Mode::Test,
    // otherwise it will be Mode::Live.
    let mode = Mode::from_env();
    debug!("Running in {mode} mode");

    // Route to appropriate command handler
    let _: () = match args.command() {
        Command::Init(init_args) => {
            commands::init(home, init_args.api_url(), init_args.maps_key())
                .await?
                .print()
        }

        Command::Login(login_args) => {
            let config = Config::load(home).await?;
            commands::login(&config, login_args.token(), login_args.expires_in_hours())
                .await?
                .print()
        }

        Command::Logout => commands::logout(&Config::load(home).await?)
            .await?
            .print(),

        Command::Route(route_args) => {
            let config = Config::load(home).await?;
            commands::route(&config, mode, route_args).await?.print()
        }

        Command::Geocode(geocode_args) => {
            let config = Config::load(home).await?;
            commands::geocode(&config, mode, geocode_args.coordinates())
                .await?
                .print()
        }

        Command::Report(report_args) => {
            let config = Config::load(home).await?;
            commands::report(&config, mode, report_args).await?.print()
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
