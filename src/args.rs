//! These structs provide the CLI interface for the haulboard CLI.

use crate::model::{DayKey, DayZone, Month, RecordKind};
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing::level_filters::LevelFilter;

/// haulboard: command-line tools for a trucking company's admin dashboard.
///
/// Sorts the drop-off stops of a job by distance from its pickup point, looks up addresses for
/// coordinates, and prints the daily voucher and payment-voucher reports of a month.
///
/// Distances and addresses come from the Google Maps web services, records come from the
/// dashboard REST API. Set HAULBOARD_IN_TEST_MODE to use built-in sample data instead of either.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and initialize the configuration file.
    ///
    /// This is the first command you should run. Decide what directory you want to store data in
    /// and pass it as --haulboard-home; by default it is $HOME/haulboard. Pass the base URL of the
    /// dashboard API as --api-url and, to use Google Maps, a text file holding your Maps API key
    /// as --maps-key.
    Init(InitArgs),
    /// Store the dashboard API session token.
    Login(LoginArgs),
    /// Forget the dashboard API session token.
    Logout,
    /// Sort drop-off stops by distance from the pickup point.
    Route(RouteArgs),
    /// Look up the address of one or more coordinates.
    Geocode(GeocodeArgs),
    /// Print the daily report of a month for orders, invoices or receipts.
    Report(ReportArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG. See the tracing-subscriber EnvFilter docs.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where haulboard configuration and secrets are held. Defaults to ~/haulboard
    #[arg(long, env = "HAULBOARD_HOME", default_value_t = default_haulboard_home())]
    haulboard_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, haulboard_home: PathBuf) -> Self {
        Self {
            log_level,
            haulboard_home: haulboard_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn haulboard_home(&self) -> &DisplayPath {
        &self.haulboard_home
    }
}

/// (Not shown): Args for the `haulboard init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The base URL of the dashboard REST API, e.g. https://api.example.co.th/v1/
    #[arg(long)]
    api_url: String,

    /// A text file holding your Google Maps API key. It will be copied into the secrets
    /// directory.
    #[arg(long)]
    maps_key: Option<PathBuf>,
}

impl InitArgs {
    pub fn new(api_url: impl Into<String>, maps_key: Option<PathBuf>) -> Self {
        Self {
            api_url: api_url.into(),
            maps_key,
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn maps_key(&self) -> Option<&Path> {
        self.maps_key.as_deref()
    }
}

/// (Not shown): Args for the `haulboard login` command.
#[derive(Debug, Parser, Clone)]
pub struct LoginArgs {
    /// The bearer token issued by the dashboard API.
    #[arg(long, env = "HAULBOARD_TOKEN", hide_env_values = true)]
    token: String,

    /// How long the token is valid for, in hours. Without this the token never expires locally.
    #[arg(long)]
    expires_in_hours: Option<i64>,
}

impl LoginArgs {
    pub fn new(token: impl Into<String>, expires_in_hours: Option<i64>) -> Self {
        Self {
            token: token.into(),
            expires_in_hours,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn expires_in_hours(&self) -> Option<i64> {
        self.expires_in_hours
    }
}

/// (Not shown): Args for the `haulboard route` command.
#[derive(Debug, Parser, Clone)]
pub struct RouteArgs {
    /// The pickup point, as "lat,lng" or "address,lat,lng".
    #[arg(long, requires = "stop", conflicts_with = "orders")]
    origin: Option<String>,

    /// A drop-off point, as "lat,lng" or "address,lat,lng". Repeat for each stop.
    #[arg(long)]
    stop: Vec<String>,

    /// A JSON file holding an array of orders: {"id", "origin", "stops"}.
    #[arg(long)]
    orders: Option<PathBuf>,

    /// Look up addresses for stops that only have a coordinate.
    #[arg(long)]
    label: bool,
}

impl RouteArgs {
    pub fn new(
        origin: Option<String>,
        stop: Vec<String>,
        orders: Option<PathBuf>,
        label: bool,
    ) -> Self {
        Self {
            origin,
            stop,
            orders,
            label,
        }
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    pub fn stops(&self) -> &[String] {
        &self.stop
    }

    pub fn orders(&self) -> Option<&Path> {
        self.orders.as_deref()
    }

    pub fn label(&self) -> bool {
        self.label
    }
}

/// (Not shown): Args for the `haulboard geocode` command.
#[derive(Debug, Parser, Clone)]
pub struct GeocodeArgs {
    /// Coordinates to look up, each as "lat,lng".
    #[arg(required = true)]
    coordinates: Vec<String>,
}

impl GeocodeArgs {
    pub fn new(coordinates: Vec<String>) -> Self {
        Self { coordinates }
    }

    pub fn coordinates(&self) -> &[String] {
        &self.coordinates
    }
}

/// (Not shown): Args for the `haulboard report` command.
#[derive(Debug, Parser, Clone)]
pub struct ReportArgs {
    /// The month to report on, as YYYY-MM.
    #[arg(long)]
    month: Month,

    /// Which records to report on: orders, invoices or receipts.
    #[arg(long, default_value_t = RecordKind::Orders)]
    section: RecordKind,

    /// Also print the records of this day, as YYYY-MM-DD.
    #[arg(long)]
    day: Option<DayKey>,

    /// The timezone used to cut records into days: local, utc or an offset like +07:00.
    /// Defaults to the day_zone in config.json.
    #[arg(long)]
    day_zone: Option<DayZone>,

    /// Read the records from this JSON file instead of the dashboard API.
    #[arg(long)]
    input: Option<PathBuf>,

    /// A record id to select. Repeat to select several; the selected total is printed.
    #[arg(long)]
    select: Vec<String>,

    /// Toggle every record of the month into (or out of) the selection.
    #[arg(long)]
    select_all: bool,

    /// How many times to retry a failed fetch.
    #[arg(long, default_value_t = 0)]
    retries: u32,
}

impl ReportArgs {
    pub fn new(month: Month, section: RecordKind) -> Self {
        Self {
            month,
            section,
            day: None,
            day_zone: None,
            input: None,
            select: Vec::new(),
            select_all: false,
            retries: 0,
        }
    }

    pub fn with_day(mut self, day: DayKey) -> Self {
        self.day = Some(day);
        self
    }

    pub fn with_day_zone(mut self, zone: DayZone) -> Self {
        self.day_zone = Some(zone);
        self
    }

    pub fn with_input(mut self, input: impl Into<PathBuf>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn with_select(mut self, ids: Vec<String>, select_all: bool) -> Self {
        self.select = ids;
        self.select_all = select_all;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn month(&self) -> Month {
        self.month
    }

    pub fn section(&self) -> RecordKind {
        self.section
    }

    pub fn day(&self) -> Option<DayKey> {
        self.day
    }

    pub fn day_zone(&self) -> Option<DayZone> {
        self.day_zone
    }

    pub fn input(&self) -> Option<&Path> {
        self.input.as_deref()
    }

    pub fn select(&self) -> &[String] {
        &self.select
    }

    pub fn select_all(&self) -> bool {
        self.select_all
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }
}

fn default_haulboard_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("haulboard"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --haulboard-home or HAULBOARD_HOME instead of relying on the \
                default haulboard home directory. If you continue using the program right now, \
                you may have problems!",
            );
            PathBuf::from("haulboard")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_report_args() {
        let args = Args::try_parse_from([
            "haulboard",
            "--haulboard-home",
            "/tmp/hb",
            "report",
            "--month",
            "2024-03",
            "--section",
            "receipts",
            "--day",
            "2024-03-01",
            "--day-zone",
            "+07:00",
            "--select",
            "a",
            "--select",
            "b",
        ])
        .unwrap();
        assert_eq!(args.common().haulboard_home().path(), Path::new("/tmp/hb"));
        let Command::Report(report) = args.command() else {
            panic!("expected the report command");
        };
        assert_eq!(report.month(), Month::new(2024, 3).unwrap());
        assert_eq!(report.section(), RecordKind::Receipts);
        assert_eq!(report.day().unwrap().to_string(), "2024-03-01");
        assert_eq!(report.day_zone().unwrap().to_string(), "+07:00");
        assert_eq!(report.select(), ["a", "b"]);
        assert_eq!(report.retries(), 0);
    }

    #[test]
    fn test_route_origin_requires_stops() {
        let result = Args::try_parse_from(["haulboard", "route", "--origin", "13.5,100.6"]);
        assert!(result.is_err());
    }
}
