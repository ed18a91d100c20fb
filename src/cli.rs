use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compute and print the reconciled energy flow for one day.
    Flow(FlowArgs),

    /// Run the steering daemon: watch the telemetry and switch the inverter
    /// work mode around the cheap charging window.
    Steer(SteerArgs),

    /// Compare the PV production forecast with the measured production.
    Forecast(ForecastArgs),

    /// Fetch the day-ahead prices and show the selected charge hour.
    Prices(PricesArgs),
}

#[derive(Parser)]
pub struct FoxEssApiArgs {
    #[clap(long = "api-key", env = "FOXESS_API_KEY")]
    pub api_key: String,

    #[clap(long, alias = "serial", env = "FOXESS_SERIAL_NUMBER")]
    pub serial_number: String,

    /// Plant (station) identifier, used to resolve the local timezone.
    #[clap(long, env = "FOXESS_STATION_ID")]
    pub station_id: String,
}

#[derive(Parser)]
pub struct SolcastArgs {
    #[clap(long = "solcast-api-key", env = "SOLCAST_API_KEY")]
    pub api_key: String,

    #[clap(long = "solcast-site-id", env = "SOLCAST_SITE_ID")]
    pub site_id: String,
}

#[derive(Parser)]
pub struct FlowArgs {
    #[clap(flatten)]
    pub fox_ess_api: FoxEssApiArgs,

    /// Local date, defaults to today.
    #[clap(long)]
    pub date: Option<NaiveDate>,
}

#[derive(Parser)]
pub struct SteerArgs {
    #[clap(flatten)]
    pub fox_ess_api: FoxEssApiArgs,

    #[clap(flatten)]
    pub solcast: SolcastArgs,

    /// Decision loop polling interval in seconds.
    #[clap(long, default_value = "30", env = "POLLING_INTERVAL_SECS")]
    pub polling_interval_secs: u64,

    /// Do not push work mode changes to the cloud (dry run).
    #[clap(long)]
    pub scout: bool,
}

#[derive(Parser)]
pub struct ForecastArgs {
    #[clap(flatten)]
    pub fox_ess_api: FoxEssApiArgs,

    #[clap(flatten)]
    pub solcast: SolcastArgs,
}

#[derive(Parser)]
pub struct PricesArgs {
    #[clap(flatten)]
    pub fox_ess_api: FoxEssApiArgs,

    /// Business date, defaults to today.
    #[clap(long)]
    pub date: Option<NaiveDate>,
}
