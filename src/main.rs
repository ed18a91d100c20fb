#![doc = include_str!("../README.md")]

mod api;
mod cli;
mod core;
mod ops;
mod prelude;
mod quantity;
mod tables;

use clap::{Parser, crate_version};

use crate::{
    cli::{Args, Command},
    prelude::*,
};

#[tokio::main]
async fn main() -> Result {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().without_time().compact().init();
    info!(version = crate_version!(), "starting…");

    match Args::parse().command {
        Command::Flow(args) => ops::flow(&args).await?,
        Command::Steer(args) => ops::steer(&args).await?,
        Command::Forecast(args) => ops::forecast(&args).await?,
        Command::Prices(args) => ops::prices(&args).await?,
    }

    info!("done!");
    Ok(())
}
