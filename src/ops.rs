mod flow;
mod forecast;
mod prices;
mod steer;

use chrono_tz::Tz;

pub use self::{flow::flow, forecast::forecast, prices::prices, steer::steer};
use crate::{api::foxess, cli::FoxEssApiArgs, core::retry, prelude::*};

/// Resolve the plant's local timezone, retrying transient cloud failures.
/// Without a timezone nothing downstream makes sense, so exhausting the
/// retries is fatal for the whole command.
async fn resolve_timezone(api: &foxess::Api, args: &FoxEssApiArgs) -> Result<Tz> {
    let detail = retry::retry(retry::Backoff::default(), || api.get_plant_detail(&args.station_id))
        .await
        .context("could not resolve the plant timezone")?;
    info!(plant = detail.name, timezone = %detail.timezone, "resolved");
    Ok(detail.timezone)
}
