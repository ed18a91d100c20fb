use chrono::Utc;

use crate::{
    api::{foxess, pse},
    cli::PricesArgs,
    core::prices::{charging_window, select_charge_hour},
    ops::resolve_timezone,
    prelude::*,
    tables::build_prices_table,
};

#[instrument(skip_all)]
pub async fn prices(args: &PricesArgs) -> Result {
    let fox_ess = foxess::Api::new(args.fox_ess_api.api_key.clone())?;
    let timezone = resolve_timezone(&fox_ess, &args.fox_ess_api).await?;
    let date =
        args.date.unwrap_or_else(|| Utc::now().with_timezone(&timezone).date_naive());

    let prices = pse::Api::new()?.get_day_ahead_prices(date).await?;
    let window = charging_window(&prices, date, &timezone);
    println!("{}", build_prices_table(&window, &timezone));

    match select_charge_hour(&window, &timezone) {
        Ok(hour) => info!(hour, "cheap charging would start"),
        Err(error) => warn!(%error, "no charge hour for this day"),
    }
    Ok(())
}
