use chrono::{NaiveTime, TimeDelta, Utc};

use crate::{
    api::{foxess, solcast},
    cli::ForecastArgs,
    core::{flow::Channel, forecast::hourly_energy, interval::Interval},
    ops::resolve_timezone,
    prelude::*,
    quantity::energy::KilowattHours,
    tables::build_forecast_table,
};

#[instrument(skip_all)]
pub async fn forecast(args: &ForecastArgs) -> Result {
    let fox_ess = foxess::Api::new(args.fox_ess_api.api_key.clone())?;
    let timezone = resolve_timezone(&fox_ess, &args.fox_ess_api).await?;
    let now = Utc::now().with_timezone(&timezone);
    let date = now.date_naive();

    let estimates =
        solcast::Api::new(args.solcast.api_key.clone())?.get_forecasts(&args.solcast.site_id).await?;
    let forecast = hourly_energy(&estimates, date, &timezone);

    let window_start = date.and_time(NaiveTime::MIN);
    let window = Interval::new(
        window_start
            .and_local_timezone(timezone)
            .earliest()
            .with_context(|| format!("no midnight in `{timezone}` on {date}"))?,
        now,
    );
    let series = fox_ess
        .get_history(&args.fox_ess_api.serial_number, &[Channel::Pv], &window)
        .await?
        .remove(&Channel::Pv)
        .context("the PV channel is missing from the history")?
        .with_zero_anchor();

    // Hour buckets use no grace: the bucket must not borrow the interval
    // straddling its start from the previous hour.
    let mut actual = [KilowattHours::ZERO; 24];
    for (hour, energy) in actual.iter_mut().enumerate() {
        let start = window_start + TimeDelta::hours(i64::try_from(hour)?);
        let end = start + TimeDelta::minutes(59) + TimeDelta::seconds(59);
        *energy = series.energy(start, end, TimeDelta::zero());
    }

    println!("{}", build_forecast_table(&forecast, &actual));
    Ok(())
}
