use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime, TimeDelta, Utc};
use chrono_tz::Tz;

use crate::{
    api::foxess,
    cli::FlowArgs,
    core::{
        flow::{Channel, EnergyTotals, FlowSet},
        interval::Interval,
    },
    ops::resolve_timezone,
    prelude::*,
    quantity::energy::KilowattHours,
    tables::build_flow_table,
};

/// Tolerance before the window start within which a sample pair still counts.
/// The cloud samples roughly every 4½ minutes, so this admits the one pair
/// straddling midnight that anchors the first interval of the day.
const GRACE: TimeDelta = TimeDelta::seconds(270);

const DAY_END: NaiveTime = match NaiveTime::from_hms_opt(23, 59, 59) {
    Some(time) => time,
    None => unreachable!(),
};

#[instrument(skip_all)]
pub async fn flow(args: &FlowArgs) -> Result {
    let api = foxess::Api::new(args.fox_ess_api.api_key.clone())?;
    let timezone = resolve_timezone(&api, &args.fox_ess_api).await?;
    let date =
        args.date.unwrap_or_else(|| Utc::now().with_timezone(&timezone).date_naive());

    let flow = compute_flow(&api, &args.fox_ess_api.serial_number, timezone, date).await?;
    info!(
        pv_waste = %flow.pv_waste,
        grid_waste = %flow.grid_waste,
        delta_load = %flow.delta_load,
        "reconciled",
    );
    println!("{}", build_flow_table(&flow));
    Ok(())
}

/// Fetch the seven channels for the local date, integrate each into a daily
/// total, and reconcile them into a balanced flow set.
pub async fn compute_flow(
    api: &foxess::Api,
    serial_number: &str,
    timezone: Tz,
    date: NaiveDate,
) -> Result<FlowSet> {
    let window_start = date.and_time(NaiveTime::MIN);
    let window_end = date.and_time(DAY_END);
    let window = Interval::new(
        window_start
            .and_local_timezone(timezone)
            .earliest()
            .with_context(|| format!("no midnight in `{timezone}` on {date}"))?,
        window_end
            .and_local_timezone(timezone)
            .latest()
            .with_context(|| format!("no end of day in `{timezone}` on {date}"))?,
    );

    let series = api.get_history(serial_number, &Channel::ALL, &window).await?;
    let totals: HashMap<Channel, KilowattHours> = series
        .into_iter()
        .map(|(channel, series)| {
            let energy =
                series.with_zero_anchor().energy(window_start, window_end, GRACE);
            debug!(%channel, %energy, "integrated");
            (channel, energy)
        })
        .collect();
    let totals = EnergyTotals::try_from(totals)?;
    Ok(FlowSet::reconcile(&totals))
}
