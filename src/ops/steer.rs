use std::time::Duration;

use chrono::{NaiveDate, Timelike, Utc};
use chrono_tz::Tz;

use crate::{
    api::{foxess, pse, solcast},
    cli::SteerArgs,
    core::{
        decision::{DecisionInputs, MIN_SOC_PERCENT, WorkMode, decide},
        forecast::{forecast_offset, hourly_energy},
        prices::{PriceEntry, charging_window, select_charge_hour},
        retry,
        state::{SharedSteeringState, SteeringState},
    },
    prelude::*,
    quantity::energy::KilowattHours,
};

/// A battery that started deep-discharged counts as recovered at this state of
/// charge; until then the daemon keeps charging regardless of the price window.
const RECOVERED_SOC_PERCENT: u8 = 25;

#[instrument(skip_all)]
pub async fn steer(args: &SteerArgs) -> Result {
    let fox_ess = foxess::Api::new(args.fox_ess_api.api_key.clone())?;
    let timezone = super::resolve_timezone(&fox_ess, &args.fox_ess_api).await?;
    let pse = pse::Api::new()?;
    let solcast = solcast::Api::new(args.solcast.api_key.clone())?;
    let serial_number = args.fox_ess_api.serial_number.as_str();

    let init_soc = fox_ess.get_telemetry(serial_number).await?.soc_percent();
    info!(init_soc, "starting…");
    let state = SharedSteeringState::new(SteeringState {
        init_soc,
        charge_start_hour: None,
        forecast_offset: 0,
    });

    // Seed with whatever the inverter is set to right now, so the first tick
    // only writes on an actual change. A failure here just means one extra set.
    let mut applied = fox_ess.get_work_mode(serial_number).await.ok();
    let mut planned_for: Option<NaiveDate> = None;

    let mut ticker = tokio::time::interval(Duration::from_secs(args.polling_interval_secs));
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down…");
                break;
            }
        }

        let today = Utc::now().with_timezone(&timezone).date_naive();
        if planned_for != Some(today) {
            match refresh_plan(&state, &pse, &solcast, &args.solcast.site_id, today, timezone)
                .await
            {
                Ok(()) => planned_for = Some(today),
                Err(error) => {
                    // Yesterday's charge hour must not leak into today; stay
                    // protective and try again on the next tick.
                    warn!(%error, "planning failed, will retry");
                    state.update(|state| state.charge_start_hour = None);
                }
            }
        }

        match tick(&fox_ess, serial_number, &state, timezone).await {
            Ok(decided) if applied != Some(decided) => {
                if args.scout {
                    info!(%decided, "would switch (dry run)");
                } else if let Err(error) = fox_ess.set_work_mode(serial_number, decided).await {
                    warn!(%error, "failed to apply the work mode");
                    continue;
                } else {
                    info!(%decided, "switched");
                }
                applied = Some(decided);
            }
            Ok(decided) => trace!(%decided, "no change"),
            Err(error) => warn!(%error, "tick failed"),
        }
    }
    Ok(())
}

/// One polling tick: fresh telemetry plus one consistent snapshot of the
/// shared state, combined into a work mode.
async fn tick(
    fox_ess: &foxess::Api,
    serial_number: &str,
    state: &SharedSteeringState,
    timezone: Tz,
) -> Result<WorkMode> {
    let snapshot = state.snapshot();
    let telemetry = fox_ess.get_telemetry(serial_number).await?;
    let now = Utc::now().with_timezone(&timezone);

    let inputs = DecisionInputs {
        init_charge: (snapshot.init_soc < MIN_SOC_PERCENT)
            && (telemetry.soc_percent() < RECOVERED_SOC_PERCENT),
        soc: telemetry.soc_percent(),
        phase_voltages: telemetry.phase_voltages(),
        hour_now: now.hour(),
        charge_start_hour: snapshot.charge_start_hour,
        forecast_offset: snapshot.forecast_offset,
    };
    Ok(decide(&inputs))
}

/// Refresh the day's plan: the cheap charge hour from the day-ahead prices and
/// the waiting offset from the PV forecast. Both fetches are retried with
/// backoff; a price fetch that still fails surfaces as an error so the caller
/// can try again later instead of pinning the whole day on one bad tick.
async fn refresh_plan(
    state: &SharedSteeringState,
    pse: &pse::Api,
    solcast: &solcast::Api,
    site_id: &str,
    date: NaiveDate,
    timezone: Tz,
) -> Result {
    let prices =
        retry::retry(retry::Backoff::default(), || pse.get_day_ahead_prices(date)).await?;
    let charge_start_hour = planned_charge_hour(&prices, date, timezone);

    // A missing forecast does not block the plan: without the offset the
    // daemon simply charges at the start of the cheap window.
    let forecast_offset = match daily_forecast(solcast, site_id, date, timezone).await {
        Ok(total) => {
            let offset = forecast_offset(total);
            info!(%total, offset, "forecast");
            offset
        }
        Err(error) => {
            warn!(%error, "no forecast, assuming none");
            0
        }
    };

    state.update(|state| {
        state.charge_start_hour = charge_start_hour;
        state.forecast_offset = forecast_offset;
    });
    Ok(())
}

/// The day's charge hour, `None` when no period qualifies: a flat or inverted
/// price curve is a definitive answer, not a failure to plan.
fn planned_charge_hour(prices: &[PriceEntry], date: NaiveDate, timezone: Tz) -> Option<u32> {
    let window = charging_window(prices, date, &timezone);
    match select_charge_hour(&window, &timezone) {
        Ok(hour) => {
            info!(hour, "charge hour selected");
            Some(hour)
        }
        Err(error) => {
            warn!(%error, "no charge hour, staying in the protective mode");
            None
        }
    }
}

async fn daily_forecast(
    solcast: &solcast::Api,
    site_id: &str,
    date: NaiveDate,
    timezone: Tz,
) -> Result<KilowattHours> {
    let estimates =
        retry::retry(retry::Backoff::default(), || solcast.get_forecasts(site_id)).await?;
    Ok(hourly_energy(&estimates, date, &timezone).into_iter().sum())
}
