//! [PSE RCE](https://api.raporty.pse.pl/) day-ahead price client.
//!
//! The market price ("rynkowa cena energii") is published per 30-minute period
//! for one business date, timestamped in Polish local time.

use chrono::{MappedLocalTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use chrono_tz::Europe::Warsaw;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    api::client,
    core::{interval::Interval, prices::PriceEntry},
    prelude::*,
    quantity::Quantity,
};

pub struct Api(Client);

impl Api {
    pub fn new() -> Result<Self> {
        Ok(Self(client::try_new()?))
    }

    /// Get the full day-ahead price series for the business date,
    /// in chronological order.
    #[instrument(skip_all, fields(date = %date))]
    pub async fn get_day_ahead_prices(&self, date: NaiveDate) -> Result<Vec<PriceEntry>> {
        info!("Fetching…");
        let entries = self
            .0
            .get("https://api.raporty.pse.pl/api/rce-pln")
            .query(&[("$filter", format!("business_date eq '{date}'"))])
            .send()
            .await
            .context("failed to call")?
            .error_for_status()
            .context("request failed")?
            .json::<GetRcePlnResponse>()
            .await
            .context("failed to deserialize the response")?
            .value;
        info!(n_entries = entries.len(), "Fetched");

        let mut prices: Vec<PriceEntry> = entries
            .into_iter()
            .filter_map(|entry| {
                let period_end = match NaiveDateTime::parse_from_str(
                    &entry.period_end,
                    "%Y-%m-%d %H:%M:%S",
                ) {
                    Ok(period_end) => period_end,
                    Err(error) => {
                        warn!(%entry.period_end, %error, "Skipped");
                        return None;
                    }
                };
                // The feed is in Polish local time; during the autumn backward
                // jump take the earlier of the two mappings.
                let period_end = match period_end.and_local_timezone(Warsaw) {
                    MappedLocalTime::Single(period_end)
                    | MappedLocalTime::Ambiguous(period_end, _) => {
                        period_end.with_timezone(&Utc)
                    }
                    MappedLocalTime::None => {
                        warn!(%entry.period_end, "Skipped: no such local time");
                        return None;
                    }
                };
                Some(PriceEntry {
                    period: Interval::new(period_end - TimeDelta::minutes(30), period_end),
                    rate: Quantity(entry.rate),
                })
            })
            .collect();
        prices.sort_by_key(|price| price.period.start);
        Ok(prices)
    }
}

#[derive(Deserialize)]
struct GetRcePlnResponse {
    value: Vec<RcePlnEntry>,
}

#[derive(Deserialize)]
struct RcePlnEntry {
    /// End of the 30-minute period, Polish local time, `2026-08-30 07:30:00`.
    #[serde(rename = "dtime")]
    period_end: String,

    #[serde(rename = "rce_pln")]
    rate: f64,
}
