//! [Solcast](https://solcast.com/) rooftop PV forecast client.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::{api::client, core::forecast::PvEstimate, prelude::*, quantity::Quantity};

pub struct Api {
    client: Client,
    api_key: String,
}

impl Api {
    pub fn new(api_key: String) -> Result<Self> {
        Ok(Self { client: client::try_new()?, api_key })
    }

    /// Fetch the upcoming forecast periods for the rooftop site,
    /// nominal estimate only.
    #[instrument(skip_all, fields(site_id = site_id))]
    pub async fn get_forecasts(&self, site_id: &str) -> Result<Vec<PvEstimate>> {
        info!("Fetching…");
        let forecasts = self
            .client
            .get(format!("https://api.solcast.com.au/rooftop_sites/{site_id}/forecasts"))
            .query(&[("format", "json")])
            .bearer_auth(&self.api_key)
            .send()
            .await
            .context("failed to call")?
            .error_for_status()
            .context("request failed")?
            .json::<GetForecastsResponse>()
            .await
            .context("failed to deserialize the response")?
            .forecasts;
        info!(n_forecasts = forecasts.len(), "Fetched");
        Ok(forecasts
            .into_iter()
            .map(|forecast| PvEstimate {
                period_end: forecast.period_end,
                estimate: Quantity(forecast.pv_estimate),
            })
            .collect())
    }
}

#[derive(Deserialize)]
struct GetForecastsResponse {
    forecasts: Vec<Forecast>,
}

#[derive(Deserialize)]
struct Forecast {
    /// Average power estimate over the period, kilowatts.
    pv_estimate: f64,

    period_end: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_response() -> Result {
        // language=JSON
        let response: GetForecastsResponse = serde_json::from_str(
            r#"
            {
                "forecasts": [
                    {
                        "pv_estimate": 1.9,
                        "pv_estimate10": 0.8,
                        "pv_estimate90": 2.5,
                        "period_end": "2026-08-30T10:30:00.0000000Z",
                        "period": "PT30M"
                    }
                ]
            }
            "#,
        )?;
        assert_eq!(response.forecasts.len(), 1);
        approx::assert_abs_diff_eq!(response.forecasts[0].pv_estimate, 1.9);
        Ok(())
    }
}
