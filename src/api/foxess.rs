//! FoxESS Cloud Open API client.

mod models;
mod response;

use std::{collections::HashMap, time::Duration};

use chrono::{TimeZone, Utc};
use reqwest::{
    Client,
    Method,
    header::{HeaderMap, HeaderValue},
};
use serde::{Serialize, de::DeserializeOwned};

pub use self::models::{PlantDetail, Telemetry};
use self::{models::DeviceHistory, response::Response};
use crate::{
    core::{decision::WorkMode, flow::Channel, interval::Interval, series::PowerSeries},
    prelude::*,
};

const WORK_MODE_KEY: &str = "WorkMode";

pub struct Api {
    client: Client,
    api_key: String,
}

impl Api {
    pub fn new(api_key: String) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.append("Timezone", HeaderValue::from_static("Europe/Warsaw"));
        headers.append("Lang", HeaderValue::from_static("en"));
        headers.append("Token", HeaderValue::from_str(&api_key)?);
        let client = Client::builder()
            .user_agent("lisek")
            .timeout(Duration::from_secs(15))
            .default_headers(headers)
            .build()?;
        Ok(Self { client, api_key })
    }

    /// Query the per-channel power history over the window.
    ///
    /// Channels the cloud did not return are simply absent from the map — the
    /// caller decides whether that is fatal.
    #[instrument(skip_all, fields(serial_number = serial_number, window = ?window))]
    pub async fn get_history<Tz: TimeZone>(
        &self,
        serial_number: &str,
        channels: &[Channel],
        window: &Interval<Tz>,
    ) -> Result<HashMap<Channel, PowerSeries>> {
        #[derive(Serialize)]
        struct GetHistoryRequest<'a> {
            #[serde(rename = "sn")]
            serial_number: &'a str,

            variables: Vec<&'static str>,

            begin: i64,
            end: i64,
        }

        info!("Fetching…");
        let request = GetHistoryRequest {
            serial_number,
            variables: channels.iter().map(|channel| channel.variable()).collect(),
            begin: window.start.timestamp_millis(),
            end: window.end.timestamp_millis(),
        };
        let mut devices: Vec<DeviceHistory> = self
            .call(Method::POST, "op/v0/device/history/query", (), &request)
            .await
            .context("failed to query the device history")?;
        ensure!(!devices.is_empty(), "no device in the history response");
        let series = devices
            .swap_remove(0)
            .variables
            .into_iter()
            .filter_map(|history| {
                let channel = Channel::from_variable(&history.variable)?;
                let series = PowerSeries::parse(
                    history.samples.iter().map(|sample| (sample.time.as_str(), sample.value)),
                );
                Some((channel, series))
            })
            .collect();
        Ok(series)
    }

    /// Fetch the live readings the decision loop needs.
    #[instrument(skip_all, fields(serial_number = serial_number))]
    pub async fn get_telemetry(&self, serial_number: &str) -> Result<Telemetry> {
        #[derive(Serialize)]
        struct GetRealTimeRequest<'a> {
            #[serde(rename = "sn")]
            serial_number: &'a str,

            variables: [&'static str; 4],
        }

        let request =
            GetRealTimeRequest { serial_number, variables: ["SoC", "RVolt", "SVolt", "TVolt"] };
        let variables = self
            .call::<_, _, Vec<models::DeviceRealTimeData>>(
                Method::POST,
                "op/v0/device/real/query",
                (),
                &request,
            )
            .await
            .context("failed to query the real-time data")?
            .into_iter()
            .next()
            .with_context(|| format!("no device `{serial_number}` in the response"))?
            .variables
            .into_iter()
            .map(|variable| (variable.name, variable.value))
            .collect::<serde_json::Map<_, _>>();
        serde_json::from_value(serde_json::Value::Object(variables))
            .context("failed to deserialize the telemetry")
    }

    /// Fetch the plant metadata; the interesting part is the local timezone.
    #[instrument(skip_all, fields(station_id = station_id))]
    pub async fn get_plant_detail(&self, station_id: &str) -> Result<PlantDetail> {
        #[derive(Serialize)]
        struct GetPlantDetailRequest<'a> {
            id: &'a str,
        }

        info!("Fetching…");
        self.call(Method::GET, "op/v0/plant/detail", GetPlantDetailRequest { id: station_id }, ())
            .await
            .context("failed to request the plant details")
    }

    #[instrument(skip_all, fields(serial_number = serial_number))]
    pub async fn get_work_mode(&self, serial_number: &str) -> Result<WorkMode> {
        #[derive(Serialize)]
        struct GetSettingRequest<'a> {
            #[serde(rename = "sn")]
            serial_number: &'a str,

            key: &'static str,
        }

        #[derive(serde::Deserialize)]
        struct SettingValue {
            value: WorkMode,
        }

        let value: SettingValue = self
            .call(
                Method::POST,
                "op/v0/device/setting/get",
                (),
                &GetSettingRequest { serial_number, key: WORK_MODE_KEY },
            )
            .await
            .context("failed to get the work mode setting")?;
        Ok(value.value)
    }

    #[instrument(skip_all, fields(serial_number = serial_number, work_mode = %work_mode))]
    pub async fn set_work_mode(&self, serial_number: &str, work_mode: WorkMode) -> Result {
        #[derive(Serialize)]
        struct SetSettingRequest<'a> {
            #[serde(rename = "sn")]
            serial_number: &'a str,

            key: &'static str,

            value: WorkMode,
        }

        info!("Setting…");
        self.call_no_result(
            Method::POST,
            "op/v0/device/setting/set",
            &SetSettingRequest { serial_number, key: WORK_MODE_KEY, value: work_mode },
        )
        .await
        .context("failed to set the work mode")
    }

    #[instrument(skip_all, level = Level::DEBUG, fields(path = path))]
    async fn call<Q, B, R>(&self, method: Method, path: &str, query: Q, body: B) -> Result<R>
    where
        Q: Serialize,
        B: Serialize,
        R: DeserializeOwned,
    {
        self.send::<_, _, R>(method, path, query, body).await?.into()
    }

    async fn call_no_result<B: Serialize>(&self, method: Method, path: &str, body: B) -> Result {
        self.send::<_, _, serde_json::Value>(method, path, (), body).await?.ensure_ok()
    }

    async fn send<Q, B, R>(
        &self,
        method: Method,
        path: &str,
        query: Q,
        body: B,
    ) -> Result<Response<R>>
    where
        Q: Serialize,
        B: Serialize,
        R: DeserializeOwned,
    {
        let (timestamp, signature) = self.build_signature(path);
        self.client
            .request(method, format!("https://www.foxesscloud.com/{path}"))
            .header("Timestamp", timestamp)
            .header("Signature", signature)
            .query(&query)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("failed to call `{path}`"))?
            .error_for_status()
            .with_context(|| format!("`{path}` failed"))?
            .json::<Response<R>>()
            .await
            .with_context(|| format!("failed to deserialize `{path}` response JSON"))
    }

    /// The cloud signs requests with an md5 over the path, key and timestamp —
    /// with the `\r\n` separators as raw two-character literals.
    fn build_signature(&self, path: &str) -> (String, String) {
        let timestamp = Utc::now().timestamp_millis().to_string();
        let digest =
            md5::compute(format!(r"/{path}\r\n{0}\r\n{timestamp}", self.api_key).as_bytes());
        let signature = format!("{digest:x}");
        (timestamp, signature)
    }
}
