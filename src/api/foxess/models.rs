use chrono_tz::Tz;
use serde::Deserialize;
use serde_with::serde_as;

/// One `(time, value)` row of a history query, still unparsed.
#[derive(Deserialize)]
pub struct RawSample {
    pub time: String,
    pub value: f64,
}

/// History of one variable of one device.
#[derive(Deserialize)]
pub struct VariableHistory {
    pub variable: String,

    pub unit: Option<String>,

    #[serde(rename = "data")]
    pub samples: Vec<RawSample>,
}

#[derive(Deserialize)]
pub struct DeviceHistory {
    #[serde(rename = "datas")]
    pub variables: Vec<VariableHistory>,
}

#[derive(Deserialize)]
pub struct RealTimeRawVariable {
    #[serde(rename = "variable")]
    pub name: String,

    pub value: serde_json::Value,
}

#[derive(Deserialize)]
pub struct DeviceRealTimeData {
    #[serde(rename = "deviceSN")]
    pub serial_number: String,

    #[serde(rename = "datas")]
    pub variables: Vec<RealTimeRawVariable>,
}

/// Live readings the decision loop needs.
#[derive(Copy, Clone, Deserialize)]
pub struct Telemetry {
    /// The cloud reports the state of charge as a float.
    #[serde(rename = "SoC")]
    pub soc: f64,

    #[serde(rename = "RVolt")]
    pub r_volt: f64,

    #[serde(rename = "SVolt")]
    pub s_volt: f64,

    #[serde(rename = "TVolt")]
    pub t_volt: f64,
}

impl Telemetry {
    #[must_use]
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn soc_percent(&self) -> u8 {
        self.soc.round().clamp(0.0, 100.0) as u8
    }

    #[must_use]
    pub const fn phase_voltages(&self) -> (f64, f64, f64) {
        (self.r_volt, self.s_volt, self.t_volt)
    }
}

#[serde_as]
#[derive(Deserialize)]
pub struct PlantDetail {
    #[serde(rename = "stationName")]
    pub name: String,

    /// IANA timezone of the plant, the local timezone used throughout.
    #[serde_as(as = "serde_with::DisplayFromStr")]
    #[serde(rename = "timezone")]
    pub timezone: Tz,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;

    #[test]
    fn test_deserialize_plant_detail() -> Result {
        // language=JSON
        let detail: PlantDetail = serde_json::from_str(
            r#"{"stationName": "Dom", "timezone": "Europe/Warsaw", "capacity": 9.92}"#,
        )?;
        assert_eq!(detail.timezone, chrono_tz::Europe::Warsaw);
        Ok(())
    }

    #[test]
    fn test_deserialize_variable_history() -> Result {
        // language=JSON
        let history: DeviceHistory = serde_json::from_str(
            r#"
            {
                "datas": [
                    {
                        "variable": "pvPower",
                        "unit": "kW",
                        "name": "PVPower",
                        "data": [
                            {"time": "2026-08-28 10:02:35 CEST+0200", "value": 1.234}
                        ]
                    }
                ]
            }
            "#,
        )?;
        assert_eq!(history.variables.len(), 1);
        assert_eq!(history.variables[0].variable, "pvPower");
        approx::assert_abs_diff_eq!(history.variables[0].samples[0].value, 1.234);
        Ok(())
    }

    #[test]
    fn test_soc_percent_rounds_and_clamps() {
        let telemetry = Telemetry { soc: 54.6, r_volt: 230.0, s_volt: 230.0, t_volt: 230.0 };
        assert_eq!(telemetry.soc_percent(), 55);
        let telemetry = Telemetry { soc: 120.0, ..telemetry };
        assert_eq!(telemetry.soc_percent(), 100);
    }
}
