//! Rule-based work-mode decision.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Inverter work modes this tool switches between, with their cloud API names.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum WorkMode {
    /// Consume locally: PV and battery cover the load first.
    #[serde(rename = "SelfUse")]
    SelfUse,

    /// Export surplus to the grid while waiting for the cheap window.
    #[serde(rename = "Feedin")]
    Feedin,
}

impl Display for WorkMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelfUse => write!(f, "Self-use"),
            Self::Feedin => write!(f, "Feed-in"),
        }
    }
}

/// Any phase at or above this voltage forces local consumption: exporting into
/// an already overvolted grid would trip the inverter.
pub const OVERVOLTAGE_LIMIT: f64 = 253.0;

/// Below this state of charge the battery must recover before anything else.
pub const MIN_SOC_PERCENT: u8 = 15;

/// One consistent snapshot of everything the decision reads. Built once per
/// polling tick so no field can change mid-decision.
#[derive(Copy, Clone, Debug)]
pub struct DecisionInputs {
    /// The daemon started with a deeply discharged battery which has not
    /// recovered yet.
    pub init_charge: bool,

    /// Battery state of charge, percent.
    pub soc: u8,

    /// The three phase voltages, volts.
    pub phase_voltages: (f64, f64, f64),

    /// Current local hour.
    pub hour_now: u32,

    /// Local hour at which cheap charging begins. `None` means no period
    /// qualified (or the price fetch failed): there is no window to wait for,
    /// so the protective mode wins — never a silent fall-back to export.
    pub charge_start_hour: Option<u32>,

    /// Extra hours to keep exporting when PV production is forecast to cover
    /// the charge anyway.
    pub forecast_offset: u32,
}

/// Decide the work mode. The rules are ordered; the first match wins:
///
/// 1. post-deep-discharge recovery,
/// 2. protective clamp on low battery or grid overvoltage,
/// 3. export while the cheap window has not started,
/// 4. otherwise consume locally.
///
/// Rules 1–2 are safety overrides and must never be bypassed.
#[must_use]
pub fn decide(inputs: &DecisionInputs) -> WorkMode {
    if inputs.init_charge {
        return WorkMode::SelfUse;
    }
    let (r, s, t) = inputs.phase_voltages;
    if inputs.soc < MIN_SOC_PERCENT
        || r >= OVERVOLTAGE_LIMIT
        || s >= OVERVOLTAGE_LIMIT
        || t >= OVERVOLTAGE_LIMIT
    {
        return WorkMode::SelfUse;
    }
    match inputs.charge_start_hour {
        Some(charge_start_hour) if inputs.hour_now < charge_start_hour + inputs.forecast_offset => {
            WorkMode::Feedin
        }
        _ => WorkMode::SelfUse,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const fn inputs() -> DecisionInputs {
        DecisionInputs {
            init_charge: false,
            soc: 50,
            phase_voltages: (230.0, 230.0, 230.0),
            hour_now: 6,
            charge_start_hour: Some(8),
            forecast_offset: 0,
        }
    }

    #[test]
    fn test_no_charge_hour_forces_the_protective_mode() {
        // Time of day would otherwise select feed-in.
        let inputs = DecisionInputs { charge_start_hour: None, ..inputs() };
        assert_eq!(decide(&inputs), WorkMode::SelfUse);
    }

    #[test]
    fn test_init_charge_overrides_everything() {
        let inputs = DecisionInputs { init_charge: true, soc: 5, hour_now: 10, ..inputs() };
        assert_eq!(decide(&inputs), WorkMode::SelfUse);
    }

    #[test]
    fn test_low_soc_clamps() {
        let inputs = DecisionInputs { soc: 14, ..inputs() };
        assert_eq!(decide(&inputs), WorkMode::SelfUse);
    }

    #[test]
    fn test_overvoltage_clamps_even_before_the_window() {
        let inputs = DecisionInputs { phase_voltages: (254.0, 230.0, 230.0), ..inputs() };
        assert_eq!(decide(&inputs), WorkMode::SelfUse);
    }

    #[test]
    fn test_feedin_before_the_cheap_window() {
        assert_eq!(decide(&inputs()), WorkMode::Feedin);
    }

    #[test]
    fn test_self_use_once_the_window_starts() {
        let inputs = DecisionInputs { hour_now: 9, ..inputs() };
        assert_eq!(decide(&inputs), WorkMode::SelfUse);
    }

    #[test]
    fn test_forecast_offset_extends_the_wait() {
        let inputs = DecisionInputs { hour_now: 9, forecast_offset: 2, ..inputs() };
        assert_eq!(decide(&inputs), WorkMode::Feedin);
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_string(&WorkMode::SelfUse).unwrap(), r#""SelfUse""#);
        assert_eq!(serde_json::to_string(&WorkMode::Feedin).unwrap(), r#""Feedin""#);
    }
}
