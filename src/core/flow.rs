//! Reconciliation of the independently-metered power channels.

use std::{collections::HashMap, fmt::Display};

use crate::quantity::energy::KilowattHours;

/// The seven history channels required for a balanced flow picture,
/// named by their cloud API variable identifiers.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub enum Channel {
    /// Raw PV generation.
    Pv,

    /// Household load.
    Load,

    /// Export to the grid.
    FeedIn,

    /// Import from the grid.
    GridConsumption,

    /// Battery discharge.
    Discharge,

    /// Battery charge.
    Charge,

    /// Inverter output.
    Output,
}

impl Channel {
    pub const ALL: [Self; 7] = [
        Self::Pv,
        Self::Load,
        Self::FeedIn,
        Self::GridConsumption,
        Self::Discharge,
        Self::Charge,
        Self::Output,
    ];

    /// Variable identifier in the cloud history API.
    #[must_use]
    pub const fn variable(self) -> &'static str {
        match self {
            Self::Pv => "pvPower",
            Self::Load => "loadsPower",
            Self::FeedIn => "feedinPower",
            Self::GridConsumption => "gridConsumptionPower",
            Self::Discharge => "batDischargePower",
            Self::Charge => "batChargePower",
            Self::Output => "generationPower",
        }
    }

    #[must_use]
    pub fn from_variable(variable: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|channel| channel.variable() == variable)
    }
}

impl Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.variable())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("channel `{0}` is missing from the energy totals")]
    MissingChannel(&'static str),
}

/// Per-channel energy totals for one day. Derived once, never mutated.
#[must_use]
#[derive(Copy, Clone, Debug)]
pub struct EnergyTotals {
    pub pv: KilowattHours,
    pub load: KilowattHours,
    pub feed_in: KilowattHours,
    pub grid_consumption: KilowattHours,
    pub discharge: KilowattHours,
    pub charge: KilowattHours,
    pub output: KilowattHours,
}

impl TryFrom<HashMap<Channel, KilowattHours>> for EnergyTotals {
    type Error = FlowError;

    fn try_from(mut totals: HashMap<Channel, KilowattHours>) -> Result<Self, Self::Error> {
        let mut take = |channel: Channel| {
            totals.remove(&channel).ok_or(FlowError::MissingChannel(channel.variable()))
        };
        Ok(Self {
            pv: take(Channel::Pv)?,
            load: take(Channel::Load)?,
            feed_in: take(Channel::FeedIn)?,
            grid_consumption: take(Channel::GridConsumption)?,
            discharge: take(Channel::Discharge)?,
            charge: take(Channel::Charge)?,
            output: take(Channel::Output)?,
        })
    }
}

/// Reconciled flow values plus the drift diagnostics.
///
/// PV generation and net household consumption are metered by independently
/// drifting meters, so the raw channels never sum exactly. The two waste terms
/// absorb the drift so that every node of the displayed flow graph balances;
/// `delta_load` is the residual left over after reconciliation and is reported,
/// not fed back into the graph.
#[must_use]
#[derive(Copy, Clone, PartialEq)]
pub struct FlowSet {
    pub pv: KilowattHours,
    pub pv_auto_consume: KilowattHours,
    pub load: KilowattHours,
    pub calculated_load: KilowattHours,
    pub charge: KilowattHours,
    pub discharge: KilowattHours,
    pub feed_in: KilowattHours,
    pub grid_consumption: KilowattHours,
    pub pv_waste: KilowattHours,
    pub grid_waste: KilowattHours,
    pub delta_load: KilowattHours,
}

impl FlowSet {
    /// Derive the balanced flow set. The chain below must keep its order:
    /// each step consumes the previous step's output.
    pub fn reconcile(totals: &EnergyTotals) -> Self {
        let pv_waste = totals.pv + totals.discharge - totals.charge - totals.output;
        let grid_waste = totals.load - totals.output - totals.grid_consumption + totals.feed_in;
        let pv = totals.pv - pv_waste + grid_waste;
        let pv_auto_consume = pv - totals.charge - totals.feed_in;
        let calculated_load = pv_auto_consume + totals.discharge + totals.grid_consumption;
        let delta_load = calculated_load - totals.load;
        Self {
            pv: pv.round_to(3),
            pv_auto_consume: pv_auto_consume.round_to(3),
            load: totals.load.round_to(3),
            calculated_load: calculated_load.round_to(3),
            charge: totals.charge.round_to(3),
            discharge: totals.discharge.round_to(3),
            feed_in: totals.feed_in.round_to(3),
            grid_consumption: totals.grid_consumption.round_to(3),
            pv_waste: pv_waste.round_to(3),
            grid_waste: grid_waste.round_to(3),
            delta_load: delta_load.round_to(3),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::quantity::Quantity;

    fn totals() -> EnergyTotals {
        EnergyTotals {
            pv: Quantity(10.0),
            discharge: Quantity(2.0),
            charge: Quantity(1.0),
            output: Quantity(9.0),
            load: Quantity(8.0),
            grid_consumption: Quantity(3.0),
            feed_in: Quantity(1.0),
        }
    }

    #[test]
    fn test_reconcile() {
        let flow = FlowSet::reconcile(&totals());
        assert_abs_diff_eq!(flow.pv_waste.0, 2.0);
        assert_abs_diff_eq!(flow.grid_waste.0, -3.0);
        assert_abs_diff_eq!(flow.pv.0, 5.0);
        assert_abs_diff_eq!(flow.pv_auto_consume.0, 3.0);
        assert_abs_diff_eq!(flow.calculated_load.0, 8.0);
        assert_abs_diff_eq!(flow.delta_load.0, 0.0);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let totals = totals();
        assert!(FlowSet::reconcile(&totals) == FlowSet::reconcile(&totals));
    }

    #[test]
    fn test_missing_channel() {
        let mut map: HashMap<Channel, KilowattHours> = Channel::ALL
            .into_iter()
            .map(|channel| (channel, Quantity(1.0)))
            .collect();
        map.remove(&Channel::Output);
        let error = EnergyTotals::try_from(map).expect_err("a channel is missing");
        assert!(matches!(error, FlowError::MissingChannel("generationPower")));
    }

    #[test]
    fn test_all_channels_present() {
        let map: HashMap<Channel, KilowattHours> = Channel::ALL
            .into_iter()
            .map(|channel| (channel, Quantity(1.0)))
            .collect();
        assert!(EnergyTotals::try_from(map).is_ok());
    }
}
