//! Irregular power telemetry and its integration into energy.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeDelta, Timelike};
use itertools::Itertools;

use crate::{
    prelude::*,
    quantity::{Quantity, energy::KilowattHours, power::Kilowatts},
};

/// One instantaneous power reading, as reported by the inverter cloud.
#[derive(Copy, Clone, PartialEq)]
pub struct PowerSample {
    pub timestamp: DateTime<FixedOffset>,
    pub power: Kilowatts,
}

/// Ordered history of one power channel.
#[must_use]
#[derive(Clone)]
pub struct PowerSeries(Vec<PowerSample>);

impl PowerSeries {
    /// Parse raw `(time, value)` entries into an ascending series.
    ///
    /// The cloud reports timestamps like `2026-08-28 17:02:35 CEST+0200`: a local
    /// datetime followed by a zone token whose last five characters carry the
    /// numeric offset. Entries that do not parse are dropped with a warning —
    /// the upstream occasionally serves garbage rows and a single one must not
    /// sink the whole day.
    pub fn parse<'a>(entries: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        let mut samples: Vec<PowerSample> = entries
            .into_iter()
            .filter_map(|(time, value)| match parse_timestamp(time) {
                Ok(timestamp) => Some(PowerSample { timestamp, power: Quantity(value) }),
                Err(error) => {
                    warn!(time, %error, "Skipped");
                    None
                }
            })
            .collect();
        // Input order is not trusted; the sort is stable, so equal timestamps
        // keep their upstream order.
        samples.sort_by_key(|sample| sample.timestamp);
        Self(samples)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Prepend a synthetic 0 kW sample at the top of the first sample's hour.
    ///
    /// The cloud's first reading of a window may arrive minutes into the hour;
    /// without an anchor the interval before it would be lost entirely. This is
    /// deliberately a separate preparation step, not part of [`Self::energy`].
    pub fn with_zero_anchor(mut self) -> Self {
        if let Some(first) = self.0.first().copied() {
            let timestamp = first
                .timestamp
                .with_minute(0)
                .and_then(|timestamp| timestamp.with_second(0))
                .and_then(|timestamp| timestamp.with_nanosecond(0));
            if let Some(timestamp) = timestamp
                && timestamp != first.timestamp
            {
                self.0.insert(0, PowerSample { timestamp, power: Kilowatts::ZERO });
            }
        }
        self
    }

    /// Integrate the series into energy over the window.
    ///
    /// The window bounds are naive local times interpreted in the offset carried
    /// by the first sample (the whole series shares one offset). Each pair of
    /// consecutive samples contributes the *later* sample's power over the gap
    /// between them — the right-endpoint rule the cloud's own daily totals use,
    /// not trapezoidal integration. A pair counts when the earlier sample is no
    /// more than `grace` before the window start and the later one is within
    /// the window end.
    #[must_use]
    pub fn energy(
        &self,
        window_start: NaiveDateTime,
        window_end: NaiveDateTime,
        grace: TimeDelta,
    ) -> KilowattHours {
        let Some(first) = self.0.first() else {
            return KilowattHours::ZERO;
        };
        let offset = *first.timestamp.offset();
        let (Some(window_start), Some(window_end)) = (
            window_start.and_local_timezone(offset).single(),
            window_end.and_local_timezone(offset).single(),
        ) else {
            return KilowattHours::ZERO;
        };
        self.0
            .iter()
            .tuple_windows()
            .filter(|(current, next)| {
                (current.timestamp >= window_start - grace) && (next.timestamp <= window_end)
            })
            .map(|(current, next)| next.power * (next.timestamp - current.timestamp))
            .sum()
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>> {
    let (datetime, zone) = raw.rsplit_once(' ').context("no zone token")?;
    let offset = zone
        .len()
        .checked_sub(5)
        .and_then(|at| zone.get(at..))
        .context("zone token too short")?;
    DateTime::parse_from_str(&format!("{datetime}{offset}"), "%Y-%m-%d %H:%M:%S%z")
        .with_context(|| format!("failed to parse `{raw}`"))
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    use super::*;

    const GRACE: TimeDelta = TimeDelta::seconds(270);

    fn window(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 8, 28).unwrap().and_hms_opt(hour, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_timestamp_ok() -> Result {
        let timestamp = parse_timestamp("2026-08-28 17:02:35 CEST+0200")?;
        assert_eq!(timestamp.to_rfc3339(), "2026-08-28T17:02:35+02:00");
        Ok(())
    }

    #[test]
    fn test_parse_timestamp_garbage() {
        assert!(parse_timestamp("not a time").is_err());
        assert!(parse_timestamp("2026-08-28 17:02:35 X").is_err());
    }

    #[test]
    fn test_unparseable_entry_is_dropped() {
        let valid = [
            ("2026-08-28 10:00:00 CEST+0200", 1.0),
            ("2026-08-28 10:30:00 CEST+0200", 2.0),
            ("2026-08-28 11:00:00 CEST+0200", 4.0),
        ];
        let with_garbage = [valid[0], ("garbage", 9000.0), valid[1], valid[2]];
        let expected = PowerSeries::parse(valid).energy(window(0), window(23), GRACE);
        let actual = PowerSeries::parse(with_garbage).energy(window(0), window(23), GRACE);
        assert_abs_diff_eq!(actual.0, expected.0);
    }

    #[test]
    fn test_energy_is_order_invariant() {
        let sorted = [
            ("2026-08-28 10:00:00 CEST+0200", 1.0),
            ("2026-08-28 10:30:00 CEST+0200", 2.0),
            ("2026-08-28 11:00:00 CEST+0200", 4.0),
        ];
        let shuffled = [sorted[2], sorted[0], sorted[1]];
        let expected = PowerSeries::parse(sorted).energy(window(0), window(23), GRACE);
        let actual = PowerSeries::parse(shuffled).energy(window(0), window(23), GRACE);
        assert_abs_diff_eq!(actual.0, expected.0);
    }

    #[test]
    fn test_energy_right_endpoint_rule() {
        // 2 kW over the first half-hour plus 4 kW over the second,
        // regardless of the left endpoints.
        let series = PowerSeries::parse([
            ("2026-08-28 10:00:00 CEST+0200", 1.0),
            ("2026-08-28 10:30:00 CEST+0200", 2.0),
            ("2026-08-28 11:00:00 CEST+0200", 4.0),
        ]);
        assert_abs_diff_eq!(series.energy(window(0), window(23), GRACE).0, 3.0);
    }

    #[test]
    fn test_energy_empty_window() {
        let series = PowerSeries::parse([
            ("2026-08-28 10:00:00 CEST+0200", 1.0),
            ("2026-08-28 10:30:00 CEST+0200", 2.0),
        ]);
        assert_abs_diff_eq!(series.energy(window(10), window(10), TimeDelta::zero()).0, 0.0);
    }

    #[test]
    fn test_energy_empty_series() {
        let series = PowerSeries::parse([("garbage", 1.0)]);
        assert!(series.is_empty());
        assert_abs_diff_eq!(series.energy(window(0), window(23), GRACE).0, 0.0);
    }

    #[test]
    fn test_energy_grace_admits_leading_pair() {
        // The first sample sits 3 minutes before the window: within the 270 s
        // grace the pair counts, without it the pair is dropped.
        let series = PowerSeries::parse([
            ("2026-08-28 09:57:00 CEST+0200", 0.0),
            ("2026-08-28 10:27:00 CEST+0200", 2.0),
        ]);
        assert_abs_diff_eq!(series.energy(window(10), window(11), GRACE).0, 1.0);
        assert_abs_diff_eq!(series.energy(window(10), window(11), TimeDelta::zero()).0, 0.0);
    }

    #[test]
    fn test_zero_anchor_prepends_top_of_hour() {
        let series = PowerSeries::parse([("2026-08-28 10:17:00 CEST+0200", 3.0)])
            .with_zero_anchor();
        assert_eq!(series.len(), 2);
        // The synthetic interval attributes 3 kW over 17 minutes.
        assert_abs_diff_eq!(
            series.energy(window(10), window(11), TimeDelta::zero()).0,
            3.0 * 17.0 / 60.0,
        );
    }

    #[test]
    fn test_zero_anchor_skips_aligned_series() {
        let series = PowerSeries::parse([("2026-08-28 10:00:00 CEST+0200", 3.0)])
            .with_zero_anchor();
        assert_eq!(series.len(), 1);
    }
}
