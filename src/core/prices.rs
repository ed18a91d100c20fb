//! Cheap-window selection over a day-ahead price series.

use std::ops::Range;

use chrono::{NaiveDate, TimeZone, Timelike, Utc};

use crate::{
    core::interval::Interval,
    quantity::{Quantity, rate::MegawattHourRate},
};

/// Local hours within which grid charging may start at all. Outside of them the
/// price does not matter: mornings are for PV and evenings for discharge.
pub const CHARGING_HOURS: Range<u32> = 7..17;

/// One day-ahead market period (30 minutes) with its price.
#[derive(Clone, Debug)]
pub struct PriceEntry {
    pub period: Interval<Utc>,
    pub rate: MegawattHourRate,
}

#[derive(Debug, thiserror::Error)]
pub enum PriceError {
    #[error("no price data for the day")]
    NoPriceData,

    #[error("no period qualifies for cheap charging (flat or inverted price curve)")]
    NoQualifyingPeriod,
}

/// Keep the entries whose period starts on the date within [`CHARGING_HOURS`],
/// local time.
#[must_use]
pub fn charging_window<Tz: TimeZone>(
    entries: &[PriceEntry],
    date: NaiveDate,
    local_tz: &Tz,
) -> Vec<PriceEntry> {
    entries
        .iter()
        .filter(|entry| {
            let start = entry.period.start.with_timezone(local_tz);
            (start.date_naive() == date) && CHARGING_HOURS.contains(&start.hour())
        })
        .cloned()
        .collect()
}

/// The price below which a period counts as cheap: 90 % of the way down from
/// the day's peak towards its trough, so only the cheapest ~10 % band
/// qualifies. `None` on an empty series.
#[must_use]
pub fn cheap_threshold(entries: &[PriceEntry]) -> Option<MegawattHourRate> {
    let rates = || entries.iter().map(|entry| entry.rate.ordered());
    let lowest = *rates().min()?;
    let highest = *rates().max()?;
    Some(Quantity(highest - 0.9 * (highest - lowest)))
}

/// Pick the local hour at which cheap charging should begin.
///
/// The *first* chronological entry strictly below the threshold wins: charging
/// starts as soon as the price drops into the cheap band. That is good enough
/// for this market's single daily low plateau and avoids optimizing over the
/// whole window. Entries are expected in chronological order.
pub fn select_charge_hour<Tz: TimeZone>(
    entries: &[PriceEntry],
    local_tz: &Tz,
) -> Result<u32, PriceError> {
    let threshold = cheap_threshold(entries).ok_or(PriceError::NoPriceData)?;
    entries
        .iter()
        .find(|entry| entry.rate.0 < threshold.0)
        .map(|entry| entry.period.start.with_timezone(local_tz).hour())
        .ok_or(PriceError::NoQualifyingPeriod)
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use chrono_tz::Europe::Warsaw;

    use super::*;

    fn entry(utc_hour: u32, utc_minute: u32, rate: f64) -> PriceEntry {
        let start = NaiveDate::from_ymd_opt(2026, 8, 28)
            .unwrap()
            .and_hms_opt(utc_hour, utc_minute, 0)
            .unwrap()
            .and_utc();
        PriceEntry {
            period: Interval::new(start, start + TimeDelta::minutes(30)),
            rate: Quantity(rate),
        }
    }

    #[test]
    fn test_first_entry_below_threshold_wins() -> Result<(), PriceError> {
        // lowest = 100, highest = 500 ⇒ threshold = 500 − 0.9 × 400 = 140.
        let entries = [entry(8, 0, 500.0), entry(8, 30, 120.0), entry(9, 0, 100.0)];
        // 08:30 UTC is 10:30 in Warsaw (CEST).
        assert_eq!(select_charge_hour(&entries, &Warsaw)?, 10);
        Ok(())
    }

    #[test]
    fn test_exactly_at_threshold_does_not_qualify() {
        // threshold = 140; the minimum itself qualifies, a 140 entry does not.
        let entries = [entry(8, 0, 500.0), entry(8, 30, 140.0), entry(9, 0, 100.0)];
        assert_eq!(select_charge_hour(&entries, &Utc).unwrap(), 9);
    }

    #[test]
    fn test_no_price_data() {
        assert!(matches!(select_charge_hour(&[], &Warsaw), Err(PriceError::NoPriceData)));
    }

    #[test]
    fn test_flat_curve_has_no_qualifying_period() {
        let entries = [entry(8, 0, 300.0), entry(8, 30, 300.0)];
        assert!(matches!(
            select_charge_hour(&entries, &Warsaw),
            Err(PriceError::NoQualifyingPeriod)
        ));
    }

    #[test]
    fn test_charging_window_bounds() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 28).unwrap();
        // Warsaw is UTC+2 on this date: 05:00 UTC = 07:00 local,
        // 15:00 UTC = 17:00 local.
        let entries =
            [entry(4, 30, 1.0), entry(5, 0, 2.0), entry(14, 30, 3.0), entry(15, 0, 4.0)];
        let window = charging_window(&entries, date, &Warsaw);
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].period.start, entries[1].period.start);
        assert_eq!(window[1].period.start, entries[2].period.start);
    }
}
