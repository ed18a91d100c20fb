//! Hourly aggregation of the rooftop PV forecast.

use chrono::{DateTime, NaiveDate, TimeDelta, TimeZone, Timelike, Utc};

use crate::quantity::{energy::KilowattHours, power::Kilowatts};

/// Half-hour period length the forecast provider reports in.
const PERIOD: TimeDelta = TimeDelta::minutes(30);

/// One forecast period, keyed by its *end* instant.
#[derive(Copy, Clone, Debug)]
pub struct PvEstimate {
    pub period_end: DateTime<Utc>,
    pub estimate: Kilowatts,
}

/// Per-local-hour forecast energy for one date.
///
/// A half-hour estimate is average power over the period, so it contributes
/// `estimate × 0.5 h`. The period is attributed to the hour containing
/// `period_end − 1 minute`: a period ending exactly on the hour belongs to the
/// hour it covers, not the one it touches.
#[must_use]
pub fn hourly_energy<Tz: TimeZone>(
    estimates: &[PvEstimate],
    date: NaiveDate,
    local_tz: &Tz,
) -> [KilowattHours; 24] {
    let mut hourly = [KilowattHours::ZERO; 24];
    for estimate in estimates {
        let covered = (estimate.period_end - TimeDelta::minutes(1)).with_timezone(local_tz);
        if covered.date_naive() == date {
            hourly[covered.hour() as usize] += estimate.estimate * PERIOD;
        }
    }
    hourly
}

/// Extra hours of waiting granted by a sunny forecast: when PV is expected to
/// cover most of the charge anyway, grid charging is delayed.
#[must_use]
pub fn forecast_offset(daily_total: KilowattHours) -> u32 {
    if daily_total.0 >= 20.0 {
        2
    } else if daily_total.0 >= 10.0 {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;
    use chrono_tz::Europe::Warsaw;

    use super::*;
    use crate::quantity::Quantity;

    fn estimate(utc_hour: u32, utc_minute: u32, kilowatts: f64) -> PvEstimate {
        PvEstimate {
            period_end: NaiveDate::from_ymd_opt(2026, 8, 28)
                .unwrap()
                .and_hms_opt(utc_hour, utc_minute, 0)
                .unwrap()
                .and_utc(),
            estimate: Quantity(kilowatts),
        }
    }

    #[test]
    fn test_period_is_attributed_to_the_covered_hour() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 28).unwrap();
        // Ends at 11:00 Warsaw time ⇒ belongs to hour 10.
        let hourly = hourly_energy(&[estimate(9, 0, 2.0)], date, &Warsaw);
        assert_abs_diff_eq!(hourly[10].0, 1.0);
        assert_abs_diff_eq!(hourly[11].0, 0.0);
    }

    #[test]
    fn test_two_periods_sum_into_one_hour() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 28).unwrap();
        // 10:00–10:30 and 10:30–11:00 Warsaw time.
        let hourly = hourly_energy(&[estimate(8, 30, 2.0), estimate(9, 0, 4.0)], date, &Warsaw);
        assert_abs_diff_eq!(hourly[10].0, 3.0);
    }

    #[test]
    fn test_other_dates_are_filtered_out() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        let hourly = hourly_energy(&[estimate(9, 0, 2.0)], date, &Warsaw);
        assert!(hourly.iter().all(|energy| energy.0 == 0.0));
    }

    #[test]
    fn test_forecast_offset_bands() {
        assert_eq!(forecast_offset(Quantity(25.0)), 2);
        assert_eq!(forecast_offset(Quantity(12.0)), 1);
        assert_eq!(forecast_offset(Quantity(3.0)), 0);
    }
}
