use chrono::NaiveDate;

use crate::domain::{week_bounds, ReconciledDay, SoilAccumulator, WeeklyAverage};

/// Partitions a reconciled daily series into fixed 7-day windows anchored
/// at the planting date and averages each window.
///
/// Week numbers are contiguous: a mid-series week with no matching days is
/// still emitted with all-null values. The walk stops at the data horizon —
/// once the week start passes today or the last reconciled day — so no
/// spurious trailing empty weeks appear. The terminal week may be partial.
pub fn aggregate_weeks(
    days: &[ReconciledDay],
    planting_date: NaiveDate,
    today: NaiveDate,
) -> Vec<WeeklyAverage> {
    let Some(last_day) = days.iter().map(|d| d.date).max() else {
        return Vec::new();
    };

    let mut weeks = Vec::new();
    for week_number in 1.. {
        let (start_date, end_date) = week_bounds(planting_date, week_number);
        if start_date > today || start_date > last_day {
            break;
        }

        let mut accumulator = SoilAccumulator::new();
        let mut data_points = 0;
        let mut device_count = 0;
        for day in days
            .iter()
            .filter(|d| d.date >= start_date && d.date <= end_date)
        {
            accumulator.add(&day.values);
            data_points += 1;
            device_count = device_count.max(day.device_count);
        }

        weeks.push(WeeklyAverage {
            week_number,
            start_date,
            end_date,
            data_points,
            device_count,
            values: accumulator.means(),
        });
    }

    weeks
}
