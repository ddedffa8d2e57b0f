use std::collections::BTreeMap;

use crate::domain::{DailyAverage, Parameter, ReconciledDay, SoilValues};

/// Combines per-device daily series into one farmer-level series.
///
/// For every calendar day seen on any device, each parameter is the
/// unweighted mean of the per-device means that have data there. A day
/// exists in the output as soon as one device has a record for it.
pub fn reconcile_daily(per_device: &BTreeMap<String, Vec<DailyAverage>>) -> Vec<ReconciledDay> {
    // date -> per-parameter collected device means
    let mut by_date: BTreeMap<chrono::NaiveDate, (Vec<Vec<f64>>, u32)> = BTreeMap::new();

    for series in per_device.values() {
        for day in series {
            let (per_parameter, device_count) = by_date
                .entry(day.date)
                .or_insert_with(|| (vec![Vec::new(); 8], 0));
            *device_count += 1;
            for parameter in Parameter::ALL {
                if let Some(value) = day.values.get(parameter) {
                    per_parameter[parameter as usize].push(value);
                }
            }
        }
    }

    by_date
        .into_iter()
        .map(|(date, (per_parameter, device_count))| {
            let mut values = SoilValues::default();
            for parameter in Parameter::ALL {
                values.set(
                    parameter,
                    mean_of_device_means(&per_parameter[parameter as usize]),
                );
            }
            ReconciledDay {
                date,
                values,
                device_count,
            }
        })
        .collect()
}

/// Unweighted mean of already-averaged per-device values.
///
/// This is a mean of means, not a sample-count-weighted pooled mean; the
/// devices are assumed co-located on one plot. Kept as its own function so
/// a pooled average could be swapped in without touching callers.
fn mean_of_device_means(device_means: &[f64]) -> Option<f64> {
    if device_means.is_empty() {
        None
    } else {
        Some(device_means.iter().sum::<f64>() / device_means.len() as f64)
    }
}
