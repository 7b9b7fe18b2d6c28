//! Pure computations over one city's forecast, in feed order.
//!
//! An empty slice yields `None` (or an empty list) rather than an error;
//! deciding whether that is a failure is left to the caller.

use serde::{Serialize, Serializer};
use std::{cmp::Ordering, fmt};

use crate::model::ForecastDay;

pub const SUNNY_KEYWORDS: [&str; 4] =
    ["CER SENIN", "CER VARIABIL", "CER PARTIAL NOROS", "CER TEMPORAR NOROS"];

pub const CLOUDY_KEYWORDS: [&str; 2] = ["CER MAI NOROS", "CER MAI MULT NOROS"];

/// Rendering of a missing trend.
pub const NO_DATA: &str = "No data";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Rising,
    Falling,
    StableMixed,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Rising => "Rising",
            Trend::Falling => "Falling",
            Trend::StableMixed => "Stable/Mixed",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Trend {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

fn mean(days: &[ForecastDay], value: impl Fn(&ForecastDay) -> f64) -> Option<f64> {
    if days.is_empty() {
        return None;
    }
    Some(days.iter().map(value).sum::<f64>() / days.len() as f64)
}

/// Total order on temperatures in which `-0.0` and `0.0` tie.
fn compare_temps(a: f64, b: f64) -> Ordering {
    // Adding 0.0 turns -0.0 into 0.0 and leaves every other value unchanged.
    (a + 0.0).total_cmp(&(b + 0.0))
}

pub fn average_temperature(days: &[ForecastDay]) -> Option<f64> {
    mean(days, ForecastDay::average)
}

pub fn average_min_temperature(days: &[ForecastDay]) -> Option<f64> {
    mean(days, |d| d.temperature_min)
}

pub fn average_max_temperature(days: &[ForecastDay]) -> Option<f64> {
    mean(days, |d| d.temperature_max)
}

/// First day holding the highest maximum.
pub fn hottest_day(days: &[ForecastDay]) -> Option<&ForecastDay> {
    days.iter().reduce(|best, day| {
        if compare_temps(day.temperature_max, best.temperature_max).is_gt() { day } else { best }
    })
}

/// First day holding the lowest minimum.
pub fn coldest_day(days: &[ForecastDay]) -> Option<&ForecastDay> {
    days.iter().reduce(|best, day| {
        if compare_temps(day.temperature_min, best.temperature_min).is_lt() { day } else { best }
    })
}

/// Days whose description contains any keyword, ignoring case.
pub fn days_matching<'a>(days: &'a [ForecastDay], keywords: &[&str]) -> Vec<&'a ForecastDay> {
    let keywords: Vec<String> = keywords.iter().map(|k| k.to_uppercase()).collect();

    days.iter()
        .filter(|day| {
            let description = day.weather_description.to_uppercase();
            keywords.iter().any(|k| description.contains(k.as_str()))
        })
        .collect()
}

pub fn sunny_days(days: &[ForecastDay]) -> Vec<&ForecastDay> {
    days_matching(days, &SUNNY_KEYWORDS)
}

pub fn cloudy_days(days: &[ForecastDay]) -> Vec<&ForecastDay> {
    days_matching(days, &CLOUDY_KEYWORDS)
}

/// Classify the day-to-day movement of the daily mid-point temperature.
///
/// Every consecutive pair must move by more than `threshold` in the same
/// direction for the result to be `Rising` or `Falling`. With a single day no
/// pair is evaluated and the result is `Rising`.
pub fn temperature_trend(days: &[ForecastDay], threshold: f64) -> Option<Trend> {
    if days.is_empty() {
        return None;
    }

    let averages: Vec<f64> = days.iter().map(ForecastDay::average).collect();
    let (mut rising, mut falling) = (true, true);

    for pair in averages.windows(2) {
        let diff = pair[1] - pair[0];
        if diff > threshold {
            falling = false;
        } else if diff < -threshold {
            rising = false;
        } else {
            rising = false;
            falling = false;
        }
    }

    Some(if rising {
        Trend::Rising
    } else if falling {
        Trend::Falling
    } else {
        Trend::StableMixed
    })
}

fn top_n(
    days: &[ForecastDay],
    n: usize,
    order: impl Fn(&ForecastDay, &ForecastDay) -> Ordering,
) -> Vec<&ForecastDay> {
    let mut sorted: Vec<&ForecastDay> = days.iter().collect();
    // Stable: ties keep feed order.
    sorted.sort_by(|a, b| order(a, b));
    sorted.truncate(n.min(days.len()));
    sorted
}

/// Up to `n` days, highest maximum first.
pub fn top_n_by_max(days: &[ForecastDay], n: usize) -> Vec<&ForecastDay> {
    top_n(days, n, |a, b| compare_temps(b.temperature_max, a.temperature_max))
}

/// Up to `n` days, lowest minimum first.
pub fn top_n_by_min(days: &[ForecastDay], n: usize) -> Vec<&ForecastDay> {
    top_n(days, n, |a, b| compare_temps(a.temperature_min, b.temperature_min))
}

/// Days lying entirely inside `[min_temp, max_temp]`.
pub fn days_in_range(days: &[ForecastDay], min_temp: f64, max_temp: f64) -> Vec<&ForecastDay> {
    days.iter()
        .filter(|d| d.temperature_min >= min_temp && d.temperature_max <= max_temp)
        .collect()
}
