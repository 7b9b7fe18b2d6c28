use anyhow::{Context, Result};
use meteo_core::{AnalysisSummary, ForecastDay, NO_DATA, Trend, WeatherSnapshot};
use serde::Serialize;

/// Prints results either as pretty JSON or as human-readable text.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn emit<T: Serialize>(&self, value: &T, human: impl FnOnce(&T) -> String) -> Result<()> {
        let text = if self.json {
            serde_json::to_string_pretty(value).context("Failed to serialize output as JSON")?
        } else {
            human(value)
        };
        println!("{text}");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct Averages<'a> {
    pub city: &'a str,
    pub average_temperature: Option<f64>,
    pub average_min_temperature: Option<f64>,
    pub average_max_temperature: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct DayReport<'a> {
    pub city: &'a str,
    pub label: &'a str,
    pub day: Option<ForecastDay>,
}

#[derive(Debug, Serialize)]
pub struct DaysReport<'a> {
    pub city: &'a str,
    pub label: String,
    pub days: Vec<ForecastDay>,
}

#[derive(Debug, Serialize)]
pub struct TrendReport<'a> {
    pub city: &'a str,
    pub threshold: f64,
    pub trend: &'static str,
}

pub fn temperature(value: Option<f64>) -> String {
    value.map_or_else(|| NO_DATA.to_string(), |v| format!("{v:.1}°C"))
}

pub fn trend_label(trend: Option<Trend>) -> &'static str {
    trend.map_or(NO_DATA, |t| t.as_str())
}

pub fn snapshot_line(s: &WeatherSnapshot) -> String {
    format!(
        "{:<20} {:>6.1}°C {:>4}%  {}",
        s.city, s.temperature, s.humidity, s.weather_description
    )
}

pub fn snapshots(list: &[WeatherSnapshot]) -> String {
    if list.is_empty() {
        return "No cities reported.".to_string();
    }
    list.iter().map(snapshot_line).collect::<Vec<_>>().join("\n")
}

pub fn day_line(d: &ForecastDay) -> String {
    format!(
        "{:<10}  min {:>5.1}°C  max {:>5.1}°C  {}",
        d.date, d.temperature_min, d.temperature_max, d.weather_description
    )
}

pub fn days(report: &DaysReport<'_>) -> String {
    let header = format!("{} for {}:", report.label, report.city);
    if report.days.is_empty() {
        return format!("{header} none");
    }
    let lines: Vec<String> = report.days.iter().map(|d| format!("  {}", day_line(d))).collect();
    format!("{header}\n{}", lines.join("\n"))
}

pub fn day(report: &DayReport<'_>) -> String {
    match &report.day {
        Some(d) => format!("{} in {}: {}", report.label, report.city, day_line(d)),
        None => format!("{} in {}: {NO_DATA}", report.label, report.city),
    }
}

pub fn averages(a: &Averages<'_>) -> String {
    format!(
        "Averages for {}:\n  mean    {}\n  min     {}\n  max     {}",
        a.city,
        temperature(a.average_temperature),
        temperature(a.average_min_temperature),
        temperature(a.average_max_temperature),
    )
}

pub fn summary(s: &AnalysisSummary) -> String {
    format!(
        "Summary for {} ({} days):\n  mean    {}\n  min     {}\n  max     {}\n  hottest {}\n  coldest {}\n  trend   {} (threshold {:.1}°C)",
        s.city,
        s.days,
        temperature(Some(s.average_temperature)),
        temperature(Some(s.average_min_temperature)),
        temperature(Some(s.average_max_temperature)),
        day_line(&s.hottest_day),
        day_line(&s.coldest_day),
        s.trend,
        s.trend_threshold,
    )
}
