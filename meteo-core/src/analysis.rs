//! Forecast statistics for a single city.
//!
//! [`WeatherAnalysis`] validates arguments, fetches the city's forecast from a
//! [`ForecastProvider`] and delegates to the pure functions in [`stats`].
//! A city without forecast days is reported differently per operation:
//! averages, extremes and trend return `None`; keyword and range filters return
//! an empty list; top-N selection fails with [`WeatherError::NoData`].

use serde::Serialize;
use tracing::{debug, instrument};

use crate::{
    error::{Result, WeatherError},
    model::ForecastDay,
    service::{ForecastProvider, require_city},
};

pub mod stats;

pub use stats::{NO_DATA, Trend};

/// Everything the engine can say about one city, computed from one fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub city: String,
    pub days: usize,
    pub average_temperature: f64,
    pub average_min_temperature: f64,
    pub average_max_temperature: f64,
    pub hottest_day: ForecastDay,
    pub coldest_day: ForecastDay,
    pub trend: Trend,
    pub trend_threshold: f64,
}

#[derive(Debug)]
pub struct WeatherAnalysis<P> {
    provider: P,
}

fn require_threshold(threshold: f64) -> Result<()> {
    if threshold.is_nan() || threshold < 0.0 {
        return Err(WeatherError::invalid("threshold", "Threshold cannot be negative"));
    }
    Ok(())
}

fn require_n(n: usize) -> Result<()> {
    if n < 1 {
        return Err(WeatherError::invalid("n", "n must be at least 1"));
    }
    Ok(())
}

fn owned(days: Vec<&ForecastDay>) -> Vec<ForecastDay> {
    days.into_iter().cloned().collect()
}

impl<P: ForecastProvider> WeatherAnalysis<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    async fn forecast(&self, city: &str) -> Result<Vec<ForecastDay>> {
        let days = self.provider.five_day_forecast(city).await?;
        debug!(city, days = days.len(), "forecast loaded for analysis");
        Ok(days)
    }

    async fn forecast_or_no_data(&self, city: &str) -> Result<Vec<ForecastDay>> {
        let days = self.forecast(city).await?;
        if days.is_empty() {
            return Err(WeatherError::NoData { city: city.to_string() });
        }
        Ok(days)
    }

    pub async fn average_temperature(&self, city: &str) -> Result<Option<f64>> {
        require_city(city)?;
        Ok(stats::average_temperature(&self.forecast(city).await?))
    }

    pub async fn average_min_temperature(&self, city: &str) -> Result<Option<f64>> {
        require_city(city)?;
        Ok(stats::average_min_temperature(&self.forecast(city).await?))
    }

    pub async fn average_max_temperature(&self, city: &str) -> Result<Option<f64>> {
        require_city(city)?;
        Ok(stats::average_max_temperature(&self.forecast(city).await?))
    }

    pub async fn hottest_day(&self, city: &str) -> Result<Option<ForecastDay>> {
        require_city(city)?;
        Ok(stats::hottest_day(&self.forecast(city).await?).cloned())
    }

    pub async fn coldest_day(&self, city: &str) -> Result<Option<ForecastDay>> {
        require_city(city)?;
        Ok(stats::coldest_day(&self.forecast(city).await?).cloned())
    }

    pub async fn sunny_days(&self, city: &str) -> Result<Vec<ForecastDay>> {
        require_city(city)?;
        Ok(owned(stats::sunny_days(&self.forecast(city).await?)))
    }

    pub async fn cloudy_days(&self, city: &str) -> Result<Vec<ForecastDay>> {
        require_city(city)?;
        Ok(owned(stats::cloudy_days(&self.forecast(city).await?)))
    }

    /// `None` stands for "no data"; render it with [`NO_DATA`].
    #[instrument(skip(self))]
    pub async fn temperature_trend(&self, city: &str, threshold: f64) -> Result<Option<Trend>> {
        require_city(city)?;
        require_threshold(threshold)?;
        Ok(stats::temperature_trend(&self.forecast(city).await?, threshold))
    }

    pub async fn top_n_by_max_temperature(&self, city: &str, n: usize) -> Result<Vec<ForecastDay>> {
        require_city(city)?;
        require_n(n)?;
        Ok(owned(stats::top_n_by_max(&self.forecast_or_no_data(city).await?, n)))
    }

    pub async fn top_n_by_min_temperature(&self, city: &str, n: usize) -> Result<Vec<ForecastDay>> {
        require_city(city)?;
        require_n(n)?;
        Ok(owned(stats::top_n_by_min(&self.forecast_or_no_data(city).await?, n)))
    }

    pub async fn days_in_temperature_range(
        &self,
        city: &str,
        min_temp: f64,
        max_temp: f64,
    ) -> Result<Vec<ForecastDay>> {
        require_city(city)?;
        if min_temp.is_nan() || max_temp.is_nan() || min_temp > max_temp {
            return Err(WeatherError::invalid(
                "min_temp",
                "minTemp cannot be greater than maxTemp",
            ));
        }
        Ok(owned(stats::days_in_range(&self.forecast(city).await?, min_temp, max_temp)))
    }

    /// All aggregates for `city` from a single fetch; `None` when it has no days.
    #[instrument(skip(self))]
    pub async fn summary(&self, city: &str, threshold: f64) -> Result<Option<AnalysisSummary>> {
        require_city(city)?;
        require_threshold(threshold)?;
        let days = self.forecast(city).await?;

        let summary = summarize(city, &days, threshold);
        debug!(city, found = summary.is_some(), "summary computed");
        Ok(summary)
    }
}

fn summarize(city: &str, days: &[ForecastDay], threshold: f64) -> Option<AnalysisSummary> {
    Some(AnalysisSummary {
        city: city.to_string(),
        days: days.len(),
        average_temperature: stats::average_temperature(days)?,
        average_min_temperature: stats::average_min_temperature(days)?,
        average_max_temperature: stats::average_max_temperature(days)?,
        hottest_day: stats::hottest_day(days)?.clone(),
        coldest_day: stats::coldest_day(days)?.clone(),
        trend: stats::temperature_trend(days, threshold)?,
        trend_threshold: threshold,
    })
}
