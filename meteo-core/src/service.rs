use async_trait::async_trait;
use std::{collections::HashMap, fmt::Debug};
use tracing::{debug, instrument};

use crate::{
    error::{Result, WeatherError},
    model::{CityKey, ForecastDay, WeatherSnapshot},
    normalize,
    source::FeedSource,
};

/// Anything that can hand out a city's forecast in feed order.
#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    async fn five_day_forecast(&self, city: &str) -> Result<Vec<ForecastDay>>;
}

/// Rejects empty or whitespace-only city names.
pub fn require_city(city: &str) -> Result<()> {
    if city.trim().is_empty() {
        return Err(WeatherError::invalid("city", "City cannot be null or empty"));
    }
    Ok(())
}

/// Snapshots in feed order plus a case-insensitive index on city name.
/// When a city repeats, the first snapshot wins.
#[derive(Debug, Clone, Default)]
pub struct SnapshotIndex {
    snapshots: Vec<WeatherSnapshot>,
    by_city: HashMap<CityKey, usize>,
}

impl SnapshotIndex {
    pub fn new(snapshots: Vec<WeatherSnapshot>) -> Self {
        let mut by_city = HashMap::with_capacity(snapshots.len());
        for (idx, snapshot) in snapshots.iter().enumerate() {
            by_city.entry(CityKey::new(&snapshot.city)).or_insert(idx);
        }
        Self { snapshots, by_city }
    }

    pub fn get(&self, city: &str) -> Option<&WeatherSnapshot> {
        self.by_city.get(&CityKey::new(city)).map(|&idx| &self.snapshots[idx])
    }

    pub fn all(&self) -> &[WeatherSnapshot] {
        &self.snapshots
    }
}

/// Fetches and normalizes feeds on every call; nothing is cached.
#[derive(Debug)]
pub struct WeatherService {
    source: Box<dyn FeedSource>,
}

impl WeatherService {
    pub fn new(source: Box<dyn FeedSource>) -> Self {
        Self { source }
    }

    #[instrument(skip(self))]
    pub async fn today_weather(&self) -> Result<Vec<WeatherSnapshot>> {
        let raw = self.source.fetch_today().await?;
        normalize::decode_snapshots(&raw)
    }

    /// Today's snapshot for `city`, or `None` if the feed does not list it.
    #[instrument(skip(self))]
    pub async fn weather_by_city(&self, city: &str) -> Result<Option<WeatherSnapshot>> {
        let index = SnapshotIndex::new(self.today_weather().await?);
        let found = index.get(city).cloned();
        debug!(found = found.is_some(), "looked up today snapshot");
        Ok(found)
    }
}

#[async_trait]
impl ForecastProvider for WeatherService {
    #[instrument(skip(self))]
    async fn five_day_forecast(&self, city: &str) -> Result<Vec<ForecastDay>> {
        require_city(city)?;
        let raw = self.source.fetch_forecast().await?;
        normalize::decode_forecast(&raw, city)
    }
}
