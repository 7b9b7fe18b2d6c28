use anyhow::{Result, bail};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use meteo_core::{
    Config, FeedSource, FileFeed, ForecastProvider, MeteoRomaniaClient, WeatherAnalysis,
    WeatherError, WeatherService,
};
use std::path::PathBuf;
use tracing::debug;

use crate::{
    configure,
    output::{self, Averages, DayReport, DaysReport, Output, TrendReport},
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "meteo", version, about = "Romanian weather feeds CLI")]
pub struct Cli {
    /// Print results as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Read the "today" JSON feed from a file instead of the network.
    #[arg(long, global = true, value_name = "PATH")]
    pub today_file: Option<PathBuf>,

    /// Read the forecast XML feed from a file instead of the network.
    #[arg(long, global = true, value_name = "PATH")]
    pub forecast_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RankBy {
    /// Highest maximum temperature first.
    Max,
    /// Lowest minimum temperature first.
    Min,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure feed URLs, default city and trend threshold.
    Configure,

    #[command(flatten)]
    Query(Query),
}

/// Commands that read the feeds.
#[derive(Debug, Subcommand)]
pub enum Query {
    /// Show today's conditions for every city, or for one city.
    Today {
        city: Option<String>,
    },

    /// Show the 5-day forecast for a city.
    Forecast {
        city: Option<String>,
    },

    /// Averages, extremes and trend in one report.
    Summary {
        city: Option<String>,

        /// Trend threshold in °C; defaults to the configured value.
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Average, average minimum and average maximum temperature.
    Average {
        city: Option<String>,
    },

    /// The day with the highest maximum temperature.
    Hottest {
        city: Option<String>,
    },

    /// The day with the lowest minimum temperature.
    Coldest {
        city: Option<String>,
    },

    /// Days with a clear or partly cloudy sky.
    Sunny {
        city: Option<String>,
    },

    /// Days with a mostly cloudy sky.
    Cloudy {
        city: Option<String>,
    },

    /// Classify the temperature trend as Rising, Falling or Stable/Mixed.
    Trend {
        city: Option<String>,

        /// Smallest day-to-day change in °C that counts as movement.
        #[arg(long, allow_negative_numbers = true)]
        threshold: Option<f64>,
    },

    /// The N warmest (by max) or coldest (by min) days.
    Top {
        city: Option<String>,

        #[arg(long, value_enum, default_value_t = RankBy::Max)]
        by: RankBy,

        #[arg(short, default_value_t = 3)]
        n: usize,
    },

    /// Days whose min and max both lie inside [MIN, MAX].
    Range {
        city: Option<String>,

        #[arg(long, allow_negative_numbers = true)]
        min: f64,

        #[arg(long, allow_negative_numbers = true)]
        max: f64,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let mut config = Config::load()?;

        match self.command {
            Command::Configure => configure::run(&mut config),
            Command::Query(query) => {
                let source = feed_source(self.today_file, self.forecast_file, &config)?;
                let engine = WeatherAnalysis::new(WeatherService::new(source));
                query.run(&engine, &config, Output::new(self.json)).await
            }
        }
    }
}

impl Query {
    async fn run(
        self,
        engine: &WeatherAnalysis<WeatherService>,
        config: &Config,
        out: Output,
    ) -> Result<()> {
        match self {
            Query::Today { city: None } => {
                let snapshots = engine.provider().today_weather().await?;
                out.emit(&snapshots, |s| output::snapshots(s))?;
            }
            Query::Today { city: Some(city) } => {
                let snapshot = engine
                    .provider()
                    .weather_by_city(&city)
                    .await?
                    .ok_or(WeatherError::CityNotFound { city })?;
                out.emit(&snapshot, output::snapshot_line)?;
            }
            Query::Forecast { city } => {
                let city = config.resolve_city(city)?;
                let days = engine.provider().five_day_forecast(&city).await?;
                if days.is_empty() {
                    return Err(WeatherError::NoData { city }.into());
                }
                let report = DaysReport { city: &city, label: "Forecast".into(), days };
                out.emit(&report, output::days)?;
            }
            Query::Summary { city, threshold } => {
                let city = config.resolve_city(city)?;
                let threshold = threshold.unwrap_or_else(|| config.trend_threshold());
                let summary = engine
                    .summary(&city, threshold)
                    .await?
                    .ok_or(WeatherError::NoData { city })?;
                out.emit(&summary, output::summary)?;
            }
            Query::Average { city } => {
                let city = config.resolve_city(city)?;
                let report = Averages {
                    city: &city,
                    average_temperature: engine.average_temperature(&city).await?,
                    average_min_temperature: engine.average_min_temperature(&city).await?,
                    average_max_temperature: engine.average_max_temperature(&city).await?,
                };
                out.emit(&report, output::averages)?;
            }
            Query::Hottest { city } => {
                let city = config.resolve_city(city)?;
                let day = engine.hottest_day(&city).await?;
                let report = DayReport { city: &city, label: "Hottest day", day };
                out.emit(&report, output::day)?;
            }
            Query::Coldest { city } => {
                let city = config.resolve_city(city)?;
                let day = engine.coldest_day(&city).await?;
                let report = DayReport { city: &city, label: "Coldest day", day };
                out.emit(&report, output::day)?;
            }
            Query::Sunny { city } => {
                let city = config.resolve_city(city)?;
                let days = engine.sunny_days(&city).await?;
                let report = DaysReport { city: &city, label: "Sunny days".into(), days };
                out.emit(&report, output::days)?;
            }
            Query::Cloudy { city } => {
                let city = config.resolve_city(city)?;
                let days = engine.cloudy_days(&city).await?;
                let report = DaysReport { city: &city, label: "Cloudy days".into(), days };
                out.emit(&report, output::days)?;
            }
            Query::Trend { city, threshold } => {
                let city = config.resolve_city(city)?;
                let threshold = threshold.unwrap_or_else(|| config.trend_threshold());
                let trend = engine.temperature_trend(&city, threshold).await?;
                let report =
                    TrendReport { city: &city, threshold, trend: output::trend_label(trend) };
                out.emit(&report, |r| format!("Temperature trend for {}: {}", r.city, r.trend))?;
            }
            Query::Top { city, by, n } => {
                let city = config.resolve_city(city)?;
                let (days, label) = match by {
                    RankBy::Max => {
                        (engine.top_n_by_max_temperature(&city, n).await?, "Warmest days")
                    }
                    RankBy::Min => {
                        (engine.top_n_by_min_temperature(&city, n).await?, "Coldest nights")
                    }
                };
                let report = DaysReport { city: &city, label: format!("{label} (top {n})"), days };
                out.emit(&report, output::days)?;
            }
            Query::Range { city, min, max } => {
                let city = config.resolve_city(city)?;
                let days = engine.days_in_temperature_range(&city, min, max).await?;
                let label = format!("Days within {min:.1}°C..{max:.1}°C");
                let report = DaysReport { city: &city, label, days };
                out.emit(&report, output::days)?;
            }
        }

        Ok(())
    }
}

/// Files when both paths are given, otherwise the configured HTTP feeds.
fn feed_source(
    today_file: Option<PathBuf>,
    forecast_file: Option<PathBuf>,
    config: &Config,
) -> Result<Box<dyn FeedSource>> {
    let source: Box<dyn FeedSource> = match (today_file, forecast_file) {
        (Some(today), Some(forecast)) => Box::new(FileFeed::new(today, forecast)),
        (None, None) => Box::new(MeteoRomaniaClient::new(&config.feeds)?),
        _ => bail!("--today-file and --forecast-file must be given together"),
    };
    debug!(?source, "feed source selected");
    Ok(source)
}
