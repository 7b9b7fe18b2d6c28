use anyhow::{Context, Result};
use inquire::{CustomType, Text};
use meteo_core::Config;

/// Interactively update feed URLs, default city and trend threshold, then save.
pub fn run(config: &mut Config) -> Result<()> {
    let today_url = Text::new("Today feed URL:")
        .with_default(&config.feeds.today_url)
        .prompt()
        .context("Failed to read today feed URL")?;

    let forecast_url = Text::new("Forecast feed URL:")
        .with_default(&config.feeds.forecast_url)
        .prompt()
        .context("Failed to read forecast feed URL")?;

    config.set_feed_urls(&today_url, &forecast_url)?;

    let default_city = Text::new("Default city (leave empty for none):")
        .with_default(config.default_city.as_deref().unwrap_or_default())
        .prompt()
        .context("Failed to read default city")?;

    config.set_default_city(&default_city);

    let threshold = CustomType::<f64>::new("Trend threshold (°C):")
        .with_default(config.trend_threshold())
        .with_error_message("Please enter a number")
        .prompt()
        .context("Failed to read trend threshold")?;

    config.set_trend_threshold(threshold)?;

    config.save()?;
    println!("Configuration saved to {}", Config::config_file_path()?.display());

    Ok(())
}
