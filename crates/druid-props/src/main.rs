mod config;

use anyhow::Result;
use druid_settings::{FilterAlias, LogFilterSettings, Settings, SettingsLoader, StatFilterSettings};
use std::io::Write;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Loads Druid pool settings and prints the `druid.*` property bag
fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only the property bag
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "druid_props=info,druid_settings=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    dotenvy::dotenv().ok();
    let config = config::Config::from_env()?;

    info!("Output format: {:?}", config.format);

    let mut loader = SettingsLoader::new().with_env_prefix(config.env_prefix.clone());
    if let Some(path) = &config.settings_path {
        info!("Settings file: {}", path.display());
        loader = loader.with_file(path, true);
    }
    let settings = loader.load()?;

    for warning in warnings(&settings) {
        warn!("{}", warning);
    }
    if settings.proxy_filter {
        info!("Proxy filters in use, filter list not forwarded");
    }

    let props = settings.to_properties();
    info!("Projected {} properties", props.len());

    let encoded = config.format.create().encode(&props)?;
    std::io::stdout().write_all(&encoded)?;

    Ok(())
}

/// Settings that load fine but will not do what the operator probably meant
fn warnings(settings: &Settings) -> Vec<String> {
    let mut out = Vec::new();

    if !settings.enabled {
        out.push("Druid is not enabled; properties are printed anyway".to_string());
    }

    if !settings.proxy_filter {
        match settings.filter_aliases() {
            Ok(aliases) => {
                if settings.stat_filter != StatFilterSettings::default()
                    && !aliases.iter().any(FilterAlias::is_stat)
                {
                    out.push("stat_filter is configured but no stat filter is listed".to_string());
                }
                if settings.log_filter != LogFilterSettings::default()
                    && !aliases.iter().any(FilterAlias::is_log)
                {
                    out.push("log_filter is configured but no log filter is listed".to_string());
                }
            }
            Err(e) => out.push(format!("Filter list will be rejected by the pool: {}", e)),
        }
    }

    if settings.dynamic && settings.slaves.is_empty() {
        out.push("Dynamic routing enabled without slave data sources".to_string());
    }

    out
}
