//! Widget configuration loading
//!
//! Layers, lowest priority first: the defaults compiled into the binary, the
//! optional `config/` files of the working directory, then `CONCIERGE_*`
//! environment variables.

use anyhow::{Context, Result};
use concierge_widget::WidgetConfig;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};

/// Defaults shipped with the binary
pub const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Profile file picked when `CONCIERGE_ENV` is unset
const DEFAULT_PROFILE: &str = "development";

fn with_defaults() -> ConfigBuilder<config::builder::DefaultState> {
    Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
}

/// Build the widget configuration from every layer
pub fn load_config() -> Result<WidgetConfig> {
    let profile = std::env::var("CONCIERGE_ENV").unwrap_or_else(|_| DEFAULT_PROFILE.to_string());

    let widget: WidgetConfig = with_defaults()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{profile}")).required(false))
        .add_source(File::with_name("config/local").required(false))
        // CONCIERGE_ORIGIN, CONCIERGE_RECONNECT__MAX_DELAY_MS
        .add_source(
            Environment::with_prefix("CONCIERGE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to read widget configuration")?
        .try_deserialize()
        .context("Widget configuration has invalid values")?;

    tracing::debug!(origin = %widget.origin, locale = %widget.locale, %profile, "Configuration loaded");
    Ok(widget)
}
