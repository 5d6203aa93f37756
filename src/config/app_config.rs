use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use super::{BaseHttpClientConfig, DeliveryPolicy};

/// Default configuration directory, relative to the working directory.
pub const DEFAULT_CONFIG_DIR: &str = "configs";

/// Global settings shared by every handler.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    /// Base URL of the monitoring dashboard, used to build per-check links.
    #[serde(default)]
    pub dashboard_link: Option<String>,

    /// Datacenter name, the dashboard path segment identifying this Sensu
    /// server.
    #[serde(default)]
    pub datacenter: Option<String>,

    /// Timeout and retry behaviour for each outbound notification.
    #[serde(default)]
    pub delivery: DeliveryPolicy,

    /// Configuration for the base HTTP client.
    #[serde(default)]
    pub http_base_config: BaseHttpClientConfig,

    /// Path to the handler configuration: `handlers.d/` when that directory
    /// exists, `handlers.yaml` otherwise.
    #[serde(skip_deserializing)]
    pub handler_config_path: PathBuf,
}

impl AppConfig {
    /// Creates a new `AppConfig` from `{config_dir}/app.yaml` and
    /// `SENSU_HANDLERS__*` environment variables. A missing `app.yaml` yields
    /// the defaults.
    pub fn new(config_dir: Option<&str>) -> Result<Self, ConfigError> {
        let config_dir_str = config_dir.unwrap_or(DEFAULT_CONFIG_DIR);
        let s = Config::builder()
            .add_source(File::with_name(&format!("{}/app.yaml", config_dir_str)).required(false))
            .add_source(Environment::with_prefix("SENSU_HANDLERS").separator("__"))
            .build()?;
        let mut config: Self = s.try_deserialize()?;

        let config_dir = Path::new(config_dir_str);
        let fragments = config_dir.join("handlers.d");
        config.handler_config_path =
            if fragments.is_dir() { fragments } else { config_dir.join("handlers.yaml") };

        Ok(config)
    }

    /// Creates a new `AppConfigBuilder` for testing purposes.
    #[cfg(test)]
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }
}

/// A builder for creating `AppConfig` instances for testing.
#[cfg(test)]
#[derive(Default)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

#[cfg(test)]
impl AppConfigBuilder {
    pub fn dashboard_link(mut self, link: &str) -> Self {
        self.config.dashboard_link = Some(link.to_string());
        self
    }

    pub fn datacenter(mut self, datacenter: &str) -> Self {
        self.config.datacenter = Some(datacenter.to_string());
        self
    }

    pub fn delivery(mut self, delivery: DeliveryPolicy) -> Self {
        self.config.delivery = delivery;
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}
