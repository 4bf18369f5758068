use meter_client::{
    api::{DEFAULT_HOST, DEFAULT_TIMEOUT},
    domain::TariffWindow,
    EnelogicClient,
};
use serde::Deserialize;
use std::{fs, time::Duration};

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Falls back to `ENELOGIC_ACCESS_TOKEN` when absent.
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_HOST.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeasuringPointsConfig {
    pub electricity: u64,
    pub gas: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub measuring_points: MeasuringPointsConfig,
    #[serde(default)]
    pub tariff: TariffWindow,
    pub server: Option<ServerConfig>,
    pub metrics: Option<MetricsConfig>,
}

impl ProviderConfig {
    pub fn access_token(&self) -> anyhow::Result<String> {
        self.access_token
            .clone()
            .or_else(|| std::env::var("ENELOGIC_ACCESS_TOKEN").ok())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "provider access token not found in config or ENELOGIC_ACCESS_TOKEN environment variable"
                )
            })
    }

    pub fn client(&self) -> anyhow::Result<EnelogicClient> {
        let token = self.access_token()?;
        let client = EnelogicClient::new(&self.base_url, token, Duration::from_secs(self.timeout_secs))?;
        Ok(client)
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var("SERIES_CONFIG").unwrap_or_else(|_| "series-config.toml".to_string());
        let contents = fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {path}: {e}"))?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        cfg.tariff.validate()?;
        Ok(cfg)
    }
}
