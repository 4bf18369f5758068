use anyhow::Result;
use series_service::{
    config::AppConfig,
    metrics_server, observability,
    pipeline::MeterDataSource,
    server::{self, AppState},
    sources::EnelogicSource,
};
use std::sync::Arc;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration
    let cfg = AppConfig::load()?;

    // Start metrics server if configured
    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    let source: Arc<dyn MeterDataSource> = Arc::new(EnelogicSource::new(cfg.provider.client()?));
    let state = AppState::new(source, cfg.tariff, cfg.measuring_points.clone());

    let bind_addr = cfg
        .server
        .as_ref()
        .map(|s| s.bind_addr.as_str())
        .unwrap_or(DEFAULT_BIND_ADDR);

    tracing::info!(
        provider = %cfg.provider.base_url,
        electricity = cfg.measuring_points.electricity,
        peak_start_hour = cfg.tariff.peak_start_hour,
        off_peak_start_hour = cfg.tariff.off_peak_start_hour,
        weekend_is_off_peak = cfg.tariff.weekend_is_off_peak,
        "starting series service"
    );

    server::serve(bind_addr, state).await
}
