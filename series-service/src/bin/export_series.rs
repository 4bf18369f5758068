use anyhow::{bail, Result};
use meter_client::domain::{timestamp, Period};
use series_service::{
    config::AppConfig, observability, pipeline::SeriesPipeline, sinks::CsvSeriesSink,
    sources::EnelogicSource,
};
use std::{env, io};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        bail!("usage: export_series <from YYYY-MM-DD> <to YYYY-MM-DD> <DAY|QUARTER_OF_AN_HOUR|MONTH|YEAR> [measuring_point]");
    }

    // Validate arguments before touching the network.
    let period: Period = args[3].parse()?;
    let from = timestamp::parse_date(&args[1])?;
    let to = timestamp::parse_date(&args[2])?;

    let cfg = AppConfig::load()?;
    let mp = match args.get(4) {
        Some(id) => id.parse()?,
        None => cfg.measuring_points.electricity,
    };

    let pipeline = SeriesPipeline::new(EnelogicSource::new(cfg.provider.client()?), cfg.tariff);
    let records = pipeline.build_series(mp, from, to, period).await?;

    let mut sink = CsvSeriesSink::new(io::stdout().lock())?;
    sink.write_all(&records)?;
    sink.finish()?;

    tracing::info!(records = records.len(), %period, "series exported");
    Ok(())
}
