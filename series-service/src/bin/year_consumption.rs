use anyhow::Result;
use series_service::{config::AppConfig, observability, sources::EnelogicSource, summary};
use std::env;
use time::OffsetDateTime;

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;
    let mp = match env::args().nth(1) {
        Some(id) => id.parse()?,
        None => cfg.measuring_points.electricity,
    };

    let source = EnelogicSource::new(cfg.provider.client()?);
    let today = OffsetDateTime::now_utc().date();
    let result = summary::year_consumption(&source, mp, today).await?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
