pub mod config;
pub mod metrics_server;
pub mod observability;
pub mod pipeline;
pub mod server;
pub mod sinks;
pub mod sources;
pub mod summary;
pub mod transform;

pub use pipeline::{MeterDataSource, SeriesError, SeriesPipeline};
