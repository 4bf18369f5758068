pub mod series_csv;

pub use series_csv::{CsvSeriesSink, CsvSinkError};
