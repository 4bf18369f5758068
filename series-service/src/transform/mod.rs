pub mod classify;
pub mod merge;

pub use classify::{classify, tariff_at, ClassifyError, Tariff};
pub use merge::{merge, parse_quantity, scale_quantity, MergeError, RateMerger};
