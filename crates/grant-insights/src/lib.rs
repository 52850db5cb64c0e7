pub mod cache;
pub mod columns;
pub mod config;
pub mod dataset;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod telemetry;

pub use cache::{CleanedDatasetCache, DatasetFingerprint};
pub use dataset::{DatasetSource, FileSource, Table, Value};
pub use normalize::{CategoryNormalizer, GeographicNormalizer, MatchResult};
pub use pipeline::{CleanedDataset, CleaningSummary, GrantCleaner};
pub use report::GrantReport;
