use grant_insights::config::GrantsConfig;
use grant_insights::dataset::{DatasetSource, FileSource};
use grant_insights::error::AppError;
use grant_insights::{CleanedDatasetCache, GrantCleaner};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) cache: Arc<CleanedDatasetCache>,
    /// Export served when a report request carries no CSV of its own.
    pub(crate) source: Option<Arc<dyn DatasetSource>>,
}

impl AppState {
    pub(crate) fn new(
        readiness: Arc<AtomicBool>,
        metrics: PrometheusHandle,
        grants: &GrantsConfig,
    ) -> Self {
        let source = grants
            .source
            .as_ref()
            .map(|path| Arc::new(FileSource::new(path)) as Arc<dyn DatasetSource>);

        Self {
            readiness,
            metrics: Arc::new(metrics),
            cache: Arc::new(CleanedDatasetCache::new(GrantCleaner::new(
                grants.match_threshold,
            ))),
            source,
        }
    }

    pub(crate) fn fetch_configured(&self) -> Result<Vec<u8>, AppError> {
        let source = self.source.as_ref().ok_or(AppError::SourceNotConfigured)?;
        Ok(source.fetch()?)
    }
}
