use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Extension, Json, Router};
use grant_insights::dataset::Value;
use grant_insights::error::AppError;
use grant_insights::report::GrantYearSummary;
use grant_insights::{CleanedDataset, CleaningSummary, DatasetFingerprint, GrantReport};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Deserialize)]
pub(crate) struct CleanRequest {
    pub(crate) csv: String,
    /// Maximum number of rows echoed back; the summary always covers all rows.
    #[serde(default)]
    pub(crate) limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CleanResponse {
    pub(crate) fingerprint: DatasetFingerprint,
    pub(crate) columns: Vec<String>,
    pub(crate) summary: CleaningSummary,
    pub(crate) rows: Vec<Vec<Value>>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ReportRequest {
    #[serde(default)]
    pub(crate) csv: Option<String>,
    #[serde(default)]
    pub(crate) year: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ReportDataSource {
    Request,
    Configured,
}

#[derive(Debug, Serialize)]
pub(crate) struct ReportResponse {
    pub(crate) fingerprint: DatasetFingerprint,
    pub(crate) data_source: ReportDataSource,
    pub(crate) available_years: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) report: Option<GrantYearSummary>,
}

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/grants/clean", post(clean_endpoint))
        .route("/api/v1/grants/report", post(report_endpoint))
        .route("/api/v1/grants/refresh", post(refresh_endpoint))
        .route("/api/v1/grants/cache", delete(clear_cache_endpoint))
        .layer(Extension(state))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Cleaning and source reads are synchronous, so they run off the async workers.
async fn run_blocking<T, F>(task: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| {
            AppError::Io(std::io::Error::other(format!("cleaning task failed: {err}")))
        })?
}

/// Request-supplied exports are cleaned once and never enter the cache.
fn clean_request_csv(
    state: &AppState,
    csv: String,
) -> Result<(DatasetFingerprint, Arc<CleanedDataset>), AppError> {
    let bytes = csv.into_bytes();
    let dataset = state.cache.cleaner().clean_bytes(&bytes)?;
    Ok((DatasetFingerprint::from_bytes(&bytes), Arc::new(dataset)))
}

fn clean_configured(
    state: &AppState,
) -> Result<(DatasetFingerprint, Arc<CleanedDataset>), AppError> {
    let bytes = state.fetch_configured()?;
    Ok(state.cache.get_or_clean(&bytes)?)
}

pub(crate) async fn clean_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<CleanRequest>,
) -> Result<Json<CleanResponse>, AppError> {
    let CleanRequest { csv, limit } = payload;
    let (fingerprint, dataset) = run_blocking(move || clean_request_csv(&state, csv)).await?;

    let columns = dataset
        .table
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect();
    let rows = dataset
        .table
        .rows()
        .take(limit.unwrap_or(usize::MAX))
        .map(|row| row.into_iter().cloned().collect())
        .collect();

    Ok(Json(CleanResponse {
        fingerprint,
        columns,
        summary: dataset.summary.clone(),
        rows,
    }))
}

pub(crate) async fn report_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<ReportRequest>,
) -> Result<Json<ReportResponse>, AppError> {
    let ReportRequest { csv, year } = payload;
    let (data_source, (fingerprint, dataset)) = run_blocking(move || match csv {
        Some(csv) => Ok((ReportDataSource::Request, clean_request_csv(&state, csv)?)),
        None => Ok((ReportDataSource::Configured, clean_configured(&state)?)),
    })
    .await?;

    let report = GrantReport::new(&dataset.table);
    let available_years = report.available_years();
    let year = year.or_else(|| available_years.last().copied());
    info!(%fingerprint, ?year, ?data_source, "building grant report");

    Ok(Json(ReportResponse {
        fingerprint,
        data_source,
        report: year.map(|year| report.for_year(year)),
        available_years,
    }))
}

pub(crate) async fn refresh_endpoint(
    Extension(state): Extension<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let cache = Arc::clone(&state.cache);
    let (fingerprint, dataset) = run_blocking(move || {
        let bytes = state.fetch_configured()?;
        Ok(state.cache.refresh(&bytes)?)
    })
    .await?;

    Ok(Json(json!({
        "fingerprint": fingerprint,
        "rows": dataset.summary.rows,
        "cached_datasets": cache.len(),
    })))
}

pub(crate) async fn clear_cache_endpoint(
    Extension(state): Extension<AppState>,
) -> Json<serde_json::Value> {
    Json(json!({ "cleared": state.cache.clear() }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use grant_insights::dataset::{DatasetSource, SourceError};
    use grant_insights::{CleanedDatasetCache, GrantCleaner};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::Value as JsonValue;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    const EXPORT: &str = "Patient ID#,Grant Req Date,Request Status,Application Signed,Gender,Amount\n\
1,2023-02-01,Approved,Yes,Female,100\n\
2,2024-03-05,pending,,male,50\n\
3,2024-04-10,pendng,no,femle,25\n";

    struct StaticSource(&'static str);

    impl DatasetSource for StaticSource {
        fn describe(&self) -> String {
            "static".to_string()
        }

        fn fetch(&self) -> Result<Vec<u8>, SourceError> {
            if self.0.trim().is_empty() {
                return Err(SourceError::Empty {
                    location: self.describe(),
                });
            }
            Ok(self.0.as_bytes().to_vec())
        }
    }

    fn state_with(source: Option<Arc<dyn DatasetSource>>, ready: bool) -> AppState {
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
            cache: Arc::new(CleanedDatasetCache::new(GrantCleaner::default())),
            source,
        }
    }

    async fn send(state: AppState, request: Request<Body>) -> (StatusCode, JsonValue) {
        let response = router(state)
            .oneshot(request)
            .await
            .expect("router dispatch");
        let status = response.status();
        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        let payload = serde_json::from_slice(&body).unwrap_or(JsonValue::Null);
        (status, payload)
    }

    fn post_json(uri: &str, payload: JsonValue) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::to_vec(&payload).expect("serialize payload"),
            ))
            .expect("request")
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (status, payload) = send(
            state_with(None, true),
            Request::get("/health").body(Body::empty()).expect("request"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn readiness_waits_for_startup() {
        let (status, payload) = send(
            state_with(None, false),
            Request::get("/ready").body(Body::empty()).expect("request"),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload["status"], "initializing");
    }

    #[tokio::test]
    async fn clean_returns_canonical_rows() {
        let (status, payload) = send(
            state_with(None, true),
            post_json(
                "/api/v1/grants/clean",
                json!({ "csv": EXPORT, "limit": 2 }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["summary"]["rows"], 3);
        assert_eq!(payload["rows"].as_array().map(Vec::len), Some(2));

        let columns: Vec<&str> = payload["columns"]
            .as_array()
            .expect("columns")
            .iter()
            .filter_map(JsonValue::as_str)
            .collect();
        assert!(columns.contains(&"Application Signed?"));
        assert!(columns.contains(&"Year"));

        let status_index = columns
            .iter()
            .position(|column| *column == "Request Status")
            .expect("status column");
        assert_eq!(payload["rows"][1][status_index], "pending");
    }

    #[tokio::test]
    async fn request_exports_are_not_cached() {
        let state = state_with(None, true);
        let request = || CleanRequest {
            csv: EXPORT.to_string(),
            limit: Some(0),
        };

        let Json(first) = clean_endpoint(Extension(state.clone()), Json(request()))
            .await
            .expect("clean succeeds");
        let Json(second) = clean_endpoint(Extension(state.clone()), Json(request()))
            .await
            .expect("clean succeeds");

        assert_eq!(first.fingerprint, second.fingerprint);
        assert!(first.rows.is_empty());
        assert!(state.cache.is_empty());

        let (status, _) = send(
            state.clone(),
            post_json("/api/v1/grants/report", json!({ "csv": EXPORT })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(state.cache.is_empty());
    }

    #[tokio::test]
    async fn configured_source_is_cleaned_once() {
        let source: Arc<dyn DatasetSource> = Arc::new(StaticSource(EXPORT));
        let state = state_with(Some(source), true);

        for _ in 0..2 {
            let Json(response) =
                report_endpoint(Extension(state.clone()), Json(ReportRequest::default()))
                    .await
                    .expect("report succeeds");
            assert_eq!(response.data_source, ReportDataSource::Configured);
            assert!(state.cache.contains(&response.fingerprint));
        }
        assert_eq!(state.cache.len(), 1);
    }

    #[tokio::test]
    async fn report_defaults_to_latest_year() {
        let (status, payload) = send(
            state_with(None, true),
            post_json("/api/v1/grants/report", json!({ "csv": EXPORT })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["data_source"], "request");
        assert_eq!(payload["available_years"], json!([2023, 2024]));
        assert_eq!(payload["report"]["year"], 2024);
        assert_eq!(payload["report"]["grants"], 2);
        assert_eq!(
            payload["report"]["pending_signatures"]
                .as_array()
                .map(Vec::len),
            Some(2)
        );
    }

    #[tokio::test]
    async fn report_uses_configured_source_without_csv() {
        let source: Arc<dyn DatasetSource> = Arc::new(StaticSource(EXPORT));
        let (status, payload) = send(
            state_with(Some(source), true),
            post_json("/api/v1/grants/report", json!({ "year": 2023 })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["data_source"], "configured");
        assert_eq!(payload["report"]["grants"], 1);
    }

    #[tokio::test]
    async fn report_without_any_source_is_not_found() {
        let (status, payload) = send(
            state_with(None, true),
            post_json("/api/v1/grants/report", json!({})),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(payload["error"].as_str().is_some());
    }

    #[tokio::test]
    async fn refresh_and_clear_manage_the_cache() {
        let source: Arc<dyn DatasetSource> = Arc::new(StaticSource(EXPORT));
        let state = state_with(Some(source), true);

        let (status, payload) = send(
            state.clone(),
            Request::post("/api/v1/grants/refresh")
                .body(Body::empty())
                .expect("request"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["rows"], 3);
        assert_eq!(payload["cached_datasets"], 1);

        let (status, payload) = send(
            state.clone(),
            Request::delete("/api/v1/grants/cache")
                .body(Body::empty())
                .expect("request"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["cleared"], 1);
        assert!(state.cache.is_empty());
    }

    #[tokio::test]
    async fn failing_source_is_a_bad_request() {
        let source: Arc<dyn DatasetSource> = Arc::new(StaticSource("  "));
        let (status, _) = send(
            state_with(Some(source), true),
            Request::post("/api/v1/grants/refresh")
                .body(Body::empty())
                .expect("request"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
