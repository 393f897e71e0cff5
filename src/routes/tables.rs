use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    routing::{get, post},
    Router,
    Json,
    http::Method,
};
use serde::Deserialize;
use std::sync::Arc;
use crate::{
    AppState,
    error::AppError,
    services::{
        csv_loader,
        profile::{
            build_summary,
            TableProfiler,
            types::{ColumnProfile, NumericKpis, SummaryReport, TableReport, TimeSeriesOutcome},
        },
    },
};
use tower_http::cors::{CorsLayer, Any};

pub fn routes(max_file_size: usize) -> Router<Arc<AppState>> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/tables", post(upload_table))
        .route("/tables/current", get(current_report))
        .route("/tables/current/profile", get(column_profile))
        .route("/tables/current/kpis", get(numeric_kpis))
        .route("/tables/current/timeseries", get(time_series))
        .route("/tables/current/summary", get(summary))
        .layer(DefaultBodyLimit::max(max_file_size))
        .layer(cors)
}

#[derive(Debug, Default, Deserialize)]
pub struct TimeSeriesParams {
    metric: Option<String>,
}

async fn upload_table(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<TableReport>, AppError> {
    let start = std::time::Instant::now();
    tracing::info!("Received upload, size: {}KB", body.len() / 1024);

    let table = csv_loader::load_table(&body)?;
    let table = state.replace_table(table);
    let report = TableProfiler::new(&table).report();

    tracing::info!(
        "Upload processed in {:?}: {} rows, {} columns, {} missing cells",
        start.elapsed(),
        report.overview.rows,
        report.overview.columns,
        report.overview.missing_total
    );
    Ok(Json(report))
}

async fn current_report(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TableReport>, AppError> {
    let table = state.snapshot()?;
    Ok(Json(TableProfiler::new(&table).report()))
}

async fn column_profile(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ColumnProfile>>, AppError> {
    let table = state.snapshot()?;
    Ok(Json(TableProfiler::new(&table).profile_columns()))
}

async fn numeric_kpis(
    State(state): State<Arc<AppState>>,
) -> Result<Json<NumericKpis>, AppError> {
    let table = state.snapshot()?;
    Ok(Json(TableProfiler::new(&table).numeric_kpis()))
}

async fn time_series(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TimeSeriesParams>,
) -> Result<Json<TimeSeriesOutcome>, AppError> {
    let table = state.snapshot()?;
    let outcome = TableProfiler::new(&table).time_series(params.metric.as_deref())?;
    if !matches!(outcome, TimeSeriesOutcome::Ready(_)) {
        tracing::info!("Time series unavailable: {:?}", outcome);
    }
    Ok(Json(outcome))
}

async fn summary(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SummaryReport>, AppError> {
    let table = state.snapshot()?;
    Ok(Json(build_summary(&table)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::services::profile::types::{KpiValue, SummaryOutcome};

    const SALES: &[u8] = b"date,revenue,region\n2024-01-02,10,north\n2024-01-01,100,south\n2024-01-01,50,\n";

    fn state() -> Arc<AppState> {
        Arc::new(AppState::new(Config::default()))
    }

    async fn upload(state: &Arc<AppState>, body: &'static [u8]) -> Result<TableReport, AppError> {
        upload_table(State(state.clone()), Bytes::from_static(body))
            .await
            .map(|Json(report)| report)
    }

    #[tokio::test]
    async fn reads_before_upload_are_rejected() {
        let state = state();
        assert!(matches!(current_report(State(state.clone())).await, Err(AppError::NoTable)));
        assert!(matches!(summary(State(state)).await, Err(AppError::NoTable)));
    }

    #[tokio::test]
    async fn upload_returns_full_report() {
        let state = state();
        let report = upload(&state, SALES).await.unwrap();

        assert_eq!(report.overview.rows, 3);
        assert_eq!(report.overview.columns, 3);
        assert_eq!(report.overview.missing_total, 1);
        assert_eq!(report.overview.preview.len(), 3);
        assert_eq!(report.profile.len(), 3);
        assert_eq!(report.kpis[0].value, KpiValue::Count(1));

        let Json(again) = current_report(State(state)).await.unwrap();
        assert_eq!(again, report);
    }

    #[tokio::test]
    async fn new_upload_replaces_table() {
        let state = state();
        upload(&state, SALES).await.unwrap();
        upload(&state, b"label\nx\ny\n").await.unwrap();

        let Json(profile) = column_profile(State(state.clone())).await.unwrap();
        assert_eq!(profile.len(), 1);
        assert_eq!(profile[0].column, "label");

        let Json(kpis) = numeric_kpis(State(state)).await.unwrap();
        assert!(kpis.is_empty());
    }

    #[tokio::test]
    async fn bad_upload_keeps_previous_table() {
        let state = state();
        upload(&state, SALES).await.unwrap();
        assert!(matches!(upload(&state, b"").await, Err(AppError::InvalidInput(_))));

        let Json(report) = current_report(State(state)).await.unwrap();
        assert_eq!(report.overview.rows, 3);
    }

    #[tokio::test]
    async fn time_series_endpoint_uses_metric_param() {
        let state = state();
        upload(&state, SALES).await.unwrap();

        let Json(outcome) = time_series(State(state.clone()), Query(TimeSeriesParams::default()))
            .await
            .unwrap();
        let TimeSeriesOutcome::Ready(series) = outcome else {
            panic!("expected a series");
        };
        assert_eq!(series.metric_column, "revenue");
        assert_eq!(series.points.len(), 2);
        assert_eq!(series.points[0].value, 150.0);

        let params = TimeSeriesParams { metric: Some("region".into()) };
        let result = time_series(State(state), Query(params)).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn time_series_without_dates_is_a_state_not_an_error() {
        let state = state();
        upload(&state, b"a,b\n1,2\n").await.unwrap();

        let Json(outcome) = time_series(State(state), Query(TimeSeriesParams::default()))
            .await
            .unwrap();
        assert_eq!(outcome, TimeSeriesOutcome::NoDateColumn);
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            serde_json::json!({ "status": "no_date_column" })
        );
    }

    #[tokio::test]
    async fn summary_endpoint_reports_statistics() {
        let state = state();
        upload(&state, SALES).await.unwrap();

        let Json(report) = summary(State(state)).await.unwrap();
        assert_eq!(report.numeric_columns, ["revenue"]);
        let SummaryOutcome::Ready(rows) = &report.statistics else {
            panic!("expected statistics");
        };
        assert_eq!(rows[0].sum, Some(160.0));
        assert_eq!(rows[0].max, Some(100.0));
    }

    #[test]
    fn router_takes_upload_limit_from_config() {
        let config = Config { max_file_size: 1024, ..Config::default() };
        let state = Arc::new(AppState::new(config));
        assert_eq!(state.max_file_size(), 1024);
        let _app: Router = crate::routes::router(state);
    }
}
