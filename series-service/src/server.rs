use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use meter_client::domain::{timestamp, MeasuringPoint, MergedRecord, Period, TariffWindow};
use serde::Deserialize;
use serde_json::json;
use time::OffsetDateTime;

use crate::{
    config::MeasuringPointsConfig,
    pipeline::{MeterDataSource, SeriesError, SeriesPipeline},
    summary::{self, SummaryError, YearConsumption},
};

/// Shared, read-only state of the query server.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<SeriesPipeline<Arc<dyn MeterDataSource>>>,
    measuring_points: MeasuringPointsConfig,
}

impl AppState {
    pub fn new(
        source: Arc<dyn MeterDataSource>,
        window: TariffWindow,
        measuring_points: MeasuringPointsConfig,
    ) -> Self {
        Self {
            pipeline: Arc::new(SeriesPipeline::new(source, window)),
            measuring_points,
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Upstream(String),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(m) | ApiError::Upstream(m) | ApiError::Internal(m) => m,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.message() }))).into_response()
    }
}

impl From<SeriesError> for ApiError {
    fn from(e: SeriesError) -> Self {
        match e {
            SeriesError::InvalidPeriod(_) => ApiError::BadRequest(e.to_string()),
            SeriesError::Fetch(_) => ApiError::Upstream(e.to_string()),
            _ => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<SummaryError> for ApiError {
    fn from(e: SummaryError) -> Self {
        match e {
            SummaryError::Fetch(_) => ApiError::Upstream(e.to_string()),
            _ => ApiError::Internal(e.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SeriesQuery {
    pub from: String,
    pub to: Option<String>,
    pub period: String,
    pub measuring_point: Option<u64>,
    pub unit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct YearQuery {
    pub measuring_point: Option<u64>,
    pub unit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MeasuringPointsQuery {
    pub unit: Option<String>,
}

/// An explicit `measuring_point` wins; otherwise the configured point for
/// `unit`, electricity by default.
fn measuring_point_for(
    points: &MeasuringPointsConfig,
    measuring_point: Option<u64>,
    unit: Option<&str>,
) -> Result<u64, ApiError> {
    if let Some(mp) = measuring_point {
        return Ok(mp);
    }
    match unit.map(str::to_ascii_lowercase).as_deref() {
        None | Some("electricity") => Ok(points.electricity),
        Some("gas") => points
            .gas
            .ok_or_else(|| ApiError::BadRequest("no gas measuring point configured".to_string())),
        Some(other) => Err(ApiError::BadRequest(format!(
            "unit must be 'electricity' or 'gas', got '{other}'"
        ))),
    }
}

pub async fn series(
    State(state): State<AppState>,
    Query(q): Query<SeriesQuery>,
) -> Result<Json<Vec<MergedRecord>>, ApiError> {
    metrics::counter!("query_requests_total", "route" => "series").increment(1);

    let period: Period = q.period.parse().map_err(SeriesError::from)?;
    let from = timestamp::parse_date(&q.from).map_err(|e| ApiError::BadRequest(format!("from: {e}")))?;
    let to = match &q.to {
        Some(to) => timestamp::parse_date(to).map_err(|e| ApiError::BadRequest(format!("to: {e}")))?,
        None => from,
    };
    let mp = measuring_point_for(&state.measuring_points, q.measuring_point, q.unit.as_deref())?;

    let records = state.pipeline.build_series(mp, from, to, period).await?;
    Ok(Json(records))
}

pub async fn year_consumption(
    State(state): State<AppState>,
    Query(q): Query<YearQuery>,
) -> Result<Json<YearConsumption>, ApiError> {
    metrics::counter!("query_requests_total", "route" => "year_consumption").increment(1);

    let mp = measuring_point_for(&state.measuring_points, q.measuring_point, q.unit.as_deref())?;
    let today = OffsetDateTime::now_utc().date();

    let summary = summary::year_consumption(&state.pipeline.source, mp, today).await?;
    Ok(Json(summary))
}

pub async fn measuring_points(
    State(state): State<AppState>,
    Query(q): Query<MeasuringPointsQuery>,
) -> Result<Json<Vec<MeasuringPoint>>, ApiError> {
    metrics::counter!("query_requests_total", "route" => "measuring_points").increment(1);

    let source = &state.pipeline.source;
    let res = match q.unit.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => source.list_measuring_points().await,
        Some("electricity") => source.electricity_measuring_points().await,
        Some("gas") => source.gas_measuring_points().await,
        Some(other) => {
            return Err(ApiError::BadRequest(format!(
                "unit must be 'electricity' or 'gas', got '{other}'"
            )))
        }
    };

    res.map(Json).map_err(|e| ApiError::Upstream(e.to_string()))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/series", get(series))
        .route("/year-consumption", get(year_consumption))
        .route("/measuring-points", get(measuring_points))
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
}

pub async fn serve(bind_addr: &str, state: AppState) -> anyhow::Result<()> {
    let addr: SocketAddr = bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid server.bind_addr '{bind_addr}': {e}"))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(%addr, "query server listening");
    axum::serve(listener, router(state).into_make_service()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::FakeSource;
    use meter_client::domain::{RawSample, UnitType};

    fn state(source: FakeSource) -> AppState {
        AppState::new(
            Arc::new(source),
            TariffWindow::default(),
            MeasuringPointsConfig {
                electricity: 77,
                gas: None,
            },
        )
    }

    fn query(period: &str) -> SeriesQuery {
        SeriesQuery {
            from: "2021-01-01".to_string(),
            to: Some("2021-01-31".to_string()),
            period: period.to_string(),
            measuring_point: None,
            unit: None,
        }
    }

    #[tokio::test]
    async fn series_returns_classified_records() {
        let st = state(FakeSource {
            day: vec![
                RawSample::new("2021-01-01 00:00:00", 181, "1.000"),
                RawSample::new("2021-01-01 00:00:00", 182, "0.500"),
            ],
            ..Default::default()
        });

        let Json(records) = series(State(st), Query(query("DAY"))).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].consumption.total, Some(1500));
    }

    #[tokio::test]
    async fn unit_selects_the_configured_measuring_point() {
        let source = Arc::new(FakeSource {
            month: vec![RawSample::new("2021-01-01 00:00:00", 181, "4")],
            ..Default::default()
        });
        let st = AppState::new(
            source.clone(),
            TariffWindow::default(),
            MeasuringPointsConfig {
                electricity: 77,
                gas: Some(88),
            },
        );
        let mut q = query("MONTH");
        q.unit = Some("Gas".to_string());

        series(State(st.clone()), Query(q)).await.unwrap();
        assert_eq!(source.calls()[0].0, 88);

        let points = &st.measuring_points;
        assert_eq!(measuring_point_for(points, None, None).unwrap(), 77);
        assert_eq!(measuring_point_for(points, Some(5), Some("gas")).unwrap(), 5);
    }

    #[tokio::test]
    async fn gas_without_configured_point_is_a_bad_request() {
        let err = year_consumption(
            State(state(FakeSource::default())),
            Query(YearQuery {
                measuring_point: None,
                unit: Some("gas".to_string()),
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_period_is_a_bad_request() {
        let err = series(State(state(FakeSource::default())), Query(query("WEEK")))
            .await
            .unwrap_err();

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_date_is_a_bad_request() {
        let mut q = query("DAY");
        q.from = "01-01-2021".to_string();

        let err = series(State(state(FakeSource::default())), Query(q))
            .await
            .unwrap_err();

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn provider_failure_is_a_bad_gateway() {
        let st = state(FakeSource {
            fail_with_status: Some(500),
            ..Default::default()
        });

        let err = series(State(st), Query(query("MONTH"))).await.unwrap_err();

        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn measuring_points_filter_by_unit() {
        let st = state(FakeSource {
            points: vec![
                MeasuringPoint {
                    id: 1,
                    unit_type: UnitType::Electricity,
                    label: None,
                },
                MeasuringPoint {
                    id: 2,
                    unit_type: UnitType::Gas,
                    label: Some("gas".to_string()),
                },
            ],
            ..Default::default()
        });

        let Json(gas) = measuring_points(
            State(st.clone()),
            Query(MeasuringPointsQuery {
                unit: Some("GAS".to_string()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(gas.len(), 1);
        assert_eq!(gas[0].id, 2);

        let err = measuring_points(
            State(st),
            Query(MeasuringPointsQuery {
                unit: Some("water".to_string()),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
