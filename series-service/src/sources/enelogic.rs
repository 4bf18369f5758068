use std::time::Instant;

use meter_client::{
    domain::{Granularity, MeasuringPoint, RawSample},
    EnelogicClient, FetchError,
};
use time::Date;

use crate::pipeline::MeterDataSource;

/// [`MeterDataSource`] backed by the Enelogic REST API.
#[derive(Debug, Clone)]
pub struct EnelogicSource {
    client: EnelogicClient,
}

impl EnelogicSource {
    pub fn new(client: EnelogicClient) -> Self {
        Self { client }
    }
}

fn record_outcome<T>(endpoint: &'static str, started: Instant, res: &Result<Vec<T>, FetchError>) {
    metrics::counter!("provider_requests_total", "endpoint" => endpoint).increment(1);
    metrics::histogram!("provider_fetch_latency_seconds", "endpoint" => endpoint)
        .record(started.elapsed().as_secs_f64());

    match res {
        Ok(items) => {
            tracing::debug!(endpoint, items = items.len(), "provider fetch ok");
        }
        Err(e) => {
            metrics::counter!("provider_fetch_errors_total", "endpoint" => endpoint).increment(1);
            tracing::error!(endpoint, error = %e, "provider fetch failed");
        }
    }
}

#[async_trait::async_trait]
impl MeterDataSource for EnelogicSource {
    async fn fetch_samples(
        &self,
        measuring_point: u64,
        granularity: Granularity,
        from: Date,
        to: Date,
    ) -> Result<Vec<RawSample>, FetchError> {
        let started = Instant::now();
        let res = self
            .client
            .datapoints(measuring_point, granularity, from, to)
            .await;
        record_outcome(granularity.path_segment(), started, &res);
        res
    }

    async fn list_measuring_points(&self) -> Result<Vec<MeasuringPoint>, FetchError> {
        let started = Instant::now();
        let res = self.client.measuring_points().await;
        record_outcome("measuringpoints", started, &res);
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::time::Duration;
    use time::macros::date;

    fn source(server: &Server) -> EnelogicSource {
        EnelogicSource::new(EnelogicClient::new(server.url(), "secret", Duration::from_secs(5)).unwrap())
    }

    #[tokio::test]
    async fn fetches_samples_through_the_client() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/measuringpoints/7/datapoint/days/2021-06-07/2021-06-08")
            .match_query(Matcher::UrlEncoded("access_token".into(), "secret".into()))
            .with_status(200)
            .with_body(
                json!([
                    {"date": "2021-06-07 00:00:00", "rate": 181, "quantity": "10.5"},
                    {"date": "2021-06-07 00:00:00", "rate": 182, "quantity": 20}
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let samples = source(&server)
            .fetch_samples(7, Granularity::Day, date!(2021-06-07), date!(2021-06-08))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0], RawSample::new("2021-06-07 00:00:00", 181, "10.5"));
        assert_eq!(samples[1].quantity, "20");
    }

    #[tokio::test]
    async fn provider_errors_are_returned_unchanged() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/measuringpoints")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let err = source(&server).gas_measuring_points().await.unwrap_err();

        assert_eq!(err.status(), Some(503));
        assert!(err.url().ends_with("/measuringpoints"));
    }
}
