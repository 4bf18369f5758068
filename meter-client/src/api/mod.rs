use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use time::Date;

use crate::domain::{
    timestamp::format_date, Granularity, MeasuringPoint, RawSample, TimestampField,
};

pub const DEFAULT_HOST: &str = "https://enelogic.com/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Failure to obtain data from the provider.
///
/// URLs carried here never include the access token; it is sent as a
/// separate query parameter.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("error fetching provider data from URL {url}: {status} - {reason}")]
    Status {
        url: String,
        status: u16,
        reason: String,
    },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("invalid response body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    pub fn url(&self) -> &str {
        match self {
            FetchError::Status { url, .. }
            | FetchError::Transport { url, .. }
            | FetchError::Decode { url, .. } => url,
        }
    }

    /// HTTP status, when the provider answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            FetchError::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            FetchError::Decode { .. } => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireQuantity {
    Text(String),
    Number(serde_json::Number),
}

impl WireQuantity {
    fn into_text(self) -> String {
        match self {
            WireQuantity::Text(s) => s,
            WireQuantity::Number(n) => n.to_string(),
        }
    }
}

/// Datapoint as returned by the provider's datapoint endpoints.
#[derive(Deserialize)]
struct WireDatapoint {
    date: Option<String>,
    datetime: Option<String>,
    rate: u16,
    quantity: WireQuantity,
}

impl WireDatapoint {
    fn into_sample(self, field: TimestampField) -> Result<RawSample, String> {
        let timestamp = match field {
            TimestampField::Date => self.date,
            TimestampField::DateTime => self.datetime,
        }
        .ok_or_else(|| format!("datapoint with rate {} has no '{}' field", self.rate, field.as_str()))?;

        Ok(RawSample {
            timestamp,
            rate: self.rate,
            quantity: self.quantity.into_text(),
        })
    }
}

/// REST client for the Enelogic metering API.
#[derive(Clone)]
pub struct EnelogicClient {
    host: String,
    access_token: String,
    client: Client,
}

impl std::fmt::Debug for EnelogicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnelogicClient")
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

impl EnelogicClient {
    pub fn new(
        host: impl Into<String>,
        access_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            host: host.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            client,
        })
    }

    /// Absolute URLs are used as given, anything else is relative to the host.
    fn resolve(&self, path: &str) -> String {
        if path.to_ascii_lowercase().starts_with("http") {
            path.to_string()
        } else {
            format!("{}{}", self.host, path)
        }
    }

    /// GET a JSON document from the provider.
    pub async fn fetch_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let url = self.resolve(path);
        let started = Instant::now();

        let response = self
            .client
            .get(&url)
            .query(&[("access_token", self.access_token.as_str())])
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::warn!(%url, status = status.as_u16(), "provider request failed");
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        let body = response.bytes().await.map_err(|source| FetchError::Transport {
            url: url.clone(),
            source,
        })?;

        tracing::debug!(
            %url,
            bytes = body.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "provider request completed"
        );

        serde_json::from_slice(&body).map_err(|source| FetchError::Decode { url, source })
    }

    pub async fn measuring_points(&self) -> Result<Vec<MeasuringPoint>, FetchError> {
        self.fetch_json("/measuringpoints").await
    }

    /// Raw datapoints for one measuring point over `[from, to]`.
    pub async fn datapoints(
        &self,
        measuring_point: u64,
        granularity: Granularity,
        from: Date,
        to: Date,
    ) -> Result<Vec<RawSample>, FetchError> {
        let path = format!(
            "/measuringpoints/{}/{}/{}/{}",
            measuring_point,
            granularity.path_segment(),
            format_date(from),
            format_date(to),
        );
        let url = self.resolve(&path);

        let wire: Vec<WireDatapoint> = self.fetch_json(&path).await?;
        let field = granularity.timestamp_field();

        wire.into_iter()
            .map(|dp| dp.into_sample(field))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|msg| FetchError::Decode {
                url,
                source: serde::de::Error::custom(msg),
            })
    }
}
