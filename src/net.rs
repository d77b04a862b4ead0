use std::sync::mpsc::{Receiver, Sender};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::FetchError;
use crate::model::{FlightBatch, FlightsResponse, Mode};
use tracing::{debug, error, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchRequest {
    pub seq: u64,
    pub mode: Mode,
}

#[derive(Debug)]
pub struct FetchOutcome {
    pub seq: u64,
    pub mode: Mode,
    pub result: Result<FlightBatch, FetchError>,
}

#[derive(Clone, Debug)]
pub struct FetcherSettings {
    pub base_url: String,
    pub timeout: Option<Duration>,
    pub insecure: bool,
}

/// Serve board refreshes on a dedicated thread until either channel closes.
pub fn spawn_fetcher(
    settings: FetcherSettings,
    tx: Sender<FetchOutcome>,
    rx: Receiver<FetchRequest>,
) {
    thread::spawn(move || {
        info!("fetcher started for {}", settings.base_url);
        let client = match build_client(&settings) {
            Ok(client) => Some(client),
            Err(err) => {
                error!("client error: {err}");
                None
            }
        };

        while let Ok(request) = rx.recv() {
            let result = match client.as_ref() {
                Some(client) => {
                    let url = endpoint_url(&settings.base_url, request.mode, cache_buster());
                    debug!("fetch #{} {}", request.seq, url);
                    fetch_once(client, &url)
                }
                None => Err(FetchError::Client("HTTP client unavailable".to_string())),
            };
            let outcome = FetchOutcome {
                seq: request.seq,
                mode: request.mode,
                result,
            };
            if tx.send(outcome).is_err() {
                debug!("receiver dropped, exiting fetcher");
                break;
            }
        }
        info!("fetcher stopped");
    });
}

fn build_client(settings: &FetcherSettings) -> Result<reqwest::blocking::Client, FetchError> {
    let mut builder =
        reqwest::blocking::Client::builder().danger_accept_invalid_certs(settings.insecure);
    if let Some(timeout) = settings.timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|err| FetchError::Client(err.to_string()))
}

pub fn endpoint_url(base: &str, mode: Mode, stamp_ms: u128) -> String {
    format!(
        "{}/api/{}?v={}",
        base.trim().trim_end_matches('/'),
        mode.endpoint(),
        stamp_ms
    )
}

fn cache_buster() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

fn fetch_once(client: &reqwest::blocking::Client, url: &str) -> Result<FlightBatch, FetchError> {
    let resp = client.get(url).send().map_err(FetchError::from_reqwest)?;

    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }

    let body = resp.text().map_err(FetchError::from_reqwest)?;
    parse_body(&body)
}

pub fn parse_body(body: &str) -> Result<FlightBatch, FetchError> {
    let data: FlightsResponse =
        serde_json::from_str(body).map_err(|err| FetchError::Decode(err.to_string()))?;
    data.into_batch()
}

#[cfg(test)]
mod tests {
    use super::{endpoint_url, parse_body};
    use crate::error::FetchError;
    use crate::model::Mode;

    #[test]
    fn endpoint_urls_per_mode() {
        assert_eq!(
            endpoint_url("http://127.0.0.1:5001", Mode::Departures, 1700000000000),
            "http://127.0.0.1:5001/api/departures?v=1700000000000"
        );
        assert_eq!(
            endpoint_url(" https://board.example.com/ ", Mode::Arrivals, 5),
            "https://board.example.com/api/arrivals?v=5"
        );
    }

    #[test]
    fn body_failures_collapse_to_fetch_errors() {
        assert!(matches!(parse_body("<html>"), Err(FetchError::Decode(_))));
        assert_eq!(
            parse_body(r#"{"error": "Redis connection not available."}"#).unwrap_err(),
            FetchError::Backend("Redis connection not available.".to_string())
        );
        assert_eq!(
            parse_body(r#"{"flights": []}"#).unwrap_err(),
            FetchError::MissingVersion
        );
        let batch = parse_body(r#"{"version": "v", "flights": [{"location": "Manila"}]}"#).unwrap();
        assert_eq!(batch.flights.len(), 1);
    }
}
