use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use crate::error::FetchError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Departures,
    Arrivals,
}

impl Mode {
    pub fn toggle(self) -> Self {
        match self {
            Mode::Departures => Mode::Arrivals,
            Mode::Arrivals => Mode::Departures,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::Departures => "DEPARTURES",
            Mode::Arrivals => "ARRIVALS",
        }
    }

    /// Path segment under `/api/`.
    pub fn endpoint(self) -> &'static str {
        match self {
            Mode::Departures => "departures",
            Mode::Arrivals => "arrivals",
        }
    }

    pub fn location_label(self) -> &'static str {
        match self {
            Mode::Departures => "Destination",
            Mode::Arrivals => "Origin",
        }
    }

    pub fn secondary_label(self) -> &'static str {
        match self {
            Mode::Departures => "Check-in",
            Mode::Arrivals => "Baggage",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "departures" | "departure" | "dep" | "d" => Some(Mode::Departures),
            "arrivals" | "arrival" | "arr" | "a" => Some(Mode::Arrivals),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct FlightsResponse {
    #[serde(default)]
    pub version: Option<Value>,
    #[serde(default, deserialize_with = "de_opt_string_from_any")]
    pub error: Option<String>,
    #[serde(default, deserialize_with = "de_flights")]
    pub flights: Vec<Flight>,
    #[serde(default, deserialize_with = "de_opt_string_from_any")]
    pub last_updated_hkt: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string_from_any")]
    pub mode: Option<String>,
    #[serde(default)]
    pub flight_count: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Flight {
    #[serde(default, deserialize_with = "de_opt_string_from_any")]
    pub time: Option<String>,
    #[serde(default, deserialize_with = "de_string_list")]
    pub flight_numbers_only: Vec<String>,
    #[serde(default, deserialize_with = "de_opt_string_from_any")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string_from_any")]
    pub location_secondary: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string_from_any")]
    pub terminal: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string_from_any")]
    pub gate: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string_from_any")]
    pub status: Option<String>,
}

/// A payload that passed shape validation.
#[derive(Clone, Debug, Default)]
pub struct FlightBatch {
    pub flights: Vec<Flight>,
    pub version: String,
    pub last_updated_hkt: Option<String>,
    pub flight_count: Option<u64>,
    /// Board name echoed by the backend, if any.
    pub mode: Option<String>,
}

impl FlightsResponse {
    /// A payload is only usable when it carries a truthy `version` and no
    /// `error` field.
    pub fn into_batch(self) -> Result<FlightBatch, FetchError> {
        if let Some(err) = self.error {
            return Err(FetchError::Backend(err));
        }
        let version = match self.version.as_ref() {
            Some(value) if is_truthy(value) => version_text(value),
            _ => return Err(FetchError::MissingVersion),
        };
        if let Some(count) = self.flight_count {
            if count as usize != self.flights.len() {
                debug!(
                    "flight_count {} disagrees with {} flights received",
                    count,
                    self.flights.len()
                );
            }
        }
        Ok(FlightBatch {
            flights: self.flights,
            version,
            last_updated_hkt: self.last_updated_hkt,
            flight_count: self.flight_count,
            mode: self.mode,
        })
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|v| v != 0.0 && !v.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn version_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn de_opt_string_from_any<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Array(_) | Value::Object(_) => Err(serde::de::Error::custom(
            "expected string, number or null",
        )),
        other => Ok(scalar_to_string(other)),
    }
}

fn de_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items.into_iter().filter_map(scalar_to_string).collect()),
        Value::String(text) => Ok(vec![text]),
        other => Err(serde::de::Error::custom(format!(
            "expected list of flight numbers, got {other}"
        ))),
    }
}

fn de_flights<'de, D>(deserializer: D) -> Result<Vec<Flight>, D::Error>
where
    D: Deserializer<'de>,
{
    let flights: Option<Vec<Flight>> = Option::deserialize(deserializer)?;
    Ok(flights.unwrap_or_default())
}
