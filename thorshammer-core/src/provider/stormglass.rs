use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::{
    error::{NormalizationError, ProviderError},
    model::{Coordinates, Observation, TemperatureScale, UnitTags, WindDirection},
    normalize::{as_number, as_timestamp, first_observation},
};

use super::{PROVIDER_TIMEOUT, ProviderId, RawPayload, WeatherProvider, http_client, send_json};

pub const DEFAULT_BASE_URL: &str = "https://api.stormglass.io/v2";

const PARAMS: &str =
    "airTemperature,humidity,pressure,windSpeed,windDirection,precipitation,cloudCover";

/// Source preferred when a parameter carries several model values.
const PREFERRED_SOURCE: &str = "sg";

const UNITS: UnitTags = UnitTags {
    temperature: TemperatureScale::Celsius,
    pressure: "hPa",
    wind_speed: "m/s",
    precipitation: "kg/m²/h",
};

/// Stormglass point-weather endpoint; the first hourly entry is treated as current.
#[derive(Debug, Clone)]
pub struct StormglassProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl StormglassProvider {
    pub fn new(api_key: String) -> Result<Self, ProviderError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: &str) -> Result<Self, ProviderError> {
        let http = http_client(PROVIDER_TIMEOUT).map_err(ProviderError::from_reqwest)?;
        Ok(Self { api_key, base_url: base_url.trim_end_matches('/').to_string(), http })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ProviderError> {
        self.http = http_client(timeout).map_err(ProviderError::from_reqwest)?;
        Ok(self)
    }
}

#[async_trait]
impl WeatherProvider for StormglassProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Stormglass
    }

    async fn current_weather(&self, coords: Coordinates) -> Result<RawPayload, ProviderError> {
        let url = format!("{}/weather/point", self.base_url);
        debug!(lat = coords.latitude, lon = coords.longitude, "querying Stormglass point weather");

        let request = self
            .http
            .get(url)
            .header("Authorization", self.api_key.as_str())
            .query(&[
                ("lat", coords.latitude.to_string()),
                ("lng", coords.longitude.to_string()),
                ("params", PARAMS.to_string()),
            ]);

        let body = send_json(request).await?;
        Ok(RawPayload::Stormglass { body })
    }
}

/// Value of one parameter, taken from the `sg` source when present.
fn sourced_number(entry: &Value, key: &str) -> Option<f64> {
    let sources = entry.get(key)?;
    if let Some(n) = as_number(sources) {
        return Some(n);
    }

    let sources = sources.as_object()?;
    sources
        .get(PREFERRED_SOURCE)
        .and_then(as_number)
        .or_else(|| sources.values().find_map(as_number))
}

pub(crate) fn extract(body: &Value) -> Result<Observation, NormalizationError> {
    let entry = first_observation(body, "hours")?;

    let timestamp = entry
        .get("time")
        .and_then(as_timestamp)
        .ok_or(NormalizationError::FieldExtraction("timestamp"))?;

    Ok(Observation {
        timestamp,
        temperature: sourced_number(entry, "airTemperature"),
        humidity: sourced_number(entry, "humidity"),
        pressure: sourced_number(entry, "pressure"),
        wind_speed: sourced_number(entry, "windSpeed"),
        wind_direction: sourced_number(entry, "windDirection").map(WindDirection::Degrees),
        precipitation_rate: sourced_number(entry, "precipitation"),
        cloud_cover: sourced_number(entry, "cloudCover"),
        condition_code: None,
        description: None,
        units: UNITS,
    })
}
