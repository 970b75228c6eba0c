use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::{
    error::{NormalizationError, ProviderError},
    model::{Coordinates, Observation, TemperatureScale, UnitTags, Units, WindDirection},
    normalize::{as_number, as_timestamp, first_observation},
};

use super::{PROVIDER_TIMEOUT, ProviderId, RawPayload, WeatherProvider, http_client, send_json};

pub const DEFAULT_BASE_URL: &str = "https://api.weatherbit.io/v2.0";

/// Weatherbit "current weather" endpoint.
#[derive(Debug, Clone)]
pub struct WeatherbitProvider {
    api_key: String,
    units: Units,
    base_url: String,
    http: Client,
}

impl WeatherbitProvider {
    pub fn new(api_key: String, units: Units) -> Result<Self, ProviderError> {
        Self::with_base_url(api_key, units, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(
        api_key: String,
        units: Units,
        base_url: &str,
    ) -> Result<Self, ProviderError> {
        let http = http_client(PROVIDER_TIMEOUT).map_err(ProviderError::from_reqwest)?;
        Ok(Self { api_key, units, base_url: base_url.trim_end_matches('/').to_string(), http })
    }

    /// Replace the default per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ProviderError> {
        self.http = http_client(timeout).map_err(ProviderError::from_reqwest)?;
        Ok(self)
    }
}

#[async_trait]
impl WeatherProvider for WeatherbitProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Weatherbit
    }

    async fn current_weather(&self, coords: Coordinates) -> Result<RawPayload, ProviderError> {
        let url = format!("{}/current", self.base_url);
        debug!(lat = coords.latitude, lon = coords.longitude, "querying Weatherbit");

        let request = self.http.get(url).query(&[
            ("lat", coords.latitude.to_string()),
            ("lon", coords.longitude.to_string()),
            ("key", self.api_key.clone()),
            ("units", units_param(self.units).to_string()),
        ]);

        let body = send_json(request).await?;
        Ok(RawPayload::Weatherbit { body, units: self.units })
    }
}

fn units_param(units: Units) -> &'static str {
    match units {
        Units::Metric => "M",
        Units::Imperial => "I",
        Units::Scientific => "S",
    }
}

fn unit_tags(units: Units) -> UnitTags {
    match units {
        Units::Metric => UnitTags {
            temperature: TemperatureScale::Celsius,
            pressure: "mb",
            wind_speed: "m/s",
            precipitation: "mm/hr",
        },
        Units::Imperial => UnitTags {
            temperature: TemperatureScale::Fahrenheit,
            pressure: "mb",
            wind_speed: "mph",
            precipitation: "in/hr",
        },
        Units::Scientific => UnitTags {
            temperature: TemperatureScale::Kelvin,
            pressure: "mb",
            wind_speed: "m/s",
            precipitation: "mm/hr",
        },
    }
}

/// Integer condition code, as a number or numeric string. Fractions are rejected.
fn as_code(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Pull the first entry of `data` out of a Weatherbit response.
pub(crate) fn extract(body: &Value, units: Units) -> Result<Observation, NormalizationError> {
    let entry = first_observation(body, "data")?;

    let timestamp = ["datetime", "ob_time", "ts"]
        .iter()
        .find_map(|key| entry.get(*key).and_then(as_timestamp))
        .ok_or(NormalizationError::FieldExtraction("timestamp"))?;

    let number = |key: &str| entry.get(key).and_then(as_number);
    let weather = entry.get("weather");

    let wind_direction = entry
        .get("wind_cdir_full")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(|s| WindDirection::Text(s.to_string()))
        .or_else(|| number("wind_dir").map(WindDirection::Degrees));

    Ok(Observation {
        timestamp,
        temperature: number("temp"),
        humidity: number("rh"),
        pressure: number("pres"),
        wind_speed: number("wind_spd"),
        wind_direction,
        precipitation_rate: number("precip"),
        cloud_cover: number("clouds"),
        condition_code: weather.and_then(|w| w.get("code")).and_then(as_code),
        description: weather
            .and_then(|w| w.get("description"))
            .and_then(Value::as_str)
            .map(str::to_string),
        units: unit_tags(units),
    })
}
