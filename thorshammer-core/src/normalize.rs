//! Turns a raw provider payload into a [`WeatherReport`].
//!
//! Extraction is tolerant: a field that is missing or has the wrong shape
//! becomes "not available" on its own. Only a missing observation container
//! or an unusable timestamp aborts the whole call.

use serde_json::Value;

use crate::{
    error::NormalizationError,
    model::{Condition, Coordinates, Observation, ObservationTime, WeatherReport},
    provider::{RawPayload, stormglass, weatherbit},
};

const PRECIPITATION_THRESHOLD: f64 = 0.1;
const OVERCAST_CLOUD_PCT: f64 = 75.0;
const PARTLY_CLOUDY_PCT: f64 = 25.0;
const WARM_ABOVE_C: f64 = 25.0;
const COLD_BELOW_C: f64 = 0.0;

/// Build a report for `location` out of one provider payload.
pub fn normalize(
    payload: &RawPayload,
    location: &str,
    latitude: f64,
    longitude: f64,
) -> Result<WeatherReport, NormalizationError> {
    let observation = match payload {
        RawPayload::Weatherbit { body, units } => weatherbit::extract(body, *units)?,
        RawPayload::Stormglass { body } => stormglass::extract(body)?,
    };

    let condition = derive_condition(&observation);
    let coords = Coordinates { latitude, longitude };

    Ok(WeatherReport::from_observation(location, coords, observation, condition))
}

/// First match wins; the rule order is significant.
///
/// Missing precipitation and cloud cover count as zero here. A missing
/// temperature skips the warm/cold rules instead.
pub fn derive_condition(obs: &Observation) -> Condition {
    let description = obs.description.as_deref().unwrap_or_default().to_lowercase();
    let precip = obs.precipitation_rate.unwrap_or(0.0);
    let clouds = obs.cloud_cover.unwrap_or(0.0);
    let temp_c = obs.temperature.map(|t| obs.units.temperature.to_celsius(t));

    let wet = description.contains("rain") || description.contains("drizzle");

    if wet || precip > PRECIPITATION_THRESHOLD {
        Condition::Precipitating
    } else if description.contains("snow") {
        Condition::Snowy
    } else if description.contains("cloud") || clouds > OVERCAST_CLOUD_PCT {
        Condition::Overcast
    } else if clouds > PARTLY_CLOUDY_PCT {
        Condition::PartlyCloudy
    } else if temp_c.is_some_and(|t| t > WARM_ABOVE_C) {
        Condition::ClearWarm
    } else if temp_c.is_some_and(|t| t < COLD_BELOW_C) {
        Condition::ClearCold
    } else {
        Condition::Clear
    }
}

/// First element of the top-level observation array named `container`.
pub(crate) fn first_observation<'a>(
    body: &'a Value,
    container: &str,
) -> Result<&'a Value, NormalizationError> {
    let entries = body
        .get(container)
        .ok_or_else(|| NormalizationError::MalformedPayload(format!("'{container}' missing")))?
        .as_array()
        .ok_or_else(|| {
            NormalizationError::MalformedPayload(format!("'{container}' is not an array"))
        })?;

    entries
        .first()
        .ok_or_else(|| NormalizationError::MalformedPayload(format!("'{container}' is empty")))
}

/// Accept JSON numbers and numeric strings. `NaN` and infinities are rejected.
pub(crate) fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    number.filter(|v: &f64| v.is_finite())
}

pub(crate) fn as_timestamp(value: &Value) -> Option<ObservationTime> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(ObservationTime::Text(s.clone())),
        Value::Number(n) => Some(ObservationTime::Number(n.clone())),
        _ => None,
    }
}
