use std::fmt;

use serde::{Deserialize, Serialize};

/// Resolved position of a place name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Unit system requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
    Scientific,
}

/// Scale a provider reported temperature in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureScale {
    Celsius,
    Fahrenheit,
    Kelvin,
}

impl TemperatureScale {
    pub fn tag(self) -> &'static str {
        match self {
            TemperatureScale::Celsius => "°C",
            TemperatureScale::Fahrenheit => "°F",
            TemperatureScale::Kelvin => "K",
        }
    }

    pub fn to_celsius(self, value: f64) -> f64 {
        match self {
            TemperatureScale::Celsius => value,
            TemperatureScale::Fahrenheit => (value - 32.0) * 5.0 / 9.0,
            TemperatureScale::Kelvin => value - 273.15,
        }
    }
}

/// Unit tags attached to the numeric fields of an [`Observation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitTags {
    pub temperature: TemperatureScale,
    pub pressure: &'static str,
    pub wind_speed: &'static str,
    pub precipitation: &'static str,
}

/// Observation time exactly as the provider sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObservationTime {
    Text(String),
    Number(serde_json::Number),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WindDirection {
    Text(String),
    Degrees(f64),
}

/// Provider-agnostic view of one observation.
///
/// Provider extractors fill this in; condition derivation and report
/// construction only ever look at this record.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub timestamp: ObservationTime,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_direction: Option<WindDirection>,
    pub precipitation_rate: Option<f64>,
    pub cloud_cover: Option<f64>,
    pub condition_code: Option<i64>,
    pub description: Option<String>,
    pub units: UnitTags,
}

/// Numeric value plus unit tag. `value: None` marks the field as not available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub value: Option<f64>,
    pub unit: String,
}

impl Measurement {
    pub fn new(value: Option<f64>, unit: &str) -> Self {
        Self { value, unit: unit.to_string() }
    }

    pub fn is_available(&self) -> bool {
        self.value.is_some()
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Some(v) => write!(f, "{v} {}", self.unit),
            None => write!(f, "N/A {}", self.unit),
        }
    }
}

/// Human-readable condition label derived from an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    #[serde(rename = "Rainy/Precipitating")]
    Precipitating,
    #[serde(rename = "Snowy")]
    Snowy,
    #[serde(rename = "Overcast")]
    Overcast,
    #[serde(rename = "Partly Cloudy")]
    PartlyCloudy,
    #[serde(rename = "Clear and Warm")]
    ClearWarm,
    #[serde(rename = "Clear and Cold")]
    ClearCold,
    #[serde(rename = "Clear")]
    Clear,
}

impl Condition {
    pub fn label(&self) -> &'static str {
        match self {
            Condition::Precipitating => "Rainy/Precipitating",
            Condition::Snowy => "Snowy",
            Condition::Overcast => "Overcast",
            Condition::PartlyCloudy => "Partly Cloudy",
            Condition::ClearWarm => "Clear and Warm",
            Condition::ClearCold => "Clear and Cold",
            Condition::Clear => "Clear",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Canonical, flat weather report. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    location: String,
    latitude: f64,
    longitude: f64,
    timestamp: ObservationTime,
    temperature: Measurement,
    humidity: Measurement,
    pressure: Measurement,
    wind_speed: Measurement,
    wind_direction: Option<WindDirection>,
    precipitation_rate: Measurement,
    cloud_cover: Measurement,
    condition: Condition,
    condition_code: Option<i64>,
    condition_description: Option<String>,
}

impl WeatherReport {
    pub(crate) fn from_observation(
        location: &str,
        coords: Coordinates,
        obs: Observation,
        condition: Condition,
    ) -> Self {
        let units = obs.units;
        Self {
            location: location.to_string(),
            latitude: coords.latitude,
            longitude: coords.longitude,
            timestamp: obs.timestamp,
            temperature: Measurement::new(obs.temperature, units.temperature.tag()),
            humidity: Measurement::new(obs.humidity, "%"),
            pressure: Measurement::new(obs.pressure, units.pressure),
            wind_speed: Measurement::new(obs.wind_speed, units.wind_speed),
            wind_direction: obs.wind_direction,
            precipitation_rate: Measurement::new(obs.precipitation_rate, units.precipitation),
            cloud_cover: Measurement::new(obs.cloud_cover, "%"),
            condition,
            condition_code: obs.condition_code,
            condition_description: obs.description,
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates { latitude: self.latitude, longitude: self.longitude }
    }

    pub fn timestamp(&self) -> &ObservationTime {
        &self.timestamp
    }

    pub fn temperature(&self) -> &Measurement {
        &self.temperature
    }

    pub fn humidity(&self) -> &Measurement {
        &self.humidity
    }

    pub fn pressure(&self) -> &Measurement {
        &self.pressure
    }

    pub fn wind_speed(&self) -> &Measurement {
        &self.wind_speed
    }

    pub fn wind_direction(&self) -> Option<&WindDirection> {
        self.wind_direction.as_ref()
    }

    pub fn precipitation_rate(&self) -> &Measurement {
        &self.precipitation_rate
    }

    pub fn cloud_cover(&self) -> &Measurement {
        &self.cloud_cover
    }

    pub fn condition(&self) -> Condition {
        self.condition
    }

    pub fn condition_code(&self) -> Option<i64> {
        self.condition_code
    }

    pub fn condition_description(&self) -> Option<&str> {
        self.condition_description.as_deref()
    }
}
