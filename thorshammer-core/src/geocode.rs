//! Forward geocoding: turn a free-text place name into coordinates.
//! Uses Nominatim (OpenStreetMap), which needs no API key but does require
//! an identifying User-Agent.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::{fmt::Debug, time::Duration};
use tracing::debug;

use crate::{error::GeocodeError, model::Coordinates};

pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
pub const GEOCODE_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_USER_AGENT: &str = "thorshammer";

#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    async fn geocode(&self, name: &str) -> Result<Coordinates, GeocodeError>;
}

#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    base_url: String,
    user_agent: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

impl NominatimGeocoder {
    pub fn new(user_agent: &str) -> Result<Self, GeocodeError> {
        Self::with_base_url(user_agent, NOMINATIM_URL)
    }

    pub fn with_base_url(user_agent: &str, base_url: &str) -> Result<Self, GeocodeError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent: user_agent.to_string(),
            http: build_client(user_agent, GEOCODE_TIMEOUT)?,
        })
    }

    /// Replace the default lookup timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, GeocodeError> {
        self.http = build_client(&self.user_agent, timeout)?;
        Ok(self)
    }
}

fn build_client(user_agent: &str, timeout: Duration) -> Result<Client, GeocodeError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
        .map_err(GeocodeError::from_reqwest)
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, name: &str) -> Result<Coordinates, GeocodeError> {
        let url = format!("{}/search", self.base_url);
        debug!(%name, "geocoding");

        let response = self
            .http
            .get(url)
            .query(&[("q", name), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(GeocodeError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::ServiceError(format!("Nominatim returned status {status}")));
        }

        let places: Vec<NominatimPlace> =
            response.json().await.map_err(GeocodeError::from_reqwest)?;

        let place = places.into_iter().next().ok_or_else(|| GeocodeError::NotFound(name.into()))?;

        let parse = |raw: &str, what: &str| {
            raw.trim().parse::<f64>().map_err(|_| {
                GeocodeError::ServiceError(format!("Nominatim returned invalid {what} '{raw}'"))
            })
        };

        Ok(Coordinates {
            latitude: parse(&place.lat, "latitude")?,
            longitude: parse(&place.lon, "longitude")?,
        })
    }
}
