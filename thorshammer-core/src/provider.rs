use crate::{
    Config,
    error::ProviderError,
    model::{Coordinates, Units},
    provider::{stormglass::StormglassProvider, weatherbit::WeatherbitProvider},
};
use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde_json::Value;
use std::{convert::TryFrom, fmt::Debug, time::Duration};

pub mod stormglass;
pub mod weatherbit;

/// Upper bound on a single weather provider call.
pub const PROVIDER_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    Weatherbit,
    Stormglass,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Weatherbit => "weatherbit",
            ProviderId::Stormglass => "stormglass",
        }
    }

    /// Environment variable holding this provider's API key.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            ProviderId::Weatherbit => "WEATHERBIT_API_KEY",
            ProviderId::Stormglass => "STORMGLASS_API_KEY",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::Weatherbit, ProviderId::Stormglass]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "weatherbit" => Ok(ProviderId::Weatherbit),
            "stormglass" => Ok(ProviderId::Stormglass),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: weatherbit, stormglass."
            )),
        }
    }
}

/// Provider response body, tagged with the provider that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPayload {
    Weatherbit { body: Value, units: Units },
    Stormglass { body: Value },
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    async fn current_weather(&self, coords: Coordinates) -> Result<RawPayload, ProviderError>;
}

/// Construct a provider from config and explicit ProviderId.
///
/// Fails before any network traffic when the API key is unset or still the
/// placeholder value.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
) -> anyhow::Result<Box<dyn WeatherProvider>> {
    provider_from_config_with(id, config, |name| std::env::var(name).ok())
}

/// Same as [`provider_from_config`], reading environment variables through `env`.
pub fn provider_from_config_with(
    id: ProviderId,
    config: &Config,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.resolve_api_key_with(id, env)?;

    let boxed: Box<dyn WeatherProvider> = match id {
        ProviderId::Weatherbit => Box::new(WeatherbitProvider::new(api_key, config.units)?),
        ProviderId::Stormglass => Box::new(StormglassProvider::new(api_key)?),
    };

    Ok(boxed)
}

/// Construct the default provider from config, using `default_provider` field.
pub fn default_provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let id = config.default_provider_id()?;
    provider_from_config(id, config)
}

pub(crate) fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().timeout(timeout).build()
}

/// Send a request and decode the body as JSON, classifying every failure.
pub(crate) async fn send_json(request: RequestBuilder) -> Result<Value, ProviderError> {
    let res = request.send().await.map_err(ProviderError::from_reqwest)?;

    let status = res.status();
    let body = res.text().await.map_err(ProviderError::from_reqwest)?;

    if !status.is_success() {
        return Err(ProviderError::Http { status: status.as_u16(), body: truncate_body(&body) });
    }

    serde_json::from_str(&body).map_err(|e| {
        ProviderError::MalformedResponse(format!("{e}; body: {}", truncate_body(&body)))
    })
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
