//! Integration tests for the geocoder and provider clients using wiremock.
//!
//! These tests verify request shape and error classification against a mock
//! HTTP server, then drive a full report cycle over HTTP.

use chrono::NaiveDate;
use std::time::Duration;
use thorshammer_core::{
    BackupWriter, CollectionLoop, Condition, Coordinates, FetchError, GeocodeError, Geocoder,
    NominatimGeocoder, ProviderError, RawPayload, Units, WeatherProvider, WeatherReport,
    provider::{stormglass::StormglassProvider, weatherbit::WeatherbitProvider},
};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WESTCLIFFE: Coordinates = Coordinates { latitude: 38.1347, longitude: -105.4661 };

/// Helper to create a Weatherbit current-weather body
fn weatherbit_body(description: &str, temp: f64, clouds: u8, precip: f64) -> serde_json::Value {
    serde_json::json!({
        "count": 1,
        "data": [{
            "datetime": "2025-07-01:14",
            "temp": temp,
            "rh": 35,
            "pres": 771.5,
            "wind_spd": 4.2,
            "wind_cdir_full": "south-southwest",
            "precip": precip,
            "clouds": clouds,
            "weather": { "code": 500, "description": description }
        }]
    })
}

fn nominatim(server: &MockServer) -> NominatimGeocoder {
    NominatimGeocoder::with_base_url("thorshammer-test", &server.uri()).unwrap()
}

fn weatherbit(server: &MockServer, key: &str, units: Units) -> WeatherbitProvider {
    WeatherbitProvider::with_base_url(key.into(), units, &server.uri()).unwrap()
}

async fn mount_nominatim(server: &MockServer, q: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", q))
        .and(query_param("format", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_geocode_success() {
    let mock_server = MockServer::start().await;
    mount_nominatim(
        &mock_server,
        "Westcliffe, CO",
        serde_json::json!([{ "lat": "38.1347", "lon": "-105.4661", "display_name": "Westcliffe" }]),
    )
    .await;

    let geocoder = nominatim(&mock_server);
    let coords = geocoder.geocode("Westcliffe, CO").await.unwrap();

    assert_eq!(coords, WESTCLIFFE);
}

#[tokio::test]
async fn test_geocode_not_found() {
    let mock_server = MockServer::start().await;
    mount_nominatim(&mock_server, "Nowhereville, ZZ", serde_json::json!([])).await;

    let geocoder = nominatim(&mock_server);
    let err = geocoder.geocode("Nowhereville, ZZ").await.unwrap_err();

    assert!(matches!(err, GeocodeError::NotFound(name) if name == "Nowhereville, ZZ"));
}

#[tokio::test]
async fn test_geocode_service_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let geocoder = nominatim(&mock_server);
    let err = geocoder.geocode("Paris").await.unwrap_err();

    assert!(matches!(err, GeocodeError::ServiceError(_)));
}

#[tokio::test]
async fn test_geocode_timeout() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([]))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let geocoder = nominatim(&mock_server).with_timeout(Duration::from_millis(100)).unwrap();
    let err = geocoder.geocode("Westcliffe, CO").await.unwrap_err();

    assert!(matches!(err, GeocodeError::Timeout), "got {err:?}");
}

#[tokio::test]
async fn test_weatherbit_sends_key_and_units() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/current"))
        .and(query_param("key", "WB_KEY"))
        .and(query_param("units", "I"))
        .and(query_param("lat", "38.1347"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(weatherbit_body("Light rain", 61.0, 80, 0.02)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = weatherbit(&mock_server, "WB_KEY", Units::Imperial);
    let payload = provider.current_weather(WESTCLIFFE).await.unwrap();

    match payload {
        RawPayload::Weatherbit { body, units } => {
            assert_eq!(units, Units::Imperial);
            assert_eq!(body["data"][0]["weather"]["description"], "Light rain");
        }
        other => panic!("unexpected payload: {other:?}"),
    }
}

#[tokio::test]
async fn test_weatherbit_http_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/current"))
        .respond_with(
            ResponseTemplate::new(403).set_body_string(r#"{"error":"API key not valid"}"#),
        )
        .mount(&mock_server)
        .await;

    let provider = weatherbit(&mock_server, "BAD", Units::Metric);
    let err = provider.current_weather(WESTCLIFFE).await.unwrap_err();

    match err {
        ProviderError::Http { status, body } => {
            assert_eq!(status, 403);
            assert!(body.contains("API key not valid"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_weatherbit_non_json_body() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/current"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&mock_server)
        .await;

    let provider = weatherbit(&mock_server, "KEY", Units::Metric);
    let err = provider.current_weather(WESTCLIFFE).await.unwrap_err();

    assert!(matches!(err, ProviderError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_provider_timeout() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(weatherbit_body("Clear sky", 20.0, 0, 0.0))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let short = Duration::from_millis(100);
    let provider = weatherbit(&mock_server, "KEY", Units::Metric).with_timeout(short).unwrap();
    let err = provider.current_weather(WESTCLIFFE).await.unwrap_err();
    assert!(matches!(err, ProviderError::Timeout), "got {err:?}");

    let provider = StormglassProvider::with_base_url("SG_KEY".into(), &mock_server.uri())
        .and_then(|p| p.with_timeout(short))
        .unwrap();
    let err = provider.current_weather(WESTCLIFFE).await.unwrap_err();
    assert!(matches!(err, ProviderError::Timeout), "got {err:?}");
}

#[tokio::test]
async fn test_stormglass_uses_authorization_header() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather/point"))
        .and(header("Authorization", "SG_KEY"))
        .and(query_param("lng", "-105.4661"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "hours": [{
                "time": "2025-07-01T14:00:00+00:00",
                "airTemperature": { "sg": -4.0 },
                "cloudCover": { "sg": 5.0 },
                "precipitation": { "sg": 0.0 }
            }],
            "meta": { "cost": 1 }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = StormglassProvider::with_base_url("SG_KEY".into(), &mock_server.uri()).unwrap();
    let payload = provider.current_weather(WESTCLIFFE).await.unwrap();

    let report =
        thorshammer_core::normalize(&payload, "Westcliffe, CO", 38.1347, -105.4661).unwrap();
    assert_eq!(report.condition(), Condition::ClearCold);
    assert_eq!(report.temperature().unit, "°C");
}

#[tokio::test]
async fn test_full_cycle_and_backup() {
    let mock_server = MockServer::start().await;
    mount_nominatim(
        &mock_server,
        "Westcliffe, CO",
        serde_json::json!([{ "lat": "38.1347", "lon": "-105.4661" }]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/current"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(weatherbit_body("Light rain", 10.0, 40, 0.5)),
        )
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().expect("temp dir");
    let geocoder = nominatim(&mock_server);
    let provider = weatherbit(&mock_server, "KEY", Units::Metric);
    let mut collector =
        CollectionLoop::new(Box::new(geocoder), Box::new(provider), BackupWriter::new(dir.path()));

    let report = collector.run_once("Westcliffe, CO").await.unwrap();
    assert_eq!(report.condition(), Condition::Precipitating);
    assert_eq!(report.pressure().to_string(), "771.5 mb");
    assert_eq!(report.condition_code(), Some(500));

    let err = collector.run_once("Nowhereville, ZZ").await.unwrap_err();
    assert!(matches!(err, FetchError::Geocode(_)));
    assert_eq!(collector.collection().len(), 1);

    let day = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
    let path = collector.flush(day).unwrap();
    let saved: Vec<WeatherReport> =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(saved, vec![report]);
}
