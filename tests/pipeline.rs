use approx::assert_relative_eq;
use chrono::{Days, Local, NaiveDate};
use serde_json::json;
use tmax_forecast::{FetchError, ForecastError, ForecastSettings, Forecaster, LatLon};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// First day of an archive of `len` days ending yesterday, inside the requested window.
fn first_day(len: usize) -> NaiveDate {
    Local::now().date_naive() - Days::new(len as u64)
}

/// Deterministic series generated by `y(t) = 6 + 0.5 y(t-1) + 0.3 y(t-2)` plus a
/// bounded wobble so the lags are not collinear.
fn archive_values(len: usize) -> Vec<f64> {
    let mut values = vec![29.0, 31.0];
    for t in 2..len {
        let wobble = 1.5 * ((t as f64) * 0.9).sin();
        values.push(6.0 + 0.5 * values[t - 1] + 0.3 * values[t - 2] + wobble);
    }
    values.truncate(len);
    values
}

fn archive_body(values: &[f64]) -> serde_json::Value {
    let time: Vec<String> = (0..values.len())
        .map(|i| (first_day(values.len()) + Days::new(i as u64)).to_string())
        .collect();
    json!({
        "latitude": -20.3155,
        "longitude": -40.3128,
        "daily_units": { "time": "iso8601", "temperature_2m_max": "°C" },
        "daily": { "time": time, "temperature_2m_max": values },
    })
}

fn forecaster_for(server: &MockServer) -> Forecaster<tmax_forecast::ArchiveClient> {
    let settings = ForecastSettings::builder()
        .base_url(server.uri())
        .location(LatLon(-20.3155, -40.3128))
        .build();
    Forecaster::open_meteo(settings).unwrap()
}

#[tokio::test]
async fn test_current_observation_and_forecast() {
    let values = archive_values(90);
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/archive"))
        .and(query_param("daily", "temperature_2m_max"))
        .and(query_param("latitude", "-20.3155"))
        .respond_with(ResponseTemplate::new(200).set_body_json(archive_body(&values)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let forecaster = forecaster_for(&mock_server);

    let current = forecaster.current_observation().await.unwrap();
    let last_day = first_day(values.len()) + Days::new(89);
    assert_eq!(current.date, last_day);
    assert_eq!(current.value, values[89]);
    assert_eq!(current.previous_value, values[88]);

    let points = forecaster.forecast(7).await.unwrap();
    assert_eq!(points.len(), 7);
    assert_eq!(points[0].date, last_day + Days::new(1));
    assert_eq!(points[6].date, last_day + Days::new(7));
    assert!(points.iter().all(|p| p.value.is_finite()));

    let model = forecaster.model().await.unwrap();
    assert_relative_eq!(points[0].value, model.predict(values[89], values[88]));
    assert_relative_eq!(
        points[1].value,
        model.predict(points[0].value, values[89]),
        epsilon = 1e-12
    );
}

#[tokio::test]
async fn test_repeat_calls_hit_the_cache_until_refresh() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/archive"))
        .respond_with(ResponseTemplate::new(200).set_body_json(archive_body(&archive_values(60))))
        .expect(2)
        .mount(&mock_server)
        .await;

    let forecaster = forecaster_for(&mock_server);

    let first = forecaster.forecast(5).await.unwrap();
    forecaster.current_observation().await.unwrap();
    let second = forecaster.forecast(5).await.unwrap();
    assert_eq!(first, second);

    forecaster.refresh().await;
    let after_refresh = forecaster.forecast(5).await.unwrap();
    assert_eq!(first, after_refresh);
}

#[tokio::test]
async fn test_horizon_bounds() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(archive_body(&archive_values(60))))
        .mount(&mock_server)
        .await;

    let forecaster = forecaster_for(&mock_server);

    assert!(matches!(
        forecaster.forecast(0).await,
        Err(ForecastError::InvalidHorizon { requested: 0, .. })
    ));
    assert!(matches!(
        forecaster.forecast(8).await,
        Err(ForecastError::InvalidHorizon { requested: 8, .. })
    ));
    assert_eq!(forecaster.forecast(1).await.unwrap().len(), 1);
    assert_eq!(forecaster.forecast(7).await.unwrap().len(), 7);
}

#[tokio::test]
async fn test_archive_failure_propagates() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let forecaster = forecaster_for(&mock_server);

    let err = forecaster.forecast(3).await.unwrap_err();
    assert!(matches!(
        err,
        ForecastError::Fetch(FetchError::HttpStatus { status, .. }) if status.as_u16() == 500
    ));
}

#[tokio::test]
async fn test_short_archive_is_insufficient_data() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(archive_body(&archive_values(9))))
        .mount(&mock_server)
        .await;

    let forecaster = forecaster_for(&mock_server);

    // two observations are enough to report the current value
    assert!(forecaster.current_observation().await.is_ok());
    assert!(matches!(
        forecaster.forecast(3).await,
        Err(ForecastError::InsufficientData {
            required: 10,
            found: 7
        })
    ));
}

#[tokio::test]
async fn test_empty_archive_is_a_fetch_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(archive_body(&[])))
        .mount(&mock_server)
        .await;

    let forecaster = forecaster_for(&mock_server);

    assert!(matches!(
        forecaster.current_observation().await,
        Err(ForecastError::Fetch(FetchError::EmptyPayload { .. }))
    ));
}
