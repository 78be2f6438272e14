//! End-to-end workflow: controller + HTTP gateway + file store.

use std::{sync::Arc, time::Duration};

use weather_core::{
    FileLocationStore, LastLocationStore, WeatherApiGateway, WorkflowController,
    WorkflowSettings,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn forecast_body(city: &str, country: &str) -> serde_json::Value {
    serde_json::json!({
        "location": { "name": city, "country": country },
        "current": {
            "temp_c": 12.0,
            "condition": { "text": "Overcast" },
            "wind_kph": 8.3,
            "humidity": 71
        },
        "forecast": { "forecastday": [
            {
                "date": "2024-03-10",
                "day": { "avgtemp_c": 10.2, "condition": { "text": "Overcast" } },
                "astro": { "sunrise": "06:41 AM" }
            }
        ] }
    })
}

async fn mount_forecast(server: &MockServer, city: &str, country: &str) {
    Mock::given(method("GET"))
        .and(path("/v1/forecast.json"))
        .and(query_param("q", city))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(city, country)))
        .mount(server)
        .await;
}

fn settings() -> WorkflowSettings {
    WorkflowSettings {
        search_quiet_period: Duration::from_millis(20),
        ..WorkflowSettings::default()
    }
}

#[tokio::test]
async fn search_pick_and_restore_across_sessions() {
    let server = MockServer::start().await;
    mount_forecast(&server, "Seoul", "South Korea").await;
    mount_forecast(&server, "London", "United Kingdom").await;

    Mock::given(method("GET"))
        .and(path("/v1/search.json"))
        .and(query_param("q", "Lond"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "id": 2801268, "name": "London", "region": "City of London, Greater London",
              "country": "United Kingdom", "lat": 51.52, "lon": -0.11 }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let state_path = dir.path().join("state.toml");
    let gateway = Arc::new(
        WeatherApiGateway::with_base_url("KEY".into(), format!("{}/v1", server.uri()))
            .expect("client"),
    );

    // First session: nothing saved, default city, then pick London.
    let store = Arc::new(FileLocationStore::new(&state_path));
    let ctl = WorkflowController::new(gateway.clone(), store.clone(), settings());
    ctl.start().await;
    assert_eq!(
        ctl.state().snapshot.map(|s| s.location.name).as_deref(),
        Some("Seoul")
    );

    ctl.toggle_search();
    ctl.text_changed("Lond");
    let mut rx = ctl.subscribe();
    tokio::time::timeout(
        Duration::from_secs(5),
        rx.wait_for(|s| !s.candidates.is_empty()),
    )
    .await
    .expect("search finished in time")
    .expect("controller alive");

    let london = ctl.state().candidates[0].clone();
    ctl.location_picked(&london).await;
    let state = ctl.state();
    assert!(!state.search_open);
    assert!(state.candidates.is_empty());
    assert_eq!(
        state.snapshot.map(|s| s.location.country).as_deref(),
        Some("United Kingdom")
    );

    ctl.flush().await;
    assert_eq!(store.get().await.as_deref(), Some("London"));
    ctl.dispose();

    // Second session restores London.
    let store = Arc::new(FileLocationStore::new(&state_path));
    let ctl = WorkflowController::new(gateway, store, settings());
    ctl.start().await;
    assert_eq!(
        ctl.state().snapshot.map(|s| s.location.name).as_deref(),
        Some("London")
    );
}
