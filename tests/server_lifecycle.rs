//! Server Lifecycle Tests
//!
//! Starts a real listener on an ephemeral port and talks to it over HTTP.

use std::time::Duration;

use tokio::time::timeout;
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use realtime_voice_relay::core::negotiator::{
    DEFAULT_REALTIME_INSTRUCTIONS, DEFAULT_REALTIME_MODEL, DEFAULT_REALTIME_VOICE,
};
use realtime_voice_relay::{ConfigUpdate, ServerConfig, VoiceServer};

const OFFER: &str = "v=0\r\no=- 4611731400430051336 2 IN IP4 127.0.0.1\r\ns=-\r\nt=0 0\r\n";
const ANSWER: &str = "v=0\r\no=- 1 1 IN IP4 0.0.0.0\r\ns=-\r\nt=0 0\r\n";

fn create_minimal_config(upstream: &MockServer) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        tls: None,
        openai_api_key: Some("sk-test".to_string()),
        default_voice: DEFAULT_REALTIME_VOICE.to_string(),
        default_instructions: DEFAULT_REALTIME_INSTRUCTIONS.to_string(),
        default_model: DEFAULT_REALTIME_MODEL.to_string(),
        upstream_url: format!("{}/v1/realtime", upstream.uri()),
        upstream_timeout_seconds: 5,
        static_dir: None,
        cors_allowed_origins: None,
        rate_limit_requests_per_second: 100_000,
        rate_limit_burst_size: 10,
    }
}

#[tokio::test]
async fn test_start_serves_health_and_status() {
    let upstream = MockServer::start().await;
    let server = VoiceServer::start(create_minimal_config(&upstream))
        .await
        .unwrap();

    assert_ne!(server.local_addr().port(), 0);
    assert_eq!(server.url(), format!("http://{}", server.local_addr()));

    let client = reqwest::Client::new();
    let health = client
        .get(format!("{}/health", server.url()))
        .send()
        .await
        .unwrap();
    assert_eq!(health.status().as_u16(), 200);
    assert_eq!(health.text().await.unwrap(), r#"{"status":"OK"}"#);

    let status = server.status();
    assert!(status.running);
    assert_eq!(status.address, Some(server.local_addr().to_string()));
    assert_eq!(status.url, Some(server.url()));
    assert!(status.api_key_configured);

    let remote: serde_json::Value = client
        .get(format!("{}/api/realtime/status", server.url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(remote["running"], true);
    assert_eq!(remote["voice"], "marin");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_session_over_the_wire() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ANSWER))
        .expect(1)
        .mount(&upstream)
        .await;

    let server = VoiceServer::start(create_minimal_config(&upstream))
        .await
        .unwrap();

    let response = reqwest::Client::new()
        .post(format!("{}/api/realtime/session", server.url()))
        .json(&serde_json::json!({ "sdpOffer": OFFER }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/sdp"
    );
    assert_eq!(response.text().await.unwrap(), ANSWER);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_reconfigure_running_server() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(query_param("voice", "coral"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ANSWER))
        .expect(1)
        .mount(&upstream)
        .await;

    let server = VoiceServer::start(create_minimal_config(&upstream))
        .await
        .unwrap();

    let updated = server.reconfigure(ConfigUpdate {
        voice: Some("coral".to_string()),
        ..Default::default()
    });
    assert_eq!(updated.default_voice, "coral");
    assert_eq!(server.status().voice, "coral");
    assert_eq!(server.status().model, "gpt-4o-realtime-preview");

    let response = reqwest::Client::new()
        .post(format!("{}/api/realtime/session", server.url()))
        .json(&serde_json::json!({ "sdpOffer": OFFER }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_stop_releases_port() {
    let upstream = MockServer::start().await;
    let server = VoiceServer::start(create_minimal_config(&upstream))
        .await
        .unwrap();
    let addr = server.local_addr();
    let state = server.state().clone();

    timeout(Duration::from_secs(5), server.stop())
        .await
        .expect("stop should complete promptly")
        .unwrap();

    assert!(!state.status().running);
    assert!(tokio::net::TcpListener::bind(addr).await.is_ok());
}

#[tokio::test]
async fn test_stop_cancels_in_flight_negotiation() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(ANSWER)
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&upstream)
        .await;

    let server = VoiceServer::start(create_minimal_config(&upstream))
        .await
        .unwrap();
    let url = format!("{}/api/realtime/session", server.url());

    let pending = tokio::spawn(async move {
        reqwest::Client::new()
            .post(url)
            .json(&serde_json::json!({ "sdpOffer": OFFER }))
            .send()
            .await
    });

    // Let the request reach the upstream call
    tokio::time::sleep(Duration::from_millis(200)).await;

    timeout(Duration::from_secs(5), server.stop())
        .await
        .expect("stop should not wait for the slow upstream")
        .unwrap();

    let response = pending.await.unwrap().unwrap();
    assert_eq!(response.status().as_u16(), 499);
}

#[tokio::test]
async fn test_start_rejects_invalid_address() {
    let upstream = MockServer::start().await;
    let mut config = create_minimal_config(&upstream);
    config.host = "not an address".to_string();

    assert!(VoiceServer::start(config).await.is_err());
}
