//! Integration tests for the plain HTTP surface

use std::net::TcpListener;
use std::sync::Arc;

use chirpy_auth::configuration::{ApplicationSettings, JwtSettings};
use chirpy_auth::startup::{run, AppState};
use chirpy_auth::store::{InMemoryRefreshTokenStore, InMemoryUserStore};

fn spawn_app() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let state = AppState::new(
        Arc::new(InMemoryUserStore::new()),
        Arc::new(InMemoryRefreshTokenStore::new()),
        ApplicationSettings {
            host: "127.0.0.1".to_string(),
            port,
            platform: String::new(),
        },
        JwtSettings {
            secret: "health-check-secret".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 5_184_000,
        },
    );
    let server = run(listener, state).expect("Failed to create server");

    let _ = tokio::spawn(async move {
        let _ = server.await;
    });

    format!("http://127.0.0.1:{}", port)
}

#[tokio::test]
async fn health_check_works() {
    let addr = spawn_app();

    let response = reqwest::Client::new()
        .get(&format!("{}/api/healthz", addr))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    assert_eq!(
        response.headers()["content-type"],
        "text/plain; charset=utf-8"
    );
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn login_with_malformed_json_is_rejected() {
    let addr = spawn_app();

    let response = reqwest::Client::new()
        .post(&format!("{}/api/login", addr))
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let addr = spawn_app();

    let response = reqwest::Client::new()
        .get(&format!("{}/api/chirps", addr))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(404, response.status().as_u16());
}
