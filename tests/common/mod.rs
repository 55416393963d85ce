#![allow(dead_code)]

use std::sync::Arc;

use movie_booking::auth::Session;
use movie_booking::config::ApiConfig;
use movie_booking::models::User;
use movie_booking::services::ApiClient;
use wiremock::MockServer;

pub const TOKEN: &str = "test-token";

pub fn user() -> User {
    User {
        id: "u1".into(),
        name: "Ada".into(),
        email: Some("ada@example.com".into()),
        role: None,
        created_at: None,
    }
}

/// Клиент против мок-сервера с уже открытой сессией.
pub fn logged_in_client(server: &MockServer) -> ApiClient {
    let session = Arc::new(Session::new());
    session.login(TOKEN.to_string(), user());
    client_with(server, session)
}

pub fn anonymous_client(server: &MockServer) -> ApiClient {
    client_with(server, Arc::new(Session::new()))
}

fn client_with(server: &MockServer, session: Arc<Session>) -> ApiClient {
    let config = ApiConfig { base_url: server.uri(), timeout_seconds: 5 };
    ApiClient::from_config(&config, session).unwrap()
}

pub fn movie_json() -> serde_json::Value {
    serde_json::json!({
        "_id": "m1",
        "title": "Dune",
        "genre": ["Sci-Fi"],
        "rating": {"imdb": 8.0},
        "price": {"standard": 10, "premium": 15}
    })
}
