pub mod auth;
pub mod checkout;
pub mod config;
pub mod controllers;
pub mod models;
pub mod search_client;
pub mod sequence;
pub mod services;

use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use auth::{Session, SessionError};
use services::api::{ApiClient, ApiError};

#[derive(Debug, Error)]
pub enum InitError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub session: Arc<Session>,
    pub api: ApiClient,
}

impl AppState {
    /// Создаёт клиент и, если в конфиге есть учётные данные, открывает сессию:
    /// сначала пробуем готовый токен, затем email/пароль.
    pub async fn new(config: config::Config) -> Result<Self, InitError> {
        let session = Arc::new(Session::new());
        let api = ApiClient::from_config(&config.api, session.clone())?;

        if let Some(token) = config.auth.token.clone() {
            session.login_with_token(token)?;
            info!("Session restored from token");
        } else if let (Some(email), Some(password)) = (&config.auth.email, &config.auth.password) {
            let user = api.login(email, password).await?;
            info!("Logged in as {}", user.name);
        }

        Ok(Self { config, session, api })
    }
}
