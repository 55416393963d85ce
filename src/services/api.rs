//! api.rs
//!
//! HTTP-клиент к удалённому API кинотеатра. Вся постоянная информация (фильмы,
//! брони, пользователи) живёт на сервере, клиент только ходит за ней.
//!
//! - Каждый запрос несёт bearer-токен из `Session` (если он есть) и `X-Request-Id`.
//! - Ответ 401 очищает сессию и возвращается как `ApiError::Unauthorized`
//!   вместе с сообщением сервера (неверный пароль при логине тоже 401);
//!   что делать дальше (редирект на логин), решает вызывающий.
//! - Тело ошибки разбирается на `message` и отдаётся пользователю как есть.

use chrono::{DateTime, Utc};
use reqwest::{Method, RequestBuilder, StatusCode};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::auth::Session;
use crate::config::ApiConfig;
use crate::models::{Booking, BookingSeat, Movie, PaymentMethod, User, UserStats};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server responded with {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Status {
        status: StatusCode,
        message: Option<String>,
    },
    #[error("session expired, please log in again")]
    Unauthorized { message: Option<String> },
    #[error("Please login to continue")]
    NotAuthenticated,
    #[error("Invalid response format from server: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Сообщение сервера, если оно было.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status { message, .. } | ApiError::Unauthorized { message } => message.as_deref(),
            _ => None,
        }
    }

    /// Текст для пользователя: сообщение сервера или заданный запасной вариант.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Unauthorized { message: Some(message) } => message.clone(),
            ApiError::Unauthorized { message: None } | ApiError::NotAuthenticated => self.to_string(),
            _ => self.server_message().unwrap_or(fallback).to_string(),
        }
    }
}

// --- Модели запросов и ответов ---

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
    user: User,
}

#[derive(Debug, Serialize)]
struct PromoRequest<'a> {
    code: &'a str,
}

#[derive(Debug, Deserialize)]
struct PromoResponse {
    discount: Decimal,
}

/// Данные оплаты, которые уходят на сервер. Для карты - только последние
/// четыре цифры и имя держателя, для остальных способов - пустой объект.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetailsPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_holder: Option<String>,
}

/// POST /api/bookings
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub movie_id: String,
    pub showtime: DateTime<Utc>,
    pub seats: Vec<BookingSeat>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_details: PaymentDetailsPayload,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingResponse {
    pub success: bool,
    #[serde(default)]
    pub booking: Option<Booking>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MyBookingsResponse {
    #[serde(default)]
    bookings: Option<Vec<Booking>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefundResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserStatsResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub stats: UserStats,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Поле `message` из тела ошибки, если тело разбирается.
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body).ok().and_then(|b| b.message)
}

/// Клиент для взаимодействия с API кинотеатра.
#[derive(Clone)]
pub struct ApiClient {
    /// Базовый URL сервера (без `/api`).
    base_url: String,
    /// Асинхронный HTTP-клиент.
    http_client: reqwest::Client,
    /// Текущая сессия: источник bearer-токена.
    session: Arc<Session>,
}

impl ApiClient {
    /// Создает и конфигурирует клиент на основе настроек приложения.
    pub fn from_config(config: &ApiConfig, session: Arc<Session>) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http_client,
            session,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        debug!("{} {}", method, path);
        let mut builder = self
            .http_client
            .request(method, self.url(path))
            .header("X-Request-Id", Uuid::new_v4().to_string());
        if let Some(token) = self.session.bearer_token() {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// Отправляет запрос и разбирает тело ответа.
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder, path: &str) -> Result<T, ApiError> {
        let response = builder.send().await.map_err(|e| {
            error!("Request to {} failed: {}", path, e);
            ApiError::Transport(e)
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!("{} answered 401 - clearing session", path);
            self.session.logout();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Unauthorized { message: error_message(&body) });
        }

        let body = response.text().await?;
        if !status.is_success() {
            let message = error_message(&body);
            warn!("{} answered {}: {:?}", path, status, message);
            return Err(ApiError::Status { status, message });
        }

        serde_json::from_str(&body).map_err(|e| {
            error!("Failed to decode response from {}: {}", path, e);
            ApiError::InvalidResponse(e.to_string())
        })
    }

    /// POST /api/auth/login. При успехе заполняет сессию.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let path = "/auth/login";
        let response: LoginResponse = self
            .send(self.request(Method::POST, path).json(&LoginRequest { email, password }), path)
            .await?;
        self.session.login(response.token, response.user.clone());
        Ok(response.user)
    }

    /// GET /api/movies
    pub async fn list_movies(&self) -> Result<Vec<Movie>, ApiError> {
        let path = "/movies";
        let value: serde_json::Value = self.send(self.request(Method::GET, path), path).await?;
        if !value.is_array() {
            return Err(ApiError::InvalidResponse("expected a list of movies".to_string()));
        }
        let movies: Vec<Movie> =
            serde_json::from_value(value).map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        info!("Loaded {} movies", movies.len());
        Ok(movies)
    }

    /// GET /api/movies/search?query=
    pub async fn search_movies(&self, query: &str) -> Result<Vec<Movie>, ApiError> {
        let qs = serde_urlencoded::to_string(&[("query", query)])
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        let path = format!("/movies/search?{}", qs);
        self.send(self.request(Method::GET, &path), &path).await
    }

    /// GET /api/movies/{id}
    pub async fn get_movie(&self, movie_id: &str) -> Result<Movie, ApiError> {
        let path = format!("/movies/{}", movie_id);
        self.send(self.request(Method::GET, &path), &path).await
    }

    /// POST /api/bookings/validate-promo. Возвращает скидку в процентах.
    pub async fn validate_promo(&self, code: &str) -> Result<Decimal, ApiError> {
        let path = "/bookings/validate-promo";
        let response: PromoResponse = self
            .send(self.request(Method::POST, path).json(&PromoRequest { code }), path)
            .await?;
        Ok(response.discount)
    }

    /// POST /api/bookings. Ключ идемпотентности позволяет серверу склеить повторы.
    pub async fn create_booking(
        &self,
        request: &CreateBookingRequest,
        idempotency_key: &str,
    ) -> Result<CreateBookingResponse, ApiError> {
        let path = "/bookings";
        info!(
            "Creating booking: movie={}, seats={}, method={}",
            request.movie_id,
            request.seats.len(),
            request.payment_method.id()
        );
        let builder = self
            .request(Method::POST, path)
            .header("Idempotency-Key", idempotency_key)
            .json(request);
        self.send(builder, path).await
    }

    /// GET /api/bookings/my-bookings
    pub async fn my_bookings(&self) -> Result<Vec<Booking>, ApiError> {
        let path = "/bookings/my-bookings";
        let response: MyBookingsResponse = self.send(self.request(Method::GET, path), path).await?;
        Ok(response.bookings.unwrap_or_default())
    }

    /// POST /api/bookings/{id}/refund
    pub async fn refund(&self, booking_id: &str) -> Result<RefundResponse, ApiError> {
        let path = format!("/bookings/{}/refund", booking_id);
        info!("Requesting refund for booking {}", booking_id);
        self.send(self.request(Method::POST, &path), &path).await
    }

    /// GET /api/users/{id}/stats для пользователя из сессии.
    pub async fn user_stats(&self) -> Result<UserStatsResponse, ApiError> {
        let user = self.session.current_user().ok_or(ApiError::NotAuthenticated)?;
        let path = format!("/users/{}/stats", user.id);
        self.send(self.request(Method::GET, &path), &path).await
    }
}
