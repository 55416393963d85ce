use serde::Deserialize;
use std::env;

use crate::checkout::showtime::ShowTime;

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    pub booking: BookingConfig,
    pub search: SearchConfig,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub environment: String,
    pub rust_log: String,
}

// Настройки удалённого API
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_seconds: 30,
        }
    }
}

// Учётные данные. Либо готовый токен, либо email/пароль для логина.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    pub token: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

// Настройки сценария бронирования
#[derive(Debug, Clone, Deserialize)]
pub struct BookingConfig {
    pub days_ahead: u32,
    pub showtimes: Vec<String>,
    pub refund_window_hours: i64,
    pub premium_rows: u8,
    pub seat_rows: String,
    pub seats_per_row: u32,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            days_ahead: 7,
            showtimes: DEFAULT_SHOWTIMES.iter().map(|s| s.to_string()).collect(),
            refund_window_hours: 2,
            premium_rows: 3,
            seat_rows: "ABCDEFGH".to_string(),
            seats_per_row: 12,
        }
    }
}

impl BookingConfig {
    /// Расписание сеансов в разобранном виде. Формат проверен в `Config::from_env`.
    pub fn parsed_showtimes(&self) -> Result<Vec<ShowTime>, config::ConfigError> {
        self.showtimes
            .iter()
            .map(|s| {
                s.parse::<ShowTime>()
                    .map_err(|e| config::ConfigError::Message(format!("SHOWTIMES: {}", e)))
            })
            .collect()
    }

    /// Ряды зала в порядке из `SEAT_ROWS`, в верхнем регистре, без повторов.
    pub fn rows(&self) -> Vec<char> {
        let mut rows: Vec<char> = Vec::new();
        for row in self.seat_rows.chars().filter(|c| c.is_ascii_alphabetic()) {
            let row = row.to_ascii_uppercase();
            if !rows.contains(&row) {
                rows.push(row);
            }
        }
        rows
    }
}

// Настройки поиска фильмов
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    pub debounce_ms: u64,
    pub min_query_len: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { debounce_ms: 500, min_query_len: 2 }
    }
}

const DEFAULT_SHOWTIMES: [&str; 6] = ["10:00 AM", "12:30 PM", "3:00 PM", "6:30 PM", "9:00 PM", "11:30 PM"];

impl Config {
    /// Собирает конфигурацию из переменных окружения поверх значений по умолчанию.
    /// `.env` к этому моменту уже должен быть загружен (`dotenvy::dotenv()`).
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let booking = BookingConfig::default();
        let search = SearchConfig::default();
        let api = ApiConfig::default();

        let showtimes: Option<Vec<String>> = env::var("SHOWTIMES").ok().map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        let cfg: Config = config::Config::builder()
            .set_default("app.environment", "development")?
            .set_default("app.rust_log", "movie_booking=info")?
            .set_default("api.base_url", api.base_url)?
            .set_default("api.timeout_seconds", api.timeout_seconds)?
            .set_default("booking.days_ahead", booking.days_ahead as u64)?
            .set_default("booking.showtimes", booking.showtimes)?
            .set_default("booking.refund_window_hours", booking.refund_window_hours)?
            .set_default("booking.premium_rows", booking.premium_rows as u64)?
            .set_default("booking.seat_rows", booking.seat_rows)?
            .set_default("booking.seats_per_row", booking.seats_per_row as u64)?
            .set_default("search.debounce_ms", search.debounce_ms)?
            .set_default("search.min_query_len", search.min_query_len as u64)?
            .set_override_option("app.environment", env::var("ENVIRONMENT").ok())?
            .set_override_option("app.rust_log", env::var("RUST_LOG").ok())?
            .set_override_option("api.base_url", env::var("API_BASE_URL").ok())?
            .set_override_option("api.timeout_seconds", env::var("API_TIMEOUT_SECONDS").ok())?
            .set_override_option("auth.token", env::var("API_TOKEN").ok())?
            .set_override_option("auth.email", env::var("API_EMAIL").ok())?
            .set_override_option("auth.password", env::var("API_PASSWORD").ok())?
            .set_override_option("booking.days_ahead", env::var("BOOKING_DAYS_AHEAD").ok())?
            .set_override_option("booking.showtimes", showtimes)?
            .set_override_option("booking.refund_window_hours", env::var("REFUND_WINDOW_HOURS").ok())?
            .set_override_option("booking.premium_rows", env::var("PREMIUM_ROWS").ok())?
            .set_override_option("booking.seat_rows", env::var("SEAT_ROWS").ok())?
            .set_override_option("booking.seats_per_row", env::var("SEATS_PER_ROW").ok())?
            .set_override_option("search.debounce_ms", env::var("SEARCH_DEBOUNCE_MS").ok())?
            .set_override_option("search.min_query_len", env::var("SEARCH_MIN_QUERY_LEN").ok())?
            .build()?
            .try_deserialize()?;

        cfg.validate()?;
        Ok(cfg)
    }

    /// Проверки, которые нельзя откладывать до середины сценария оплаты.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.booking.showtimes.is_empty() {
            return Err(config::ConfigError::Message("SHOWTIMES must not be empty".to_string()));
        }
        self.booking.parsed_showtimes()?;
        if self.booking.rows().is_empty() || self.booking.seats_per_row == 0 {
            return Err(config::ConfigError::Message(
                "SEAT_ROWS and SEATS_PER_ROW must describe at least one seat".to_string(),
            ));
        }
        if self.booking.days_ahead == 0 {
            return Err(config::ConfigError::Message("BOOKING_DAYS_AHEAD must be > 0".to_string()));
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.app.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            app: AppConfig {
                environment: "development".to_string(),
                rust_log: "movie_booking=info".to_string(),
            },
            api: ApiConfig::default(),
            auth: AuthConfig::default(),
            booking: BookingConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.booking.parsed_showtimes().unwrap().len(), 6);
        assert_eq!(cfg.booking.rows().len(), 8);
        assert!(!cfg.is_production());
    }

    #[test]
    fn malformed_showtime_is_rejected_at_load() {
        let mut cfg = Config::default();
        cfg.booking.showtimes.push("25:99 XM".to_string());
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn seat_rows_are_uppercased_in_order() {
        let mut cfg = Config::default();
        cfg.booking.seat_rows = "d,e,f,D".to_string();
        assert_eq!(cfg.booking.rows(), vec!['D', 'E', 'F']);
    }

    #[test]
    fn empty_layout_is_rejected() {
        let mut cfg = Config::default();
        cfg.booking.seat_rows = "12".to_string();
        assert!(cfg.validate().is_err());
    }
}
