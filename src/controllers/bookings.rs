//! "My Bookings": список броней пользователя и возврат.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::BookingConfig;
use crate::models::{Booking, BookingStatus};
use crate::services::api::{ApiClient, ApiError};

pub const FETCH_FAILED: &str = "Failed to fetch bookings";
pub const REFUND_OK: &str = "Refund processed successfully";
pub const REFUND_FAILED: &str = "Failed to process refund";

/// Возврат доступен для подтверждённой брони, если до сеанса строго больше `window`.
pub fn refund_eligible(booking: &Booking, now: DateTime<Utc>, window: Duration) -> bool {
    booking.status == BookingStatus::Confirmed && booking.showtime - now > window
}

#[derive(Debug, Error)]
pub enum RefundError {
    #[error("booking {0} not found")]
    NotFound(String),
    #[error("booking {0} is not eligible for a refund")]
    NotEligible(String),
    #[error("refund rejected: {}", .0.as_deref().unwrap_or(REFUND_FAILED))]
    Rejected(Option<String>),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl RefundError {
    pub fn user_message(&self) -> String {
        match self {
            RefundError::Rejected(message) => message.clone().unwrap_or_else(|| REFUND_FAILED.to_string()),
            RefundError::Api(e) => e.user_message(REFUND_FAILED),
            RefundError::NotEligible(_) => "This booking can no longer be refunded".to_string(),
            RefundError::NotFound(_) => REFUND_FAILED.to_string(),
        }
    }
}

pub struct MyBookings {
    api: ApiClient,
    refund_window: Duration,
    bookings: Vec<Booking>,
    error: Option<String>,
}

impl MyBookings {
    pub fn new(api: ApiClient, config: &BookingConfig) -> Self {
        Self {
            api,
            refund_window: Duration::hours(config.refund_window_hours),
            bookings: Vec::new(),
            error: None,
        }
    }

    pub fn bookings(&self) -> &[Booking] {
        &self.bookings
    }

    /// Ошибка последней загрузки (для блока "повторить").
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_refundable(&self, booking: &Booking, now: DateTime<Utc>) -> bool {
        refund_eligible(booking, now, self.refund_window)
    }

    /// Загружает список. При ошибке прежний список остаётся.
    pub async fn fetch(&mut self) -> Result<&[Booking], String> {
        match self.api.my_bookings().await {
            Ok(bookings) => {
                info!("Loaded {} bookings", bookings.len());
                self.bookings = bookings;
                self.error = None;
                Ok(&self.bookings)
            }
            Err(e) => {
                warn!("Failed to fetch bookings: {}", e);
                let message = e.user_message(FETCH_FAILED);
                self.error = Some(message.clone());
                Err(message)
            }
        }
    }

    /// Запрашивает возврат и при успехе перечитывает список.
    pub async fn refund(&mut self, booking_id: &str, now: DateTime<Utc>) -> Result<&'static str, RefundError> {
        let booking = self
            .bookings
            .iter()
            .find(|b| b.id == booking_id)
            .ok_or_else(|| RefundError::NotFound(booking_id.to_string()))?;
        if !self.is_refundable(booking, now) {
            return Err(RefundError::NotEligible(booking_id.to_string()));
        }

        let response = self.api.refund(booking_id).await?;
        if !response.success {
            return Err(RefundError::Rejected(response.message));
        }

        info!("Refund processed for booking {}", booking_id);
        if let Err(message) = self.fetch().await {
            warn!("Refund succeeded but list reload failed: {}", message);
        }
        Ok(REFUND_OK)
    }
}
