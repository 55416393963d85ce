//! submission.rs
//!
//! Отправка замороженного черновика брони во внешний API.
//!
//! 1.  **ProcessingPhase**: этапы, которые показываются пользователю, пока идёт
//!     запрос. Это только индикация прогресса, на корректность они не влияют.
//! 2.  **CardDetails**: поля формы карты и их проверка (`validator`).
//! 3.  **submit**: проверка предусловий, сборка запроса, ключ идемпотентности
//!     и один вызов `POST /api/bookings`. Повторов по своей инициативе клиент не делает.

use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;
use tracing::{error, info, warn};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::checkout::draft::BookingDraft;
use crate::models::{Booking, BookingSeat, PaymentMethod};

use super::api::{ApiClient, ApiError, CreateBookingRequest, PaymentDetailsPayload};

pub const PAYMENT_FAILED: &str = "Payment failed. Please try again.";

/// Этапы обработки оплаты в порядке показа.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingPhase {
    Initiating,
    Verifying,
    Processing,
    Confirming,
}

impl ProcessingPhase {
    pub fn label(self) -> &'static str {
        match self {
            ProcessingPhase::Initiating => "Initiating payment...",
            ProcessingPhase::Verifying => "Verifying payment details...",
            ProcessingPhase::Processing => "Processing transaction...",
            ProcessingPhase::Confirming => "Confirming booking...",
        }
    }
}

impl fmt::Display for ProcessingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Поля формы оплаты картой.
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct CardDetails {
    pub holder_name: String,
    #[validate(custom(function = "validate_card_number"))]
    pub card_number: String,
    #[validate(custom(function = "validate_expiry"))]
    pub expiry: String,
    #[validate(custom(function = "validate_cvv"))]
    pub cvv: String,
}

impl CardDetails {
    /// Кнопка оплаты картой активна, только когда заполнены номер, срок и CVV.
    pub fn is_complete(&self) -> bool {
        !self.card_number.trim().is_empty() && !self.expiry.trim().is_empty() && !self.cvv.trim().is_empty()
    }

    fn digits(&self) -> String {
        self.card_number.chars().filter(|c| !c.is_whitespace()).collect()
    }

    /// Последние четыре цифры - всё, что уходит на сервер от номера карты.
    pub fn last_four(&self) -> String {
        let digits = self.digits();
        let skip = digits.chars().count().saturating_sub(4);
        digits.chars().skip(skip).collect()
    }
}

fn validate_card_number(value: &str) -> Result<(), ValidationError> {
    let digits: Vec<char> = value.chars().filter(|c| !c.is_whitespace()).collect();
    if (12..=19).contains(&digits.len()) && digits.iter().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("card_number").with_message("Card number must be 12-19 digits".into()))
    }
}

// MM/YY
fn validate_expiry(value: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError::new("expiry").with_message("Expiry date must be MM/YY".into());
    let (mm, yy) = value.trim().split_once('/').ok_or_else(invalid)?;
    if mm.len() != 2 || yy.len() != 2 || !mm.chars().chain(yy.chars()).all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let month: u32 = mm.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    Ok(())
}

fn validate_cvv(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.len() == 3 && value.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("cvv").with_message("CVV must be 3 digits".into()))
    }
}

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("Please login to continue")]
    NotLoggedIn,
    #[error("no seats selected")]
    NoSeats,
    #[error("no payment method selected")]
    NoPaymentMethod,
    #[error("card details are incomplete")]
    IncompleteCard,
    #[error("invalid payment details: {0}")]
    InvalidDetails(#[from] ValidationErrors),
    #[error("booking rejected: {}", .0.as_deref().unwrap_or(PAYMENT_FAILED))]
    Rejected(Option<String>),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("this booking has already been confirmed")]
    AlreadySubmitted,
    #[error("checkout is not at the payment step")]
    NotAtPayment,
}

impl SubmissionError {
    /// Текст блокирующего сообщения для пользователя.
    pub fn user_message(&self) -> String {
        match self {
            SubmissionError::Rejected(message) => message.clone().unwrap_or_else(|| PAYMENT_FAILED.to_string()),
            SubmissionError::Api(e) => e.user_message(PAYMENT_FAILED),
            SubmissionError::InvalidDetails(errors) => {
                let mut messages: Vec<String> = errors
                    .field_errors()
                    .values()
                    .flat_map(|errs| errs.iter())
                    .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                    .collect();
                messages.sort();
                if messages.is_empty() {
                    "Please check your payment details".to_string()
                } else {
                    messages.join("; ")
                }
            }
            other => capitalize(&other.to_string()),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Результат успешной отправки.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingConfirmation {
    pub booking: Option<Booking>,
}

impl BookingConfirmation {
    pub fn booking_id(&self) -> Option<&str> {
        self.booking.as_ref().map(|b| b.id.as_str())
    }

    pub fn reference(&self) -> Option<&str> {
        self.booking.as_ref().and_then(|b| b.booking_reference.as_deref())
    }
}

/// Собирает тело `POST /api/bookings` из черновика и данных оплаты.
pub fn build_request(draft: &BookingDraft, method: PaymentMethod, card: &CardDetails) -> CreateBookingRequest {
    let payment_details = if method.needs_card_details() {
        PaymentDetailsPayload {
            card_number: Some(card.last_four()),
            card_holder: Some(card.holder_name.trim().to_string()),
        }
    } else {
        PaymentDetailsPayload::default()
    };

    CreateBookingRequest {
        movie_id: draft.movie_id.clone(),
        showtime: draft.showtime,
        seats: draft
            .seats
            .iter()
            .map(|id| BookingSeat { row: id.row, number: id.number, category: Some(draft.category) })
            .collect(),
        total_amount: draft.total(),
        payment_method: method,
        payment_details,
    }
}

/// Ключ идемпотентности: SHA-256 от nonce черновика и тела запроса.
/// Тот же черновик с теми же данными оплаты даёт тот же ключ.
pub fn idempotency_key(draft: &BookingDraft, request: &CreateBookingRequest) -> String {
    let body = serde_json::to_string(request).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(draft.nonce.as_bytes());
    hasher.update(body.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Проверяет предусловия и отправляет бронь. Этапы отдаются в `on_phase` по порядку.
pub async fn submit<F>(
    api: &ApiClient,
    draft: &BookingDraft,
    method: Option<PaymentMethod>,
    card: &CardDetails,
    mut on_phase: F,
) -> Result<BookingConfirmation, SubmissionError>
where
    F: FnMut(ProcessingPhase),
{
    on_phase(ProcessingPhase::Initiating);
    if !api.session().is_authenticated() {
        return Err(SubmissionError::NotLoggedIn);
    }

    on_phase(ProcessingPhase::Verifying);
    if draft.seats.is_empty() {
        return Err(SubmissionError::NoSeats);
    }
    let method = method.ok_or(SubmissionError::NoPaymentMethod)?;
    if method.needs_card_details() {
        if !card.is_complete() {
            return Err(SubmissionError::IncompleteCard);
        }
        card.validate()?;
    }

    let request = build_request(draft, method, card);
    let key = idempotency_key(draft, &request);

    on_phase(ProcessingPhase::Processing);
    let response = api.create_booking(&request, &key).await.map_err(|e| {
        error!("Booking submission failed: {}", e);
        SubmissionError::Api(e)
    })?;

    on_phase(ProcessingPhase::Confirming);
    if !response.success {
        warn!("Booking rejected by server: {:?}", response.message);
        return Err(SubmissionError::Rejected(response.message));
    }

    let confirmation = BookingConfirmation { booking: response.booking };
    info!(
        "Booking confirmed: id={:?}, reference={:?}",
        confirmation.booking_id(),
        confirmation.reference()
    );
    Ok(confirmation)
}
