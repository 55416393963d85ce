//! flow.rs
//!
//! Чекаут как линейная машина состояний по номеру шага:
//! `DateTime` -> `SeatsAndSummary` -> `Payment`.
//!
//! Каждый шаг владеет только своими полями. Изменять их можно только через
//! `*_mut()`, которые возвращают `Some` лишь на своём шаге. При переходе к оплате
//! состояние копируется в `BookingDraft`, и дальше отправляется только эта копия.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::BookingConfig;
use crate::models::{Movie, PaymentMethod, PriceTable, SeatCategory, SeatId, Showtime};
use crate::sequence::{RequestSequence, Ticket};
use crate::services::api::{ApiClient, ApiError};
use crate::services::submission::{self, BookingConfirmation, CardDetails, ProcessingPhase, SubmissionError};

use super::draft::BookingDraft;
use super::pricing::{self, Money, PriceBreakdown};
use super::seat_map::SeatMap;
use super::selection::Selection;
use super::showtime::{available_dates, ShowTime, ShowTimeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CheckoutStep {
    DateTime,
    SeatsAndSummary,
    Payment,
}

/// Почему переход не выполнен. Это не ошибка, а неготовность: кнопка неактивна.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockedReason {
    MissingDate,
    MissingTime,
    NoSeats,
    /// Переход не определён для текущего шага.
    WrongStep,
    /// Дата и время не складываются в момент времени (переход на летнее время).
    UnresolvableShowtime,
    /// Бронь уже подтверждена.
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Moved(CheckoutStep),
    Blocked(BlockedReason),
}

impl Transition {
    pub fn is_moved(self) -> bool {
        matches!(self, Transition::Moved(_))
    }
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("movie {0} has no prices, booking is not available")]
    MissingPrice(String),
    #[error(transparent)]
    Config(#[from] config::ConfigError),
}

#[derive(Debug, Error)]
pub enum PromoError {
    #[error("discount {0}% is out of range")]
    OutOfRange(Decimal),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl PromoError {
    pub fn user_message(&self) -> String {
        match self {
            PromoError::OutOfRange(_) => "Invalid promo code".to_string(),
            PromoError::Api(e) => e.user_message("Invalid promo code"),
        }
    }
}

/// Запрос на проверку промокода, выданный `SeatsStage::begin_promo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromoRequest {
    pub ticket: Ticket,
    pub code: String,
}

#[derive(Debug)]
pub enum PromoOutcome {
    Applied(Decimal),
    /// Скидка не изменилась, текст ошибки лежит в `SeatsStage::promo_error`.
    Rejected(PromoError),
    /// Ответ пришёл после смены кода или более нового запроса.
    Stale,
}

// --- Шаг 1: дата и время ---

#[derive(Debug, Clone, PartialEq)]
pub struct DateTimeStage {
    dates: Vec<NaiveDate>,
    times: Vec<ShowTime>,
    date: Option<NaiveDate>,
    time: Option<ShowTime>,
}

impl DateTimeStage {
    pub fn new(dates: Vec<NaiveDate>, times: Vec<ShowTime>) -> Self {
        Self { dates, times, date: None, time: None }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn times(&self) -> &[ShowTime] {
        &self.times
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn time(&self) -> Option<ShowTime> {
        self.time
    }

    /// Выбирает дату из предложенных. Дата вне списка игнорируется.
    pub fn select_date(&mut self, date: NaiveDate) -> bool {
        if !self.dates.contains(&date) {
            return false;
        }
        self.date = Some(date);
        true
    }

    pub fn select_time(&mut self, time: ShowTime) -> bool {
        if !self.times.contains(&time) {
            return false;
        }
        self.time = Some(time);
        true
    }

    /// То же, что `select_time`, но из строки "6:30 PM".
    pub fn select_time_str(&mut self, time: &str) -> Result<bool, ShowTimeError> {
        let time: ShowTime = time.parse()?;
        Ok(self.select_time(time))
    }

    pub fn is_complete(&self) -> bool {
        self.date.is_some() && self.time.is_some()
    }
}

// --- Шаг 2: места и сводка ---

#[derive(Debug)]
pub struct SeatsStage {
    date: NaiveDate,
    time: ShowTime,
    showtime: DateTime<Utc>,
    prices: PriceTable,
    seat_map: SeatMap,
    selection: Selection,
    category: SeatCategory,
    promo_code: String,
    /// Код, давший текущую скидку.
    applied_promo: Option<String>,
    discount_percent: Decimal,
    promo_error: Option<String>,
    promo_sequence: RequestSequence,
}

impl SeatsStage {
    fn new(date: NaiveDate, time: ShowTime, showtime: DateTime<Utc>, prices: PriceTable, seat_map: SeatMap) -> Self {
        Self {
            date,
            time,
            showtime,
            prices,
            seat_map,
            selection: Selection::new(),
            category: SeatCategory::Standard,
            promo_code: String::new(),
            applied_promo: None,
            discount_percent: Decimal::ZERO,
            promo_error: None,
            promo_sequence: RequestSequence::new(),
        }
    }

    pub fn seat_map(&self) -> &SeatMap {
        &self.seat_map
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn category(&self) -> SeatCategory {
        self.category
    }

    pub fn promo_code(&self) -> &str {
        &self.promo_code
    }

    pub fn applied_promo(&self) -> Option<&str> {
        self.applied_promo.as_deref()
    }

    pub fn discount_percent(&self) -> Decimal {
        self.discount_percent
    }

    pub fn promo_error(&self) -> Option<&str> {
        self.promo_error.as_deref()
    }

    pub fn prices(&self) -> &PriceTable {
        &self.prices
    }

    /// Клик по месту. `true`, если выбор изменился.
    pub fn toggle_seat(&mut self, id: SeatId) -> bool {
        match self.seat_map.click(id, self.category, &self.selection) {
            Some(next) => {
                debug!("Seat {} toggled, {} selected", id, next.len());
                self.selection = next;
                true
            }
            None => false,
        }
    }

    /// Меняет категорию. Выбранные места, которые новая категория не допускает, снимаются.
    pub fn set_category(&mut self, category: SeatCategory) {
        self.category = category;
        let map = &self.seat_map;
        self.selection = self.selection.retained(|seat| category.admits(map.category_of(seat)));
    }

    /// Новый текст кода делает все запросы по старому устаревшими.
    pub fn set_promo_code(&mut self, code: &str) {
        self.promo_code = code.trim().to_string();
        self.promo_error = None;
        self.promo_sequence.invalidate();
    }

    /// Выдаёт запрос на проверку текущего кода, `None` если код пуст.
    pub fn begin_promo(&mut self) -> Option<PromoRequest> {
        if self.promo_code.is_empty() {
            return None;
        }
        Some(PromoRequest {
            ticket: self.promo_sequence.next(),
            code: self.promo_code.clone(),
        })
    }

    /// Применяет ответ на проверку промокода.
    pub fn finish_promo(&mut self, request: &PromoRequest, result: Result<Decimal, ApiError>) -> PromoOutcome {
        if !self.promo_sequence.is_current(request.ticket) || request.code != self.promo_code {
            debug!("Discarding stale promo response for '{}'", request.code);
            return PromoOutcome::Stale;
        }

        let checked = result.map_err(PromoError::from).and_then(|discount| {
            if discount < Decimal::ZERO || discount > Decimal::ONE_HUNDRED {
                Err(PromoError::OutOfRange(discount))
            } else {
                Ok(discount)
            }
        });

        match checked {
            Ok(discount) => {
                info!("Promo code applied: {}%", discount);
                self.discount_percent = discount;
                self.applied_promo = Some(request.code.clone());
                self.promo_error = None;
                PromoOutcome::Applied(discount)
            }
            Err(e) => {
                warn!("Promo code rejected: {}", e);
                self.promo_error = Some(e.user_message());
                PromoOutcome::Rejected(e)
            }
        }
    }

    pub fn breakdown(&self) -> PriceBreakdown {
        pricing::price(self.selection.len(), &self.prices, self.category, self.discount_percent)
    }
}

// --- Шаг 3: оплата ---

#[derive(Debug)]
pub struct PaymentStage {
    draft: BookingDraft,
    method: Option<PaymentMethod>,
    card: CardDetails,
    confirmation: Option<BookingConfirmation>,
    last_error: Option<String>,
}

impl PaymentStage {
    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    pub fn method(&self) -> Option<PaymentMethod> {
        self.method
    }

    pub fn select_method(&mut self, method: PaymentMethod) {
        self.method = Some(method);
    }

    pub fn card(&self) -> &CardDetails {
        &self.card
    }

    pub fn card_mut(&mut self) -> &mut CardDetails {
        &mut self.card
    }

    pub fn confirmation(&self) -> Option<&BookingConfirmation> {
        self.confirmation.as_ref()
    }

    /// Сообщение последней неудачной попытки оплаты.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Активна ли кнопка оплаты.
    pub fn can_pay(&self) -> bool {
        if self.confirmation.is_some() {
            return false;
        }
        match self.method {
            Some(method) if method.needs_card_details() => self.card.is_complete(),
            Some(_) => true,
            None => false,
        }
    }
}

/// Данные для блока "Booking Summary".
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSummary {
    pub movie_title: String,
    pub date: NaiveDate,
    pub time: ShowTime,
    pub seats: String,
    pub category: SeatCategory,
    pub price: PriceBreakdown,
}

impl fmt::Display for OrderSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Movie:          {}", self.movie_title)?;
        writeln!(f, "Date:           {}", self.date.format("%a, %b %-d, %Y"))?;
        writeln!(f, "Time:           {}", self.time)?;
        writeln!(f, "Seats:          {}", if self.seats.is_empty() { "-" } else { &self.seats })?;
        writeln!(f, "Category:       {}", self.category)?;
        writeln!(f, "Price per seat: {}", Money(self.price.price_per_seat))?;
        writeln!(f, "Subtotal:       {}", Money(self.price.subtotal))?;
        if self.price.has_discount() {
            writeln!(f, "Discount:       -{}", Money(self.price.discount_amount))?;
        }
        write!(f, "Total:          {}", Money(self.price.total))
    }
}

/// Чекаут одного фильма.
#[derive(Debug)]
pub struct CheckoutFlow {
    movie_id: String,
    movie_title: String,
    prices: PriceTable,
    showtimes: Vec<Showtime>,
    default_hall: SeatMap,
    step: CheckoutStep,
    date_time: DateTimeStage,
    seats: Option<SeatsStage>,
    payment: Option<PaymentStage>,
}

impl CheckoutFlow {
    pub fn new(movie: &Movie, config: &BookingConfig, today: NaiveDate) -> Result<Self, CheckoutError> {
        let prices = movie
            .price
            .clone()
            .ok_or_else(|| CheckoutError::MissingPrice(movie.id.clone()))?;
        let times = config.parsed_showtimes()?;
        let dates = available_dates(today, config.days_ahead);

        Ok(Self {
            movie_id: movie.id.clone(),
            movie_title: movie.title.clone(),
            prices,
            showtimes: movie.showtimes.clone(),
            default_hall: SeatMap::generated(&config.rows(), config.seats_per_row, config.premium_rows),
            step: CheckoutStep::DateTime,
            date_time: DateTimeStage::new(dates, times),
            seats: None,
            payment: None,
        })
    }

    pub fn step(&self) -> CheckoutStep {
        self.step
    }

    pub fn movie_title(&self) -> &str {
        &self.movie_title
    }

    pub fn date_time(&self) -> &DateTimeStage {
        &self.date_time
    }

    pub fn date_time_mut(&mut self) -> Option<&mut DateTimeStage> {
        match self.step {
            CheckoutStep::DateTime => Some(&mut self.date_time),
            _ => None,
        }
    }

    pub fn seats(&self) -> Option<&SeatsStage> {
        self.seats.as_ref()
    }

    pub fn seats_mut(&mut self) -> Option<&mut SeatsStage> {
        match self.step {
            CheckoutStep::SeatsAndSummary => self.seats.as_mut(),
            _ => None,
        }
    }

    pub fn payment(&self) -> Option<&PaymentStage> {
        self.payment.as_ref()
    }

    pub fn payment_mut(&mut self) -> Option<&mut PaymentStage> {
        match self.step {
            CheckoutStep::Payment => self.payment.as_mut().filter(|p| p.confirmation.is_none()),
            _ => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.payment.as_ref().is_some_and(|p| p.confirmation.is_some())
    }

    /// DateTime -> SeatsAndSummary.
    pub fn continue_to_seats(&mut self) -> Transition {
        if self.step != CheckoutStep::DateTime {
            return Transition::Blocked(BlockedReason::WrongStep);
        }
        let Some(date) = self.date_time.date else {
            return Transition::Blocked(BlockedReason::MissingDate);
        };
        let Some(time) = self.date_time.time else {
            return Transition::Blocked(BlockedReason::MissingTime);
        };

        // Тот же сеанс, что и до шага назад: возвращаем выбор как был.
        let reuse = self.seats.as_ref().is_some_and(|s| s.date == date && s.time == time);
        if !reuse {
            let instant = match time.instant_on(date) {
                Ok(instant) => instant,
                Err(e) => {
                    warn!("Cannot resolve showtime: {}", e);
                    return Transition::Blocked(BlockedReason::UnresolvableShowtime);
                }
            };
            let record = self.showtimes.iter().find(|s| s.start_time == instant);
            let (seat_map, prices) = match record {
                Some(record) => (
                    SeatMap::from_showtime(record, &self.default_hall),
                    record.price.clone().unwrap_or_else(|| self.prices.clone()),
                ),
                None => (self.default_hall.clone(), self.prices.clone()),
            };
            self.seats = Some(SeatsStage::new(date, time, instant, prices, seat_map));
        }

        info!("Checkout {}: {} {} -> seats", self.movie_id, date, time);
        self.step = CheckoutStep::SeatsAndSummary;
        Transition::Moved(self.step)
    }

    /// SeatsAndSummary -> Payment. Замораживает черновик брони.
    pub fn continue_to_payment(&mut self) -> Transition {
        if self.step != CheckoutStep::SeatsAndSummary {
            return Transition::Blocked(BlockedReason::WrongStep);
        }
        let Some(stage) = self.seats.as_ref() else {
            return Transition::Blocked(BlockedReason::WrongStep);
        };
        if stage.selection.is_empty() {
            return Transition::Blocked(BlockedReason::NoSeats);
        }

        let draft = BookingDraft {
            movie_id: self.movie_id.clone(),
            movie_title: self.movie_title.clone(),
            date: stage.date,
            time: stage.time,
            showtime: stage.showtime,
            seats: stage.selection.ids(),
            category: stage.category,
            promo_code: stage.applied_promo.clone().filter(|_| stage.discount_percent > Decimal::ZERO),
            discount_percent: stage.discount_percent,
            price: stage.breakdown(),
            nonce: Uuid::new_v4(),
        };
        info!(
            "Checkout {}: {} seat(s), total {} -> payment",
            self.movie_id,
            draft.seats.len(),
            Money(draft.total())
        );

        self.payment = Some(PaymentStage {
            draft,
            method: None,
            card: CardDetails::default(),
            confirmation: None,
            last_error: None,
        });
        self.step = CheckoutStep::Payment;
        Transition::Moved(self.step)
    }

    /// Шаг назад. После подтверждённой брони назад пути нет.
    pub fn back(&mut self) -> Transition {
        match self.step {
            CheckoutStep::DateTime => Transition::Blocked(BlockedReason::WrongStep),
            CheckoutStep::SeatsAndSummary => {
                self.step = CheckoutStep::DateTime;
                Transition::Moved(self.step)
            }
            CheckoutStep::Payment => {
                if self.is_complete() {
                    return Transition::Blocked(BlockedReason::Completed);
                }
                self.payment = None;
                self.step = CheckoutStep::SeatsAndSummary;
                Transition::Moved(self.step)
            }
        }
    }

    /// Сводка заказа: на шаге мест - по живому выбору, на оплате - по черновику.
    pub fn summary(&self) -> Option<OrderSummary> {
        match self.step {
            CheckoutStep::DateTime => None,
            CheckoutStep::SeatsAndSummary => self.seats.as_ref().map(|s| OrderSummary {
                movie_title: self.movie_title.clone(),
                date: s.date,
                time: s.time,
                seats: s.selection.label(),
                category: s.category,
                price: s.breakdown(),
            }),
            CheckoutStep::Payment => self.payment.as_ref().map(|p| OrderSummary {
                movie_title: p.draft.movie_title.clone(),
                date: p.draft.date,
                time: p.draft.time,
                seats: p.draft.seats_label(),
                category: p.draft.category,
                price: p.draft.price,
            }),
        }
    }

    /// Проверяет промокод через API и применяет ответ.
    pub async fn apply_promo(&mut self, api: &ApiClient) -> Option<PromoOutcome> {
        let request = self.seats_mut()?.begin_promo()?;
        let result = api.validate_promo(&request.code).await;
        let stage = self.seats_mut()?;
        Some(stage.finish_promo(&request, result))
    }

    /// Отправляет замороженный черновик. При ошибке черновик остаётся, и повтор
    /// пользователем уйдёт с тем же ключом идемпотентности.
    pub async fn submit<F>(&mut self, api: &ApiClient, on_phase: F) -> Result<BookingConfirmation, SubmissionError>
    where
        F: FnMut(ProcessingPhase),
    {
        if self.step != CheckoutStep::Payment {
            return Err(SubmissionError::NotAtPayment);
        }
        let payment = self.payment.as_ref().ok_or(SubmissionError::NotAtPayment)?;
        if payment.confirmation.is_some() {
            return Err(SubmissionError::AlreadySubmitted);
        }

        let result = submission::submit(api, &payment.draft, payment.method, &payment.card, on_phase).await;

        let Some(payment) = self.payment.as_mut() else {
            return Err(SubmissionError::NotAtPayment);
        };
        match result {
            Ok(confirmation) => {
                payment.confirmation = Some(confirmation.clone());
                payment.last_error = None;
                if let Some(seats) = self.seats.as_mut() {
                    seats.selection = Selection::new();
                }
                Ok(confirmation)
            }
            Err(e) => {
                payment.last_error = Some(e.user_message());
                Err(e)
            }
        }
    }
}
