//! Сценарий бронирования на клиенте: выбор даты и времени, схема зала,
//! выбор мест, расчёт суммы и переход к оплате.

pub mod draft;
pub mod flow;
pub mod pricing;
pub mod seat_map;
pub mod selection;
pub mod showtime;

pub use draft::BookingDraft;
pub use flow::{
    BlockedReason, CheckoutError, CheckoutFlow, CheckoutStep, DateTimeStage, OrderSummary, PaymentStage, PromoError,
    PromoOutcome, PromoRequest, SeatsStage, Transition,
};
pub use pricing::{price, Money, PriceBreakdown};
pub use seat_map::{SeatMap, SeatRow, SeatState};
pub use selection::Selection;
pub use showtime::{available_dates, ShowTime, ShowTimeError};
