use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{SeatCategory, SeatId};

use super::pricing::PriceBreakdown;
use super::showtime::ShowTime;

/// Замороженный черновик брони - копия состояния чекаута на момент перехода к оплате.
///
/// После заморозки правки в интерфейсе на него не влияют. `nonce` выдаётся при
/// заморозке и входит в ключ идемпотентности: повторная отправка того же
/// черновика идёт с тем же ключом.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingDraft {
    pub movie_id: String,
    pub movie_title: String,
    pub date: NaiveDate,
    pub time: ShowTime,
    pub showtime: DateTime<Utc>,
    pub seats: Vec<SeatId>,
    pub category: SeatCategory,
    pub promo_code: Option<String>,
    pub discount_percent: Decimal,
    pub price: PriceBreakdown,
    pub nonce: Uuid,
}

impl BookingDraft {
    pub fn total(&self) -> Decimal {
        self.price.total
    }

    pub fn seats_label(&self) -> String {
        self.seats.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(", ")
    }
}
