use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{SeatCategory, SeatId};

/// Статус брони. Принадлежит серверу, клиент только отображает.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
    Refunded,
    Other(String),
}

impl From<String> for BookingStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "confirmed" => BookingStatus::Confirmed,
            "cancelled" => BookingStatus::Cancelled,
            "refunded" => BookingStatus::Refunded,
            _ => BookingStatus::Other(value),
        }
    }
}

impl From<BookingStatus> for String {
    fn from(value: BookingStatus) -> Self {
        value.as_str().to_string()
    }
}

impl BookingStatus {
    pub fn as_str(&self) -> &str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Refunded => "refunded",
            BookingStatus::Other(s) => s,
        }
    }
}

impl fmt::Display for BookingStatus {
    // "confirmed" -> "Confirmed"
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut chars = self.as_str().chars();
        match chars.next() {
            Some(first) => write!(f, "{}{}", first.to_uppercase(), chars.as_str()),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingSeat {
    pub row: char,
    pub number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<SeatCategory>,
}

impl BookingSeat {
    pub fn id(&self) -> SeatId {
        SeatId::new(self.row, self.number)
    }
}

/// Фильм в брони приходит либо развёрнутым объектом, либо просто id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BookedMovie {
    Populated {
        #[serde(rename = "_id", default)]
        id: Option<String>,
        title: String,
        #[serde(default)]
        poster: Option<String>,
    },
    Id(String),
}

impl BookedMovie {
    pub fn title(&self) -> &str {
        match self {
            BookedMovie::Populated { title, .. } => title,
            BookedMovie::Id(id) => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(rename = "_id")]
    pub id: String,
    pub movie: BookedMovie,
    pub showtime: DateTime<Utc>,
    #[serde(default)]
    pub seats: Vec<BookingSeat>,
    pub total_amount: Decimal,
    pub status: BookingStatus,
    #[serde(default)]
    pub booking_reference: Option<String>,
}

impl Booking {
    /// "A1, A2"
    pub fn seats_label(&self) -> String {
        self.seats
            .iter()
            .map(|s| s.id().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_server_booking() {
        let json = r#"{
            "_id": "b1",
            "movie": {"_id": "m1", "title": "Dune", "poster": "p.jpg"},
            "showtime": "2024-01-05T23:30:00Z",
            "seats": [{"row": "A", "number": 1}, {"row": "A", "number": 2, "category": "premium"}],
            "totalAmount": 30,
            "status": "confirmed",
            "bookingReference": "BK-42"
        }"#;
        let booking: Booking = serde_json::from_str(json).unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.movie.title(), "Dune");
        assert_eq!(booking.seats_label(), "A1, A2");
        assert_eq!(booking.total_amount, Decimal::from(30));
    }

    #[test]
    fn unknown_status_is_kept_verbatim() {
        let status = BookingStatus::from("pending".to_string());
        assert_eq!(status, BookingStatus::Other("pending".to_string()));
        assert_eq!(status.to_string(), "Pending");
        assert_eq!(BookingStatus::Refunded.to_string(), "Refunded");
    }

    #[test]
    fn movie_reference_may_be_plain_id() {
        let movie: BookedMovie = serde_json::from_str(r#""m9""#).unwrap();
        assert_eq!(movie.title(), "m9");
    }
}
