use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{PriceTable, Seat, SeatCategory};

/// Правило, по которому определяется категория места.
/// Задаётся явно в записи сеанса, клиент его не угадывает.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CategoryRule {
    /// Категория берётся из данных самого места (`Seat::category`), по умолчанию standard.
    Explicit,
    /// Первые `rows` рядов (по алфавиту) - премиум.
    LeadingRows { rows: u8 },
}

impl CategoryRule {
    pub fn category_of(&self, seat: &Seat) -> SeatCategory {
        match *self {
            CategoryRule::Explicit => seat.category.unwrap_or_default(),
            CategoryRule::LeadingRows { rows } => {
                let row = seat.row.to_ascii_uppercase();
                let offset = (row as u32).wrapping_sub('A' as u32);
                if offset < rows as u32 {
                    SeatCategory::Premium
                } else {
                    SeatCategory::Standard
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Showtime {
    #[serde(rename = "_id")]
    pub id: String,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub price: Option<PriceTable>,
    #[serde(default)]
    pub available_seats: Vec<Seat>,
    #[serde(default)]
    pub category_rule: Option<CategoryRule>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_rows_rule_marks_first_rows_premium() {
        let rule = CategoryRule::LeadingRows { rows: 3 };
        assert_eq!(rule.category_of(&Seat::available('A', 1)), SeatCategory::Premium);
        assert_eq!(rule.category_of(&Seat::available('c', 7)), SeatCategory::Premium);
        assert_eq!(rule.category_of(&Seat::available('D', 1)), SeatCategory::Standard);
    }

    #[test]
    fn explicit_rule_reads_seat_data() {
        let mut seat = Seat::available('H', 2);
        assert_eq!(CategoryRule::Explicit.category_of(&seat), SeatCategory::Standard);
        seat.category = Some(SeatCategory::Premium);
        assert_eq!(CategoryRule::Explicit.category_of(&seat), SeatCategory::Premium);
    }

    #[test]
    fn decodes_showtime_record() {
        let json = r#"{
            "_id": "s1",
            "startTime": "2024-01-05T18:30:00Z",
            "availableSeats": [{"row": "A", "number": 1, "status": "available", "category": "premium"}],
            "categoryRule": {"kind": "explicit"}
        }"#;
        let showtime: Showtime = serde_json::from_str(json).unwrap();
        assert_eq!(showtime.category_rule, Some(CategoryRule::Explicit));
        assert_eq!(showtime.available_seats.len(), 1);
    }
}
