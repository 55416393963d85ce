use std::collections::BTreeMap;

use crate::models::{CategoryRule, Seat, SeatCategory, SeatId, SeatStatus, Showtime};

use super::selection::Selection;

/// Что показывать на месте схемы зала.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatState {
    Selected,
    Selectable,
    /// Место занято или зарезервировано на сервере.
    Unavailable(SeatStatus),
    /// Категория места не подходит под категорию чекаута.
    CategoryLocked,
}

impl SeatState {
    pub fn is_clickable(self) -> bool {
        matches!(self, SeatState::Selected | SeatState::Selectable)
    }
}

/// Один ряд схемы в порядке номеров мест.
#[derive(Debug, Clone, PartialEq)]
pub struct SeatRow<'a> {
    pub row: char,
    pub seats: Vec<&'a Seat>,
}

/// Схема зала для конкретного сеанса. Статусы мест - снимок с сервера,
/// схема их не меняет; "выбрано" живёт отдельно, в `Selection`.
#[derive(Debug, Clone, PartialEq)]
pub struct SeatMap {
    seats: Vec<Seat>,
    rule: CategoryRule,
}

impl SeatMap {
    pub fn new(seats: Vec<Seat>, rule: CategoryRule) -> Self {
        Self { seats, rule }
    }

    /// Зал по умолчанию: все места свободны, первые `premium_rows` рядов из `rows`
    /// (в их порядке, а не по алфавиту от 'A') - премиум. Категория пишется в каждое место.
    pub fn generated(rows: &[char], seats_per_row: u32, premium_rows: u8) -> Self {
        let seats = rows
            .iter()
            .enumerate()
            .flat_map(|(index, &row)| {
                let category = if index < premium_rows as usize {
                    SeatCategory::Premium
                } else {
                    SeatCategory::Standard
                };
                (1..=seats_per_row).map(move |n| Seat {
                    category: Some(category),
                    ..Seat::available(row, n)
                })
            })
            .collect();
        Self::new(seats, CategoryRule::Explicit)
    }

    /// Схема из записи сеанса. Если в записи нет мест, берётся `fallback`.
    pub fn from_showtime(showtime: &Showtime, fallback: &SeatMap) -> Self {
        if showtime.available_seats.is_empty() {
            return fallback.clone();
        }
        let rule = showtime.category_rule.unwrap_or(CategoryRule::Explicit);
        Self::new(showtime.available_seats.clone(), rule)
    }

    pub fn rule(&self) -> CategoryRule {
        self.rule
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn get(&self, id: SeatId) -> Option<&Seat> {
        self.seats.iter().find(|s| s.id() == id)
    }

    pub fn category_of(&self, seat: &Seat) -> SeatCategory {
        self.rule.category_of(seat)
    }

    /// Места, сгруппированные по рядам (ряды по алфавиту, места по номеру).
    pub fn rows(&self) -> Vec<SeatRow<'_>> {
        let mut by_row: BTreeMap<char, Vec<&Seat>> = BTreeMap::new();
        for seat in &self.seats {
            by_row.entry(seat.row).or_default().push(seat);
        }
        by_row
            .into_iter()
            .map(|(row, mut seats)| {
                seats.sort_by_key(|s| s.number);
                SeatRow { row, seats }
            })
            .collect()
    }

    /// Чистая функция от (статус, категория чекаута, текущий выбор).
    pub fn seat_state(&self, seat: &Seat, checkout: SeatCategory, selection: &Selection) -> SeatState {
        if selection.contains(seat.id()) {
            return SeatState::Selected;
        }
        if !seat.is_available() {
            return SeatState::Unavailable(seat.status);
        }
        if !checkout.admits(self.category_of(seat)) {
            return SeatState::CategoryLocked;
        }
        SeatState::Selectable
    }

    pub fn is_selectable(&self, seat: &Seat, checkout: SeatCategory, selection: &Selection) -> bool {
        self.seat_state(seat, checkout, selection) == SeatState::Selectable
    }

    /// Клик по месту. Возвращает новый выбор, если он изменился,
    /// иначе `None` (неизвестное место или заблокированное).
    pub fn click(&self, id: SeatId, checkout: SeatCategory, selection: &Selection) -> Option<Selection> {
        let seat = self.get(id)?;
        if !self.seat_state(seat, checkout, selection).is_clickable() {
            return None;
        }
        Some(selection.toggled(seat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hall() -> SeatMap {
        SeatMap::generated(&['A', 'B', 'C', 'D', 'E'], 4, 3)
    }

    #[test]
    fn generated_hall_partitions_rows() {
        let map = hall();
        let rows = map.rows();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].row, 'A');
        assert_eq!(rows[0].seats.len(), 4);
        assert_eq!(rows[4].seats[3].number, 4);
    }

    #[test]
    fn standard_checkout_locks_premium_rows() {
        let map = hall();
        let sel = Selection::new();
        let a1 = map.get(SeatId::new('A', 1)).unwrap();
        let d1 = map.get(SeatId::new('D', 1)).unwrap();
        assert_eq!(map.seat_state(a1, SeatCategory::Standard, &sel), SeatState::CategoryLocked);
        assert_eq!(map.seat_state(d1, SeatCategory::Standard, &sel), SeatState::Selectable);
        assert_eq!(map.seat_state(a1, SeatCategory::Premium, &sel), SeatState::Selectable);
    }

    #[test]
    fn premium_rows_follow_layout_order() {
        let map = SeatMap::generated(&['D', 'E', 'F', 'G', 'H'], 2, 3);
        let d1 = map.get(SeatId::new('D', 1)).unwrap();
        let f2 = map.get(SeatId::new('F', 2)).unwrap();
        let g1 = map.get(SeatId::new('G', 1)).unwrap();
        assert_eq!(map.category_of(d1), SeatCategory::Premium);
        assert_eq!(map.category_of(f2), SeatCategory::Premium);
        assert_eq!(map.category_of(g1), SeatCategory::Standard);
    }

    #[test]
    fn click_toggles_selectable_seats_only() {
        let mut seats = vec![Seat::available('A', 1), Seat::available('A', 2)];
        seats[1].status = SeatStatus::Booked;
        let map = SeatMap::new(seats, CategoryRule::Explicit);

        let sel = map.click(SeatId::new('A', 1), SeatCategory::Standard, &Selection::new()).unwrap();
        assert!(sel.contains(SeatId::new('A', 1)));
        assert_eq!(map.click(SeatId::new('A', 2), SeatCategory::Standard, &sel), None);
        assert_eq!(map.click(SeatId::new('Z', 9), SeatCategory::Standard, &sel), None);

        let cleared = map.click(SeatId::new('A', 1), SeatCategory::Standard, &sel).unwrap();
        assert!(cleared.is_empty());
    }

    #[test]
    fn showtime_without_seats_uses_fallback_layout() {
        let showtime: Showtime = serde_json::from_str(
            r#"{"_id": "s1", "startTime": "2024-01-05T18:30:00Z"}"#,
        )
        .unwrap();
        let fallback = hall();
        assert_eq!(SeatMap::from_showtime(&showtime, &fallback), fallback);
    }

    #[test]
    fn showtime_seats_default_to_explicit_categories() {
        let showtime: Showtime = serde_json::from_str(
            r#"{"_id": "s1", "startTime": "2024-01-05T18:30:00Z",
                "availableSeats": [{"row": "A", "number": 1, "status": "available"}]}"#,
        )
        .unwrap();
        let map = SeatMap::from_showtime(&showtime, &hall());
        assert_eq!(map.rule(), CategoryRule::Explicit);
        assert_eq!(map.category_of(&map.seats()[0]), SeatCategory::Standard);
    }
}
