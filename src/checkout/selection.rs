use crate::models::{Seat, SeatId};

/// Набор выбранных пользователем мест для текущего сеанса.
///
/// Значение неизменяемое: каждое переключение возвращает новый `Selection`,
/// старый остаётся как был. Порядок - порядок выбора.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    seats: Vec<Seat>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Выбранное место снимается, свободное добавляется.
    /// Занятое или зарезервированное место не меняет набор (это не ошибка).
    pub fn toggled(&self, seat: &Seat) -> Selection {
        let id = seat.id();
        if self.contains(id) {
            return Selection {
                seats: self.seats.iter().filter(|s| s.id() != id).cloned().collect(),
            };
        }
        if !seat.is_available() {
            return self.clone();
        }
        let mut seats = self.seats.clone();
        seats.push(seat.clone());
        Selection { seats }
    }

    /// Оставляет только места, удовлетворяющие условию.
    pub fn retained<F>(&self, mut keep: F) -> Selection
    where
        F: FnMut(&Seat) -> bool,
    {
        Selection {
            seats: self.seats.iter().filter(|s| keep(s)).cloned().collect(),
        }
    }

    pub fn contains(&self, id: SeatId) -> bool {
        self.seats.iter().any(|s| s.id() == id)
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn ids(&self) -> Vec<SeatId> {
        self.seats.iter().map(Seat::id).collect()
    }

    /// "A1, A2"
    pub fn label(&self) -> String {
        self.seats
            .iter()
            .map(|s| s.id().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
