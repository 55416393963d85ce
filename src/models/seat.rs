use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Статус места, как его отдаёт сервер. Клиент его никогда не меняет.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    Available,
    Reserved,
    Booked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatCategory {
    #[default]
    Standard,
    Premium,
}

impl SeatCategory {
    /// Можно ли в чекауте этой категории выбрать место категории `seat`.
    /// Стандартный чекаут блокирует премиум-ряды, премиум пускает везде.
    pub fn admits(self, seat: SeatCategory) -> bool {
        match self {
            SeatCategory::Premium => true,
            SeatCategory::Standard => seat == SeatCategory::Standard,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SeatCategory::Standard => "standard",
            SeatCategory::Premium => "premium",
        }
    }
}

impl fmt::Display for SeatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeatCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(SeatCategory::Standard),
            "premium" => Ok(SeatCategory::Premium),
            other => Err(format!("unknown seat category '{}', expected standard|premium", other)),
        }
    }
}

/// Идентичность места - пара (ряд, номер).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeatId {
    pub row: char,
    pub number: u32,
}

impl SeatId {
    pub fn new(row: char, number: u32) -> Self {
        Self { row, number }
    }

    /// Разбирает метку вида "A12".
    pub fn parse(label: &str) -> Option<Self> {
        let mut chars = label.trim().chars();
        let row = chars.next().filter(|c| c.is_ascii_alphabetic())?;
        let number: u32 = chars.as_str().parse().ok()?;
        if number == 0 {
            return None;
        }
        Some(Self { row: row.to_ascii_uppercase(), number })
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row, self.number)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seat {
    pub row: char,
    pub number: u32,
    pub status: SeatStatus,
    // Явная категория есть не во всех записях сеанса
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<SeatCategory>,
}

impl Seat {
    pub fn available(row: char, number: u32) -> Self {
        Self { row, number, status: SeatStatus::Available, category: None }
    }

    pub fn id(&self) -> SeatId {
        SeatId::new(self.row, self.number)
    }

    pub fn is_available(&self) -> bool {
        self.status == SeatStatus::Available
    }
}
