//! Время сеанса в 12-часовом формате ("6:30 PM") и сборка момента начала сеанса.
//!
//! Строка времени разбирается один раз, при выборе времени (или при загрузке
//! расписания из конфига). Дальше по сценарию ходит уже `ShowTime`, поэтому
//! на шаге оплаты разбор упасть не может.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShowTimeError {
    #[error("malformed show time '{0}', expected H:MM AM|PM")]
    Malformed(String),
    #[error("{0} does not exist in the local time zone")]
    NonexistentLocalTime(NaiveDateTime),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShowTime(NaiveTime);

impl ShowTime {
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(ShowTime)
    }

    pub fn time(&self) -> NaiveTime {
        self.0
    }

    /// Календарный день + время сеанса, без часового пояса.
    pub fn on(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.0)
    }

    /// Момент начала сеанса: время трактуется как локальное.
    pub fn instant_on(&self, date: NaiveDate) -> Result<DateTime<Utc>, ShowTimeError> {
        let naive = self.on(date);
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or(ShowTimeError::NonexistentLocalTime(naive))
    }
}

impl FromStr for ShowTime {
    type Err = ShowTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ShowTimeError::Malformed(s.to_string());
        let trimmed = s.trim();

        let (hours, rest) = trimmed.split_once(':').ok_or_else(malformed)?;
        if rest.len() < 4 || !rest.is_char_boundary(2) {
            return Err(malformed());
        }
        let (minutes, period) = rest.split_at(2);
        if !hours.bytes().chain(minutes.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }

        let hour: u32 = hours.parse().map_err(|_| malformed())?;
        let minute: u32 = minutes.parse().map_err(|_| malformed())?;
        if hours.is_empty() || hours.len() > 2 || !(1..=12).contains(&hour) || minute > 59 {
            return Err(malformed());
        }

        // 12 AM -> 0, 12 PM -> 12
        let hour = match period.trim_start().to_ascii_uppercase().as_str() {
            "AM" => hour % 12,
            "PM" => hour % 12 + 12,
            _ => return Err(malformed()),
        };

        ShowTime::from_hm(hour, minute).ok_or_else(malformed)
    }
}

impl fmt::Display for ShowTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%-I:%M %p"))
    }
}

/// Даты, доступные для бронирования: сегодня и ещё `days - 1` дней вперёд.
pub fn available_dates(today: NaiveDate, days: u32) -> Vec<NaiveDate> {
    (0..days as i64)
        .filter_map(|offset| today.checked_add_signed(Duration::days(offset)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn evening_show_combines_onto_calendar_day() {
        let time: ShowTime = "11:30 PM".parse().unwrap();
        let at = time.on(date(2024, 1, 5));
        assert_eq!(at, date(2024, 1, 5).and_hms_opt(23, 30, 0).unwrap());
    }

    #[test]
    fn noon_and_midnight_edges() {
        assert_eq!("12:30 PM".parse::<ShowTime>().unwrap(), ShowTime::from_hm(12, 30).unwrap());
        assert_eq!("12:05 AM".parse::<ShowTime>().unwrap(), ShowTime::from_hm(0, 5).unwrap());
        assert_eq!("10:00 am".parse::<ShowTime>().unwrap(), ShowTime::from_hm(10, 0).unwrap());
        assert_eq!("6:30PM".parse::<ShowTime>().unwrap(), ShowTime::from_hm(18, 30).unwrap());
    }

    #[test]
    fn rejects_malformed_times() {
        for bad in ["", "6:30", "13:00 PM", "0:15 AM", "6:60 PM", "six thirty", "6:3 PM", "6:30 XM", "123:00 AM"] {
            assert!(bad.parse::<ShowTime>().is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn signs_are_not_digits() {
        for bad in ["+6:30 PM", "6:+3 PM", "-1:30 AM"] {
            assert!(bad.parse::<ShowTime>().is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn displays_in_twelve_hour_form() {
        assert_eq!(ShowTime::from_hm(18, 30).unwrap().to_string(), "6:30 PM");
        assert_eq!(ShowTime::from_hm(0, 0).unwrap().to_string(), "12:00 AM");
    }

    #[test]
    fn instant_round_trips_through_local_time() {
        let time: ShowTime = "3:00 PM".parse().unwrap();
        let instant = time.instant_on(date(2024, 6, 1)).unwrap();
        assert_eq!(instant.with_timezone(&Local).naive_local(), time.on(date(2024, 6, 1)));
    }

    #[test]
    fn lists_a_week_of_dates() {
        let dates = available_dates(date(2024, 12, 29), 7);
        assert_eq!(dates.len(), 7);
        assert_eq!(dates[0], date(2024, 12, 29));
        assert_eq!(dates[6], date(2025, 1, 4));
    }
}
