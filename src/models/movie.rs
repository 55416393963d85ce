use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::showtime::Showtime;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTable {
    pub standard: Decimal,
    pub premium: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    #[serde(default)]
    pub imdb: Option<f64>,
}

/// Длительность приходит то числом минут, то готовой строкой ("2h 28m").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Runtime {
    Minutes(u32),
    Text(String),
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Runtime::Minutes(m) => write!(f, "{} min", m),
            Runtime::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub duration: Option<Runtime>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub genre: Vec<String>,
    #[serde(default)]
    pub director: Option<String>,
    #[serde(default)]
    pub rating: Option<Rating>,
    #[serde(default)]
    pub release_date: Option<DateTime<Utc>>,
    // В списке фильмов цен может не быть, в карточке фильма они обязательны для бронирования
    #[serde(default)]
    pub price: Option<PriceTable>,
    #[serde(default)]
    pub showtimes: Vec<Showtime>,
}

impl Movie {
    pub fn imdb_rating(&self) -> Option<f64> {
        self.rating.as_ref().and_then(|r| r.imdb)
    }

    /// "7.9" или "N/A".
    pub fn rating_label(&self) -> String {
        match self.imdb_rating() {
            Some(r) => format!("{:.1}", r),
            None => "N/A".to_string(),
        }
    }

    pub fn genres_label(&self) -> String {
        self.genre.join(", ")
    }

    pub fn has_genre(&self, genre: &str) -> bool {
        self.genre.iter().any(|g| g == genre)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_movie_detail() {
        let json = r#"{
            "_id": "m1",
            "title": "Dune",
            "genre": ["Sci-Fi", "Drama"],
            "duration": "2h 46m",
            "rating": {"imdb": 8.53},
            "releaseDate": "2024-03-01T00:00:00Z",
            "price": {"standard": 10, "premium": 15.5}
        }"#;
        let movie: Movie = serde_json::from_str(json).unwrap();
        assert_eq!(movie.id, "m1");
        assert_eq!(movie.rating_label(), "8.5");
        assert_eq!(movie.genres_label(), "Sci-Fi, Drama");
        assert_eq!(movie.duration.as_ref().unwrap().to_string(), "2h 46m");
        let price = movie.price.unwrap();
        assert_eq!(price.standard, Decimal::from(10));
        assert_eq!(price.premium, Decimal::new(155, 1));
    }

    #[test]
    fn rating_falls_back_to_na() {
        let movie: Movie = serde_json::from_str(r#"{"_id":"m2","title":"Untitled","duration":95}"#).unwrap();
        assert_eq!(movie.rating_label(), "N/A");
        assert_eq!(movie.duration, Some(Runtime::Minutes(95)));
        assert!(movie.showtimes.is_empty());
    }
}
