use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::str::FromStr;

use crate::models::Movie;
use crate::services::api::{ApiClient, ApiError};

pub const FETCH_MOVIE_FAILED: &str = "Failed to fetch movie details";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GenreFilter {
    #[default]
    All,
    Genre(String),
}

impl FromStr for GenreFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            Ok(GenreFilter::All)
        } else {
            Ok(GenreFilter::Genre(s.to_string()))
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortBy {
    #[default]
    Rating,
    ReleaseDate,
    Title,
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rating" => Ok(SortBy::Rating),
            "releaseDate" | "release-date" => Ok(SortBy::ReleaseDate),
            "title" => Ok(SortBy::Title),
            other => Err(format!("unknown sort '{}', expected rating|releaseDate|title", other)),
        }
    }
}

/// Локальные фильтры списка фильмов.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieQuery {
    pub genre: GenreFilter,
    pub title: Option<String>,
    pub sort: SortBy,
}

pub fn filter_and_sort(movies: &[Movie], query: &MovieQuery) -> Vec<Movie> {
    let needle = query
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase);

    let mut out: Vec<Movie> = movies
        .iter()
        .filter(|m| match &query.genre {
            GenreFilter::All => true,
            GenreFilter::Genre(g) => m.has_genre(g),
        })
        .filter(|m| needle.as_ref().map_or(true, |n| m.title.to_lowercase().contains(n.as_str())))
        .cloned()
        .collect();

    match query.sort {
        // без рейтинга считаем 0
        SortBy::Rating => out.sort_by(|a, b| {
            let (a, b) = (a.imdb_rating().unwrap_or(0.0), b.imdb_rating().unwrap_or(0.0));
            b.partial_cmp(&a).unwrap_or(Ordering::Equal)
        }),
        SortBy::ReleaseDate => out.sort_by(|a, b| b.release_date.cmp(&a.release_date)),
        SortBy::Title => out.sort_by(|a, b| a.title.cmp(&b.title)),
    }
    out
}

/// Жанры для выпадающего списка фильтра.
pub fn genres(movies: &[Movie]) -> Vec<String> {
    movies
        .iter()
        .flat_map(|m| m.genre.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Карточка фильма. Ошибку показываем текстом с кнопкой повтора, сами не повторяем.
pub async fn fetch_movie(api: &ApiClient, movie_id: &str) -> Result<Movie, String> {
    api.get_movie(movie_id)
        .await
        .map_err(|e: ApiError| e.user_message(FETCH_MOVIE_FAILED))
}
