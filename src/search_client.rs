use std::time::Duration;
use tracing::{debug, info};

use crate::config::SearchConfig;
use crate::models::Movie;
use crate::sequence::RequestSequence;
use crate::services::api::{ApiClient, ApiError};

/// Чем закончился запрос каталога.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Results(Vec<Movie>),
    /// За время запроса пришёл более новый, этот ответ выброшен.
    Superseded,
    /// Запрос слишком короткий, на сервер не ходили.
    Skipped,
}

/// Клиент для поиска по каталогу фильмов
pub struct SearchClient {
    api: ApiClient,
    sequence: RequestSequence,
    debounce: Duration,
    min_query_len: usize,
}

impl SearchClient {
    pub fn new(api: ApiClient, config: &SearchConfig) -> Self {
        Self {
            api,
            sequence: RequestSequence::new(),
            debounce: Duration::from_millis(config.debounce_ms),
            min_query_len: config.min_query_len,
        }
    }

    /// Полный список фильмов.
    pub async fn load_all(&self) -> Result<SearchOutcome, ApiError> {
        let ticket = self.sequence.next();
        let result = self.api.list_movies().await;
        if !self.sequence.is_current(ticket) {
            debug!("Discarding superseded movie list");
            return Ok(SearchOutcome::Superseded);
        }
        result.map(SearchOutcome::Results)
    }

    /// Поиск по мере ввода. Пустой запрос возвращает весь каталог,
    /// короткий не отправляется, остальные уходят после паузы `debounce`.
    pub async fn search(&self, query: &str) -> Result<SearchOutcome, ApiError> {
        let query = Self::prepare_search_query(query);
        if query.is_empty() {
            return self.load_all().await;
        }

        let ticket = self.sequence.next();
        if query.chars().count() < self.min_query_len {
            return Ok(SearchOutcome::Skipped);
        }

        // Быстрый ввод: пока ждём, пришёл новый запрос, этот не отправляем
        tokio::time::sleep(self.debounce).await;
        if !self.sequence.is_current(ticket) {
            return Ok(SearchOutcome::Superseded);
        }

        let result = self.api.search_movies(&query).await;
        if !self.sequence.is_current(ticket) {
            debug!("Discarding superseded search results for '{}'", query);
            return Ok(SearchOutcome::Superseded);
        }
        let movies = result?;
        info!("Search '{}' returned {} movies", query, movies.len());
        Ok(SearchOutcome::Results(movies))
    }

    fn prepare_search_query(query: &str) -> String {
        query.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}
