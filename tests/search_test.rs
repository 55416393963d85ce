//! Поиск по каталогу: короткие запросы, debounce и отбрасывание устаревших ответов.

mod common;

use std::time::Duration;

use movie_booking::config::SearchConfig;
use movie_booking::search_client::{SearchClient, SearchOutcome};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn titles(outcome: &SearchOutcome) -> Vec<String> {
    match outcome {
        SearchOutcome::Results(movies) => movies.iter().map(|m| m.title.clone()).collect(),
        _ => Vec::new(),
    }
}

async fn mount_search(server: &MockServer, query: &str, title: &str, delay: Duration, times: u64) {
    Mock::given(method("GET"))
        .and(path("/api/movies/search"))
        .and(query_param("query", query))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"_id": title, "title": title}]))
                .set_delay(delay),
        )
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn short_query_is_not_sent_and_empty_reloads_all() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/movies/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/movies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([common::movie_json()])))
        .expect(1)
        .mount(&server)
        .await;

    let search = SearchClient::new(
        common::anonymous_client(&server),
        &SearchConfig { debounce_ms: 0, min_query_len: 2 },
    );
    assert_eq!(search.search("d").await.unwrap(), SearchOutcome::Skipped);
    assert_eq!(titles(&search.search("   ").await.unwrap()), vec!["Dune"]);
}

#[tokio::test]
async fn slow_older_response_is_discarded() {
    let server = MockServer::start().await;
    mount_search(&server, "dune", "Dune", Duration::from_millis(400), 1).await;
    mount_search(&server, "arrival", "Arrival", Duration::ZERO, 1).await;

    let search = SearchClient::new(
        common::anonymous_client(&server),
        &SearchConfig { debounce_ms: 0, min_query_len: 2 },
    );
    let (older, newer) = tokio::join!(search.search("dune"), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        search.search("arrival").await
    });

    assert_eq!(older.unwrap(), SearchOutcome::Superseded);
    assert_eq!(titles(&newer.unwrap()), vec!["Arrival"]);
}

#[tokio::test]
async fn debounce_skips_intermediate_keystrokes() {
    let server = MockServer::start().await;
    mount_search(&server, "du", "Du", Duration::ZERO, 0).await;
    mount_search(&server, "dune", "Dune", Duration::ZERO, 1).await;

    let search = SearchClient::new(
        common::anonymous_client(&server),
        &SearchConfig { debounce_ms: 200, min_query_len: 2 },
    );
    let (first, last) = tokio::join!(search.search("du"), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        search.search(" dune ").await
    });

    assert_eq!(first.unwrap(), SearchOutcome::Superseded);
    assert_eq!(titles(&last.unwrap()), vec!["Dune"]);
}
