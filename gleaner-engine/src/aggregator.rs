use crate::error::{ExtractError, Result};
use crate::fetch;
use crate::result::AggregateResult;
use crate::schema::ExtractionRequest;
use reqwest::Client;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};
use url::Url;

/// Called once per page with the page's position in the run and its URL.
pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

/// Top-level entry point: fetches one page, or a paginated range of pages,
/// and merges the per-page outcomes into one result.
///
/// Pages are fetched sequentially in page-index order, one request in
/// flight at a time. A page failure never short-circuits the rest of the
/// run; only a malformed request aborts before the first fetch.
pub struct Extractor {
    client: Client,
    progress_callback: Option<ProgressCallback>,
    cancel_flag: Option<Arc<AtomicBool>>,
}

impl Extractor {
    pub fn new() -> Self {
        Self::with_timeout(10)
    }

    /// `timeout_secs` bounds each page fetch; a page that exceeds it is
    /// recorded as that page's fetch failure and the run continues.
    pub fn with_timeout(timeout_secs: u64) -> Self {
        let client = Client::builder()
            .user_agent("Gleaner/0.2 (https://github.com/trapdoorsec/gleaner)")
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .connect_timeout(std::time::Duration::from_secs(timeout_secs.div_ceil(2)))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            progress_callback: None,
            cancel_flag: None,
        }
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Checked between page fetches. Once set, remaining pages are
    /// abandoned and the partial result is returned with whatever status
    /// its contents imply.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel_flag = Some(flag);
        self
    }

    pub async fn extract(&self, request: &ExtractionRequest) -> Result<AggregateResult> {
        request.validate()?;

        let base_url = Url::parse(&request.url)
            .map_err(|e| ExtractError::InvalidUrl(format!("'{}': {}", request.url, e)))?;

        let page_urls: Vec<Url> = if request.pagination.enabled {
            request
                .pagination
                .page_sequence()
                .into_iter()
                .map(|page| rewrite_query_param(&base_url, &request.pagination.query_param, page))
                .collect()
        } else {
            vec![base_url]
        };

        info!(
            "Starting extraction of {} over {} page(s)",
            request.url,
            page_urls.len()
        );

        let mut result = AggregateResult::new();
        for (index, page_url) in page_urls.iter().enumerate() {
            if self.is_cancelled() {
                warn!(
                    "Extraction cancelled after {} of {} page(s)",
                    index,
                    page_urls.len()
                );
                break;
            }

            if let Some(ref callback) = self.progress_callback {
                callback(index, page_url.to_string());
            }

            let outcome =
                fetch::fetch_page(&self.client, page_url.as_str(), &request.container, &request.item)
                    .await;
            result.fold(outcome);
        }

        info!(
            "Extraction complete: {} record(s), {} failed page(s)",
            result.records.len(),
            result.errors.len()
        );
        Ok(result)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel_flag
            .as_ref()
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Rewrite one query parameter to `value`, leaving every other URL
/// component untouched. An existing parameter keeps its position (duplicate
/// occurrences collapse into one); a missing parameter is appended.
pub fn rewrite_query_param(url: &Url, param: &str, value: i64) -> Url {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut rewritten = url.clone();
    {
        let mut serializer = rewritten.query_pairs_mut();
        serializer.clear();
        let mut replaced = false;
        for (key, existing) in &pairs {
            if key == param {
                if !replaced {
                    serializer.append_pair(key, &value.to_string());
                    replaced = true;
                }
            } else {
                serializer.append_pair(key, existing);
            }
        }
        if !replaced {
            serializer.append_pair(param, &value.to_string());
        }
    }
    rewritten
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ExtractionStatus;
    use crate::schema::{
        InfoDescriptor, PaginationSpec, SearchKind, SearchLocator, SearchedElementNode,
    };
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn game_page(titles: &[&str]) -> String {
        let mut body = String::from(r#"<html><body><ul class="game-list">"#);
        for title in titles {
            body.push_str(&format!(
                r#"<li><span class="title">{}</span></li>"#,
                title
            ));
        }
        body.push_str("</ul></body></html>");
        body
    }

    fn game_request(url: String, pagination: PaginationSpec) -> ExtractionRequest {
        ExtractionRequest {
            url,
            pagination,
            container: SearchLocator::new(SearchKind::ByClass, "game-list"),
            item: SearchedElementNode {
                locator: SearchLocator::all(SearchKind::ByTag, "li"),
                info: vec![],
                children: vec![SearchedElementNode {
                    locator: SearchLocator::new(SearchKind::ByClass, "title"),
                    info: vec![InfoDescriptor::inner_text("title")],
                    children: vec![],
                }],
            },
        }
    }

    fn pages_1_to_5() -> PaginationSpec {
        PaginationSpec {
            enabled: true,
            query_param: "page".to_string(),
            first_page: 1,
            last_page: 5,
            step: 1,
        }
    }

    #[test]
    fn test_rewrite_replaces_existing_value() {
        let url = Url::parse("https://example.com/games?page=1&sort=asc").unwrap();
        let rewritten = rewrite_query_param(&url, "page", 7);
        assert_eq!(
            rewritten.as_str(),
            "https://example.com/games?page=7&sort=asc"
        );
    }

    #[test]
    fn test_rewrite_appends_missing_param() {
        let url = Url::parse("https://example.com/games?sort=asc").unwrap();
        let rewritten = rewrite_query_param(&url, "page", 2);
        assert_eq!(
            rewritten.as_str(),
            "https://example.com/games?sort=asc&page=2"
        );
    }

    #[test]
    fn test_rewrite_is_idempotent_and_scoped() {
        let url = Url::parse("https://example.com/a/b?x=1&page=3&y=2").unwrap();
        let once = rewrite_query_param(&url, "page", 4);
        let twice = rewrite_query_param(&once, "page", 5);
        assert_eq!(twice.as_str(), "https://example.com/a/b?x=1&page=5&y=2");

        let other = rewrite_query_param(&twice, "y", 9);
        assert_eq!(other.as_str(), "https://example.com/a/b?x=1&page=5&y=9");
        assert_eq!(other.path(), url.path());
        assert_eq!(other.host_str(), url.host_str());
    }

    #[test]
    fn test_rewrite_collapses_duplicates() {
        let url = Url::parse("https://example.com/?page=1&a=2&page=3").unwrap();
        let rewritten = rewrite_query_param(&url, "page", 8);
        assert_eq!(rewritten.as_str(), "https://example.com/?page=8&a=2");
    }

    #[tokio::test]
    async fn test_single_page_extraction() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/games"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string(game_page(&["Chess", "Go"])),
            )
            .mount(&mock_server)
            .await;

        let request = game_request(
            format!("{}/games", mock_server.uri()),
            PaginationSpec::default(),
        );
        let result = Extractor::new().extract(&request).await.unwrap();

        assert_eq!(result.status, ExtractionStatus::Success);
        assert!(result.errors.is_empty());
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.records[0]["title"], "Chess");
        assert_eq!(result.records[1]["title"], "Go");
    }

    #[tokio::test]
    async fn test_pagination_with_one_failing_page() {
        let mock_server = MockServer::start().await;
        for page in [1, 2, 4, 5] {
            let title = format!("Game {}", page);
            Mock::given(method("GET"))
                .and(path("/games"))
                .and(query_param("page", page.to_string()))
                .respond_with(
                    ResponseTemplate::new(200).set_body_string(game_page(&[title.as_str()])),
                )
                .mount(&mock_server)
                .await;
        }
        // Page 3 renders without the container
        Mock::given(method("GET"))
            .and(path("/games"))
            .and(query_param("page", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
            .mount(&mock_server)
            .await;

        let request = game_request(format!("{}/games?page=1", mock_server.uri()), pages_1_to_5());
        let result = Extractor::new().extract(&request).await.unwrap();

        assert_eq!(result.status, ExtractionStatus::Success);
        assert_eq!(result.records.len(), 4);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].url.contains("page=3"));
        assert_eq!(
            result.errors[0].message,
            "Container with type 'game-list' wasn't found!"
        );
    }

    #[tokio::test]
    async fn test_all_pages_unreachable() {
        // Nothing listens on this port; every page fails at the transport
        let request = game_request("http://127.0.0.1:9/games?page=1".to_string(), {
            PaginationSpec {
                enabled: true,
                query_param: "page".to_string(),
                first_page: 1,
                last_page: 3,
                step: 1,
            }
        });
        let result = Extractor::with_timeout(2).extract(&request).await.unwrap();

        assert_eq!(result.status, ExtractionStatus::Error);
        assert!(result.records.is_empty());
        assert_eq!(result.errors.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_page_range_is_no_data() {
        let request = game_request("https://example.com/games".to_string(), {
            PaginationSpec {
                enabled: true,
                query_param: "page".to_string(),
                first_page: 5,
                last_page: 1,
                step: 1,
            }
        });
        let result = Extractor::new().extract(&request).await.unwrap();

        assert_eq!(result.status, ExtractionStatus::NoData);
        assert!(result.records.is_empty());
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn test_config_error_aborts_before_any_fetch() {
        let mut request = game_request("https://example.com/games".to_string(), pages_1_to_5());
        request.pagination.step = 0;
        let err = Extractor::new().extract(&request).await.unwrap_err();
        assert!(matches!(err, ExtractError::Config(_)));
    }

    #[tokio::test]
    async fn test_cancel_flag_returns_partial_result() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/games"))
            .respond_with(ResponseTemplate::new(200).set_body_string(game_page(&["Chess"])))
            .mount(&mock_server)
            .await;

        let cancel = Arc::new(AtomicBool::new(false));
        let cancel_after_first = cancel.clone();
        let extractor = Extractor::new()
            .with_cancel_flag(cancel.clone())
            .with_progress_callback(Arc::new(move |index, _url| {
                if index == 0 {
                    cancel_after_first.store(true, Ordering::Relaxed);
                }
            }));

        let request = game_request(format!("{}/games?page=1", mock_server.uri()), pages_1_to_5());
        let result = extractor.extract(&request).await.unwrap();

        // First page completed, the remaining four were abandoned
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.status, ExtractionStatus::Success);
    }

    #[tokio::test]
    async fn test_non_paginated_matches_single_page_outcome() {
        let mock_server = MockServer::start().await;
        let body = game_page(&["Chess", "Go", "Shogi"]);
        Mock::given(method("GET"))
            .and(path("/games"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body.clone()))
            .mount(&mock_server)
            .await;

        let request = game_request(
            format!("{}/games", mock_server.uri()),
            PaginationSpec::default(),
        );
        let aggregated = Extractor::new().extract(&request).await.unwrap();

        let direct =
            fetch::extract_records(&body, &request.container, &request.item).unwrap();
        assert_eq!(aggregated.records, direct);
    }
}
