//! One fetch-parse-extract cycle for a single URL.

use crate::dom;
use crate::error::PageError;
use crate::result::{Diagnostic, PageOutcome, Record};
use crate::schema::{SearchLocator, SearchedElementNode};
use crate::walk;
use reqwest::Client;
use scraper::Html;
use tracing::{debug, warn};

/// Fetch `url`, locate the container and its repeating items, and walk the
/// schema over every item. Failures are diagnosed per page, never raised:
/// the caller folds the outcome and moves on to the next page.
pub async fn fetch_page(
    client: &Client,
    url: &str,
    container: &SearchLocator,
    item: &SearchedElementNode,
) -> PageOutcome {
    debug!("Fetching {}", url);

    let body = match fetch_markup(client, url).await {
        Ok(body) => body,
        Err(e) => {
            warn!("Fetch failed for {}: {}", url, e);
            return PageOutcome::Error(Diagnostic::new(url, e.to_string()));
        }
    };

    match extract_records(&body, container, item) {
        Ok(records) => {
            debug!("Extracted {} record(s) from {}", records.len(), url);
            PageOutcome::Success(records)
        }
        Err(e) => PageOutcome::Error(Diagnostic::new(url, e.to_string())),
    }
}

async fn fetch_markup(client: &Client, url: &str) -> Result<String, PageError> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.text().await?)
}

/// Extraction half of the cycle, independent of transport so it can run
/// against any markup.
pub fn extract_records(
    markup: &str,
    container: &SearchLocator,
    item: &SearchedElementNode,
) -> Result<Vec<Record>, PageError> {
    let document = Html::parse_document(markup);

    let container_element = dom::find_first(document.root_element(), container)
        .ok_or_else(|| PageError::ContainerNotFound(container.name.clone()))?;

    let item_elements = dom::find_direct_children(container_element, &item.locator);
    if item_elements.is_empty() {
        return Err(PageError::ItemNotFound(item.locator.name.clone()));
    }

    let records: Vec<Record> = item_elements
        .into_iter()
        .map(|element| walk::walk(element, item))
        .filter(|record| !record.is_empty())
        .collect();

    if records.is_empty() {
        return Err(PageError::NoData);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{InfoDescriptor, SearchKind};

    const PAGE: &str = r#"
        <html><body>
            <ul class="game-list">
                <li><span class="title">Chess</span></li>
                <li><span class="title">Go</span></li>
            </ul>
        </body></html>
    "#;

    fn item_node() -> SearchedElementNode {
        SearchedElementNode {
            locator: SearchLocator::all(SearchKind::ByTag, "li"),
            info: vec![],
            children: vec![SearchedElementNode {
                locator: SearchLocator::new(SearchKind::ByClass, "title"),
                info: vec![InfoDescriptor::inner_text("title")],
                children: vec![],
            }],
        }
    }

    #[test]
    fn test_extract_records_success() {
        let container = SearchLocator::new(SearchKind::ByClass, "game-list");
        let records = extract_records(PAGE, &container, &item_node()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["title"], "Chess");
        assert_eq!(records[1]["title"], "Go");
    }

    #[test]
    fn test_extract_records_container_missing() {
        let container = SearchLocator::new(SearchKind::ByClass, "absent");
        let err = extract_records(PAGE, &container, &item_node()).unwrap_err();
        assert_eq!(err.to_string(), "Container with type 'absent' wasn't found!");
    }

    #[test]
    fn test_extract_records_item_missing() {
        let container = SearchLocator::new(SearchKind::ByClass, "game-list");
        let mut node = item_node();
        node.locator = SearchLocator::all(SearchKind::ByTag, "tr");
        let err = extract_records(PAGE, &container, &node).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Searched element with type 'tr' wasn't found!"
        );
    }

    #[test]
    fn test_extract_records_all_empty_is_no_data() {
        let container = SearchLocator::new(SearchKind::ByClass, "game-list");
        let mut node = item_node();
        // No descriptors anywhere and a child that never matches
        node.children[0].locator = SearchLocator::new(SearchKind::ByClass, "nothing");
        node.children[0].info.clear();
        let err = extract_records(PAGE, &container, &node).unwrap_err();
        assert_eq!(err.to_string(), "No data found!");
    }
}
