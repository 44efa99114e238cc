use crate::error::{ExtractError, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// How a locator identifies elements under a parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchKind {
    /// Match on the element's tag name (`div`, `span`, ...).
    #[serde(rename = "tag")]
    ByTag,
    /// Match on the `id` attribute.
    #[serde(rename = "id")]
    ById,
    /// Match on membership in the element's class list.
    #[serde(rename = "class")]
    ByClass,
}

impl SearchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchKind::ByTag => "tag",
            SearchKind::ById => "id",
            SearchKind::ByClass => "class",
        }
    }
}

/// Identifies how to find element(s) under a parent element.
///
/// With `match_all` unset this resolves to the first matching descendant at
/// any depth, in document order. With `match_all` set it resolves to every
/// matching *direct child* of the parent - deliberately non-recursive, so
/// nested repeating structures are not flattened into the parent's own
/// repetition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchLocator {
    pub kind: SearchKind,
    #[serde(default)]
    pub match_all: bool,
    pub name: String,
}

impl SearchLocator {
    pub fn new(kind: SearchKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            match_all: false,
            name: name.into(),
        }
    }

    pub fn all(kind: SearchKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            match_all: true,
            name: name.into(),
        }
    }
}

/// Page-range settings for paginated extraction.
///
/// When enabled, the engine rewrites `query_param` in the request URL for
/// every page index from `first_page` to `last_page` stepping by `step`
/// (inclusive of both ends reachable by the step, in either direction).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationSpec {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub query_param: String,
    #[serde(default)]
    pub first_page: i64,
    #[serde(default)]
    pub last_page: i64,
    #[serde(default = "default_step")]
    pub step: i64,
}

fn default_step() -> i64 {
    1
}

impl Default for PaginationSpec {
    fn default() -> Self {
        Self {
            enabled: false,
            query_param: String::new(),
            first_page: 0,
            last_page: 0,
            step: 1,
        }
    }
}

impl PaginationSpec {
    /// The page indices this spec covers, in fetch order. Empty when the
    /// last page is not reachable from the first in the step's direction.
    pub fn page_sequence(&self) -> Vec<i64> {
        let mut pages = Vec::new();
        let mut page = self.first_page;
        if self.step > 0 {
            while page <= self.last_page {
                pages.push(page);
                page += self.step;
            }
        } else if self.step < 0 {
            while page >= self.last_page {
                pages.push(page);
                page += self.step;
            }
        }
        pages
    }
}

/// Where a field's value comes from on a matched element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfoSource {
    /// The element's text content, descendants included.
    InnerText,
    /// A named attribute's value.
    Attribute,
}

/// One output field: which column it writes and where the value comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoDescriptor {
    pub target_column: String,
    pub source: InfoSource,
    #[serde(default)]
    pub attribute_name: String,
}

impl InfoDescriptor {
    pub fn inner_text(target_column: impl Into<String>) -> Self {
        Self {
            target_column: target_column.into(),
            source: InfoSource::InnerText,
            attribute_name: String::new(),
        }
    }

    pub fn attribute(target_column: impl Into<String>, attribute_name: impl Into<String>) -> Self {
        Self {
            target_column: target_column.into(),
            source: InfoSource::Attribute,
            attribute_name: attribute_name.into(),
        }
    }
}

/// One node of the recursive field schema.
///
/// A node's children are each resolved independently against the element
/// matched for this node (single match, any depth), not chained through one
/// another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchedElementNode {
    pub locator: SearchLocator,
    #[serde(default)]
    pub info: Vec<InfoDescriptor>,
    #[serde(default)]
    pub children: Vec<SearchedElementNode>,
}

/// A complete extraction request: where to fetch, how to paginate, and what
/// to pull out of each page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRequest {
    pub url: String,
    #[serde(default)]
    pub pagination: PaginationSpec,
    /// Single ancestor element bounding the repeating items on the page.
    pub container: SearchLocator,
    /// The repeating item inside the container, root of the field schema.
    /// Resolved match-all over the container's direct children regardless
    /// of its own `match_all` flag.
    pub item: SearchedElementNode,
}

impl ExtractionRequest {
    /// Check every schema invariant before any fetch starts. Violations are
    /// fatal: a malformed request is never partially extracted.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.url)
            .map_err(|e| ExtractError::InvalidUrl(format!("'{}': {}", self.url, e)))?;

        if self.pagination.enabled {
            if self.pagination.query_param.is_empty() {
                return Err(ExtractError::Config(
                    "pagination is enabled but query_param is empty".to_string(),
                ));
            }
            if self.pagination.step == 0 {
                return Err(ExtractError::Config(
                    "pagination step must not be zero".to_string(),
                ));
            }
        }

        validate_locator(&self.container, "container")?;
        validate_node(&self.item, "item")?;
        Ok(())
    }

    /// Output columns in schema order, first occurrence winning. Drives
    /// deterministic column ordering in rendered reports.
    pub fn column_order(&self) -> Vec<String> {
        let mut columns = Vec::new();
        collect_columns(&self.item, &mut columns);
        columns
    }
}

fn validate_locator(locator: &SearchLocator, context: &str) -> Result<()> {
    if locator.name.is_empty() {
        return Err(ExtractError::Config(format!(
            "{} locator has an empty name",
            context
        )));
    }
    Ok(())
}

fn validate_node(node: &SearchedElementNode, context: &str) -> Result<()> {
    validate_locator(&node.locator, context)?;

    for descriptor in &node.info {
        if descriptor.target_column.is_empty() {
            return Err(ExtractError::Config(format!(
                "{} has a descriptor with an empty target_column",
                context
            )));
        }
        if descriptor.source == InfoSource::Attribute && descriptor.attribute_name.is_empty() {
            return Err(ExtractError::Config(format!(
                "descriptor for column '{}' reads an attribute but attribute_name is empty",
                descriptor.target_column
            )));
        }
    }

    for (idx, child) in node.children.iter().enumerate() {
        validate_node(child, &format!("{}.children[{}]", context, idx))?;
    }
    Ok(())
}

fn collect_columns(node: &SearchedElementNode, columns: &mut Vec<String>) {
    for descriptor in &node.info {
        if !columns.contains(&descriptor.target_column) {
            columns.push(descriptor.target_column.clone());
        }
    }
    for child in &node.children {
        collect_columns(child, columns);
    }
}
