//! Tree queries over parsed HTML, restricted to the capability set the
//! schema can express: first matching descendant at any depth, matching
//! direct children, trimmed text, attribute reads.
//!
//! Locator names are caller data, so matching walks the element tree
//! directly instead of going through CSS selector parsing.

use crate::schema::{SearchKind, SearchLocator};
use scraper::ElementRef;

fn matches(element: ElementRef, locator: &SearchLocator) -> bool {
    match locator.kind {
        SearchKind::ByTag => element.value().name() == locator.name,
        SearchKind::ById => element.value().id() == Some(locator.name.as_str()),
        SearchKind::ByClass => element.value().classes().any(|c| c == locator.name),
    }
}

/// First matching descendant of `parent` in document order, any depth.
/// The parent itself is never a candidate.
pub fn find_first<'a>(parent: ElementRef<'a>, locator: &SearchLocator) -> Option<ElementRef<'a>> {
    parent
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|el| matches(*el, locator))
}

/// Every matching *direct child* of `parent`, in document order. Matches at
/// depth two or deeper are excluded on purpose: a nested repeating
/// structure must not be flattened into the parent's own repetition.
pub fn find_direct_children<'a>(
    parent: ElementRef<'a>,
    locator: &SearchLocator,
) -> Vec<ElementRef<'a>> {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| matches(*el, locator))
        .collect()
}

/// The element's text content, descendants included. Text nodes are joined
/// with single spaces and the result is trimmed, so words never concatenate
/// across element boundaries.
pub fn inner_text(element: ElementRef) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// A named attribute's value, `""` when absent. `class` is multi-valued and
/// its values are joined with `", "`.
pub fn attribute_value(element: ElementRef, name: &str) -> String {
    if name == "class" {
        return element.value().classes().collect::<Vec<_>>().join(", ");
    }
    element.value().attr(name).unwrap_or_default().to_string()
}
