//! The recursive schema walk: one matched element plus one schema node in,
//! one flat record out.

use crate::dom;
use crate::result::Record;
use crate::schema::{InfoDescriptor, InfoSource, SearchedElementNode};
use scraper::ElementRef;

/// One scalar field value off a matched element. Never fails: an absent
/// text or attribute read yields an empty string.
pub fn extract_field(element: ElementRef, descriptor: &InfoDescriptor) -> String {
    match descriptor.source {
        InfoSource::InnerText => dom::inner_text(element),
        InfoSource::Attribute => dom::attribute_value(element, &descriptor.attribute_name),
    }
}

/// Apply a schema node to one matched element, producing a flat record.
///
/// Own descriptors write first, in schema order; then each child node is
/// resolved single-match against this element and its record merged in.
/// Later writers win on column collision, so the order here is load-bearing.
/// A child whose locator matches nothing is skipped - optional
/// sub-structure, not an error.
pub fn walk(element: ElementRef, node: &SearchedElementNode) -> Record {
    let mut record = Record::new();

    for descriptor in &node.info {
        record.insert(
            descriptor.target_column.clone(),
            extract_field(element, descriptor),
        );
    }

    for child in &node.children {
        let Some(child_element) = dom::find_first(element, &child.locator) else {
            continue;
        };
        for (column, value) in walk(child_element, child) {
            record.insert(column, value);
        }
    }

    record
}
