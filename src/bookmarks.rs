//! PDF outline entries for chapter headings, added with `lopdf` after rendering.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document, Object, ObjectId};
use thiserror::Error;

use crate::driver::HeadingPage;

/// Errors raised while embedding the outline into a rendered document.
#[derive(Debug, Error)]
pub enum OutlineError {
    #[error("failed to parse rendered PDF")]
    Parse(#[from] lopdf::Error),
    #[error("failed to serialize PDF with outline")]
    Save(#[from] std::io::Error),
    #[error("PDF catalog entry is missing or not a dictionary")]
    MissingCatalog,
    #[error("heading `{title}` refers to missing page {page}")]
    MissingPage { title: String, page: usize },
}

struct OutlineEntry {
    object_id: ObjectId,
    page_ref: ObjectId,
    title: String,
}

/// Adds a flat outline with one entry per level-1 heading, each targeting its start page.
pub fn apply_heading_bookmarks(
    pdf_bytes: &[u8],
    headings: &[HeadingPage],
) -> Result<Vec<u8>, OutlineError> {
    let chapters: Vec<&HeadingPage> = headings
        .iter()
        .filter(|heading| heading.level == 1)
        .collect();
    if chapters.is_empty() {
        return Ok(pdf_bytes.to_vec());
    }

    let mut document = Document::load_mem(pdf_bytes)?;
    let pages = document.get_pages();
    let entries = collect_entries(&mut document, &chapters, &pages)?;

    let outlines_id = document.new_object_id();
    link_entries(outlines_id, &mut document, &entries);
    insert_outlines_root(outlines_id, &mut document, &entries)?;

    let mut buffer = Vec::new();
    document.save_to(&mut buffer)?;
    Ok(buffer)
}

fn collect_entries(
    document: &mut Document,
    chapters: &[&HeadingPage],
    pages: &BTreeMap<u32, ObjectId>,
) -> Result<Vec<OutlineEntry>, OutlineError> {
    chapters
        .iter()
        .map(|heading| {
            let page_ref = u32::try_from(heading.page)
                .ok()
                .and_then(|page| pages.get(&page).copied())
                .ok_or_else(|| OutlineError::MissingPage {
                    title: heading.title.clone(),
                    page: heading.page,
                })?;
            Ok(OutlineEntry {
                object_id: document.new_object_id(),
                page_ref,
                title: heading.title.clone(),
            })
        })
        .collect()
}

fn link_entries(outlines_id: ObjectId, document: &mut Document, entries: &[OutlineEntry]) {
    for (index, entry) in entries.iter().enumerate() {
        let mut dictionary = Dictionary::new();
        dictionary.set("Title", Object::string_literal(entry.title.as_str()));
        dictionary.set(
            "Dest",
            Object::Array(vec![
                Object::Reference(entry.page_ref),
                Object::Name("Fit".into()),
            ]),
        );
        dictionary.set("Parent", Object::Reference(outlines_id));
        if let Some(previous) = index.checked_sub(1).map(|prev| &entries[prev]) {
            dictionary.set("Prev", Object::Reference(previous.object_id));
        }
        if let Some(next) = entries.get(index + 1) {
            dictionary.set("Next", Object::Reference(next.object_id));
        }
        document
            .objects
            .insert(entry.object_id, Object::Dictionary(dictionary));
    }
}

fn insert_outlines_root(
    outlines_id: ObjectId,
    document: &mut Document,
    entries: &[OutlineEntry],
) -> Result<(), OutlineError> {
    let catalog_id = document
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| OutlineError::MissingCatalog)?;

    let mut dictionary = Dictionary::new();
    dictionary.set("Type", Object::Name("Outlines".into()));
    dictionary.set("Count", Object::Integer(entries.len() as i64));
    if let (Some(first), Some(last)) = (entries.first(), entries.last()) {
        dictionary.set("First", Object::Reference(first.object_id));
        dictionary.set("Last", Object::Reference(last.object_id));
    }
    document
        .objects
        .insert(outlines_id, Object::Dictionary(dictionary));

    let catalog = document
        .objects
        .get_mut(&catalog_id)
        .and_then(|object| object.as_dict_mut().ok())
        .ok_or(OutlineError::MissingCatalog)?;
    catalog.set("Outlines", Object::Reference(outlines_id));
    catalog.set("PageMode", Object::Name("UseOutlines".into()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_without_chapters_are_returned_unchanged() {
        let headings = vec![HeadingPage {
            title: "Backgrounds".to_owned(),
            level: 2,
            page: 3,
        }];
        let bytes = b"%PDF-1.3 not parsed".to_vec();
        let output = apply_heading_bookmarks(&bytes, &headings).expect("no-op");
        assert_eq!(output, bytes);
    }
}
