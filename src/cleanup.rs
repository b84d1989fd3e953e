//! Removal of stray date stamps lying inside pictures.
//!
//! Scanned charts and photos often carry a printed date that the layout
//! model extracts as a free text item. Such items duplicate nothing useful
//! and break the reading flow, so they are dropped when they sit inside a
//! picture region on the same page.

use crate::geometry::{overlap_ratio, BBox};
use crate::model::{DocItem, DocumentModel};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeSet, HashMap};

lazy_static! {
    static ref DATE_ONLY: Regex = Regex::new(r"^\d{2}[./-]\d{2}[./-]\d{4}$").unwrap();
}

/// Whether the trimmed text is nothing but a `dd.mm.yyyy` style date.
pub fn is_date_only(text: &str) -> bool {
    DATE_ONLY.is_match(text.trim())
}

/// Normalize to top-left, keeping the box as-is when the page is unknown.
fn top_left(doc: &DocumentModel, bbox: &BBox, page_no: u32) -> BBox {
    doc.top_left_bbox(bbox, page_no).unwrap_or(*bbox)
}

/// Indices of date-only text items lying inside a picture.
///
/// # Arguments
///
/// * `doc` - The document model
/// * `overlap` - Minimum share of the text item's area covered by a picture
///   on the same page
///
/// # Returns
///
/// Item indices suitable for [`DocumentModel::remove_items`].
pub fn date_only_text_in_pictures(doc: &DocumentModel, overlap: f32) -> BTreeSet<usize> {
    let mut pictures: HashMap<u32, Vec<BBox>> = HashMap::new();
    for (_, picture) in doc.pictures() {
        if let (Some(page), Some(bbox)) = (picture.page_no, picture.bbox.as_ref()) {
            pictures.entry(page).or_default().push(top_left(doc, bbox, page));
        }
    }
    if pictures.is_empty() {
        return BTreeSet::new();
    }

    let mut found = BTreeSet::new();
    for (idx, item) in doc.items.iter().enumerate() {
        let DocItem::Text(text) = item else {
            continue;
        };
        if !is_date_only(&text.text) {
            continue;
        }
        let (Some(page), Some(bbox)) = (text.page_no, text.bbox.as_ref()) else {
            continue;
        };
        let Some(regions) = pictures.get(&page) else {
            continue;
        };
        let bbox = top_left(doc, bbox, page);
        if regions.iter().any(|region| overlap_ratio(&bbox, region) >= overlap) {
            log::debug!("Date {:?} inside picture on page {}", text.text, page);
            found.insert(idx);
        }
    }
    found
}

/// Drop date-only text items lying inside pictures.
///
/// Returns the number of items removed.
pub fn remove_date_only_text_in_pictures(doc: &mut DocumentModel, overlap: f32) -> usize {
    let indices = date_only_text_in_pictures(doc, overlap);
    let removed = doc.remove_items(&indices);
    if removed > 0 {
        log::info!("Removed {} date-only text items inside pictures", removed);
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::CoordOrigin;
    use crate::model::{ItemLabel, Picture, TextItem};

    fn text(value: &str, page: u32, bbox: BBox) -> DocItem {
        DocItem::Text(TextItem {
            label: ItemLabel::Text,
            text: value.to_string(),
            page_no: Some(page),
            bbox: Some(bbox),
        })
    }

    fn picture(page: u32, bbox: BBox) -> DocItem {
        DocItem::Picture(Picture {
            page_no: Some(page),
            bbox: Some(bbox),
        })
    }

    #[test]
    fn test_is_date_only() {
        assert!(is_date_only(" 31.12.2024 "));
        assert!(is_date_only("01/02/2023"));
        assert!(!is_date_only("1.2.2023"));
        assert!(!is_date_only("La 31.12.2024"));
    }

    #[test]
    fn test_date_inside_picture_found() {
        let mut doc = DocumentModel::new();
        doc.add_page(1, 600.0, 800.0);
        doc.push(picture(1, BBox::new(100.0, 100.0, 400.0, 400.0)));
        doc.push(text("31.12.2024", 1, BBox::new(150.0, 150.0, 220.0, 165.0)));
        doc.push(text("31.12.2024", 1, BBox::new(450.0, 150.0, 520.0, 165.0)));
        doc.push(text("Grafic venituri", 1, BBox::new(150.0, 200.0, 260.0, 215.0)));
        doc.push(text("31.12.2024", 2, BBox::new(150.0, 150.0, 220.0, 165.0)));

        let found = date_only_text_in_pictures(&doc, 0.6);
        assert_eq!(found, BTreeSet::from([1]));
    }

    #[test]
    fn test_mixed_origins_are_normalized() {
        let mut doc = DocumentModel::new();
        doc.add_page(1, 600.0, 800.0);
        doc.push(picture(1, BBox::new(100.0, 100.0, 400.0, 400.0)));
        // top-left (150, 150)-(220, 165) expressed bottom-left
        doc.push(text(
            "05.06.2023",
            1,
            BBox::with_origin(150.0, 650.0, 220.0, 635.0, CoordOrigin::BottomLeft),
        ));
        assert_eq!(date_only_text_in_pictures(&doc, 0.6), BTreeSet::from([1]));
    }

    #[test]
    fn test_partial_overlap_below_threshold() {
        let mut doc = DocumentModel::new();
        doc.add_page(1, 600.0, 800.0);
        doc.push(picture(1, BBox::new(100.0, 100.0, 400.0, 400.0)));
        doc.push(text("31.12.2024", 1, BBox::new(380.0, 150.0, 440.0, 165.0)));
        assert!(date_only_text_in_pictures(&doc, 0.6).is_empty());
    }

    #[test]
    fn test_remove_items() {
        let mut doc = DocumentModel::new();
        doc.add_page(1, 600.0, 800.0);
        doc.push(picture(1, BBox::new(0.0, 0.0, 600.0, 400.0)));
        doc.push(text("31.12.2024", 1, BBox::new(10.0, 10.0, 80.0, 25.0)));
        doc.push(text("30.06.2024", 1, BBox::new(10.0, 30.0, 80.0, 45.0)));
        assert_eq!(remove_date_only_text_in_pictures(&mut doc, 0.6), 2);
        assert_eq!(doc.items.len(), 1);
    }
}
