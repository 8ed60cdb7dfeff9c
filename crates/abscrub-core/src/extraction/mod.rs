pub mod layout;
pub mod pdftotext;
pub mod references;

use crate::config::ExtractConfig;
use crate::error::AbscrubError;
use crate::model::{Document, Page};
use layout::PageStream;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Trait for backends that turn a PDF into positional word markup.
pub trait LayoutSource: Send + Sync {
    /// Produce `<page>`/`<word>` markup with bounding-box attributes.
    fn layout_markup(&self, pdf_bytes: &[u8]) -> Result<Vec<u8>, AbscrubError>;

    /// Name of this backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Parse positional markup into a [`Document`].
///
/// Returns `Ok(None)` when no page carries text after the boilerplate and
/// reference-section passes, which marks a scanned or empty source.
pub fn parse_layout<R: BufRead>(
    input: R,
    config: &ExtractConfig,
) -> Result<Option<Document>, AbscrubError> {
    let mut doc = Document::default();
    for page in PageStream::new(input) {
        let mut page = page?;
        if config.normalize_bbox {
            normalize_page(&mut page);
        }
        doc.pages.push(page);
    }

    if doc
        .pages
        .first()
        .is_some_and(|p| is_boilerplate_page(p, &config.boilerplate_markers))
    {
        log::debug!("dropping repository cover page");
        doc.pages.remove(0);
    }

    if config.remove_references {
        if let Some(at) = references::locate_reference_heading(&doc, config.language.as_deref()) {
            log::debug!(
                "truncating at reference heading on page {}, word {}",
                at.page_idx + 1,
                at.word_idx
            );
            references::truncate_at_heading(&mut doc, at);
        }
    }

    if !doc.has_text() {
        return Ok(None);
    }
    Ok(Some(doc))
}

/// Parse a markup file from disk, streaming it.
pub fn extract_markup_file(
    path: &Path,
    config: &ExtractConfig,
) -> Result<Option<Document>, AbscrubError> {
    let file = std::fs::File::open(path)?;
    parse_layout(BufReader::new(file), config)
}

/// Run a layout backend on PDF bytes and parse its output.
pub fn extract_pdf(
    pdf_bytes: &[u8],
    source: &dyn LayoutSource,
    config: &ExtractConfig,
) -> Result<Option<Document>, AbscrubError> {
    let markup = source.layout_markup(pdf_bytes)?;
    log::debug!("parsing layout from {}", source.backend_name());
    parse_layout(markup.as_slice(), config)
}

/// True when the page's text contains a known repository boilerplate phrase.
pub fn is_boilerplate_page(page: &Page, markers: &[String]) -> bool {
    let text = page.text();
    markers.iter().any(|m| text.contains(m.as_str()))
}

fn normalize_page(page: &mut Page) {
    for word in &mut page.words {
        word.bbox = word.bbox.normalized(word.page_width, word.page_height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COVER: &str = r#"<doc>
  <page width="600" height="800">
    <word xMin="1" yMin="1" xMax="2" yMax="2">HAL</word>
    <word xMin="3" yMin="1" xMax="4" yMax="2">is</word>
    <word xMin="5" yMin="1" xMax="6" yMax="2">a</word>
    <word xMin="7" yMin="1" xMax="8" yMax="2">multi-disciplinary</word>
    <word xMin="9" yMin="1" xMax="10" yMax="2">open</word>
    <word xMin="11" yMin="1" xMax="12" yMax="2">access</word>
    <word xMin="13" yMin="1" xMax="14" yMax="2">archive</word>
  </page>
  <page width="600" height="800">
    <word xMin="10" yMin="10" xMax="50" yMax="20">Content</word>
  </page>
</doc>"#;

    #[test]
    fn test_cover_page_dropped() {
        let doc = parse_layout(COVER.as_bytes(), &ExtractConfig::default())
            .unwrap()
            .unwrap();
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.pages[0].words[0].text, "Content");
    }

    #[test]
    fn test_cover_page_kept_without_markers() {
        let config = ExtractConfig {
            boilerplate_markers: vec![],
            ..Default::default()
        };
        let doc = parse_layout(COVER.as_bytes(), &config).unwrap().unwrap();
        assert_eq!(doc.page_count(), 2);
    }

    #[test]
    fn test_no_text_is_none() {
        let xml = r#"<doc><page width="600" height="800"></page></doc>"#;
        assert!(parse_layout(xml.as_bytes(), &ExtractConfig::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_only_cover_page_is_none() {
        let xml = COVER.replace("Content", " ");
        assert!(parse_layout(xml.as_bytes(), &ExtractConfig::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_normalize_bbox() {
        let xml = r#"<doc><page width="600" height="800">
            <word xMin="300" yMin="200" xMax="600" yMax="400">w</word>
        </page></doc>"#;
        let config = ExtractConfig {
            normalize_bbox: true,
            ..Default::default()
        };
        let doc = parse_layout(xml.as_bytes(), &config).unwrap().unwrap();
        let b = doc.pages[0].words[0].bbox;
        assert_eq!((b.x_min, b.y_min, b.x_max, b.y_max), (500, 250, 1000, 500));
        assert_eq!(doc.pages[0].words[0].page_width, 600);
    }

    #[test]
    fn test_reference_truncation() {
        let xml = r#"<doc>
  <page width="600" height="800">
    <word xMin="10" yMin="10" xMax="50" yMax="20">Body</word>
  </page>
  <page width="600" height="800">
    <word xMin="10" yMin="10" xMax="50" yMax="20">More</word>
    <word xMin="10" yMin="40" xMax="90" yMax="50">References</word>
    <word xMin="10" yMin="60" xMax="50" yMax="70">Smith</word>
  </page>
  <page width="600" height="800">
    <word xMin="10" yMin="10" xMax="50" yMax="20">Jones</word>
  </page>
</doc>"#;
        let config = ExtractConfig {
            remove_references: true,
            language: Some("en".into()),
            ..Default::default()
        };
        let doc = parse_layout(xml.as_bytes(), &config).unwrap().unwrap();
        assert_eq!(doc.page_count(), 2);
        let last: Vec<_> = doc.pages[1].words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(last, vec!["More"]);
    }
}
