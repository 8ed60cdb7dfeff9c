//! End-to-end tests: layout markup -> word file -> abstract redaction.
//!
//! Uses a MockSource that returns canned markup without invoking
//! pdftotext, so these tests run without poppler-utils.

use abscrub_core::abstracts::parse_records;
use abscrub_core::config::{ExtractConfig, RedactConfig};
use abscrub_core::error::AbscrubError;
use abscrub_core::extraction::{extract_pdf, LayoutSource};
use abscrub_core::model::AbstractCandidate;
use abscrub_core::outcome::{read_id_list, ImageOutcome, OutcomeLogs, RedactionOutcome};
use abscrub_core::wordfile;
use abscrub_core::{extract_document, process_document, redact_document, DocumentPaths};
use image::{Rgb, RgbImage};
use std::path::Path;

struct MockSource {
    markup: &'static str,
}

impl LayoutSource for MockSource {
    fn layout_markup(&self, _pdf_bytes: &[u8]) -> Result<Vec<u8>, AbscrubError> {
        Ok(self.markup.as_bytes().to_vec())
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}

const TWO_PAGES: &str = r#"<!DOCTYPE html>
<html><head><title>x</title></head><body><doc>
  <page width="600.000000" height="800.000000">
    <word xMin="-12.5" yMin="10.0" xMax="40.2" yMax="22.0">Hello</word>
    <word xMin="590.0" yMin="790.0" xMax="640.0" yMax="812.0">World</word>
  </page>
  <page width="600.000000" height="800.000000">
    <word xMin="50.0" yMin="100.0" xMax="110.0" yMax="112.0">Abstract</word>
    <word xMin="115.0" yMin="100.0" xMax="140.0" yMax="112.0">text</word>
    <word xMin="145.0" yMin="100.0" xMax="170.0" yMax="112.0">here</word>
  </page>
</doc></body></html>"#;

fn candidate(text: &str) -> AbstractCandidate {
    AbstractCandidate {
        language_tag: "en".into(),
        text: text.into(),
    }
}

fn paths(dir: &Path, id: &str) -> DocumentPaths {
    DocumentPaths {
        word_file: dir.join("in").join(format!("{}.txt", id)),
        output_word_file: dir.join("out").join(format!("{}.txt", id)),
        images: None,
    }
}

fn setup(dir: &Path, id: &str, content: &str) -> DocumentPaths {
    std::fs::create_dir_all(dir.join("in")).unwrap();
    std::fs::create_dir_all(dir.join("out")).unwrap();
    let p = paths(dir, id);
    std::fs::write(&p.word_file, content).unwrap();
    p
}

fn two_page_word_file() -> String {
    let doc = extract_pdf(&[], &MockSource { markup: TWO_PAGES }, &ExtractConfig::default())
        .unwrap()
        .unwrap();
    let mut out = Vec::new();
    wordfile::write_document(&doc, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

// ---------------------------------------------------------------------------
// Extraction clamps boxes and serializes one line per word
// ---------------------------------------------------------------------------
#[test]
fn extraction_clamps_and_serializes() {
    let doc = extract_pdf(&[], &MockSource { markup: TWO_PAGES }, &ExtractConfig::default())
        .unwrap()
        .unwrap();

    assert_eq!(doc.page_count(), 2);
    for page in &doc.pages {
        for w in &page.words {
            assert!(w.bbox.x_min <= w.bbox.x_max && w.bbox.x_max <= page.width);
            assert!(w.bbox.y_min <= w.bbox.y_max && w.bbox.y_max <= page.height);
        }
    }
    let hello = &doc.pages[0].words[0];
    assert_eq!(hello.bbox.x_min, 0);
    let world = &doc.pages[0].words[1];
    assert_eq!((world.bbox.x_max, world.bbox.y_max), (600, 800));

    let text = two_page_word_file();
    assert_eq!(text.lines().count(), 5);
    assert_eq!(text.lines().last().unwrap(), "here\t145\t100\t170\t112\t600\t800\t2");
}

// ---------------------------------------------------------------------------
// Redacting the second page's abstract leaves the first page's two lines
// ---------------------------------------------------------------------------
#[test]
fn redaction_removes_abstract_lines() {
    let dir = tempfile::tempdir().unwrap();
    let input = two_page_word_file();
    let p = setup(dir.path(), "doc", &input);

    let outcome = redact_document(
        "doc",
        &p,
        &[candidate("Abstract text here")],
        &RedactConfig::default(),
    )
    .unwrap();

    match outcome {
        RedactionOutcome::Redacted {
            spans,
            removed_lines,
            image,
        } => {
            assert_eq!(removed_lines, 3);
            assert_eq!((spans[0].start_word_idx, spans[0].end_word_idx), (2, 4));
            assert_eq!(image, ImageOutcome::NotRequested);
        }
        other => panic!("unexpected {:?}", other),
    }

    let out = std::fs::read_to_string(&p.output_word_file).unwrap();
    let expected: String = input.lines().take(2).map(|l| format!("{}\n", l)).collect();
    assert_eq!(out, expected);
}

#[test]
fn redaction_in_place_keeps_remaining_lines() {
    let dir = tempfile::tempdir().unwrap();
    let input = two_page_word_file();
    let mut p = setup(dir.path(), "doc", &input);
    p.output_word_file = p.word_file.clone();

    let outcome = redact_document(
        "doc",
        &p,
        &[candidate("Abstract text here")],
        &RedactConfig::default(),
    )
    .unwrap();

    assert!(matches!(
        outcome,
        RedactionOutcome::Redacted {
            removed_lines: 3,
            ..
        }
    ));
    let out = std::fs::read_to_string(&p.word_file).unwrap();
    assert_eq!(out.lines().count(), 2);
    assert_eq!(out.lines().next(), input.lines().next());
}

// ---------------------------------------------------------------------------
// A document with an unlocatable abstract is copied byte for byte
// ---------------------------------------------------------------------------
#[test]
fn not_found_copies_verbatim_and_logs_failure() {
    let dir = tempfile::tempdir().unwrap();
    let input = two_page_word_file();
    let p = setup(dir.path(), "doc", &input);
    let logs = OutcomeLogs::open(&dir.path().join("found.txt"), &dir.path().join("failed.txt")).unwrap();

    let records = parse_records(
        r#"{"id": "doc", "abstract": "A completely unrelated paragraph about something else entirely"}"#
            .as_bytes(),
    )
    .unwrap();
    let outcome = process_document("doc", records.first(), &p, &RedactConfig::default(), Some(&logs));

    assert!(matches!(outcome, RedactionOutcome::NotFound { .. }));
    assert_eq!(std::fs::read_to_string(&p.output_word_file).unwrap(), input);
    assert!(read_id_list(&dir.path().join("failed.txt")).unwrap().contains("doc"));
    assert!(read_id_list(&dir.path().join("found.txt")).unwrap().is_empty());
}

#[test]
fn missing_record_copies_without_logging() {
    let dir = tempfile::tempdir().unwrap();
    let p = setup(dir.path(), "doc", "a\t0\t0\t1\t1\t10\t10\t1\n");
    let logs = OutcomeLogs::open(&dir.path().join("found.txt"), &dir.path().join("failed.txt")).unwrap();

    let outcome = process_document("doc", None, &p, &RedactConfig::default(), Some(&logs));

    assert_eq!(outcome, RedactionOutcome::NoRecord);
    assert!(p.output_word_file.is_file());
    assert!(read_id_list(&dir.path().join("failed.txt")).unwrap().is_empty());
}

#[test]
fn multilingual_requires_every_abstract() {
    let dir = tempfile::tempdir().unwrap();
    let input = two_page_word_file();
    let p = setup(dir.path(), "doc", &input);
    let records = parse_records(
        r#"{"id": "doc", "abstract_en": "Abstract text here", "abstract_fr": "Un tout autre résumé qui ne figure nulle part dans ce document"}"#
            .as_bytes(),
    )
    .unwrap();
    let config = RedactConfig {
        main_lang: Some("en".into()),
        ..Default::default()
    };

    let outcome = process_document("doc", records.first(), &p, &config, None);

    assert_eq!(
        outcome,
        RedactionOutcome::NotFound {
            missing: vec!["fr".into()]
        }
    );
    assert_eq!(std::fs::read_to_string(&p.output_word_file).unwrap(), input);
}

#[test]
fn short_main_abstract_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let input = two_page_word_file();
    let p = setup(dir.path(), "doc", &input);
    let records = parse_records(r#"{"id": "doc", "abstract": "Abstract text here"}"#.as_bytes()).unwrap();
    let config = RedactConfig {
        min_abstract_words: 10,
        ..Default::default()
    };

    let outcome = process_document("doc", records.first(), &p, &config, None);

    assert!(matches!(outcome, RedactionOutcome::Skipped { .. }));
    assert_eq!(std::fs::read_to_string(&p.output_word_file).unwrap(), input);
}

// ---------------------------------------------------------------------------
// Image redaction paints over the located words on the page image
// ---------------------------------------------------------------------------
#[test]
fn image_archive_redacted_with_text() {
    let dir = tempfile::tempdir().unwrap();
    let mut p = setup(dir.path(), "doc", &two_page_word_file());

    // Page images at double resolution.
    let staging = dir.path().join("staging").join("doc");
    std::fs::create_dir_all(&staging).unwrap();
    for page in 1..=2 {
        RgbImage::from_pixel(1200, 1600, Rgb([255, 255, 255]))
            .save(staging.join(format!("doc-{}.png", page)))
            .unwrap();
    }
    let archive = dir.path().join("in").join("doc.tar.gz");
    {
        let file = std::fs::File::create(&archive).unwrap();
        let enc = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(enc);
        builder.append_dir_all("doc", &staging).unwrap();
        builder.into_inner().unwrap().finish().unwrap();
    }
    let out_archive = dir.path().join("out").join("doc.tar.gz");
    p.images = Some((archive, out_archive.clone()));

    let config = RedactConfig {
        redact_images: true,
        ..Default::default()
    };
    let outcome = redact_document("doc", &p, &[candidate("Abstract text here")], &config).unwrap();
    match outcome {
        RedactionOutcome::Redacted { image, .. } => {
            assert_eq!(image, ImageOutcome::Redacted { pages: 1 })
        }
        other => panic!("unexpected {:?}", other),
    }

    let unpacked = dir.path().join("check");
    let file = std::fs::File::open(&out_archive).unwrap();
    tar::Archive::new(flate2::read::GzDecoder::new(file))
        .unpack(&unpacked)
        .unwrap();
    let page2 = image::open(unpacked.join("doc").join("doc-2.png")).unwrap().to_rgb8();
    // "Abstract" box (50,100)-(110,112) scaled by 2.
    assert_eq!(page2.get_pixel(150, 210), &Rgb([0, 0, 0]));
    assert_eq!(page2.get_pixel(150, 300), &Rgb([255, 255, 255]));
    let page1 = image::open(unpacked.join("doc").join("doc-1.png")).unwrap().to_rgb8();
    assert_eq!(page1.get_pixel(150, 210), &Rgb([255, 255, 255]));
}

#[test]
fn image_failure_keeps_text_redaction() {
    let dir = tempfile::tempdir().unwrap();
    let mut p = setup(dir.path(), "doc", &two_page_word_file());
    p.images = Some((dir.path().join("missing.tar.gz"), dir.path().join("out.tar.gz")));
    let config = RedactConfig {
        redact_images: true,
        ..Default::default()
    };

    let outcome = redact_document("doc", &p, &[candidate("Abstract text here")], &config).unwrap();

    match outcome {
        RedactionOutcome::Redacted {
            removed_lines,
            image,
            ..
        } => {
            assert_eq!(removed_lines, 3);
            assert!(matches!(image, ImageOutcome::Failed { .. }));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn image_failure_logged_for_retry() {
    let dir = tempfile::tempdir().unwrap();
    let mut p = setup(dir.path(), "doc", &two_page_word_file());
    p.images = Some((dir.path().join("missing.tar.gz"), dir.path().join("out.tar.gz")));
    let logs = OutcomeLogs::open(&dir.path().join("found.txt"), &dir.path().join("failed.txt")).unwrap();
    let records = parse_records(r#"{"id": "doc", "abstract": "Abstract text here"}"#.as_bytes()).unwrap();
    let config = RedactConfig {
        redact_images: true,
        min_abstract_words: 1,
        ..Default::default()
    };

    let outcome = process_document("doc", records.first(), &p, &config, Some(&logs));

    assert!(matches!(
        outcome,
        RedactionOutcome::Redacted {
            image: ImageOutcome::Failed { .. },
            ..
        }
    ));
    assert_eq!(std::fs::read_to_string(&p.output_word_file).unwrap().lines().count(), 2);
    assert!(!dir.path().join("out.tar.gz").exists());
    assert!(read_id_list(&dir.path().join("failed.txt")).unwrap().contains("doc"));
    assert!(read_id_list(&dir.path().join("found.txt")).unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Markup files on disk go through the same pipeline with outcome logs
// ---------------------------------------------------------------------------
#[test]
fn extract_document_writes_word_file_and_logs() {
    let dir = tempfile::tempdir().unwrap();
    let markup = dir.path().join("doc.html");
    std::fs::write(&markup, TWO_PAGES).unwrap();
    let empty = dir.path().join("scan.html");
    std::fs::write(&empty, r#"<doc><page width="600" height="800"></page></doc>"#).unwrap();
    let logs = OutcomeLogs::open(&dir.path().join("parsed.txt"), &dir.path().join("not_parsed.txt")).unwrap();

    let out = dir.path().join("doc.txt");
    let parsed = extract_document("doc", &markup, &out, &ExtractConfig::default(), Some(&logs));
    assert!(parsed.is_success());
    assert_eq!(std::fs::read_to_string(&out).unwrap().lines().count(), 5);

    let scan_out = dir.path().join("scan.txt");
    let scan = extract_document("scan", &empty, &scan_out, &ExtractConfig::default(), Some(&logs));
    assert!(!scan.is_success());
    assert!(!scan_out.exists());

    assert!(read_id_list(&dir.path().join("parsed.txt")).unwrap().contains("doc"));
    assert!(read_id_list(&dir.path().join("not_parsed.txt")).unwrap().contains("scan"));
}
