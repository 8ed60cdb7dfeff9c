//! Painting located words over rendered page images.
//!
//! A document's images live in a gzip-compressed tar archive laid out as
//! `<doc_id>/<doc_id>-<page>.<ext>`. The archive is unpacked into a scratch
//! directory, the affected pages are painted, and the archive is rebuilt.

use super::LocatedAbstract;
use crate::error::AbscrubError;
use crate::model::BBox;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Boxes to paint on one page, in word file coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRedaction {
    pub page_number: usize,
    pub page_width: u32,
    pub page_height: u32,
    pub boxes: Vec<BBox>,
}

/// Group the boxes of every located abstract by page.
pub fn page_redactions(located: &[LocatedAbstract]) -> Vec<PageRedaction> {
    let mut pages: BTreeMap<usize, PageRedaction> = BTreeMap::new();
    for found in located {
        for row in found.span_rows() {
            pages
                .entry(found.span.page_number)
                .or_insert_with(|| PageRedaction {
                    page_number: found.span.page_number,
                    page_width: row.page_width,
                    page_height: row.page_height,
                    boxes: Vec::new(),
                })
                .boxes
                .push(row.bbox);
        }
    }
    pages.into_values().collect()
}

/// Paint boxes onto a page image, scaling from page to pixel coordinates.
///
/// Boxes must be in page units, so word files written with normalized boxes
/// cannot drive image redaction. Box edges are inclusive. Boxes falling
/// outside the image are clipped.
pub fn paint_boxes(img: &mut RgbImage, page: &PageRedaction, fill: Rgb<u8>) {
    if page.page_width == 0 || page.page_height == 0 {
        log::warn!("page {} has zero size, nothing painted", page.page_number);
        return;
    }
    let (img_w, img_h) = img.dimensions();
    let sx = img_w as f64 / page.page_width as f64;
    let sy = img_h as f64 / page.page_height as f64;

    for b in &page.boxes {
        let x0 = (b.x_min as f64 * sx).floor() as u32;
        let y0 = (b.y_min as f64 * sy).floor() as u32;
        let x1 = ((b.x_max as f64 * sx).floor() as u32).min(img_w.saturating_sub(1));
        let y1 = ((b.y_max as f64 * sy).floor() as u32).min(img_h.saturating_sub(1));
        if x0 > x1 || y0 > y1 {
            continue;
        }
        let rect = Rect::at(x0 as i32, y0 as i32).of_size(x1 - x0 + 1, y1 - y0 + 1);
        draw_filled_rect_mut(img, rect, fill);
    }
}

/// Redact page images of one document, writing the rebuilt archive to `output`.
///
/// `output` may equal `input`.
pub fn redact_archive(
    doc_id: &str,
    input: &Path,
    output: &Path,
    pages: &[PageRedaction],
    fill: [u8; 3],
) -> Result<(), AbscrubError> {
    let scratch = tempfile::tempdir()?;
    unpack_archive(input, scratch.path())?;

    let doc_dir = scratch.path().join(doc_id);
    for page in pages {
        let path = find_page_image(&doc_dir, doc_id, page.page_number)?;
        let mut img = image::open(&path)?.to_rgb8();
        paint_boxes(&mut img, page, Rgb(fill));
        img.save(&path)?;
        log::debug!(
            "painted {} boxes on {}",
            page.boxes.len(),
            path.display()
        );
    }

    pack_archive(&doc_dir, doc_id, output)
}

/// Path of a page image inside an unpacked document directory.
pub fn find_page_image(doc_dir: &Path, doc_id: &str, page: usize) -> Result<PathBuf, AbscrubError> {
    IMAGE_EXTENSIONS
        .iter()
        .map(|ext| doc_dir.join(format!("{}-{}.{}", doc_id, page, ext)))
        .find(|p| p.is_file())
        .ok_or_else(|| AbscrubError::PageImageMissing {
            doc_id: doc_id.to_string(),
            page,
        })
}

fn unpack_archive(archive: &Path, dest: &Path) -> Result<(), AbscrubError> {
    let file = File::open(archive)?;
    tar::Archive::new(GzDecoder::new(file))
        .unpack(dest)
        .map_err(|e| AbscrubError::Archive(format!("{}: {}", archive.display(), e)))
}

fn pack_archive(doc_dir: &Path, doc_id: &str, output: &Path) -> Result<(), AbscrubError> {
    let file = File::create(output)?;
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    builder
        .append_dir_all(doc_id, doc_dir)
        .map_err(|e| AbscrubError::Archive(format!("{}: {}", output.display(), e)))?;
    builder.into_inner()?.finish()?;
    Ok(())
}
