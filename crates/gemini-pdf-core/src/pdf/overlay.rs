//! Page painting for translated text.
//!
//! # Coordinate System
//!
//! PDF content streams use a **bottom-left origin** where Y increases
//! upward, while the text extractor reports boxes in a **top-left origin**
//! where Y increases downward. The conversion is:
//! ```text
//! pdf_y = page_height - extraction_y
//! ```
//!
//! # Painting Strategy
//!
//! One content stream is appended per page, in two phases:
//! 1. An opaque white fill over every accepted block, matching the page
//!    background.
//! 2. The translated text, word-wrapped to each block's rectangle at the
//!    fixed font size.
//!
//! A block whose text cannot be laid out inside its rectangle (or encoded
//! by the active font) keeps the fill but gets no text: the block is left
//! blank and counted in [`PagePaintStats`], never an error.

use std::fmt::Write as _;

use lopdf::{Document, Object, ObjectId, Stream};
use tracing::debug;

use crate::error::{Error, Result};
use super::font::{self, FONT_RESOURCE, OverlayFont};
use super::page_index::PageIndex;
use super::text::BoundingBox;

/// Line height as a multiple of font size.
const LINE_HEIGHT_FACTOR: f32 = 1.2;

/// Slack allowed when checking that wrapped text fits the block height
/// (in points).
const FIT_SLACK: f32 = 1.0;

/// A redact-and-replace patch for one text block.
#[derive(Debug, Clone)]
pub struct TranslationPatch {
    /// Rectangle of the original block, in extraction coordinates
    pub bbox: BoundingBox,
    /// Translated text to render inside the rectangle
    pub text: String,
}

/// Per-page painting tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PagePaintStats {
    /// Blocks with translated text rendered into their rectangle
    pub painted: usize,
    /// Blocks whose rectangle was filled but whose text could not be laid
    /// out, left blank
    pub blank: usize,
}

/// Pre-calculated text placement for one block.
struct LaidOutBlock {
    text_x: f32,
    first_baseline_y: f32,
    line_height: f32,
    /// Encoded Tj operands, delimiters included
    lines: Vec<String>,
}

/// Paints translation patches onto pages of a shared lopdf document.
///
/// The font object graph is created once per document, on the first page
/// that has something to paint; every painted page references it from its
/// own Resources.
pub struct OverlayPainter {
    font: OverlayFont,
    font_size: f32,
    font_id: Option<ObjectId>,
}

impl OverlayPainter {
    pub const fn new(font: OverlayFont, font_size: f32) -> Self {
        Self {
            font,
            font_size,
            font_id: None,
        }
    }

    /// Apply patches to one page: fill every patch rectangle, then render
    /// the text of those patches that fit.
    pub fn paint_page(
        &mut self,
        doc: &mut Document,
        page_num: usize,
        patches: &[TranslationPatch],
    ) -> Result<PagePaintStats> {
        let mut stats = PagePaintStats::default();
        if patches.is_empty() {
            return Ok(stats);
        }

        let pages = doc.get_pages();
        let page_index = PageIndex::try_from_page_num(page_num, pages.len())?;
        let page_id = *pages
            .get(&page_index.as_lopdf_page_number())
            .ok_or(Error::PdfInvalidPage {
                page: page_num,
                total: pages.len(),
            })?;

        let media_box = get_media_box(doc, page_id)?;
        let page_height = media_box[3] - media_box[1];

        let font_id = match self.font_id {
            Some(id) => id,
            None => {
                let id = self.font.add_to_document(doc);
                self.font_id = Some(id);
                id
            }
        };
        font::attach_to_page(doc, page_id, font_id)?;

        let mut laid_out = Vec::with_capacity(patches.len());
        for patch in patches {
            match self.layout_block(patch, page_height) {
                Some(block) => {
                    laid_out.push(block);
                    stats.painted += 1;
                }
                None => {
                    debug!("Block left blank: text does not fit its rectangle");
                    stats.blank += 1;
                }
            }
        }

        let content = self.page_content(patches, &laid_out, page_height);
        append_content_to_page(doc, page_id, &content).map_err(|e| match e {
            Error::Lopdf(reason) => Error::PdfPaint {
                page: page_num,
                reason,
            },
            other => other,
        })?;

        Ok(stats)
    }

    /// Word-wrap and place a patch's text inside its rectangle.
    ///
    /// Returns `None` when the text cannot be rendered there: a word wider
    /// than the rectangle, more wrapped lines than the height holds, or
    /// characters the active font cannot encode.
    fn layout_block(&self, patch: &TranslationPatch, page_height: f32) -> Option<LaidOutBlock> {
        let bbox = patch.bbox;
        if bbox.width() <= 0.0 || bbox.height() <= 0.0 {
            return None;
        }

        let lines = self.wrap_to_width(&patch.text, bbox.width())?;

        let line_height = self.font_size * LINE_HEIGHT_FACTOR;
        #[allow(clippy::cast_precision_loss)]
        let text_height = lines.len() as f32 * line_height;
        if text_height > bbox.height() + FIT_SLACK {
            return None;
        }

        let encoded = lines
            .iter()
            .map(|line| self.font.encode_line(line))
            .collect::<Option<Vec<_>>>()?;

        Some(LaidOutBlock {
            text_x: bbox.x0,
            first_baseline_y: page_height - bbox.y0 - self.font_size,
            line_height,
            lines: encoded,
        })
    }

    /// Greedy word wrap against measured line widths.
    fn wrap_to_width(&self, text: &str, max_width: f32) -> Option<Vec<String>> {
        let mut lines = Vec::new();
        let mut current = String::new();

        for word in text.split_whitespace() {
            if self.font.line_width(word, self.font_size) > max_width {
                return None;
            }

            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };

            if self.font.line_width(&candidate, self.font_size) <= max_width {
                current = candidate;
            } else {
                lines.push(current);
                current = word.to_string();
            }
        }

        if !current.is_empty() {
            lines.push(current);
        }

        if lines.is_empty() {
            return None;
        }
        Some(lines)
    }

    /// Build the page's overlay content stream.
    fn page_content(
        &self,
        patches: &[TranslationPatch],
        laid_out: &[LaidOutBlock],
        page_height: f32,
    ) -> String {
        let mut content = String::new();

        // Save graphics state
        content.push_str("q\n");

        // PHASE 1: fill every block rectangle, blanked blocks included
        content.push_str("1 1 1 rg\n");
        for patch in patches {
            let _ = writeln!(
                content,
                "{} {} {} {} re f",
                patch.bbox.x0,
                page_height - patch.bbox.y1,
                patch.bbox.width(),
                patch.bbox.height()
            );
        }

        // PHASE 2: translated text on top
        content.push_str("0 0 0 rg\n");
        // Reset text rendering mode to fill (0) - OCR layers use invisible mode (3)
        content.push_str("0 Tr\n");

        for block in laid_out {
            for (j, line) in block.lines.iter().enumerate() {
                #[allow(clippy::cast_precision_loss)]
                let y = block.first_baseline_y - (j as f32 * block.line_height);

                content.push_str("BT\n");
                let _ = writeln!(content, "/{FONT_RESOURCE} {} Tf", self.font_size);
                let _ = writeln!(content, "{} {} Td", block.text_x, y);
                let _ = writeln!(content, "{line} Tj");
                content.push_str("ET\n");
            }
        }

        // Restore graphics state
        content.push_str("Q\n");

        content
    }
}

/// Append a content stream to a page, preserving existing streams.
fn append_content_to_page(doc: &mut Document, page_id: ObjectId, content: &str) -> Result<()> {
    let content_stream = Stream::new(lopdf::Dictionary::new(), content.as_bytes().to_vec());
    let content_id = doc.add_object(Object::Stream(content_stream));

    let page = doc
        .get_object_mut(page_id)
        .map_err(|e| Error::Lopdf(format!("Failed to get page: {e}")))?;

    if let Object::Dictionary(dict) = page {
        let existing_contents = dict.get(b"Contents").ok().cloned();

        match existing_contents {
            Some(Object::Reference(existing_id)) => {
                let contents_array = Object::Array(vec![
                    Object::Reference(existing_id),
                    Object::Reference(content_id),
                ]);
                dict.set("Contents", contents_array);
            }
            Some(Object::Array(mut arr)) => {
                arr.push(Object::Reference(content_id));
                dict.set("Contents", Object::Array(arr));
            }
            _ => {
                dict.set("Contents", Object::Reference(content_id));
            }
        }
    }

    Ok(())
}

/// Get the media box for a page, walking up the Pages tree when inherited.
fn get_media_box(doc: &Document, page_id: ObjectId) -> Result<[f32; 4]> {
    let page_obj = doc
        .get_object(page_id)
        .map_err(|e| Error::Lopdf(format!("Failed to get page object: {e}")))?;
    Ok(media_box_of(doc, page_obj))
}

fn media_box_of(doc: &Document, obj: &Object) -> [f32; 4] {
    if let Object::Dictionary(dict) = obj {
        if let Ok(Object::Array(arr)) = dict.get(b"MediaBox")
            && arr.len() == 4
        {
            let values: Vec<f32> = arr
                .iter()
                .filter_map(|o| match o {
                    #[allow(clippy::cast_precision_loss)]
                    Object::Integer(i) => Some(*i as f32),
                    Object::Real(r) => Some(*r),
                    _ => None,
                })
                .collect();

            if values.len() == 4 {
                return [values[0], values[1], values[2], values[3]];
            }
        }

        if let Ok(Object::Reference(parent_id)) = dict.get(b"Parent")
            && let Ok(parent) = doc.get_object(*parent_id)
        {
            return media_box_of(doc, parent);
        }
    }

    // Default to US Letter size
    [0.0, 0.0, 612.0, 792.0]
}
