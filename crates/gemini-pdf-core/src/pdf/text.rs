use mupdf::TextPageOptions;

use crate::error::{Error, Result};
use super::document::PdfDocument;
use super::page_index::PageIndex;

/// A text block extracted from a PDF page with bounding geometry
#[derive(Debug, Clone)]
pub struct TextBlock {
    /// The text content, lines joined into one paragraph
    pub text: String,
    /// Bounding box in extraction coordinates (top-left origin)
    pub bbox: BoundingBox,
}

/// Bounding box: (x0, y0, x1, y1), top-left origin, y grows downward
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BoundingBox {
    pub const fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Smallest box containing both
    pub fn union(self, other: Self) -> Self {
        Self {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Create from a mupdf Quad (4 points defining a quadrilateral)
    pub const fn from_quad(quad: &mupdf::Quad) -> Self {
        let x0 = quad.ul.x.min(quad.ur.x).min(quad.ll.x).min(quad.lr.x);
        let y0 = quad.ul.y.min(quad.ur.y).min(quad.ll.y).min(quad.lr.y);
        let x1 = quad.ul.x.max(quad.ur.x).max(quad.ll.x).max(quad.lr.x);
        let y1 = quad.ul.y.max(quad.ur.y).max(quad.ll.y).max(quad.lr.y);
        Self { x0, y0, x1, y1 }
    }
}

/// Text extraction from PDF pages.
///
/// Only blocks with empty text are dropped here; the minimum-length noise
/// threshold is applied by the pipeline so that filtering is a dispatch
/// decision, not an extraction one.
pub struct TextExtractor<'a> {
    doc: &'a PdfDocument,
}

impl<'a> TextExtractor<'a> {
    pub const fn new(doc: &'a PdfDocument) -> Self {
        Self { doc }
    }

    /// Extract text blocks from a page as (rectangle, text) pairs.
    ///
    /// Each mupdf block represents a paragraph; its lines are joined with
    /// spaces, except where a line ends with a hyphen, which joins the split
    /// word directly.
    pub fn extract_page_blocks(&self, page_num: usize) -> Result<Vec<TextBlock>> {
        let page_index = PageIndex::try_from_page_num(page_num, self.doc.page_count())?;

        let doc = self.doc.open_document()?;
        let page = doc
            .load_page(page_index.into())
            .map_err(|e| Error::PdfTextExtraction {
                page: page_num,
                reason: format!("Failed to load page: {e}"),
            })?;

        let text_page = page
            .to_text_page(TextPageOptions::empty())
            .map_err(|e| Error::PdfTextExtraction {
                page: page_num,
                reason: format!("Failed to get text page: {e}"),
            })?;

        let mut blocks = Vec::new();

        for block in text_page.blocks() {
            let mut block_text = String::new();
            let mut block_bbox: Option<BoundingBox> = None;

            for line in block.lines() {
                let mut line_text = String::new();

                for text_char in line.chars() {
                    if let Some(c) = text_char.char() {
                        line_text.push(c);
                    }

                    let char_bbox = BoundingBox::from_quad(&text_char.quad());
                    block_bbox = Some(block_bbox.map_or(char_bbox, |bbox| bbox.union(char_bbox)));
                }

                let line_trimmed = line_text.trim();
                if line_trimmed.is_empty() {
                    continue;
                }

                // Join lines: a trailing hyphen marks a word split across lines
                if block_text.ends_with('-') {
                    block_text.pop();
                } else if !block_text.is_empty() {
                    block_text.push(' ');
                }
                block_text.push_str(line_trimmed);
            }

            let text = block_text.trim().to_string();
            if text.is_empty() {
                continue;
            }

            if let Some(bbox) = block_bbox {
                blocks.push(TextBlock { text, bbox });
            }
        }

        Ok(blocks)
    }
}
