use std::path::Path;
use std::sync::Arc;

use mupdf::Document as MuDocument;

use crate::error::{Error, Result};

/// Thread-safe wrapper around the input PDF.
///
/// The raw bytes are kept for the lifetime of a job: text extraction
/// re-opens them through mupdf, while the mutable output copy is loaded
/// once through lopdf via [`Self::load_editable`].
pub struct PdfDocument {
    bytes: Arc<Vec<u8>>,
    page_count: usize,
}

impl PdfDocument {
    /// Open a PDF from bytes
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();

        let doc = MuDocument::from_bytes(&bytes, "")
            .map_err(|e| Error::PdfOpen(format!("Failed to parse PDF: {e}")))?;

        let page_count = doc
            .page_count()
            .map_err(|e| Error::PdfOpen(format!("Failed to get page count: {e}")))?;

        Ok(Self {
            bytes: Arc::new(bytes),
            page_count: usize::try_from(page_count).unwrap_or(0),
        })
    }

    /// Open a PDF from a file path
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref()).map_err(|e| {
            Error::PdfOpen(format!(
                "Failed to read file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_bytes(bytes)
    }

    /// Get number of pages
    pub const fn page_count(&self) -> usize {
        self.page_count
    }

    /// Get raw PDF bytes as a slice.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Open the document for text extraction (creates a temporary handle)
    pub(crate) fn open_document(&self) -> Result<MuDocument> {
        MuDocument::from_bytes(&self.bytes, "")
            .map_err(|e| Error::PdfOpen(format!("Failed to open document: {e}")))
    }

    /// Load a mutable copy of the document for in-place page painting.
    ///
    /// The copy shares nothing with the extraction handle; all mutation
    /// happens here and is saved exactly once at the end of a job.
    pub fn load_editable(&self) -> Result<lopdf::Document> {
        lopdf::Document::load_mem(&self.bytes)
            .map_err(|e| Error::Lopdf(format!("Failed to load PDF: {e}")))
    }
}

impl Clone for PdfDocument {
    /// O(1) - only clones the `Arc` pointer to the underlying bytes.
    fn clone(&self) -> Self {
        Self {
            bytes: Arc::clone(&self.bytes),
            page_count: self.page_count,
        }
    }
}

impl std::fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfDocument")
            .field("page_count", &self.page_count)
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}
