use thiserror::Error;

/// Unified error type for gemini-pdf-core
///
/// This enum encompasses all fatal error cases that can occur in the library:
/// - PDF operations (opening, extraction, painting, saving)
/// - Credential storage (reading, writing the persisted key)
/// - Configuration loading
/// - General I/O operations
///
/// Per-block translation and rendering failures are deliberately NOT errors;
/// they are represented as explicit outcomes (`TranslationOutcome`,
/// `BlockPaintOutcome`) so the pipeline can skip a block and continue.
#[derive(Error, Debug)]
pub enum Error {
    // ==========================================================================
    // PDF Errors
    // ==========================================================================
    /// Failed to open or parse a PDF file
    #[error("failed to open PDF: {0}")]
    PdfOpen(String),

    /// Invalid page number requested
    #[error("invalid page number {page} (document has {total} pages)")]
    PdfInvalidPage { page: usize, total: usize },

    /// Failed to extract text from a PDF page
    #[error("failed to extract text from page {page}: {reason}")]
    PdfTextExtraction { page: usize, reason: String },

    /// Failed to paint translation overlays onto a page
    #[error("failed to paint page {page}: {reason}")]
    PdfPaint { page: usize, reason: String },

    /// Failed to save the output PDF
    #[error("failed to save PDF: {0}")]
    PdfSave(String),

    /// Error from the lopdf library
    #[error("lopdf error: {0}")]
    Lopdf(String),

    /// Failed to load or parse the bundled overlay font
    #[error("failed to load overlay font: {0}")]
    FontLoad(String),

    // ==========================================================================
    // Credential Errors
    // ==========================================================================
    /// No API key available at job start
    #[error("no API key configured; pass one or save it first")]
    CredentialMissing,

    /// Failed to persist the API key
    #[error("failed to store credential: {0}")]
    CredentialStore(String),

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Failed to load configuration file
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
