//! Gemini PDF Translator Core Library
//!
//! This library provides the core functionality for overlay-translating
//! PDF documents:
//! - PDF text extraction with bounding geometry
//! - Translation via the Gemini generateContent API
//! - Block redaction and in-place text re-rendering
//! - The job pipeline with typed progress events
//! - Credential persistence and the session state machine

pub mod config;
pub mod credentials;
pub mod driver;
pub mod error;
pub mod job;
pub mod pdf;
pub mod translator;
pub mod util;

pub use config::{AppConfig, DEFAULT_TARGET_LANG, Lang, TranslatorConfig};
pub use credentials::CredentialStore;
pub use driver::{DriverState, JobDriver};
pub use error::{Error, Result};
pub use job::{JobEvent, JobRunner};
pub use pdf::{
    BoundingBox, OverlayFont, OverlayPainter, PagePaintStats, PdfDocument, TextBlock,
    TextExtractor, TranslationPatch,
};
pub use translator::{
    GeminiTranslator, SkipCause, TranslationOutcome, Translator, create_translator,
};
pub use util::derived_output_path;
