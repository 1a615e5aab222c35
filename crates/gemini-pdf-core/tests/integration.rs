//! Integration tests for gemini-pdf-core
//!
//! These tests verify the end-to-end workflow:
//! - PDF loading and text extraction
//! - The job pipeline with a mock translation backend
//! - Progress event semantics
//! - Output naming and page-count preservation

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream};

use gemini_pdf_core::{
    AppConfig, JobEvent, JobRunner, Lang, PdfDocument, SkipCause, TextExtractor,
    TranslationOutcome, Translator,
};

// =============================================================================
// Mock Translator
// =============================================================================

enum MockResponse {
    /// Always return this translation
    Fixed(&'static str),
    /// Always soft-fail
    Fail,
}

/// A mock backend with predictable outcomes and a call counter, so tests
/// can assert what was (and was not) dispatched.
struct MockTranslator {
    response: MockResponse,
    calls: AtomicUsize,
}

impl MockTranslator {
    fn fixed(text: &'static str) -> Arc<Self> {
        Arc::new(Self {
            response: MockResponse::Fixed(text),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            response: MockResponse::Fail,
            calls: AtomicUsize::new(0),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Translator for MockTranslator {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn translate(&self, _text: &str, _target: &Lang) -> TranslationOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.response {
            MockResponse::Fixed(text) => TranslationOutcome::Translated((*text).to_string()),
            MockResponse::Fail => {
                TranslationOutcome::Skipped(SkipCause::Network("mock outage".to_string()))
            }
        }
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// Build a PDF with one text line per page.
fn create_test_pdf(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let page_tree_id = doc.new_object_id();

    let font_id = doc.add_object(lopdf::Dictionary::from_iter([
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));

    let resources_id = doc.add_object(lopdf::Dictionary::from_iter([(
        "Font",
        Object::Dictionary(lopdf::Dictionary::from_iter([(
            "F1",
            Object::Reference(font_id),
        )])),
    )]));

    let mut kids = Vec::new();
    for page_text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*page_text)]),
                Operation::new("ET", vec![]),
            ],
        };

        let content_bytes = content.encode().unwrap_or_default();
        let content_id = doc.add_object(Stream::new(lopdf::Dictionary::new(), content_bytes));

        let page_id = doc.add_object(lopdf::Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(page_tree_id)),
            ("Contents", Object::Reference(content_id)),
            ("Resources", Object::Reference(resources_id)),
            (
                "MediaBox",
                Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]),
            ),
        ]));
        kids.push(Object::Reference(page_id));
    }

    #[allow(clippy::cast_possible_wrap)]
    let page_count = kids.len() as i64;
    let page_tree = lopdf::Dictionary::from_iter([
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(page_count)),
    ]);
    doc.objects.insert(page_tree_id, Object::Dictionary(page_tree));

    let catalog_id = doc.add_object(lopdf::Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(page_tree_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut output = Vec::new();
    doc.save_to(&mut output).unwrap_or_default();
    output
}

/// Write a fixture PDF into a temp dir and return (dir guard, input path).
fn fixture_on_disk(pages: &[&str]) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("temp dir");
    let input = dir.path().join("input.pdf");
    std::fs::write(&input, create_test_pdf(pages)).expect("write fixture");
    (dir, input)
}

fn test_config() -> AppConfig {
    AppConfig::default()
}

/// Run a job to completion and return (result, drained events).
async fn run_job(
    config: AppConfig,
    translator: Arc<MockTranslator>,
    input: &std::path::Path,
) -> (gemini_pdf_core::Result<PathBuf>, Vec<JobEvent>) {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let runner = JobRunner::new(config, translator, tx);
    let result = runner.run(input).await;
    drop(runner);

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    (result, events)
}

fn progress_values(events: &[JobEvent]) -> Vec<u8> {
    events
        .iter()
        .filter_map(|event| match event {
            JobEvent::Progress(percent) => Some(*percent),
            _ => None,
        })
        .collect()
}

// =============================================================================
// PDF Loading & Extraction
// =============================================================================

#[test]
fn test_pdf_loads_successfully() {
    let bytes = create_test_pdf(&["Hello world"]);
    let doc = PdfDocument::from_bytes(bytes).expect("fixture should parse");
    assert_eq!(doc.page_count(), 1);
}

#[test]
fn test_multi_page_fixture_page_count() {
    let bytes = create_test_pdf(&["Page one text", "Page two text", "Page three text"]);
    let doc = PdfDocument::from_bytes(bytes).expect("fixture should parse");
    assert_eq!(doc.page_count(), 3);
}

#[test]
fn test_invalid_pdf_bytes() {
    assert!(PdfDocument::from_bytes(vec![0, 1, 2, 3]).is_err());
    assert!(PdfDocument::from_bytes(vec![]).is_err());
}

#[test]
fn test_text_extraction_does_not_panic() {
    let bytes = create_test_pdf(&["Hello world"]);
    let doc = PdfDocument::from_bytes(bytes).expect("fixture should parse");
    let extractor = TextExtractor::new(&doc);

    // Blocks may or may not be present depending on the extraction engine's
    // view of the fixture; we only require a valid response.
    let blocks = extractor.extract_page_blocks(0).expect("extraction should succeed");
    for block in &blocks {
        assert!(!block.text.is_empty());
    }
}

#[test]
fn test_extraction_rejects_invalid_page() {
    let bytes = create_test_pdf(&["Hello world"]);
    let doc = PdfDocument::from_bytes(bytes).expect("fixture should parse");
    let extractor = TextExtractor::new(&doc);
    assert!(extractor.extract_page_blocks(5).is_err());
}

// =============================================================================
// Job Pipeline
// =============================================================================

#[tokio::test]
async fn test_job_preserves_page_count() {
    let (_dir, input) = fixture_on_disk(&["Hello world on page one", "More text on page two"]);
    let mock = MockTranslator::fixed("Hello again");

    let (result, events) = run_job(test_config(), Arc::clone(&mock), &input).await;
    let output = result.expect("job should succeed");

    let out_doc = PdfDocument::from_file(&output).expect("output should parse");
    assert_eq!(out_doc.page_count(), 2);
    assert!(
        events
            .iter()
            .any(|event| matches!(event, JobEvent::Completed { .. }))
    );
}

#[tokio::test]
async fn test_output_path_carries_language_suffix() {
    let (_dir, input) = fixture_on_disk(&["Hello world"]);
    let mock = MockTranslator::fixed("Hello again");

    let (result, _) = run_job(test_config(), mock, &input).await;
    let output = result.expect("job should succeed");

    assert_eq!(
        output.file_name().and_then(|name| name.to_str()),
        Some("input_RUSSIAN.pdf")
    );
    assert!(output.exists());
}

#[tokio::test]
async fn test_blocks_below_threshold_never_dispatched() {
    let (_dir, input) = fixture_on_disk(&["Hello world on page one"]);
    let mock = MockTranslator::fixed("Hello again");

    // With an absurd threshold every extracted block counts as noise
    let config = AppConfig {
        min_block_chars: 10_000,
        ..AppConfig::default()
    };

    let (result, _) = run_job(config, Arc::clone(&mock), &input).await;
    result.expect("job should succeed");

    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_soft_failures_skip_blocks_and_complete() {
    let (_dir, input) = fixture_on_disk(&["Hello world on page one", "More text on page two"]);
    let mock = MockTranslator::failing();

    let (result, events) = run_job(test_config(), mock, &input).await;
    let output = result.expect("soft failures must not abort the job");

    // Every block was skipped; the document survives with its pages intact
    let out_doc = PdfDocument::from_file(&output).expect("output should parse");
    assert_eq!(out_doc.page_count(), 2);
    assert!(
        !events
            .iter()
            .any(|event| matches!(event, JobEvent::Failed { .. }))
    );
}

#[tokio::test]
async fn test_error_marker_translations_are_not_painted() {
    let (_dir, input) = fixture_on_disk(&["Hello world on page one"]);
    let mock = MockTranslator::fixed("[API error: 403]");

    let (result, events) = run_job(test_config(), mock, &input).await;
    result.expect("marker results must not abort the job");

    assert!(
        !events
            .iter()
            .any(|event| matches!(event, JobEvent::Failed { .. }))
    );
}

// =============================================================================
// Progress Events
// =============================================================================

#[tokio::test]
async fn test_progress_is_monotonic_and_ends_at_100() {
    let (_dir, input) = fixture_on_disk(&["Page one text", "Page two text", "Page three text"]);
    let mock = MockTranslator::fixed("Hello again");

    let (result, events) = run_job(test_config(), mock, &input).await;
    result.expect("job should succeed");

    let progress = progress_values(&events);
    assert!(!progress.is_empty());
    assert!(
        progress.windows(2).all(|pair| pair[0] <= pair[1]),
        "progress must be non-decreasing: {progress:?}"
    );
    assert_eq!(*progress.last().expect("has progress"), 100);
    // 100 appears exactly once, at completion
    assert_eq!(progress.iter().filter(|&&percent| percent == 100).count(), 1);

    // The terminal event follows the final progress update
    assert!(matches!(events.last(), Some(JobEvent::Completed { .. })));
}

#[tokio::test]
async fn test_status_lines_announce_pages() {
    let (_dir, input) = fixture_on_disk(&["Page one text", "Page two text"]);
    let mock = MockTranslator::fixed("Hello again");

    let (result, events) = run_job(test_config(), mock, &input).await;
    result.expect("job should succeed");

    let statuses: Vec<&str> = events
        .iter()
        .filter_map(|event| match event {
            JobEvent::Status(text) => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert!(statuses.iter().any(|text| text.contains("page 1 of 2")));
    assert!(statuses.iter().any(|text| text.contains("page 2 of 2")));
}

// =============================================================================
// Failure Semantics
// =============================================================================

#[tokio::test]
async fn test_unreadable_input_is_fatal_with_no_output() {
    let dir = tempfile::tempdir().expect("temp dir");
    let input = dir.path().join("missing.pdf");
    let mock = MockTranslator::fixed("Hello again");

    let (result, events) = run_job(test_config(), mock, &input).await;
    assert!(result.is_err());

    assert!(
        events
            .iter()
            .any(|event| matches!(event, JobEvent::Failed { .. }))
    );
    assert!(
        !events
            .iter()
            .any(|event| matches!(event, JobEvent::Completed { .. }))
    );
    // Open-question decision: nothing is written on fatal errors
    assert!(!dir.path().join("missing_RUSSIAN.pdf").exists());
}

#[tokio::test]
async fn test_garbage_input_is_fatal() {
    let dir = tempfile::tempdir().expect("temp dir");
    let input = dir.path().join("garbage.pdf");
    std::fs::write(&input, b"not a pdf").expect("write garbage");
    let mock = MockTranslator::fixed("Hello again");

    let (result, events) = run_job(test_config(), mock, &input).await;
    assert!(result.is_err());
    assert!(
        events
            .iter()
            .any(|event| matches!(event, JobEvent::Failed { .. }))
    );
}
