//! The translation job: whole-document pipeline plus typed progress events.
//!
//! A job owns one document end to end: extract blocks per page, translate
//! the non-trivial ones sequentially, paint accepted translations over the
//! originals, and save once to the derived output path. All document I/O
//! and every network call happen on the worker that runs [`JobRunner::run`];
//! the display side only ever sees [`JobEvent`]s.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::pdf::{OverlayFont, OverlayPainter, PdfDocument, TextExtractor, TranslationPatch};
use crate::translator::{TranslationOutcome, Translator};
use crate::util::derived_output_path;

/// Character marking a returned string as an error message rather than a
/// translation; such results are never painted.
const ERROR_MARKER: char = '[';

/// Progress events pushed from the worker to whichever display consumes
/// them. Sends are fire-and-forget: a vanished consumer never stops a job,
/// and there is no backpressure or cancellation path.
#[derive(Debug, Clone)]
pub enum JobEvent {
    /// Human-readable status line
    Status(String),
    /// Percent complete, 0-100; non-decreasing, reaches 100 only at completion
    Progress(u8),
    /// Job finished and the output file is in place
    Completed { output: PathBuf },
    /// Job aborted; no output file was written
    Failed { message: String },
}

/// Runs one end-to-end translation job over a single document.
pub struct JobRunner {
    translator: Arc<dyn Translator>,
    config: AppConfig,
    events: UnboundedSender<JobEvent>,
}

impl JobRunner {
    pub fn new(
        config: AppConfig,
        translator: Arc<dyn Translator>,
        events: UnboundedSender<JobEvent>,
    ) -> Self {
        Self {
            translator,
            config,
            events,
        }
    }

    /// Create a runner with the Gemini client built from the configuration
    /// and an explicitly provided credential.
    pub fn from_config(
        config: AppConfig,
        api_key: String,
        events: UnboundedSender<JobEvent>,
    ) -> Self {
        let translator = crate::translator::create_translator(&config.translator, api_key);
        Self::new(config, translator, events)
    }

    /// Run the job to completion or failure.
    ///
    /// The outcome is reported twice: as the returned `Result` and as a
    /// terminal `Completed`/`Failed` event for the display side. On failure
    /// no output file exists; the document is only written after the last
    /// page was processed.
    pub async fn run(&self, input: &Path) -> Result<PathBuf> {
        match self.process_document(input).await {
            Ok(output) => {
                self.send(JobEvent::Progress(100));
                self.send(JobEvent::Status(format!("Done. Saved {}", output.display())));
                self.send(JobEvent::Completed {
                    output: output.clone(),
                });
                Ok(output)
            }
            Err(e) => {
                self.send(JobEvent::Failed {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn process_document(&self, input: &Path) -> Result<PathBuf> {
        let doc = PdfDocument::from_file(input)?;
        let total = doc.page_count();
        info!("Translating {} pages of {}", total, input.display());

        let mut out_doc = doc.load_editable()?;
        let font = OverlayFont::load(self.config.font_file.as_deref());
        let mut painter = OverlayPainter::new(font, self.config.font_size);
        let extractor = TextExtractor::new(&doc);

        for page_num in 0..total {
            #[allow(clippy::cast_possible_truncation)]
            let percent = ((page_num * 100) / total) as u8;
            self.send(JobEvent::Progress(percent));
            self.send(JobEvent::Status(format!(
                "Translating page {} of {}",
                page_num + 1,
                total
            )));

            let patches = self.translate_page(&extractor, page_num).await?;
            let stats = painter.paint_page(&mut out_doc, page_num, &patches)?;
            debug!(
                "Page {}: {} blocks painted, {} left blank",
                page_num + 1,
                stats.painted,
                stats.blank
            );
        }

        let output = derived_output_path(input, &self.config.target_lang);
        let mut bytes = Vec::new();
        out_doc
            .save_to(&mut bytes)
            .map_err(|e| Error::PdfSave(e.to_string()))?;
        std::fs::write(&output, bytes).map_err(|e| {
            Error::PdfSave(format!("Failed to write {}: {}", output.display(), e))
        })?;

        info!("Saved translated document to {}", output.display());
        Ok(output)
    }

    /// Translate one page's blocks into patches.
    ///
    /// Blocks below the noise threshold are never dispatched to the client;
    /// soft failures and error-marker results leave their block untouched.
    async fn translate_page(
        &self,
        extractor: &TextExtractor<'_>,
        page_num: usize,
    ) -> Result<Vec<TranslationPatch>> {
        let blocks = extractor.extract_page_blocks(page_num)?;
        let mut patches = Vec::with_capacity(blocks.len());

        for block in blocks {
            let text = block.text.trim();
            if text.chars().count() < self.config.min_block_chars {
                continue;
            }

            match self
                .translator
                .translate(text, &self.config.target_lang)
                .await
            {
                TranslationOutcome::Translated(translated) if accepts(&translated) => {
                    patches.push(TranslationPatch {
                        bbox: block.bbox,
                        text: translated,
                    });
                }
                TranslationOutcome::Translated(translated) => {
                    debug!("Discarding error-marker result: {:?}", translated);
                }
                TranslationOutcome::Skipped(cause) => {
                    debug!("Block left untranslated: {}", cause);
                }
            }
        }

        Ok(patches)
    }

    fn send(&self, event: JobEvent) {
        let _ = self.events.send(event);
    }
}

/// A returned string is accepted as a translation unless it carries the
/// error marker.
fn accepts(translated: &str) -> bool {
    !translated.contains(ERROR_MARKER)
}
