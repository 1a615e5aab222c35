mod traits;
mod gemini;

pub use traits::{SkipCause, TranslationOutcome, Translator};
pub use gemini::GeminiTranslator;

use crate::config::TranslatorConfig;
use std::sync::Arc;

/// Create the translation client from configuration and a credential.
pub fn create_translator(config: &TranslatorConfig, api_key: String) -> Arc<dyn Translator> {
    Arc::new(GeminiTranslator::new(config, api_key))
}
