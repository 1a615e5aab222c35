use async_trait::async_trait;
use crate::config::Lang;

/// Why a block produced no translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipCause {
    /// Endpoint answered with a non-success status
    HttpStatus(u16),
    /// Request could not be completed (connect, DNS, TLS)
    Network(String),
    /// Request exceeded the fixed per-request deadline
    Timeout,
    /// Response body did not match the expected envelope
    MalformedResponse(String),
    /// Envelope parsed but carried no candidate text
    EmptyResponse,
}

impl std::fmt::Display for SkipCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HttpStatus(status) => write!(f, "HTTP {status}"),
            Self::Network(reason) => write!(f, "network failure: {reason}"),
            Self::Timeout => write!(f, "request timed out"),
            Self::MalformedResponse(reason) => write!(f, "malformed response: {reason}"),
            Self::EmptyResponse => write!(f, "response carried no translation"),
        }
    }
}

/// Outcome of translating one text block.
///
/// Soft failures are values, not errors: the caller skips the block and
/// continues with the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationOutcome {
    /// The endpoint produced a translation
    Translated(String),
    /// No translation produced; the block stays as it is
    Skipped(SkipCause),
}

/// Trait for translation backends
#[async_trait]
pub trait Translator: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    /// Translate one text block into the target language.
    async fn translate(&self, text: &str, target: &Lang) -> TranslationOutcome;
}
