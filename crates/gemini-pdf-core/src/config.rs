use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Language codes following ISO 639-1
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lang(pub String);

impl Lang {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// English name of the language, used in translation prompts and in the
    /// output filename suffix. Returns `None` for codes this tool has no
    /// name for; callers fall back to the raw code.
    pub fn english_name(&self) -> Option<&'static str> {
        match self.as_str() {
            "ru" => Some("Russian"),
            "en" => Some("English"),
            "de" => Some("German"),
            "fr" => Some("French"),
            "es" => Some("Spanish"),
            "it" => Some("Italian"),
            "pt" => Some("Portuguese"),
            "uk" => Some("Ukrainian"),
            "pl" => Some("Polish"),
            "ja" => Some("Japanese"),
            "zh-CN" => Some("Simplified Chinese"),
            _ => None,
        }
    }
}

fn default_target_lang() -> Lang {
    Lang::new("ru")
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Lang {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Lang {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Gemini API endpoint configuration.
///
/// The API key is not part of this struct; it is loaded once at startup
/// (from the CLI or the credential store) and passed explicitly to the
/// translator constructor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorConfig {
    /// Base URL of the generative-text API
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Model identifier appended to the endpoint path
    #[serde(default = "default_model")]
    pub model: String,

    /// Fixed per-request deadline in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model() -> String {
    "gemini-1.5-pro".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Target language for translations
    #[serde(default = "default_target_lang")]
    pub target_lang: Lang,

    /// Blocks whose trimmed text is shorter than this many characters are
    /// treated as noise and never sent to the translation client.
    #[serde(default = "default_min_block_chars")]
    pub min_block_chars: usize,

    /// Font size for translated text, in points
    #[serde(default = "default_font_size")]
    pub font_size: f32,

    /// Bundled TrueType font for translated text. When unset or unloadable
    /// the builtin base font is used instead (Latin-1 text only).
    #[serde(default)]
    pub font_file: Option<PathBuf>,

    /// Translation endpoint configuration
    #[serde(default)]
    pub translator: TranslatorConfig,
}

const fn default_min_block_chars() -> usize {
    2
}

const fn default_font_size() -> f32 {
    9.0
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            target_lang: default_target_lang(),
            min_block_chars: default_min_block_chars(),
            font_size: default_font_size(),
            font_file: None,
            translator: TranslatorConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::error::Error> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            crate::error::Error::ConfigLoad(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        toml::from_str(&content).map_err(|e| {
            crate::error::Error::ConfigLoad(format!("Failed to parse config: {e}"))
        })
    }

    /// Load from default locations (~/.config/gemini-pdf-translator/config.toml, ./config.toml)
    pub fn load() -> Self {
        // Try user config
        if let Some(config_dir) = crate::util::config_dir() {
            let user_config = config_dir.join("gemini-pdf-translator").join("config.toml");
            if user_config.exists() {
                match Self::from_file(&user_config) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {}", user_config.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // Try local config
        let local_config = std::path::PathBuf::from("config.toml");
        if local_config.exists() {
            match Self::from_file(&local_config) {
                Ok(config) => {
                    tracing::debug!("Loaded config from ./config.toml");
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load ./config.toml: {}", e);
                }
            }
        }

        // Return defaults
        tracing::debug!("No config file found, using defaults");
        Self::default()
    }
}

/// Default target language code
pub const DEFAULT_TARGET_LANG: &str = "ru";

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.target_lang.as_str(), "ru");
        assert_eq!(config.min_block_chars, 2);
        assert!((config.font_size - 9.0).abs() < f32::EPSILON);
        assert!(config.font_file.is_none());
        assert_eq!(config.translator.timeout_secs, 30);
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: AppConfig = toml::from_str("target_lang = \"de\"").unwrap();
        assert_eq!(config.target_lang.as_str(), "de");
        assert_eq!(config.min_block_chars, 2);
        assert_eq!(config.translator.model, "gemini-1.5-pro");
    }

    #[test]
    fn test_nested_translator_table() {
        let config: AppConfig = toml::from_str(
            "[translator]\nmodel = \"gemini-1.5-flash\"\ntimeout_secs = 10\n",
        )
        .unwrap();
        assert_eq!(config.translator.model, "gemini-1.5-flash");
        assert_eq!(config.translator.timeout_secs, 10);
        assert_eq!(config.translator.api_base, default_api_base());
    }

    #[test]
    fn test_english_name() {
        assert_eq!(Lang::new("ru").english_name(), Some("Russian"));
        assert_eq!(Lang::new("xx").english_name(), None);
    }
}
