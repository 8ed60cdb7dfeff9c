use crate::error::AbscrubError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Marker printed on the HAL repository cover page.
pub const HAL_COVER_MARKER: &str = "HAL is a multi-disciplinary open access archive";

/// Settings for turning positional markup into a word file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Rescale boxes into the 0..=1000 coordinate space.
    pub normalize_bbox: bool,
    /// Truncate the document at its reference section heading.
    pub remove_references: bool,
    /// A first page containing any of these phrases is dropped.
    pub boilerplate_markers: Vec<String>,
    /// Document language, used to pick reference headings.
    pub language: Option<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        ExtractConfig {
            normalize_bbox: false,
            remove_references: false,
            boilerplate_markers: vec![HAL_COVER_MARKER.to_string()],
            language: None,
        }
    }
}

/// Settings for locating and stripping abstracts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedactConfig {
    /// Language whose abstract must exist for a multilingual record.
    pub main_lang: Option<String>,
    /// Edit budget of the fuzzy search tier.
    pub max_edit_distance: usize,
    /// Edit budget of the bounded-error fallback tier.
    pub bounded_errors: usize,
    /// Main abstracts shorter than this many words are skipped. 0 disables.
    pub min_abstract_words: usize,
    /// Paint located words over on the rendered page images.
    pub redact_images: bool,
    /// RGB fill used for image redaction.
    pub fill: [u8; 3],
}

impl Default for RedactConfig {
    fn default() -> Self {
        RedactConfig {
            main_lang: None,
            max_edit_distance: 15,
            bounded_errors: 5,
            min_abstract_words: 0,
            redact_images: false,
            fill: [0, 0, 0],
        }
    }
}

/// Both stages' settings, as stored in one JSON file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub extract: ExtractConfig,
    pub redact: RedactConfig,
}

/// Load a config from a JSON file.
pub fn load_config(path: &Path) -> Result<Config, AbscrubError> {
    let content = std::fs::read_to_string(path).map_err(|e| AbscrubError::ConfigLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let config: Config = serde_json::from_str(&content).map_err(|e| AbscrubError::ConfigLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Parse a config from a JSON string (no file path context).
pub fn parse_config_str(json: &str) -> Result<Config, AbscrubError> {
    let config: Config = serde_json::from_str(json)?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate that a config is usable.
pub fn validate_config(config: &Config) -> Result<(), AbscrubError> {
    if config
        .extract
        .boilerplate_markers
        .iter()
        .any(|m| m.trim().is_empty())
    {
        return Err(AbscrubError::ConfigInvalid(
            "boilerplate markers must not be empty".into(),
        ));
    }

    if let Some(ref lang) = config.redact.main_lang {
        if lang.is_empty() || lang.contains(char::is_whitespace) {
            return Err(AbscrubError::ConfigInvalid(format!(
                "invalid main language tag '{}'",
                lang
            )));
        }
    }

    if config.redact.max_edit_distance > 256 || config.redact.bounded_errors > 256 {
        return Err(AbscrubError::ConfigInvalid(
            "edit budgets above 256 are not supported".into(),
        ));
    }

    Ok(())
}
