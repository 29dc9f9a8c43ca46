//! Parser tuning knobs
//!
//! Loaded by the host (usually as part of an FFI request); every field has a
//! default so partial JSON objects are accepted.

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

fn default_min_text_len() -> usize {
    30
}

fn default_min_html_len() -> usize {
    50
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Sections with less visible text than this (and no image) are noise
    #[serde(default = "default_min_text_len")]
    pub min_text_len: usize,
    /// Sections with shorter inner markup than this (and no image) are noise
    #[serde(default = "default_min_html_len")]
    pub min_html_len: usize,
    /// Upper bound on emitted content blocks per page
    #[serde(default)]
    pub max_content_blocks: Option<usize>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            min_text_len: default_min_text_len(),
            min_html_len: default_min_html_len(),
            max_content_blocks: None,
        }
    }
}

impl ParserConfig {
    pub fn from_json(json: &str) -> Result<Self, ParseError> {
        serde_json::from_str(json).map_err(ParseError::InvalidConfig)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config() {
        let config = ParserConfig::from_json(r#"{"max_content_blocks": 4}"#).unwrap();
        assert_eq!(config.min_text_len, 30);
        assert_eq!(config.min_html_len, 50);
        assert_eq!(config.max_content_blocks, Some(4));
    }

    #[test]
    fn test_invalid_config() {
        let err = ParserConfig::from_json(r#"{"min_text_len": "long"}"#).unwrap_err();
        assert!(matches!(err, ParseError::InvalidConfig(_)));
    }
}
