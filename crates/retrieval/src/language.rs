use crate::error::{Result, RetrievalError};
use regex::Regex;

pub const DEFAULT_LANGUAGE_THRESHOLD: f32 = 0.1;

/// Hiragana, Katakana and the common CJK ideograph block.
const JAPANESE_CHARS: &str = r"[\u{3040}-\u{309F}\u{30A0}-\u{30FF}\u{4E00}-\u{9FAF}]";

pub const LANG_ENGLISH: &str = "en";
pub const LANG_JAPANESE: &str = "ja";

/// Tags text as `"ja"` or `"en"` by the share of Japanese script characters.
#[derive(Debug, Clone)]
pub struct LanguageDetector {
    pattern: Regex,
    threshold: f32,
}

impl LanguageDetector {
    pub fn new(threshold: f32) -> Result<Self> {
        if !(0.0..1.0).contains(&threshold) {
            return Err(RetrievalError::InvalidConfig(format!(
                "language threshold must be in [0, 1), got {threshold}"
            )));
        }
        let pattern = Regex::new(JAPANESE_CHARS)
            .map_err(|e| RetrievalError::Other(format!("language pattern: {e}")))?;
        Ok(Self { pattern, threshold })
    }

    /// Blank text is English.
    #[must_use]
    pub fn detect_language(&self, text: &str) -> &'static str {
        let non_whitespace = text.chars().filter(|c| !c.is_whitespace()).count();
        if non_whitespace == 0 {
            return LANG_ENGLISH;
        }
        let japanese = self.pattern.find_iter(text).count();
        let ratio = japanese as f64 / non_whitespace as f64;
        if ratio > f64::from(self.threshold) {
            LANG_JAPANESE
        } else {
            LANG_ENGLISH
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn detector() -> LanguageDetector {
        LanguageDetector::new(DEFAULT_LANGUAGE_THRESHOLD).unwrap()
    }

    #[test]
    fn detects_scripts() {
        let d = detector();
        assert_eq!(d.detect_language("The quick brown fox"), "en");
        assert_eq!(d.detect_language("東京は日本の首都です。"), "ja");
        assert_eq!(d.detect_language("カタカナとひらがな"), "ja");
        assert_eq!(d.detect_language("  \n "), "en");
        assert_eq!(d.detect_language(""), "en");
    }

    #[test]
    fn mixed_text_uses_ratio() {
        let d = detector();
        // 2 of 13 non-space chars
        assert_eq!(d.detect_language("This is a test 日本"), "ja");
        // 1 of 43 non-space chars
        assert_eq!(
            d.detect_language("A long English sentence mentioning one kanji 山 only"),
            "en"
        );
    }

    #[test]
    fn threshold_is_validated() {
        assert!(LanguageDetector::new(1.5).is_err());
        assert!(LanguageDetector::new(-0.1).is_err());
        assert!(LanguageDetector::new(0.0).is_ok());
    }
}
