//! Heuristic language detection.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Haitian Creole markers. Checked before French since several Creole words
/// are prefixes of their French counterparts.
const HAITIAN_KEYWORDS: &[&str] = &["bonjou", "mèsi", "egzamen", "klas", "peyman"];

/// French markers.
const FRENCH_KEYWORDS: &[&str] = &["bonjour", "merci", "examens", "classe", "paiement"];

/// Languages the bot can answer in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// French.
    Fr,
    /// Haitian Creole.
    Ht,
    /// English, the fallback.
    #[default]
    En,
}

impl Language {
    /// All supported languages, in keyboard order.
    pub const ALL: [Self; 3] = [Self::Fr, Self::Ht, Self::En];

    /// Returns the two-letter language code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Fr => "fr",
            Self::Ht => "ht",
            Self::En => "en",
        }
    }

    /// Returns the label shown on the language selection keyboard.
    #[must_use]
    pub const fn button_label(self) -> &'static str {
        match self {
            Self::Fr => "Français",
            Self::Ht => "Kreyòl",
            Self::En => "English",
        }
    }

    /// Maps a keyboard label back to its language.
    #[must_use]
    pub fn from_button_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|lang| lang.button_label() == label.trim())
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Guesses the language of a message by keyword substring matching.
///
/// Falls back to [`Language::En`] when no marker is found.
#[must_use]
pub fn detect_language(text: &str) -> Language {
    let lower = text.to_lowercase();

    if HAITIAN_KEYWORDS.iter().any(|w| lower.contains(w)) {
        Language::Ht
    } else if FRENCH_KEYWORDS.iter().any(|w| lower.contains(w)) {
        Language::Fr
    } else {
        Language::En
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_french() {
        assert_eq!(detect_language("Quand sont les examens ?"), Language::Fr);
        assert_eq!(detect_language("Ma classe commence quand"), Language::Fr);
        assert_eq!(detect_language("MERCI"), Language::Fr);
    }

    #[test]
    fn test_detect_haitian_wins_over_french() {
        // "bonjour" contains "bonjou", so Creole is matched first.
        assert_eq!(detect_language("bonjour"), Language::Ht);
        assert_eq!(detect_language("Mèsi anpil"), Language::Ht);
        assert_eq!(detect_language("ki lè egzamen an?"), Language::Ht);
    }

    #[test]
    fn test_detect_defaults_to_english() {
        assert_eq!(detect_language("hello there"), Language::En);
        assert_eq!(detect_language(""), Language::En);
    }

    #[test]
    fn test_button_labels_round_trip() {
        for lang in Language::ALL {
            assert_eq!(Language::from_button_label(lang.button_label()), Some(lang));
        }
        assert_eq!(Language::from_button_label("Deutsch"), None);
    }

    #[test]
    fn test_serde_codes() {
        let json = serde_json::to_string(&Language::Ht).unwrap();
        assert_eq!(json, "\"ht\"");
    }
}
