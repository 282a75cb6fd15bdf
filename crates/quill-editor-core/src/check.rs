//! The check request/response contract.
//!
//! These are the types exchanged with the checking service. Transport lives
//! elsewhere; this module only knows what goes over the wire and how to read
//! what comes back.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use smol_str::SmolStr;

use crate::types::{Candidate, CandidateList, Token, UNDETERMINED_LANG};

/// Longest text the service accepts, in chars.
pub const MAX_TEXT_CHARS: usize = 10_000;

/// Confidence above which the detected language is shown as trustworthy.
pub const CONFIDENT_THRESHOLD: f64 = 0.8;

/// Checking strategy, passed through to the service as-is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckMode {
    Fast,
    #[default]
    Balanced,
    Accurate,
}

impl CheckMode {
    pub const ALL: [CheckMode; 3] = [CheckMode::Fast, CheckMode::Balanced, CheckMode::Accurate];

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckMode::Fast => "fast",
            CheckMode::Balanced => "balanced",
            CheckMode::Accurate => "accurate",
        }
    }
}

impl fmt::Display for CheckMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown check mode '{0}', expected one of fast, balanced, accurate")]
pub struct UnknownMode(pub String);

impl FromStr for CheckMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CheckMode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownMode(s.to_owned()))
    }
}

/// One outbound check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckRequest {
    pub text: String,
    pub mode: CheckMode,
    /// `None` means auto-detect; the field is left off the request entirely.
    pub lang: Option<SmolStr>,
}

impl CheckRequest {
    /// Build a request, or `None` if `text` is blank.
    ///
    /// A `lang` of `"und"` (or empty) is the auto-detect sentinel and is
    /// dropped.
    pub fn new(text: impl Into<String>, mode: CheckMode, lang: &str) -> Option<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return None;
        }
        let lang = lang.trim();
        let lang = (!lang.is_empty() && lang != UNDETERMINED_LANG).then(|| SmolStr::new(lang));
        Some(Self { text, mode, lang })
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_too_long(&self) -> bool {
        self.char_len() > MAX_TEXT_CHARS
    }

    /// Form fields in submission order.
    pub fn form_fields(&self) -> Vec<(&'static str, &str)> {
        let mut fields = vec![("text", self.text.as_str()), ("mode", self.mode.as_str())];
        if let Some(lang) = &self.lang {
            fields.push(("lang", lang.as_str()));
        }
        fields
    }
}

/// A parsed check response. Every field is optional on the wire.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct CheckResult {
    #[serde(default)]
    pub corrected_text: Option<String>,
    #[serde(default)]
    pub detected_lang: Option<SmolStr>,
    #[serde(default)]
    pub confidence: Option<f64>,
    /// Word → candidates, for the one-shot report.
    #[serde(default, deserialize_with = "deserialize_suggestion_map")]
    pub suggestions: BTreeMap<String, Vec<Candidate>>,
    #[serde(default, deserialize_with = "deserialize_tokens")]
    pub tokens: Vec<Token>,
}

impl CheckResult {
    pub fn badge(&self) -> LanguageBadge {
        LanguageBadge::from_result(self)
    }
}

fn deserialize_suggestion_map<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<String, Vec<Candidate>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Map(BTreeMap<String, CandidateList>),
        Junk(serde::de::IgnoredAny),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Map(map) => map.into_iter().map(|(word, list)| (word, list.0)).collect(),
        Raw::Junk(_) => BTreeMap::new(),
    })
}

fn deserialize_tokens<'de, D>(deserializer: D) -> Result<Vec<Token>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Token>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BadgeTone {
    /// Nothing detected yet.
    #[default]
    Neutral,
    Positive,
    Cautionary,
}

impl BadgeTone {
    /// CSS class for the badge element.
    pub fn class(&self) -> &'static str {
        match self {
            BadgeTone::Neutral => "bg-secondary",
            BadgeTone::Positive => "bg-success",
            BadgeTone::Cautionary => "bg-warning",
        }
    }
}

/// Detected language indicator.
#[derive(Clone, Debug, PartialEq)]
pub struct LanguageBadge {
    pub lang: SmolStr,
    pub confidence: f64,
    pub tone: BadgeTone,
}

impl Default for LanguageBadge {
    fn default() -> Self {
        Self {
            lang: SmolStr::new_static(UNDETERMINED_LANG),
            confidence: 0.0,
            tone: BadgeTone::Neutral,
        }
    }
}

impl LanguageBadge {
    pub fn from_result(result: &CheckResult) -> Self {
        let confidence = result.confidence.unwrap_or(0.0);
        match &result.detected_lang {
            Some(lang) if !lang.is_empty() => Self {
                lang: lang.clone(),
                confidence,
                tone: if confidence > CONFIDENT_THRESHOLD {
                    BadgeTone::Positive
                } else {
                    BadgeTone::Cautionary
                },
            },
            _ => Self {
                confidence,
                ..Self::default()
            },
        }
    }

    /// Confidence to two decimals.
    pub fn confidence_label(&self) -> String {
        format!("{:.2}", self.confidence)
    }
}

impl fmt::Display for LanguageBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.lang, self.confidence_label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TokenKind;

    #[test]
    fn test_blank_text_is_no_request() {
        assert!(CheckRequest::new("", CheckMode::Balanced, "und").is_none());
        assert!(CheckRequest::new("   \n\t", CheckMode::Fast, "en").is_none());
    }

    #[test]
    fn test_und_lang_is_omitted() {
        let req = CheckRequest::new("Ths is", CheckMode::Balanced, "und").unwrap();
        assert_eq!(req.lang, None);
        assert_eq!(req.form_fields(), vec![("text", "Ths is"), ("mode", "balanced")]);

        let req = CheckRequest::new("Ths is", CheckMode::Accurate, "de").unwrap();
        assert_eq!(
            req.form_fields(),
            vec![("text", "Ths is"), ("mode", "accurate"), ("lang", "de")]
        );
    }

    #[test]
    fn test_too_long() {
        let req = CheckRequest::new("a".repeat(MAX_TEXT_CHARS), CheckMode::Fast, "und").unwrap();
        assert!(!req.is_too_long());
        let req = CheckRequest::new("a".repeat(MAX_TEXT_CHARS + 1), CheckMode::Fast, "und").unwrap();
        assert!(req.is_too_long());
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("fast".parse::<CheckMode>(), Ok(CheckMode::Fast));
        assert_eq!(" Accurate ".parse::<CheckMode>(), Ok(CheckMode::Accurate));
        assert!("thorough".parse::<CheckMode>().is_err());
        assert_eq!(CheckMode::default().to_string(), "balanced");
    }

    #[test]
    fn test_result_deserialize() {
        let json = r#"{
            "detected_lang": "en",
            "confidence": 0.93,
            "mode": "balanced",
            "corrected_text": "This is a test.",
            "suggestions": {"Ths": [{"word": "This", "lang": "en"}], "tst": ["test"]},
            "tokens": [
                {"text": "Ths", "type": "word", "is_valid": false, "suggestions": [{"word": "This", "lang": "en"}]},
                {"text": " ", "type": "space", "is_valid": true, "suggestions": []},
                {"text": "is", "type": "word", "is_valid": true, "suggestions": []}
            ]
        }"#;
        let result: CheckResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.corrected_text.as_deref(), Some("This is a test."));
        assert_eq!(result.tokens.len(), 3);
        assert_eq!(result.tokens[1].kind, TokenKind::Space);
        assert_eq!(result.suggestions["tst"], vec![Candidate::new("test", "und")]);
        assert_eq!(result.badge().to_string(), "en (0.93)");
        assert_eq!(result.badge().tone, BadgeTone::Positive);
    }

    #[test]
    fn test_result_missing_fields() {
        let result: CheckResult =
            serde_json::from_str(r#"{"tokens": null, "suggestions": 7}"#).unwrap();
        assert!(result.tokens.is_empty());
        assert!(result.suggestions.is_empty());
        let badge = result.badge();
        assert_eq!(badge.lang, "und");
        assert_eq!(badge.confidence_label(), "0.00");
        assert_eq!(badge.tone, BadgeTone::Neutral);
    }

    #[test]
    fn test_badge_threshold() {
        let at = CheckResult {
            detected_lang: Some("de".into()),
            confidence: Some(0.8),
            ..Default::default()
        };
        assert_eq!(at.badge().tone, BadgeTone::Cautionary);
        let above = CheckResult {
            confidence: Some(0.81),
            ..at
        };
        assert_eq!(above.badge().tone, BadgeTone::Positive);
        assert_eq!(above.badge().tone.class(), "bg-success");
    }
}
