use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the standards reference table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardRecord {
    pub name: String,
    pub publication_date: String,
    pub tfidf_keywords: String,
    pub contextual_keywords: String,
}

/// How a keyword list came to be. `Empty` means there was nothing to score,
/// `Degraded` means the scorer gave up and the list was emptied on purpose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum KeywordOutcome {
    Ranked,
    Empty,
    Degraded(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordList {
    pub terms: Vec<String>,
    pub joined: String,
    #[serde(flatten)]
    pub outcome: KeywordOutcome,
}

impl KeywordList {
    pub fn ranked(terms: Vec<String>) -> Self {
        if terms.is_empty() {
            return Self::empty();
        }
        let joined = terms.join(", ");
        KeywordList {
            terms,
            joined,
            outcome: KeywordOutcome::Ranked,
        }
    }

    pub fn empty() -> Self {
        KeywordList {
            terms: vec![],
            joined: String::new(),
            outcome: KeywordOutcome::Empty,
        }
    }

    pub fn degraded(reason: impl Into<String>) -> Self {
        KeywordList {
            terms: vec![],
            joined: String::new(),
            outcome: KeywordOutcome::Degraded(reason.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadedDocument {
    pub filename: String,
    #[serde(skip)]
    pub stored_path: PathBuf,
    #[serde(skip)]
    pub raw_text: String,
    #[serde(skip)]
    pub normalized_text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    pub preview: String,
    pub detected_year: String,
    pub tfidf_keywords: KeywordList,
    pub contextual_keywords: KeywordList,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub filename: String,
    pub standard: String,
    pub extraction: ExtractionResult,
    pub matched_standard: Option<StandardRecord>,
    pub analyzed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranked_joins_with_comma_space() {
        let list = KeywordList::ranked(vec!["climate".into(), "risk".into()]);
        assert_eq!(list.joined, "climate, risk");
        assert_eq!(list.outcome, KeywordOutcome::Ranked);
    }

    #[test]
    fn test_ranked_without_terms_is_empty() {
        let list = KeywordList::ranked(vec![]);
        assert_eq!(list.outcome, KeywordOutcome::Empty);
        assert!(list.is_empty());
    }

    #[test]
    fn test_degraded_serializes_reason() {
        let list = KeywordList::degraded("empty vocabulary");
        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(json["outcome"], "degraded");
        assert_eq!(json["reason"], "empty vocabulary");
        assert_eq!(json["terms"], serde_json::json!([]));
    }
}
