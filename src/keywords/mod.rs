//! Keyword extraction pipeline
//!
//! Three independent derivations over one document:
//!
//! - TF-IDF single terms over the normalized text
//! - two-word contextual phrases over the case-preserving text
//! - the first publication year found in the raw text

mod contextual;
mod stopwords;
mod tfidf;
mod year;

pub use contextual::ContextualExtractor;
pub use stopwords::StopWords;
pub use tfidf::{ScoringError, TfIdfModel};
pub use year::{UNKNOWN_YEAR, detect_year};

use tracing::{debug, instrument};

use crate::model::KeywordList;
use crate::normalize::{collapse_whitespace, normalize};

#[derive(Debug, Clone)]
pub struct DocumentKeywords {
    pub normalized_text: String,
    pub detected_year: String,
    pub tfidf: KeywordList,
    pub contextual: KeywordList,
}

#[derive(Debug, Clone)]
pub struct KeywordPipeline {
    stopwords: StopWords,
    contextual: ContextualExtractor,
    tfidf_top_n: usize,
    contextual_top_n: usize,
}

impl KeywordPipeline {
    pub fn new(tfidf_top_n: usize, contextual_top_n: usize) -> Self {
        let stopwords = StopWords::english();
        KeywordPipeline {
            contextual: ContextualExtractor::new(stopwords.clone()),
            stopwords,
            tfidf_top_n,
            contextual_top_n,
        }
    }

    pub fn tfidf_keywords(&self, normalized: &str) -> KeywordList {
        if normalized.trim().is_empty() {
            return KeywordList::empty();
        }
        match TfIdfModel::fit(&[normalized], &self.stopwords) {
            Ok(model) => KeywordList::ranked(
                model
                    .top_terms(0, self.tfidf_top_n)
                    .into_iter()
                    .map(|(term, _)| term)
                    .collect(),
            ),
            Err(e) => {
                debug!(error = %e, "tf-idf scoring degraded");
                KeywordList::degraded(e.to_string())
            }
        }
    }

    pub fn contextual_keywords(&self, text: &str) -> KeywordList {
        let collapsed = collapse_whitespace(text);
        if collapsed.is_empty() {
            return KeywordList::empty();
        }
        KeywordList::ranked(self.contextual.extract(&collapsed, self.contextual_top_n))
    }

    #[instrument(skip_all, fields(chars = raw_text.len()))]
    pub fn run(&self, raw_text: &str) -> DocumentKeywords {
        let normalized_text = normalize(raw_text);
        let tfidf = self.tfidf_keywords(&normalized_text);
        let contextual = self.contextual_keywords(raw_text);
        let detected_year = detect_year(raw_text);
        debug!(
            tfidf = tfidf.terms.len(),
            contextual = contextual.terms.len(),
            year = %detected_year,
            "keywords extracted"
        );

        DocumentKeywords {
            normalized_text,
            detected_year,
            tfidf,
            contextual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::KeywordOutcome;

    const TEXT: &str = "2022 Sustainability Report.\n\nOur carbon emissions fell in 2021. \
        Carbon pricing, carbon budgets and biodiversity targets guide lending. \
        Biodiversity loss is a material risk; carbon removal is funded.";

    #[test]
    fn test_empty_text() {
        let p = KeywordPipeline::new(10, 5);
        let out = p.run("   \n ");
        assert_eq!(out.tfidf.outcome, KeywordOutcome::Empty);
        assert_eq!(out.contextual.outcome, KeywordOutcome::Empty);
        assert!(out.tfidf.is_empty() && out.contextual.is_empty());
        assert_eq!(out.detected_year, UNKNOWN_YEAR);
    }

    #[test]
    fn test_stopword_only_text_degrades() {
        let p = KeywordPipeline::new(10, 5);
        let out = p.run("The and of it.");
        assert!(matches!(out.tfidf.outcome, KeywordOutcome::Degraded(_)));
        assert!(out.tfidf.terms.is_empty());
        assert_eq!(out.contextual.outcome, KeywordOutcome::Empty);
    }

    #[test]
    fn test_full_run() {
        let p = KeywordPipeline::new(10, 5);
        let out = p.run(TEXT);
        assert_eq!(out.detected_year, "2022");
        assert_eq!(out.tfidf.terms.first().map(String::as_str), Some("carbon"));
        assert!(out.tfidf.terms.len() <= 10);
        assert!(out.contextual.terms.len() <= 5);
        assert_eq!(out.tfidf.joined, out.tfidf.terms.join(", "));
        assert!(!out.normalized_text.contains('.'));
    }

    #[test]
    fn test_deterministic() {
        let p = KeywordPipeline::new(10, 5);
        let a = p.run(TEXT);
        let b = p.run(TEXT);
        assert_eq!(a.tfidf, b.tfidf);
        assert_eq!(a.contextual, b.contextual);
    }

    #[test]
    fn test_top_n_respected() {
        let p = KeywordPipeline::new(2, 1);
        let out = p.run(TEXT);
        assert_eq!(out.tfidf.terms.len(), 2);
        assert_eq!(out.contextual.terms.len(), 1);
    }
}
