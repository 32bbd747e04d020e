//! Term frequency / inverse document frequency scoring.
//!
//! Tokens are runs of at least two word characters. IDF is smoothed,
//! `ln((1 + n) / (1 + df)) + 1`, and each document vector is L2 normalized.
//! With a single document every IDF is 1 and ranking follows raw counts.

use std::cmp::Ordering;
use std::collections::HashMap;

use thiserror::Error;

use super::stopwords::StopWords;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    #[error("empty vocabulary; the text only contains stop words")]
    EmptyVocabulary,
}

#[derive(Debug, Clone)]
pub struct TfIdfModel {
    documents: Vec<Vec<(String, f64)>>,
}

fn tokenize<'a>(text: &'a str, stopwords: &'a StopWords) -> impl Iterator<Item = String> + 'a {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| t.chars().count() >= 2)
        .map(str::to_lowercase)
        .filter(|t| !stopwords.contains(t))
}

fn rank(a: &(String, f64), b: &(String, f64)) -> Ordering {
    b.1.partial_cmp(&a.1)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.0.cmp(&b.0))
}

impl TfIdfModel {
    pub fn fit(documents: &[&str], stopwords: &StopWords) -> Result<Self, ScoringError> {
        let counts: Vec<HashMap<String, usize>> = documents
            .iter()
            .map(|doc| {
                let mut tf = HashMap::new();
                for token in tokenize(doc, stopwords) {
                    *tf.entry(token).or_insert(0) += 1;
                }
                tf
            })
            .collect();

        let mut df: HashMap<String, usize> = HashMap::new();
        for tf in &counts {
            for term in tf.keys() {
                *df.entry(term.clone()).or_insert(0) += 1;
            }
        }
        if df.is_empty() {
            return Err(ScoringError::EmptyVocabulary);
        }

        let n = documents.len() as f64;
        let idf: HashMap<String, f64> = df
            .into_iter()
            .map(|(term, df)| {
                let weight = ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0;
                (term, weight)
            })
            .collect();

        let documents = counts
            .into_iter()
            .map(|tf| {
                let mut scores: Vec<(String, f64)> = tf
                    .into_iter()
                    .map(|(term, count)| {
                        let score = count as f64 * idf[&term];
                        (term, score)
                    })
                    .collect();
                let norm = scores.iter().map(|(_, s)| s * s).sum::<f64>().sqrt();
                if norm > 0.0 {
                    for (_, s) in scores.iter_mut() {
                        *s /= norm;
                    }
                }
                scores.sort_by(rank);
                scores
            })
            .collect();

        Ok(TfIdfModel { documents })
    }

    /// Highest scoring terms of one document, ties broken alphabetically.
    pub fn top_terms(&self, document: usize, n: usize) -> Vec<(String, f64)> {
        self.documents
            .get(document)
            .map(|scores| scores.iter().take(n).cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(model: &TfIdfModel, doc: usize, n: usize) -> Vec<String> {
        model.top_terms(doc, n).into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn test_single_document_ranks_by_frequency() {
        let sw = StopWords::english();
        let text = "carbon carbon carbon emissions emissions biodiversity";
        let model = TfIdfModel::fit(&[text], &sw).unwrap();
        assert_eq!(terms(&model, 0, 10), vec!["carbon", "emissions", "biodiversity"]);
    }

    #[test]
    fn test_ties_break_alphabetically() {
        let sw = StopWords::english();
        let model = TfIdfModel::fit(&["taxonomy carbon biodiversity"], &sw).unwrap();
        assert_eq!(terms(&model, 0, 10), vec!["biodiversity", "carbon", "taxonomy"]);
    }

    #[test]
    fn test_scores_are_l2_normalized() {
        let sw = StopWords::english();
        let model = TfIdfModel::fit(&["carbon carbon carbon carbon emissions emissions emissions"], &sw).unwrap();
        let scores = model.top_terms(0, 2);
        assert!((scores[0].1 - 0.8).abs() < 1e-9);
        assert!((scores[1].1 - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_stopwords_and_short_tokens_dropped() {
        let sw = StopWords::english();
        let model = TfIdfModel::fit(&["the a of x y carbon"], &sw).unwrap();
        assert_eq!(terms(&model, 0, 10), vec!["carbon"]);
    }

    #[test]
    fn test_only_stopwords_is_empty_vocabulary() {
        let sw = StopWords::english();
        let err = TfIdfModel::fit(&["the and of it is"], &sw).unwrap_err();
        assert_eq!(err, ScoringError::EmptyVocabulary);
    }

    #[test]
    fn test_idf_penalizes_shared_terms() {
        let sw = StopWords::english();
        let model = TfIdfModel::fit(&["carbon biodiversity", "carbon taxonomy"], &sw).unwrap();
        assert_eq!(terms(&model, 0, 1), vec!["biodiversity"]);
        assert_eq!(terms(&model, 1, 1), vec!["taxonomy"]);
        assert!(model.top_terms(2, 5).is_empty());
    }
}
