//! Unsupervised two-word keyphrase extraction in the style of YAKE.
//!
//! Every term gets a weight `H` from five local statistics (casing, position,
//! frequency, relatedness to its neighbours, spread over sentences). A phrase
//! scores `∏H / (tf · (1 + ΣH))`; lower is more relevant. Terms are kept in
//! ordered maps so floating point sums do not depend on hash order.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use strsim::normalized_levenshtein;

use super::stopwords::StopWords;

const DEDUP_THRESHOLD: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Plain,
    Capitalized,
    Acronym,
    Number,
    Unusual,
}

impl Tag {
    fn is_word(self) -> bool {
        !matches!(self, Tag::Number | Tag::Unusual)
    }
}

#[derive(Debug, Clone)]
struct Token {
    term: String,
    tag: Tag,
}

/// Tokens between punctuation breaks inside one sentence.
#[derive(Debug)]
struct Chunk {
    sentence: usize,
    tokens: Vec<Token>,
}

#[derive(Debug, Default)]
struct TermStats {
    tf: f64,
    tf_acronym: f64,
    tf_capitalized: f64,
    sentences: Vec<usize>,
    left: BTreeSet<String>,
    left_total: usize,
    right: BTreeSet<String>,
    right_total: usize,
}

fn classify(word: &str, sentence_start: bool) -> Tag {
    let total = word.chars().count();
    let digits = word.chars().filter(|c| c.is_numeric()).count();
    let alpha = word.chars().filter(|c| c.is_alphabetic()).count();
    let special = total - digits - alpha;

    if digits > 0 && alpha == 0 {
        return Tag::Number;
    }
    if (digits > 0 && alpha > 0) || special > 1 {
        return Tag::Unusual;
    }
    if alpha > 1 && word.chars().filter(|c| c.is_alphabetic()).all(char::is_uppercase) {
        return Tag::Acronym;
    }
    if !sentence_start && word.chars().next().is_some_and(char::is_uppercase) {
        return Tag::Capitalized;
    }
    Tag::Plain
}

fn segment(text: &str) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut current = Vec::new();
    let mut sentence = 0;
    let mut sentence_start = true;

    let mut flush = |current: &mut Vec<Token>, sentence: usize| {
        if !current.is_empty() {
            chunks.push(Chunk {
                sentence,
                tokens: std::mem::take(current),
            });
        }
    };

    for raw in text.split_whitespace() {
        let word = raw.trim_matches(|c: char| !c.is_alphanumeric());
        let leading = raw.len() - raw.trim_start_matches(|c: char| !c.is_alphanumeric()).len();
        let trailing = &raw[raw.trim_end_matches(|c: char| !c.is_alphanumeric()).len()..];
        let ends_sentence = trailing.contains(['.', '!', '?']);

        if word.is_empty() {
            flush(&mut current, sentence);
        } else {
            if leading > 0 {
                flush(&mut current, sentence);
            }
            current.push(Token {
                term: word.to_lowercase(),
                tag: classify(word, sentence_start),
            });
            sentence_start = false;
            if !trailing.is_empty() {
                flush(&mut current, sentence);
            }
        }

        if ends_sentence && !sentence_start {
            flush(&mut current, sentence);
            sentence += 1;
            sentence_start = true;
        }
    }
    flush(&mut current, sentence);

    chunks
}

fn collect_stats(chunks: &[Chunk]) -> BTreeMap<String, TermStats> {
    let mut stats: BTreeMap<String, TermStats> = BTreeMap::new();

    for chunk in chunks {
        for (i, token) in chunk.tokens.iter().enumerate() {
            if !token.tag.is_word() {
                continue;
            }
            let entry = stats.entry(token.term.clone()).or_default();
            entry.tf += 1.0;
            match token.tag {
                Tag::Acronym => entry.tf_acronym += 1.0,
                Tag::Capitalized => entry.tf_capitalized += 1.0,
                _ => {}
            }
            entry.sentences.push(chunk.sentence);

            if i == 0 {
                continue;
            }
            let prev = &chunk.tokens[i - 1];
            if !prev.tag.is_word() {
                continue;
            }
            entry.left.insert(prev.term.clone());
            entry.left_total += 1;
            let prev_entry = stats.entry(prev.term.clone()).or_default();
            prev_entry.right.insert(token.term.clone());
            prev_entry.right_total += 1;
        }
    }

    stats
}

fn median(sorted: &[usize]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) as f64 / 2.0
    } else {
        sorted[mid] as f64
    }
}

/// Per-term weight `H`. Lower means more important.
fn term_weights(stats: &BTreeMap<String, TermStats>, stopwords: &StopWords, sentence_count: usize) -> BTreeMap<String, f64> {
    let content: Vec<f64> = stats
        .iter()
        .filter(|(term, _)| !stopwords.contains(term))
        .map(|(_, s)| s.tf)
        .collect();
    if content.is_empty() {
        return BTreeMap::new();
    }

    let mean = content.iter().sum::<f64>() / content.len() as f64;
    let std = (content.iter().map(|tf| (tf - mean).powi(2)).sum::<f64>() / content.len() as f64).sqrt();
    let max_tf = content.iter().cloned().fold(0.0, f64::max);

    stats
        .iter()
        .map(|(term, s)| {
            let casing = s.tf_acronym.max(s.tf_capitalized) / (1.0 + s.tf.ln());

            let mut sentences = s.sentences.clone();
            sentences.sort_unstable();
            let position = (3.0 + median(&sentences)).ln().ln();

            let frequency = s.tf / (mean + std);

            let left = if s.left_total > 0 {
                s.left.len() as f64 / s.left_total as f64
            } else {
                0.0
            };
            let right = if s.right_total > 0 {
                s.right.len() as f64 / s.right_total as f64
            } else {
                0.0
            };
            let relatedness = 1.0 + (left + right) * s.tf / max_tf;

            sentences.dedup();
            let spread = sentences.len() as f64 / sentence_count.max(1) as f64;

            let h = (position * relatedness) / (casing + frequency / relatedness + spread / relatedness);
            (term.clone(), h)
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct ContextualExtractor {
    stopwords: StopWords,
}

impl ContextualExtractor {
    pub fn new(stopwords: StopWords) -> Self {
        ContextualExtractor { stopwords }
    }

    fn candidate_ok(&self, a: &Token, b: &Token) -> bool {
        a.tag.is_word()
            && b.tag.is_word()
            && a.term != b.term
            && a.term.chars().count() > 1
            && b.term.chars().count() > 1
            && !self.stopwords.contains(&a.term)
            && !self.stopwords.contains(&b.term)
    }

    /// Up to `n` two-word phrases with their scores, most relevant first.
    pub fn extract_scored(&self, text: &str, n: usize) -> Vec<(String, f64)> {
        if text.trim().is_empty() || n == 0 {
            return vec![];
        }

        let chunks = segment(text);
        let sentence_count = chunks.iter().map(|c| c.sentence + 1).max().unwrap_or(0);
        let stats = collect_stats(&chunks);
        let weights = term_weights(&stats, &self.stopwords, sentence_count);

        let mut counts: BTreeMap<(String, String), f64> = BTreeMap::new();
        for chunk in &chunks {
            for pair in chunk.tokens.windows(2) {
                if self.candidate_ok(&pair[0], &pair[1]) {
                    *counts
                        .entry((pair[0].term.clone(), pair[1].term.clone()))
                        .or_insert(0.0) += 1.0;
                }
            }
        }

        let mut scored: Vec<(String, f64)> = counts
            .into_iter()
            .filter_map(|((a, b), tf)| {
                let ha = *weights.get(&a)?;
                let hb = *weights.get(&b)?;
                let score = (ha * hb) / (tf * (1.0 + ha + hb));
                Some((format!("{a} {b}"), score))
            })
            .collect();
        scored.sort_by(|x, y| {
            x.1.partial_cmp(&y.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| x.0.cmp(&y.0))
        });

        let mut selected: Vec<(String, f64)> = Vec::with_capacity(n);
        for (phrase, score) in scored {
            if selected
                .iter()
                .any(|(kept, _)| normalized_levenshtein(kept, &phrase) > DEDUP_THRESHOLD)
            {
                continue;
            }
            selected.push((phrase, score));
            if selected.len() == n {
                break;
            }
        }
        selected
    }

    pub fn extract(&self, text: &str, n: usize) -> Vec<String> {
        self.extract_scored(text, n).into_iter().map(|(p, _)| p).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = "Climate risk shapes lending decisions. The bank measures climate risk \
        across corporate portfolios. Climate risk disclosures follow supervisory guidance. \
        Green bonds fund renewable projects.";

    fn extractor() -> ContextualExtractor {
        ContextualExtractor::new(StopWords::english())
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        assert!(extractor().extract("", 5).is_empty());
        assert!(extractor().extract(" \n\t ", 5).is_empty());
    }

    #[test]
    fn test_repeated_phrase_is_found() {
        let phrases = extractor().extract(REPORT, 5);
        assert!(phrases.contains(&"climate risk".to_string()), "{phrases:?}");
        assert_eq!(phrases.len(), 5);
    }

    #[test]
    fn test_limit_respected() {
        assert_eq!(extractor().extract(REPORT, 2).len(), 2);
        assert!(extractor().extract(REPORT, 0).is_empty());
    }

    #[test]
    fn test_phrases_are_two_content_words() {
        let sw = StopWords::english();
        for phrase in extractor().extract(REPORT, 5) {
            let words: Vec<&str> = phrase.split(' ').collect();
            assert_eq!(words.len(), 2, "{phrase}");
            assert!(!sw.contains(words[0]) && !sw.contains(words[1]), "{phrase}");
        }
    }

    #[test]
    fn test_scores_ascending_and_deterministic() {
        let ex = extractor();
        let first = ex.extract_scored(REPORT, 5);
        let second = ex.extract_scored(REPORT, 5);
        assert_eq!(first, second);
        assert!(first.windows(2).all(|w| w[0].1 <= w[1].1));
    }

    #[test]
    fn test_phrases_do_not_cross_sentences_or_punctuation() {
        let phrases = extractor().extract("Carbon budget. Portfolio alignment, transition finance", 10);
        assert!(!phrases.contains(&"budget portfolio".to_string()));
        assert!(!phrases.contains(&"alignment transition".to_string()));
        assert!(phrases.contains(&"carbon budget".to_string()));
        assert!(phrases.contains(&"transition finance".to_string()));
    }

    #[test]
    fn test_numbers_break_candidates() {
        let phrases = extractor().extract("scope 3 emissions", 5);
        assert!(phrases.is_empty());
    }

    #[test]
    fn test_near_duplicates_removed() {
        let phrases = extractor().extract(
            "Physical risk assessment. Physical risks assessment. Transition plan review.",
            10,
        );
        let physical = phrases.iter().filter(|p| p.starts_with("physical")).count();
        assert_eq!(physical, 1, "{phrases:?}");
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("ESG", false), Tag::Acronym);
        assert_eq!(classify("Basel", false), Tag::Capitalized);
        assert_eq!(classify("Basel", true), Tag::Plain);
        assert_eq!(classify("2023", false), Tag::Number);
        assert_eq!(classify("CO2", false), Tag::Unusual);
        assert_eq!(classify("net-zero", false), Tag::Plain);
    }

    #[test]
    fn test_plural_counts_as_duplicate() {
        assert!(normalized_levenshtein("climate risk", "climate risks") > DEDUP_THRESHOLD);
        assert!(normalized_levenshtein("climate risk", "carbon budget") < DEDUP_THRESHOLD);
    }
}
