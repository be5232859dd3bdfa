//! Cheap "is this worth a point" heuristic.
//!
//! A line is meaningful when it has at least [`MIN_WORDS`] words and is not a
//! near-repeat of recent chat. Similarity is TF-IDF cosine over word tokens of two
//! or more characters, with smoothed IDF and L2-normalised vectors, computed over
//! the recent lines plus the candidate.

use std::collections::{HashMap, HashSet};

pub const MIN_WORDS: usize = 3;

pub fn is_meaningful(text: &str, history: &[String], threshold: f64) -> bool {
    if text.split_whitespace().count() < MIN_WORDS {
        return false;
    }
    if history.is_empty() {
        return true;
    }
    max_similarity(text, history) <= threshold
}

/// Highest cosine similarity between `text` and any line of `history`.
pub fn max_similarity(text: &str, history: &[String]) -> f64 {
    let mut docs: Vec<Vec<String>> = history.iter().map(|h| tokenize(h)).collect();
    docs.push(tokenize(text));

    let n = docs.len() as f64;
    let mut doc_freq: HashMap<&str, usize> = HashMap::new();
    for doc in &docs {
        let unique: HashSet<&str> = doc.iter().map(String::as_str).collect();
        for term in unique {
            *doc_freq.entry(term).or_insert(0) += 1;
        }
    }

    let idf = |term: &str| -> f64 {
        let df = doc_freq.get(term).copied().unwrap_or(0) as f64;
        ((1.0 + n) / (1.0 + df)).ln() + 1.0
    };

    let vectors: Vec<HashMap<&str, f64>> = docs
        .iter()
        .map(|doc| {
            let mut tf: HashMap<&str, f64> = HashMap::new();
            for term in doc {
                *tf.entry(term.as_str()).or_insert(0.0) += 1.0;
            }
            let mut weighted: HashMap<&str, f64> =
                tf.into_iter().map(|(t, c)| (t, c * idf(t))).collect();
            let norm = weighted.values().map(|w| w * w).sum::<f64>().sqrt();
            if norm > 0.0 {
                for w in weighted.values_mut() {
                    *w /= norm;
                }
            }
            weighted
        })
        .collect();

    let (candidate, rest) = match vectors.split_last() {
        Some(split) => split,
        None => return 0.0,
    };

    rest.iter()
        .map(|other| {
            candidate
                .iter()
                .filter_map(|(term, w)| other.get(term).map(|o| w * o))
                .sum::<f64>()
        })
        .fold(0.0, f64::max)
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|t| t.chars().count() >= 2)
        .map(|t| t.to_lowercase())
        .collect()
}
