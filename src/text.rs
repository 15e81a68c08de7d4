//! Term normalization shared by the query builder, scorer and parser.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// English function words that carry no topical signal.
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "etc", "few",
    "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers",
    "herself", "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its",
    "itself", "just", "me", "more", "most", "my", "myself", "need", "needs", "no", "nor", "not",
    "now", "of", "off", "on", "once", "only", "or", "other", "our", "ours", "ourselves", "out",
    "over", "own", "same", "she", "should", "so", "some", "such", "than", "that", "the", "their",
    "theirs", "them", "themselves", "then", "there", "these", "they", "this", "those", "through",
    "to", "too", "under", "until", "up", "us", "very", "was", "we", "were", "what", "when",
    "where", "which", "while", "who", "whom", "why", "will", "with", "would", "you", "your",
    "yours", "yourself", "yourselves",
];

static BULLET_ONLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\s\d.,:;()\[\]\-–—•●○◦▪■□►▸*#/|]*$").expect("bullet pattern is valid")
});

static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?。！？]+[\s]+").expect("sentence pattern is valid"));

/// Whether `word` is a stop word. Expects lowercase input.
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.binary_search(&word).is_ok()
}

/// Split text into normalized terms, in order of appearance.
///
/// NFKC-normalizes, lowercases, splits on anything that is not
/// alphanumeric, and drops stop words and single-character tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized: String = text.nfkc().collect::<String>().to_lowercase();
    normalized
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2 && !is_stop_word(t))
        .map(str::to_string)
        .collect()
}

/// Distinct terms of `text` together with the total term count.
pub fn term_set(text: &str) -> (BTreeSet<String>, usize) {
    let terms = tokenize(text);
    let total = terms.len();
    (terms.into_iter().collect(), total)
}

/// Whether the text consists only of digits, bullets and punctuation.
///
/// Page numbers, list markers and section numbers on their own line must
/// never become headings.
pub fn is_marker_only(text: &str) -> bool {
    BULLET_ONLY.is_match(text.trim())
}

/// Split text into sentences, keeping terminal punctuation attached.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for m in SENTENCE_END.find_iter(text) {
        let sentence = text[start..m.end()].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        start = m.end();
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

/// Collapse runs of whitespace into single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
