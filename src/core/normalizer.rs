use once_cell::sync::Lazy;
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

/// English stopwords dropped from token sequences
static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and",
        "any", "are", "as", "at", "be", "because", "been", "before", "being", "below",
        "between", "both", "but", "by", "can", "could", "did", "do", "does", "doing", "down",
        "during", "each", "etc", "few", "for", "from", "further", "had", "has", "have",
        "having", "he", "her", "here", "hers", "him", "his", "how", "i", "if", "in", "into",
        "is", "it", "its", "itself", "just", "me", "more", "most", "my", "no", "nor", "not",
        "of", "off", "on", "once", "only", "or", "other", "our", "ours", "out", "over", "own",
        "same", "she", "should", "so", "some", "such", "than", "that", "the", "their",
        "theirs", "them", "then", "there", "these", "they", "this", "those", "through", "to",
        "too", "under", "until", "up", "very", "was", "we", "were", "what", "when", "where",
        "which", "while", "who", "whom", "why", "will", "with", "would", "you", "your",
        "yours",
    ]
    .into_iter()
    .collect()
});

/// Canonical form of a raw text block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedText {
    /// Lowercase text with collapsed whitespace
    pub canonical: String,
    /// Word tokens with stopwords removed, in text order
    pub tokens: Vec<String>,
}

impl NormalizedText {
    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }
}

/// Normalize raw extracted text into canonical text and tokens
///
/// Never fails; empty or whitespace-only input yields an empty result.
pub fn normalize(raw: &str) -> NormalizedText {
    let canonical = canonicalize(raw);
    let tokens = tokenize(&canonical);
    NormalizedText { canonical, tokens }
}

/// Lowercase, NFKC-fold and collapse whitespace
///
/// Control characters (form feeds, NULs and similar PDF extraction debris)
/// are treated as whitespace.
pub fn canonicalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;

    for c in raw.nfkc().flat_map(char::to_lowercase) {
        if c.is_whitespace() || c.is_control() {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(c);
    }

    out
}

/// Normalize a skill or phrase for set comparison
#[inline]
pub fn normalize_phrase(raw: &str) -> String {
    canonicalize(raw)
}

/// Split canonical text into word tokens, dropping stopwords
///
/// `+` and `#` are word characters so "c++" and "c#" survive, and a `.`
/// between alphanumerics is kept so "node.js" stays one token.
pub fn tokenize(canonical: &str) -> Vec<String> {
    raw_tokens(canonical)
        .filter(|t| !STOPWORDS.contains(t.as_str()))
        .collect()
}

/// Tokens including stopwords, used for phrase matching
pub(crate) fn raw_tokens(canonical: &str) -> impl Iterator<Item = String> + '_ {
    canonical
        .split(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#' || c == '.'))
        .map(|t| t.trim_matches('.'))
        .filter(|t| !t.is_empty() && t.chars().any(|c| c.is_alphanumeric()))
        .map(str::to_string)
}

pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        let n = normalize("");
        assert!(n.is_empty());
        assert!(n.tokens.is_empty());

        let n = normalize(" \t\n\u{c} ");
        assert!(n.is_empty());
    }

    #[test]
    fn test_collapses_whitespace_and_control_chars() {
        let n = normalize("  Senior\u{c}Rust\t\tEngineer \r\n\u{0}at  ACME ");
        assert_eq!(n.canonical, "senior rust engineer at acme");
    }

    #[test]
    fn test_nfkc_folding() {
        // Fullwidth letters and ligatures fold to ASCII
        assert_eq!(canonicalize("ＰＹＴＨＯＮ"), "python");
        assert_eq!(canonicalize("\u{fb01}nance"), "finance");
    }

    #[test]
    fn test_tokens_drop_stopwords() {
        let n = normalize("Built the data pipeline with Python and SQL");
        assert_eq!(n.tokens, vec!["built", "data", "pipeline", "python", "sql"]);
    }

    #[test]
    fn test_tokens_keep_symbols() {
        let n = normalize("Skills: C++, C#, Node.js.");
        assert_eq!(n.tokens, vec!["skills", "c++", "c#", "node.js"]);
    }
}
