//! Text helpers shared by semantic analysis, scoring and validation

use std::collections::HashSet;

/// A sentence located in its source text (byte offsets)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentenceSpan<'a> {
    pub start: usize,
    pub end: usize,
    pub text: &'a str,
}

/// Collapse runs of whitespace into single spaces
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split text into trimmed, non-empty sentences
pub fn sentences(text: &str) -> Vec<SentenceSpan<'_>> {
    let mut spans = Vec::new();
    let mut start = 0;

    for (idx, c) in text.char_indices() {
        if c == '.' && is_initial(&text[..idx]) {
            continue;
        }
        if matches!(c, '.' | '!' | '?' | '\n' | '…') {
            let end = idx + c.len_utf8();
            push_trimmed(text, start, end, &mut spans);
            start = end;
        }
    }
    push_trimmed(text, start, text.len(), &mut spans);

    spans
}

/// Does `head` end with a lone capital, as in "M." or "J. Martin"?
fn is_initial(head: &str) -> bool {
    let mut rev = head.chars().rev();
    match (rev.next(), rev.next()) {
        (Some(last), before) => last.is_uppercase() && !before.is_some_and(char::is_alphanumeric),
        (None, _) => false,
    }
}

fn push_trimmed<'a>(text: &'a str, start: usize, end: usize, spans: &mut Vec<SentenceSpan<'a>>) {
    let raw = &text[start..end];
    let leading = raw.len() - raw.trim_start().len();
    let trimmed = raw.trim();
    if trimmed.chars().any(|c| c.is_alphanumeric()) {
        let s = start + leading;
        spans.push(SentenceSpan {
            start: s,
            end: s + trimmed.len(),
            text: trimmed,
        });
    }
}

/// Word tokens (letters, digits and inner hyphens)
pub fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '-'))
        .map(|w| w.trim_matches('-'))
        .filter(|w| !w.is_empty())
}

pub fn word_count(text: &str) -> usize {
    words(text).count()
}

/// Lower-cased whitespace tokens, used for Jaccard similarity
pub fn token_set(text: &str) -> HashSet<String> {
    text.split_whitespace().map(|t| t.to_lowercase()).collect()
}

/// Jaccard similarity of two token sets
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let inter = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    if union == 0.0 {
        0.0
    } else {
        inter / union
    }
}

/// Byte range extending `[start, end)` by `radius` characters on each side,
/// kept within `[lower, upper)`
pub fn window(text: &str, start: usize, end: usize, radius: usize, lower: usize, upper: usize) -> (usize, usize) {
    let upper = upper.min(text.len());
    let start = start.clamp(lower, upper);
    let end = end.clamp(start, upper);

    let from = text[lower..start]
        .char_indices()
        .rev()
        .take(radius)
        .last()
        .map(|(i, _)| lower + i)
        .unwrap_or(start);
    let to = text[end..upper]
        .char_indices()
        .nth(radius)
        .map(|(i, _)| end + i)
        .unwrap_or(upper);

    (from, to)
}

/// Surrounding snippet of a match, whitespace-normalized
pub fn snippet(text: &str, start: usize, end: usize, radius: usize) -> String {
    let (from, to) = window(text, start, end, radius, 0, text.len());
    normalize_whitespace(&text[from..to])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentences_split_and_offsets() {
        let text = "Première phrase. Deuxième phrase !  Troisième";
        let spans = sentences(text);
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[0].text, "Première phrase.");
        assert_eq!(spans[1].text, "Deuxième phrase !");
        assert_eq!(&text[spans[2].start..spans[2].end], "Troisième");
    }

    #[test]
    fn test_sentences_keep_initials() {
        let spans = sentences("Hier M. Dupont est venu. Il repart.");
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text, "Hier M. Dupont est venu.");
    }

    #[test]
    fn test_sentences_skip_punctuation_only() {
        assert!(sentences("...  !!").is_empty());
    }

    #[test]
    fn test_words_split_apostrophes() {
        let tokens: Vec<_> = words("Ce n'est pas l'avis de Jean-Pierre.").collect();
        assert_eq!(tokens, vec!["Ce", "n", "est", "pas", "l", "avis", "de", "Jean-Pierre"]);
    }

    #[test]
    fn test_window_respects_char_boundaries() {
        let text = "ééééé succès ééééé";
        let start = text.find("succès").unwrap();
        let (from, to) = window(text, start, start + "succès".len(), 3, 0, text.len());
        assert_eq!(&text[from..to], "éé succès éé");
    }

    #[test]
    fn test_jaccard() {
        let a = token_set("le chat dort");
        let b = token_set("Le chat mange");
        assert!((jaccard(&a, &b) - 0.5).abs() < 1e-9);
    }
}
