//! Typed sentiment lexicon
//!
//! Lexicons are TOML documents: banded positive/negative terms, idiomatic
//! expressions, modifiers (intensifiers, diminishers, negations) and nuance
//! cues. The French press lexicon is embedded; custom lexicons can be read
//! from disk or assembled with [`Lexicon::builder`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::debug;

use crate::ScoringError;

const EMBEDDED_FRENCH: &str = include_str!("../lexicons/fr.toml");

/// Polarity carried by a lexicon term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    pub fn opposite(self) -> Self {
        match self {
            Polarity::Positive => Polarity::Negative,
            Polarity::Negative => Polarity::Positive,
        }
    }
}

/// Intensity band of a term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Strong,
    Moderate,
    Weak,
    Expression,
}

impl Band {
    pub fn weight(self) -> f64 {
        match self {
            Band::Strong => 3.0,
            Band::Moderate => 2.0,
            Band::Weak => 1.0,
            Band::Expression => 2.5,
        }
    }
}

/// A single scored term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexiconEntry {
    pub term: String,
    pub weight: f64,
    pub band: Band,
    pub polarity: Polarity,
}

/// Words that modify nearby matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Intensifier,
    Diminisher,
    Negation,
}

/// Text-level emotional nuances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nuance {
    Irony,
    Ambivalence,
    Uncertainty,
    Urgency,
}

impl fmt::Display for Nuance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Nuance::Irony => write!(f, "irony"),
            Nuance::Ambivalence => write!(f, "ambivalence"),
            Nuance::Uncertainty => write!(f, "uncertainty"),
            Nuance::Urgency => write!(f, "urgency"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct LexiconFile {
    lexicon: LexiconMetadata,
    #[serde(default)]
    positive: BandLists,
    #[serde(default)]
    negative: BandLists,
    #[serde(default)]
    expressions: ExpressionLists,
    #[serde(default)]
    modifiers: ModifierLists,
    #[serde(default)]
    nuances: NuanceLists,
}

/// Identity of a lexicon document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexiconMetadata {
    pub id: String,
    pub name: String,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "fr".to_string()
}

impl Default for LexiconMetadata {
    fn default() -> Self {
        Self {
            id: "custom".to_string(),
            name: "Custom lexicon".to_string(),
            language: default_language(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct BandLists {
    #[serde(default)]
    strong: Vec<String>,
    #[serde(default)]
    moderate: Vec<String>,
    #[serde(default)]
    weak: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ExpressionLists {
    #[serde(default)]
    positive: Vec<String>,
    #[serde(default)]
    negative: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ModifierLists {
    #[serde(default)]
    intensifiers: Vec<String>,
    #[serde(default)]
    diminishers: Vec<String>,
    #[serde(default)]
    negations: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct NuanceLists {
    #[serde(default)]
    irony: Vec<String>,
    #[serde(default)]
    ambivalence: Vec<String>,
    #[serde(default)]
    uncertainty: Vec<String>,
    #[serde(default)]
    urgency: Vec<String>,
}

/// A lexicon term located in lower-cased text (byte offsets)
#[derive(Debug, Clone, Copy)]
pub struct TermMatch<'a> {
    pub start: usize,
    pub end: usize,
    pub entry: &'a LexiconEntry,
}

/// Compiled lexicon
///
/// Every matcher runs on lower-cased text.
#[derive(Debug, Clone)]
pub struct Lexicon {
    metadata: LexiconMetadata,
    entries: HashMap<String, LexiconEntry>,
    terms: Regex,
    modifiers: HashMap<Modifier, Regex>,
    nuances: HashMap<Nuance, Regex>,
}

impl Lexicon {
    /// Parse and compile a TOML lexicon
    pub fn from_toml(source: &str) -> Result<Self, ScoringError> {
        let file: LexiconFile = toml::from_str(source)?;
        let mut builder = Self::builder().metadata(file.lexicon);

        for (polarity, lists) in [
            (Polarity::Positive, &file.positive),
            (Polarity::Negative, &file.negative),
        ] {
            for (band, terms) in [
                (Band::Strong, &lists.strong),
                (Band::Moderate, &lists.moderate),
                (Band::Weak, &lists.weak),
            ] {
                for term in terms {
                    builder = builder.term(term, band, polarity);
                }
            }
        }
        for term in &file.expressions.positive {
            builder = builder.term(term, Band::Expression, Polarity::Positive);
        }
        for term in &file.expressions.negative {
            builder = builder.term(term, Band::Expression, Polarity::Negative);
        }

        for (modifier, terms) in [
            (Modifier::Intensifier, &file.modifiers.intensifiers),
            (Modifier::Diminisher, &file.modifiers.diminishers),
            (Modifier::Negation, &file.modifiers.negations),
        ] {
            for term in terms {
                builder = builder.modifier(modifier, term);
            }
        }

        for (nuance, cues) in [
            (Nuance::Irony, &file.nuances.irony),
            (Nuance::Ambivalence, &file.nuances.ambivalence),
            (Nuance::Uncertainty, &file.nuances.uncertainty),
            (Nuance::Urgency, &file.nuances.urgency),
        ] {
            for cue in cues {
                builder = builder.nuance(nuance, cue);
            }
        }

        builder.build()
    }

    /// The embedded French press lexicon
    pub fn french() -> Result<Self, ScoringError> {
        Self::from_toml(EMBEDDED_FRENCH)
    }

    /// Load a lexicon from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScoringError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn builder() -> LexiconBuilder {
        LexiconBuilder::default()
    }

    pub fn metadata(&self) -> &LexiconMetadata {
        &self.metadata
    }

    /// Look up a term, accepting a plural "s"/"x"
    pub fn entry(&self, term: &str) -> Option<&LexiconEntry> {
        let lower = term.to_lowercase();
        self.entries.get(&lower).or_else(|| {
            lower
                .strip_suffix('s')
                .or_else(|| lower.strip_suffix('x'))
                .and_then(|stem| self.entries.get(stem))
        })
    }

    /// Number of sentiment terms
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every non-overlapping term occurrence, leftmost-longest first
    pub fn find_terms<'a>(&'a self, lower: &str) -> Vec<TermMatch<'a>> {
        self.terms
            .captures_iter(lower)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let stem = caps.get(1)?;
                let entry = self.entries.get(stem.as_str())?;
                Some(TermMatch {
                    start: whole.start(),
                    end: whole.end(),
                    entry,
                })
            })
            .collect()
    }

    /// Occurrences of a modifier class in lower-cased text
    pub fn count_modifier(&self, modifier: Modifier, lower: &str) -> usize {
        self.modifiers
            .get(&modifier)
            .map(|re| re.find_iter(lower).count())
            .unwrap_or(0)
    }

    /// Whether any cue of a nuance occurs in lower-cased text
    pub fn has_nuance(&self, nuance: Nuance, lower: &str) -> bool {
        self.nuances
            .get(&nuance)
            .is_some_and(|re| re.is_match(lower))
    }
}

/// Incremental lexicon construction
#[derive(Debug, Clone, Default)]
pub struct LexiconBuilder {
    metadata: LexiconMetadata,
    entries: Vec<LexiconEntry>,
    modifiers: HashMap<Modifier, Vec<String>>,
    nuances: HashMap<Nuance, Vec<String>>,
}

impl LexiconBuilder {
    pub fn metadata(mut self, metadata: LexiconMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Add a term; a later duplicate replaces the earlier one
    pub fn term(mut self, term: &str, band: Band, polarity: Polarity) -> Self {
        self.entries.push(LexiconEntry {
            term: term.trim().to_lowercase(),
            weight: band.weight(),
            band,
            polarity,
        });
        self
    }

    pub fn positive(self, term: &str, band: Band) -> Self {
        self.term(term, band, Polarity::Positive)
    }

    pub fn negative(self, term: &str, band: Band) -> Self {
        self.term(term, band, Polarity::Negative)
    }

    pub fn modifier(mut self, modifier: Modifier, term: &str) -> Self {
        self.modifiers
            .entry(modifier)
            .or_default()
            .push(term.trim().to_lowercase());
        self
    }

    pub fn intensifier(self, term: &str) -> Self {
        self.modifier(Modifier::Intensifier, term)
    }

    pub fn diminisher(self, term: &str) -> Self {
        self.modifier(Modifier::Diminisher, term)
    }

    pub fn negation(self, term: &str) -> Self {
        self.modifier(Modifier::Negation, term)
    }

    pub fn nuance(mut self, nuance: Nuance, cue: &str) -> Self {
        self.nuances
            .entry(nuance)
            .or_default()
            .push(cue.trim().to_lowercase());
        self
    }

    /// Compile matchers
    pub fn build(self) -> Result<Lexicon, ScoringError> {
        let mut entries = HashMap::new();
        for entry in self.entries.into_iter().filter(|e| !e.term.is_empty()) {
            entries.insert(entry.term.clone(), entry);
        }
        if entries.is_empty() {
            return Err(ScoringError::EmptyLexicon);
        }

        let keys: Vec<&String> = entries.keys().collect();
        let terms = Regex::new(&format!(r"\b({})(?:s|x)?\b", alternation_body(&keys)))?;

        let mut modifiers = HashMap::new();
        for (modifier, words) in &self.modifiers {
            if let Some(re) = word_matcher(words)? {
                modifiers.insert(*modifier, re);
            }
        }

        let mut nuances = HashMap::new();
        for (nuance, cues) in &self.nuances {
            if let Some(re) = word_matcher(cues)? {
                nuances.insert(*nuance, re);
            }
        }

        debug!(
            lexicon = %self.metadata.id,
            terms = entries.len(),
            modifiers = modifiers.len(),
            nuances = nuances.len(),
            "lexicon compiled"
        );

        Ok(Lexicon {
            metadata: self.metadata,
            entries,
            terms,
            modifiers,
            nuances,
        })
    }
}

/// Escaped alternation, longest terms first so multi-word expressions win
fn alternation_body<S: AsRef<str>>(terms: &[S]) -> String {
    let mut sorted: Vec<&str> = terms.iter().map(|t| t.as_ref()).collect();
    sorted.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
    sorted.dedup();
    sorted
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|")
}

fn word_matcher(words: &[String]) -> Result<Option<Regex>, ScoringError> {
    let words: Vec<&String> = words.iter().filter(|w| !w.is_empty()).collect();
    if words.is_empty() {
        return Ok(None);
    }
    Ok(Some(Regex::new(&format!(r"\b(?:{})\b", alternation_body(&words)))?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_embedded_french() {
        let lexicon = Lexicon::french().unwrap();
        assert_eq!(lexicon.metadata().id, "fr-news");
        assert!(lexicon.len() > 100);

        let succes = lexicon.entry("succès").unwrap();
        assert_eq!(succes.band, Band::Strong);
        assert_eq!(succes.polarity, Polarity::Positive);
        assert_eq!(succes.weight, 3.0);

        assert_eq!(lexicon.entry("victoires").unwrap().term, "victoire");
        assert_eq!(lexicon.entry("coup dur").unwrap().band, Band::Expression);
        assert!(lexicon.entry("entreprise").is_none());
    }

    #[test]
    fn test_find_terms_prefers_expressions() {
        let lexicon = Lexicon::french().unwrap();
        let text = "une sortie de crise se dessine";
        let matches = lexicon.find_terms(text);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].entry.term, "sortie de crise");
        assert_eq!(matches[0].entry.polarity, Polarity::Positive);
    }

    #[test]
    fn test_find_terms_whole_words_and_plurals() {
        let lexicon = Lexicon::builder()
            .positive("bon", Band::Weak)
            .negative("crise", Band::Strong)
            .build()
            .unwrap();

        let matches = lexicon.find_terms("bonjour, deux crises et un bon point");
        let terms: Vec<_> = matches.iter().map(|m| m.entry.term.as_str()).collect();
        assert_eq!(terms, vec!["crise", "bon"]);
    }

    #[test]
    fn test_modifiers_and_nuances() {
        let lexicon = Lexicon::builder()
            .positive("succès", Band::Strong)
            .negation("pas")
            .negation("jamais")
            .intensifier("très")
            .nuance(Nuance::Urgency, "urgence")
            .build()
            .unwrap();

        assert_eq!(lexicon.count_modifier(Modifier::Negation, "pas de pas, jamais"), 3);
        assert_eq!(lexicon.count_modifier(Modifier::Negation, "passage"), 0);
        assert_eq!(lexicon.count_modifier(Modifier::Diminisher, "peu"), 0);
        assert!(lexicon.has_nuance(Nuance::Urgency, "état d'urgence"));
        assert!(!lexicon.has_nuance(Nuance::Irony, "état d'urgence"));
    }

    #[test]
    fn test_empty_lexicon_rejected() {
        let err = Lexicon::builder().intensifier("très").build().unwrap_err();
        assert!(matches!(err, ScoringError::EmptyLexicon));
    }

    #[test]
    fn test_custom_toml() {
        let lexicon = Lexicon::from_toml(
            r#"
[lexicon]
id = "mini"
name = "Mini"

[positive]
strong = ["génial"]

[negative]
weak = ["bof"]
"#,
        )
        .unwrap();
        assert_eq!(lexicon.len(), 2);
        assert_eq!(lexicon.metadata().language, "fr");
        assert_eq!(lexicon.entry("bof").unwrap().polarity, Polarity::Negative);
    }
}
