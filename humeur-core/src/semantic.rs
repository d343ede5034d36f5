//! Semantic analysis of French news text
//!
//! Extracts, from raw text:
//! - Named entities: persons, places, organizations
//! - Topics from a fixed keyword taxonomy
//! - Pairwise relations between entities sharing a sentence
//! - Per-topic sentence sentiment tallies
//! - Key phrases and a semantic density indicator
//!
//! All word lists and patterns come from [`SemanticConfig`], so tests can
//! swap in a minimal configuration.

use regex::Regex;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use tracing::debug;

use crate::text::{self, SentenceSpan};
use crate::{
    CoreError, EntityType, SemanticAnalysis, SemanticEntity, SemanticRelation, Sentiment,
    TopicSentiment, MAX_ENTITIES, MAX_KEY_PHRASES, MAX_RELATIONS,
};

const EMBEDDED_FRENCH: &str = include_str!("../data/semantic_fr.toml");

/// Context radius (characters) for snippets and speech-verb gating
const CONTEXT_RADIUS: usize = 50;

/// Snippets kept per entity
const MAX_CONTEXTS: usize = 3;

const TITLED_PERSON_CONFIDENCE: f64 = 0.8;
const TITLED_PERSON_REPEAT_BOOST: f64 = 0.1;
const ATTRIBUTED_PERSON_CONFIDENCE: f64 = 0.6;
const GAZETTEER_CONFIDENCE: f64 = 0.9;
const PATTERN_CONFIDENCE: f64 = 0.7;

// Two adjacent capitalized words, e.g. "Marie Dupont" or "Jean-Luc Martin"
static CAPITALIZED_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\p{Lu}\p{Ll}+(?:-\p{Lu}\p{Ll}+)?)\s+(\p{Lu}\p{Ll}+(?:-\p{Lu}\p{Ll}+)?)\b").unwrap()
});

/// Semantic word lists and patterns
#[derive(Debug, Clone, Deserialize)]
pub struct SemanticConfig {
    pub persons: PersonConfig,
    pub places: GazetteerConfig,
    pub organizations: GazetteerConfig,
    #[serde(default)]
    pub topics: Vec<TopicDefinition>,
    pub relations: RelationConfig,
    pub key_phrases: KeyPhraseConfig,
    pub sentiment_cues: CueConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersonConfig {
    pub titles: Vec<String>,
    pub speech_verbs: Vec<String>,
    #[serde(default)]
    pub stopwords: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GazetteerConfig {
    #[serde(default)]
    pub gazetteer: Vec<String>,
    /// Regex patterns for generic administrative phrases
    #[serde(default)]
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopicDefinition {
    pub name: String,
    /// Whole words (plural s/x accepted), `stem*` prefixes, or literal
    /// phrases when they contain a space
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelationConfig {
    #[serde(default)]
    pub positive: Vec<String>,
    #[serde(default)]
    pub negative: Vec<String>,
    #[serde(default = "default_predicate")]
    pub default_predicate: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeyPhraseConfig {
    #[serde(default)]
    pub markers: Vec<String>,
    #[serde(default = "default_min_words")]
    pub min_words: usize,
    #[serde(default = "default_max_words")]
    pub max_words: usize,
}

/// Word prefixes used for sentence-level topic sentiment
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CueConfig {
    #[serde(default)]
    pub positive: Vec<String>,
    #[serde(default)]
    pub negative: Vec<String>,
}

fn default_predicate() -> String {
    "associé à".to_string()
}

fn default_min_words() -> usize {
    8
}

fn default_max_words() -> usize {
    25
}

impl SemanticConfig {
    /// Parse a configuration from TOML
    pub fn from_toml(source: &str) -> Result<Self, CoreError> {
        Ok(toml::from_str(source)?)
    }

    /// Embedded French configuration
    pub fn french() -> Result<Self, CoreError> {
        Self::from_toml(EMBEDDED_FRENCH)
    }
}

/// Word-bounded alternation over literal terms, longest first
fn alternation(terms: &[String], case_insensitive: bool) -> Result<Option<Regex>, regex::Error> {
    if terms.is_empty() {
        return Ok(None);
    }
    let mut sorted: Vec<&String> = terms.iter().collect();
    sorted.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
    let body = sorted
        .iter()
        .map(|t| {
            // \b only holds next to a word character, so "M." gets no trailing one
            let lead = if t.starts_with(char::is_alphanumeric) { r"\b" } else { "" };
            let trail = if t.ends_with(char::is_alphanumeric) { r"\b" } else { "" };
            format!("{lead}{}{trail}", regex::escape(t))
        })
        .collect::<Vec<_>>()
        .join("|");
    let flags = if case_insensitive { "(?i)" } else { "" };
    Regex::new(&format!("{flags}(?:{body})")).map(Some)
}

/// Does any word of `words` start with one of `prefixes`?
fn count_prefix_hits(words: &[String], prefixes: &[String]) -> usize {
    words
        .iter()
        .filter(|w| prefixes.iter().any(|p| w.starts_with(p.as_str())))
        .count()
}

/// `stem*` matches by prefix, a bare keyword as a whole word or its s/x plural
fn keyword_matches(word: &str, keyword: &str) -> bool {
    match keyword.strip_suffix('*') {
        Some(stem) => word.starts_with(stem),
        None => word == keyword || word.strip_suffix(&['s', 'x'][..]) == Some(keyword),
    }
}

/// Occurrences of a topic's keywords in lower-cased text
fn count_keyword_hits(lower: &str, words: &[String], keywords: &[String]) -> usize {
    let (phrases, single): (Vec<&String>, Vec<&String>) =
        keywords.iter().partition(|k| k.contains(' '));
    let phrase_hits: usize = phrases.iter().map(|p| lower.matches(p.as_str()).count()).sum();
    let word_hits = words
        .iter()
        .filter(|w| single.iter().any(|k| keyword_matches(w, k)))
        .count();
    phrase_hits + word_hits
}

fn lower_words(text: &str) -> Vec<String> {
    text::words(text).map(|w| w.to_lowercase()).collect()
}

/// Accumulates entity mentions, merging repeats
#[derive(Default)]
struct EntityBook {
    entities: Vec<SemanticEntity>,
    index: HashMap<(EntityType, String), usize>,
}

impl EntityBook {
    fn mention(
        &mut self,
        name: &str,
        entity_type: EntityType,
        confidence: f64,
        repeat_boost: f64,
        context: Option<String>,
    ) {
        let key = (entity_type, name.to_lowercase());
        if let Some(&idx) = self.index.get(&key) {
            let entity = &mut self.entities[idx];
            entity.mentions += 1;
            entity.confidence = (entity.confidence + repeat_boost).max(confidence).min(1.0);
            if let Some(ctx) = context {
                if entity.contexts.len() < MAX_CONTEXTS && !entity.contexts.contains(&ctx) {
                    entity.contexts.push(ctx);
                }
            }
            return;
        }

        let mut entity = SemanticEntity::new(name, entity_type, confidence);
        if let Some(ctx) = context {
            entity = entity.with_context(&ctx);
        }
        self.index.insert(key, self.entities.len());
        self.entities.push(entity);
    }

    fn contains(&self, entity_type: EntityType, name: &str) -> bool {
        self.index.contains_key(&(entity_type, name.to_lowercase()))
    }
}

/// Extracts entities, relations, topic sentiment and key phrases
#[derive(Debug, Clone)]
pub struct SemanticAnalyzer {
    config: SemanticConfig,
    titled_person: Option<Regex>,
    title_word: Option<Regex>,
    speech_verbs: Option<Regex>,
    place_gazetteer: Option<Regex>,
    org_gazetteer: Option<Regex>,
    place_patterns: Vec<Regex>,
    org_patterns: Vec<Regex>,
    positive_connectives: Option<Regex>,
    negative_connectives: Option<Regex>,
    key_markers: Option<Regex>,
    stopwords: HashSet<String>,
    titles: HashSet<String>,
}

impl SemanticAnalyzer {
    /// Compile an analyzer from configuration
    pub fn new(config: SemanticConfig) -> Result<Self, CoreError> {
        let title_word = alternation(&config.persons.titles, true)?;
        let titled_person = if config.persons.titles.is_empty() {
            None
        } else {
            let mut titles: Vec<&String> = config.persons.titles.iter().collect();
            titles.sort_by_key(|t| std::cmp::Reverse(t.chars().count()));
            let body = titles
                .iter()
                .map(|t| regex::escape(t))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&format!(
                r"\b(?i:{body})\s+(\p{{Lu}}[\p{{L}}'-]+(?:\s+\p{{Lu}}[\p{{L}}'-]+)?)"
            ))?)
        };

        let place_patterns = config
            .places
            .patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        let org_patterns = config
            .organizations
            .patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            titled_person,
            title_word,
            speech_verbs: alternation(&config.persons.speech_verbs, true)?,
            place_gazetteer: alternation(&config.places.gazetteer, false)?,
            org_gazetteer: alternation(&config.organizations.gazetteer, false)?,
            place_patterns,
            org_patterns,
            positive_connectives: alternation(&config.relations.positive, true)?,
            negative_connectives: alternation(&config.relations.negative, true)?,
            key_markers: alternation(&config.key_phrases.markers, true)?,
            stopwords: config.persons.stopwords.iter().cloned().collect(),
            titles: config.persons.titles.iter().map(|t| t.to_lowercase()).collect(),
            config,
        })
    }

    /// Analyzer over the embedded French configuration
    pub fn french() -> Result<Self, CoreError> {
        Self::new(SemanticConfig::french()?)
    }

    pub fn config(&self) -> &SemanticConfig {
        &self.config
    }

    /// Run every extractor over `text`
    pub fn analyze(&self, text: &str) -> SemanticAnalysis {
        if text.trim().is_empty() {
            return SemanticAnalysis::default();
        }

        let sentences = text::sentences(text);
        let entities = self.extract_entities(text);
        let relations = self.extract_relations(&sentences, &entities);
        let topic_sentiments = self.topic_sentiments(&sentences, &entities);
        let key_phrases = self.key_phrases(&sentences);
        let semantic_density = semantic_density(&entities, text::word_count(text));

        debug!(
            entities = entities.len(),
            relations = relations.len(),
            topics = topic_sentiments.len(),
            "semantic analysis complete"
        );

        SemanticAnalysis {
            entities,
            relations,
            topic_sentiments,
            key_phrases,
            semantic_density,
        }
    }

    /// Merge the four extractors, sorted by confidence, top 25
    pub fn extract_entities(&self, text: &str) -> Vec<SemanticEntity> {
        let mut book = EntityBook::default();

        self.extract_persons(text, &mut book);
        self.extract_gazetteer(text, EntityType::Place, &mut book);
        self.extract_gazetteer(text, EntityType::Organization, &mut book);
        self.extract_topics(text, &mut book);

        let mut entities = book.entities;
        entities.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then(b.mentions.cmp(&a.mentions))
                .then(a.name.cmp(&b.name))
        });
        entities.truncate(MAX_ENTITIES);
        entities
    }

    fn extract_persons(&self, text: &str, book: &mut EntityBook) {
        let mut titled_spans = Vec::new();

        if let Some(re) = &self.titled_person {
            for cap in re.captures_iter(text) {
                let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
                    continue;
                };
                if self.is_known_place_or_org(name.as_str()) {
                    continue;
                }
                titled_spans.push((whole.start(), whole.end()));
                book.mention(
                    name.as_str(),
                    EntityType::Person,
                    TITLED_PERSON_CONFIDENCE,
                    TITLED_PERSON_REPEAT_BOOST,
                    Some(text::snippet(text, whole.start(), whole.end(), CONTEXT_RADIUS)),
                );
            }
        }

        // Generic names only count when an attribution verb sits nearby
        let Some(speech) = &self.speech_verbs else {
            return;
        };
        let mut at = 0;
        while let Some(cap) = CAPITALIZED_PAIR.captures_at(text, at) {
            let (Some(whole), Some(first), Some(second)) = (cap.get(0), cap.get(1), cap.get(2)) else {
                break;
            };
            // "Selon Claire Fontaine": drop the leading word and rescan from the next one
            if self.stopwords.contains(first.as_str())
                || self.titles.contains(&first.as_str().to_lowercase())
            {
                at = second.start();
                continue;
            }
            let (start, end) = (whole.start(), whole.end());
            at = end;
            if titled_spans.iter().any(|&(s, e)| start < e && s < end) {
                continue;
            }
            if self.is_known_place_or_org(whole.as_str())
                || self.is_known_place_or_org(first.as_str())
                || self.is_known_place_or_org(second.as_str())
            {
                continue;
            }

            let (from, to) = text::window(text, start, end, CONTEXT_RADIUS, 0, text.len());
            if !speech.is_match(&text[from..to]) {
                continue;
            }

            book.mention(
                whole.as_str(),
                EntityType::Person,
                ATTRIBUTED_PERSON_CONFIDENCE,
                0.0,
                Some(text::normalize_whitespace(&text[from..to])),
            );
        }
    }

    fn extract_gazetteer(&self, text: &str, entity_type: EntityType, book: &mut EntityBook) {
        let (gazetteer, patterns) = match entity_type {
            EntityType::Place => (&self.place_gazetteer, &self.place_patterns),
            EntityType::Organization => (&self.org_gazetteer, &self.org_patterns),
            _ => return,
        };

        if let Some(re) = gazetteer {
            for m in re.find_iter(text) {
                book.mention(
                    m.as_str(),
                    entity_type,
                    GAZETTEER_CONFIDENCE,
                    0.0,
                    Some(text::snippet(text, m.start(), m.end(), CONTEXT_RADIUS)),
                );
            }
        }

        for re in patterns {
            for m in re.find_iter(text) {
                let name = m.as_str().trim();
                book.mention(
                    name,
                    entity_type,
                    PATTERN_CONFIDENCE,
                    0.0,
                    Some(text::snippet(text, m.start(), m.end(), CONTEXT_RADIUS)),
                );
            }
        }
    }

    fn extract_topics(&self, text: &str, book: &mut EntityBook) {
        let lower = text.to_lowercase();
        let words = lower_words(&lower);

        for topic in &self.config.topics {
            let mentions = count_keyword_hits(&lower, &words, &topic.keywords);
            if mentions == 0 {
                continue;
            }
            let confidence = (mentions as f64 * 0.1 + 0.5).min(1.0);
            let mut entity = SemanticEntity::new(&topic.name, EntityType::Topic, confidence);
            entity.mentions = mentions as u32;
            entity.contexts = text::sentences(text)
                .iter()
                .filter(|s| {
                    let sl = s.text.to_lowercase();
                    count_keyword_hits(&sl, &lower_words(&sl), &topic.keywords) > 0
                })
                .take(MAX_CONTEXTS)
                .map(|s| s.text.to_string())
                .collect();

            if !book.contains(EntityType::Topic, &topic.name) {
                book.index
                    .insert((EntityType::Topic, topic.name.to_lowercase()), book.entities.len());
                book.entities.push(entity);
            }
        }
    }

    fn is_known_place_or_org(&self, name: &str) -> bool {
        let full_match = |re: &Option<Regex>| {
            re.as_ref()
                .and_then(|r| r.find(name))
                .is_some_and(|m| m.start() == 0 && m.end() == name.len())
        };
        full_match(&self.place_gazetteer) || full_match(&self.org_gazetteer)
    }

    /// Pairwise relations for sentences holding two or more named entities
    pub fn extract_relations(
        &self,
        sentences: &[SentenceSpan<'_>],
        entities: &[SemanticEntity],
    ) -> Vec<SemanticRelation> {
        let mut relations = Vec::new();

        for sentence in sentences {
            let mut located: Vec<(usize, usize, &str)> = entities
                .iter()
                .filter(|e| e.entity_type.is_named())
                .filter_map(|e| {
                    sentence
                        .text
                        .find(e.name.as_str())
                        .map(|pos| (pos, pos + e.name.len(), e.name.as_str()))
                })
                .collect();
            if located.len() < 2 {
                continue;
            }
            located.sort();

            for i in 0..located.len() {
                for j in (i + 1)..located.len() {
                    let (_, end_i, subject) = located[i];
                    let (start_j, _, object) = located[j];
                    if start_j < end_i {
                        continue;
                    }
                    let between = &sentence.text[end_i..start_j];
                    relations.push(self.relate(subject, object, between));
                    if relations.len() >= MAX_RELATIONS {
                        return relations;
                    }
                }
            }
        }

        relations
    }

    fn relate(&self, subject: &str, object: &str, between: &str) -> SemanticRelation {
        let positive = self.positive_connectives.as_ref().and_then(|r| r.find(between));
        let negative = self.negative_connectives.as_ref().and_then(|r| r.find(between));

        let connective = match (positive, negative) {
            (Some(p), Some(n)) if n.start() < p.start() => Some((n, Sentiment::Negative)),
            (Some(p), _) => Some((p, Sentiment::Positive)),
            (None, Some(n)) => Some((n, Sentiment::Negative)),
            (None, None) => None,
        };

        let gap = between.chars().count().min(200) as f64;
        let proximity = 1.0 - gap / 200.0;

        match connective {
            Some((m, sentiment)) => SemanticRelation {
                subject: subject.to_string(),
                predicate: m.as_str().to_lowercase(),
                object: object.to_string(),
                sentiment,
                strength: (0.7 + 0.3 * proximity).min(1.0),
            },
            None => SemanticRelation {
                subject: subject.to_string(),
                predicate: self.config.relations.default_predicate.clone(),
                object: object.to_string(),
                sentiment: Sentiment::Neutral,
                strength: (0.4 + 0.3 * proximity).min(1.0),
            },
        }
    }

    /// Sentence sentiment tallies for every detected topic
    pub fn topic_sentiments(
        &self,
        sentences: &[SentenceSpan<'_>],
        entities: &[SemanticEntity],
    ) -> Vec<TopicSentiment> {
        let named: Vec<&SemanticEntity> = entities.iter().filter(|e| e.entity_type.is_named()).collect();
        let lowered: Vec<(String, Vec<String>)> = sentences
            .iter()
            .map(|s| {
                let lower = s.text.to_lowercase();
                let words = lower_words(&lower);
                (lower, words)
            })
            .collect();

        let mut tallies = Vec::new();
        for entity in entities.iter().filter(|e| e.entity_type == EntityType::Topic) {
            let Some(topic) = self.config.topics.iter().find(|t| t.name == entity.name) else {
                continue;
            };

            let mut tally = TopicSentiment::new(&topic.name);
            for (sentence, (lower, words)) in sentences.iter().zip(&lowered) {
                if count_keyword_hits(lower, words, &topic.keywords) == 0 {
                    continue;
                }
                tally.record(self.sentence_polarity(words));

                for e in &named {
                    if sentence.text.contains(e.name.as_str()) && !tally.related_entities.contains(&e.name) {
                        tally.related_entities.push(e.name.clone());
                    }
                }
            }
            tallies.push(tally);
        }

        tallies
    }

    fn sentence_polarity(&self, words: &[String]) -> Sentiment {
        let cues = &self.config.sentiment_cues;
        let positive = count_prefix_hits(words, &cues.positive) as i64;
        let negative = count_prefix_hits(words, &cues.negative) as i64;
        match positive - negative {
            d if d > 0 => Sentiment::Positive,
            d if d < 0 => Sentiment::Negative,
            _ => Sentiment::Neutral,
        }
    }

    /// Top sentences by importance
    pub fn key_phrases(&self, sentences: &[SentenceSpan<'_>]) -> Vec<String> {
        let settings = &self.config.key_phrases;
        let mut scored: Vec<(f64, usize, &str)> = sentences
            .iter()
            .enumerate()
            .map(|(idx, s)| {
                let mut importance: f64 = 0.0;
                if self.title_word.as_ref().is_some_and(|r| r.is_match(s.text)) {
                    importance += 0.3;
                }
                if self.place_gazetteer.as_ref().is_some_and(|r| r.is_match(s.text)) {
                    importance += 0.4;
                }
                if let Some(markers) = &self.key_markers {
                    importance += 0.2 * markers.find_iter(s.text).count() as f64;
                }
                let mut importance = importance.min(1.0);

                let words = text::word_count(s.text);
                if words < settings.min_words || words > settings.max_words {
                    importance *= 0.5;
                }
                (importance, idx, s.text)
            })
            .filter(|(importance, _, _)| *importance > 0.0)
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
        scored
            .into_iter()
            .take(MAX_KEY_PHRASES)
            .map(|(_, _, s)| s.to_string())
            .collect()
    }
}

/// `min(2 * mentions / words + 0.5 * unique / mentions, 1)`
pub fn semantic_density(entities: &[SemanticEntity], words: usize) -> f64 {
    let mentions: u32 = entities.iter().map(|e| e.mentions).sum();
    if mentions == 0 || words == 0 {
        return 0.0;
    }
    let mentions = mentions as f64;
    let unique = entities.len() as f64;
    (2.0 * (mentions / words as f64) + 0.5 * (unique / mentions)).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> SemanticAnalyzer {
        SemanticAnalyzer::french().unwrap()
    }

    fn find<'a>(entities: &'a [SemanticEntity], name: &str) -> Option<&'a SemanticEntity> {
        entities.iter().find(|e| e.name == name)
    }

    #[test]
    fn test_embedded_config_loads() {
        let config = SemanticConfig::french().unwrap();
        assert_eq!(config.topics.len(), 10);
        assert_eq!(config.relations.default_predicate, "associé à");
    }

    #[test]
    fn test_titled_person_repeat_boost() {
        let text = "Le ministre Bruno Martin visite Lyon. Plus tard, le ministre Bruno Martin repart.";
        let entities = analyzer().extract_entities(text);
        let person = find(&entities, "Bruno Martin").unwrap();
        assert_eq!(person.entity_type, EntityType::Person);
        assert_eq!(person.mentions, 2);
        assert!((person.confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_generic_name_requires_speech_verb() {
        let a = analyzer();

        let attributed = a.extract_entities("Claire Fontaine déclare que le projet avance.");
        let person = find(&attributed, "Claire Fontaine").unwrap();
        assert!((person.confidence - 0.6).abs() < 1e-9);

        let bare = a.extract_entities("Grande Parade organisée hier soir dans le centre.");
        assert!(find(&bare, "Grande Parade").is_none());
    }

    #[test]
    fn test_places_and_organizations() {
        let text = "Le ministère de la Santé a réuni les élus de Bretagne et la SNCF à Rennes.";
        let entities = analyzer().extract_entities(text);

        let ministry = find(&entities, "ministère de la Santé").unwrap();
        assert_eq!(ministry.entity_type, EntityType::Organization);
        assert!((ministry.confidence - 0.7).abs() < 1e-9);

        let region = find(&entities, "Bretagne").unwrap();
        assert_eq!(region.entity_type, EntityType::Place);
        assert!((region.confidence - 0.9).abs() < 1e-9);

        assert!(find(&entities, "SNCF").is_some());
        assert!(find(&entities, "Rennes").is_some());
    }

    #[test]
    fn test_topic_confidence_from_mentions() {
        let text = "La croissance de l'économie soutient l'emploi.";
        let entities = analyzer().extract_entities(text);
        let topic = find(&entities, "économie").unwrap();
        assert_eq!(topic.entity_type, EntityType::Topic);
        assert_eq!(topic.mentions, 3);
        assert!((topic.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_entities_sorted_and_truncated() {
        let cities = [
            "Paris", "Lyon", "Marseille", "Toulouse", "Nice", "Nantes", "Strasbourg",
            "Montpellier", "Bordeaux", "Lille", "Rennes", "Reims", "Toulon", "Grenoble",
            "Dijon", "Angers", "Brest", "Rouen", "Metz", "Corse", "Berlin", "Londres",
            "Madrid", "Rome", "Moscou", "Washington",
        ];
        let text = format!("Tournée à {} pour le sport.", cities.join(", "));
        let entities = analyzer().extract_entities(&text);
        assert_eq!(entities.len(), MAX_ENTITIES);
        assert!(entities.windows(2).all(|w| w[0].confidence >= w[1].confidence));
    }

    #[test]
    fn test_relation_with_connective() {
        let text = "Le président Paul Durand critique vivement la SNCF.";
        let analysis = analyzer().analyze(text);
        let relation = analysis
            .relations
            .iter()
            .find(|r| r.subject == "Paul Durand" && r.object == "SNCF")
            .unwrap();
        assert_eq!(relation.sentiment, Sentiment::Negative);
        assert_eq!(relation.predicate, "critique");
        assert!(relation.strength > 0.6);
    }

    #[test]
    fn test_relation_defaults_to_neutral() {
        let text = "Rencontre entre Lyon et Marseille ce week-end.";
        let analysis = analyzer().analyze(text);
        let relation = &analysis.relations[0];
        assert_eq!(relation.sentiment, Sentiment::Neutral);
        assert_eq!(relation.predicate, "associé à");
    }

    #[test]
    fn test_topic_sentiment_dominant() {
        let text = "Le sport français connaît un grand succès. Le match est une victoire. Le championnat continue.";
        let analysis = analyzer().analyze(text);
        let sport = analysis
            .topic_sentiments
            .iter()
            .find(|t| t.topic == "sport")
            .unwrap();
        assert_eq!(sport.positive, 2);
        assert_eq!(sport.neutral, 1);
        assert_eq!(sport.dominant_sentiment, Sentiment::Positive);
    }

    #[test]
    fn test_key_phrases_prefer_marked_sentences() {
        let text = "Court. Le président annonce à Paris une réforme historique et majeure pour tout le pays entier.";
        let phrases = analyzer().analyze(text).key_phrases;
        assert_eq!(phrases.len(), 1);
        assert!(phrases[0].starts_with("Le président annonce"));
    }

    #[test]
    fn test_semantic_density_bounds() {
        assert_eq!(semantic_density(&[], 10), 0.0);
        let entity = SemanticEntity::new("Paris", EntityType::Place, 0.9);
        let density = semantic_density(&[entity], 10);
        assert!((density - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_name_after_capitalized_stopword() {
        let a = analyzer();

        let entities = a.extract_entities("Selon Claire Fontaine, le projet avance.");
        let person = find(&entities, "Claire Fontaine").unwrap();
        assert_eq!(person.entity_type, EntityType::Person);
        assert!((person.confidence - 0.6).abs() < 1e-9);

        let entities = a.extract_entities("Pour Claire Fontaine, dit-on, le projet avance.");
        assert!(find(&entities, "Claire Fontaine").is_some());
    }

    #[test]
    fn test_topic_keywords_match_whole_words() {
        let a = analyzer();
        let has_topic = |text: &str| {
            a.extract_entities(text)
                .iter()
                .any(|e| e.entity_type == EntityType::Topic)
        };

        assert!(!has_topic("Les supporters vont partir particulièrement tôt pour la partie."));
        assert!(!has_topic("Il faut patienter avant de juger."));

        let entities = a.extract_entities("Chaque parti présente ses candidats.");
        let politics = find(&entities, "politique").unwrap();
        assert_eq!(politics.mentions, 1);

        let entities = a.extract_entities("Les partis et les juges se rencontrent.");
        assert!(find(&entities, "politique").is_some());
        assert!(find(&entities, "justice").is_some());
    }

    #[test]
    fn test_relations_capped() {
        let text = "Paris, Lyon, Marseille, Toulouse, Nice, Nantes, Strasbourg, Bordeaux et Lille signent un accord.";
        let analysis = analyzer().analyze(text);
        assert_eq!(analysis.relations.len(), MAX_RELATIONS);
    }

    #[test]
    fn test_key_phrases_capped() {
        let text = (0..7)
            .map(|i| format!("Le conseil adopte une mesure importante pour le quartier numéro {i}."))
            .collect::<Vec<_>>()
            .join(" ");
        let phrases = analyzer().analyze(&text).key_phrases;
        assert_eq!(phrases.len(), MAX_KEY_PHRASES);
        assert!(phrases[0].ends_with("numéro 0."));
        assert!(phrases[4].ends_with("numéro 4."));
    }

    #[test]
    fn test_abbreviated_title_counts_for_key_phrases() {
        let text = "Hier soir M. Dupont a présenté un nouveau plan pour la ville entière.";
        let phrases = analyzer().analyze(text).key_phrases;
        assert_eq!(phrases, vec![text.to_string()]);
    }

    #[test]
    fn test_empty_text() {
        let analysis = analyzer().analyze("   ");
        assert!(analysis.entities.is_empty());
        assert_eq!(analysis.semantic_density, 0.0);
    }
}
