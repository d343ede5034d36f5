//! Article input and sentiment/semantic output types
//!
//! Articles arrive already collected; everything else here is produced by
//! the pipeline and is recomputed on every analysis call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A news article as delivered by the collection layer
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub publish_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Article {
    pub fn new(id: &str, title: &str, content: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            ..Default::default()
        }
    }

    pub fn with_summary(mut self, summary: &str) -> Self {
        self.summary = summary.to_string();
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = category.to_string();
        self
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source = source.to_string();
        self
    }

    pub fn with_publish_date(mut self, date: DateTime<Utc>) -> Self {
        self.publish_date = Some(date);
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    /// Title, summary and content joined as one text
    pub fn full_text(&self) -> String {
        [&self.title, &self.summary, &self.content]
            .iter()
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.trim())
            .collect::<Vec<_>>()
            .join(". ")
    }

    /// True when no section carries any text
    pub fn is_blank(&self) -> bool {
        self.title.trim().is_empty()
            && self.summary.trim().is_empty()
            && self.content.trim().is_empty()
    }
}

/// Polarity label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl Sentiment {
    /// Label for a signed value, neutral within `[-threshold, threshold]`
    pub fn from_score(score: f64, threshold: f64) -> Self {
        if score > threshold {
            Sentiment::Positive
        } else if score < -threshold {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }

    /// +1, -1 or 0
    pub fn sign(self) -> f64 {
        match self {
            Sentiment::Positive => 1.0,
            Sentiment::Negative => -1.0,
            Sentiment::Neutral => 0.0,
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "positive"),
            Sentiment::Negative => write!(f, "negative"),
            Sentiment::Neutral => write!(f, "neutral"),
        }
    }
}

/// Coarse magnitude bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    #[default]
    Low,
    Medium,
    High,
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intensity::Low => write!(f, "low"),
            Intensity::Medium => write!(f, "medium"),
            Intensity::High => write!(f, "high"),
        }
    }
}

/// Context that shaped a score
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextualFactors {
    /// Share of the lexical evidence found in the title (0.0 - 1.0)
    pub title_weight: f64,
    /// Share of the lexical evidence found in summary and content (0.0 - 1.0)
    pub content_weight: f64,
    /// Recency of the article (1.0 = fresh)
    pub temporal_relevance: f64,
    /// Normalized linguistic complexity (0.0 - 1.0)
    pub linguistic_complexity: f64,
    /// Entities found by semantic analysis
    pub semantic_entity_count: usize,
    /// Semantic density of the text (0.0 - 1.0)
    pub semantic_density: f64,
}

/// Scoring output for one article
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentResult {
    pub sentiment: Sentiment,
    /// Net polarity (-1.0 - 1.0)
    pub score: f64,
    /// Confidence (0.0 - 1.0)
    pub confidence: f64,
    pub intensity: Intensity,
    /// Lexicon terms matched in the text
    pub emotions: Vec<String>,
    pub contextual_factors: ContextualFactors,
}

impl SentimentResult {
    /// Zero-confidence neutral result for blank input
    pub fn neutral() -> Self {
        Self::default()
    }

    /// Force every numeric field into its documented range
    pub fn clamped(mut self) -> Self {
        self.score = clamp_or_zero(self.score, -1.0, 1.0);
        self.confidence = clamp_or_zero(self.confidence, 0.0, 1.0);
        let factors = &mut self.contextual_factors;
        factors.title_weight = clamp_or_zero(factors.title_weight, 0.0, 1.0);
        factors.content_weight = clamp_or_zero(factors.content_weight, 0.0, 1.0);
        factors.temporal_relevance = clamp_or_zero(factors.temporal_relevance, 0.0, 1.0);
        factors.linguistic_complexity = clamp_or_zero(factors.linguistic_complexity, 0.0, 1.0);
        factors.semantic_density = clamp_or_zero(factors.semantic_density, 0.0, 1.0);
        self
    }
}

/// Clamp, mapping NaN to zero
pub fn clamp_or_zero(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(min, max)
    }
}

/// Kinds of semantic entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Person,
    Place,
    Organization,
    Topic,
}

impl EntityType {
    /// Named entities carry a surface form that can be located in text
    pub fn is_named(self) -> bool {
        !matches!(self, EntityType::Topic)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityType::Person => write!(f, "person"),
            EntityType::Place => write!(f, "place"),
            EntityType::Organization => write!(f, "organization"),
            EntityType::Topic => write!(f, "topic"),
        }
    }
}

/// An entity detected in one analysis call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticEntity {
    pub name: String,
    pub entity_type: EntityType,
    /// Confidence score (0.0 - 1.0)
    pub confidence: f64,
    pub mentions: u32,
    /// Surrounding snippets
    pub contexts: Vec<String>,
}

impl SemanticEntity {
    pub fn new(name: &str, entity_type: EntityType, confidence: f64) -> Self {
        Self {
            name: name.to_string(),
            entity_type,
            confidence: confidence.clamp(0.0, 1.0),
            mentions: 1,
            contexts: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: &str) -> Self {
        self.contexts.push(context.to_string());
        self
    }
}

/// A relation between two entities of the same sentence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticRelation {
    pub subject: String,
    pub predicate: String,
    pub object: String,
    pub sentiment: Sentiment,
    /// Strength (0.0 - 1.0)
    pub strength: f64,
}

/// Sentence-level sentiment tallies for one topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicSentiment {
    pub topic: String,
    pub positive: u32,
    pub negative: u32,
    pub neutral: u32,
    pub dominant_sentiment: Sentiment,
    pub related_entities: Vec<String>,
}

impl TopicSentiment {
    pub fn new(topic: &str) -> Self {
        Self {
            topic: topic.to_string(),
            positive: 0,
            negative: 0,
            neutral: 0,
            dominant_sentiment: Sentiment::Neutral,
            related_entities: Vec::new(),
        }
    }

    /// Tally one sentence
    pub fn record(&mut self, sentiment: Sentiment) {
        match sentiment {
            Sentiment::Positive => self.positive += 1,
            Sentiment::Negative => self.negative += 1,
            Sentiment::Neutral => self.neutral += 1,
        }
        self.dominant_sentiment = self.dominant();
    }

    /// Strictly greatest counter; ties resolve to neutral
    fn dominant(&self) -> Sentiment {
        if self.positive > self.negative && self.positive > self.neutral {
            Sentiment::Positive
        } else if self.negative > self.positive && self.negative > self.neutral {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }
}

/// Full output of semantic analysis
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticAnalysis {
    pub entities: Vec<SemanticEntity>,
    pub relations: Vec<SemanticRelation>,
    pub topic_sentiments: Vec<TopicSentiment>,
    pub key_phrases: Vec<String>,
    pub semantic_density: f64,
}

impl SemanticAnalysis {
    /// Entities of one type
    pub fn entities_of(&self, entity_type: EntityType) -> impl Iterator<Item = &SemanticEntity> {
        self.entities
            .iter()
            .filter(move |e| e.entity_type == entity_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_deserializes_camel_case() {
        let json = r#"{
            "id": "a1",
            "title": "Titre",
            "content": "Texte",
            "publishDate": "2024-03-01T08:00:00Z",
            "tags": ["x"]
        }"#;
        let article: Article = serde_json::from_str(json).unwrap();
        assert_eq!(article.id, "a1");
        assert!(article.publish_date.is_some());
        assert!(article.summary.is_empty());
        assert_eq!(article.tags, vec!["x".to_string()]);
    }

    #[test]
    fn test_blank_article() {
        assert!(Article::new("a", "  ", "\n\t").is_blank());
        assert!(!Article::new("a", "Titre", "").is_blank());
    }

    #[test]
    fn test_clamped_result() {
        let result = SentimentResult {
            score: 1.7,
            confidence: f64::NAN,
            ..Default::default()
        }
        .clamped();
        assert_eq!(result.score, 1.0);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_topic_dominant_ties_favor_neutral() {
        let mut topic = TopicSentiment::new("économie");
        topic.record(Sentiment::Positive);
        topic.record(Sentiment::Negative);
        assert_eq!(topic.dominant_sentiment, Sentiment::Neutral);
        topic.record(Sentiment::Positive);
        assert_eq!(topic.dominant_sentiment, Sentiment::Positive);
    }

    #[test]
    fn test_sentiment_from_score() {
        assert_eq!(Sentiment::from_score(0.2, 0.1), Sentiment::Positive);
        assert_eq!(Sentiment::from_score(-0.2, 0.1), Sentiment::Negative);
        assert_eq!(Sentiment::from_score(0.1, 0.1), Sentiment::Neutral);
    }
}
