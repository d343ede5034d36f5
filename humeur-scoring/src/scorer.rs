//! Sentiment scorer
//!
//! Scores an article section by section (title, summary, content):
//! - lexicon matches weighted by band and section
//! - intensifiers, diminishers and negations within the match window
//! - positional emphasis at the edges of each section
//! - sentence-level negation parity
//! - nuance reshaping, then a semantic boost from entity analysis
//!
//! Scoring never fails: blank input yields a zero-confidence neutral result.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::{debug, trace};

use humeur_core::text;
use humeur_core::{
    clamp_or_zero, Article, ContextualFactors, Intensity, SemanticAnalysis, SemanticAnalyzer,
    Sentiment, SentimentResult,
};

use crate::{
    Lexicon, Modifier, NuanceProfile, Polarity, ScoringConfig, ScoringError, SemanticBoost,
};

/// Evidence weight at which lexical coverage reaches one half
const EVIDENCE_SATURATION: f64 = 4.0;

/// Confidence for non-blank text without any lexicon hit
const NO_EVIDENCE_CONFIDENCE: f64 = 0.2;

/// Raw lexical evidence before nuance and semantic adjustments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LexicalTotals {
    pub positive: f64,
    pub negative: f64,
    /// Match magnitude found in the title
    pub title_evidence: f64,
    /// Match magnitude found in summary and content
    pub body_evidence: f64,
    /// Matched terms in order of first appearance
    pub terms: Vec<String>,
}

impl LexicalTotals {
    pub fn evidence(&self) -> f64 {
        self.positive + self.negative
    }

    fn add(&mut self, polarity: Polarity, amount: f64) {
        match polarity {
            Polarity::Positive => self.positive += amount,
            Polarity::Negative => self.negative += amount,
        }
    }

    fn record_term(&mut self, term: &str) {
        if !self.terms.iter().any(|t| t == term) {
            self.terms.push(term.to_string());
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Title,
    Summary,
    Content,
}

impl Section {
    fn weight(self, config: &ScoringConfig) -> f64 {
        match self {
            Section::Title => config.title_weight,
            Section::Summary => config.summary_weight,
            Section::Content => config.content_weight,
        }
    }
}

/// Multi-factor sentiment scorer
#[derive(Debug, Clone)]
pub struct SentimentScorer {
    lexicon: Lexicon,
    analyzer: SemanticAnalyzer,
    config: ScoringConfig,
}

impl SentimentScorer {
    pub fn new(lexicon: Lexicon, analyzer: SemanticAnalyzer, config: ScoringConfig) -> Self {
        Self {
            lexicon,
            analyzer,
            config,
        }
    }

    /// Scorer over the embedded French lexicon and semantic data
    pub fn french() -> Result<Self, ScoringError> {
        Ok(Self::new(
            Lexicon::french()?,
            SemanticAnalyzer::french()?,
            ScoringConfig::default(),
        ))
    }

    pub fn with_config(mut self, config: ScoringConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ScoringConfig) {
        self.config = config;
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn analyzer(&self) -> &SemanticAnalyzer {
        &self.analyzer
    }

    /// Score an article against the current clock
    pub fn score(&self, article: &Article) -> SentimentResult {
        self.score_at(article, Utc::now())
    }

    /// Score an article, measuring recency from `now`
    pub fn score_at(&self, article: &Article, now: DateTime<Utc>) -> SentimentResult {
        if article.is_blank() {
            return SentimentResult::neutral();
        }
        let analysis = self.analyzer.analyze(&article.full_text());
        self.score_with_analysis(article, &analysis, now)
    }

    /// Score bare text as an article body
    pub fn score_text(&self, text: &str) -> SentimentResult {
        self.score_at(&Article::new("", "", text), Utc::now())
    }

    /// Score an article with a semantic analysis computed by the caller
    pub fn score_with_analysis(
        &self,
        article: &Article,
        analysis: &SemanticAnalysis,
        now: DateTime<Utc>,
    ) -> SentimentResult {
        if article.is_blank() {
            return SentimentResult::neutral();
        }

        let totals = self.article_totals(article);
        let full = article.full_text();
        let lower = full.to_lowercase();

        let nuance_config = &self.config.nuance;
        let nuances = NuanceProfile::detect(
            &self.lexicon,
            &lower,
            totals.positive,
            totals.negative,
            nuance_config,
        );
        let (positive, negative) =
            nuances.adjust_totals(totals.positive, totals.negative, nuance_config);

        let raw = (positive - negative) / (positive + negative).max(1.0);
        let boost = SemanticBoost::from_analysis(analysis, raw, &self.config.boost);
        let score = clamp_or_zero(
            raw * boost.score_multiplier * self.config.calibration_factor,
            -1.0,
            1.0,
        );

        let confidence = base_confidence(positive, negative) * boost.confidence_multiplier
            + analysis.semantic_density * self.config.density_confidence_weight;
        let confidence = clamp_or_zero(
            nuances.adjust_confidence(confidence, nuance_config),
            0.0,
            1.0,
        );

        let complexity = linguistic_complexity(&full);
        let threshold = self.config.base_threshold
            - confidence * self.config.confidence_threshold_slope
            + nuances.threshold_boost(nuance_config);
        let sentiment = Sentiment::from_score(score, threshold);
        let intensity = self.intensity(score, complexity);

        let located = totals.title_evidence + totals.body_evidence;
        let (title_weight, content_weight) = if located > 0.0 {
            (totals.title_evidence / located, totals.body_evidence / located)
        } else {
            (0.0, 0.0)
        };

        debug!(
            article = %article.id,
            %sentiment,
            score,
            confidence,
            nuances = ?nuances.detected(),
            "article scored"
        );

        SentimentResult {
            sentiment,
            score,
            confidence,
            intensity,
            emotions: totals.terms,
            contextual_factors: ContextualFactors {
                title_weight,
                content_weight,
                temporal_relevance: self.temporal_relevance(article.publish_date, now),
                linguistic_complexity: complexity,
                semantic_entity_count: analysis.entities.len(),
                semantic_density: analysis.semantic_density,
            },
        }
        .clamped()
    }

    /// Raw positive/negative totals of `text` scored as article content
    pub fn lexical_totals(&self, text: &str) -> LexicalTotals {
        let mut totals = LexicalTotals::default();
        if !text.trim().is_empty() {
            self.accumulate(text, Section::Content, &mut totals);
        }
        totals
    }

    /// `exp(-age / decay)`, 1.0 for undated or future articles
    pub fn temporal_relevance(
        &self,
        publish_date: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> f64 {
        match publish_date {
            Some(date) if date < now => {
                let age_days = (now - date).num_seconds() as f64 / 86_400.0;
                (-age_days / self.config.recency_decay_days.max(f64::EPSILON)).exp()
            }
            _ => 1.0,
        }
    }

    fn article_totals(&self, article: &Article) -> LexicalTotals {
        let mut totals = LexicalTotals::default();
        for (section, body) in [
            (Section::Title, &article.title),
            (Section::Summary, &article.summary),
            (Section::Content, &article.content),
        ] {
            if !body.trim().is_empty() {
                self.accumulate(body, section, &mut totals);
            }
        }
        totals
    }

    fn accumulate(&self, body: &str, section: Section, totals: &mut LexicalTotals) {
        let lower = body.to_lowercase();
        let weight = section.weight(&self.config);
        let length = lower.chars().count().max(1) as f64;

        let sentences = text::sentences(&lower);
        let sentence_negations: Vec<usize> = sentences
            .iter()
            .map(|s| self.lexicon.count_modifier(Modifier::Negation, s.text))
            .collect();

        for hit in self.lexicon.find_terms(&lower) {
            let sentence = sentences
                .iter()
                .zip(&sentence_negations)
                .find(|(s, _)| s.start <= hit.start && hit.start < s.end);
            let (lo, hi) = sentence
                .map(|(s, _)| (s.start.min(hit.start), s.end.max(hit.end)))
                .unwrap_or((0, lower.len()));

            let (from, to) =
                text::window(&lower, hit.start, hit.end, self.config.context_radius, lo, hi);
            let before = &lower[from..hit.start];
            let after = &lower[hit.end..to];

            let mut magnitude = hit.entry.weight * weight;
            if self.modifier_near(Modifier::Intensifier, before, after) > 0 {
                magnitude *= self.config.intensifier_multiplier;
            }
            if self.modifier_near(Modifier::Diminisher, before, after) > 0 {
                magnitude *= self.config.diminisher_multiplier;
            }
            let offset = lower[..hit.start].chars().count() as f64;
            magnitude *= self.config.position_weight(offset / length);

            let local = self.modifier_near(Modifier::Negation, before, after);
            let in_sentence = sentence.map(|(_, n)| *n).unwrap_or(local);
            let (kept, flipped) = self.negation_split(local, in_sentence);

            totals.add(hit.entry.polarity, magnitude * kept);
            totals.add(hit.entry.polarity.opposite(), magnitude * flipped);
            match section {
                Section::Title => totals.title_evidence += magnitude,
                Section::Summary | Section::Content => totals.body_evidence += magnitude,
            }
            totals.record_term(&hit.entry.term);

            trace!(term = %hit.entry.term, magnitude, local, in_sentence, "lexicon hit");
        }
    }

    fn modifier_near(&self, modifier: Modifier, before: &str, after: &str) -> usize {
        self.lexicon.count_modifier(modifier, before) + self.lexicon.count_modifier(modifier, after)
    }

    /// Shares of a match kept on its own pole and moved to the opposite one
    ///
    /// An even number of negation markers in the sentence reinstates the
    /// original polarity (damped); an odd number inverts it, fully damped when
    /// a marker sits in the match window, partially shifted otherwise.
    fn negation_split(&self, local: usize, in_sentence: usize) -> (f64, f64) {
        let negation = &self.config.negation;
        let count = local.max(in_sentence);

        if count == 0 {
            (1.0, 0.0)
        } else if count % 2 == 0 {
            (1.0 - negation.double_negation_damping, 0.0)
        } else if local > 0 {
            (0.0, negation.local_factor)
        } else {
            (1.0 - negation.sentence_shift, negation.sentence_shift)
        }
    }

    fn intensity(&self, score: f64, complexity: f64) -> Intensity {
        let magnitude = score.abs();
        if magnitude > self.config.high_intensity - complexity * 0.1 {
            Intensity::High
        } else if magnitude > self.config.medium_intensity - complexity * 0.05 {
            Intensity::Medium
        } else {
            Intensity::Low
        }
    }
}

/// Confidence from how much evidence there is and how one-sided it is
fn base_confidence(positive: f64, negative: f64) -> f64 {
    let evidence = positive + negative;
    if evidence <= 0.0 {
        return NO_EVIDENCE_CONFIDENCE;
    }
    let coverage = evidence / (evidence + EVIDENCE_SATURATION);
    let agreement = (positive - negative).abs() / evidence;
    0.3 + 0.4 * coverage + 0.3 * agreement
}

/// Mean of normalized word length, sentence length and lexical diversity
pub fn linguistic_complexity(body: &str) -> f64 {
    let words: Vec<&str> = text::words(body).collect();
    if words.is_empty() {
        return 0.0;
    }

    let count = words.len() as f64;
    let avg_word = words.iter().map(|w| w.chars().count()).sum::<usize>() as f64 / count;
    let avg_sentence = count / text::sentences(body).len().max(1) as f64;
    let unique: HashSet<String> = words.iter().map(|w| w.to_lowercase()).collect();
    let diversity = unique.len() as f64 / count;

    ((avg_word / 10.0).min(1.0) + (avg_sentence / 30.0).min(1.0) + diversity) / 3.0
}
