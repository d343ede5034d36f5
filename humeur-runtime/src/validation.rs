//! Validation and calibration
//!
//! Measures pipeline quality on scored batches and turns the history of
//! measurements into a calibration adjustment and a graded report:
//! - **validate**: accuracy/precision/recall/F1 against reference labels,
//!   plus coherence and mean confidence
//! - **test_consistency**: score variance within day/source/category groups
//! - **calibrate**: adjustment factor and threshold from recent runs
//! - **report**: A-F grade, per-metric trends, recommendations
//!
//! Reference labels come from a separate, smaller stem heuristic rather than
//! the scoring lexicon, so the scorer is not graded against its own rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use humeur_core::text;
use humeur_core::{Article, PersistenceBackend, Sentiment, SentimentResult};

use crate::ValidationError;

/// Persisted history layout version
const HISTORY_VERSION: u32 = 1;

const REFERENCE_POSITIVE: &[&str] = &[
    "réussi", "réussite", "gagn", "heureu", "joie", "progrès", "amélior", "hausse",
    "record", "victoire", "succès", "favorable", "célèbr", "félicit", "bravo", "espoir",
];

const REFERENCE_NEGATIVE: &[&str] = &[
    "échec", "perd", "perte", "chute", "baisse", "crise", "grève", "mort", "décès",
    "accident", "colère", "conflit", "inquiét", "menace", "drame", "victime", "blessé",
];

/// Validator tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Records kept in history
    pub history_cap: usize,
    /// Runs averaged by calibration
    pub calibration_window: usize,
    /// Runs required before calibrating
    pub min_runs: usize,
    /// Runs used for trend slopes
    pub trend_window: usize,
    /// Jaccard similarity above which two articles are compared for coherence
    pub similarity_floor: f64,
    /// Coherence reported when no pair qualifies
    pub default_coherence: f64,
    /// Threshold recommended while uncalibrated
    pub default_threshold: f64,
    /// Slope beyond which a metric counts as moving
    pub trend_slope: f64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            history_cap: 50,
            calibration_window: 10,
            min_runs: 3,
            trend_window: 5,
            similarity_floor: 0.3,
            default_coherence: 0.8,
            default_threshold: 0.15,
            trend_slope: 0.02,
        }
    }
}

impl ValidatorConfig {
    pub fn with_history_cap(mut self, cap: usize) -> Self {
        self.history_cap = cap.max(1);
        self
    }

    pub fn with_min_runs(mut self, runs: usize) -> Self {
        self.min_runs = runs;
        self
    }
}

/// Quality of one validation run
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub coherence_index: f64,
    pub confidence: f64,
}

impl ValidationMetrics {
    /// Weighted blend used for grading
    pub fn composite(&self) -> f64 {
        0.3 * self.accuracy + 0.3 * self.f1_score + 0.2 * self.coherence_index + 0.2 * self.confidence
    }
}

/// A validation run in history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub sample_size: usize,
    pub metrics: ValidationMetrics,
}

/// Within-group score consistency per dimension
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub temporal: f64,
    pub source: f64,
    pub topic: f64,
    pub overall: f64,
}

/// Calibration derived from recent validation runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationResult {
    pub is_calibrated: bool,
    pub adjustment_factor: f64,
    pub recommended_threshold: f64,
    pub quality_score: f64,
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
}

/// Letter grade of a composite quality score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.9 {
            Grade::A
        } else if score >= 0.8 {
            Grade::B
        } else if score >= 0.7 {
            Grade::C
        } else if score >= 0.6 {
            Grade::D
        } else {
            Grade::F
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        write!(f, "{}", letter)
    }
}

/// Direction of a metric over recent runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    #[default]
    Stable,
    Declining,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Improving => write!(f, "improving"),
            Trend::Stable => write!(f, "stable"),
            Trend::Declining => write!(f, "declining"),
        }
    }
}

/// Trends of the tracked metrics
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricTrends {
    pub accuracy: Trend,
    pub coherence: Trend,
    pub confidence: Trend,
    pub quality: Trend,
}

/// Graded quality report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub grade: Grade,
    pub composite: f64,
    pub metrics: Option<ValidationMetrics>,
    pub trends: MetricTrends,
    pub recommendations: Vec<String>,
    pub runs: usize,
}

#[derive(Serialize, Deserialize)]
struct HistorySnapshot {
    version: u32,
    records: Vec<ValidationRecord>,
}

/// Label from the independent keyword heuristic
pub fn reference_label(article: &Article) -> Sentiment {
    let body = article.full_text().to_lowercase();
    let (mut positive, mut negative) = (0usize, 0usize);
    for word in text::words(&body) {
        if REFERENCE_POSITIVE.iter().any(|stem| word.starts_with(stem)) {
            positive += 1;
        } else if REFERENCE_NEGATIVE.iter().any(|stem| word.starts_with(stem)) {
            negative += 1;
        }
    }

    if positive > negative {
        Sentiment::Positive
    } else if negative > positive {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

/// Tracks validation runs and derives calibration
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidatorConfig,
    history: VecDeque<ValidationRecord>,
}

impl Validator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self {
            config,
            history: VecDeque::new(),
        }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Records, oldest first
    pub fn history(&self) -> impl Iterator<Item = &ValidationRecord> {
        self.history.iter()
    }

    pub fn runs(&self) -> usize {
        self.history.len()
    }

    /// Measure a scored batch and append it to history
    pub fn validate(
        &mut self,
        articles: &[Article],
        results: &[SentimentResult],
    ) -> Result<ValidationMetrics, ValidationError> {
        check_batch(articles, results)?;

        let (mut correct, mut tp, mut fp, mut fn_) = (0usize, 0usize, 0usize, 0usize);
        for (article, result) in articles.iter().zip(results) {
            let expected = reference_label(article);
            let predicted = result.sentiment;
            if expected == predicted {
                correct += 1;
            }
            match (predicted == Sentiment::Positive, expected == Sentiment::Positive) {
                (true, true) => tp += 1,
                (true, false) => fp += 1,
                (false, true) => fn_ += 1,
                (false, false) => {}
            }
        }

        let n = articles.len() as f64;
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1_score = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        let metrics = ValidationMetrics {
            accuracy: correct as f64 / n,
            precision,
            recall,
            f1_score,
            coherence_index: self.coherence_index(articles, results)?,
            confidence: results.iter().map(|r| r.confidence).sum::<f64>() / n,
        };

        info!(
            sample = articles.len(),
            accuracy = metrics.accuracy,
            f1 = metrics.f1_score,
            coherence = metrics.coherence_index,
            "validation run recorded"
        );
        self.record(articles.len(), metrics);
        Ok(metrics)
    }

    /// Append externally computed metrics
    pub fn record(&mut self, sample_size: usize, metrics: ValidationMetrics) -> &ValidationRecord {
        self.record_at(sample_size, metrics, Utc::now())
    }

    pub fn record_at(
        &mut self,
        sample_size: usize,
        metrics: ValidationMetrics,
        timestamp: DateTime<Utc>,
    ) -> &ValidationRecord {
        while self.history.len() >= self.config.history_cap.max(1) {
            self.history.pop_front();
        }
        self.history.push_back(ValidationRecord {
            id: Uuid::new_v4(),
            timestamp,
            sample_size,
            metrics,
        });
        &self.history[self.history.len() - 1]
    }

    /// Whether similar texts received similarly valued scores
    pub fn coherence_index(
        &self,
        articles: &[Article],
        results: &[SentimentResult],
    ) -> Result<f64, ValidationError> {
        check_batch(articles, results)?;

        let tokens: Vec<_> = articles
            .iter()
            .map(|a| text::token_set(&a.full_text()))
            .collect();

        let mut total = 0.0;
        let mut pairs = 0usize;
        for i in 0..tokens.len() {
            for j in (i + 1)..tokens.len() {
                let similarity = text::jaccard(&tokens[i], &tokens[j]);
                if similarity <= self.config.similarity_floor {
                    continue;
                }
                let expected = (1.0 - similarity) * 0.5;
                let actual = (results[i].score - results[j].score).abs();
                total += (1.0 - (actual - expected).abs() * 2.0).max(0.0);
                pairs += 1;
            }
        }

        Ok(if pairs == 0 {
            self.config.default_coherence
        } else {
            total / pairs as f64
        })
    }

    /// Score consistency by publication day, source and category
    pub fn test_consistency(
        &self,
        articles: &[Article],
        results: &[SentimentResult],
    ) -> Result<ConsistencyReport, ValidationError> {
        check_batch(articles, results)?;

        let temporal = group_consistency(
            articles.iter().zip(results),
            |a| a.publish_date.map(|d| d.date_naive()),
            2,
            1.0,
        );
        let source = group_consistency(
            articles.iter().zip(results),
            |a| non_empty(&a.source),
            3,
            2.0,
        );
        let topic = group_consistency(
            articles.iter().zip(results),
            |a| non_empty(&a.category),
            2,
            1.5,
        );

        let report = ConsistencyReport {
            temporal,
            source,
            topic,
            overall: (temporal + source + topic) / 3.0,
        };
        debug!(?report, "consistency measured");
        Ok(report)
    }

    /// Calibration from the most recent runs
    pub fn calibrate(&self) -> CalibrationResult {
        let runs = self.history.len();
        if runs < self.config.min_runs {
            debug!(runs, required = self.config.min_runs, "not enough runs to calibrate");
            return CalibrationResult {
                is_calibrated: false,
                adjustment_factor: 1.0,
                recommended_threshold: self.config.default_threshold,
                quality_score: 0.5,
                issues: vec![format!(
                    "Insufficient validation history: {} of {} runs",
                    runs, self.config.min_runs
                )],
                suggestions: vec!["Validate more scored batches before calibrating".to_string()],
            };
        }

        let window: Vec<&ValidationMetrics> = self
            .history
            .iter()
            .rev()
            .take(self.config.calibration_window.max(1))
            .map(|r| &r.metrics)
            .collect();
        let n = window.len() as f64;
        let accuracy = window.iter().map(|m| m.accuracy).sum::<f64>() / n;
        let coherence = window.iter().map(|m| m.coherence_index).sum::<f64>() / n;
        let confidence = window.iter().map(|m| m.confidence).sum::<f64>() / n;

        let quality_score = 0.4 * accuracy + 0.3 * coherence + 0.3 * confidence;
        let adjustment_factor = if accuracy < 0.8 {
            0.9
        } else if accuracy > 0.9 {
            1.1
        } else {
            1.0
        };
        let recommended_threshold = (0.2 - (accuracy - 0.7) * 0.1).clamp(0.1, 0.25);

        let mut issues = Vec::new();
        let mut suggestions = Vec::new();
        if accuracy < 0.7 {
            issues.push(format!("Low accuracy ({:.2})", accuracy));
            suggestions.push("Extend the lexicon with terms missing from recent articles".to_string());
        }
        if coherence < 0.6 {
            issues.push(format!("Low coherence ({:.2})", coherence));
            suggestions.push("Review positional and section weights for similar articles".to_string());
        }
        if confidence < 0.5 {
            issues.push(format!("Low confidence ({:.2})", confidence));
            suggestions.push("Check semantic coverage of entities and topics".to_string());
        }

        info!(
            accuracy,
            quality_score, adjustment_factor, recommended_threshold, "pipeline calibrated"
        );

        CalibrationResult {
            is_calibrated: true,
            adjustment_factor,
            recommended_threshold,
            quality_score,
            issues,
            suggestions,
        }
    }

    /// Grade, trends and recommendations from history
    pub fn report(&self) -> QualityReport {
        let latest = self.history.back().map(|r| r.metrics);
        let composite = latest.map(|m| m.composite()).unwrap_or(0.0);

        let recent: Vec<&ValidationMetrics> = self
            .history
            .iter()
            .skip(self.history.len().saturating_sub(self.config.trend_window))
            .map(|r| &r.metrics)
            .collect();
        let trends = MetricTrends {
            accuracy: self.trend(recent.iter().map(|m| m.accuracy)),
            coherence: self.trend(recent.iter().map(|m| m.coherence_index)),
            confidence: self.trend(recent.iter().map(|m| m.confidence)),
            quality: self.trend(recent.iter().map(|m| m.composite())),
        };

        let mut recommendations = Vec::new();
        match latest {
            None => recommendations.push("No validation run recorded yet".to_string()),
            Some(m) => {
                if m.accuracy < 0.7 {
                    recommendations.push("Accuracy is low: review lexicon coverage".to_string());
                }
                if m.f1_score < 0.6 {
                    recommendations
                        .push("Positive detection is weak: check positive terms and negation".to_string());
                }
                if m.coherence_index < 0.7 {
                    recommendations
                        .push("Similar articles diverge: review modifier multipliers".to_string());
                }
                if m.confidence < 0.5 {
                    recommendations.push("Confidence is low: enrich semantic data".to_string());
                }
            }
        }
        if trends.quality == Trend::Declining {
            recommendations.push("Quality is declining over recent runs".to_string());
        }
        if latest.is_some() && recommendations.is_empty() {
            recommendations.push("Quality is satisfactory; keep monitoring".to_string());
        }

        QualityReport {
            grade: Grade::from_score(composite),
            composite,
            metrics: latest,
            trends,
            recommendations,
            runs: self.history.len(),
        }
    }

    fn trend(&self, values: impl Iterator<Item = f64>) -> Trend {
        let slope = regression_slope(&values.collect::<Vec<_>>());
        if slope > self.config.trend_slope {
            Trend::Improving
        } else if slope < -self.config.trend_slope {
            Trend::Declining
        } else {
            Trend::Stable
        }
    }

    /// Persist history under `key`
    pub fn save_to(&self, backend: &dyn PersistenceBackend, key: &str) -> Result<usize, ValidationError> {
        let snapshot = HistorySnapshot {
            version: HISTORY_VERSION,
            records: self.history.iter().cloned().collect(),
        };
        backend.save(key, &serde_json::to_vec(&snapshot)?)?;
        Ok(self.history.len())
    }

    /// Restore history from `key`; unreadable blobs are dropped
    pub fn load_from(&mut self, backend: &dyn PersistenceBackend, key: &str) -> usize {
        let bytes = match backend.load(key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return 0,
            Err(e) => {
                warn!("Validation history unavailable: {}", e);
                return 0;
            }
        };

        match serde_json::from_slice::<HistorySnapshot>(&bytes) {
            Ok(snapshot) if snapshot.version == HISTORY_VERSION => {
                let cap = self.config.history_cap.max(1);
                let skip = snapshot.records.len().saturating_sub(cap);
                self.history = snapshot.records.into_iter().skip(skip).collect();
                info!("Restored {} validation runs", self.history.len());
                self.history.len()
            }
            _ => {
                warn!("Dropping unreadable validation history '{}'", key);
                if let Err(e) = backend.remove(key) {
                    warn!("Failed to remove validation history: {}", e);
                }
                0
            }
        }
    }
}

fn check_batch(articles: &[Article], results: &[SentimentResult]) -> Result<(), ValidationError> {
    if articles.len() != results.len() {
        return Err(ValidationError::LengthMismatch {
            articles: articles.len(),
            results: results.len(),
        });
    }
    if articles.is_empty() {
        return Err(ValidationError::EmptyBatch);
    }
    Ok(())
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
}

/// Mean of `max(0, 1 - variance * k)` over groups with at least `min_size` members
fn group_consistency<'a, K: Ord>(
    pairs: impl Iterator<Item = (&'a Article, &'a SentimentResult)>,
    key: impl Fn(&Article) -> Option<K>,
    min_size: usize,
    k: f64,
) -> f64 {
    let mut groups: BTreeMap<K, Vec<f64>> = BTreeMap::new();
    for (article, result) in pairs {
        if let Some(group) = key(article) {
            groups.entry(group).or_default().push(result.score);
        }
    }

    let scores: Vec<f64> = groups
        .values()
        .filter(|scores| scores.len() >= min_size.max(2))
        .map(|scores| (1.0 - variance(scores) * k).max(0.0))
        .collect();

    if scores.is_empty() {
        1.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}

fn variance(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

/// Least-squares slope of `values` against their index
fn regression_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let n_f = n as f64;
    let mean_x = (n_f - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / n_f;

    let (mut num, mut den) = (0.0, 0.0);
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - mean_x;
        num += dx * (y - mean_y);
        den += dx * dx;
    }
    num / den
}
