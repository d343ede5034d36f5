//! Pipeline Coordinator
//!
//! Wires the scoring stages together for a host application:
//! - Analyzer and scorer are injected, never global
//! - Results are memoized in a shared content-addressed cache
//! - Validation history accumulates across batches
//! - Persistence runs only when the host calls `warm_start`, `flush` or `close`

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use humeur_core::{
    Article, CacheConfig, CacheStats, CachedResult, LoadOutcome, ResultCache, SemanticAnalysis,
    SentimentResult, SharedBackend,
};
use humeur_scoring::SentimentScorer;

use crate::{
    CalibrationResult, ConsistencyReport, PipelineError, QualityReport, ValidationError,
    ValidationMetrics, Validator, ValidatorConfig,
};

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub cache: CacheConfig,
    pub validator: ValidatorConfig,
    /// Backend key of the persisted cache
    pub cache_key: String,
    /// Backend key of the persisted validation history
    pub history_key: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            validator: ValidatorConfig::default(),
            cache_key: "humeur.cache".to_string(),
            history_key: "humeur.validation".to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_validator(mut self, validator: ValidatorConfig) -> Self {
        self.validator = validator;
        self
    }
}

/// Outcome of a batch: cache hits first, then freshly scored articles
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub results: Vec<CachedResult>,
    pub cached: usize,
    pub scored: usize,
}

/// Scoring result together with the semantic analysis behind it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrichment {
    pub article_id: String,
    pub result: SentimentResult,
    pub analysis: SemanticAnalysis,
}

/// What warm start restored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarmStart {
    pub cache: LoadOutcome,
    pub validation_runs: usize,
}

/// What a flush persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlushSummary {
    pub cache_entries: usize,
    pub validation_runs: usize,
}

/// Pipeline statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineStats {
    pub cache: CacheStats,
    pub validation_runs: usize,
    pub persistent: bool,
}

/// The sentiment pipeline
///
/// `Send + Sync`: cache and validator sit behind mutexes, scoring runs
/// outside any lock.
pub struct Pipeline {
    scorer: SentimentScorer,
    cache: Mutex<ResultCache>,
    validator: Mutex<Validator>,
    backend: Option<SharedBackend>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(scorer: SentimentScorer, config: PipelineConfig) -> Self {
        Self {
            scorer,
            cache: Mutex::new(ResultCache::new(config.cache.clone())),
            validator: Mutex::new(Validator::new(config.validator.clone())),
            backend: None,
            config,
        }
    }

    /// Pipeline over the embedded French data with default settings
    pub fn french() -> Result<Self, PipelineError> {
        Ok(Self::new(SentimentScorer::french()?, PipelineConfig::default()))
    }

    /// Attach a durable store for warm start and flushes
    pub fn with_backend(mut self, backend: SharedBackend) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn scorer(&self) -> &SentimentScorer {
        &self.scorer
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Restore cache and validation history; failures leave them cold
    pub fn warm_start(&self) -> WarmStart {
        let Some(backend) = &self.backend else {
            return WarmStart {
                cache: LoadOutcome::Unavailable,
                validation_runs: 0,
            };
        };

        let cache = self
            .cache
            .lock()
            .load_from(backend.as_ref(), &self.config.cache_key);
        let validation_runs = self
            .validator
            .lock()
            .load_from(backend.as_ref(), &self.config.history_key);

        info!(?cache, validation_runs, "pipeline warm start");
        WarmStart {
            cache,
            validation_runs,
        }
    }

    /// Semantic analysis of raw text
    pub fn analyze(&self, text: &str) -> SemanticAnalysis {
        self.scorer.analyzer().analyze(text)
    }

    /// Score one article through the cache
    pub fn score(&self, article: &Article) -> SentimentResult {
        self.score_at(article, Utc::now())
    }

    pub fn score_at(&self, article: &Article, now: DateTime<Utc>) -> SentimentResult {
        if let Some(hit) = self
            .cache
            .lock()
            .get_at(&article.id, &article.title, &article.content, now)
        {
            return hit;
        }

        let result = self.scorer.score_at(article, now);
        self.cache.lock().set_at(
            &article.id,
            &article.title,
            &article.content,
            result.clone(),
            now,
        );
        result
    }

    /// Score a batch, computing only cache misses
    pub fn score_batch(&self, articles: &[Article]) -> BatchOutcome {
        self.score_batch_at(articles, Utc::now())
    }

    pub fn score_batch_at(&self, articles: &[Article], now: DateTime<Utc>) -> BatchOutcome {
        let partition = self.cache.lock().analyze_batch_at(articles, now);
        let cached = partition.cached.len();

        let fresh: Vec<(Article, SentimentResult)> = partition
            .to_analyze
            .into_iter()
            .map(|article| {
                let result = self.scorer.score_at(&article, now);
                (article, result)
            })
            .collect();
        let scored = fresh.len();

        let mut results = partition.cached;
        {
            let mut cache = self.cache.lock();
            for (article, result) in fresh {
                cache.set_at(
                    &article.id,
                    &article.title,
                    &article.content,
                    result.clone(),
                    now,
                );
                results.push(CachedResult {
                    article_id: article.id,
                    result,
                });
            }
        }

        debug!(total = articles.len(), cached, scored, "batch scored");
        BatchOutcome {
            results,
            cached,
            scored,
        }
    }

    /// Score an article and return the semantic analysis with it
    pub fn enrich(&self, article: &Article) -> Enrichment {
        let now = Utc::now();
        let analysis = self.scorer.analyzer().analyze(&article.full_text());

        let cached = self
            .cache
            .lock()
            .get_at(&article.id, &article.title, &article.content, now);
        let result = match cached {
            Some(result) => result,
            None => {
                let result = self.scorer.score_with_analysis(article, &analysis, now);
                self.cache.lock().set_at(
                    &article.id,
                    &article.title,
                    &article.content,
                    result.clone(),
                    now,
                );
                result
            }
        };

        Enrichment {
            article_id: article.id.clone(),
            result,
            analysis,
        }
    }

    /// Measure a scored batch and record it in history
    pub fn validate(
        &self,
        articles: &[Article],
        results: &[SentimentResult],
    ) -> Result<ValidationMetrics, ValidationError> {
        self.validator.lock().validate(articles, results)
    }

    pub fn test_consistency(
        &self,
        articles: &[Article],
        results: &[SentimentResult],
    ) -> Result<ConsistencyReport, ValidationError> {
        self.validator.lock().test_consistency(articles, results)
    }

    pub fn calibrate(&self) -> CalibrationResult {
        self.validator.lock().calibrate()
    }

    pub fn report(&self) -> QualityReport {
        self.validator.lock().report()
    }

    /// Feed a calibration back into the scorer
    ///
    /// Returns false, changing nothing, when the calibration is not usable.
    /// Cached results were produced under the old settings and are dropped.
    pub fn apply_calibration(&mut self, calibration: &CalibrationResult) -> bool {
        if !calibration.is_calibrated {
            warn!("Ignoring uncalibrated result");
            return false;
        }

        let config = self
            .scorer
            .config()
            .clone()
            .with_calibration_factor(calibration.adjustment_factor)
            .with_base_threshold(calibration.recommended_threshold);
        self.scorer.set_config(config);
        self.cache.lock().clear();

        info!(
            factor = calibration.adjustment_factor,
            threshold = calibration.recommended_threshold,
            "calibration applied"
        );
        true
    }

    /// Persist cache and validation history
    pub fn flush(&self) -> Result<FlushSummary, PipelineError> {
        let Some(backend) = &self.backend else {
            return Ok(FlushSummary::default());
        };

        let cache_entries = self
            .cache
            .lock()
            .save_to(backend.as_ref(), &self.config.cache_key)?;
        let validation_runs = self
            .validator
            .lock()
            .save_to(backend.as_ref(), &self.config.history_key)?;

        debug!(cache_entries, validation_runs, "pipeline flushed");
        Ok(FlushSummary {
            cache_entries,
            validation_runs,
        })
    }

    /// Final flush at shutdown
    pub fn close(self) -> Result<FlushSummary, PipelineError> {
        let summary = self.flush()?;
        info!(
            cache_entries = summary.cache_entries,
            validation_runs = summary.validation_runs,
            "pipeline closed"
        );
        Ok(summary)
    }

    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            cache: self.cache.lock().stats(),
            validation_runs: self.validator.lock().runs(),
            persistent: self.backend.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use humeur_core::{MemoryStore, PersistenceBackend, Sentiment};
    use std::collections::HashSet;
    use std::sync::Arc;

    fn articles() -> Vec<Article> {
        vec![
            Article::new("a1", "Une victoire exceptionnelle", "Le club célèbre un grand succès."),
            Article::new("a2", "La crise s'aggrave", "Une grève paralyse le pays."),
            Article::new("a3", "Réunion du conseil", "Le conseil municipal se réunit mardi."),
        ]
    }

    #[test]
    fn test_pipeline_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Pipeline>();
    }

    #[test]
    fn test_score_uses_cache() {
        let pipeline = Pipeline::french().unwrap();
        let article = &articles()[0];

        let first = pipeline.score(article);
        let second = pipeline.score(article);
        assert_eq!(first, second);
        assert_eq!(first.sentiment, Sentiment::Positive);

        let stats = pipeline.stats();
        assert_eq!(stats.cache.entries, 1);
        assert_eq!(stats.cache.hits, 1);
        assert!(!stats.persistent);
    }

    #[test]
    fn test_batch_covers_every_article_once() {
        let pipeline = Pipeline::french().unwrap();
        let batch = articles();
        pipeline.score(&batch[1]);

        let outcome = pipeline.score_batch(&batch);
        assert_eq!(outcome.cached, 1);
        assert_eq!(outcome.scored, 2);

        let ids: HashSet<_> = outcome.results.iter().map(|r| r.article_id.as_str()).collect();
        assert_eq!(ids.len(), 3);
        assert!(ids.contains("a1") && ids.contains("a2") && ids.contains("a3"));

        let again = pipeline.score_batch(&batch);
        assert_eq!(again.cached, 3);
        assert_eq!(again.scored, 0);
    }

    #[test]
    fn test_enrich_returns_analysis() {
        let pipeline = Pipeline::french().unwrap();
        let article = Article::new(
            "a4",
            "Le gouvernement annonce une victoire économique exceptionnelle",
            "",
        );
        let enrichment = pipeline.enrich(&article);

        assert_eq!(enrichment.article_id, "a4");
        assert!(!enrichment.analysis.entities.is_empty());
        assert_eq!(enrichment.result, pipeline.score(&article));
    }

    #[test]
    fn test_validate_then_calibrate() {
        let pipeline = Pipeline::french().unwrap();
        let batch = articles();
        let results: Vec<_> = batch.iter().map(|a| pipeline.score(a)).collect();

        assert!(!pipeline.calibrate().is_calibrated);
        for _ in 0..3 {
            pipeline.validate(&batch, &results).unwrap();
        }

        let calibration = pipeline.calibrate();
        assert!(calibration.is_calibrated);
        assert_eq!(pipeline.report().runs, 3);
    }

    #[test]
    fn test_apply_calibration_clears_cache() {
        let mut pipeline = Pipeline::french().unwrap();
        pipeline.score(&articles()[0]);

        let uncalibrated = pipeline.calibrate();
        assert!(!pipeline.apply_calibration(&uncalibrated));
        assert_eq!(pipeline.stats().cache.entries, 1);

        let calibration = CalibrationResult {
            is_calibrated: true,
            adjustment_factor: 0.9,
            recommended_threshold: 0.2,
            quality_score: 0.7,
            issues: Vec::new(),
            suggestions: Vec::new(),
        };
        assert!(pipeline.apply_calibration(&calibration));
        assert_eq!(pipeline.scorer().config().calibration_factor, 0.9);
        assert_eq!(pipeline.scorer().config().base_threshold, 0.2);
        assert_eq!(pipeline.stats().cache.entries, 0);
    }

    #[test]
    fn test_flush_and_warm_start() {
        let store = Arc::new(MemoryStore::new());
        let pipeline = Pipeline::french().unwrap().with_backend(store.clone());
        let batch = articles();
        let outcome = pipeline.score_batch(&batch);
        let results: Vec<_> = outcome.results.iter().map(|r| r.result.clone()).collect();
        pipeline.validate(&batch, &results).unwrap();

        let summary = pipeline.close().unwrap();
        assert_eq!(summary.cache_entries, 3);
        assert_eq!(summary.validation_runs, 1);

        let restored = Pipeline::french().unwrap().with_backend(store);
        let warm = restored.warm_start();
        assert_eq!(
            warm.cache,
            LoadOutcome::Restored {
                entries: 3,
                skipped: 0
            }
        );
        assert_eq!(warm.validation_runs, 1);
        assert_eq!(restored.score_batch(&batch).cached, 3);
    }

    #[test]
    fn test_corrupt_cache_starts_cold() {
        let store = Arc::new(MemoryStore::new());
        store.save("humeur.cache", b"{broken").unwrap();

        let pipeline = Pipeline::french().unwrap().with_backend(store.clone());
        assert_eq!(pipeline.warm_start().cache, LoadOutcome::Corrupt);
        assert!(store.load("humeur.cache").unwrap().is_none());

        let result = pipeline.score(&articles()[0]);
        assert_eq!(result.sentiment, Sentiment::Positive);
    }

    #[test]
    fn test_without_backend() {
        let pipeline = Pipeline::french().unwrap();
        assert_eq!(pipeline.warm_start().cache, LoadOutcome::Unavailable);
        assert_eq!(pipeline.flush().unwrap(), FlushSummary::default());
    }
}
