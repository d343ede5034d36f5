//! Tunable scoring constants

use serde::{Deserialize, Serialize};

/// Negation handling constants
///
/// These are heuristic defaults, not values fitted on a labeled corpus.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NegationConfig {
    /// Share of a match moved to the opposite pole when a negation sits in its window
    pub local_factor: f64,
    /// Share moved across when the sentence is negated but not near the match
    pub sentence_shift: f64,
    /// Damping applied to a match reinstated by double negation
    pub double_negation_damping: f64,
}

impl Default for NegationConfig {
    fn default() -> Self {
        Self {
            local_factor: 0.8,
            sentence_shift: 0.4,
            double_negation_damping: 0.2,
        }
    }
}

/// Semantic boost constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoostConfig {
    pub entity_confidence_floor: f64,
    pub entity_step: f64,
    pub topic_step: f64,
    pub relation_strength_floor: f64,
    pub relation_step: f64,
    pub relation_confidence_step: f64,
    pub relation_confidence_cap: f64,
    pub score_range: (f64, f64),
    pub confidence_range: (f64, f64),
}

impl Default for BoostConfig {
    fn default() -> Self {
        Self {
            entity_confidence_floor: 0.8,
            entity_step: 0.05,
            topic_step: 0.10,
            relation_strength_floor: 0.6,
            relation_step: 0.05,
            relation_confidence_step: 0.02,
            relation_confidence_cap: 0.1,
            score_range: (0.8, 1.3),
            confidence_range: (0.9, 1.2),
        }
    }
}

/// Nuance adjustments
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NuanceConfig {
    pub irony_swap: f64,
    pub ambivalence_damping: f64,
    /// Weaker/stronger pole ratio above which mixed evidence counts as ambivalent
    pub ambivalence_balance: f64,
    pub uncertainty_confidence: f64,
    pub ambivalence_confidence: f64,
    pub urgency_threshold_boost: f64,
}

impl Default for NuanceConfig {
    fn default() -> Self {
        Self {
            irony_swap: 0.7,
            ambivalence_damping: 0.8,
            ambivalence_balance: 0.6,
            uncertainty_confidence: 0.9,
            ambivalence_confidence: 0.7,
            urgency_threshold_boost: 0.05,
        }
    }
}

/// Scorer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub title_weight: f64,
    pub summary_weight: f64,
    pub content_weight: f64,
    /// Characters inspected on each side of a match for modifiers
    pub context_radius: usize,
    pub intensifier_multiplier: f64,
    pub diminisher_multiplier: f64,
    /// First and last 20% of a section
    pub edge_position_weight: f64,
    /// The 20% bands next to the edges
    pub near_edge_position_weight: f64,
    pub base_threshold: f64,
    pub confidence_threshold_slope: f64,
    pub high_intensity: f64,
    pub medium_intensity: f64,
    /// Confidence added per unit of semantic density
    pub density_confidence_weight: f64,
    /// Days after which temporal relevance falls to 1/e
    pub recency_decay_days: f64,
    /// Multiplier applied to the final score, 1.0 leaves it untouched
    pub calibration_factor: f64,
    pub negation: NegationConfig,
    pub boost: BoostConfig,
    pub nuance: NuanceConfig,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            title_weight: 3.0,
            summary_weight: 2.0,
            content_weight: 1.0,
            context_radius: 50,
            intensifier_multiplier: 1.7,
            diminisher_multiplier: 0.6,
            edge_position_weight: 1.3,
            near_edge_position_weight: 1.1,
            base_threshold: 0.12,
            confidence_threshold_slope: 0.08,
            high_intensity: 0.55,
            medium_intensity: 0.25,
            density_confidence_weight: 0.1,
            recency_decay_days: 7.0,
            calibration_factor: 1.0,
            negation: NegationConfig::default(),
            boost: BoostConfig::default(),
            nuance: NuanceConfig::default(),
        }
    }
}

impl ScoringConfig {
    pub fn with_section_weights(mut self, title: f64, summary: f64, content: f64) -> Self {
        self.title_weight = title;
        self.summary_weight = summary;
        self.content_weight = content;
        self
    }

    pub fn with_negation(mut self, negation: NegationConfig) -> Self {
        self.negation = negation;
        self
    }

    pub fn with_base_threshold(mut self, threshold: f64) -> Self {
        self.base_threshold = threshold;
        self
    }

    pub fn with_calibration_factor(mut self, factor: f64) -> Self {
        self.calibration_factor = factor;
        self
    }

    /// Multiplier for a match starting at `relative` (0..1) within its section
    pub fn position_weight(&self, relative: f64) -> f64 {
        if !(0.2..0.8).contains(&relative) {
            self.edge_position_weight
        } else if !(0.4..0.6).contains(&relative) {
            self.near_edge_position_weight
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_bands() {
        let config = ScoringConfig::default();
        assert_eq!(config.position_weight(0.0), 1.3);
        assert_eq!(config.position_weight(0.85), 1.3);
        assert_eq!(config.position_weight(0.3), 1.1);
        assert_eq!(config.position_weight(0.65), 1.1);
        assert_eq!(config.position_weight(0.5), 1.0);
    }

    #[test]
    fn test_negation_defaults() {
        let negation = ScoringConfig::default().negation;
        assert_eq!(negation.local_factor, 0.8);
        assert_eq!(negation.sentence_shift, 0.4);
        assert_eq!(negation.double_negation_damping, 0.2);
    }
}
