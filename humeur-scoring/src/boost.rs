//! Semantic boost: fuse entity, topic and relation signals into the score

use humeur_core::{EntityType, SemanticAnalysis, Sentiment};

use crate::BoostConfig;

/// Multipliers applied to the raw lexical score and confidence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SemanticBoost {
    pub score_multiplier: f64,
    pub confidence_multiplier: f64,
}

impl Default for SemanticBoost {
    fn default() -> Self {
        Self {
            score_multiplier: 1.0,
            confidence_multiplier: 1.0,
        }
    }
}

impl SemanticBoost {
    /// Derive multipliers from an analysis and the sign of the raw score
    pub fn from_analysis(analysis: &SemanticAnalysis, raw_score: f64, config: &BoostConfig) -> Self {
        let mut score = 1.0;
        let mut confidence = 1.0;
        let direction = if raw_score > 0.0 {
            1.0
        } else if raw_score < 0.0 {
            -1.0
        } else {
            0.0
        };

        let prominent = analysis
            .entities
            .iter()
            .filter(|e| matches!(e.entity_type, EntityType::Person | EntityType::Organization))
            .filter(|e| e.confidence >= config.entity_confidence_floor)
            .count();
        score += prominent as f64 * config.entity_step;

        if direction != 0.0 {
            let (agree, disagree) = analysis
                .topic_sentiments
                .iter()
                .filter(|t| t.dominant_sentiment != Sentiment::Neutral)
                .fold((0, 0), |(agree, disagree), t| {
                    if t.dominant_sentiment.sign() == direction {
                        (agree + 1, disagree)
                    } else {
                        (agree, disagree + 1)
                    }
                });
            if agree > disagree {
                score += config.topic_step;
            } else if disagree > agree {
                score -= config.topic_step;
            }
        }

        let strong: Vec<_> = analysis
            .relations
            .iter()
            .filter(|r| r.strength > config.relation_strength_floor)
            .collect();
        if !strong.is_empty() {
            confidence += (strong.len() as f64 * config.relation_confidence_step)
                .min(config.relation_confidence_cap);

            let positive = strong.iter().filter(|r| r.sentiment == Sentiment::Positive).count();
            let negative = strong.iter().filter(|r| r.sentiment == Sentiment::Negative).count();
            let lean = if positive > 2 * negative {
                1.0
            } else if negative > 2 * positive {
                -1.0
            } else {
                0.0
            };
            if lean != 0.0 && direction != 0.0 {
                score += lean * direction * config.relation_step;
            }
        }

        Self {
            score_multiplier: score.clamp(config.score_range.0, config.score_range.1),
            confidence_multiplier: confidence
                .clamp(config.confidence_range.0, config.confidence_range.1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use humeur_core::{SemanticEntity, SemanticRelation, TopicSentiment};

    fn relation(sentiment: Sentiment, strength: f64) -> SemanticRelation {
        SemanticRelation {
            subject: "A".to_string(),
            predicate: "soutient".to_string(),
            object: "B".to_string(),
            sentiment,
            strength,
        }
    }

    #[test]
    fn test_empty_analysis_is_neutral() {
        let boost = SemanticBoost::from_analysis(&SemanticAnalysis::default(), 0.5, &BoostConfig::default());
        assert_eq!(boost, SemanticBoost::default());
    }

    #[test]
    fn test_entities_and_agreeing_topic() {
        let mut topic = TopicSentiment::new("sport");
        topic.record(Sentiment::Positive);
        let analysis = SemanticAnalysis {
            entities: vec![
                SemanticEntity::new("Marie Curie", EntityType::Person, 0.9),
                SemanticEntity::new("SNCF", EntityType::Organization, 0.9),
                SemanticEntity::new("Lyon", EntityType::Place, 0.9),
            ],
            topic_sentiments: vec![topic],
            ..Default::default()
        };

        let boost = SemanticBoost::from_analysis(&analysis, 0.4, &BoostConfig::default());
        assert!((boost.score_multiplier - 1.2).abs() < 1e-9);

        let against = SemanticBoost::from_analysis(&analysis, -0.4, &BoostConfig::default());
        assert!((against.score_multiplier - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_multipliers_are_clamped() {
        let analysis = SemanticAnalysis {
            entities: (0..20)
                .map(|i| SemanticEntity::new(&format!("Org {i}"), EntityType::Organization, 1.0))
                .collect(),
            relations: (0..10).map(|_| relation(Sentiment::Positive, 0.9)).collect(),
            ..Default::default()
        };

        let boost = SemanticBoost::from_analysis(&analysis, 0.4, &BoostConfig::default());
        assert_eq!(boost.score_multiplier, 1.3);
        assert!((boost.confidence_multiplier - 1.1).abs() < 1e-9);
    }

    #[test]
    fn test_lopsided_relations_against_score() {
        let analysis = SemanticAnalysis {
            relations: vec![
                relation(Sentiment::Negative, 0.8),
                relation(Sentiment::Negative, 0.7),
                relation(Sentiment::Positive, 0.3),
            ],
            ..Default::default()
        };

        let boost = SemanticBoost::from_analysis(&analysis, 0.5, &BoostConfig::default());
        assert!((boost.score_multiplier - 0.95).abs() < 1e-9);
        assert!((boost.confidence_multiplier - 1.04).abs() < 1e-9);
    }
}
