//! Emotional nuance detection
//!
//! Nuances are text-level cues that reshape lexical totals after matching:
//! - **Irony**: a positive surface over negative facts; poles swap at 70%
//! - **Ambivalence**: mixed evidence; both poles damped, confidence reduced
//! - **Uncertainty**: hedged statements; confidence reduced
//! - **Urgency**: breaking news; the neutral band widens

use crate::{Lexicon, Nuance, NuanceConfig};

/// Nuances detected in one text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NuanceProfile {
    pub irony: bool,
    pub ambivalence: bool,
    pub uncertainty: bool,
    pub urgency: bool,
}

impl NuanceProfile {
    /// Detect nuances in lower-cased text given its raw lexical totals
    pub fn detect(
        lexicon: &Lexicon,
        lower: &str,
        positive: f64,
        negative: f64,
        config: &NuanceConfig,
    ) -> Self {
        let mixed = positive > 0.0 && negative > 0.0;
        let balance = if mixed {
            positive.min(negative) / positive.max(negative)
        } else {
            0.0
        };

        Self {
            irony: lexicon.has_nuance(Nuance::Irony, lower) && mixed && positive > negative,
            ambivalence: mixed
                && (lexicon.has_nuance(Nuance::Ambivalence, lower)
                    || balance >= config.ambivalence_balance),
            uncertainty: lexicon.has_nuance(Nuance::Uncertainty, lower),
            urgency: lexicon.has_nuance(Nuance::Urgency, lower),
        }
    }

    /// Reshape positive/negative totals
    pub fn adjust_totals(&self, positive: f64, negative: f64, config: &NuanceConfig) -> (f64, f64) {
        let (mut pos, mut neg) = (positive, negative);
        if self.irony {
            let swap = config.irony_swap;
            pos = positive * (1.0 - swap) + negative * swap;
            neg = negative * (1.0 - swap) + positive * swap;
        }
        if self.ambivalence {
            pos *= config.ambivalence_damping;
            neg *= config.ambivalence_damping;
        }
        (pos, neg)
    }

    pub fn adjust_confidence(&self, confidence: f64, config: &NuanceConfig) -> f64 {
        let mut confidence = confidence;
        if self.uncertainty {
            confidence *= config.uncertainty_confidence;
        }
        if self.ambivalence {
            confidence *= config.ambivalence_confidence;
        }
        confidence
    }

    /// Added to the label threshold
    pub fn threshold_boost(&self, config: &NuanceConfig) -> f64 {
        if self.urgency {
            config.urgency_threshold_boost
        } else {
            0.0
        }
    }

    pub fn detected(&self) -> Vec<Nuance> {
        [
            (self.irony, Nuance::Irony),
            (self.ambivalence, Nuance::Ambivalence),
            (self.uncertainty, Nuance::Uncertainty),
            (self.urgency, Nuance::Urgency),
        ]
        .into_iter()
        .filter_map(|(on, nuance)| on.then_some(nuance))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Band;

    fn lexicon() -> Lexicon {
        Lexicon::builder()
            .positive("succès", Band::Strong)
            .negative("fiasco", Band::Strong)
            .nuance(Nuance::Irony, "évidemment")
            .nuance(Nuance::Ambivalence, "mais")
            .nuance(Nuance::Uncertainty, "peut-être")
            .nuance(Nuance::Urgency, "urgent")
            .build()
            .unwrap()
    }

    #[test]
    fn test_irony_swaps_at_seventy_percent() {
        let config = NuanceConfig::default();
        let profile = NuanceProfile::detect(&lexicon(), "évidemment, quel succès", 6.0, 2.0, &config);
        assert!(profile.irony);

        let (pos, neg) = profile.adjust_totals(6.0, 2.0, &config);
        assert!(neg > pos);
        assert!((pos - (6.0 * 0.3 + 2.0 * 0.7)).abs() < 1e-9);
    }

    #[test]
    fn test_irony_needs_negative_evidence() {
        let config = NuanceConfig::default();
        let profile = NuanceProfile::detect(&lexicon(), "évidemment, un succès", 3.0, 0.0, &config);
        assert!(!profile.irony);
    }

    #[test]
    fn test_ambivalence_dampens_and_lowers_confidence() {
        let config = NuanceConfig::default();
        let profile = NuanceProfile::detect(&lexicon(), "un succès mais un fiasco", 3.0, 1.0, &config);
        assert!(profile.ambivalence);

        let (pos, neg) = profile.adjust_totals(3.0, 1.0, &config);
        assert!((pos - 2.4).abs() < 1e-9);
        assert!((neg - 0.8).abs() < 1e-9);
        assert!((profile.adjust_confidence(1.0, &config) - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_balanced_evidence_is_ambivalent_without_marker() {
        let config = NuanceConfig::default();
        let profile = NuanceProfile::detect(&lexicon(), "succès et fiasco", 3.0, 2.0, &config);
        assert!(profile.ambivalence);
    }

    #[test]
    fn test_uncertainty_and_urgency() {
        let config = NuanceConfig::default();
        let profile =
            NuanceProfile::detect(&lexicon(), "c'est urgent, peut-être un succès", 3.0, 0.0, &config);
        assert!(profile.uncertainty);
        assert!(profile.urgency);
        assert!(!profile.ambivalence);
        assert!((profile.adjust_confidence(1.0, &config) - 0.9).abs() < 1e-9);
        assert_eq!(profile.threshold_boost(&config), 0.05);
        assert_eq!(profile.detected(), vec![Nuance::Uncertainty, Nuance::Urgency]);
    }
}
