use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{EngineConfig, NEUTRAL_CORROBORATION};
use crate::error::RejectReason;
use crate::features::FeatureSet;
use crate::similarity::similarity;
use crate::waveform::Waveform;

/// Externally computed same-speaker probability.
///
/// Implementations wrap whatever comparison service the deployment uses
/// (a language-model analysis, a secondary biometric model, ...). The
/// engine treats the oracle as an opaque, possibly-unavailable capability:
/// `None` and out-of-range values both fall back to the neutral 0.5 prior,
/// and an oracle failure is never promoted to an engine failure.
pub trait CorroborationOracle {
    fn same_speaker_probability(
        &self,
        live: &FeatureSet,
        stored: &FeatureSet,
        live_transcript: &str,
        stored_transcript: &str,
    ) -> Option<f64>;
}

/// Oracle returning a fixed probability. Useful in tests and wherever the
/// real comparison service is disabled.
pub struct FixedOracle(pub f64);

impl CorroborationOracle for FixedOracle {
    fn same_speaker_probability(
        &self,
        _live: &FeatureSet,
        _stored: &FeatureSet,
        _live_transcript: &str,
        _stored_transcript: &str,
    ) -> Option<f64> {
        Some(self.0)
    }
}

/// Oracle that is never available; every decision uses the neutral prior.
pub struct NoCorroboration;

impl CorroborationOracle for NoCorroboration {
    fn same_speaker_probability(
        &self,
        _live: &FeatureSet,
        _stored: &FeatureSet,
        _live_transcript: &str,
        _stored_transcript: &str,
    ) -> Option<f64> {
        None
    }
}

/// One enrolled voice sample: who it belongs to, its features, and the
/// transcript captured alongside it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredProfile {
    pub identity: String,
    pub features: FeatureSet,
    pub transcript: String,
}

/// Feature set plus transcript collected during one enrollment pass.
#[derive(Debug, Clone)]
pub struct EnrollmentSample {
    pub features: FeatureSet,
    pub transcript: String,
}

/// Outcome of one verification or identification call. Constructed once,
/// immutable, handed to the caller for logging and display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identification {
    pub success: bool,
    /// Fused confidence: weighted blend of similarity and corroboration.
    pub confidence: f64,
    /// Best raw similarity against the stored profiles.
    pub similarity: f64,
    /// Matched identity, present only on success.
    pub identity: Option<String>,
    /// Why the attempt was turned down, present only on rejection.
    pub reject: Option<RejectReason>,
}

impl Identification {
    /// A rejection carrying no similarity evidence.
    pub fn rejected(reason: RejectReason) -> Self {
        Self {
            success: false,
            confidence: 0.0,
            similarity: 0.0,
            identity: None,
            reject: Some(reason),
        }
    }
}

/// Fuses local similarity with external corroboration and applies the
/// threshold policy.
///
/// # Verification vs. identification
///
/// Verification answers "is this the claimed speaker?" against that
/// identity's stored profiles; it requires both the raw similarity gate
/// and the fused confidence gate, so a generous corroboration score can
/// never rescue a weak raw match. Open identification answers "who, if
/// anyone, is this?" against the whole catalog; the similarity gate is
/// applied up front as the discovery filter and only the confidence gate
/// remains for the winning candidate.
pub struct DecisionEngine {
    config: EngineConfig,
}

impl DecisionEngine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Pre-extraction guard: true when the raw recording is too quiet to
    /// bother extracting features from. Callers short-circuit to an
    /// [`RejectReason::AudioSilent`] rejection on a true result.
    pub fn is_silent(&self, wave: &Waveform) -> bool {
        wave.is_silent(self.config.silence_threshold)
    }

    /// Verifies a claimed identity against its stored profiles.
    pub fn verify(
        &self,
        live: &FeatureSet,
        profiles: &[StoredProfile],
        live_transcript: &str,
        oracle: &dyn CorroborationOracle,
    ) -> Identification {
        if live.is_empty() {
            return Identification::rejected(RejectReason::ExtractionFailed);
        }
        if profiles.is_empty() {
            return Identification::rejected(RejectReason::UnknownIdentity);
        }

        let mut best_similarity = 0.0f64;
        let mut best_profile = &profiles[0];
        for profile in profiles {
            let score = similarity(live, &profile.features);
            if score > best_similarity {
                best_similarity = score;
                best_profile = profile;
            }
        }

        // Corroboration is only worth the call once the local evidence is
        // promising; below the trigger the neutral prior stands in.
        let corroboration = if best_similarity > self.config.trigger_threshold {
            self.corroborate(live, best_profile, live_transcript, oracle)
        } else {
            NEUTRAL_CORROBORATION
        };

        let confidence = self.fuse(best_similarity, corroboration);
        let success = best_similarity >= self.config.similarity_threshold
            && confidence >= self.config.min_confidence;

        debug!(
            identity = %best_profile.identity,
            best_similarity,
            corroboration,
            confidence,
            success,
            "verification decision"
        );

        Identification {
            success,
            confidence,
            similarity: best_similarity,
            identity: success.then(|| best_profile.identity.clone()),
            reject: (!success).then_some(RejectReason::LowConfidence { confidence }),
        }
    }

    /// Identifies the best-matching enrolled identity, if any.
    ///
    /// Catalog entries below the discovery threshold are excluded from
    /// consideration entirely; when nothing clears it, the attempt is
    /// rejected without consulting the oracle.
    pub fn identify(
        &self,
        live: &FeatureSet,
        catalog: &[StoredProfile],
        live_transcript: &str,
        oracle: &dyn CorroborationOracle,
    ) -> Identification {
        if live.is_empty() {
            return Identification::rejected(RejectReason::ExtractionFailed);
        }

        let mut candidates: Vec<(f64, &StoredProfile)> = catalog
            .iter()
            .map(|entry| (similarity(live, &entry.features), entry))
            .filter(|(score, _)| *score >= self.config.discovery_threshold)
            .collect();
        candidates.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        let Some(&(best_similarity, best_entry)) = candidates.first() else {
            debug!(catalog = catalog.len(), "no candidate above discovery threshold");
            return Identification::rejected(RejectReason::NoCandidate);
        };

        let corroboration = self.corroborate(live, best_entry, live_transcript, oracle);
        let confidence = self.fuse(best_similarity, corroboration);
        let success = confidence >= self.config.min_confidence;

        debug!(
            identity = %best_entry.identity,
            best_similarity,
            candidates = candidates.len(),
            confidence,
            success,
            "identification decision"
        );

        Identification {
            success,
            confidence,
            similarity: best_similarity,
            identity: success.then(|| best_entry.identity.clone()),
            reject: (!success).then_some(RejectReason::LowConfidence { confidence }),
        }
    }

    /// Scores the consistency of one enrollment session on a 0-10 scale.
    ///
    /// The base score is the mean pairwise similarity across all sample
    /// pairs, scaled by ten; with fewer than two samples the neutral 0.5
    /// stands in. Samples whose transcript runs past ten characters add a
    /// bonus of up to two points — a proxy for "the speaker said enough",
    /// not an independent voice-quality measure.
    pub fn enrollment_quality(&self, samples: &[EnrollmentSample]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }

        let mut pair_scores = Vec::new();
        for i in 0..samples.len() {
            for j in i + 1..samples.len() {
                pair_scores.push(similarity(&samples[i].features, &samples[j].features));
            }
        }
        let avg = if pair_scores.is_empty() {
            NEUTRAL_CORROBORATION
        } else {
            pair_scores.iter().sum::<f64>() / pair_scores.len() as f64
        };

        let spoken_enough = samples
            .iter()
            .filter(|s| s.transcript.chars().count() > 10)
            .count();
        let bonus = spoken_enough as f64 / samples.len() as f64 * 2.0;

        (avg * 10.0 + bonus).min(10.0)
    }

    /// Scores the standalone quality of one voice sample in [0, 1].
    ///
    /// Rewards audible energy, sufficient duration, a usable cepstral
    /// block, and a detected pitch; an optional external analysis
    /// confidence (0-10 scale) contributes up to 0.2 on top.
    pub fn sample_quality(&self, features: &FeatureSet, analysis_confidence: Option<f64>) -> f64 {
        let mut score = 0.5;

        if features.rms_energy > 0.01 {
            score += 0.1;
        }
        if features.rms_energy > 0.05 {
            score += 0.1;
        }
        if features.duration >= 3.0 {
            score += 0.1;
        }
        if features.duration >= 5.0 {
            score += 0.1;
        }
        if features.cepstral.as_ref().is_some_and(|c| !c.is_empty()) {
            score += 0.1;
        }
        if features.prosodic.as_ref().is_some_and(|p| p.pitch_mean > 0.0) {
            score += 0.1;
        }
        if let Some(conf) = analysis_confidence {
            score += (conf / 10.0).clamp(0.0, 1.0) * 0.2;
        }

        score.min(1.0)
    }

    /// Weighted blend of similarity and corroboration.
    fn fuse(&self, similarity: f64, corroboration: f64) -> f64 {
        self.config.similarity_weight * similarity
            + self.config.corroboration_weight * corroboration
    }

    /// Asks the oracle for a same-speaker probability, falling back to the
    /// neutral prior when it is unavailable or returns garbage.
    fn corroborate(
        &self,
        live: &FeatureSet,
        profile: &StoredProfile,
        live_transcript: &str,
        oracle: &dyn CorroborationOracle,
    ) -> f64 {
        match oracle.same_speaker_probability(
            live,
            &profile.features,
            live_transcript,
            &profile.transcript,
        ) {
            Some(p) if p.is_finite() => p.clamp(0.0, 1.0),
            other => {
                warn!(
                    identity = %profile.identity,
                    unusable = other.is_some(),
                    "corroboration unavailable, using neutral prior"
                );
                NEUTRAL_CORROBORATION
            }
        }
    }
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new()
    }
}
