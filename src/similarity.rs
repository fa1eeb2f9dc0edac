use crate::features::FeatureSet;

const SCALE_FLOOR: f64 = 1e-6;

/// Bounded likeness between two feature sets, in [0, 1].
///
/// Every entry present on both sides contributes one score, and the result
/// is the unweighted mean of those scores:
///
/// - cepstral vectors of equal length compare by cosine similarity,
///   clamped to zero (anti-correlation counts as "no similarity", not
///   negative evidence); mismatched lengths are skipped, not fatal;
/// - each scalar pair compares by `1 - |a-b| / max(|a|, |b|, 1e-6)`,
///   clamped to zero.
///
/// An empty set on either side, or no comparable entries at all, scores
/// 0.0 — absence of evidence, not an error. The measure is symmetric, and
/// a non-empty set always scores 1.0 against itself.
pub fn similarity(a: &FeatureSet, b: &FeatureSet) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let mut scores: Vec<f64> = Vec::new();

    if let (Some(x), Some(y)) = (&a.cepstral, &b.cepstral) {
        if x.len() == y.len() && !x.is_empty() {
            scores.push(cosine(x, y).max(0.0));
        }
    }

    for (x, y) in scalar_pairs(a, b) {
        scores.push(scalar_similarity(x, y));
    }

    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().sum::<f64>() / scores.len() as f64
}

/// All scalar entries shared by both sets, in a fixed order: the four
/// always-present basics, then the spectral and prosodic groups when both
/// sides carry them.
fn scalar_pairs(a: &FeatureSet, b: &FeatureSet) -> Vec<(f64, f64)> {
    let mut pairs = vec![
        (a.duration, b.duration),
        (a.rms_energy, b.rms_energy),
        (a.max_amplitude, b.max_amplitude),
        (a.audio_length as f64, b.audio_length as f64),
    ];

    if let (Some(x), Some(y)) = (&a.spectral, &b.spectral) {
        pairs.extend([
            (x.centroid_mean, y.centroid_mean),
            (x.centroid_std, y.centroid_std),
            (x.rolloff_mean, y.rolloff_mean),
            (x.rolloff_std, y.rolloff_std),
            (x.zcr_mean, y.zcr_mean),
            (x.zcr_std, y.zcr_std),
            (x.bandwidth_mean, y.bandwidth_mean),
            (x.bandwidth_std, y.bandwidth_std),
        ]);
    }

    if let (Some(x), Some(y)) = (&a.prosodic, &b.prosodic) {
        pairs.extend([
            (x.pitch_mean, y.pitch_mean),
            (x.pitch_std, y.pitch_std),
            (x.pitch_min, y.pitch_min),
            (x.pitch_max, y.pitch_max),
            (x.energy, y.energy),
            (x.speaking_rate, y.speaking_rate),
            (x.pitch_range, y.pitch_range),
        ]);
    }

    pairs
}

/// Inverse normalized absolute difference, clamped to [0, 1].
/// Two zeros are a perfect match; the 1e-6 floor avoids dividing by zero.
fn scalar_similarity(a: f64, b: f64) -> f64 {
    let scale = a.abs().max(b.abs()).max(SCALE_FLOOR);
    (1.0 - (a - b).abs() / scale).max(0.0)
}

/// Cosine similarity. A zero-norm vector scores 0 against anything.
fn cosine(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{tests::sine_wave, FeatureExtractor, ProsodicStats, SpectralStats};

    fn scalar_only(duration: f64, rms: f64, amp: f64, len: usize) -> FeatureSet {
        FeatureSet {
            duration,
            rms_energy: rms,
            max_amplitude: amp,
            audio_length: len,
            ..FeatureSet::default()
        }
    }

    #[test]
    fn empty_sets_score_zero() {
        let empty = FeatureSet::default();
        let full = scalar_only(1.0, 0.5, 1.0, 100);
        assert_eq!(similarity(&empty, &empty), 0.0);
        assert_eq!(similarity(&empty, &full), 0.0);
        assert_eq!(similarity(&full, &empty), 0.0);
    }

    #[test]
    fn self_similarity_is_one() {
        let extractor = FeatureExtractor::new();
        let features = extractor.extract(&sine_wave(200.0, 16000, 16000));
        assert!((similarity(&features, &features) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn similarity_is_symmetric() {
        let extractor = FeatureExtractor::new();
        let a = extractor.extract(&sine_wave(200.0, 16000, 16000));
        let b = extractor.extract(&sine_wave(320.0, 24000, 16000));
        assert_eq!(similarity(&a, &b), similarity(&b, &a));
    }

    #[test]
    fn similarity_stays_in_unit_interval() {
        let sets = [
            scalar_only(1.0, 0.5, 1.0, 100),
            scalar_only(-3.0, 1e9, 0.0, 50),
            scalar_only(0.0, 0.0, 0.0, 1),
            FeatureSet {
                cepstral: Some(vec![1.0, -2.0, 3.0]),
                ..scalar_only(5.0, 0.1, 1.0, 80000)
            },
            FeatureSet {
                cepstral: Some(vec![-1.0, 2.0, -3.0]),
                ..scalar_only(0.2, 0.9, 1.0, 3200)
            },
        ];
        for a in &sets {
            for b in &sets {
                let s = similarity(a, b);
                assert!((0.0..=1.0).contains(&s), "similarity {s} out of range");
            }
        }
    }

    #[test]
    fn identical_waveforms_score_near_one() {
        let extractor = FeatureExtractor::new();
        let a = extractor.extract(&sine_wave(200.0, 16000, 16000));
        let b = extractor.extract(&sine_wave(200.0, 16000, 16000));
        assert!(similarity(&a, &b) >= 0.99);
    }

    #[test]
    fn anti_correlated_cepstral_clamps_to_zero() {
        let a = FeatureSet {
            cepstral: Some(vec![1.0, 2.0, 3.0]),
            ..scalar_only(1.0, 0.5, 1.0, 100)
        };
        let b = FeatureSet {
            cepstral: Some(vec![-1.0, -2.0, -3.0]),
            ..scalar_only(1.0, 0.5, 1.0, 100)
        };
        // Scalars all match (4 × 1.0), cosine clamps -1 to 0: mean = 4/5.
        assert!((similarity(&a, &b) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn mismatched_cepstral_lengths_skipped() {
        let a = FeatureSet {
            cepstral: Some(vec![1.0, 2.0]),
            ..scalar_only(1.0, 0.5, 1.0, 100)
        };
        let b = FeatureSet {
            cepstral: Some(vec![1.0, 2.0, 3.0]),
            ..scalar_only(1.0, 0.5, 1.0, 100)
        };
        // Vector entry dropped, the four matching scalars remain.
        assert_eq!(similarity(&a, &b), 1.0);
    }

    #[test]
    fn group_only_compared_when_present_on_both_sides() {
        let with_groups = FeatureSet {
            spectral: Some(SpectralStats::default()),
            prosodic: Some(ProsodicStats::default()),
            ..scalar_only(1.0, 0.5, 1.0, 100)
        };
        let basics_only = scalar_only(1.0, 0.5, 1.0, 100);
        // Only the four basics compare, and they match exactly.
        assert_eq!(similarity(&with_groups, &basics_only), 1.0);
    }

    #[test]
    fn scalar_similarity_known_values() {
        assert_eq!(scalar_similarity(1.0, 1.0), 1.0);
        assert_eq!(scalar_similarity(0.0, 0.0), 1.0);
        assert!((scalar_similarity(1.0, 0.3) - 0.3).abs() < 1e-12);
        assert_eq!(scalar_similarity(1.0, -1.0), 0.0);
    }

    #[test]
    fn cosine_zero_norm_scores_zero() {
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }
}
