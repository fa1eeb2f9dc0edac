use serde::{Deserialize, Serialize};

/// Tuning knobs for the verification pipeline.
///
/// Every threshold and DSP parameter the engine reads lives here, so callers
/// can load the whole surface from their own configuration layer and hand it
/// over once at construction. Defaults match the reference deployment:
/// 16 kHz mono input, 13 cepstral coefficients over 2048-sample frames,
/// 0.6/0.4 fusion between local similarity and external corroboration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Input sample rate in Hz (default: 16000).
    pub sample_rate: u32,
    /// Number of cepstral coefficients per frame (default: 13).
    pub num_cepstra: usize,
    /// Number of mel filterbank channels feeding the DCT (default: 26).
    pub num_mel_filters: usize,
    /// Analysis frame length in samples (default: 2048).
    pub frame_size: usize,
    /// Hop between successive frames in samples (default: 512).
    pub hop_size: usize,
    /// Pre-emphasis filter coefficient (default: 0.97).
    pub pre_emphasis: f32,
    /// Absolute amplitude below which leading/trailing samples are
    /// trimmed as silence (default: 0.01).
    pub trim_threshold: f32,
    /// RMS level below which a whole recording counts as silent
    /// (default: 0.01).
    pub silence_threshold: f32,
    /// Minimum raw similarity required for verification to accept
    /// (default: 0.8).
    pub similarity_threshold: f64,
    /// Minimum fused confidence required to accept (default: 0.7).
    pub min_confidence: f64,
    /// Similarity above which the corroboration oracle is consulted
    /// during verification (default: 0.6).
    pub trigger_threshold: f64,
    /// Minimum similarity for a catalog entry to become a candidate
    /// during open identification (default: 0.6).
    pub discovery_threshold: f64,
    /// Weight of the local similarity score in the fused confidence
    /// (default: 0.6).
    pub similarity_weight: f64,
    /// Weight of the corroboration score in the fused confidence
    /// (default: 0.4).
    pub corroboration_weight: f64,
    /// Lower bound of the pitch search band in Hz (default: 50).
    pub pitch_min_hz: f64,
    /// Upper bound of the pitch search band in Hz (default: 500).
    pub pitch_max_hz: f64,
    /// Fraction of total spectral energy defining the rolloff frequency
    /// (default: 0.85).
    pub rolloff_fraction: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            num_cepstra: 13,
            num_mel_filters: 26,
            frame_size: 2048,
            hop_size: 512,
            pre_emphasis: 0.97,
            trim_threshold: 0.01,
            silence_threshold: 0.01,
            similarity_threshold: 0.8,
            min_confidence: 0.7,
            trigger_threshold: 0.6,
            discovery_threshold: 0.6,
            similarity_weight: 0.6,
            corroboration_weight: 0.4,
            pitch_min_hz: 50.0,
            pitch_max_hz: 500.0,
            rolloff_fraction: 0.85,
        }
    }
}

/// Neutral corroboration score used whenever the oracle is skipped or
/// returns an unusable value. Neither rewards nor penalizes the match.
pub const NEUTRAL_CORROBORATION: f64 = 0.5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_config_default() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.sample_rate, 16000);
        assert_eq!(cfg.num_cepstra, 13);
        assert_eq!(cfg.frame_size, 2048);
        assert_eq!(cfg.hop_size, 512);
        assert_eq!(cfg.similarity_threshold, 0.8);
        assert_eq!(cfg.min_confidence, 0.7);
        assert_eq!(cfg.similarity_weight + cfg.corroboration_weight, 1.0);
    }

    #[test]
    fn engine_config_json_roundtrip() {
        let cfg = EngineConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.num_mel_filters, cfg.num_mel_filters);
        assert_eq!(back.trigger_threshold, cfg.trigger_threshold);
    }
}
