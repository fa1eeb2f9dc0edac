use crate::config::EngineConfig;

/// An audio buffer with a fixed sample rate.
///
/// Samples are f32 in [-1, 1]. Multi-channel audio is stored interleaved
/// and down-mixed to mono before any feature work; every consumer in this
/// crate operates on mono signals.
#[derive(Debug, Clone)]
pub struct Waveform {
    samples: Vec<f32>,
    channels: u16,
    sample_rate: u32,
}

impl Waveform {
    /// Wraps a mono sample buffer.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            channels: 1,
            sample_rate,
        }
    }

    /// Wraps an interleaved multi-channel buffer. A channel count of zero
    /// is treated as mono.
    pub fn interleaved(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Self {
        Self {
            samples,
            channels: channels.max(1),
            sample_rate,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Number of sample frames (one per channel group).
    pub fn len(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Recording length in seconds, before any trimming.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / self.sample_rate as f64
    }

    /// Averages interleaved channels into a single mono buffer.
    /// Mono input is returned as a plain copy.
    pub fn to_mono(&self) -> Vec<f32> {
        if self.channels == 1 {
            return self.samples.clone();
        }
        let ch = self.channels as usize;
        self.samples
            .chunks(ch)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    }

    /// RMS level of the raw (un-preprocessed) signal.
    pub fn rms_level(&self) -> f32 {
        rms(&self.samples)
    }

    /// True when the RMS level falls below `threshold`.
    ///
    /// This is the pre-extraction guard: a silent recording is rejected
    /// outright instead of producing an empty feature set downstream.
    pub fn is_silent(&self, threshold: f32) -> bool {
        self.rms_level() < threshold
    }
}

/// RMS of a sample buffer. Empty input yields 0.
pub(crate) fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_sq / samples.len() as f64).sqrt() as f32
}

/// Runs the full preprocessing chain: down-mix, peak-normalize, trim
/// leading/trailing silence, pre-emphasize.
///
/// Total function with no failure path. A fully silent buffer passes
/// through normalize and trim unchanged; an empty result after trimming
/// is a valid outcome the extractor detects on its own.
pub fn preprocess(wave: &Waveform, cfg: &EngineConfig) -> Vec<f32> {
    let mono = wave.to_mono();
    let normalized = normalize(mono);
    let trimmed = trim_silence(&normalized, cfg.trim_threshold);
    pre_emphasis(trimmed, cfg.pre_emphasis)
}

/// Scales the buffer so the peak absolute sample is 1. A silent buffer
/// (peak 0) is returned unchanged rather than divided by zero.
fn normalize(mut samples: Vec<f32>) -> Vec<f32> {
    let peak = samples.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()));
    if peak > 0.0 {
        for s in &mut samples {
            *s /= peak;
        }
    }
    samples
}

/// Returns the inclusive sub-range from the first to the last sample whose
/// absolute value exceeds `threshold`. If nothing exceeds it, the whole
/// buffer is returned so fully silent input passes through.
fn trim_silence(samples: &[f32], threshold: f32) -> &[f32] {
    let first = samples.iter().position(|&s| s.abs() > threshold);
    let last = samples.iter().rposition(|&s| s.abs() > threshold);
    match (first, last) {
        (Some(start), Some(end)) => &samples[start..=end],
        _ => samples,
    }
}

/// First-order high-pass difference filter: y[0] = x[0],
/// y[i] = x[i] - alpha * x[i-1]. Boosts the high-frequency content that
/// carries formant detail before spectral analysis.
fn pre_emphasis(samples: &[f32], alpha: f32) -> Vec<f32> {
    let mut out = Vec::with_capacity(samples.len());
    if let Some(&first) = samples.first() {
        out.push(first);
        for i in 1..samples.len() {
            out.push(samples[i] - alpha * samples[i - 1]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> EngineConfig {
        EngineConfig::default()
    }

    #[test]
    fn downmix_averages_channels() {
        let wave = Waveform::interleaved(vec![1.0, 0.0, 0.5, 0.5, -1.0, 1.0], 2, 16000);
        assert_eq!(wave.len(), 3);
        assert_eq!(wave.to_mono(), vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn mono_passthrough() {
        let wave = Waveform::new(vec![0.1, -0.2, 0.3], 16000);
        assert_eq!(wave.to_mono(), vec![0.1, -0.2, 0.3]);
    }

    #[test]
    fn normalize_peaks_at_one() {
        let out = normalize(vec![0.5, -0.25, 0.1]);
        assert_eq!(out[0], 1.0);
        assert_eq!(out[1], -0.5);
    }

    #[test]
    fn normalize_silence_unchanged() {
        let out = normalize(vec![0.0, 0.0, 0.0]);
        assert_eq!(out, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn trim_keeps_inclusive_range() {
        let samples = vec![0.0, 0.0, 0.5, 0.2, 0.5, 0.0, 0.0];
        let trimmed = trim_silence(&samples, 0.01);
        assert_eq!(trimmed, &[0.5, 0.2, 0.5]);
    }

    #[test]
    fn trim_silent_buffer_unchanged() {
        let samples = vec![0.0, 0.005, 0.0];
        let trimmed = trim_silence(&samples, 0.01);
        assert_eq!(trimmed.len(), 3);
    }

    #[test]
    fn pre_emphasis_first_sample_kept() {
        let out = pre_emphasis(&[1.0, 1.0, 1.0], 0.97);
        assert_eq!(out[0], 1.0);
        assert!((out[1] - 0.03).abs() < 1e-6);
        assert!((out[2] - 0.03).abs() < 1e-6);
    }

    #[test]
    fn pre_emphasis_empty_and_single() {
        assert!(pre_emphasis(&[], 0.97).is_empty());
        assert_eq!(pre_emphasis(&[0.4], 0.97), vec![0.4]);
    }

    #[test]
    fn preprocess_total_on_empty() {
        let wave = Waveform::new(vec![], 16000);
        assert!(preprocess(&wave, &cfg()).is_empty());
    }

    #[test]
    fn normalize_trim_idempotent_on_clean_input() {
        // Already normalized, already trimmed, silence-free input must pass
        // through normalize + trim unchanged.
        let samples = vec![1.0, -0.5, 0.25, -1.0];
        let once = trim_silence(&normalize(samples.clone()), 0.01).to_vec();
        let twice = trim_silence(&normalize(once.clone()), 0.01).to_vec();
        assert_eq!(once, samples);
        assert_eq!(twice, once);
    }

    #[test]
    fn silent_waveform_detected() {
        let wave = Waveform::new(vec![0.0; 16000], 16000);
        assert!(wave.is_silent(0.01));
        assert_eq!(wave.duration_secs(), 1.0);
    }

    #[test]
    fn loud_waveform_not_silent() {
        let samples: Vec<f32> = (0..16000)
            .map(|i| (i as f32 * 0.1).sin() * 0.5)
            .collect();
        let wave = Waveform::new(samples, 16000);
        assert!(!wave.is_silent(0.01));
    }
}
