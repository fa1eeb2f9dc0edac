use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::dsp;
use crate::waveform::{preprocess, rms, Waveform};

/// Frame-level spectral shape summary: mean and standard deviation of the
/// centroid, rolloff frequency, zero-crossing rate, and bandwidth.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpectralStats {
    pub centroid_mean: f64,
    pub centroid_std: f64,
    pub rolloff_mean: f64,
    pub rolloff_std: f64,
    pub zcr_mean: f64,
    pub zcr_std: f64,
    pub bandwidth_mean: f64,
    pub bandwidth_std: f64,
}

/// Pitch and rhythm descriptors. Pitch statistics cover only the frames
/// where a pitch was actually detected; unvoiced frames are excluded
/// entirely so they cannot drag the mean toward zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProsodicStats {
    pub pitch_mean: f64,
    pub pitch_std: f64,
    pub pitch_min: f64,
    pub pitch_max: f64,
    /// Mean squared amplitude of the preprocessed signal.
    pub energy: f64,
    /// Voiced-frame density scaled by the sample rate; a rough proxy for
    /// how continuously the speaker was talking.
    pub speaking_rate: f64,
    pub pitch_range: f64,
}

/// Compact numeric signature of one recording.
///
/// The basic scalars are always filled in. Each feature group is optional:
/// a group that could not be computed is simply absent, and downstream
/// similarity scoring only compares groups present on both sides. An empty
/// set (no groups, zero `audio_length`) means extraction failed and must be
/// treated as such, never as a recording of zeros.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    /// Recording length in seconds, measured before silence trimming.
    pub duration: f64,
    /// RMS of the preprocessed signal.
    pub rms_energy: f64,
    /// Peak absolute amplitude of the preprocessed signal.
    pub max_amplitude: f64,
    /// Sample count after preprocessing.
    pub audio_length: usize,
    /// Flattened per-coefficient summary of the cepstral tracks:
    /// mean, std, min, max for each coefficient, 4·N values total.
    pub cepstral: Option<Vec<f64>>,
    pub spectral: Option<SpectralStats>,
    pub prosodic: Option<ProsodicStats>,
}

impl FeatureSet {
    /// True when extraction produced no usable data.
    pub fn is_empty(&self) -> bool {
        self.audio_length == 0
            && self.cepstral.is_none()
            && self.spectral.is_none()
            && self.prosodic.is_none()
    }

    /// Serializes for the storage collaborator. The JSON shape is the
    /// stable persistence contract for enrolled profiles.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes a stored profile back into a feature set.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Turns a raw waveform into a [`FeatureSet`].
///
/// Preprocessing (down-mix, normalize, trim, pre-emphasis) happens
/// internally; callers hand over the recording as captured. Extraction
/// never fails: silent or empty input yields an empty feature set, and a
/// feature group that cannot be computed is dropped from the result.
pub struct FeatureExtractor {
    config: EngineConfig,
}

impl FeatureExtractor {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Extracts cepstral, spectral, and prosodic features plus the
    /// always-present basic scalars.
    pub fn extract(&self, wave: &Waveform) -> FeatureSet {
        let processed = preprocess(wave, &self.config);

        let peak = processed.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()));
        if processed.is_empty() || peak <= self.config.trim_threshold {
            warn!(
                samples = processed.len(),
                "audio empty or silent after preprocessing, no features extracted"
            );
            return FeatureSet::default();
        }

        let frames = dsp::split_frames(&processed, self.config.frame_size, self.config.hop_size);
        let window = dsp::hamming_window(frames.first().map_or(0, Vec::len));
        let spectra: Vec<Vec<f64>> = frames
            .iter()
            .map(|f| dsp::magnitude_spectrum(f, &window))
            .collect();

        let cepstral = self.cepstral_stats(&spectra);
        if cepstral.is_none() {
            warn!("cepstral feature group skipped");
        }
        let spectral = self.spectral_stats(&frames, &spectra);
        let prosodic = self.prosodic_stats(&processed, &spectra);

        debug!(
            frames = frames.len(),
            cepstral = cepstral.is_some(),
            spectral = spectral.is_some(),
            "feature extraction complete"
        );

        FeatureSet {
            duration: wave.duration_secs(),
            rms_energy: rms(&processed) as f64,
            max_amplitude: peak as f64,
            audio_length: processed.len(),
            cepstral,
            spectral,
            prosodic,
        }
    }

    /// Mel-frequency cepstral coefficients summarized across frames.
    ///
    /// Each frame's power spectrum runs through the mel filterbank, a log,
    /// and an orthonormal DCT-II. The per-coefficient track over all frames
    /// is then reduced to (mean, std, min, max), flattened in coefficient
    /// order.
    fn cepstral_stats(&self, spectra: &[Vec<f64>]) -> Option<Vec<f64>> {
        let n_cepstra = self.config.num_cepstra;
        let n_filters = self.config.num_mel_filters;
        if spectra.is_empty() || n_cepstra == 0 || n_filters < n_cepstra {
            return None;
        }

        let fft_size = dsp::next_pow2(self.config.frame_size);
        let filterbank = dsp::mel_filterbank(
            n_filters,
            fft_size,
            self.config.sample_rate,
            0.0,
            self.config.sample_rate as f64 / 2.0,
        );

        // coefficient tracks: [n_cepstra][n_frames]
        let mut tracks = vec![Vec::with_capacity(spectra.len()); n_cepstra];
        for spectrum in spectra {
            let power: Vec<f64> = spectrum.iter().map(|&m| m * m).collect();
            let log_mel: Vec<f64> = filterbank
                .iter()
                .map(|f| f.apply(&power).max(1e-10).ln())
                .collect();
            let coeffs = dsp::dct_ii(&log_mel, n_cepstra);
            for (track, &c) in tracks.iter_mut().zip(coeffs.iter()) {
                track.push(c);
            }
        }

        let mut stats = Vec::with_capacity(4 * n_cepstra);
        for track in &tracks {
            let (mean, std, min, max) = summarize(track);
            stats.extend([mean, std, min, max]);
        }
        Some(stats)
    }

    /// Per-frame spectral centroid, rolloff, zero-crossing rate, and
    /// bandwidth, each reduced to mean and standard deviation.
    fn spectral_stats(&self, frames: &[Vec<f64>], spectra: &[Vec<f64>]) -> Option<SpectralStats> {
        if spectra.is_empty() {
            return None;
        }
        let fft_size = dsp::next_pow2(self.config.frame_size);
        let bin_hz = self.config.sample_rate as f64 / fft_size as f64;

        let mut centroids = Vec::with_capacity(spectra.len());
        let mut rolloffs = Vec::with_capacity(spectra.len());
        let mut zcrs = Vec::with_capacity(spectra.len());
        let mut bandwidths = Vec::with_capacity(spectra.len());

        for (frame, spectrum) in frames.iter().zip(spectra.iter()) {
            let total: f64 = spectrum.iter().sum();

            let centroid = if total > 0.0 {
                spectrum
                    .iter()
                    .enumerate()
                    .map(|(k, &m)| k as f64 * bin_hz * m)
                    .sum::<f64>()
                    / total
            } else {
                0.0
            };
            centroids.push(centroid);

            // Rolloff: lowest frequency below which the configured fraction
            // of the total spectral magnitude lies.
            let target = total * self.config.rolloff_fraction;
            let mut cumulative = 0.0;
            let mut rolloff = 0.0;
            for (k, &m) in spectrum.iter().enumerate() {
                cumulative += m;
                if cumulative >= target {
                    rolloff = k as f64 * bin_hz;
                    break;
                }
            }
            rolloffs.push(rolloff);

            let crossings = frame
                .windows(2)
                .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
                .count();
            zcrs.push(crossings as f64 / frame.len() as f64);

            let bandwidth = if total > 0.0 {
                (spectrum
                    .iter()
                    .enumerate()
                    .map(|(k, &m)| {
                        let d = k as f64 * bin_hz - centroid;
                        d * d * m
                    })
                    .sum::<f64>()
                    / total)
                    .sqrt()
            } else {
                0.0
            };
            bandwidths.push(bandwidth);
        }

        let (centroid_mean, centroid_std, _, _) = summarize(&centroids);
        let (rolloff_mean, rolloff_std, _, _) = summarize(&rolloffs);
        let (zcr_mean, zcr_std, _, _) = summarize(&zcrs);
        let (bandwidth_mean, bandwidth_std, _, _) = summarize(&bandwidths);

        Some(SpectralStats {
            centroid_mean,
            centroid_std,
            rolloff_mean,
            rolloff_std,
            zcr_mean,
            zcr_std,
            bandwidth_mean,
            bandwidth_std,
        })
    }

    /// Pitch statistics over voiced frames, overall energy, and speaking
    /// rate. A frame is voiced when the strongest peak inside the pitch
    /// search band is prominent relative to the frame's overall peak.
    fn prosodic_stats(&self, processed: &[f32], spectra: &[Vec<f64>]) -> Option<ProsodicStats> {
        if spectra.is_empty() || processed.is_empty() {
            return None;
        }
        let fft_size = dsp::next_pow2(self.config.frame_size);
        let bin_hz = self.config.sample_rate as f64 / fft_size as f64;
        let min_bin = (self.config.pitch_min_hz / bin_hz).ceil() as usize;
        let max_bin = (self.config.pitch_max_hz / bin_hz).floor() as usize;

        let mut voiced_pitches = Vec::new();
        for spectrum in spectra {
            let frame_peak = spectrum.iter().fold(0.0f64, |acc, &m| acc.max(m));
            if frame_peak <= 0.0 || min_bin >= spectrum.len() {
                continue;
            }
            let hi = max_bin.min(spectrum.len() - 1);
            let (peak_bin, peak_mag) = spectrum[min_bin..=hi]
                .iter()
                .enumerate()
                .fold((min_bin, 0.0f64), |(bb, bm), (i, &m)| {
                    if m > bm { (min_bin + i, m) } else { (bb, bm) }
                });
            // Prominence gate: the in-band peak must carry a meaningful
            // share of the frame's strongest component.
            if peak_mag >= 0.1 * frame_peak && peak_mag > 1e-9 {
                voiced_pitches.push(peak_bin as f64 * bin_hz);
            }
        }

        let energy = processed
            .iter()
            .map(|&s| (s as f64) * (s as f64))
            .sum::<f64>()
            / processed.len() as f64;
        let speaking_rate =
            voiced_pitches.len() as f64 / processed.len() as f64 * self.config.sample_rate as f64;

        let (pitch_mean, pitch_std, pitch_min, pitch_max) = if voiced_pitches.is_empty() {
            (0.0, 0.0, 0.0, 0.0)
        } else {
            summarize(&voiced_pitches)
        };

        Some(ProsodicStats {
            pitch_mean,
            pitch_std,
            pitch_min,
            pitch_max,
            energy,
            speaking_rate,
            pitch_range: pitch_max - pitch_min,
        })
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// (mean, population std, min, max) of a non-empty slice.
fn summarize(values: &[f64]) -> (f64, f64, f64, f64) {
    debug_assert!(!values.is_empty());
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|&v| (v - mean) * (v - mean)).sum::<f64>() / n;
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    (mean, variance.sqrt(), min, max)
}
