//! Short-time spectral analysis primitives: framing, windowing, FFT,
//! mel filterbank, and the DCT that turns log mel energies into cepstra.
//!
//! Everything here is deterministic, allocation-per-call, f64 math.

use std::f64::consts::PI;

/// Splits a mono signal into fixed-size analysis frames at the given hop.
///
/// A signal shorter than one frame yields a single zero-padded frame so
/// that any non-empty input produces at least one spectrum. An empty
/// signal yields no frames.
pub(crate) fn split_frames(samples: &[f32], frame_size: usize, hop_size: usize) -> Vec<Vec<f64>> {
    if samples.is_empty() || frame_size == 0 || hop_size == 0 {
        return Vec::new();
    }
    if samples.len() < frame_size {
        let mut frame = vec![0.0f64; frame_size];
        for (dst, &src) in frame.iter_mut().zip(samples.iter()) {
            *dst = src as f64;
        }
        return vec![frame];
    }
    let count = (samples.len() - frame_size) / hop_size + 1;
    let mut frames = Vec::with_capacity(count);
    for f in 0..count {
        let offset = f * hop_size;
        frames.push(
            samples[offset..offset + frame_size]
                .iter()
                .map(|&s| s as f64)
                .collect(),
        );
    }
    frames
}

/// Hamming window of length `n`.
pub(crate) fn hamming_window(n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![1.0];
    }
    (0..n)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / (n - 1) as f64).cos())
        .collect()
}

pub(crate) fn next_pow2(n: usize) -> usize {
    let mut p = 1;
    while p < n {
        p <<= 1;
    }
    p
}

/// Magnitude spectrum of one windowed frame.
///
/// The frame is zero-padded to the next power of two, transformed with an
/// in-place radix-2 FFT, and reduced to the `fft_size / 2 + 1` non-redundant
/// magnitude bins.
pub(crate) fn magnitude_spectrum(frame: &[f64], window: &[f64]) -> Vec<f64> {
    let fft_size = next_pow2(frame.len());
    let mut re = vec![0.0f64; fft_size];
    let mut im = vec![0.0f64; fft_size];
    for i in 0..frame.len() {
        re[i] = frame[i] * window[i];
    }
    fft_in_place(&mut re, &mut im);

    let half = fft_size / 2 + 1;
    (0..half).map(|k| (re[k] * re[k] + im[k] * im[k]).sqrt()).collect()
}

/// In-place iterative radix-2 Cooley-Tukey FFT over split real/imaginary
/// buffers. Both slices must have the same power-of-two length.
pub(crate) fn fft_in_place(re: &mut [f64], im: &mut [f64]) {
    let n = re.len();
    debug_assert_eq!(n, im.len());
    debug_assert!(n.is_power_of_two());
    if n <= 1 {
        return;
    }

    // Bit-reversal permutation.
    let mut j = 0usize;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j ^= bit;
        if i < j {
            re.swap(i, j);
            im.swap(i, j);
        }
    }

    // Butterflies, doubling the transform size each pass.
    let mut size = 2;
    while size <= n {
        let half = size / 2;
        let step = -2.0 * PI / size as f64;
        for start in (0..n).step_by(size) {
            for k in 0..half {
                let angle = step * k as f64;
                let (w_re, w_im) = (angle.cos(), angle.sin());
                let a = start + k;
                let b = a + half;
                let t_re = w_re * re[b] - w_im * im[b];
                let t_im = w_re * im[b] + w_im * re[b];
                re[b] = re[a] - t_re;
                im[b] = im[a] - t_im;
                re[a] += t_re;
                im[a] += t_im;
            }
        }
        size <<= 1;
    }
}

pub(crate) fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

pub(crate) fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10.0f64.powf(mel / 2595.0) - 1.0)
}

/// One triangular mel filter stored sparsely: a starting FFT bin and the
/// weights for the bins it covers.
pub(crate) struct MelFilter {
    pub start_bin: usize,
    pub weights: Vec<f64>,
}

impl MelFilter {
    /// Weighted sum of the covered bins of a power spectrum.
    pub fn apply(&self, power: &[f64]) -> f64 {
        let mut energy = 0.0;
        for (i, &w) in self.weights.iter().enumerate() {
            let bin = self.start_bin + i;
            if bin >= power.len() {
                break;
            }
            energy += w * power[bin];
        }
        energy
    }
}

/// Builds `num_filters` triangular filters equally spaced on the mel scale
/// between `low_hz` and `high_hz`.
pub(crate) fn mel_filterbank(
    num_filters: usize,
    fft_size: usize,
    sample_rate: u32,
    low_hz: f64,
    high_hz: f64,
) -> Vec<MelFilter> {
    let half = fft_size / 2 + 1;
    let bin_hz = sample_rate as f64 / fft_size as f64;
    let mel_low = hz_to_mel(low_hz);
    let mel_high = hz_to_mel(high_hz);

    let edge_hz: Vec<f64> = (0..num_filters + 2)
        .map(|i| mel_to_hz(mel_low + i as f64 * (mel_high - mel_low) / (num_filters + 1) as f64))
        .collect();

    let mut filters = Vec::with_capacity(num_filters);
    for m in 0..num_filters {
        let (left, center, right) = (edge_hz[m], edge_hz[m + 1], edge_hz[m + 2]);
        let start_bin = ((left / bin_hz).ceil() as usize).min(half.saturating_sub(1));
        let end_bin = ((right / bin_hz).floor() as usize).min(half.saturating_sub(1));

        let mut weights = Vec::with_capacity(end_bin.saturating_sub(start_bin) + 1);
        for bin in start_bin..=end_bin {
            let freq = bin as f64 * bin_hz;
            let w = if freq <= center {
                if center > left { (freq - left) / (center - left) } else { 1.0 }
            } else if right > center {
                (right - freq) / (right - center)
            } else {
                1.0
            };
            weights.push(w.max(0.0));
        }
        filters.push(MelFilter { start_bin, weights });
    }
    filters
}

/// Orthonormal DCT-II of `input`, truncated to the first `n_out` terms.
/// Maps log mel energies to cepstral coefficients.
pub(crate) fn dct_ii(input: &[f64], n_out: usize) -> Vec<f64> {
    let n = input.len();
    if n == 0 {
        return Vec::new();
    }
    let scale0 = (1.0 / n as f64).sqrt();
    let scale = (2.0 / n as f64).sqrt();
    (0..n_out.min(n))
        .map(|k| {
            let sum: f64 = input
                .iter()
                .enumerate()
                .map(|(i, &x)| x * (PI * k as f64 * (2.0 * i as f64 + 1.0) / (2.0 * n as f64)).cos())
                .sum();
            if k == 0 { sum * scale0 } else { sum * scale }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_frames_counts() {
        let samples = vec![0.0f32; 2048 + 512 * 3];
        let frames = split_frames(&samples, 2048, 512);
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[0].len(), 2048);
    }

    #[test]
    fn split_frames_short_input_zero_padded() {
        let samples = vec![1.0f32; 100];
        let frames = split_frames(&samples, 2048, 512);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0][99], 1.0);
        assert_eq!(frames[0][100], 0.0);
    }

    #[test]
    fn split_frames_empty() {
        assert!(split_frames(&[], 2048, 512).is_empty());
    }

    #[test]
    fn hamming_symmetric() {
        let w = hamming_window(64);
        assert!((w[0] - 0.08).abs() < 1e-9);
        for i in 0..32 {
            assert!((w[i] - w[63 - i]).abs() < 1e-12);
        }
    }

    #[test]
    fn fft_impulse_is_flat() {
        // FFT of a unit impulse is all-ones.
        let mut re = vec![0.0; 8];
        let mut im = vec![0.0; 8];
        re[0] = 1.0;
        fft_in_place(&mut re, &mut im);
        for k in 0..8 {
            assert!((re[k] - 1.0).abs() < 1e-12);
            assert!(im[k].abs() < 1e-12);
        }
    }

    #[test]
    fn fft_parseval() {
        let n = 16;
        let mut re: Vec<f64> = (0..n)
            .map(|i| (2.0 * PI * i as f64 / n as f64).sin())
            .collect();
        let mut im = vec![0.0; n];
        let time_energy: f64 = re.iter().map(|x| x * x).sum();
        fft_in_place(&mut re, &mut im);
        let freq_energy: f64 = re.iter().zip(&im).map(|(r, i)| r * r + i * i).sum();
        assert!((time_energy * n as f64 - freq_energy).abs() < 1e-8);
    }

    #[test]
    fn sine_peak_lands_in_expected_bin() {
        // 1 kHz sine at 16 kHz over a 2048-point FFT: bin = 1000 / (16000/2048) = 128.
        let n = 2048;
        let frame: Vec<f64> = (0..n)
            .map(|i| (2.0 * PI * 1000.0 * i as f64 / 16000.0).sin())
            .collect();
        let window = vec![1.0; n];
        let spec = magnitude_spectrum(&frame, &window);
        let peak = spec
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 128);
    }

    #[test]
    fn mel_hz_roundtrip() {
        for &hz in &[0.0, 100.0, 440.0, 1000.0, 8000.0] {
            let back = mel_to_hz(hz_to_mel(hz));
            assert!((hz - back).abs() < 1e-6);
        }
    }

    #[test]
    fn filterbank_covers_band() {
        let filters = mel_filterbank(26, 2048, 16000, 0.0, 8000.0);
        assert_eq!(filters.len(), 26);
        for f in &filters {
            assert!(!f.weights.is_empty());
            assert!(f.weights.iter().all(|&w| (0.0..=1.0).contains(&w)));
        }
    }

    #[test]
    fn dct_of_constant_concentrates_in_first_term() {
        let input = vec![2.0; 26];
        let out = dct_ii(&input, 13);
        assert_eq!(out.len(), 13);
        assert!(out[0] > 1.0);
        for &c in &out[1..] {
            assert!(c.abs() < 1e-10);
        }
    }

    #[test]
    fn dct_empty_input() {
        assert!(dct_ii(&[], 13).is_empty());
    }
}
