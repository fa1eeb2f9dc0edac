use crate::features::FeatureSet;

/// Renders a feature set into a short deterministic signature string.
///
/// The fingerprint concatenates the first 8 cepstral entries and the four
/// key prosodic scalars (pitch mean, pitch std, energy, speaking rate),
/// each at three decimal places, joined by underscores. It is a display
/// and pre-filter artifact: near-identical voices can collide at this
/// precision, so it must never be used as a security token.
///
/// Missing groups are simply left out, and an empty feature set yields an
/// empty string. Bit-identical inputs always produce identical output.
pub fn fingerprint(features: &FeatureSet) -> String {
    if features.is_empty() {
        return String::new();
    }

    let mut parts: Vec<String> = Vec::new();

    if let Some(cepstral) = &features.cepstral {
        parts.extend(cepstral.iter().take(8).map(|v| format!("{v:.3}")));
    }

    if let Some(p) = &features.prosodic {
        for v in [p.pitch_mean, p.pitch_std, p.energy, p.speaking_rate] {
            parts.push(format!("{v:.3}"));
        }
    }

    parts.join("_")
}
