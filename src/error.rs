use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a verification or identification attempt was turned down.
///
/// The engine always returns a decision value instead of failing the call,
/// so the reject taxonomy lives on the result rather than in `Result`
/// plumbing. Each variant maps to a distinct short-circuit point in the
/// pipeline: silence is caught before extraction, extraction failure before
/// scoring, and the candidate/confidence checks during the decision itself.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum RejectReason {
    /// RMS level of the raw recording fell below the silence threshold.
    #[error("audio too quiet or silent")]
    AudioSilent,

    /// Preprocessing left no usable samples, so no features exist to compare.
    #[error("could not extract voice features")]
    ExtractionFailed,

    /// The claimed identity has no stored voice profiles to compare against.
    #[error("no voice profiles stored for claimed identity")]
    UnknownIdentity,

    /// Open identification found no catalog entry above the discovery
    /// threshold. Corroboration is never attempted in this case.
    #[error("no matching voice found in catalog")]
    NoCandidate,

    /// A candidate existed but the similarity/confidence gates failed.
    #[error("verification confidence too low: {confidence:.2}")]
    LowConfidence { confidence: f64 },
}
