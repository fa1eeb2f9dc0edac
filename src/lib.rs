//! Voice-based identity verification: feature extraction and similarity
//! matching over short speech recordings.
//!
//! # Architecture
//!
//! The pipeline turns a raw waveform into a decision in four stages:
//!
//! 1. [`waveform::preprocess`]: down-mix, normalize, trim silence, pre-emphasize
//! 2. [`FeatureExtractor::extract`]: cepstral + spectral + prosodic [`FeatureSet`]
//! 3. [`similarity`]: bounded [0, 1] likeness between two feature sets
//! 4. [`DecisionEngine`]: fuse similarity with external corroboration,
//!    apply threshold policy, produce an [`Identification`]
//!
//! [`fingerprint`] renders a feature set into a short signature string for
//! logging and fast pre-filtering.
//!
//! # Collaborators
//!
//! The engine is pure computation over in-process data. Capture devices,
//! profile storage, and the corroboration service live outside; the latter
//! plugs in through the [`CorroborationOracle`] trait and defaults to a
//! neutral prior whenever unavailable.
//!
//! # Determinism
//!
//! There is no randomness anywhere in this crate. Identical inputs always
//! produce identical feature sets, fingerprints, scores, and decisions.

pub mod config;
pub mod decision;
mod dsp;
pub mod error;
pub mod features;
mod fingerprint;
mod similarity;
pub mod waveform;

pub use config::{EngineConfig, NEUTRAL_CORROBORATION};
pub use decision::{
    CorroborationOracle, DecisionEngine, EnrollmentSample, FixedOracle, Identification,
    NoCorroboration, StoredProfile,
};
pub use error::RejectReason;
pub use features::{FeatureExtractor, FeatureSet, ProsodicStats, SpectralStats};
pub use fingerprint::fingerprint;
pub use similarity::similarity;
pub use waveform::Waveform;
