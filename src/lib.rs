//! Noise power spectral density tracking for single-channel speech
//! enhancement.
//!
//! The core is [`stsa::FastNoiseTracking`], a recursive per-frame estimator
//! combining a decision-directed SNR model, a time and frequency smoothed
//! speech presence detector, and an MMSE estimate of the noise power.
//! Trackers keep all state per instance; run one per channel.

pub mod error;
pub mod ft;
pub mod math;
pub mod stsa;
pub mod utils;
pub mod wave;
pub mod window;

pub use error::{Error, Result};
