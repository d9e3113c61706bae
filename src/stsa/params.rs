//! Tracker configuration.

use crate::error::{InvalidParameterSnafu, Result};

use serde::{Deserialize, Serialize};
use snafu::ensure;


/// Parameters of [`FastNoiseTracking`](super::noise::FastNoiseTracking).
///
/// All values are stored as `f64` and converted to the tracker's float type
/// on construction. Missing fields deserialize to their defaults.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TrackerParameters {
    /// Baseline smoothing factor of the noise update.
    #[serde(default = "param_defaults::alpha_n")]
    pub alpha_n: f64,

    /// Smoothing factor of the decision-directed a priori SNR.
    #[serde(default = "param_defaults::alpha_ns")]
    pub alpha_ns: f64,

    /// Smoothing factor of the speech presence probability.
    #[serde(default = "param_defaults::alpha_p")]
    pub alpha_p: f64,

    /// Half-width (in bins) of the frequency smoothing window.
    #[serde(default = "param_defaults::delta_k")]
    pub delta_k: usize,

    /// Frames kept in the a posteriori SNR history beyond the current one.
    #[serde(default = "param_defaults::delta_l")]
    pub delta_l: usize,

    /// Floor of the a priori SNR (linear).
    #[serde(default = "param_defaults::ksi_floor")]
    pub ksi_floor: f64,

    /// Shape parameter of the incomplete gamma weighting.
    #[serde(default = "param_defaults::shape")]
    pub shape: f64,

    /// Upper bound on the exponent of the weighting, prevents overflows.
    #[serde(default = "param_defaults::exponent_max")]
    pub exponent_max: f64,

    /// Lower bound applied to the noise estimate after every frame.
    ///
    /// Disabled by default: zero-valued bins then turn into non-finite
    /// estimates which persist.
    #[serde(default)]
    pub noise_floor: Option<f64>,

    #[serde(default)]
    pub thresholds: PresenceThresholds,
}

impl Default for TrackerParameters {
    fn default() -> Self {
        TrackerParameters {
            alpha_n: param_defaults::alpha_n(),
            alpha_ns: param_defaults::alpha_ns(),
            alpha_p: param_defaults::alpha_p(),
            delta_k: param_defaults::delta_k(),
            delta_l: param_defaults::delta_l(),
            ksi_floor: param_defaults::ksi_floor(),
            shape: param_defaults::shape(),
            exponent_max: param_defaults::exponent_max(),
            noise_floor: None,
            thresholds: PresenceThresholds::default(),
        }
    }
}

impl TrackerParameters {
    pub fn validate(&self) -> Result<()> {
        check_unit("alpha_n", self.alpha_n)?;
        check_unit("alpha_ns", self.alpha_ns)?;
        check_unit("alpha_p", self.alpha_p)?;

        ensure!(self.ksi_floor.is_finite() && self.ksi_floor > 0.0,
                InvalidParameterSnafu { name: "ksi_floor", value: self.ksi_floor });
        ensure!(self.shape.is_finite() && self.shape > 0.0,
                InvalidParameterSnafu { name: "shape", value: self.shape });
        ensure!(self.exponent_max.is_finite(),
                InvalidParameterSnafu { name: "exponent_max", value: self.exponent_max });

        if let Some(floor) = self.noise_floor {
            ensure!(floor.is_finite() && floor >= 0.0,
                    InvalidParameterSnafu { name: "noise_floor", value: floor });
        }

        self.thresholds.validate()
    }
}


/// Frequency dependent thresholds on the smoothed a posteriori SNR above
/// which a bin is considered to contain speech.
///
/// Bins below `low_edge` use `low`, bins in `[low_edge, high_edge)` use
/// `mid`, everything from `high_edge` upwards uses `high`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PresenceThresholds {
    #[serde(default = "param_defaults::low_edge")]
    pub low_edge: f64,          // in Hz

    #[serde(default = "param_defaults::high_edge")]
    pub high_edge: f64,         // in Hz

    #[serde(default = "param_defaults::psi_low")]
    pub low: f64,

    #[serde(default = "param_defaults::psi_mid")]
    pub mid: f64,

    #[serde(default = "param_defaults::psi_high")]
    pub high: f64,
}

impl Default for PresenceThresholds {
    fn default() -> Self {
        PresenceThresholds {
            low_edge: param_defaults::low_edge(),
            high_edge: param_defaults::high_edge(),
            low: param_defaults::psi_low(),
            mid: param_defaults::psi_mid(),
            high: param_defaults::psi_high(),
        }
    }
}

impl PresenceThresholds {
    /// Threshold for a bin centered at frequency `f` (in Hz).
    pub fn at(&self, f: f64) -> f64 {
        if f < self.low_edge {
            self.low
        } else if f < self.high_edge {
            self.mid
        } else {
            self.high
        }
    }

    fn validate(&self) -> Result<()> {
        ensure!(self.low_edge.is_finite() && self.low_edge >= 0.0,
                InvalidParameterSnafu { name: "thresholds.low_edge", value: self.low_edge });
        ensure!(self.high_edge.is_finite() && self.high_edge >= self.low_edge,
                InvalidParameterSnafu { name: "thresholds.high_edge", value: self.high_edge });

        for &(name, value) in &[
            ("thresholds.low", self.low),
            ("thresholds.mid", self.mid),
            ("thresholds.high", self.high),
        ] {
            ensure!(value.is_finite(), InvalidParameterSnafu { name, value });
        }

        Ok(())
    }
}


fn check_unit(name: &'static str, value: f64) -> Result<()> {
    ensure!((0.0..=1.0).contains(&value), InvalidParameterSnafu { name, value });
    Ok(())
}


pub mod param_defaults {
    pub fn alpha_n() -> f64 {
        0.8
    }

    pub fn alpha_ns() -> f64 {
        0.98
    }

    pub fn alpha_p() -> f64 {
        0.2
    }

    pub fn delta_k() -> usize {
        1
    }

    pub fn delta_l() -> usize {
        2
    }

    pub fn ksi_floor() -> f64 {
        10f64.powf(-15.0 / 10.0)
    }

    pub fn shape() -> f64 {
        1e-5
    }

    pub fn exponent_max() -> f64 {
        10.0
    }

    pub fn low_edge() -> f64 {
        1000.0
    }

    pub fn high_edge() -> f64 {
        3000.0
    }

    pub fn psi_low() -> f64 {
        5.0
    }

    pub fn psi_mid() -> f64 {
        6.5
    }

    pub fn psi_high() -> f64 {
        8.0
    }
}
