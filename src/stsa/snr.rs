use crate::math::max_nan;

use num::Float;


/// Decision-directed a priori SNR estimation.
///
/// Blends the SNR implied by the previous frame's speech estimate with the
/// instantaneous maximum likelihood estimate `max(gamma - 1, 0)`, then
/// applies a lower bound.
#[derive(Debug, Clone, Copy)]
pub struct DecisionDirected<T> {
    alpha: T,
    floor: T,
}

impl<T: Float> DecisionDirected<T> {
    pub fn new(alpha: T, floor: T) -> Self {
        DecisionDirected { alpha, floor }
    }

    pub fn alpha(&self) -> T {
        self.alpha
    }

    pub fn floor(&self) -> T {
        self.floor
    }

    /// A priori SNR for one bin, given its a posteriori SNR `snr_post`, the
    /// previous speech power and the current noise power.
    #[inline]
    pub fn estimate(&self, snr_post: T, speech_prev: T, noise: T) -> T {
        let snr_pre = self.alpha * speech_prev / noise
            + (T::one() - self.alpha) * max_nan(snr_post - T::one(), T::zero());

        max_nan(snr_pre, self.floor)
    }
}
