//! Short-time spectral estimation of background noise.

pub mod gain;
pub mod history;
pub mod noise;
pub mod params;
pub mod snr;
pub mod utils;

pub use self::noise::FastNoiseTracking;
pub use self::params::{PresenceThresholds, TrackerParameters};

use crate::error::Result;

use ndarray::ArrayView1;


/// Frame-by-frame noise power spectral density estimation.
pub trait NoisePsdTracker<T> {
    /// Consumes the noisy periodogram of the current frame together with the
    /// speech PSD estimated for the previous frame and returns the updated
    /// noise PSD estimate.
    ///
    /// The number of bins is fixed by the first frame, later frames of a
    /// different length are rejected with
    /// [`Error::ShapeMismatch`](crate::Error::ShapeMismatch).
    fn update(
        &mut self,
        noisy_psd: ArrayView1<T>,
        prev_speech_psd: ArrayView1<T>,
    ) -> Result<ArrayView1<'_, T>>;
}

impl<T, N> NoisePsdTracker<T> for Box<N>
where
    N: NoisePsdTracker<T>,
{
    fn update(
        &mut self,
        noisy_psd: ArrayView1<T>,
        prev_speech_psd: ArrayView1<T>,
    ) -> Result<ArrayView1<'_, T>> {
        self.as_mut().update(noisy_psd, prev_speech_psd)
    }
}

impl<T> NoisePsdTracker<T> for Box<dyn NoisePsdTracker<T>> {
    fn update(
        &mut self,
        noisy_psd: ArrayView1<T>,
        prev_speech_psd: ArrayView1<T>,
    ) -> Result<ArrayView1<'_, T>> {
        self.as_mut().update(noisy_psd, prev_speech_psd)
    }
}

impl<T, N> NoisePsdTracker<T> for &mut N
where
    N: NoisePsdTracker<T>,
{
    fn update(
        &mut self,
        noisy_psd: ArrayView1<T>,
        prev_speech_psd: ArrayView1<T>,
    ) -> Result<ArrayView1<'_, T>> {
        (**self).update(noisy_psd, prev_speech_psd)
    }
}

impl<T> NoisePsdTracker<T> for &mut dyn NoisePsdTracker<T> {
    fn update(
        &mut self,
        noisy_psd: ArrayView1<T>,
        prev_speech_psd: ArrayView1<T>,
    ) -> Result<ArrayView1<'_, T>> {
        (**self).update(noisy_psd, prev_speech_psd)
    }
}
