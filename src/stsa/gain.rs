//! Speech power estimation from a noisy periodogram and a noise estimate.

use ndarray::{azip, Array1, ArrayView1, ArrayViewMut1};
use num::Float;


/// Wiener gain on the maximum likelihood a priori SNR.
///
/// Produces the speech power estimate that the noise tracker consumes as
/// its previous-frame speech PSD on the next frame.
#[derive(Debug, Clone, Copy)]
pub struct Wiener<T> {
    snr_max: T,
}

impl<T: Float> Wiener<T> {
    pub fn new() -> Self {
        Wiener {
            snr_max: T::from(1e3).unwrap(),
        }
    }

    pub fn with_snr_max(snr_max: T) -> Self {
        Wiener { snr_max }
    }

    pub fn speech_psd_into(
        &self,
        noisy_psd: ArrayView1<T>,
        noise_psd: ArrayView1<T>,
        speech_psd: ArrayViewMut1<T>,
    ) {
        let snr_max = self.snr_max;

        azip!((speech in speech_psd, &noisy in &noisy_psd, &noise in &noise_psd) {
            let snr = (noisy / noise - T::one()).max(T::zero()).min(snr_max);   // prevent overflows
            let gain = snr / (T::one() + snr);

            *speech = gain * gain * noisy;
        });
    }

    pub fn speech_psd(&self, noisy_psd: ArrayView1<T>, noise_psd: ArrayView1<T>) -> Array1<T> {
        let mut speech = Array1::zeros(noisy_psd.len());
        self.speech_psd_into(noisy_psd, noise_psd, speech.view_mut());
        speech
    }
}

impl<T: Float> Default for Wiener<T> {
    fn default() -> Self {
        Self::new()
    }
}
