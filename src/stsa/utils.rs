use super::gain::Wiener;
use super::NoisePsdTracker;
use crate::error::Result;

use ndarray::{Array1, Array2, ArrayBase, Axis, Data, DataMut, Ix2};
use num::Float;


/// Runs `tracker` over a power spectrogram of shape `(frames, bins)`,
/// writing the noise estimate of each frame into the corresponding row of
/// `noise`.
///
/// The speech PSD handed to the tracker is the Wiener estimate of the
/// preceding frame (zero for the first frame).
pub fn track_spectrogram_into<T, N, D1, D2>(
    tracker: &mut N,
    speech_est: &Wiener<T>,
    periodogram: &ArrayBase<D1, Ix2>,
    noise: &mut ArrayBase<D2, Ix2>,
) -> Result<()>
where
    T: Float,
    N: NoisePsdTracker<T> + ?Sized,
    D1: Data<Elem = T>,
    D2: DataMut<Elem = T>,
{
    let bins = periodogram.len_of(Axis(1));
    let mut speech = Array1::zeros(bins);

    for (noisy, mut out) in periodogram.outer_iter().zip(noise.outer_iter_mut()) {
        let estimate = tracker.update(noisy.view(), speech.view())?;
        out.assign(&estimate);

        speech_est.speech_psd_into(noisy.view(), out.view(), speech.view_mut());
    }

    Ok(())
}

pub fn track_spectrogram<T, N, D>(
    tracker: &mut N,
    speech_est: &Wiener<T>,
    periodogram: &ArrayBase<D, Ix2>,
) -> Result<Array2<T>>
where
    T: Float,
    N: NoisePsdTracker<T> + ?Sized,
    D: Data<Elem = T>,
{
    let mut noise = Array2::zeros(periodogram.raw_dim());
    track_spectrogram_into(tracker, speech_est, periodogram, &mut noise)?;
    Ok(noise)
}
