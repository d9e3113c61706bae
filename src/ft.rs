//! Short-time power spectra of real signals.

use crate::window::WindowFunction;

use std::sync::Arc;

use ndarray::{s, Array1, Array2, ArrayBase, ArrayView1, ArrayViewMut1, Axis, Data, Ix1};
use num::{Complex, Float};
use rustfft::{Fft, FftNum, FftPlanner};


/// One-sided periodogram of windowed frames, `|X(k)|^2 / N` for
/// `k = 0..=N/2`.
pub struct Periodogram<T> {
    fft: Arc<dyn Fft<T>>,
    window: Array1<T>,
    buffer: Vec<Complex<T>>,
    scratch: Vec<Complex<T>>,
}

impl<T> Periodogram<T>
where
    T: FftNum + Float,
{
    pub fn new<W>(window: &W) -> Self
    where
        W: WindowFunction<T> + ?Sized,
    {
        let len = window.len();
        let fft = FftPlanner::new().plan_fft_forward(len);
        let scratch = vec![Complex::new(T::zero(), T::zero()); fft.get_inplace_scratch_len()];

        Periodogram {
            fft,
            window: window.to_array(),
            buffer: vec![Complex::new(T::zero(), T::zero()); len],
            scratch,
        }
    }

    pub fn frame_len(&self) -> usize {
        self.window.len()
    }

    pub fn num_bins(&self) -> usize {
        self.frame_len() / 2 + 1
    }

    pub fn process_into(&mut self, frame: ArrayView1<T>, mut out: ArrayViewMut1<T>) {
        assert_eq!(frame.len(), self.frame_len(), "frame length must match window length");
        assert_eq!(out.len(), self.num_bins(), "output length must match number of bins");

        for ((b, &x), &w) in self.buffer.iter_mut().zip(frame.iter()).zip(self.window.iter()) {
            *b = Complex::new(x * w, T::zero());
        }

        self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);

        let norm = T::one() / T::from(self.frame_len()).unwrap();
        for (o, x) in out.iter_mut().zip(self.buffer.iter()) {
            *o = x.norm_sqr() * norm;
        }
    }

    pub fn process(&mut self, frame: ArrayView1<T>) -> Array1<T> {
        let mut out = Array1::zeros(self.num_bins());
        self.process_into(frame, out.view_mut());
        out
    }

    /// Periodograms of all complete frames of `signal`, spaced `hop` samples
    /// apart, as array of shape `(frames, bins)`.
    pub fn spectrogram<D>(&mut self, signal: &ArrayBase<D, Ix1>, hop: usize) -> Array2<T>
    where
        D: Data<Elem = T>,
    {
        let num_frames = num_frames(signal.len(), self.frame_len(), hop);
        let mut out = Array2::zeros((num_frames, self.num_bins()));

        for (i, row) in out.axis_iter_mut(Axis(0)).enumerate() {
            let start = i * hop;
            let frame = signal.slice(s![start..start + self.frame_len()]);
            self.process_into(frame, row);
        }

        out
    }
}

impl<T> std::fmt::Debug for Periodogram<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Periodogram")
            .field("frame_len", &self.window.len())
            .finish()
    }
}


/// Number of complete frames of length `len` with hop size `hop` in a
/// signal of `samples` samples.
pub fn num_frames(samples: usize, len: usize, hop: usize) -> usize {
    assert!(hop > 0, "hop size must be positive");

    if samples < len {
        0
    } else {
        (samples - len) / hop + 1
    }
}
