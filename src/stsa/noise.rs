//! Fast noise PSD tracking with MMSE noise power estimates and speech
//! presence controlled recursive averaging.

use super::history::SnrHistory;
use super::params::{PresenceThresholds, TrackerParameters};
use super::snr::DecisionDirected;
use super::NoisePsdTracker;
use crate::error::{EmptySpectrumSnafu, InvalidSamplingRateSnafu, Result, ShapeMismatchSnafu};
use crate::math::gamma::{gamma, gamma_tail};
use crate::math::{max_nan, min_nan, NumCastUnchecked};

use ndarray::{azip, s, Array1, ArrayView1};
use num::Float;
use snafu::ensure;
use tracing::{debug, trace, warn};


/// Noise PSD tracker driven by a noisy periodogram and the speech PSD
/// estimated for the previous frame.
///
/// The first call fixes the number of bins and returns the periodogram
/// itself as initial estimate. Every following call updates the estimate
/// recursively, with a smoothing factor that approaches one in bins where
/// speech is likely present.
#[derive(Debug)]
pub struct FastNoiseTracking<T> {
    params: TrackerParameters,
    model: Model<T>,
    state: State<T>,
}

/// Constants of the estimator, converted to the working float type.
#[derive(Debug)]
struct Model<T> {
    sampling_rate: u32,
    thresholds: PresenceThresholds,
    delta_k: usize,
    delta_l: usize,

    snr_pre: DecisionDirected<T>,
    alpha_n: T,
    alpha_p: T,
    shape: T,
    gamma_shape: T,         // Γ(shape)
    exponent_max: T,
    noise_floor: Option<T>,
}

#[derive(Debug)]
enum State<T> {
    Uninitialized,
    Tracking(Box<Tracking<T>>),
}

#[derive(Debug)]
struct Tracking<T> {
    frame_number: usize,
    frame_length: usize,
    noise_psd: Array1<T>,
    psi: Array1<T>,                 // speech presence thresholds
    p: Array1<T>,                   // speech presence probability
    history: SnrHistory<T>,         // a posteriori SNR
    degenerate: bool,

    snr_post: Array1<T>,
    noise_pwr: Array1<T>,           // MMSE noise power of the current frame
    snr_post_avg: Array1<T>,
    snr_post_avg_f: Array1<T>,
}

impl<T> FastNoiseTracking<T>
where
    T: Float + NumCastUnchecked,
{
    pub fn new(sampling_rate: u32) -> Result<Self> {
        Self::with_params(sampling_rate, &TrackerParameters::default())
    }

    pub fn with_params(sampling_rate: u32, params: &TrackerParameters) -> Result<Self> {
        ensure!(sampling_rate > 0, InvalidSamplingRateSnafu { sampling_rate });
        params.validate()?;

        let shape = T::from_unchecked(params.shape);

        let model = Model {
            sampling_rate,
            thresholds: params.thresholds.clone(),
            delta_k: params.delta_k,
            delta_l: params.delta_l,
            snr_pre: DecisionDirected::new(
                T::from_unchecked(params.alpha_ns),
                T::from_unchecked(params.ksi_floor),
            ),
            alpha_n: T::from_unchecked(params.alpha_n),
            alpha_p: T::from_unchecked(params.alpha_p),
            shape,
            gamma_shape: gamma(shape),
            exponent_max: T::from_unchecked(params.exponent_max),
            noise_floor: params.noise_floor.map(T::from_unchecked),
        };

        Ok(FastNoiseTracking {
            params: params.clone(),
            model,
            state: State::Uninitialized,
        })
    }

    pub fn sampling_rate(&self) -> u32 {
        self.model.sampling_rate
    }

    pub fn params(&self) -> &TrackerParameters {
        &self.params
    }

    /// Number of frames processed so far.
    pub fn frame_number(&self) -> usize {
        self.tracking().map_or(0, |t| t.frame_number)
    }

    /// Number of frequency bins, fixed by the first frame.
    pub fn num_bins(&self) -> Option<usize> {
        self.tracking().map(|t| t.noise_psd.len())
    }

    /// FFT size implied by the number of bins.
    pub fn frame_length(&self) -> Option<usize> {
        self.tracking().map(|t| t.frame_length)
    }

    pub fn noise_psd(&self) -> Option<ArrayView1<'_, T>> {
        self.tracking().map(|t| t.noise_psd.view())
    }

    /// Smoothed per-bin speech presence probability.
    pub fn speech_presence(&self) -> Option<ArrayView1<'_, T>> {
        self.tracking().map(|t| t.p.view())
    }

    /// Per-bin speech presence thresholds on the smoothed a posteriori SNR.
    pub fn thresholds(&self) -> Option<ArrayView1<'_, T>> {
        self.tracking().map(|t| t.psi.view())
    }

    /// Per-bin smoothing factor the next noise update will apply, given the
    /// current speech presence probability.
    pub fn noise_smoothing(&self) -> Option<Array1<T>> {
        let alpha_n = self.model.alpha_n;
        self.tracking()
            .map(|t| t.p.mapv(|p| alpha_n + (T::one() - alpha_n) * p))
    }

    pub fn history(&self) -> Option<&SnrHistory<T>> {
        self.tracking().map(|t| &t.history)
    }

    /// Drops all state. The next frame bootstraps the tracker again and may
    /// use a different number of bins.
    pub fn reset(&mut self) {
        debug!(frames = self.frame_number(), "resetting noise tracker");
        self.state = State::Uninitialized;
    }

    fn tracking(&self) -> Option<&Tracking<T>> {
        match &self.state {
            State::Uninitialized => None,
            State::Tracking(t) => Some(t),
        }
    }
}

impl<T> NoisePsdTracker<T> for FastNoiseTracking<T>
where
    T: Float + NumCastUnchecked,
{
    fn update(
        &mut self,
        noisy_psd: ArrayView1<T>,
        prev_speech_psd: ArrayView1<T>,
    ) -> Result<ArrayView1<'_, T>> {
        match self.state {
            State::Uninitialized => {
                let tracking = Tracking::bootstrap(&self.model, noisy_psd, prev_speech_psd)?;
                self.state = State::Tracking(Box::new(tracking));
            },
            State::Tracking(ref mut tracking) => {
                tracking.step(&self.model, noisy_psd, prev_speech_psd)?;
            },
        }

        match &self.state {
            State::Tracking(tracking) => Ok(tracking.noise_psd.view()),
            State::Uninitialized => unreachable!("noise tracker not initialized after update"),
        }
    }
}


impl<T> Tracking<T>
where
    T: Float + NumCastUnchecked,
{
    fn bootstrap(model: &Model<T>, noisy_psd: ArrayView1<T>, prev_speech_psd: ArrayView1<T>) -> Result<Self> {
        let k = noisy_psd.len();

        ensure!(k > 0, EmptySpectrumSnafu);
        check_len("prev_speech_psd", k, prev_speech_psd.len())?;

        let frame_length = 2 * (k - 1);
        let fs = model.sampling_rate as f64;

        let psi = Array1::from_shape_fn(k, |i| {
            // a single bin only carries DC
            let f = if frame_length > 0 { i as f64 / frame_length as f64 * fs } else { 0.0 };
            T::from_unchecked(model.thresholds.at(f))
        });

        let mut noise_psd = noisy_psd.to_owned();
        if let Some(floor) = model.noise_floor {
            noise_psd.mapv_inplace(|v| max_nan(v, floor));
        }

        let mut tracking = Tracking {
            frame_number: 0,
            frame_length,
            noise_psd,
            psi,
            p: Array1::zeros(k),
            history: SnrHistory::new(model.delta_l + 1, k),
            degenerate: false,
            snr_post: Array1::zeros(k),
            noise_pwr: Array1::zeros(k),
            snr_post_avg: Array1::zeros(k),
            snr_post_avg_f: Array1::zeros(k),
        };

        azip!((snr in &mut tracking.snr_post, &y in &noisy_psd, &n in &tracking.noise_psd) {
            *snr = y / n;
        });
        tracking.history.push(&tracking.snr_post);
        tracking.frame_number += 1;

        debug!(
            bins = k,
            frame_length,
            sampling_rate = model.sampling_rate,
            "noise tracker initialized"
        );

        Ok(tracking)
    }

    fn step(&mut self, model: &Model<T>, noisy_psd: ArrayView1<T>, prev_speech_psd: ArrayView1<T>) -> Result<()> {
        let k = self.noise_psd.len();
        check_len("noisy_psd", k, noisy_psd.len())?;
        check_len("prev_speech_psd", k, prev_speech_psd.len())?;

        // a posteriori SNR, a priori SNR, and MMSE estimate of the noise power
        azip!((
            snr_post in &mut self.snr_post,
            noise_pwr in &mut self.noise_pwr,
            &y in &noisy_psd,
            &speech in &prev_speech_psd,
            &n in &self.noise_psd
        ) {
            let gamma_ = y / n;
            let ksi = model.snr_pre.estimate(gamma_, speech, n);
            let v = gamma_ / (ksi * (ksi + T::one()));

            let tail = gamma_tail(model.shape, model.gamma_shape, v);
            let weight = min_nan(tail, model.exponent_max).exp();
            let amplitude = weight / (ksi + T::one()).powi(2) * y.sqrt();

            *snr_post = gamma_;
            *noise_pwr = amplitude * amplitude;
        });

        // average SNR over time, then over neighboring bins
        self.history.push(&self.snr_post);
        self.history.mean_into(&mut self.snr_post_avg);

        for i in 0..k {
            let lo = i.saturating_sub(model.delta_k);
            let hi = (i + model.delta_k + 1).min(k);

            let window = self.snr_post_avg.slice(s![lo..hi]);
            self.snr_post_avg_f[i] = window.sum() / T::from(hi - lo).unwrap();
        }

        // speech presence probability and noise update
        let alpha_n = model.alpha_n;
        let alpha_p = model.alpha_p;

        azip!((
            noise in &mut self.noise_psd,
            p in &mut self.p,
            &noise_pwr in &self.noise_pwr,
            &avg in &self.snr_post_avg_f,
            &psi in &self.psi
        ) {
            let present = if avg > psi { T::one() } else { T::zero() };
            *p = alpha_p * *p + (T::one() - alpha_p) * present;

            let alpha = alpha_n + (T::one() - alpha_n) * *p;
            *noise = alpha * *noise + (T::one() - alpha) * noise_pwr;
        });

        if let Some(floor) = model.noise_floor {
            self.noise_psd.mapv_inplace(|v| max_nan(v, floor));
        }

        if !self.degenerate && self.noise_psd.iter().any(|v| !v.is_finite()) {
            warn!(frame = self.frame_number, "noise estimate contains non-finite values");
            self.degenerate = true;
        }

        trace!(
            frame = self.frame_number,
            p_mean = self.p.sum().to_f64_unchecked() / k as f64,
            "noise estimate updated"
        );

        self.frame_number += 1;
        Ok(())
    }
}


fn check_len(input: &'static str, expected: usize, actual: usize) -> Result<()> {
    ensure!(expected == actual, ShapeMismatchSnafu { input, expected, actual });
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    use ndarray::{arr1, Array2};
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use test_strategy::proptest;

    fn tracker(sampling_rate: u32) -> FastNoiseTracking<f64> {
        FastNoiseTracking::new(sampling_rate).unwrap()
    }

    // exponentially distributed periodogram around a per-bin level
    fn random_periodogram(rng: &mut StdRng, frames: usize, bins: usize) -> Array2<f64> {
        let levels: Vec<f64> = (0..bins).map(|_| rng.gen_range(0.01..10.0)).collect();

        Array2::from_shape_fn((frames, bins), |(_, k)| {
            let u: f64 = rng.gen_range(1e-9..1.0);
            -u.ln() * levels[k]
        })
    }

    #[test]
    fn bootstrap_returns_input() {
        let noisy = arr1(&[0.3, 1.0, 2.5, 1e-6, 42.0]);
        let mut t = tracker(16000);

        let out = t.update(noisy.view(), Array1::<f64>::zeros(5).view()).unwrap().to_owned();

        assert_eq!(out, noisy);
        assert_eq!(t.num_bins(), Some(5));
        assert_eq!(t.frame_length(), Some(8));
        assert_eq!(t.frame_number(), 1);
        assert_eq!(t.speech_presence().unwrap(), Array1::<f64>::zeros(5));
    }

    #[test]
    fn uninitialized_tracker_exposes_no_state() {
        let t = tracker(16000);

        assert_eq!(t.frame_number(), 0);
        assert!(t.num_bins().is_none());
        assert!(t.noise_psd().is_none());
        assert!(t.history().is_none());
    }

    #[test]
    fn rejects_invalid_configuration() {
        assert_eq!(
            FastNoiseTracking::<f64>::new(0).unwrap_err(),
            Error::InvalidSamplingRate { sampling_rate: 0 },
        );

        let mut params = TrackerParameters::default();
        params.alpha_n = -0.1;
        assert!(FastNoiseTracking::<f64>::with_params(8000, &params).is_err());
    }

    #[test]
    fn rejects_empty_spectrum() {
        let mut t = tracker(8000);
        let empty = Array1::<f64>::zeros(0);

        let err = t.update(empty.view(), empty.view()).unwrap_err();
        assert_eq!(err, Error::EmptySpectrum);
        assert!(t.num_bins().is_none());
    }

    #[test]
    fn rejects_shape_mismatch_after_bootstrap() {
        let mut t = tracker(8000);
        let ones = Array1::<f64>::ones(5);
        t.update(ones.view(), ones.view()).unwrap();

        for &len in &[4, 6] {
            let other = Array1::<f64>::ones(len);

            let err = t.update(other.view(), ones.view()).unwrap_err();
            assert_eq!(err, Error::ShapeMismatch { input: "noisy_psd", expected: 5, actual: len });

            let err = t.update(ones.view(), other.view()).unwrap_err();
            assert_eq!(err, Error::ShapeMismatch { input: "prev_speech_psd", expected: 5, actual: len });
        }

        // failed calls leave the state untouched
        assert_eq!(t.frame_number(), 1);
        assert_eq!(t.history().unwrap().len(), 1);
        assert_eq!(t.noise_psd().unwrap(), ones);
    }

    #[test]
    fn rejects_mismatched_speech_estimate_at_bootstrap() {
        let mut t = tracker(8000);

        let err = t.update(Array1::<f64>::ones(3).view(), Array1::<f64>::zeros(2).view()).unwrap_err();
        assert_eq!(err, Error::ShapeMismatch { input: "prev_speech_psd", expected: 3, actual: 2 });
        assert!(t.num_bins().is_none());
    }

    #[test]
    fn stationary_noise_settles() {
        let mut t = tracker(8000);
        let noisy = Array1::<f64>::ones(3);
        let speech = Array1::<f64>::zeros(3);

        let first = t.update(noisy.view(), speech.view()).unwrap().to_owned();
        assert_eq!(first, noisy);

        let mut prev = first;
        let mut last = prev.clone();
        for _ in 1..50 {
            prev = last;
            last = t.update(noisy.view(), speech.view()).unwrap().to_owned();
        }

        // without speech the a priori SNR stays at its floor, which scales
        // the MMSE noise power by (1 + ksi_floor)^-4
        let ksi_floor = TrackerParameters::default().ksi_floor;
        let expected = (1.0 + ksi_floor).powi(-4);

        for (&n, &m) in last.iter().zip(prev.iter()) {
            assert!((n - expected).abs() < 1e-3, "noise = {}, expected {}", n, expected);
            assert!((n - m).abs() < 1e-5);
        }

        assert!(t.speech_presence().unwrap().iter().all(|&p| p == 0.0));
        assert_eq!(t.frame_number(), 50);
    }

    #[test]
    fn history_cursor_wraps() {
        let mut t = tracker(8000);
        let noisy = [1.0, 3.0, 0.5, 2.0, 1.5];
        let zeros = Array1::<f64>::zeros(1);

        let mut outputs = Vec::new();
        for (i, &y) in noisy.iter().enumerate() {
            let out = t.update(arr1(&[y]).view(), zeros.view()).unwrap()[0];
            outputs.push(out);

            assert_eq!(t.history().unwrap().cursor(), (i + 1) % 3);
            assert_eq!(t.history().unwrap().len(), (i + 1).min(3));

            if i == 3 {
                // a posteriori SNR of frames 1 to 3, the bootstrap frame is gone
                let snr: Vec<f64> = (1..=3).map(|j| noisy[j] / outputs[j - 1]).collect();
                let expected = snr.iter().sum::<f64>() / 3.0;

                let avg = t.history().unwrap().mean()[0];
                assert!((avg - expected).abs() < 1e-12, "avg = {}, expected {}", avg, expected);
            }
        }
    }

    #[test]
    fn thresholds_follow_frequency_bands() {
        let mut t = tracker(8000);
        let ones = Array1::<f64>::ones(129);
        t.update(ones.view(), ones.view()).unwrap();

        let psi = t.thresholds().unwrap();
        assert_eq!(t.frame_length(), Some(256));

        // 31.25 Hz per bin
        assert_eq!(psi[0], 5.0);
        assert_eq!(psi[31], 5.0);
        assert_eq!(psi[32], 6.5);       // exactly 1000 Hz
        assert_eq!(psi[95], 6.5);
        assert_eq!(psi[96], 8.0);       // exactly 3000 Hz
        assert_eq!(psi[128], 8.0);
    }

    #[test]
    fn thresholds_of_small_spectrum() {
        let mut t = tracker(8000);
        let ones = Array1::<f64>::ones(3);
        t.update(ones.view(), ones.view()).unwrap();

        // bins at 0, 2000 and 4000 Hz
        assert_eq!(t.thresholds().unwrap(), arr1(&[5.0, 6.5, 8.0]));
    }

    #[test]
    fn single_bin_spectrum() {
        let mut t = tracker(8000);
        let noisy = arr1(&[2.0]);
        let zeros = arr1(&[0.0]);

        assert_eq!(t.update(noisy.view(), zeros.view()).unwrap(), noisy);
        assert_eq!(t.thresholds().unwrap(), arr1(&[5.0]));

        let out = t.update(noisy.view(), zeros.view()).unwrap()[0];
        assert!(out.is_finite() && out > 0.0);
    }

    #[test]
    fn custom_thresholds() {
        let mut params = TrackerParameters::default();
        params.thresholds.low_edge = 2000.0;
        params.thresholds.high_edge = 4000.0;
        params.thresholds.high = 10.0;

        let mut t = FastNoiseTracking::<f64>::with_params(8000, &params).unwrap();
        let ones = Array1::<f64>::ones(3);
        t.update(ones.view(), ones.view()).unwrap();

        assert_eq!(t.thresholds().unwrap(), arr1(&[5.0, 6.5, 10.0]));
    }

    #[test]
    fn speech_burst_freezes_noise_estimate() {
        let mut t = tracker(16000);
        let noise = Array1::<f64>::ones(9);
        let burst = Array1::<f64>::from_elem(9, 100.0);
        let speech = Array1::<f64>::zeros(9);

        for _ in 0..20 {
            t.update(noise.view(), speech.view()).unwrap();
        }
        let before = t.noise_psd().unwrap().to_owned();

        for _ in 0..2 {
            t.update(burst.view(), speech.view()).unwrap();
        }

        let p = t.speech_presence().unwrap();
        assert!(p.iter().all(|&p| p > 0.95), "p = {}", p);

        let alpha = t.noise_smoothing().unwrap();
        assert!(alpha.iter().all(|&a| a > 0.99));

        let during = t.noise_psd().unwrap();
        for (&n, &m) in during.iter().zip(before.iter()) {
            assert!(n < 1.0 && (n - m).abs() < 0.05, "noise {} -> {}", m, n);
        }

        // presence decays once the burst has left the SNR history
        for _ in 0..12 {
            t.update(noise.view(), speech.view()).unwrap();
        }
        assert!(t.speech_presence().unwrap().iter().all(|&p| p < 1e-3));
    }

    #[test]
    fn zero_bin_propagates_without_floor() {
        let mut t = tracker(8000);
        let first = arr1(&[0.0, 1.0, 1.0, 1.0]);
        let noisy = Array1::<f64>::ones(4);
        let speech = Array1::<f64>::zeros(4);

        t.update(first.view(), speech.view()).unwrap();
        let out = t.update(noisy.view(), speech.view()).unwrap().to_owned();

        assert!(!out[0].is_finite());
        assert!(out[3].is_finite());

        let p = t.speech_presence().unwrap();
        assert!(p.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }

    #[test]
    fn noise_floor_keeps_estimate_finite() {
        let mut params = TrackerParameters::default();
        params.noise_floor = Some(1e-10);

        let mut t = FastNoiseTracking::<f64>::with_params(8000, &params).unwrap();
        let first = arr1(&[0.0, 1.0, 1.0, 1.0]);
        let noisy = Array1::<f64>::ones(4);
        let speech = Array1::<f64>::zeros(4);

        let out = t.update(first.view(), speech.view()).unwrap().to_owned();
        assert_eq!(out, arr1(&[1e-10, 1.0, 1.0, 1.0]));

        for _ in 0..20 {
            let out = t.update(noisy.view(), speech.view()).unwrap();
            assert!(out.iter().all(|v| v.is_finite() && *v >= 1e-10));
        }
    }

    #[test]
    fn reset_allows_new_bin_count() {
        let mut t = tracker(8000);
        let ones = Array1::<f64>::ones(5);
        t.update(ones.view(), ones.view()).unwrap();
        t.update(ones.view(), ones.view()).unwrap();

        t.reset();
        assert_eq!(t.frame_number(), 0);

        let noisy = arr1(&[2.0, 3.0, 4.0]);
        let out = t.update(noisy.view(), Array1::<f64>::zeros(3).view()).unwrap().to_owned();
        assert_eq!(out, noisy);
        assert_eq!(t.num_bins(), Some(3));
    }

    #[test]
    fn identical_input_yields_identical_output() {
        let mut rng = StdRng::seed_from_u64(7);
        let noisy = random_periodogram(&mut rng, 40, 33);
        let speech = random_periodogram(&mut rng, 40, 33);

        let mut a = tracker(16000);
        let mut b = tracker(16000);

        for (y, s) in noisy.outer_iter().zip(speech.outer_iter()) {
            let na = a.update(y, s).unwrap().to_owned();
            let nb = b.update(y, s).unwrap().to_owned();
            assert_eq!(na, nb);
        }
    }

    #[test]
    fn single_precision_matches_double() {
        let mut rng = StdRng::seed_from_u64(3);
        let noisy = random_periodogram(&mut rng, 20, 17);

        let mut t64 = tracker(16000);
        let mut t32 = FastNoiseTracking::<f32>::new(16000).unwrap();
        let zeros64 = Array1::<f64>::zeros(17);
        let zeros32 = Array1::<f32>::zeros(17);

        for y in noisy.outer_iter() {
            let y32 = y.mapv(|v| v as f32);

            let n64 = t64.update(y, zeros64.view()).unwrap().to_owned();
            let n32 = t32.update(y32.view(), zeros32.view()).unwrap().to_owned();

            for (&a, &b) in n64.iter().zip(n32.iter()) {
                assert!(((a - b as f64) / a).abs() < 1e-3, "{} vs {}", a, b);
            }
        }
    }

    #[proptest]
    fn probability_and_smoothing_stay_bounded(
        #[strategy(1..48usize)] bins: usize,
        #[strategy(2..40usize)] frames: usize,
        seed: u64,
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let noisy = random_periodogram(&mut rng, frames, bins);
        let speech = random_periodogram(&mut rng, frames, bins);

        let mut t = tracker(16000);
        let alpha_n = t.params().alpha_n;

        for (y, s) in noisy.outer_iter().zip(speech.outer_iter()) {
            let out = t.update(y, s).unwrap();
            prop_assert!(out.iter().all(|v| v.is_finite() && *v >= 0.0));

            for &p in t.speech_presence().unwrap() {
                prop_assert!((0.0..=1.0).contains(&p));
            }
            for &a in &t.noise_smoothing().unwrap() {
                prop_assert!(a >= alpha_n && a <= 1.0);
            }
        }
    }
}
