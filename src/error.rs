use snafu::Snafu;


/// Errors reported by the noise trackers.
///
/// Only malformed input and configuration are errors. Non-finite values
/// produced from well-shaped data are passed through in the estimate.
#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("invalid sampling rate: {} Hz", sampling_rate))]
    InvalidSamplingRate { sampling_rate: u32 },

    #[snafu(display("invalid parameter `{}`: {}", name, value))]
    InvalidParameter { name: &'static str, value: f64 },

    #[snafu(display("cannot initialize tracker from an empty spectrum"))]
    EmptySpectrum,

    #[snafu(display("shape mismatch for `{}`: expected {} bins, got {}", input, expected, actual))]
    ShapeMismatch {
        input: &'static str,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
