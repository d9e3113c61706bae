//! WAV input.

use crate::math::NumCastUnchecked;

use std::io::Read;
use std::path::Path;

use hound::{Error, SampleFormat, WavReader, WavSpec};
use ndarray::Array1;
use num::Float;


/// Reads all samples of `reader`, scaled to `[-1, 1]` and averaged over
/// channels.
pub fn read_mono<R, T>(reader: WavReader<R>) -> Result<(Array1<T>, WavSpec), Error>
where
    R: Read,
    T: Float + NumCastUnchecked,
{
    let spec = reader.spec();
    let channels = spec.channels as usize;

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.into_samples::<f32>().collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample - 1)) as f32;
            reader.into_samples::<i32>()
                .map(|s| s.map(|s| s as f32 * scale))
                .collect::<Result<_, _>>()?
        },
    };

    let norm = 1.0 / channels as f32;
    let mono = samples.chunks_exact(channels)
        .map(|frame| T::from_unchecked(frame.iter().sum::<f32>() * norm))
        .collect();

    Ok((mono, spec))
}

pub fn open_mono<P, T>(path: P) -> Result<(Array1<T>, WavSpec), Error>
where
    P: AsRef<Path>,
    T: Float + NumCastUnchecked,
{
    read_mono(WavReader::open(path)?)
}
