use std::io::{self, Write};

use ndarray::{ArrayBase, Data, Ix2};
use num::Float;


/// Writes a `(frames, bins)` array as CSV, one frame per line, preceded by
/// a header line with the center frequency of every bin.
pub fn write_psd_csv<W, T, D>(mut out: W, psd: &ArrayBase<D, Ix2>, sample_rate: u32) -> io::Result<()>
where
    W: Write,
    T: Float + std::fmt::LowerExp,
    D: Data<Elem = T>,
{
    let bins = psd.ncols();
    let fft_len = 2 * bins.saturating_sub(1);

    let header: Vec<String> = (0..bins)
        .map(|k| {
            let f = if fft_len > 0 { k as f64 * sample_rate as f64 / fft_len as f64 } else { 0.0 };
            format!("{}", f)
        })
        .collect();
    writeln!(out, "{}", header.join(","))?;

    for row in psd.outer_iter() {
        let line: Vec<String> = row.iter().map(|v| format!("{:e}", v)).collect();
        writeln!(out, "{}", line.join(","))?;
    }

    out.flush()
}
