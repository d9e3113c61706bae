use noisetrack::ft::{self, Periodogram};
use noisetrack::stsa::gain::Wiener;
use noisetrack::stsa::{utils as track, FastNoiseTracking, TrackerParameters};
use noisetrack::utils;
use noisetrack::wave;
use noisetrack::window::WindowType;

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use clap::{Arg, Command};
use serde::{Deserialize, Serialize};
use snafu::{ensure, ResultExt, Snafu};
use tracing::info;
use tracing_subscriber::EnvFilter;


#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to read parameters from {}: {}", path.display(), source))]
    ParamsOpen { path: PathBuf, source: io::Error },

    #[snafu(display("invalid parameter file {}: {}", path.display(), source))]
    ParamsParse { path: PathBuf, source: serde_yaml::Error },

    #[snafu(display("failed to read audio from {}: {}", path.display(), source))]
    Input { path: PathBuf, source: hound::Error },

    #[snafu(display("invalid analysis parameters: {}", message))]
    Analysis { message: String },

    #[snafu(display("noise tracking failed: {}", source))]
    Tracking { source: noisetrack::Error },

    #[snafu(display("failed to write noise estimate: {}", source))]
    Output { source: io::Error },
}


#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Parameters {
    #[serde(default)]
    analysis: AnalysisParameters,

    #[serde(default)]
    tracker: TrackerParameters,
}


#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AnalysisParameters {
    #[serde(default)]
    window: WindowType,

    #[serde(default = "param_defaults::periodic")]
    periodic: bool,

    #[serde(default = "param_defaults::block_length")]
    block_length: f64,          // in seconds

    #[serde(default = "param_defaults::overlap")]
    overlap: f64,               // fraction of block length
}

impl Default for AnalysisParameters {
    fn default() -> Self {
        AnalysisParameters {
            window: WindowType::default(),
            periodic: param_defaults::periodic(),
            block_length: param_defaults::block_length(),
            overlap: param_defaults::overlap(),
        }
    }
}


mod param_defaults {
    pub fn periodic() -> bool {
        true
    }

    pub fn block_length() -> f64 {
        0.032
    }

    pub fn overlap() -> f64 {
        0.5
    }
}


fn app() -> Command<'static> {
    Command::new("noisetrack")
        .about("Tracks the noise power spectral density of a recording frame by frame")
        .author(clap::crate_authors!())
        .version(clap::crate_version!())
        .arg(Arg::new("input")
                .help("The input file to use (wav)")
                .value_name("INPUT")
                .value_parser(clap::value_parser!(PathBuf))
                .required(true))
        .arg(Arg::new("output")
                .help("The file to write the noise PSD to (csv), defaults to stdout")
                .value_name("OUTPUT")
                .value_parser(clap::value_parser!(PathBuf))
                .required(false))
        .arg(Arg::new("params")
                .help("The parameter file to use (yaml)")
                .short('p')
                .long("params")
                .value_name("PARAMS")
                .value_parser(clap::value_parser!(PathBuf))
                .takes_value(true))
}

fn load_params(path: &Path) -> Result<Parameters, Error> {
    let file = File::open(path).context(ParamsOpenSnafu { path })?;
    serde_yaml::from_reader(file).context(ParamsParseSnafu { path })
}

fn frame_layout(params: &AnalysisParameters, sample_rate: u32) -> Result<(usize, usize), Error> {
    ensure!(params.block_length > 0.0, AnalysisSnafu {
        message: format!("block length must be positive, got {}", params.block_length),
    });
    ensure!((0.0..1.0).contains(&params.overlap), AnalysisSnafu {
        message: format!("overlap must be in [0, 1), got {}", params.overlap),
    });

    let len = (sample_rate as f64 * params.block_length).round() as usize;
    let hop = ((1.0 - params.overlap) * len as f64).round() as usize;

    ensure!(len >= 2 && hop >= 1, AnalysisSnafu {
        message: format!("block of {} samples with hop {} is too short", len, hop),
    });

    Ok((len, hop))
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let matches = app().get_matches();

    let path_in = matches.get_one::<PathBuf>("input").expect("input is required");
    let path_out = matches.get_one::<PathBuf>("output");

    let params = match matches.get_one::<PathBuf>("params") {
        Some(path) => load_params(path)?,
        None => Parameters::default(),
    };

    // load audio, mixed down to a single channel
    let (samples, spec) = wave::open_mono::<_, f64>(path_in)
        .context(InputSnafu { path: path_in.clone() })?;

    let (len, hop) = frame_layout(&params.analysis, spec.sample_rate)?;
    info!(
        samples = samples.len(),
        sample_rate = spec.sample_rate,
        block = len,
        hop,
        frames = ft::num_frames(samples.len(), len, hop),
        "analyzing input"
    );

    // compute power spectrum
    let window = params.analysis.window.build::<f64>(len, params.analysis.periodic);
    let mut periodogram = Periodogram::new(&*window);
    let spectrum = periodogram.spectrogram(&samples, hop);

    // track noise
    let mut tracker = FastNoiseTracking::<f64>::with_params(spec.sample_rate, &params.tracker)
        .context(TrackingSnafu)?;

    let noise = track::track_spectrogram(&mut tracker, &Wiener::new(), &spectrum)
        .context(TrackingSnafu)?;

    info!(frames = tracker.frame_number(), bins = periodogram.num_bins(), "noise tracking done");

    // write
    let written = match path_out {
        Some(path) => {
            let file = File::create(path).context(OutputSnafu)?;
            utils::write_psd_csv(BufWriter::new(file), &noise, spec.sample_rate)
        },
        None => {
            let stdout = io::stdout();
            utils::write_psd_csv(stdout.lock(), &noise, spec.sample_rate)
        },
    };

    written.context(OutputSnafu)
}
