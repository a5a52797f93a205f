//! Convert AIFF / AIFF-C files to WAVE.
//!
//! ```text
//! aiff2wav take1.aiff                 # writes take1.wav
//! aiff2wav take1.aiff out/take1.wav
//! aiff2wav --dir sessions --recursive --output-dir converted
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use audio_container_io::{
    convert_directory, convert_to_wav_with_options, pipeline::DEFAULT_CHUNK_SIZE,
    types::ConvertOptions,
};

#[derive(Parser, Debug)]
#[command(name = "aiff2wav")]
#[command(about = "Convert AIFF/AIFF-C (or WAVE) files to WAVE")]
#[command(version)]
struct Cli {
    /// Source file
    #[arg(required_unless_present = "dir", conflicts_with = "dir")]
    input: Option<PathBuf>,

    /// Destination file (default: the input with a .wav extension)
    #[arg(conflicts_with = "dir")]
    output: Option<PathBuf>,

    /// Convert every matching file in this folder
    #[arg(long, short = 'd')]
    dir: Option<PathBuf>,

    /// Descend into subfolders (with --dir)
    #[arg(long, short = 'r', requires = "dir")]
    recursive: bool,

    /// Write converted files here instead of beside their sources (with --dir)
    #[arg(long, short = 'o', requires = "dir")]
    output_dir: Option<PathBuf>,

    /// Leave existing destination files untouched
    #[arg(long)]
    no_overwrite: bool,

    /// Transfer buffer size in bytes
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,
}

impl Cli {
    fn options(&self) -> ConvertOptions {
        let mut options = ConvertOptions::default()
            .with_chunk_size(self.chunk_size)
            .with_recursive(self.recursive)
            .with_overwrite(!self.no_overwrite);
        if let Some(dir) = &self.output_dir {
            options = options.with_output_dir(dir);
        }
        options
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let options = cli.options();

    if let Some(dir) = &cli.dir {
        return match convert_directory(dir, &options) {
            Ok(report) => {
                for failure in &report.failed {
                    eprintln!("{}: {}", failure.source.display(), failure.error);
                }
                println!(
                    "{} converted, {} skipped, {} failed",
                    report.converted.len(),
                    report.skipped.len(),
                    report.failed.len()
                );
                if report.is_success() {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::FAILURE
                }
            }
            Err(e) => {
                eprintln!("{}: {}", dir.display(), e);
                ExitCode::FAILURE
            }
        };
    }

    let Some(input) = &cli.input else {
        eprintln!("an input file or --dir is required");
        return ExitCode::from(2);
    };
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| input.with_extension("wav"));

    match convert_to_wav_with_options(input, &output, &options) {
        Ok(summary) => {
            println!("{} -> {}: {}", input.display(), output.display(), summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {}", input.display(), e);
            ExitCode::FAILURE
        }
    }
}
