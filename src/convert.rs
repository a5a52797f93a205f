//! File-level conversion to WAVE.
//!
//! [`convert_to_wav`] opens a source container, derives its
//! [`FormatDescriptor`](crate::descriptor::FormatDescriptor), creates the WAVE
//! destination for it and runs the [`ContainerStreamPipeline`].
//! [`convert_directory`] applies the same to every matching file in a folder
//! and collects per-file failures instead of stopping.

use std::{
    fs::{self, File},
    io::{self, Read},
    path::{Path, PathBuf},
};

use walkdir::WalkDir;

use crate::{
    chunks::{AIFC_FORM_TYPE, AIFF_FORM_TYPE, FORM_CHUNK, MTHD_CHUNK, RIFF_CHUNK, WAVE_CHUNK},
    error::{AudioIOError, AudioIOResult},
    pipeline::{ContainerStreamPipeline, ConversionSummary},
    traits::ContainerReader,
    types::{ConvertOptions, FileType},
    wav::{StreamedWavReader, StreamedWavWriter},
};

/// Identify a container from its first bytes, falling back to the extension.
///
/// # Errors
///
/// `IoFailure` if the file cannot be opened or read.
pub fn detect_file_type<P: AsRef<Path>>(path: P) -> AudioIOResult<FileType> {
    let path = path.as_ref();
    let mut header = [0u8; 12];
    let mut file = File::open(path)?;
    let mut filled = 0;
    while filled < header.len() {
        match file.read(&mut header[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }

    let sniffed = sniff_file_type(&header[..filled]);
    Ok(match sniffed {
        FileType::Unknown => FileType::from_path(path),
        known => known,
    })
}

fn sniff_file_type(header: &[u8]) -> FileType {
    if header.len() >= 4 && header[..4] == *MTHD_CHUNK.as_bytes() {
        return FileType::MIDI;
    }
    if header.len() < 12 {
        return FileType::Unknown;
    }
    let (magic, form) = (&header[..4], &header[8..12]);
    if magic == RIFF_CHUNK.as_bytes() && form == WAVE_CHUNK.as_bytes() {
        FileType::WAV
    } else if magic == FORM_CHUNK.as_bytes()
        && (form == AIFF_FORM_TYPE.as_bytes() || form == AIFC_FORM_TYPE.as_bytes())
    {
        FileType::AIFF
    } else {
        FileType::Unknown
    }
}

/// Open `path` as a payload source.
///
/// # Errors
///
/// `FormatMismatch` for containers without a sampled-audio payload (MIDI,
/// unknown) or whose reader is compiled out; otherwise whatever the reader
/// reports while parsing the header.
pub fn open_source<P: AsRef<Path>>(path: P) -> AudioIOResult<Box<dyn ContainerReader>> {
    let path = path.as_ref();

    match detect_file_type(path)? {
        FileType::WAV => Ok(Box::new(StreamedWavReader::open(path)?)),
        FileType::AIFF => {
            #[cfg(not(feature = "aiff"))]
            return Err(AudioIOError::missing_feature(
                "'aiff' feature must be enabled to read AIFF files",
            ));

            #[cfg(feature = "aiff")]
            {
                let reader = crate::aiff::StreamedAiffReader::open(path)?;
                Ok(Box::new(reader))
            }
        }
        other => Err(AudioIOError::unsupported_format(format!(
            "{} has no sampled-audio payload to convert ({:#})",
            path.display(),
            other
        ))),
    }
}

/// Convert `input` (AIFF, AIFF-C or WAVE) into a WAVE file at `output`.
///
/// Uses [`ConvertOptions::default`].
///
/// # Example
///
/// ```no_run
/// use audio_container_io::convert_to_wav;
///
/// let summary = convert_to_wav("take1.aiff", "take1.wav")?;
/// println!("{}", summary);
/// # Ok::<(), audio_container_io::AudioIOError>(())
/// ```
pub fn convert_to_wav<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
) -> AudioIOResult<ConversionSummary> {
    convert_to_wav_with_options(input, output, &ConvertOptions::default())
}

/// Convert `input` into a WAVE file at `output` with explicit options.
///
/// Only `chunk_size` and `overwrite` apply to a single file; `output` is
/// used as given.
///
/// # Errors
///
/// - `InvalidParameter` for invalid options or when `output` is `input`.
/// - `IoFailure` when `output` exists and `overwrite` is off, or on any
///   read/write failure.
/// - `MalformedMessage` for a corrupt or truncated source.
/// - `FormatMismatch` when WAVE cannot hold the source format; `output` is
///   not created in that case.
pub fn convert_to_wav_with_options<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    options: &ConvertOptions,
) -> AudioIOResult<ConversionSummary> {
    let (input, output) = (input.as_ref(), output.as_ref());
    options.validate()?;
    let pipeline = ContainerStreamPipeline::new(options.chunk_size)?;

    if output.exists() {
        if same_file(input, output)? {
            return Err(AudioIOError::invalid_parameter(format!(
                "Output {} would overwrite its own source",
                output.display()
            )));
        }
        if !options.overwrite {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", output.display()),
            )
            .into());
        }
    }

    let source = open_source(input)?;
    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        format = %source.format(),
        "converting to WAV"
    );

    let summary = pipeline.convert(source, |format| StreamedWavWriter::create(output, format))?;
    tracing::info!(
        output = %output.display(),
        bytes = summary.bytes_copied,
        "conversion finished"
    );
    Ok(summary)
}

fn same_file(a: &Path, b: &Path) -> AudioIOResult<bool> {
    Ok(fs::canonicalize(a)? == fs::canonicalize(b)?)
}

/// A file the batch converted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedFile {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub summary: ConversionSummary,
}

/// A file the batch could not convert
#[derive(Debug)]
pub struct FailedFile {
    pub source: PathBuf,
    pub error: AudioIOError,
}

/// Outcome of [`convert_directory`]
#[derive(Debug, Default)]
pub struct BatchReport {
    pub converted: Vec<ConvertedFile>,
    /// Sources whose destination already existed (with `overwrite` off)
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<FailedFile>,
}

impl BatchReport {
    /// True if no file failed
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Files considered: converted, skipped and failed
    pub fn total(&self) -> usize {
        self.converted.len() + self.skipped.len() + self.failed.len()
    }
}

/// Convert every file under `dir` whose extension is listed in
/// `options.source_extensions`.
///
/// Files are visited in file-name order. A failing file is recorded in the
/// report and the batch moves on.
///
/// # Errors
///
/// Only for problems with the batch itself: invalid options, or `dir` not
/// being a readable directory. Per-file problems end up in
/// [`BatchReport::failed`].
pub fn convert_directory<P: AsRef<Path>>(
    dir: P,
    options: &ConvertOptions,
) -> AudioIOResult<BatchReport> {
    let dir = dir.as_ref();
    options.validate()?;
    if !fs::metadata(dir)?.is_dir() {
        return Err(AudioIOError::invalid_parameter(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    let max_depth = if options.recursive { usize::MAX } else { 1 };
    let mut report = BatchReport::default();

    for entry in WalkDir::new(dir).max_depth(max_depth).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let source = e.path().map(Path::to_path_buf).unwrap_or_default();
                tracing::warn!(path = %source.display(), error = %e, "cannot read directory entry");
                report.failed.push(FailedFile {
                    source,
                    error: io::Error::from(e).into(),
                });
                continue;
            }
        };
        if !entry.file_type().is_file() || !options.matches_source(entry.path()) {
            continue;
        }

        let source = entry.into_path();
        let destination = options.destination_for(&source, dir);
        if !options.overwrite && destination.exists() {
            tracing::info!(path = %destination.display(), "destination exists, skipping");
            report.skipped.push(source);
            continue;
        }

        let result = destination
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map_or(Ok(()), fs::create_dir_all)
            .map_err(AudioIOError::from)
            .and_then(|()| convert_to_wav_with_options(&source, &destination, options));

        match result {
            Ok(summary) => report.converted.push(ConvertedFile {
                source,
                destination,
                summary,
            }),
            Err(error) => {
                tracing::warn!(path = %source.display(), error = %error, "conversion failed");
                report.failed.push(FailedFile { source, error });
            }
        }
    }

    tracing::info!(
        converted = report.converted.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "batch conversion finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::{descriptor::FormatDescriptor, error::ErrorKind, traits::ContainerWriter};

    #[cfg(feature = "aiff")]
    use crate::aiff::reader::test_support::build_aiff;

    fn write_wav(path: &Path, samples: &[i16]) {
        let format = FormatDescriptor::new_pcm(8_000, 1, 16).unwrap();
        let mut writer = StreamedWavWriter::create(path, &format).unwrap();
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        writer.write_payload(&bytes).unwrap();
        writer.finalize().unwrap();
    }

    #[test]
    fn test_sniff_file_type() {
        assert_eq!(sniff_file_type(b"RIFF\0\0\0\0WAVE"), FileType::WAV);
        assert_eq!(sniff_file_type(b"FORM\0\0\0\0AIFC"), FileType::AIFF);
        assert_eq!(sniff_file_type(b"MThd\0\0\0\x06"), FileType::MIDI);
        assert_eq!(sniff_file_type(b"RIFF\0\0\0\0AVI "), FileType::Unknown);
        assert_eq!(sniff_file_type(b"FORM"), FileType::Unknown);
    }

    #[test]
    fn test_wav_to_wav_recontainer() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.wav");
        let output = dir.path().join("out.wav");
        let samples = [0i16, 1, -1, i16::MAX, i16::MIN, 1234];
        write_wav(&input, &samples);

        let summary = convert_to_wav(&input, &output).unwrap();
        assert_eq!(summary.bytes_copied, 12);

        let mut reader = hound::WavReader::open(&output).unwrap();
        let read: Vec<i16> = reader.samples::<i16>().map(Result::unwrap).collect();
        assert_eq!(read, samples);
    }

    #[test]
    fn test_refuses_to_overwrite_source() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.wav");
        write_wav(&input, &[1, 2, 3]);

        let err = convert_to_wav(&input, &input).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        assert_eq!(fs::metadata(&input).unwrap().len(), 44 + 6);
    }

    #[test]
    fn test_no_overwrite_option() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.wav");
        let output = dir.path().join("out.wav");
        write_wav(&input, &[1, 2, 3]);
        fs::write(&output, b"keep me").unwrap();

        let options = ConvertOptions::default().with_overwrite(false);
        let err = convert_to_wav_with_options(&input, &output, &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IoFailure);
        assert_eq!(fs::read(&output).unwrap(), b"keep me");
    }

    #[test]
    fn test_non_audio_sources_rejected() {
        let dir = tempdir().unwrap();
        let midi = dir.path().join("song.mid");
        fs::write(&midi, b"MThd\0\0\0\x06\0\0\0\x01\0\x60").unwrap();
        let err = convert_to_wav(&midi, dir.path().join("song.wav")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FormatMismatch);

        let text = dir.path().join("notes.txt");
        fs::write(&text, b"hello").unwrap();
        let err = convert_to_wav(&text, dir.path().join("notes.wav")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FormatMismatch);
        assert!(!dir.path().join("notes.wav").exists());
    }

    #[cfg(feature = "aiff")]
    #[test]
    fn test_aiff_to_wav() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("take.aiff");
        let output = dir.path().join("take.wav");
        let samples = [0i16, 1, -2, 300, -32768, 32767];
        let sound: Vec<u8> = samples.iter().flat_map(|s| s.to_be_bytes()).collect();
        fs::write(&input, build_aiff(2, 16, 44_100, None, &sound)).unwrap();

        let summary = convert_to_wav(&input, &output).unwrap();
        assert_eq!(summary.bytes_copied, sound.len() as u64);

        let mut reader = hound::WavReader::open(&output).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 44_100);
        assert_eq!(spec.bits_per_sample, 16);
        let read: Vec<i16> = reader.samples::<i16>().map(Result::unwrap).collect();
        assert_eq!(read, samples);
    }

    #[cfg(feature = "aiff")]
    #[test]
    fn test_unsupported_compression_leaves_no_output() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("packed.aifc");
        let output = dir.path().join("packed.wav");
        fs::write(&input, build_aiff(1, 16, 22_050, Some(b"ima4"), &[0u8; 68])).unwrap();

        let err = convert_to_wav(&input, &output).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FormatMismatch);
        assert!(!output.exists());
    }

    #[cfg(feature = "aiff")]
    #[test]
    fn test_batch_continues_past_corrupt_file() {
        let dir = tempdir().unwrap();
        let sound: Vec<u8> = (0..64u8).collect();
        fs::write(dir.path().join("a.aiff"), build_aiff(1, 16, 8_000, None, &sound)).unwrap();
        fs::write(dir.path().join("b.aif"), b"FORM\0\0\0\x04AIFF").unwrap();
        fs::write(dir.path().join("c.AIFF"), build_aiff(2, 8, 8_000, None, &sound)).unwrap();
        fs::write(dir.path().join("readme.txt"), b"not audio").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(
            dir.path().join("nested/d.aiff"),
            build_aiff(1, 16, 8_000, None, &sound),
        )
        .unwrap();

        let report = convert_directory(dir.path(), &ConvertOptions::default()).unwrap();
        assert_eq!(report.converted.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert!(!report.is_success());
        assert_eq!(report.failed[0].source, dir.path().join("b.aif"));
        assert_eq!(report.failed[0].error.kind(), ErrorKind::MalformedMessage);
        assert!(dir.path().join("a.wav").exists());
        assert!(dir.path().join("c.wav").exists());
        assert!(!dir.path().join("nested/d.wav").exists());
    }

    #[cfg(feature = "aiff")]
    #[test]
    fn test_recursive_batch_into_output_dir() {
        let src = tempdir().unwrap();
        let out = tempdir().unwrap();
        let sound: Vec<u8> = (0..32u8).collect();
        fs::create_dir(src.path().join("live")).unwrap();
        fs::write(src.path().join("a.aiff"), build_aiff(1, 16, 8_000, None, &sound)).unwrap();
        fs::write(
            src.path().join("live/a.aiff"),
            build_aiff(1, 16, 8_000, None, &sound),
        )
        .unwrap();

        let options = ConvertOptions::default()
            .with_recursive(true)
            .with_output_dir(out.path());
        let report = convert_directory(src.path(), &options).unwrap();
        assert!(report.is_success());
        assert_eq!(report.converted.len(), 2);
        assert!(out.path().join("a.wav").exists());
        assert!(out.path().join("live/a.wav").exists());

        // Second run without overwrite skips both
        let options = options.with_overwrite(false);
        let report = convert_directory(src.path(), &options).unwrap();
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.total(), 2);
    }

    #[test]
    fn test_batch_requires_directory() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("x.aiff");
        fs::write(&file, b"").unwrap();
        let err = convert_directory(&file, &ConvertOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);

        let err = convert_directory(dir.path().join("missing"), &ConvertOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IoFailure);
    }
}
