use core::fmt::{Debug, Display, Formatter, Result as FmtResult};
use core::str::FromStr;
use std::path::{Path, PathBuf};

use crate::{
    error::{AudioIOError, AudioIOResult},
    pipeline::DEFAULT_CHUNK_SIZE,
};

/// Container formats known to this crate
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum FileType {
    /// RIFF/WAVE container
    #[default]
    WAV,
    /// AIFF or AIFF-C container
    AIFF,
    /// Standard MIDI file
    MIDI,
    /// Unknown or unsupported container
    Unknown,
}

impl FileType {
    /// Canonical lowercase file extension
    pub const fn as_str(self) -> &'static str {
        match self {
            FileType::WAV => "wav",
            FileType::AIFF => "aiff",
            FileType::MIDI => "mid",
            FileType::Unknown => "unknown",
        }
    }

    /// Human-readable container name
    pub const fn description(self) -> &'static str {
        match self {
            FileType::WAV => "Waveform Audio File Format",
            FileType::AIFF => "Audio Interchange File Format",
            FileType::MIDI => "Standard MIDI File",
            FileType::Unknown => "Unknown or unsupported container",
        }
    }

    /// Containers that carry sampled audio a pipeline can copy
    pub const fn carries_audio_payload(self) -> bool {
        matches!(self, FileType::WAV | FileType::AIFF)
    }

    /// Detect the container from the file extension (case-insensitive).
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let Some(ext) = path.as_ref().extension().and_then(|e| e.to_str()) else {
            return FileType::Unknown;
        };

        ext.parse().unwrap_or(FileType::Unknown)
    }
}

impl Display for FileType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if f.alternate() {
            // "{:#}" → human-readable container name
            write!(f, "{}", self.description())
        } else {
            // "{}" → canonical extension
            write!(f, "{}", self.as_str())
        }
    }
}

impl FromStr for FileType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wav" | "wave" => Ok(FileType::WAV),
            "aiff" | "aif" | "aifc" => Ok(FileType::AIFF),
            "mid" | "midi" => Ok(FileType::MIDI),
            _ => Err(()),
        }
    }
}

/// Settings for single-file and batch conversion.
///
/// # Example
///
/// ```
/// use audio_container_io::types::ConvertOptions;
///
/// let options = ConvertOptions::default()
///     .with_recursive(true)
///     .with_overwrite(false)
///     .with_output_dir("converted");
/// assert_eq!(options.chunk_size, 4096);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Transfer buffer size in bytes
    pub chunk_size: usize,
    /// Descend into subdirectories during batch conversion
    pub recursive: bool,
    /// Replace destination files that already exist
    pub overwrite: bool,
    /// Lowercase extensions (without the dot) picked up by batch conversion
    pub source_extensions: Vec<String>,
    /// Where converted files go; `None` writes them beside the source
    pub output_dir: Option<PathBuf>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            chunk_size: DEFAULT_CHUNK_SIZE,
            recursive: false,
            overwrite: true,
            source_extensions: vec!["aiff".into(), "aif".into(), "aifc".into()],
            output_dir: None,
        }
    }
}

impl ConvertOptions {
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_source_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.source_extensions = extensions
            .into_iter()
            .map(|e| e.into().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    pub fn with_output_dir<P: Into<PathBuf>>(mut self, output_dir: P) -> Self {
        self.output_dir = Some(output_dir.into());
        self
    }

    /// Check the settings before any file is touched.
    pub fn validate(&self) -> AudioIOResult<()> {
        if self.chunk_size == 0 {
            return Err(AudioIOError::invalid_parameter(
                "Chunk size must be greater than zero",
            ));
        }
        if self.source_extensions.is_empty() {
            return Err(AudioIOError::invalid_parameter(
                "At least one source extension is required",
            ));
        }
        Ok(())
    }

    /// Whether batch conversion should pick up `path`.
    pub fn matches_source(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.source_extensions
                    .iter()
                    .any(|wanted| wanted.eq_ignore_ascii_case(ext))
            })
    }

    /// Destination for `source`, found under the batch `root`.
    ///
    /// Without an output directory the file lands beside its source with a
    /// `.wav` extension. With one, the path relative to `root` is kept so a
    /// recursive batch cannot collide on equal file names.
    pub fn destination_for(&self, source: &Path, root: &Path) -> PathBuf {
        let target = match &self.output_dir {
            None => source.to_path_buf(),
            Some(dir) => match source.strip_prefix(root) {
                Ok(relative) => dir.join(relative),
                Err(_) => dir.join(source.file_name().unwrap_or(source.as_os_str())),
            },
        };
        target.with_extension(FileType::WAV.as_str())
    }
}

#[allow(dead_code)]
const fn _assert_send_sync()
where
    FileType: Send + Sync,
    ConvertOptions: Send + Sync,
    crate::descriptor::FormatDescriptor: Send + Sync,
    crate::pipeline::ConversionSummary: Send + Sync,
{
}
