use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::sample::FeatureKind;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The speaker mapping or a dataset config file is missing or not valid JSON.
    #[error("Invalid configuration file {path:?}")]
    Configuration {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Cannot read file list {path:?}")]
    Filelist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid glob pattern")]
    Pattern(#[from] glob::PatternError),
    #[error("Error while listing dataset files")]
    Discovery(#[from] glob::GlobError),
    #[error("No .wav files found under {root:?}")]
    EmptyDataset { root: PathBuf },
    /// A sidecar `.npy` file is absent or cannot be decoded.
    #[error("Missing or unreadable artifact {path:?}")]
    MissingArtifact {
        path: PathBuf,
        #[source]
        source: ndarray_npy::ReadNpyError,
    },
    /// Sample paths are handed to the training loop as strings.
    #[error("Sample path {path:?} is not valid UTF-8")]
    NonUtf8Path { path: PathBuf },
    #[error("Index {index} out of range for dataset of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Cannot collate an empty batch")]
    EmptyBatch,
    #[error(
        "Sample {index} has {feature} shape {found:?} (excluding time), expected {expected:?} like the first sample"
    )]
    ShapeMismatch {
        feature: FeatureKind,
        index: usize,
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    #[error("Ndarray Shape Error")]
    Shape(#[from] ndarray::ShapeError),
}

impl Error {
    pub(crate) fn configuration(
        path: &Path,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Error::Configuration {
            path: path.to_path_buf(),
            source: source.into(),
        }
    }

    /// True for the errors raised by [`crate::collate`].
    pub fn is_collation(&self) -> bool {
        matches!(self, Error::EmptyBatch | Error::ShapeMismatch { .. })
    }
}
