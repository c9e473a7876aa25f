//! Random access over a folder of preprocessed utterances.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::collate::{collate, Batch};
use crate::config::{DatasetConfig, DEFAULT_SPEAKER_ID, WAV_EXTENSION};
use crate::discover::{list_files, parse_wav_paths};
use crate::error::{Error, Result};
use crate::sample::Sample;
use crate::speakers::SpeakerMap;

/// Indexed view of a dataset folder.
///
/// Holds only the sorted list of audio paths; features are read from disk on every access,
/// so the dataset can be shared between worker threads as-is.
#[derive(Debug, Clone)]
pub struct AudioFolderDataset {
    wav_paths: Vec<PathBuf>,
    dataset_path: PathBuf,
    speaker_map: SpeakerMap,
}

impl AudioFolderDataset {
    /// Discovers every `.wav` under `path` (recursively) and loads the speaker mapping.
    pub fn new(path: impl AsRef<Path>, speaker_mapping: impl AsRef<Path>) -> Result<Self> {
        let dataset_path = path.as_ref().to_path_buf();
        let wav_paths = list_files(&dataset_path, WAV_EXTENSION, true)?;
        Self::with_paths(dataset_path, wav_paths, speaker_mapping.as_ref())
    }

    /// Like [`AudioFolderDataset::new`], but the samples are read from a file list.
    pub fn from_filelist(
        path: impl AsRef<Path>,
        filelist: impl AsRef<Path>,
        speaker_mapping: impl AsRef<Path>,
    ) -> Result<Self> {
        let wav_paths = parse_wav_paths(filelist)?;
        Self::with_paths(path.as_ref().to_path_buf(), wav_paths, speaker_mapping.as_ref())
    }

    pub fn from_config(config: &DatasetConfig) -> Result<Self> {
        match &config.filelist {
            Some(filelist) => Self::from_filelist(&config.path, filelist, &config.speaker_mapping),
            None => Self::new(&config.path, &config.speaker_mapping),
        }
    }

    fn with_paths(dataset_path: PathBuf, wav_paths: Vec<PathBuf>, speaker_mapping: &Path) -> Result<Self> {
        let speaker_map = SpeakerMap::load(speaker_mapping)?;
        if wav_paths.is_empty() {
            return Err(Error::EmptyDataset { root: dataset_path });
        }
        log::debug!(
            "Dataset {:?}: {} samples, {} speakers",
            dataset_path,
            wav_paths.len(),
            speaker_map.len()
        );
        Ok(Self {
            wav_paths,
            dataset_path,
            speaker_map,
        })
    }

    pub fn len(&self) -> usize {
        self.wav_paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wav_paths.is_empty()
    }

    pub fn root(&self) -> &Path {
        &self.dataset_path
    }

    pub fn wav_paths(&self) -> &[PathBuf] {
        &self.wav_paths
    }

    /// Loaded for completeness; samples are not attributed through it yet.
    pub fn speaker_map(&self) -> &SpeakerMap {
        &self.speaker_map
    }

    /// Reads the sample at `index` from disk.
    pub fn get(&self, index: usize) -> Result<Sample> {
        let wav = self.wav_paths.get(index).ok_or(Error::IndexOutOfRange {
            index,
            len: self.len(),
        })?;
        Sample::load(wav, DEFAULT_SPEAKER_ID)
    }

    /// Loads several samples in parallel. The result follows the order of `indices`.
    pub fn get_many(&self, indices: &[usize]) -> Result<Vec<Sample>> {
        indices.par_iter().map(|&i| self.get(i)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = Result<Sample>> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }

    /// Batch assembly hook for data loaders; same as [`collate`].
    pub fn collate_fn(samples: &[Sample]) -> Result<Batch> {
        collate(samples)
    }
}
