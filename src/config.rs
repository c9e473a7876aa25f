//! Where the dataset lives and how its files are named.
//!
//! The dataset is a folder of `.wav` files, each accompanied by three precomputed feature
//! sidecars written by the preprocessing step. The sidecar for a feature is named by appending
//! its suffix to the full audio path, so `song/001.wav` owns `song/001.wav.mel.npy`,
//! `song/001.wav.soft.npy` and `song/001.wav.f0.npy`.
//!
//! Nothing here touches the audio itself; the `.wav` path is only used as a key.

use std::{fs, path::{Path, PathBuf}};

use serde::Deserialize;

use crate::error::{Error, Result};

// Extension that marks a sample. Matching is case-sensitive.
pub const WAV_EXTENSION: &str = "wav";

pub const MEL_SUFFIX: &str = ".mel.npy";
pub const CONTENT_SUFFIX: &str = ".soft.npy";
pub const PITCH_SUFFIX: &str = ".f0.npy";

pub const DEFAULT_DATASET_PATH: &str = "dataset";
pub const DEFAULT_SPEAKER_MAPPING: &str = "dataset/speakers.json";

// Every sample is attributed to this speaker. The speaker map is loaded alongside the dataset,
// but there is no agreed key (file name, parent folder, ...) to look a sample up by yet.
pub const DEFAULT_SPEAKER_ID: i64 = 0;

// Used by the `audio-folder` binary only.
pub const DEFAULT_BATCH_SIZE: usize = 16;
// Loading is pure file I/O plus a transpose, so a handful of threads saturates most disks.
pub const DEFAULT_NUM_WORKERS: usize = 4;

/// Describes one dataset on disk.
///
/// Can be deserialized from JSON, e.g.
/// `{"path": "data/opencpop", "speaker_mapping": "data/opencpop/speakers.json"}`.
/// Missing fields fall back to the defaults above.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Root folder searched recursively for `.wav` files.
    pub path: PathBuf,
    /// JSON object mapping speaker names to ids.
    pub speaker_mapping: PathBuf,
    /// Optional file listing one `.wav` path per line. When set, it replaces discovery.
    pub filelist: Option<PathBuf>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DATASET_PATH),
            speaker_mapping: PathBuf::from(DEFAULT_SPEAKER_MAPPING),
            filelist: None,
        }
    }
}

impl DatasetConfig {
    /// Reads a config from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| Error::configuration(path, e))?;
        serde_json::from_str(&text).map_err(|e| Error::configuration(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let config = DatasetConfig::default();
        assert_eq!(config.path, PathBuf::from("dataset"));
        assert_eq!(config.speaker_mapping, PathBuf::from("dataset/speakers.json"));
        assert!(config.filelist.is_none());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: DatasetConfig = serde_json::from_str(r#"{"path": "data/opencpop"}"#).unwrap();
        assert_eq!(config.path, PathBuf::from("data/opencpop"));
        assert_eq!(config.speaker_mapping, PathBuf::from(DEFAULT_SPEAKER_MAPPING));
    }

    #[test]
    fn unreadable_config_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DatasetConfig::from_json_file(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));

        let bad = dir.path().join("bad.json");
        fs::write(&bad, "{ not json").unwrap();
        let err = DatasetConfig::from_json_file(&bad).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }
}
