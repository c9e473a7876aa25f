//! One training example: the three precomputed features of an utterance.

use std::{fmt, path::{Path, PathBuf}};

use ndarray::{Array, Array1, Array2, Dimension, Ix1, Ix2};
use ndarray_npy::{read_npy, ReadNpyError};

use crate::config::{CONTENT_SUFFIX, MEL_SUFFIX, PITCH_SUFFIX};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    /// Content (soft unit) embedding, stored `[feature_dim, time]`.
    Content,
    /// Mel-spectrogram, stored `[mel_bins, time]`.
    Mel,
    /// Per-frame f0, stored `[time]`.
    Pitch,
}

impl FeatureKind {
    pub const ALL: [FeatureKind; 3] = [FeatureKind::Content, FeatureKind::Mel, FeatureKind::Pitch];

    pub fn suffix(self) -> &'static str {
        match self {
            FeatureKind::Content => CONTENT_SUFFIX,
            FeatureKind::Mel => MEL_SUFFIX,
            FeatureKind::Pitch => PITCH_SUFFIX,
        }
    }

    /// `<wav>` + suffix. The audio extension is kept: `a.wav` -> `a.wav.mel.npy`.
    pub fn sidecar_path(self, wav: &Path) -> PathBuf {
        let mut path = wav.as_os_str().to_owned();
        path.push(self.suffix());
        PathBuf::from(path)
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FeatureKind::Content => "content",
            FeatureKind::Mel => "mel",
            FeatureKind::Pitch => "pitch",
        })
    }
}

/// Features of a single utterance, time on the leading axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Audio path the sidecars were found next to.
    pub path: String,
    pub speaker: i64,
    /// `[time_c, feature_dim]`
    pub content: Array2<f32>,
    /// `[time_m, mel_bins]`
    pub mel: Array2<f32>,
    /// `[time_p]`
    pub pitch: Array1<f32>,
}

impl Sample {
    /// Loads all three sidecars of `wav`. Fails if any of them is missing.
    ///
    /// `wav` must be valid UTF-8, since it is kept as [`Sample::path`].
    pub fn load(wav: &Path, speaker: i64) -> Result<Self> {
        let path = wav.to_str().ok_or_else(|| Error::NonUtf8Path {
            path: wav.to_path_buf(),
        })?;
        let mel = load_time_major(&FeatureKind::Mel.sidecar_path(wav))?;
        let content = load_time_major(&FeatureKind::Content.sidecar_path(wav))?;
        let pitch = load_feature::<Ix1>(&FeatureKind::Pitch.sidecar_path(wav))?;

        log::trace!(
            "Loaded {:?}: content {:?}, mel {:?}, pitch {:?}",
            wav,
            content.shape(),
            mel.shape(),
            pitch.shape()
        );

        Ok(Self {
            path: path.to_owned(),
            speaker,
            content,
            mel,
            pitch,
        })
    }

    pub fn content_len(&self) -> usize {
        self.content.nrows()
    }

    pub fn mel_len(&self) -> usize {
        self.mel.nrows()
    }

    pub fn pitch_len(&self) -> usize {
        self.pitch.len()
    }
}

/// Reads a `.npy` array as `f32`.
///
/// Files saved as `f64` (common for f0 extractors) are narrowed to `f32`.
pub fn load_feature<D: Dimension>(path: &Path) -> Result<Array<f32, D>> {
    let loaded = match read_npy::<_, Array<f32, D>>(path) {
        Err(ReadNpyError::WrongDescriptor(_)) => {
            read_npy::<_, Array<f64, D>>(path).map(|array| array.mapv(|v| v as f32))
        }
        other => other,
    };
    loaded.map_err(|source| Error::MissingArtifact {
        path: path.to_path_buf(),
        source,
    })
}

// Stored `[channels, time]`, returned `[time, channels]` in standard layout.
fn load_time_major(path: &Path) -> Result<Array2<f32>> {
    let stored = load_feature::<Ix2>(path)?;
    Ok(stored.reversed_axes().as_standard_layout().into_owned())
}
