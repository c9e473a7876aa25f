//! Dataset and batch collation for singing voice conversion training.
//!
//! An [`AudioFolderDataset`] indexes every `.wav` below a folder and, on access, reads the
//! precomputed mel-spectrogram, content embedding and pitch sidecars of one utterance. [`collate`]
//! zero-pads a list of such samples into a [`Batch`] for the training loop.

pub mod collate;
pub mod config;
pub mod dataset;
pub mod discover;
pub mod error;
pub mod sample;
pub mod speakers;

pub use collate::{collate, pad_and_stack, Batch, Padded};
pub use config::DatasetConfig;
pub use dataset::AudioFolderDataset;
pub use error::{Error, Result};
pub use sample::{FeatureKind, Sample};
pub use speakers::{SpeakerId, SpeakerMap};
