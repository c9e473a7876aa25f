//! Turning a list of variable-length samples into one zero-padded batch.

use ndarray::{Array, Array2, Array3, ArrayD, ArrayView, Axis, Dimension, IxDyn, Slice};

use crate::error::{Error, Result};
use crate::sample::{FeatureKind, Sample};

/// A stack of sequences padded to a common length.
#[derive(Debug, Clone, PartialEq)]
pub struct Padded<D: Dimension> {
    /// `[batch, max_len, ...]`
    pub data: Array<f32, D>,
    /// True (unpadded) length of each sequence.
    pub lens: Vec<usize>,
    pub max_len: usize,
}

/// Pads every array along its leading (time) axis to the longest one and stacks them along a
/// new batch axis.
///
/// Padding is zeros appended after the last frame. All arrays must agree on every axis but the
/// first.
pub fn pad_and_stack<D: Dimension>(
    feature: FeatureKind,
    arrays: &[ArrayView<'_, f32, D>],
) -> Result<Padded<D::Larger>> {
    let first = arrays.first().ok_or(Error::EmptyBatch)?;
    let trailing = first.shape().get(1..).unwrap_or_default();
    for (index, array) in arrays.iter().enumerate().skip(1) {
        let found = array.shape().get(1..).unwrap_or_default();
        if found != trailing {
            return Err(Error::ShapeMismatch {
                feature,
                index,
                expected: trailing.to_vec(),
                found: found.to_vec(),
            });
        }
    }

    let lens: Vec<usize> = arrays.iter().map(|a| a.len_of(Axis(0))).collect();
    let max_len = lens.iter().copied().max().unwrap_or(0);

    let mut shape = vec![arrays.len(), max_len];
    shape.extend_from_slice(trailing);
    let mut data = ArrayD::<f32>::zeros(IxDyn(&shape));
    for (i, (array, &len)) in arrays.iter().zip(&lens).enumerate() {
        data.index_axis_mut(Axis(0), i)
            .slice_axis_mut(Axis(0), Slice::from(0..len))
            .assign(&array.view().into_dyn());
    }

    Ok(Padded {
        data: data.into_dimensionality::<D::Larger>()?,
        lens,
        max_len,
    })
}

/// Collated features, ready for a training step.
///
/// Entry `i` of every field belongs to the `i`-th input sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub paths: Vec<String>,
    pub speakers: Vec<i64>,

    /// `[batch, max_content_len, feature_dim]`
    pub contents: Array3<f32>,
    pub content_lens: Vec<usize>,
    pub max_content_len: usize,

    /// `[batch, max_mel_len, mel_bins]`
    pub mels: Array3<f32>,
    pub mel_lens: Vec<usize>,
    pub max_mel_len: usize,

    /// `[batch, max_pitch_len]`
    pub pitches: Array2<f32>,
    pub pitch_lens: Vec<usize>,
    pub max_pitch_len: usize,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Collates samples into a [`Batch`]. Each feature is padded independently.
pub fn collate(samples: &[Sample]) -> Result<Batch> {
    if samples.is_empty() {
        return Err(Error::EmptyBatch);
    }

    let contents: Vec<_> = samples.iter().map(|s| s.content.view()).collect();
    let contents = pad_and_stack(FeatureKind::Content, &contents)?;

    let mels: Vec<_> = samples.iter().map(|s| s.mel.view()).collect();
    let mels = pad_and_stack(FeatureKind::Mel, &mels)?;

    let pitches: Vec<_> = samples.iter().map(|s| s.pitch.view()).collect();
    let pitches = pad_and_stack(FeatureKind::Pitch, &pitches)?;

    Ok(Batch {
        paths: samples.iter().map(|s| s.path.clone()).collect(),
        speakers: samples.iter().map(|s| s.speaker).collect(),
        contents: contents.data,
        content_lens: contents.lens,
        max_content_len: contents.max_len,
        mels: mels.data,
        mel_lens: mels.lens,
        max_mel_len: mels.max_len,
        pitches: pitches.data,
        pitch_lens: pitches.lens,
        max_pitch_len: pitches.max_len,
    })
}

#[cfg(test)]
mod tests {
    use ndarray::{arr1, s, Array1};

    use super::*;

    fn sample(name: &str, content_len: usize, mel_len: usize, pitch_len: usize) -> Sample {
        // Values start at 1 so that any zero inside the true length would be a bug.
        let fill = |n: usize, dim: usize| Array2::from_shape_fn((n, dim), |(t, d)| (t * dim + d + 1) as f32);
        Sample {
            path: format!("{name}.wav"),
            speaker: 0,
            content: fill(content_len, 4),
            mel: fill(mel_len, 3),
            pitch: Array1::from_shape_fn(pitch_len, |t| 100.0 + t as f32),
        }
    }

    #[test]
    fn pads_each_feature_to_its_own_max() {
        let samples = [sample("a", 10, 12, 12), sample("b", 7, 12, 11)];
        let batch = collate(&samples).unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.paths, ["a.wav", "b.wav"]);
        assert_eq!(batch.speakers, [0, 0]);

        assert_eq!(batch.content_lens, [10, 7]);
        assert_eq!(batch.max_content_len, 10);
        assert_eq!(batch.contents.shape(), &[2, 10, 4]);
        assert!(batch.contents.slice(s![1, 7.., ..]).iter().all(|&v| v == 0.0));

        assert_eq!(batch.mel_lens, [12, 12]);
        assert_eq!(batch.max_mel_len, 12);
        assert_eq!(batch.mels.shape(), &[2, 12, 3]);

        assert_eq!(batch.pitch_lens, [12, 11]);
        assert_eq!(batch.pitches.shape(), &[2, 12]);
        assert_eq!(batch.pitches[[1, 11]], 0.0);
    }

    #[test]
    fn true_frames_survive_padding() {
        let samples = [sample("a", 3, 5, 4), sample("b", 6, 2, 6), sample("c", 1, 5, 2)];
        let batch = collate(&samples).unwrap();

        for (i, s) in samples.iter().enumerate() {
            let len = batch.content_lens[i];
            assert_eq!(batch.contents.slice(s![i, ..len, ..]), s.content);
            assert!(batch.contents.slice(s![i, len.., ..]).iter().all(|&v| v == 0.0));

            let len = batch.mel_lens[i];
            assert_eq!(batch.mels.slice(s![i, ..len, ..]), s.mel);
            assert!(batch.mels.slice(s![i, len.., ..]).iter().all(|&v| v == 0.0));

            let len = batch.pitch_lens[i];
            assert_eq!(batch.pitches.slice(s![i, ..len]), s.pitch);
            assert!(batch.pitches.slice(s![i, len..]).iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn single_sample_is_not_padded() {
        let only = sample("solo", 5, 6, 7);
        let batch = collate(std::slice::from_ref(&only)).unwrap();

        assert_eq!((batch.max_content_len, batch.max_mel_len, batch.max_pitch_len), (5, 6, 7));
        assert_eq!(batch.contents.index_axis(Axis(0), 0), only.content);
        assert_eq!(batch.mels.index_axis(Axis(0), 0), only.mel);
        assert_eq!(batch.pitches.index_axis(Axis(0), 0), only.pitch);
    }

    #[test]
    fn empty_batch_is_rejected() {
        let err = collate(&[]).unwrap_err();
        assert!(matches!(err, Error::EmptyBatch));
        assert!(err.is_collation());

        let none: [ArrayView<'_, f32, ndarray::Ix1>; 0] = [];
        assert!(matches!(pad_and_stack(FeatureKind::Pitch, &none), Err(Error::EmptyBatch)));
    }

    #[test]
    fn mismatched_feature_dim_is_rejected() {
        let mut odd = sample("odd", 4, 4, 4);
        odd.mel = Array2::zeros((4, 5));
        let samples = [sample("a", 4, 4, 4), sample("b", 4, 4, 4), odd];

        match collate(&samples).unwrap_err() {
            Error::ShapeMismatch { feature, index, expected, found } => {
                assert_eq!(feature, FeatureKind::Mel);
                assert_eq!(index, 2);
                assert_eq!(expected, [3]);
                assert_eq!(found, [5]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn zero_length_sequences_stack() {
        let empty = Array1::<f32>::zeros(0);
        let some = arr1(&[1.0f32, 2.0]);
        let padded = pad_and_stack(FeatureKind::Pitch, &[empty.view(), some.view()]).unwrap();

        assert_eq!(padded.lens, [0, 2]);
        assert_eq!(padded.max_len, 2);
        assert_eq!(padded.data, ndarray::arr2(&[[0.0f32, 0.0], [1.0, 2.0]]));
    }
}
