//! Walks a preprocessed dataset the way a training run would: every sample is loaded, shuffled
//! into batches and collated. Use it to find broken sidecars before starting a long run, and to
//! see how much of each batch ends up being padding at a given batch size.

use std::{path::PathBuf, time::Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rand::{rng, rngs::StdRng, seq::SliceRandom, SeedableRng};
use rayon::{iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator}, ThreadPoolBuilder};

use audio_folder::{
    collate,
    config::{DEFAULT_BATCH_SIZE, DEFAULT_DATASET_PATH, DEFAULT_NUM_WORKERS, DEFAULT_SPEAKER_MAPPING},
    AudioFolderDataset, Batch, DatasetConfig, FeatureKind,
};

#[derive(Parser, Debug)]
#[command(version, about = "Load and collate every sample of an audio folder dataset")]
struct Args {
    /// Dataset root, searched recursively for .wav files.
    #[arg(long, default_value = DEFAULT_DATASET_PATH)]
    path: PathBuf,

    /// JSON object mapping speaker names to ids.
    #[arg(long, default_value = DEFAULT_SPEAKER_MAPPING)]
    speaker_mapping: PathBuf,

    /// Read sample paths from this file (one per line) instead of searching `--path`.
    #[arg(long)]
    filelist: Option<PathBuf>,

    /// JSON dataset config. Takes precedence over the three options above.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Seed for the sample order. Without it every run shuffles differently.
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, default_value_t = DEFAULT_NUM_WORKERS)]
    num_workers: usize,

    /// Stop at the first batch that fails to load or collate instead of skipping it.
    #[arg(long)]
    strict: bool,
}

/// Frame counts of one feature, summed over batches.
#[derive(Debug, Default, Clone, Copy)]
struct FeatureStats {
    longest: usize,
    frames: usize,
    padded_frames: usize,
}

impl FeatureStats {
    fn of(lens: &[usize], max_len: usize) -> Self {
        Self {
            longest: max_len,
            frames: lens.iter().sum(),
            padded_frames: lens.len() * max_len,
        }
    }

    fn merge(&mut self, other: &FeatureStats) {
        self.longest = self.longest.max(other.longest);
        self.frames += other.frames;
        self.padded_frames += other.padded_frames;
    }

    fn padding_share(&self) -> f64 {
        if self.padded_frames == 0 {
            return 0.0;
        }
        1.0 - self.frames as f64 / self.padded_frames as f64
    }
}

// Indexed like `FeatureKind::ALL`.
#[derive(Debug, Default, Clone, Copy)]
struct BatchStats {
    samples: usize,
    features: [FeatureStats; 3],
}

impl BatchStats {
    fn of(batch: &Batch) -> Self {
        let features = FeatureKind::ALL.map(|kind| match kind {
            FeatureKind::Content => FeatureStats::of(&batch.content_lens, batch.max_content_len),
            FeatureKind::Mel => FeatureStats::of(&batch.mel_lens, batch.max_mel_len),
            FeatureKind::Pitch => FeatureStats::of(&batch.pitch_lens, batch.max_pitch_len),
        });
        Self { samples: batch.len(), features }
    }

    fn merge(&mut self, other: &BatchStats) {
        self.samples += other.samples;
        for (total, stats) in self.features.iter_mut().zip(&other.features) {
            total.merge(stats);
        }
    }
}

#[derive(Debug, Default)]
struct Summary {
    total: BatchStats,
    collated: usize,
    skipped: usize,
}

fn load_batch(dataset: &AudioFolderDataset, indices: &[usize]) -> audio_folder::Result<BatchStats> {
    let samples = dataset.get_many(indices)?;
    collate(&samples).map(|batch| BatchStats::of(&batch))
}

/// Loads and collates every batch on the current rayon pool.
///
/// In strict mode the pass stops at the first failing batch. Otherwise failing batches are
/// logged and counted as skipped.
fn collate_batches(
    dataset: &AudioFolderDataset,
    batches: &[&[usize]],
    strict: bool,
    pb: &ProgressBar,
) -> Result<Summary> {
    let mut summary = Summary::default();

    if strict {
        let stats = batches
            .par_iter()
            .enumerate()
            .progress_with(pb.clone())
            .map(|(batch_idx, indices)| {
                load_batch(dataset, indices).with_context(|| format!("Batch {} failed", batch_idx))
            })
            .collect::<Result<Vec<_>>>()?;
        for batch in &stats {
            summary.total.merge(batch);
        }
        summary.collated = stats.len();
        return Ok(summary);
    }

    let results: Vec<(usize, audio_folder::Result<BatchStats>)> = batches
        .par_iter()
        .enumerate()
        .progress_with(pb.clone())
        .map(|(batch_idx, indices)| (batch_idx, load_batch(dataset, indices)))
        .collect();
    for (batch_idx, result) in results {
        match result {
            Ok(stats) => {
                summary.total.merge(&stats);
                summary.collated += 1;
            }
            Err(e) => {
                log::warn!("Skipping batch {}: {:#}", batch_idx, anyhow::Error::from(e));
                summary.skipped += 1;
            }
        }
    }
    Ok(summary)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let start_time = Instant::now();

    if args.batch_size == 0 {
        bail!("--batch-size must be at least 1");
    }

    let config = match &args.config {
        Some(path) => DatasetConfig::from_json_file(path)
            .with_context(|| format!("Failed to read dataset config {:?}", path))?,
        None => DatasetConfig {
            path: args.path.clone(),
            speaker_mapping: args.speaker_mapping.clone(),
            filelist: args.filelist.clone(),
        },
    };

    let dataset = AudioFolderDataset::from_config(&config)
        .with_context(|| format!("Failed to open dataset at {:?}", config.path))?;
    println!(
        "Found {} samples under {:?} ({} speakers in mapping).",
        dataset.len(),
        dataset.root(),
        dataset.speaker_map().len()
    );

    // Same order a seeded training run would see.
    let mut indices: Vec<usize> = (0..dataset.len()).collect();
    match args.seed {
        Some(seed) => indices.shuffle(&mut StdRng::seed_from_u64(seed)),
        None => indices.shuffle(&mut rng()),
    }
    let batches: Vec<&[usize]> = indices.chunks(args.batch_size).collect();

    let pool = ThreadPoolBuilder::new()
        .num_threads(args.num_workers)
        .build()?;

    let pb = ProgressBar::new(batches.len() as u64);
    pb.set_style(ProgressStyle::default_bar()
        .template("{spinner:.green} {prefix:15.bold.dim} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
        .progress_chars("#>-"));
    pb.set_prefix("Collating");

    let summary = pool.install(|| collate_batches(&dataset, &batches, args.strict, &pb))?;
    pb.finish_and_clear();
    let Summary { total, collated, skipped } = summary;

    println!("\n✅ Collated {} batches ({} samples), skipped {}.", collated, total.samples, skipped);
    for (kind, stats) in FeatureKind::ALL.iter().zip(&total.features) {
        println!(
            "  - {:<8} longest {:>6} frames, {:>5.1}% padding",
            kind.to_string(),
            stats.longest,
            stats.padding_share() * 100.0
        );
    }
    println!("Total time elapsed: {:?}", start_time.elapsed());

    if skipped > 0 {
        bail!("{} of {} batches could not be loaded", skipped, batches.len());
    }
    Ok(())
}
