//! Example: Batch process multiple WAV files
//!
//! Usage: `cargo run --release --example batch_process -- <a.wav> <b.wav> ...`
//!
//! Files are decoded one after another, then estimated in parallel.

use keyscope::{estimate_keys_batch, AnalysisConfig, AudioSegment};
use std::path::PathBuf;
use std::time::Instant;

fn load_mono(path: &PathBuf) -> Result<(Vec<f32>, u32), hound::Error> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let max_value = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / max_value))
                .collect::<Result<_, _>>()?
        }
    };

    let channels = spec.channels.max(1) as usize;
    let mono = samples
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();

    Ok((mono, spec.sample_rate))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let paths: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();
    let config = AnalysisConfig::default();

    let mut loaded = Vec::with_capacity(paths.len());
    for path in &paths {
        match load_mono(path) {
            Ok(audio) => loaded.push((path, audio)),
            Err(e) => eprintln!("Skipping {:?}: {}", path, e),
        }
    }

    println!("Processing {} files...", loaded.len());
    let start = Instant::now();

    let segments: Vec<AudioSegment<'_>> = loaded
        .iter()
        .map(|(_, (samples, sr))| AudioSegment::new(samples, *sr))
        .collect();
    let results = estimate_keys_batch(&segments, &config);

    let mut ambiguous = 0;
    for ((path, _), result) in loaded.iter().zip(results) {
        match result {
            Ok(estimate) => {
                if estimate.has_alternative() {
                    ambiguous += 1;
                }
                let alt = estimate
                    .alternative_key
                    .map(|k| format!(" (alt: {})", k))
                    .unwrap_or_default();
                println!("{:?}: {} {:.3}{}", path, estimate.key, estimate.confidence, alt);
            }
            Err(e) => eprintln!("{:?}: error: {}", path, e),
        }
    }

    println!(
        "Done in {:.2} s ({} with a plausible alternate key)",
        start.elapsed().as_secs_f32(),
        ambiguous
    );
    Ok(())
}
