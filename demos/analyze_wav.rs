//! Example: Estimate the key of a WAV file
//!
//! Usage: `cargo run --example analyze_wav -- <file.wav> [start_seconds] [end_seconds]`
//!
//! Prints the estimate as JSON. Set `RUST_LOG=debug` for stage timings.

use keyscope::estimate_key;
use std::path::Path;

/// Load a WAV file and mix it down to mono
fn load_wav(path: &Path) -> Result<(Vec<f32>, u32), Box<dyn std::error::Error>> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let max_value = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / max_value))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    let channels = spec.channels.max(1) as usize;
    let mono = samples
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();

    Ok((mono, spec.sample_rate))
}

fn parse_seconds(arg: Option<&String>) -> Result<Option<f64>, Box<dyn std::error::Error>> {
    match arg {
        Some(s) => Ok(Some(s.parse::<f64>()?)),
        None => Ok(None),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let Some(path) = args.get(1) else {
        eprintln!("usage: {} <file.wav> [start_seconds] [end_seconds]", args[0]);
        std::process::exit(2);
    };
    let start_time = parse_seconds(args.get(2))?;
    let end_time = parse_seconds(args.get(3))?;

    let (samples, sample_rate) = load_wav(Path::new(path))?;
    log::info!(
        "Loaded {}: {:.2} s at {} Hz",
        path,
        samples.len() as f64 / sample_rate as f64,
        sample_rate
    );

    let estimate = estimate_key(&samples, sample_rate, start_time, end_time)?;
    println!("{}", serde_json::to_string_pretty(&estimate)?);

    Ok(())
}
