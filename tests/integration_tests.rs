//! Integration tests for key estimation

use keyscope::features::chroma::Chromagram;
use keyscope::features::key::detect_key;
use keyscope::{
    estimate_key, estimate_key_with_config, estimate_keys_batch, AlternatePolicy,
    AnalysisConfig, AnalysisError, AudioSegment, Key, Mode,
};
use std::f32::consts::PI;

const SAMPLE_RATE: u32 = 44100;

const C_MAJOR_TRIAD: [f32; 3] = [261.63, 329.63, 392.0];
const A_MINOR_TRIAD: [f32; 3] = [220.0, 261.63, 329.63];
const D_MAJOR_TRIAD: [f32; 3] = [293.66, 369.99, 440.0];

/// Sum of sines with short linear fades at both ends
fn chord(freqs: &[f32], sample_rate: u32, seconds: f32) -> Vec<f32> {
    let n = (sample_rate as f32 * seconds) as usize;
    let fade = (sample_rate as usize / 100).min(n / 2).max(1);
    (0..n)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            let gain = (i.min(n - 1 - i) as f32 / fade as f32).min(1.0);
            gain * freqs
                .iter()
                .map(|f| 0.25 * (2.0 * PI * f * t).sin())
                .sum::<f32>()
        })
        .collect()
}

/// Load a WAV file and return (mono samples, sample_rate)
fn load_wav(path: &std::path::Path) -> Result<(Vec<f32>, u32), Box<dyn std::error::Error>> {
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

#[test]
fn test_c_major_triad() {
    let samples = chord(&C_MAJOR_TRIAD, SAMPLE_RATE, 2.0);
    let estimate = estimate_key(&samples, SAMPLE_RATE, None, None)
        .expect("Estimation should succeed");

    assert_eq!(estimate.key, Key::Major(0), "got {}", estimate.key);
    assert!(
        estimate.confidence > 0.6 && estimate.confidence <= 1.0,
        "confidence {:.3} out of expected range",
        estimate.confidence
    );
    assert_eq!(estimate.scores.len(), 24);
}

#[test]
fn test_a_minor_triad() {
    let samples = chord(&A_MINOR_TRIAD, SAMPLE_RATE, 2.0);
    let estimate = estimate_key(&samples, SAMPLE_RATE, None, None)
        .expect("Estimation should succeed");

    assert_eq!(estimate.key, Key::Minor(9), "got {}", estimate.key);
    assert_eq!(estimate.key.mode(), Mode::Minor);
    assert_eq!(estimate.key.label(), "A minor");
}

#[test]
fn test_transposed_triad_at_lower_rate() {
    let samples = chord(&D_MAJOR_TRIAD, 22050, 2.0);
    let estimate = estimate_key(&samples, 22050, None, None).expect("Estimation should succeed");
    assert_eq!(estimate.key, Key::Major(2), "got {}", estimate.key);
}

#[test]
fn test_alternate_rule_holds() {
    let samples = chord(&C_MAJOR_TRIAD, SAMPLE_RATE, 1.0);
    let estimate = estimate_key(&samples, SAMPLE_RATE, None, None).unwrap();

    // Every score is bounded and none beats the primary
    for (key, score) in &estimate.scores {
        assert!((-1.0..=1.0).contains(score), "{} scored {}", key, score);
        assert!(*score <= estimate.confidence);
    }

    match (estimate.alternative_key, estimate.alternative_confidence) {
        (Some(alt), Some(conf)) => {
            assert_ne!(alt, estimate.key);
            assert!(conf as f64 > 0.9 * estimate.confidence as f64);
        }
        (None, None) => {
            let runner_up = estimate
                .scores
                .iter()
                .filter(|(k, _)| *k != estimate.key)
                .map(|(_, s)| *s)
                .fold(f32::NEG_INFINITY, f32::max);
            assert!(runner_up as f64 <= 0.9 * estimate.confidence as f64 + 1e-6);
        }
        other => panic!("alternate key and confidence disagree: {:?}", other),
    }
}

#[test]
fn test_silence_is_indeterminate() {
    let samples = vec![0.0f32; SAMPLE_RATE as usize * 2];
    let err = estimate_key(&samples, SAMPLE_RATE, None, None).unwrap_err();
    assert!(err.is_indeterminate(), "unexpected error: {}", err);
}

#[test]
fn test_empty_trim_is_invalid_segment() {
    let samples = chord(&C_MAJOR_TRIAD, SAMPLE_RATE, 1.0);

    let err = estimate_key(&samples, SAMPLE_RATE, Some(5.0), None).unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidSegment(_)), "got {:?}", err);

    let err = estimate_key(&samples, SAMPLE_RATE, Some(0.5), Some(0.5)).unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidSegment(_)), "got {:?}", err);

    let err = estimate_key(&[], SAMPLE_RATE, None, None).unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidSegment(_)), "got {:?}", err);
}

#[test]
fn test_bounds_select_region() {
    // 2 s of C major followed by 2 s of A minor
    let mut samples = chord(&C_MAJOR_TRIAD, SAMPLE_RATE, 2.0);
    samples.extend(chord(&A_MINOR_TRIAD, SAMPLE_RATE, 2.0));

    let first = estimate_key(&samples, SAMPLE_RATE, None, Some(2.0)).unwrap();
    assert_eq!(first.key, Key::Major(0), "got {}", first.key);

    let second = estimate_key(&samples, SAMPLE_RATE, Some(2.0), None).unwrap();
    assert_eq!(second.key, Key::Minor(9), "got {}", second.key);

    // An end past the signal is clamped
    let clamped = estimate_key(&samples, SAMPLE_RATE, Some(2.0), Some(60.0)).unwrap();
    assert_eq!(clamped, second);
}

#[test]
fn test_estimation_is_deterministic() {
    let samples = chord(&A_MINOR_TRIAD, SAMPLE_RATE, 1.5);
    let a = estimate_key(&samples, SAMPLE_RATE, None, None).unwrap();
    let b = estimate_key(&samples, SAMPLE_RATE, None, None).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.scores, b.scores);
}

#[test]
fn test_batch_preserves_order_and_isolates_errors() {
    let c_major = chord(&C_MAJOR_TRIAD, SAMPLE_RATE, 1.5);
    let a_minor = chord(&A_MINOR_TRIAD, SAMPLE_RATE, 1.5);
    let silence = vec![0.0f32; SAMPLE_RATE as usize];

    let segments = vec![
        AudioSegment::new(&c_major, SAMPLE_RATE),
        AudioSegment::new(&silence, SAMPLE_RATE),
        AudioSegment::new(&a_minor, SAMPLE_RATE),
        AudioSegment::new(&a_minor, SAMPLE_RATE).with_bounds(Some(10.0), None),
    ];

    let results = estimate_keys_batch(&segments, &AnalysisConfig::default());
    assert_eq!(results.len(), 4);

    assert_eq!(results[0].as_ref().unwrap().key, Key::Major(0));
    assert!(matches!(results[1], Err(AnalysisError::IndeterminateKey(_))));
    assert_eq!(results[2].as_ref().unwrap().key, Key::Minor(9));
    assert!(matches!(results[3], Err(AnalysisError::InvalidSegment(_))));

    // Batch results match single estimations
    let single = estimate_key_with_config(&segments[2], &AnalysisConfig::default()).unwrap();
    assert_eq!(results[2].as_ref().unwrap(), &single);
}

#[test]
fn test_invalid_config_rejected() {
    let samples = chord(&C_MAJOR_TRIAD, SAMPLE_RATE, 0.5);
    let config = AnalysisConfig {
        bins_per_octave: 12,
        ..Default::default()
    };
    let segment = AudioSegment::new(&samples, SAMPLE_RATE);
    let err = estimate_key_with_config(&segment, &config).unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidInput(_)), "got {:?}", err);
}

#[test]
fn test_oversized_config_from_json_rejected() {
    let samples = chord(&C_MAJOR_TRIAD, SAMPLE_RATE, 0.5);
    let segment = AudioSegment::new(&samples, SAMPLE_RATE);

    for json in [
        r#"{"n_octaves": 9223372036854775807}"#,
        r#"{"bins_per_octave": 1200000}"#,
    ] {
        let config: AnalysisConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err(), "{} should not validate", json);

        let err = estimate_key_with_config(&segment, &config).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidInput(_)), "got {:?}", err);
    }
}

#[test]
fn test_response_json_shape() {
    // C major triad chroma: C major 0.834 with E minor 0.76 as alternate
    let chroma = Chromagram::new([1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0])
        .unwrap();
    let estimate = detect_key(&chroma, &AnalysisConfig::default()).unwrap();

    let json = serde_json::to_value(&estimate).unwrap();
    let obj = json.as_object().expect("estimate serializes to an object");
    assert_eq!(obj.len(), 4, "unexpected fields: {:?}", obj.keys());
    assert_eq!(json["key"], "C major");
    assert_eq!(json["alternative_key"], "E minor");
    assert!((json["confidence"].as_f64().unwrap() - 0.834).abs() < 1e-6);
    assert!((json["alternative_confidence"].as_f64().unwrap() - 0.76).abs() < 1e-6);

    // No alternate serializes as nulls
    let config = AnalysisConfig {
        alternate_ratio: 0.95,
        ..Default::default()
    };
    let estimate = detect_key(&chroma, &config).unwrap();
    let json = serde_json::to_value(&estimate).unwrap();
    assert!(json["alternative_key"].is_null());
    assert!(json["alternative_confidence"].is_null());

    // Enharmonic labels survive a round trip
    let json = serde_json::to_string(&Key::new(1, Mode::Minor)).unwrap();
    assert_eq!(json, "\"C#/Db minor\"");
    let key: Key = serde_json::from_str(&json).unwrap();
    assert_eq!(key, Key::Minor(1));
}

#[test]
fn test_config_from_partial_json() {
    let config: AnalysisConfig = serde_json::from_str(
        r#"{"hop_size": 1024, "alternate_policy": "LastQualifying", "norm": "L2"}"#,
    )
    .unwrap();

    assert_eq!(config.hop_size, 1024);
    assert_eq!(config.alternate_policy, AlternatePolicy::LastQualifying);
    assert_eq!(config.frame_size, AnalysisConfig::default().frame_size);
    assert_eq!(config.bins_per_octave, 24);
    assert!(config.validate().is_ok());

    let samples = chord(&C_MAJOR_TRIAD, SAMPLE_RATE, 1.5);
    let segment = AudioSegment::new(&samples, SAMPLE_RATE);
    let estimate = estimate_key_with_config(&segment, &config).unwrap();
    assert_eq!(estimate.key, Key::Major(0));
}

#[test]
fn test_wav_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a_minor.wav");

    // Stereo 16-bit PCM, as most files arrive
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for s in chord(&A_MINOR_TRIAD, SAMPLE_RATE, 2.0) {
        let v = (s * i16::MAX as f32) as i16;
        writer.write_sample(v).unwrap();
        writer.write_sample(v).unwrap();
    }
    writer.finalize().unwrap();

    let (samples, sample_rate) = load_wav(&path).expect("Failed to load written WAV");
    assert_eq!(sample_rate, SAMPLE_RATE);
    assert_eq!(samples.len(), SAMPLE_RATE as usize * 2);

    let estimate = estimate_key(&samples, sample_rate, None, None).unwrap();
    assert_eq!(estimate.key, Key::Minor(9), "got {}", estimate.key);
}
