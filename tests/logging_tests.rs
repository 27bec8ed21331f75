//! Log output of a full estimation

use keyscope::{estimate_key_with_config, AnalysisConfig, AudioSegment};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::f32::consts::PI;
use std::sync::Mutex;

/// Records every warning so tests can count them
struct WarningRecorder {
    warnings: Mutex<Vec<String>>,
}

impl Log for WarningRecorder {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Warn
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            if let Ok(mut warnings) = self.warnings.lock() {
                warnings.push(record.args().to_string());
            }
        }
    }

    fn flush(&self) {}
}

static RECORDER: WarningRecorder = WarningRecorder {
    warnings: Mutex::new(Vec::new()),
};

#[test]
fn test_hop_warning_logged_once_per_estimation() {
    log::set_logger(&RECORDER).expect("logger installed once");
    log::set_max_level(LevelFilter::Warn);

    let sample_rate = 44100;
    let samples: Vec<f32> = (0..sample_rate as usize)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            [261.63f32, 329.63, 392.0]
                .iter()
                .map(|f| 0.25 * (2.0 * PI * f * t).sin())
                .sum()
        })
        .collect();

    let config = AnalysisConfig {
        frame_size: 4096,
        hop_size: 8192,
        ..Default::default()
    };
    let segment = AudioSegment::new(&samples, sample_rate);
    let estimate = estimate_key_with_config(&segment, &config).unwrap();
    assert!(estimate.confidence > 0.0);

    let warnings = RECORDER.warnings.lock().unwrap();
    let hop_warnings = warnings
        .iter()
        .filter(|w| w.contains("exceeds frame_size"))
        .count();
    assert_eq!(hop_warnings, 1, "warnings: {:?}", *warnings);
}
