//! Estimation result types

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Pitch-class spellings used in key labels (0 = C, ..., 11 = B)
pub const PITCH_NAMES: [&str; 12] = [
    "C", "C#/Db", "D", "D#/Eb", "E", "F", "F#/Gb", "G", "G#/Ab", "A", "A#/Bb", "B",
];

const SHORT_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Tonal mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// Major mode
    Major,
    /// Minor mode
    Minor,
}

impl Mode {
    /// Lowercase mode word used in labels
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Major => "major",
            Mode::Minor => "minor",
        }
    }
}

/// Musical key
///
/// Serializes as its label, e.g. `"C#/Db minor"`. Prefer [`Key::new`];
/// a tonic written directly into a variant is read modulo 12, so
/// `Key::Major(12)` and `Key::Major(0)` are the same key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Key {
    /// Major key (0 = C, 1 = C#, ..., 11 = B)
    Major(u32),
    /// Minor key (0 = C, 1 = C#, ..., 11 = B)
    Minor(u32),
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.index() == other.index()
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index().hash(state);
    }
}

impl Key {
    /// Build a key from a tonic pitch class and a mode
    ///
    /// The tonic is reduced modulo 12.
    pub fn new(tonic: u32, mode: Mode) -> Self {
        match mode {
            Mode::Major => Key::Major(tonic % 12),
            Mode::Minor => Key::Minor(tonic % 12),
        }
    }

    /// Tonic pitch class (0 = C, ..., 11 = B)
    pub fn tonic(&self) -> u32 {
        match self {
            Key::Major(i) | Key::Minor(i) => *i % 12,
        }
    }

    /// Mode of the key
    pub fn mode(&self) -> Mode {
        match self {
            Key::Major(_) => Mode::Major,
            Key::Minor(_) => Mode::Minor,
        }
    }

    /// Position in the fixed candidate order: major 0..11, then minor 0..11
    pub fn index(&self) -> usize {
        match self {
            Key::Major(i) => (*i % 12) as usize,
            Key::Minor(i) => 12 + (*i % 12) as usize,
        }
    }

    /// All 24 keys in candidate order
    pub fn all() -> impl Iterator<Item = Key> {
        (0..12)
            .map(Key::Major)
            .chain((0..12).map(Key::Minor))
    }

    /// Short key name (e.g., "C", "F#", "Am", "C#m")
    ///
    /// # Example
    ///
    /// ```
    /// use keyscope::analysis::result::Key;
    ///
    /// assert_eq!(Key::Major(0).name(), "C");
    /// assert_eq!(Key::Major(6).name(), "F#");
    /// assert_eq!(Key::Minor(9).name(), "Am");
    /// assert_eq!(Key::Minor(1).name(), "C#m");
    /// ```
    pub fn name(&self) -> String {
        match self {
            Key::Major(_) => SHORT_NAMES[self.tonic() as usize].to_string(),
            Key::Minor(_) => format!("{}m", SHORT_NAMES[self.tonic() as usize]),
        }
    }

    /// Full label with both enharmonic spellings (e.g., "C#/Db minor")
    ///
    /// # Example
    ///
    /// ```
    /// use keyscope::analysis::result::Key;
    ///
    /// assert_eq!(Key::Major(0).label(), "C major");
    /// assert_eq!(Key::Minor(10).label(), "A#/Bb minor");
    /// ```
    pub fn label(&self) -> String {
        format!(
            "{} {}",
            PITCH_NAMES[self.tonic() as usize],
            self.mode().as_str()
        )
    }

    /// Parse a label produced by [`Key::label`]
    ///
    /// Either enharmonic spelling is accepted on its own ("Db major",
    /// "C# major"), as is the combined form. Matching is case-insensitive
    /// for the mode word only.
    ///
    /// # Example
    ///
    /// ```
    /// use keyscope::analysis::result::Key;
    ///
    /// assert_eq!(Key::from_label("C#/Db minor"), Some(Key::Minor(1)));
    /// assert_eq!(Key::from_label("Eb major"), Some(Key::Major(3)));
    /// assert_eq!(Key::from_label("H major"), None);
    /// ```
    pub fn from_label(label: &str) -> Option<Self> {
        let mut parts = label.split_whitespace();
        let pitch = parts.next()?;
        let mode = match parts.next()?.to_ascii_lowercase().as_str() {
            "major" => Mode::Major,
            "minor" => Mode::Minor,
            _ => return None,
        };
        if parts.next().is_some() {
            return None;
        }

        let tonic = PITCH_NAMES.iter().position(|&name| {
            name == pitch || name.split('/').any(|spelling| spelling == pitch)
        })?;

        Some(Key::new(tonic as u32, mode))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.label()
    }
}

impl TryFrom<String> for Key {
    type Error = String;

    fn try_from(label: String) -> Result<Self, Self::Error> {
        Key::from_label(&label).ok_or_else(|| format!("unrecognized key label: {label:?}"))
    }
}

/// Output of one key estimation
///
/// Serializes to the response object
/// `{"key", "confidence", "alternative_key", "alternative_confidence"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyEstimate {
    /// Best-fitting key
    pub key: Key,

    /// Correlation score of the best key, in [-1.0, 1.0]
    pub confidence: f32,

    /// Second plausible key, if one scored close enough to the best
    pub alternative_key: Option<Key>,

    /// Correlation score of the alternate key
    pub alternative_confidence: Option<f32>,

    /// All 24 candidate scores in candidate order (major 0..11, minor 0..11)
    #[serde(skip)]
    pub scores: Vec<(Key, f32)>,
}

impl KeyEstimate {
    /// Score of a specific candidate key
    pub fn score_of(&self, key: Key) -> Option<f32> {
        self.scores
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, s)| *s)
    }

    /// True when a second key is close enough to be plausible
    pub fn has_alternative(&self) -> bool {
        self.alternative_key.is_some()
    }
}
