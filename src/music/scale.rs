//! Maps number sequences onto the frequencies of a scale.

use clap::ValueEnum;

use crate::misc::Tagged;

/// Lowest frequency a mapped note can have, in Hz.
pub const MIN_FREQUENCY: f64 = 20.0;
/// Highest frequency a mapped note can have, in Hz.
pub const MAX_FREQUENCY: f64 = 20_000.0;

/// Octaves above this are clamped.
/// Every base note is at least middle C so by octave 7 everything is above [`MAX_FREQUENCY`] anyway.
const MAX_OCTAVE: u64 = 7;

// One octave of each scale, starting at middle C.
const MAJOR: &[f64] = &[261.63, 293.66, 329.63, 349.23, 392.00, 440.00, 493.88, 523.25];
const MINOR: &[f64] = &[261.63, 293.66, 311.13, 349.23, 392.00, 415.30, 466.16, 523.25];
const PENTATONIC: &[f64] = &[261.63, 293.66, 329.63, 392.00, 440.00, 523.25];

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScaleKind {
    /// Bright and happy
    #[default]
    Major,
    /// Sad and melancholic
    Minor,
    /// Simple and folk-like
    Pentatonic,
}

impl ScaleKind {
    /// The base frequencies of one octave of the scale.
    pub fn base_frequencies(&self) -> &'static [f64] {
        match self {
            Self::Major => MAJOR,
            Self::Minor => MINOR,
            Self::Pentatonic => PENTATONIC,
        }
    }

    /// Maps a single number to a frequency.
    /// The number picks a note of the scale with `x % len` and an octave with `x / len`.
    /// The result is clamped to [`MIN_FREQUENCY`]..=[`MAX_FREQUENCY`].
    pub fn frequency(&self, x: u64) -> f64 {
        let base = self.base_frequencies();
        let len = base.len() as u64;

        let octave = (x / len).min(MAX_OCTAVE);
        let freq = base[(x % len) as usize] * 2_f64.powi(octave as i32);
        freq.clamp(MIN_FREQUENCY, MAX_FREQUENCY)
    }

    /// Maps every number in a sequence to a frequency.
    /// The output always has the same length and order as the input.
    pub fn map_notes(&self, sequence: &[u64]) -> Vec<f64> {
        sequence.iter().map(|&x| self.frequency(x)).collect()
    }
}

impl Tagged for ScaleKind {
    fn tag(&self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Pentatonic => "pentatonic",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag.to_ascii_lowercase().as_str() {
            "major" => Self::Major,
            "minor" => Self::Minor,
            "pentatonic" => Self::Pentatonic,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod test {
    use clap::ValueEnum;

    use super::{ScaleKind, MAJOR, MAX_FREQUENCY, MIN_FREQUENCY};
    use crate::{misc::Tagged, sequence};

    #[test]
    fn test_map_fibonacci_major() {
        let notes = ScaleKind::Major.map_notes(&sequence::fibonacci(8));
        let expected = [
            MAJOR[0],
            MAJOR[1],
            MAJOR[1],
            MAJOR[2],
            MAJOR[3],
            MAJOR[5],
            MAJOR[0] * 2.0,
            MAJOR[5] * 2.0,
        ];

        assert_eq!(notes, expected);
    }

    #[test]
    fn test_map_pentatonic_wraps() {
        let notes = ScaleKind::Pentatonic.map_notes(&[5, 6, 13]);
        assert_eq!(notes, [523.25, 261.63 * 2.0, 293.66 * 4.0]);
    }

    #[test]
    fn test_map_is_deterministic() {
        let seq = sequence::primes(50);
        for scale in ScaleKind::value_variants().iter().copied() {
            let a = scale.map_notes(&seq);
            let b = scale.map_notes(&seq);
            assert_eq!(a, b);
            assert_eq!(a.len(), seq.len());
        }
    }

    #[test]
    fn test_map_range() {
        let seq = sequence::fibonacci(150);
        for scale in ScaleKind::value_variants().iter().copied() {
            let notes = scale.map_notes(&seq);
            assert!(notes
                .iter()
                .all(|x| (MIN_FREQUENCY..=MAX_FREQUENCY).contains(x)));
        }

        assert_eq!(ScaleKind::Minor.frequency(u64::MAX), MAX_FREQUENCY);
        assert_eq!(ScaleKind::Major.map_notes(&[]), Vec::<f64>::new());
    }

    #[test]
    fn test_scale_tags() {
        assert_eq!(ScaleKind::from_tag_or_default("MINOR"), ScaleKind::Minor);
        assert_eq!(ScaleKind::from_tag_or_default("lydian"), ScaleKind::Major);
        assert_eq!(ScaleKind::Pentatonic.tag(), "pentatonic");
    }
}
