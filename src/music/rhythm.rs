//! Rhythm patterns.
//! A pattern gives every position in a melody a note length in milliseconds.

use clap::ValueEnum;

use crate::misc::Tagged;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RhythmPattern {
    /// Every note is the same length
    #[default]
    Simple,
    /// 3/4 time, a long strong beat followed by two weak ones
    Waltz,
    /// 4/4 time, strong / weak / medium / weak
    March,
}

impl RhythmPattern {
    /// Length of the note at `index` in milliseconds.
    pub fn duration(&self, index: usize) -> u64 {
        match self {
            Self::Simple => 500,
            Self::Waltz if index % 3 == 0 => 800,
            Self::Waltz => 400,
            Self::March if index % 4 == 0 => 600,
            Self::March if index % 2 == 0 => 400,
            Self::March => 200,
        }
    }

    /// Makes a plan of exactly `count` note lengths in milliseconds.
    pub fn plan(&self, count: usize) -> Vec<u64> {
        (0..count).map(|i| self.duration(i)).collect()
    }
}

impl Tagged for RhythmPattern {
    fn tag(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Waltz => "waltz",
            Self::March => "march",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag.to_ascii_lowercase().as_str() {
            "simple" => Self::Simple,
            "waltz" => Self::Waltz,
            "march" => Self::March,
            _ => return None,
        })
    }
}
