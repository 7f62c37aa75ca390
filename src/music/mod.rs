//! Turning numbers into music.
//! Scales map numbers to pitches and rhythm patterns give each note a length.

pub mod rhythm;
pub mod scale;

pub use rhythm::RhythmPattern;
pub use scale::ScaleKind;
