//! Audio utilities.
//! Tone generation, output devices and melody playback.

pub mod device;
pub mod player;
pub mod tone;

pub use device::{CpalTone, SilentTone, ToneDevice};
pub use player::{PlayStatus, Player};
