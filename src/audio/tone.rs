use std::f32::consts::PI;

/// Peak amplitude of generated tones.
/// Full scale sine waves are unpleasantly loud on most systems.
const AMPLITUDE: f32 = 0.3;

/// A never ending sine wave at a fixed frequency.
#[derive(Clone, Copy, Debug)]
pub struct Tone {
    i: usize,
    frequency: f32,
    sample_rate: f32,
}

impl Tone {
    pub fn new(frequency: f32, sample_rate: u32) -> Self {
        Self {
            i: 0,
            frequency,
            sample_rate: sample_rate as f32,
        }
    }
}

impl Iterator for Tone {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        self.i += 1;
        let phase = self.i as f32 * self.frequency / self.sample_rate;
        Some((phase.fract() * 2.0 * PI).sin() * AMPLITUDE)
    }
}
