//! Tone devices, the things that actually make a sound.
//! A device plays a single tone and blocks until it is done.

use std::{ops::RangeInclusive, thread, time::Duration};

use anyhow::Context;
use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    Device, SupportedStreamConfig,
};
use parking_lot::Mutex;

use super::tone::Tone;
use crate::misc::Similarity;

/// Frequencies a tone device can play, in Hz.
pub const DEVICE_RANGE: RangeInclusive<u32> = 37..=32767;

/// Something that can play a tone.
/// `emit` must block for roughly `duration` and can't be interrupted once started.
pub trait ToneDevice: Send + Sync {
    fn emit(&self, frequency: u32, duration: Duration) -> anyhow::Result<()>;
}

/// Converts a note frequency into one the device can play.
/// The fractional part is dropped and the result is clamped to [`DEVICE_RANGE`].
pub fn device_frequency(frequency: f64) -> u32 {
    (frequency as u32).clamp(*DEVICE_RANGE.start(), *DEVICE_RANGE.end())
}

/// Plays tones through a cpal output device.
/// A new stream is opened for each tone and closed when it is done.
pub struct CpalTone {
    device: Mutex<Device>,
    config: SupportedStreamConfig,
}

impl CpalTone {
    /// Opens an output device.
    /// `wanted` is either `default` or a name, in which case the device whose name is most similar is used.
    pub fn open(wanted: &str) -> anyhow::Result<Self> {
        let host = cpal::default_host();
        let wanted = wanted.to_lowercase();

        let device = match wanted.as_str() {
            "default" => host
                .default_output_device()
                .context("No default output device")?,
            _ => {
                host.output_devices()?
                    .filter_map(|x| Some((x.name().ok()?.to_lowercase().similarity(&wanted), x)))
                    .reduce(|a, b| if a.0 > b.0 { a } else { b })
                    .context("No output device found")?
                    .1
            }
        };

        let config = device
            .default_output_config()
            .context("No default output config")?;

        println!(
            "[*] Output hooked into `{}` ({})",
            device.name().unwrap_or_else(|_| "unknown".to_owned()),
            config.sample_rate().0
        );

        Ok(Self {
            device: Mutex::new(device),
            config,
        })
    }
}

impl ToneDevice for CpalTone {
    fn emit(&self, frequency: u32, duration: Duration) -> anyhow::Result<()> {
        let device = self.device.lock();
        let channels = self.config.channels() as usize;
        let mut tone = Tone::new(frequency as f32, self.config.sample_rate().0);

        let stream = device.build_output_stream(
            &self.config.config(),
            move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                // Same sample on every channel
                for frame in data.chunks_mut(channels) {
                    frame.fill(tone.next().unwrap_or(0.0));
                }
            },
            |err| eprintln!("[-] Output stream error: {err}"),
            None,
        )?;

        stream.play()?;
        thread::sleep(duration);
        Ok(())
    }
}

/// A device that makes no sound, it just waits out each tone.
#[derive(Debug, Default)]
pub struct SilentTone;

impl ToneDevice for SilentTone {
    fn emit(&self, _frequency: u32, duration: Duration) -> anyhow::Result<()> {
        thread::sleep(duration);
        Ok(())
    }
}
