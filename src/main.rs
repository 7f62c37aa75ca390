use std::{process, sync::Arc};

use anyhow::Context;

use args::{Action, Settings};
use audio::{device::device_frequency, CpalTone, PlayStatus, Player, SilentTone, ToneDevice};
use composition::Store;
use generator::MelodyGenerator;
use symphony::Symphony;

mod args;
mod audio;
mod composition;
mod generator;
mod misc;
mod music;
mod sequence;
mod symphony;

fn main() {
    if let Err(e) = run() {
        eprintln!("[-] Error: {e:#}");
        process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let matches = args::command().get_matches();
    let settings = Settings::from_matches(&matches);
    let action = Action::from_matches(&matches)?;

    let device: Arc<dyn ToneDevice> = match settings.mute || !action.needs_audio() {
        true => Arc::new(SilentTone),
        false => Arc::new(CpalTone::open(&settings.output_device)?),
    };

    let store = Store::open(&settings.dir).context("Failed to open composition directory")?;
    let mut generator = MelodyGenerator::new(Player::new(device.clone()), store);

    match action {
        Action::Generate { params, play, mode } => {
            let composition = generator.generate(&params)?;
            println!("[*] Composition '{}' created.", composition.name);

            if play && generator.play(None, mode)? == PlayStatus::Started {
                generator.wait();
            }
        }
        Action::Play { name, mode, limit } => {
            let composition = generator.load(&name)?;
            if generator.play(Some(&composition), mode)? != PlayStatus::Started {
                return Ok(());
            }

            match limit {
                Some(limit) if !generator.wait_timeout(limit) => generator.stop(),
                _ => generator.wait(),
            }
        }
        Action::List => {
            let saved = generator.list_saved()?;
            if saved.is_empty() {
                println!("[*] No saved compositions found in {}", settings.dir.display());
            }

            for (i, summary) in saved.iter().enumerate() {
                println!("{}. {summary}\n", i + 1);
            }
        }
        Action::Info { name } => {
            let composition = generator.load(&name)?;
            if let Some(info) = generator.info(Some(&composition)) {
                println!("{info}");
            }
        }
        Action::Delete { name } => generator.delete(&name)?,
        Action::Update { name, changes } => {
            let composition = generator.update(&name, changes)?;
            println!("{}", composition.info());
        }
        Action::Symphony { play, pause } => {
            let symphony = Symphony::compose(&mut generator)?;
            println!("{}", symphony.summary());

            if play {
                symphony.perform(&generator, pause)?;
            }
        }
        Action::Beep {
            frequency,
            duration,
        } => {
            let frequency = device_frequency(frequency);
            println!("[*] Playing {frequency}Hz for {}ms", duration.as_millis());
            device.emit(frequency, duration)?;
        }
    }

    Ok(())
}
