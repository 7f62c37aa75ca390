//! Ties everything together.
//! Generates compositions from sequences, keeps track of the current one and plays them.

use std::time::Duration;

use anyhow::{bail, Context};

use crate::{
    audio::{PlayStatus, Player},
    composition::{file_name, Composition, CompositionUpdate, Store, StoreError, Summary},
    misc::{other::closest, Tagged},
    music::{RhythmPattern, ScaleKind},
    sequence::SequenceKind,
};

/// Length of a note in milliseconds when playing with [`PlayMode::TempoOnly`].
const TEMPO_NOTE_LENGTH: u64 = 500;
const TEMPO_VOLUME: f64 = 1.0;

/// How to time the notes of a composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayMode {
    /// Note lengths come from the composition's rhythm pattern.
    #[default]
    Rhythm,
    /// Same length notes, spaced as sixteenth notes at the composition's tempo.
    TempoOnly,
}

/// Everything needed to generate a composition.
#[derive(Debug, Clone)]
pub struct Params {
    pub kind: SequenceKind,
    /// Number of terms of the sequence to use
    pub count: usize,
    pub tempo: u32,
    pub scale: ScaleKind,
    pub rhythm: RhythmPattern,
    /// Overrides the generated name
    pub name: Option<String>,
    pub save: bool,
}

impl Params {
    /// Params with the default length, tempo, scale and rhythm for a sequence.
    pub fn new(kind: SequenceKind) -> Self {
        Self {
            kind,
            count: default_count(kind),
            tempo: 120,
            scale: ScaleKind::default(),
            rhythm: RhythmPattern::default(),
            name: None,
            save: true,
        }
    }

    /// The composition name, like `Fibonacci_10_Notes`.
    pub fn name(&self) -> String {
        if let Some(name) = &self.name {
            return name.to_owned();
        }

        let n = self.count;
        match self.kind {
            SequenceKind::Fibonacci => format!("Fibonacci_{n}_Notes"),
            SequenceKind::Primes => format!("Primes_{n}_Numbers"),
            SequenceKind::Pi => format!("Pi_{n}_Digits"),
        }
    }
}

/// How many terms are used if the user doesn't say.
fn default_count(kind: SequenceKind) -> usize {
    match kind {
        SequenceKind::Pi => 20,
        _ => 10,
    }
}

pub struct MelodyGenerator {
    player: Player,
    store: Store,
    current: Option<Composition>,
}

impl MelodyGenerator {
    pub fn new(player: Player, store: Store) -> Self {
        Self {
            player,
            store,
            current: None,
        }
    }

    /// Generates a composition, saves it if asked to and makes it the current one.
    pub fn generate(&mut self, params: &Params) -> anyhow::Result<Composition> {
        println!(
            "[*] Generating {} melody with {} numbers...",
            params.kind.tag(),
            params.count
        );

        let sequence = params.kind.generate(params.count);
        println!("[D] Sequence: {sequence:?}");

        let notes = params.scale.map_notes(&sequence);
        println!("[*] Generated {} musical notes", notes.len());

        let mut composition = Composition::new(
            params.name(),
            params.kind,
            notes,
            params.tempo,
            params.scale,
            params.rhythm,
        );

        if params.save {
            composition = self
                .store
                .create(composition)
                .context("Failed to save composition")?;
        }

        self.current = Some(composition.clone());
        Ok(composition)
    }

    /// Plays a composition, or the current one if None is given.
    pub fn play(
        &self,
        composition: Option<&Composition>,
        mode: PlayMode,
    ) -> anyhow::Result<PlayStatus> {
        let Some(composition) = composition.or(self.current.as_ref()) else {
            bail!("No composition to play. Generate or load one first.");
        };

        println!("[*] Playing composition: {}", composition.name);
        println!("[I] Sequence type: {}", composition.sequence_type.tag());
        println!("[I] Tempo: {} BPM", composition.tempo);
        println!("[I] Scale: {}", composition.scale_type.tag());
        println!("[I] Rhythm: {}", composition.rhythm_pattern.tag());

        match mode {
            PlayMode::Rhythm => self.player.play(
                &composition.notes,
                composition.tempo,
                composition.rhythm_pattern,
            ),
            PlayMode::TempoOnly => self.player.play_tempo_only(
                &composition.notes,
                composition.tempo,
                TEMPO_NOTE_LENGTH,
                TEMPO_VOLUME,
            ),
        }
    }

    pub fn stop(&self) {
        self.player.stop();
    }

    /// Blocks until nothing is playing.
    pub fn wait(&self) {
        self.player.wait();
    }

    /// Blocks until nothing is playing or the timeout runs out.
    /// Returns true if playback ended in time.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        self.player.wait_timeout(timeout)
    }

    pub fn list_saved(&self) -> anyhow::Result<Vec<Summary>> {
        Ok(self.store.list()?)
    }

    /// Loads a saved composition and makes it the current one.
    pub fn load(&mut self, name: &str) -> anyhow::Result<Composition> {
        let composition = match self.store.load(name) {
            Ok(i) => i,
            Err(e) => {
                if matches!(e, StoreError::NotFound { .. }) {
                    self.suggest(name);
                }
                return Err(e.into());
            }
        };

        self.current = Some(composition.clone());
        Ok(composition)
    }

    /// Deletes a saved composition.
    /// The current composition is kept in memory even if it was the one deleted.
    pub fn delete(&mut self, name: &str) -> anyhow::Result<()> {
        if let Err(e) = self.store.delete(name) {
            if matches!(e, StoreError::NotFound { .. }) {
                self.suggest(name);
            }
            return Err(e.into());
        }

        Ok(())
    }

    /// Changes a saved composition and saves it again.
    /// A new scale remaps the notes from the composition's sequence, renaming moves the saved file.
    pub fn update(&mut self, name: &str, mut changes: CompositionUpdate) -> anyhow::Result<Composition> {
        let mut composition = self.load(name)?;
        let old_file = file_name(name);

        // Hand written files can hold a name that doesn't match the file, keep it where it was found
        if changes.name.is_none() && composition.file_name() != old_file {
            composition.name = name.to_owned();
        }

        let target = changes.name.as_deref().unwrap_or(composition.name.as_str());
        if file_name(target) != old_file && self.store.contains(target) {
            bail!("A composition named '{target}' already exists");
        }

        if let Some(scale) = changes.scale_type {
            if changes.notes.is_none() && scale != composition.scale_type {
                let sequence = composition.sequence_type.generate(composition.notes.len());
                changes.notes = Some(scale.map_notes(&sequence));
            }
        }

        composition.update(changes);
        self.store
            .save(&mut composition)
            .context("Failed to save composition")?;

        if composition.file_name() != old_file {
            self.store.delete(name)?;
        }

        self.current = Some(composition.clone());
        Ok(composition)
    }

    /// Describes a composition, or the current one if None is given.
    pub fn info(&self, composition: Option<&Composition>) -> Option<String> {
        composition.or(self.current.as_ref()).map(Composition::info)
    }

    /// Prints the closest saved name to one that wasn't found.
    fn suggest(&self, name: &str) {
        let Ok(saved) = self.store.list() else {
            return;
        };

        let names = saved.into_iter().map(|x| x.name).collect::<Vec<_>>();
        if let Some(closest) = closest(name, &names) {
            println!("[I] Did you mean `{closest}`?");
        }
    }
}
