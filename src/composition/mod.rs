//! Compositions, a named melody and the settings used to make it.

use std::{
    fmt::{self, Display, Write},
    time::Duration,
};

use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{
    audio::player::NOTE_GAP,
    misc::Tagged,
    music::{RhythmPattern, ScaleKind},
    sequence::SequenceKind,
};

pub mod store;

pub use store::{Store, StoreError};

pub const DEFAULT_NAME: &str = "Untitled";
pub const DEFAULT_TEMPO: u32 = 120;

/// How many notes [`Composition::info`] lists before summarizing the rest.
const INFO_NOTES: usize = 10;

/// A generated melody.
/// This is also the format compositions are saved in, any field missing from a saved file gets its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    #[serde(default = "default_name", deserialize_with = "deserialize_name")]
    pub name: String,
    #[serde(default, with = "crate::misc::tagged")]
    pub sequence_type: SequenceKind,
    /// Note frequencies in Hz
    #[serde(default, deserialize_with = "deserialize_notes")]
    pub notes: Vec<f64>,
    /// Beats per minute, never zero
    #[serde(default = "default_tempo", deserialize_with = "deserialize_tempo")]
    pub tempo: u32,
    #[serde(default, with = "crate::misc::tagged")]
    pub scale_type: ScaleKind,
    #[serde(default, with = "crate::misc::tagged")]
    pub rhythm_pattern: RhythmPattern,
    #[serde(default = "now", deserialize_with = "deserialize_date")]
    pub created_date: NaiveDateTime,
    #[serde(default = "now", deserialize_with = "deserialize_date")]
    pub modified_date: NaiveDateTime,
}

/// Changes to apply with [`Composition::update`].
/// Fields left as None are not touched.
#[derive(Debug, Clone, Default)]
pub struct CompositionUpdate {
    pub name: Option<String>,
    pub sequence_type: Option<SequenceKind>,
    pub notes: Option<Vec<f64>>,
    pub tempo: Option<u32>,
    pub scale_type: Option<ScaleKind>,
    pub rhythm_pattern: Option<RhythmPattern>,
}

impl Composition {
    pub fn new(
        name: impl Into<String>,
        sequence_type: SequenceKind,
        notes: Vec<f64>,
        tempo: u32,
        scale_type: ScaleKind,
        rhythm_pattern: RhythmPattern,
    ) -> Self {
        let now = now();
        Self {
            name: name.into(),
            sequence_type,
            notes,
            tempo: valid_tempo(tempo),
            scale_type,
            rhythm_pattern,
            created_date: now,
            modified_date: now,
        }
    }

    /// Applies the changes and refreshes the modified date.
    pub fn update(&mut self, update: CompositionUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(sequence_type) = update.sequence_type {
            self.sequence_type = sequence_type;
        }
        if let Some(notes) = update.notes {
            self.notes = notes;
        }
        if let Some(tempo) = update.tempo {
            self.tempo = valid_tempo(tempo);
        }
        if let Some(scale_type) = update.scale_type {
            self.scale_type = scale_type;
        }
        if let Some(rhythm_pattern) = update.rhythm_pattern {
            self.rhythm_pattern = rhythm_pattern;
        }

        self.touch();
    }

    /// Sets the modified date to now.
    pub fn touch(&mut self) {
        self.modified_date = now();
    }

    /// The name of the file this composition is saved as.
    pub fn file_name(&self) -> String {
        file_name(&self.name)
    }

    /// Note lengths when played with this composition's rhythm pattern, in milliseconds.
    pub fn rhythm(&self) -> Vec<u64> {
        self.rhythm_pattern.plan(self.notes.len())
    }

    /// How long the composition takes to play with its rhythm pattern.
    pub fn estimated_duration(&self) -> Duration {
        let notes = self.rhythm().into_iter().sum::<u64>();
        let gaps = NOTE_GAP.as_millis() as u64 * self.notes.len().saturating_sub(1) as u64;
        Duration::from_millis(notes + gaps)
    }

    /// A human readable description, including the first few notes.
    pub fn info(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Name: {}", self.name);
        let _ = writeln!(out, "Sequence Type: {}", self.sequence_type.tag());
        let _ = writeln!(out, "Number of Notes: {}", self.notes.len());
        let _ = writeln!(out, "Tempo: {} BPM", self.tempo);
        let _ = writeln!(out, "Scale: {}", self.scale_type.tag());
        let _ = writeln!(out, "Rhythm Pattern: {}", self.rhythm_pattern.tag());
        let _ = writeln!(out, "Created: {}", self.created_date.format("%Y-%m-%d %H:%M:%S"));
        let _ = writeln!(out, "Modified: {}", self.modified_date.format("%Y-%m-%d %H:%M:%S"));

        if !self.notes.is_empty() {
            let _ = writeln!(out, "\nFirst {INFO_NOTES} notes (frequencies in Hz):");
            for (i, note) in self.notes.iter().take(INFO_NOTES).enumerate() {
                let _ = writeln!(out, "  Note {}: {note:.2} Hz", i + 1);
            }

            if self.notes.len() > INFO_NOTES {
                let _ = writeln!(out, "  ... and {} more notes", self.notes.len() - INFO_NOTES);
            }
        }

        out
    }

    pub fn summary(&self) -> Summary {
        Summary {
            name: self.name.clone(),
            sequence_type: self.sequence_type,
            tempo: self.tempo,
            scale_type: self.scale_type,
            rhythm_pattern: self.rhythm_pattern,
            note_count: self.notes.len(),
            created_date: self.created_date,
        }
    }
}

/// The short form of a saved composition, used when listing them.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub name: String,
    pub sequence_type: SequenceKind,
    pub tempo: u32,
    pub scale_type: ScaleKind,
    pub rhythm_pattern: RhythmPattern,
    pub note_count: usize,
    pub created_date: NaiveDateTime,
}

impl Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "   Type: {}", self.sequence_type.tag())?;
        writeln!(f, "   Tempo: {} BPM", self.tempo)?;
        writeln!(f, "   Scale: {}", self.scale_type.tag())?;
        writeln!(f, "   Rhythm: {}", self.rhythm_pattern.tag())?;
        writeln!(f, "   Notes: {}", self.note_count)?;
        write!(f, "   Created: {}", self.created_date.format("%Y-%m-%d"))
    }
}

/// Gets the file name for a composition name, spaces become underscores.
pub fn file_name(name: &str) -> String {
    format!("{}.json", name.replace(' ', "_"))
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn default_name() -> String {
    DEFAULT_NAME.to_owned()
}

fn default_tempo() -> u32 {
    DEFAULT_TEMPO
}

fn valid_tempo(tempo: u32) -> u32 {
    if tempo == 0 {
        return DEFAULT_TEMPO;
    }

    tempo
}

// Saved files may have been written by hand or by older versions.
// These read whatever is there and swap anything unusable for the default instead of failing the load.

fn deserialize_name<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(de)? {
        Value::String(name) => name,
        _ => default_name(),
    })
}

/// Non numeric notes are dropped.
fn deserialize_notes<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<f64>, D::Error> {
    Ok(match Value::deserialize(de)? {
        Value::Array(notes) => notes.iter().filter_map(Value::as_f64).collect(),
        _ => Vec::new(),
    })
}

fn deserialize_tempo<'de, D: Deserializer<'de>>(de: D) -> Result<u32, D::Error> {
    let tempo = Value::deserialize(de)?
        .as_u64()
        .and_then(|x| u32::try_from(x).ok())
        .unwrap_or(DEFAULT_TEMPO);
    Ok(valid_tempo(tempo))
}

/// Reads ISO-8601 dates with or without a UTC offset.
fn deserialize_date<'de, D: Deserializer<'de>>(de: D) -> Result<NaiveDateTime, D::Error> {
    let date = Value::deserialize(de)?.as_str().and_then(|x| {
        x.parse::<NaiveDateTime>().ok().or_else(|| {
            DateTime::parse_from_rfc3339(x)
                .ok()
                .map(|x| x.with_timezone(&Local).naive_local())
        })
    });
    Ok(date.unwrap_or_else(now))
}
