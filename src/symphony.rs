//! A five movement symphony built from all three sequences.

use std::{fmt::Write, thread, time::Duration};

use crate::{
    composition::Composition,
    generator::{MelodyGenerator, Params, PlayMode},
    misc::Tagged,
    music::{RhythmPattern, ScaleKind},
    sequence::SequenceKind,
};

pub const DEFAULT_PAUSE: Duration = Duration::from_secs(2);

struct Movement {
    title: &'static str,
    /// Name prefix, the count and a unit get added after it
    prefix: &'static str,
    unit: &'static str,
    kind: SequenceKind,
    count: usize,
    tempo: u32,
    scale: ScaleKind,
    rhythm: RhythmPattern,
}

const MOVEMENTS: [Movement; 5] = [
    Movement {
        title: "Fibonacci Theme",
        prefix: "Fibonacci_Theme",
        unit: "Notes",
        kind: SequenceKind::Fibonacci,
        count: 12,
        tempo: 120,
        scale: ScaleKind::Major,
        rhythm: RhythmPattern::Waltz,
    },
    Movement {
        title: "Prime Counterpoint",
        prefix: "Prime_Counterpoint",
        unit: "Numbers",
        kind: SequenceKind::Primes,
        count: 15,
        tempo: 90,
        scale: ScaleKind::Minor,
        rhythm: RhythmPattern::March,
    },
    Movement {
        title: "Pi Bridge",
        prefix: "Pi_Bridge",
        unit: "Digits",
        kind: SequenceKind::Pi,
        count: 20,
        tempo: 150,
        scale: ScaleKind::Pentatonic,
        rhythm: RhythmPattern::Simple,
    },
    Movement {
        title: "Fibonacci Variation",
        prefix: "Fibonacci_Variation",
        unit: "Notes",
        kind: SequenceKind::Fibonacci,
        count: 8,
        tempo: 180,
        scale: ScaleKind::Major,
        rhythm: RhythmPattern::March,
    },
    Movement {
        title: "Prime Finale",
        prefix: "Prime_Finale",
        unit: "Numbers",
        kind: SequenceKind::Primes,
        count: 10,
        tempo: 60,
        scale: ScaleKind::Minor,
        rhythm: RhythmPattern::Waltz,
    },
];

impl Movement {
    fn params(&self) -> Params {
        Params {
            kind: self.kind,
            count: self.count,
            tempo: self.tempo,
            scale: self.scale,
            rhythm: self.rhythm,
            name: Some(format!("{}_{}_{}", self.prefix, self.count, self.unit)),
            save: true,
        }
    }
}

pub struct Symphony {
    movements: Vec<(&'static str, Composition)>,
}

impl Symphony {
    /// Generates and saves every movement.
    pub fn compose(generator: &mut MelodyGenerator) -> anyhow::Result<Self> {
        let mut movements = Vec::with_capacity(MOVEMENTS.len());
        for movement in MOVEMENTS.iter() {
            println!("[*] Creating {}...", movement.title);
            let composition = generator.generate(&movement.params())?;
            movements.push((movement.title, composition));
        }

        Ok(Self { movements })
    }

    pub fn movements(&self) -> impl Iterator<Item = &Composition> {
        self.movements.iter().map(|x| &x.1)
    }

    pub fn total_notes(&self) -> usize {
        self.movements().map(|x| x.notes.len()).sum()
    }

    pub fn estimated_duration(&self) -> Duration {
        self.movements().map(Composition::estimated_duration).sum()
    }

    /// A breakdown of every movement.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Total Movements: {}", self.movements.len());
        let _ = writeln!(out, "Total Notes: {}", self.total_notes());
        let _ = writeln!(
            out,
            "Estimated Duration: {:.1} seconds",
            self.estimated_duration().as_secs_f32()
        );

        for (i, (title, comp)) in self.movements.iter().enumerate() {
            let _ = writeln!(out, "\n{}. {title} ({})", i + 1, comp.name);
            let _ = writeln!(out, "   Sequence: {}", comp.sequence_type.tag());
            let _ = writeln!(
                out,
                "   Character: {} scale, {} rhythm",
                comp.scale_type.tag(),
                comp.rhythm_pattern.tag()
            );
            let _ = writeln!(out, "   Tempo: {} BPM", comp.tempo);
            let _ = writeln!(out, "   Notes: {}", comp.notes.len());
        }

        out
    }

    /// Plays every movement in order, waiting for each to finish and pausing between them.
    pub fn perform(&self, generator: &MelodyGenerator, pause: Duration) -> anyhow::Result<()> {
        for (i, (title, comp)) in self.movements.iter().enumerate() {
            // Anything already playing has to finish first or the movement would be skipped as busy
            generator.wait();

            println!("[*] Movement {}: {title}", i + 1);
            generator.play(Some(comp), PlayMode::Rhythm)?;
            generator.wait();

            if i + 1 < self.movements.len() {
                thread::sleep(pause);
            }
        }

        println!("[*] Symphony complete!");
        Ok(())
    }
}
