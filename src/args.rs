use std::{path::PathBuf, time::Duration};

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};

use crate::{
    composition::CompositionUpdate,
    generator::{Params, PlayMode},
    music::{RhythmPattern, ScaleKind},
    sequence::SequenceKind,
    symphony::DEFAULT_PAUSE,
};

/// Options that apply to every subcommand.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Where compositions are saved
    pub dir: PathBuf,
    /// Use a tone device that makes no sound
    pub mute: bool,
    /// Name of the output device, or `default`
    pub output_device: String,
}

/// What the user asked to do.
#[derive(Debug, Clone)]
pub enum Action {
    Generate {
        params: Params,
        play: bool,
        mode: PlayMode,
    },
    Play {
        name: String,
        mode: PlayMode,
        limit: Option<Duration>,
    },
    List,
    Info {
        name: String,
    },
    Delete {
        name: String,
    },
    Update {
        name: String,
        changes: CompositionUpdate,
    },
    Symphony {
        play: bool,
        pause: Duration,
    },
    Beep {
        frequency: f64,
        duration: Duration,
    },
}

pub fn command() -> Command {
    let name = || {
        Arg::new("name")
            .required(true)
            .help("Name of a saved composition")
    };
    let tempo_only = || {
        Arg::new("tempo-only")
            .long("tempo-only")
            .action(ArgAction::SetTrue)
            .help("Ignore the rhythm pattern and play evenly spaced notes at the tempo")
    };

    Command::new("math-melody")
        .about("Turns Fibonacci numbers, primes and the digits of pi into melodies.")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .args([
            Arg::new("dir")
                .long("dir")
                .global(true)
                .default_value("compositions")
                .value_parser(value_parser!(PathBuf))
                .help("Directory compositions are saved in"),
            Arg::new("mute")
                .long("mute")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Don't make any sound, just wait out each note"),
            Arg::new("output-device")
                .short('o')
                .long("output-device")
                .global(true)
                .default_value("default")
                .help("Output device to use, picked by the most similar name"),
        ])
        .subcommands([
            Command::new("generate")
                .alias("g")
                .about("Generate a melody from a sequence.")
                .args([
                    Arg::new("sequence")
                        .required(true)
                        .value_parser(value_parser!(SequenceKind)),
                    Arg::new("count")
                        .short('n')
                        .long("count")
                        .value_parser(value_parser!(usize))
                        .help("Number of terms to use [default: 10, 20 for pi]"),
                    Arg::new("tempo")
                        .short('t')
                        .long("tempo")
                        .default_value("120")
                        .value_parser(value_parser!(u32).range(1..)),
                    Arg::new("scale")
                        .short('s')
                        .long("scale")
                        .default_value("major")
                        .value_parser(value_parser!(ScaleKind)),
                    Arg::new("rhythm")
                        .short('r')
                        .long("rhythm")
                        .default_value("simple")
                        .value_parser(value_parser!(RhythmPattern)),
                    Arg::new("no-save")
                        .long("no-save")
                        .action(ArgAction::SetTrue)
                        .help("Don't save the composition"),
                    Arg::new("play")
                        .short('p')
                        .long("play")
                        .action(ArgAction::SetTrue)
                        .help("Play the melody once it is generated"),
                    tempo_only(),
                ]),
            Command::new("play")
                .alias("p")
                .about("Play a saved composition.")
                .args([
                    name(),
                    tempo_only(),
                    Arg::new("for")
                        .long("for")
                        .value_parser(value_parser!(u64))
                        .help("Stop playing after this many milliseconds"),
                ]),
            Command::new("list")
                .alias("ls")
                .about("List saved compositions."),
            Command::new("info")
                .alias("i")
                .about("Show information about a saved composition.")
                .arg(name()),
            Command::new("delete")
                .alias("rm")
                .about("Delete a saved composition.")
                .arg(name()),
            Command::new("update")
                .alias("u")
                .about("Change the tempo, scale, rhythm or name of a saved composition.")
                .args([
                    name(),
                    Arg::new("tempo")
                        .short('t')
                        .long("tempo")
                        .value_parser(value_parser!(u32).range(1..)),
                    Arg::new("scale")
                        .short('s')
                        .long("scale")
                        .value_parser(value_parser!(ScaleKind))
                        .help("New scale, the notes are remapped from the sequence"),
                    Arg::new("rhythm")
                        .short('r')
                        .long("rhythm")
                        .value_parser(value_parser!(RhythmPattern)),
                    Arg::new("rename")
                        .long("rename")
                        .help("New name for the composition"),
                ]),
            Command::new("symphony")
                .about("Create and perform a five movement symphony from all the sequences.")
                .args([
                    Arg::new("no-play")
                        .long("no-play")
                        .action(ArgAction::SetTrue)
                        .help("Only create and save the movements"),
                    Arg::new("pause")
                        .long("pause")
                        .value_parser(value_parser!(u64))
                        .help("Milliseconds of silence between movements [default: 2000]"),
                ]),
            Command::new("beep")
                .about("Play a single tone to check that audio works.")
                .args([
                    Arg::new("frequency")
                        .short('f')
                        .long("frequency")
                        .default_value("440")
                        .value_parser(value_parser!(f64)),
                    Arg::new("duration")
                        .short('d')
                        .long("duration")
                        .default_value("500")
                        .value_parser(value_parser!(u64))
                        .help("Length of the tone in milliseconds"),
                ]),
        ])
}

impl Settings {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            dir: m
                .get_one::<PathBuf>("dir")
                .cloned()
                .unwrap_or_else(|| PathBuf::from("compositions")),
            mute: m.get_flag("mute"),
            output_device: m
                .get_one::<String>("output-device")
                .cloned()
                .unwrap_or_else(|| "default".to_owned()),
        }
    }
}

impl Action {
    pub fn from_matches(m: &ArgMatches) -> anyhow::Result<Self> {
        let mode = |m: &ArgMatches| match m.get_flag("tempo-only") {
            true => PlayMode::TempoOnly,
            false => PlayMode::Rhythm,
        };
        let name = |m: &ArgMatches| m.get_one::<String>("name").cloned().unwrap_or_default();

        Ok(match m.subcommand() {
            Some(("generate", m)) => {
                let kind = *m
                    .get_one::<SequenceKind>("sequence")
                    .ok_or_else(|| anyhow::anyhow!("No sequence given"))?;
                let mut params = Params::new(kind);
                if let Some(&count) = m.get_one::<usize>("count") {
                    params.count = count;
                }
                if let Some(&tempo) = m.get_one::<u32>("tempo") {
                    params.tempo = tempo;
                }
                if let Some(&scale) = m.get_one::<ScaleKind>("scale") {
                    params.scale = scale;
                }
                if let Some(&rhythm) = m.get_one::<RhythmPattern>("rhythm") {
                    params.rhythm = rhythm;
                }
                params.save = !m.get_flag("no-save");

                Self::Generate {
                    params,
                    play: m.get_flag("play"),
                    mode: mode(m),
                }
            }
            Some(("play", m)) => Self::Play {
                name: name(m),
                mode: mode(m),
                limit: m.get_one::<u64>("for").map(|x| Duration::from_millis(*x)),
            },
            Some(("list", _)) => Self::List,
            Some(("info", m)) => Self::Info { name: name(m) },
            Some(("delete", m)) => Self::Delete { name: name(m) },
            Some(("update", m)) => Self::Update {
                name: name(m),
                changes: CompositionUpdate {
                    name: m.get_one::<String>("rename").cloned(),
                    tempo: m.get_one::<u32>("tempo").copied(),
                    scale_type: m.get_one::<ScaleKind>("scale").copied(),
                    rhythm_pattern: m.get_one::<RhythmPattern>("rhythm").copied(),
                    ..Default::default()
                },
            },
            Some(("symphony", m)) => Self::Symphony {
                play: !m.get_flag("no-play"),
                pause: m
                    .get_one::<u64>("pause")
                    .map(|x| Duration::from_millis(*x))
                    .unwrap_or(DEFAULT_PAUSE),
            },
            Some(("beep", m)) => Self::Beep {
                frequency: m.get_one::<f64>("frequency").copied().unwrap_or(440.0),
                duration: Duration::from_millis(
                    m.get_one::<u64>("duration").copied().unwrap_or(500),
                ),
            },
            _ => anyhow::bail!("Invalid subcommand"),
        })
    }

    /// Checks if this action can make a sound.
    /// Audio devices are only opened when they are needed.
    pub fn needs_audio(&self) -> bool {
        match self {
            Self::Generate { play, .. } | Self::Symphony { play, .. } => *play,
            Self::Play { .. } | Self::Beep { .. } => true,
            Self::List | Self::Info { .. } | Self::Delete { .. } | Self::Update { .. } => false,
        }
    }
}

#[cfg(test)]
mod test {
    use std::{path::PathBuf, time::Duration};

    use super::{command, Action, Settings};
    use crate::{
        generator::PlayMode,
        music::{RhythmPattern, ScaleKind},
        sequence::SequenceKind,
    };

    fn parse(args: &[&str]) -> (Settings, Action) {
        let m = command()
            .try_get_matches_from(args.iter().copied())
            .unwrap();
        (Settings::from_matches(&m), Action::from_matches(&m).unwrap())
    }

    #[test]
    fn test_command_is_valid() {
        command().debug_assert();
    }

    #[test]
    fn test_generate_defaults() {
        let (settings, action) = parse(&["math-melody", "generate", "pi"]);
        assert_eq!(settings.dir, PathBuf::from("compositions"));
        assert!(!settings.mute);
        assert_eq!(settings.output_device, "default");

        let Action::Generate { params, play, mode } = action else {
            panic!("expected generate");
        };
        assert_eq!(params.kind, SequenceKind::Pi);
        assert_eq!(params.count, 20);
        assert_eq!(params.tempo, 120);
        assert_eq!(params.scale, ScaleKind::Major);
        assert_eq!(params.rhythm, RhythmPattern::Simple);
        assert!(params.save);
        assert!(!play);
        assert_eq!(mode, PlayMode::Rhythm);
    }

    #[test]
    fn test_generate_options() {
        let (settings, action) = parse(&[
            "math-melody",
            "generate",
            "primes",
            "-n",
            "15",
            "-t",
            "90",
            "-s",
            "minor",
            "-r",
            "march",
            "--no-save",
            "--play",
            "--tempo-only",
            "--mute",
            "--dir",
            "songs",
        ]);
        assert!(settings.mute);
        assert_eq!(settings.dir, PathBuf::from("songs"));

        let Action::Generate { params, play, mode } = action else {
            panic!("expected generate");
        };
        assert_eq!(params.count, 15);
        assert_eq!(params.tempo, 90);
        assert_eq!(params.scale, ScaleKind::Minor);
        assert_eq!(params.rhythm, RhythmPattern::March);
        assert!(!params.save);
        assert!(play);
        assert_eq!(mode, PlayMode::TempoOnly);
    }

    #[test]
    fn test_rejects_bad_input() {
        for args in [
            &["math-melody", "generate", "fibonacci", "-t", "0"][..],
            &["math-melody", "generate", "squares"],
            &["math-melody", "generate", "pi", "-s", "dorian"],
            &["math-melody", "play"],
            &["math-melody"],
        ] {
            assert!(command().try_get_matches_from(args.iter().copied()).is_err());
        }
    }

    #[test]
    fn test_other_subcommands() {
        let (_, action) = parse(&["math-melody", "play", "Pi_20_Digits", "--for", "1500"]);
        assert!(matches!(
            action,
            Action::Play { ref name, mode: PlayMode::Rhythm, limit: Some(limit) }
                if name == "Pi_20_Digits" && limit == Duration::from_millis(1500)
        ));
        assert!(action.needs_audio());

        let (_, action) = parse(&["math-melody", "ls"]);
        assert!(matches!(action, Action::List));
        assert!(!action.needs_audio());

        let (_, action) = parse(&["math-melody", "update", "Pi_20_Digits", "-s", "minor", "--rename", "Sad Pi"]);
        let Action::Update { name, changes } = action else {
            panic!("expected update");
        };
        assert_eq!(name, "Pi_20_Digits");
        assert_eq!(changes.scale_type, Some(ScaleKind::Minor));
        assert_eq!(changes.name.as_deref(), Some("Sad Pi"));
        assert_eq!(changes.tempo, None);

        let (_, action) = parse(&["math-melody", "symphony", "--no-play"]);
        assert!(matches!(action, Action::Symphony { play: false, .. }));
        assert!(!action.needs_audio());
    }
}
