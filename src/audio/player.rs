//! Melody playback.
//!
//! A [`Player`] plays one melody at a time on a background thread so whoever asked for it can keep going.
//! Notes are played strictly in order, and a session can be stopped between notes.
//! A note that is already playing always runs to the end, tone devices can't be interrupted.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use anyhow::Context;
use crossbeam::channel::{self, Receiver};
use parking_lot::Mutex;

use super::device::{device_frequency, ToneDevice};
use crate::music::RhythmPattern;

/// Pause between notes when playing with a rhythm.
pub const NOTE_GAP: Duration = Duration::from_millis(50);
/// How long [`Player::stop`] waits for the playback thread to notice.
pub const STOP_WAIT: Duration = Duration::from_millis(100);

/// What happened when a melody was asked to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayStatus {
    /// A new session was started.
    Started,
    /// Something is already playing, the request was ignored.
    Busy,
    /// There were no notes, nothing was started.
    Empty,
}

pub struct Player {
    device: Arc<dyn ToneDevice>,
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    /// Incremented for every session, so a finishing thread can tell if it is still the current one.
    generation: u64,
    session: Option<Session>,
}

/// Handle to the thread playing the current melody.
struct Session {
    id: u64,
    cancel: Arc<AtomicBool>,
    done: Receiver<()>,
}

/// One tone to send to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Step {
    frequency: u32,
    duration: Duration,
}

impl Player {
    pub fn new(device: Arc<dyn ToneDevice>) -> Self {
        Self {
            device,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Plays notes with the lengths given by a rhythm pattern.
    /// The tempo is only informational here, note lengths come from the pattern.
    pub fn play(
        &self,
        notes: &[f64],
        tempo: u32,
        pattern: RhythmPattern,
    ) -> anyhow::Result<PlayStatus> {
        let status = self.play_rhythm(notes, &pattern.plan(notes.len()))?;
        if status == PlayStatus::Started {
            println!("[*] Playing {} notes at {tempo} BPM ({pattern:?})", notes.len());
        }

        Ok(status)
    }

    /// Plays notes with an explicit list of note lengths in milliseconds.
    /// If the lists are not the same length both are cut down to the shorter one.
    pub fn play_rhythm(&self, notes: &[f64], rhythm: &[u64]) -> anyhow::Result<PlayStatus> {
        let (notes, rhythm) = reconcile(notes, rhythm);
        let steps = notes
            .iter()
            .zip(rhythm)
            .map(|(&freq, &ms)| Step {
                frequency: device_frequency(freq),
                duration: Duration::from_millis(ms),
            })
            .collect();

        self.start(steps, NOTE_GAP, "Rhythmic melody")
    }

    /// Plays every note for `note_duration * volume` milliseconds.
    /// Notes are spaced as sixteenth notes at the given tempo.
    pub fn play_tempo_only(
        &self,
        notes: &[f64],
        tempo: u32,
        note_duration: u64,
        volume: f64,
    ) -> anyhow::Result<PlayStatus> {
        let duration = Duration::from_millis((note_duration as f64 * volume.max(0.0)) as u64);
        let steps = notes
            .iter()
            .map(|&freq| Step {
                frequency: device_frequency(freq),
                duration,
            })
            .collect();

        self.start(steps, sixteenth_note(tempo), "Melody")
    }

    /// Asks the current session to stop and waits a moment for it to notice.
    /// Returns after at most [`STOP_WAIT`] even if the note being played has not finished.
    pub fn stop(&self) {
        let Some(session) = self.state.lock().session.take() else {
            println!("[*] Nothing is playing.");
            return;
        };

        session.cancel.store(true, Ordering::Release);
        if session.done.recv_timeout(STOP_WAIT).is_err() {
            eprintln!("[W] Playback is still finishing its current note");
        }

        println!("[*] Melody stopped.");
    }

    /// Checks if a melody is currently playing.
    pub fn is_active(&self) -> bool {
        self.state.lock().session.is_some()
    }

    /// Blocks until the current session is over.
    /// Returns straight away if nothing is playing.
    pub fn wait(&self) {
        if let Some(done) = self.done_signal() {
            let _ = done.recv();
        }
    }

    /// Like [`Player::wait`] but gives up after `timeout`.
    /// Returns true if the session ended in time.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        match self.done_signal() {
            Some(done) => !matches!(
                done.recv_timeout(timeout),
                Err(channel::RecvTimeoutError::Timeout)
            ),
            None => true,
        }
    }

    fn done_signal(&self) -> Option<Receiver<()>> {
        self.state.lock().session.as_ref().map(|x| x.done.clone())
    }

    fn start(&self, steps: Vec<Step>, gap: Duration, label: &'static str) -> anyhow::Result<PlayStatus> {
        let mut state = self.state.lock();
        if state.session.is_some() {
            println!("[-] Already playing a melody. Please wait...");
            return Ok(PlayStatus::Busy);
        }

        if steps.is_empty() {
            println!("[*] No notes to play.");
            return Ok(PlayStatus::Empty);
        }

        state.generation += 1;
        let id = state.generation;
        let cancel = Arc::new(AtomicBool::new(false));
        let (tx, done) = channel::bounded(1);

        let device = self.device.clone();
        let shared = self.state.clone();
        let token = cancel.clone();

        // The state lock is held until the session is stored, so the thread can't clear it too early
        thread::Builder::new()
            .name("playback".to_owned())
            .spawn(move || {
                let finished = run(&*device, &steps, gap, &token);

                let mut state = shared.lock();
                if state.session.as_ref().map(|x| x.id) == Some(id) {
                    state.session = None;
                }
                drop(state);

                if finished {
                    println!("[*] {label} finished playing.");
                }
                let _ = tx.send(());
            })
            .context("Failed to start playback thread")?;

        state.session = Some(Session { id, cancel, done });
        Ok(PlayStatus::Started)
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        if let Some(session) = self.state.lock().session.take() {
            session.cancel.store(true, Ordering::Release);
        }
    }
}

/// Plays the steps in order, sleeping `gap` between them.
/// Returns false if it was cancelled before the end.
fn run(device: &dyn ToneDevice, steps: &[Step], gap: Duration, cancel: &AtomicBool) -> bool {
    for (i, step) in steps.iter().enumerate() {
        if cancel.load(Ordering::Acquire) {
            return false;
        }

        if let Err(e) = device.emit(step.frequency, step.duration) {
            eprintln!("[-] Error playing note {} ({}Hz): {e}", i + 1, step.frequency);
        }

        if i + 1 < steps.len() {
            thread::sleep(gap);
        }
    }

    true
}

/// Cuts notes and rhythm down to the same length.
fn reconcile<'a>(notes: &'a [f64], rhythm: &'a [u64]) -> (&'a [f64], &'a [u64]) {
    if notes.len() == rhythm.len() {
        return (notes, rhythm);
    }

    eprintln!(
        "[W] Notes and rhythm pattern have different lengths ({} and {}). Using shorter length.",
        notes.len(),
        rhythm.len()
    );
    let len = notes.len().min(rhythm.len());
    (&notes[..len], &rhythm[..len])
}

/// Length of a sixteenth note at the given tempo.
/// A tempo of zero is treated as one beat per minute.
fn sixteenth_note(tempo: u32) -> Duration {
    Duration::from_secs_f64(60.0 / tempo.max(1) as f64 / 4.0)
}

#[cfg(test)]
mod test {
    use std::{
        sync::Arc,
        thread,
        time::{Duration, Instant},
    };

    use anyhow::bail;
    use parking_lot::Mutex;

    use super::{reconcile, sixteenth_note, PlayStatus, Player};
    use crate::{audio::ToneDevice, music::RhythmPattern};

    /// Writes down every tone it is asked to play instead of playing it.
    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(u32, u64)>>,
        hold: Duration,
        fail_on: Option<u32>,
    }

    impl Recorder {
        fn holding(ms: u64) -> Self {
            Self {
                hold: Duration::from_millis(ms),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<(u32, u64)> {
            self.calls.lock().clone()
        }
    }

    impl ToneDevice for Recorder {
        fn emit(&self, frequency: u32, duration: Duration) -> anyhow::Result<()> {
            self.calls
                .lock()
                .push((frequency, duration.as_millis() as u64));
            thread::sleep(self.hold);

            if self.fail_on == Some(frequency) {
                bail!("speaker on fire");
            }
            Ok(())
        }
    }

    #[test]
    fn test_play_rhythm_in_order() {
        let device = Arc::new(Recorder::default());
        let player = Player::new(device.clone());

        let notes = [261.63, 10.0, 40000.0, 440.0];
        let status = player.play(&notes, 120, RhythmPattern::Waltz).unwrap();
        assert_eq!(status, PlayStatus::Started);
        player.wait();

        assert_eq!(
            device.calls(),
            [(261, 800), (37, 400), (32767, 400), (440, 800)]
        );
        assert!(!player.is_active());
    }

    #[test]
    fn test_busy_is_ignored() {
        let device = Arc::new(Recorder::holding(20));
        let player = Player::new(device.clone());

        let first = [300.0; 5];
        let second = [600.0; 5];
        assert_eq!(
            player.play(&first, 120, RhythmPattern::Simple).unwrap(),
            PlayStatus::Started
        );
        assert_eq!(
            player.play(&second, 120, RhythmPattern::March).unwrap(),
            PlayStatus::Busy
        );
        assert_eq!(
            player.play_tempo_only(&second, 120, 500, 1.0).unwrap(),
            PlayStatus::Busy
        );
        assert!(player.is_active());

        player.wait();
        assert_eq!(device.calls(), [(300, 500); 5]);
    }

    #[test]
    fn test_can_play_again_after_finishing() {
        let device = Arc::new(Recorder::default());
        let player = Player::new(device.clone());

        player.play(&[300.0], 60, RhythmPattern::Simple).unwrap();
        player.wait();
        let status = player.play(&[400.0], 60, RhythmPattern::Simple).unwrap();
        assert_eq!(status, PlayStatus::Started);
        player.wait();

        assert_eq!(device.calls(), [(300, 500), (400, 500)]);
    }

    #[test]
    fn test_stop_cancels_between_notes() {
        let device = Arc::new(Recorder::holding(40));
        let player = Player::new(device.clone());

        player.play(&[500.0; 20], 120, RhythmPattern::Simple).unwrap();
        thread::sleep(Duration::from_millis(60));
        player.stop();
        assert!(!player.is_active());

        let played = device.calls().len();
        thread::sleep(Duration::from_millis(300));
        assert_eq!(device.calls().len(), played);
        assert!(played >= 1 && played < 20);
    }

    #[test]
    fn test_stop_when_idle() {
        let player = Player::new(Arc::new(Recorder::default()));
        let start = Instant::now();
        player.stop();
        assert!(start.elapsed() < Duration::from_millis(100));
        assert!(player.wait_timeout(Duration::from_millis(1)));
    }

    #[test]
    fn test_new_session_after_stop() {
        let device = Arc::new(Recorder::holding(150));
        let player = Player::new(device.clone());

        player.play(&[500.0; 4], 120, RhythmPattern::Simple).unwrap();
        thread::sleep(Duration::from_millis(20));
        // Returns before the first note is done
        player.stop();

        let status = player.play(&[700.0], 120, RhythmPattern::Simple).unwrap();
        assert_eq!(status, PlayStatus::Started);
        player.wait();
        thread::sleep(Duration::from_millis(200));

        // The old thread finishing must not have ended the new session early
        assert_eq!(device.calls(), [(500, 500), (700, 500)]);
        assert!(!player.is_active());
    }

    #[test]
    fn test_device_errors_do_not_stop_playback() {
        let device = Arc::new(Recorder {
            fail_on: Some(440),
            ..Default::default()
        });
        let player = Player::new(device.clone());

        player
            .play(&[440.0, 440.0, 523.25], 120, RhythmPattern::March)
            .unwrap();
        player.wait();

        assert_eq!(device.calls(), [(440, 600), (440, 200), (523, 400)]);
    }

    #[test]
    fn test_rhythm_mismatch_truncates() {
        let device = Arc::new(Recorder::default());
        let player = Player::new(device.clone());

        player.play_rhythm(&[300.0, 400.0, 500.0], &[100, 200]).unwrap();
        player.wait();
        assert_eq!(device.calls(), [(300, 100), (400, 200)]);

        let (notes, rhythm) = reconcile(&[1.0], &[1, 2, 3]);
        assert_eq!((notes.len(), rhythm.len()), (1, 1));
    }

    #[test]
    fn test_tempo_only() {
        let device = Arc::new(Recorder::default());
        let player = Player::new(device.clone());

        // 600 BPM is a 25ms sixteenth note
        let start = Instant::now();
        player.play_tempo_only(&[300.0; 3], 600, 100, 0.5).unwrap();
        player.wait();

        assert!(start.elapsed() >= Duration::from_millis(50));
        assert_eq!(device.calls(), [(300, 50); 3]);
    }

    #[test]
    fn test_gap_only_between_notes() {
        let device = Arc::new(Recorder::default());
        let player = Player::new(device.clone());

        // Three 10ms notes and two 50ms gaps
        let start = Instant::now();
        player.play_rhythm(&[300.0; 3], &[10, 10, 10]).unwrap();
        player.wait();
        let elapsed = start.elapsed();

        assert_eq!(device.calls(), [(300, 10); 3]);
        assert!(elapsed >= Duration::from_millis(130), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(175), "{elapsed:?}");
    }

    #[test]
    fn test_stop_is_bounded_during_long_note() {
        let device = Arc::new(Recorder::holding(500));
        let player = Player::new(device.clone());

        player.play(&[500.0; 3], 120, RhythmPattern::Simple).unwrap();
        thread::sleep(Duration::from_millis(20));

        let start = Instant::now();
        player.stop();
        let elapsed = start.elapsed();

        assert!(elapsed < Duration::from_millis(150), "{elapsed:?}");
        assert!(!player.is_active());
        assert_eq!(device.calls().len(), 1);
    }

    #[test]
    fn test_sixteenth_note() {
        assert_eq!(sixteenth_note(120), Duration::from_millis(125));
        assert_eq!(sixteenth_note(60), Duration::from_millis(250));
        assert_eq!(sixteenth_note(0), Duration::from_secs(15));
    }

    #[test]
    fn test_empty_melody() {
        let player = Player::new(Arc::new(Recorder::default()));
        assert_eq!(
            player.play(&[], 120, RhythmPattern::Simple).unwrap(),
            PlayStatus::Empty
        );
        assert!(!player.is_active());
    }
}
