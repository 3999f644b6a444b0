use tracing::debug;

use crate::shell::{CommandError, CommandRunner, SystemRunner};

/// The mixer's name for the current default output device.
pub const DEFAULT_SINK: &str = "@DEFAULT_SINK@";

/// Wrapper around `pactl` that also owns the application's idea of whether
/// audio is muted. The pactl call and the flag update happen in one place,
/// so every menu build and command path sees the same answer.
pub struct Mixer {
    runner: Box<dyn CommandRunner>,
    muted: bool,
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mixer {
    pub fn new() -> Self {
        Self::with_runner(Box::new(SystemRunner))
    }

    pub fn with_runner(runner: Box<dyn CommandRunner>) -> Self {
        Self {
            runner,
            muted: false,
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Menu verb for the mute entry: the opposite of the current state.
    pub fn next_mute_action(&self) -> &'static str {
        if self.muted {
            "Unmute"
        } else {
            "Mute"
        }
    }

    /// Set the sink's mute flag. The owned flag only updates once pactl
    /// succeeds, so the two cannot drift apart through this path.
    pub fn set_muted(&mut self, mute: bool) -> Result<(), CommandError> {
        self.runner.run(
            "pactl",
            &["set-sink-mute", DEFAULT_SINK, if mute { "1" } else { "0" }],
            true,
        )?;
        self.muted = mute;
        Ok(())
    }

    pub fn toggle_mute(&mut self) -> Result<(), CommandError> {
        self.set_muted(!self.muted)
    }

    /// Clamp to [0, 100] and apply. Zero mutes instead of setting a zero
    /// volume; anything else unmutes first, then sets the sink volume.
    pub fn set_global_volume(&mut self, percent: i64) -> Result<(), CommandError> {
        let clamped = percent.clamp(0, 100);
        debug!(requested = percent, clamped, "setting global volume");

        if clamped == 0 {
            return self.set_muted(true);
        }

        self.set_muted(false)?;
        self.runner
            .run(
                "pactl",
                &["set-sink-volume", DEFAULT_SINK, &format!("{clamped}%")],
                true,
            )
            .map(drop)
    }
}
