use serde::Serialize;

use crate::shell::{CommandError, CommandRunner, SystemRunner};

/// Virtual target that forwards commands to whichever real player was most
/// recently active, so we never have to track the active player ourselves.
pub const DEFAULT_PLAYER: &str = "playerctld";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlaybackState {
    Playing,
    Paused,
    Error,
    NoPlayer,
}

impl PlaybackState {
    /// Ordered substring match over the raw `status` output, first match
    /// wins. Precedence: NoPlayer > Playing > Paused > Error.
    pub fn parse(raw: &str) -> Self {
        if raw.contains("No players found") {
            return Self::NoPlayer;
        }
        if raw.contains("Playing") {
            return Self::Playing;
        }
        if raw.contains("Paused") {
            return Self::Paused;
        }
        Self::Error
    }

    /// The verb that would flip this state, used for the play/pause entry.
    pub fn opposite_verb(self) -> &'static str {
        match self {
            Self::Playing => "pause",
            Self::Paused | Self::Error | Self::NoPlayer => "play",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ShuffleState {
    On,
    Off,
    Unavailable,
}

impl ShuffleState {
    pub fn parse(raw: &str) -> Self {
        if raw.contains("On") {
            return Self::On;
        }
        if raw.contains("Off") {
            return Self::Off;
        }
        Self::Unavailable
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RepeatState {
    Off,
    Playlist,
    Track,
    Unavailable,
}

impl RepeatState {
    pub fn parse(raw: &str) -> Self {
        if raw.contains("Track") {
            return Self::Track;
        }
        if raw.contains("Playlist") {
            return Self::Playlist;
        }
        if raw.contains("None") {
            return Self::Off;
        }
        Self::Unavailable
    }

    /// Cyclic successor over Off -> Playlist -> Track -> Off. Unavailable
    /// absorbs: a player that does not expose looping stays that way.
    pub fn next(self) -> Self {
        match self {
            Self::Off => Self::Playlist,
            Self::Playlist => Self::Track,
            Self::Track => Self::Off,
            Self::Unavailable => Self::Unavailable,
        }
    }

    /// Argument the `loop` subcommand expects, None when unavailable.
    pub fn as_arg(self) -> Option<&'static str> {
        match self {
            Self::Off => Some("none"),
            Self::Playlist => Some("playlist"),
            Self::Track => Some("track"),
            Self::Unavailable => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::Playlist => "Playlist",
            Self::Track => "Track",
            Self::Unavailable => "Unavailable",
        }
    }
}

/// Snapshot of the player's playback, shuffle and repeat state. Recomputed
/// fresh on every query, never cached across calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlayerStatus {
    pub playback: PlaybackState,
    pub shuffle: ShuffleState,
    pub repeat: RepeatState,
}

/// Metadata of whatever is currently playing. Cache identity is the
/// (title, artist) pair, nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentMedia {
    pub art_url: String,
    pub artist: String,
    pub title: String,
    pub player: String,
    pub album: Option<String>,
    /// Track position in microseconds, when the player reports one.
    pub position: Option<i64>,
}

/// First line starting with `key:`, everything after the colon. An empty
/// remainder counts as absent.
fn extract_field(key: &str, raw: &str) -> Option<String> {
    raw.lines().find_map(|line| {
        line.strip_prefix(key)
            .and_then(|rest| rest.strip_prefix(':'))
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    })
}

fn require_field(key: &str, raw: &str) -> Result<String, CommandError> {
    extract_field(key, raw).ok_or_else(|| CommandError::FieldNotFound(key.to_string()))
}

/// Display capitalisation: first char upper, rest lower ("spotify" ->
/// "Spotify", "VLC" -> "Vlc").
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

const METADATA_FORMAT: &str = "artUrl:{{mpris:artUrl}}\nartist:{{xesam:artist}}\ntitle:{{xesam:title}}\nalbum:{{xesam:album}}\nplayerName:{{playerName}}\nposition:{{position}}";

/// Wrapper around the `playerctl` command-line tool, addressing the default
/// virtual player target unless told otherwise.
pub struct Player {
    runner: Box<dyn CommandRunner>,
    target: String,
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl Player {
    pub fn new() -> Self {
        Self::with_runner(Box::new(SystemRunner))
    }

    pub fn with_runner(runner: Box<dyn CommandRunner>) -> Self {
        Self {
            runner,
            target: DEFAULT_PLAYER.to_string(),
        }
    }

    fn ctl(&self, args: &[&str], check: bool) -> Result<String, CommandError> {
        self.ctl_player(&self.target, args, check)
    }

    fn ctl_player(&self, player: &str, args: &[&str], check: bool) -> Result<String, CommandError> {
        let mut argv: Vec<&str> = Vec::with_capacity(args.len() + 2);
        argv.push("-p");
        argv.push(player);
        argv.extend_from_slice(args);
        self.runner.run("playerctl", &argv, check)
    }

    /// Toggle play/pause on the active player.
    pub fn play_pause(&self) -> Result<(), CommandError> {
        self.ctl(&["play-pause"], true).map(drop)
    }

    /// Skip to the next track.
    pub fn next(&self) -> Result<(), CommandError> {
        self.ctl(&["next"], true).map(drop)
    }

    /// Skip to the previous track.
    pub fn previous(&self) -> Result<(), CommandError> {
        self.ctl(&["previous"], true).map(drop)
    }

    /// Jump to a position (seconds) in the current track.
    pub fn seek(&self, position: &str) -> Result<(), CommandError> {
        self.ctl(&["position", position], true).map(drop)
    }

    /// Toggle shuffle on the active player.
    pub fn toggle_shuffle(&self) -> Result<(), CommandError> {
        self.ctl(&["shuffle", "toggle"], true).map(drop)
    }

    /// Advance the repeat mode to its cyclic successor. A player that does
    /// not expose looping makes this a no-op.
    pub fn set_repeat(&self, status: &PlayerStatus) -> Result<(), CommandError> {
        let Some(arg) = status.repeat.next().as_arg() else {
            return Ok(());
        };
        self.ctl(&["loop", arg], true).map(drop)
    }

    /// Three independent queries, parsed separately. There is no atomicity
    /// across them: the player can change state between calls, which is
    /// tolerable at human interaction time scales.
    pub fn status(&self) -> Result<PlayerStatus, CommandError> {
        let playback = self.ctl(&["status"], false)?;
        let shuffle = self.ctl(&["shuffle"], false)?;
        let repeat = self.ctl(&["loop"], false)?;

        Ok(PlayerStatus {
            playback: PlaybackState::parse(&playback),
            shuffle: ShuffleState::parse(&shuffle),
            repeat: RepeatState::parse(&repeat),
        })
    }

    /// One metadata query with a fixed multi-field template. Art reference,
    /// artist, title and player name are required; album and position
    /// degrade to None.
    pub fn current_media(&self) -> Result<CurrentMedia, CommandError> {
        let raw = self.ctl(&["metadata", "--format", METADATA_FORMAT], true)?;

        let art_url = require_field("artUrl", &raw)?;
        let artist = require_field("artist", &raw)?;
        let title = require_field("title", &raw)?;
        let player = capitalize(&require_field("playerName", &raw)?);
        let album = extract_field("album", &raw);
        let position = extract_field("position", &raw).and_then(|p| p.parse::<i64>().ok());

        Ok(CurrentMedia {
            art_url,
            artist,
            title,
            player,
            album,
            position,
        })
    }

    /// Raw identifiers of every registered player.
    pub fn list_players(&self) -> Result<Vec<String>, CommandError> {
        let raw = self.runner.run("playerctl", &["-l"], true)?;
        Ok(raw
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Pause every registered player.
    pub fn pause_all(&self) -> Result<(), CommandError> {
        self.runner
            .run("playerctl", &["--all-players", "pause"], true)
            .map(drop)
    }

    /// Pause everything, then wake the chosen player with a play / pause /
    /// play-pause sequence. Some players refuse a pause before they have
    /// played once; the final toggle starts from a known-paused state, so
    /// the player ends up playing regardless of where it began.
    pub fn switch_to(&self, player: &str) -> Result<(), CommandError> {
        self.pause_all()?;
        self.ctl_player(player, &["play"], true)?;
        self.ctl_player(player, &["pause"], true)?;
        self.ctl_player(player, &["play-pause"], true).map(drop)
    }
}
