use std::path::PathBuf;

use serde::Serialize;

use crate::artwork::FALLBACK_ICON;
use crate::player::{capitalize, CurrentMedia, PlayerStatus, RepeatState, ShuffleState};
use crate::theme::Theme;

/// The closed set of things a menu entry can do. Dispatch is an exhaustive
/// match, so adding a variant forces every handler to take a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    PlayPause,
    Next,
    Prev,
    Shuffle,
    Repeat,
    Mute,
    Volume,
    Seek,
    Players,
    SelectPlayer,
}

/// One selectable row in the launcher menu.
#[derive(Debug, Clone, Serialize)]
pub struct MenuEntry {
    pub icon: PathBuf,
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    /// Extra payload for the action: a player id, a volume amount.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub argument: Option<String>,
    /// Whether the launcher should stay open and re-render after the action.
    pub keep_open: bool,
}

/// Positions in the main menu, in their default order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    CurrentMedia,
    PlayPause,
    NextTrack,
    PrevTrack,
    Shuffle,
    Repeat,
    Volume,
    Mute,
    PlayerSelect,
}

pub const DEFAULT_MENU_ORDER: [MenuItem; 9] = [
    MenuItem::CurrentMedia,
    MenuItem::PlayPause,
    MenuItem::NextTrack,
    MenuItem::PrevTrack,
    MenuItem::Shuffle,
    MenuItem::Repeat,
    MenuItem::Volume,
    MenuItem::Mute,
    MenuItem::PlayerSelect,
];

/// Single-letter shortcuts for the impatient. Non-alphabetic characters are
/// stripped first, so "v50" still reaches the volume entry.
pub fn alias_target(command: &str) -> Option<MenuItem> {
    let alpha: String = command
        .chars()
        .filter(|c| c.is_alphabetic())
        .collect::<String>()
        .to_lowercase();

    match alpha.as_str() {
        "p" => Some(MenuItem::PlayPause),
        "n" => Some(MenuItem::NextTrack),
        "b" => Some(MenuItem::PrevTrack),
        "v" | "vol" => Some(MenuItem::Volume),
        "m" => Some(MenuItem::Mute),
        "r" => Some(MenuItem::Repeat),
        "s" => Some(MenuItem::Shuffle),
        _ => None,
    }
}

/// A user query split into its leading command and trailing components.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub command: String,
    pub components: Vec<String>,
}

impl Query {
    pub fn parse(raw: &str) -> Self {
        let mut words = raw.split_whitespace().map(str::to_string);
        let command = words.next().unwrap_or_default();
        Self {
            command,
            components: words.collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.command.is_empty()
    }

    /// Digit-filtered amount from the first component (or the command
    /// itself, for queries like "50"). "50%" and "vol50" both yield "50";
    /// no digits at all yields None.
    pub fn amount(&self) -> Option<String> {
        let component = self.components.first().unwrap_or(&self.command);
        let digits: String = component.chars().filter(char::is_ascii_digit).collect();
        if digits.is_empty() {
            None
        } else {
            Some(digits)
        }
    }
}

/// Builds menu entries from typed state. Purely presentational: no tool
/// calls happen here, the app hands in whatever state each entry needs.
pub struct MenuBuilder {
    theme: Theme,
}

impl MenuBuilder {
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }

    pub fn current_media(&self, media: &CurrentMedia, thumbnail: PathBuf) -> MenuEntry {
        let album = media
            .album
            .as_deref()
            .map(|album| format!(" | {album}"))
            .unwrap_or_default();

        MenuEntry {
            icon: thumbnail,
            name: media.title.clone(),
            description: format!("By {}{} | {}", media.artist, album, media.player),
            action: None,
            argument: None,
            keep_open: false,
        }
    }

    pub fn play_pause(&self, status: &PlayerStatus) -> MenuEntry {
        let verb = status.playback.opposite_verb();
        MenuEntry {
            icon: self.theme.icon(verb),
            name: capitalize(verb),
            description: format!("{} the current song/track", capitalize(verb)),
            action: Some(Action::PlayPause),
            argument: None,
            keep_open: false,
        }
    }

    pub fn next_track(&self) -> MenuEntry {
        MenuEntry {
            icon: self.theme.icon("next"),
            name: "Next Track".to_string(),
            description: "Go to the next song/track".to_string(),
            action: Some(Action::Next),
            argument: None,
            keep_open: true,
        }
    }

    pub fn previous_track(&self) -> MenuEntry {
        MenuEntry {
            icon: self.theme.icon("prev"),
            name: "Previous Track".to_string(),
            description: "Go to the previous song/track".to_string(),
            action: Some(Action::Prev),
            argument: None,
            keep_open: true,
        }
    }

    /// None when the player does not expose shuffling.
    pub fn shuffle(&self, status: &PlayerStatus) -> Option<MenuEntry> {
        if status.shuffle == ShuffleState::Unavailable {
            return None;
        }

        let is_on = status.shuffle == ShuffleState::On;
        let state = if is_on { "On" } else { "Off" };
        Some(MenuEntry {
            icon: self.theme.icon(&format!("shuffle_{}", state.to_lowercase())),
            name: format!("Shuffle {state}"),
            description: format!("Turn shuffle {}", if is_on { "off" } else { "on" }),
            action: Some(Action::Shuffle),
            argument: None,
            keep_open: false,
        })
    }

    /// None when the player does not expose looping.
    pub fn repeat(&self, status: &PlayerStatus) -> Option<MenuEntry> {
        let current = status.repeat;
        if current == RepeatState::Unavailable {
            return None;
        }

        let next = current.next();
        Some(MenuEntry {
            icon: self
                .theme
                .icon(&format!("repeat_{}", current.label().to_lowercase())),
            name: format!("Repeat: {}", current.label()),
            description: format!("Switch to {}", next.label().to_lowercase()),
            action: Some(Action::Repeat),
            argument: None,
            keep_open: true,
        })
    }

    /// Only actionable once the query carries an amount.
    pub fn volume(&self, amount: Option<String>) -> MenuEntry {
        let action = amount.as_ref().map(|_| Action::Volume);
        MenuEntry {
            icon: self.theme.icon("volume"),
            name: "Volume".to_string(),
            description: "Set volume between 0-100".to_string(),
            action,
            argument: amount,
            keep_open: false,
        }
    }

    pub fn mute(&self, next_action: &str) -> MenuEntry {
        MenuEntry {
            icon: self.theme.icon("mute"),
            name: next_action.to_string(),
            description: format!("{next_action} global volume"),
            action: Some(Action::Mute),
            argument: None,
            keep_open: false,
        }
    }

    pub fn player_select(&self) -> MenuEntry {
        MenuEntry {
            icon: self.theme.icon("switch"),
            name: "Change player".to_string(),
            description: "Change music player".to_string(),
            action: Some(Action::Players),
            argument: None,
            keep_open: true,
        }
    }

    /// One entry per registered player. Display name is the identifier up
    /// to the first dot ("spotify.instance123" reads as "Spotify").
    pub fn player_entries(&self, players: &[String]) -> Vec<MenuEntry> {
        players
            .iter()
            .map(|player| MenuEntry {
                icon: self.theme.icon("switch"),
                name: capitalize(player.split('.').next().unwrap_or(player)),
                description: "Press enter to select this player".to_string(),
                action: Some(Action::SelectPlayer),
                argument: Some(player.clone()),
                keep_open: false,
            })
            .collect()
    }

    pub fn no_media(&self) -> MenuEntry {
        MenuEntry {
            icon: PathBuf::from(FALLBACK_ICON),
            name: "Could not fetch current media".to_string(),
            description: "Is playerctl installed?".to_string(),
            action: None,
            argument: None,
            keep_open: false,
        }
    }

    pub fn no_player(&self) -> MenuEntry {
        MenuEntry {
            icon: PathBuf::from(FALLBACK_ICON),
            name: "No Media Playing".to_string(),
            description: "Please start a music player".to_string(),
            action: None,
            argument: None,
            keep_open: false,
        }
    }

    pub fn error(&self, title: &str, message: &str) -> MenuEntry {
        MenuEntry {
            icon: self.theme.icon("warning"),
            name: format!("Error: {title}."),
            description: message.to_string(),
            action: None,
            argument: None,
            keep_open: false,
        }
    }
}

/// Keep entries whose name contains any whitespace-separated query term,
/// case-insensitively. An empty query keeps everything.
pub fn filter_entries(entries: Vec<MenuEntry>, query: &str) -> Vec<MenuEntry> {
    let terms: Vec<String> = query
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();

    if terms.is_empty() {
        return entries;
    }

    entries
        .into_iter()
        .filter(|entry| {
            let name = entry.name.to_lowercase();
            terms.iter().any(|term| name.contains(term))
        })
        .collect()
}
