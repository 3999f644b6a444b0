use anyhow::{Context, Result};
use tracing::{debug, error};

use crate::artwork::ThumbnailCache;
use crate::config::AppConfig;
use crate::menu::{self, Action, MenuBuilder, MenuEntry, MenuItem, Query, DEFAULT_MENU_ORDER};
use crate::mixer::Mixer;
use crate::player::{PlaybackState, Player, PlayerStatus, RepeatState};
use crate::shell::CommandError;
use crate::theme::Theme;
use crate::wait;

/// The interaction layer: wires the player, mixer, thumbnail cache and menu
/// builder together, and turns queries and actions into menu entries.
///
/// Failures degrade to explanatory entries or fallback icons; only commands
/// with nothing sensible to render instead (play-pause, shuffle, volume,
/// seek, switching player) propagate and end the interaction.
pub struct App {
    player: Player,
    mixer: Mixer,
    cache: ThumbnailCache,
    menu: MenuBuilder,
}

impl App {
    pub fn new(config: &AppConfig, theme: Theme) -> Self {
        Self::with_parts(
            Player::new(),
            Mixer::new(),
            ThumbnailCache::new(config.cache_dir.clone()),
            theme,
        )
    }

    pub fn with_parts(player: Player, mixer: Mixer, cache: ThumbnailCache, theme: Theme) -> Self {
        Self {
            player,
            mixer,
            cache,
            menu: MenuBuilder::new(theme),
        }
    }

    /// The keyword flow: render the menu for a (possibly empty) user query.
    pub fn render(&self, raw_query: &str) -> Vec<MenuEntry> {
        let status = match self.player.status() {
            Ok(status) => status,
            Err(err) => {
                error!(%err, "could not query player status");
                return vec![self.menu.no_media()];
            }
        };
        debug!(?status, raw_query, "rendering menu");

        let query = Query::parse(raw_query);
        if query.is_empty() || status.playback == PlaybackState::Error {
            return self.main_page(None, &status);
        }

        if let Some(item) = menu::alias_target(&query.command) {
            return self.build_items(&[item], &status, &query);
        }

        let entries = if status.playback == PlaybackState::NoPlayer {
            self.build_items(&[MenuItem::Volume, MenuItem::Mute], &status, &query)
        } else {
            self.build_items(&DEFAULT_MENU_ORDER, &status, &query)
        };

        menu::filter_entries(entries, raw_query)
    }

    /// The enter flow: run an action, wait for its effect where that makes
    /// sense, and return whatever should be rendered afterwards (empty for
    /// actions that close the menu).
    pub fn dispatch(&mut self, action: Action, query: &Query) -> Result<Vec<MenuEntry>> {
        debug!(?action, ?query, "dispatching action");

        match action {
            Action::PlayPause => {
                self.player
                    .play_pause()
                    .context("could not toggle play/pause")?;
                Ok(Vec::new())
            }
            Action::Next | Action::Prev => Ok(self.skip(action)),
            Action::Shuffle => {
                self.player
                    .toggle_shuffle()
                    .context("could not toggle shuffle")?;
                Ok(Vec::new())
            }
            Action::Repeat => self.cycle_repeat(),
            Action::Mute => {
                self.mixer.toggle_mute().context("could not toggle mute")?;
                Ok(Vec::new())
            }
            Action::Volume => {
                match query.amount().and_then(|amount| amount.parse::<i64>().ok()) {
                    Some(amount) => self
                        .mixer
                        .set_global_volume(amount)
                        .context("could not set volume")?,
                    None => error!(?query, "could not parse volume amount"),
                }
                Ok(Vec::new())
            }
            Action::Seek => {
                let position = query.components.first().unwrap_or(&query.command);
                if position.is_empty() {
                    error!("no position given to seek to");
                    return Ok(Vec::new());
                }
                self.player.seek(position).context("could not seek")?;
                Ok(Vec::new())
            }
            Action::Players => match self.player.list_players() {
                Ok(players) => Ok(self.menu.player_entries(&players)),
                Err(err) => {
                    error!(%err, "could not list players");
                    Ok(vec![self
                        .menu
                        .error("Could not list players", "Is playerctl installed?")])
                }
            },
            Action::SelectPlayer => {
                let target = query.components.first().unwrap_or(&query.command);
                if target.is_empty() {
                    return Ok(vec![self
                        .menu
                        .error("No player selected", "Pass a player name to switch to")]);
                }
                self.player
                    .switch_to(target)
                    .with_context(|| format!("could not switch to player {target}"))?;
                Ok(Vec::new())
            }
        }
    }

    /// Next or previous track: snapshot first, fire the command, then poll
    /// until the change is visible (or the waiter gives up) before
    /// re-rendering, so the menu shows the new track rather than the old.
    fn skip(&self, action: Action) -> Vec<MenuEntry> {
        let direction = if action == Action::Next {
            "next"
        } else {
            "previous"
        };

        let before = match self.player.current_media() {
            Ok(media) => media,
            Err(err) => {
                error!(%err, "no media snapshot to compare against");
                return vec![self.menu.error(
                    &format!("Could not play {direction} media"),
                    "No current media to compare against",
                )];
            }
        };

        let fired = if action == Action::Next {
            self.player.next()
        } else {
            self.player.previous()
        };
        if let Err(err) = fired {
            error!(%err, direction, "player rejected the skip");
            return vec![self.menu.error(
                &format!("Could not play {direction} media"),
                "Does the player support this action?",
            )];
        }

        wait::wait_until(wait::MAX_WAIT, || {
            self.player
                .current_media()
                .map(|now| {
                    if action == Action::Next {
                        wait::track_advanced(&before, &now)
                    } else {
                        wait::track_rewound(&before, &now)
                    }
                })
                .unwrap_or(false)
        });

        self.render_after(action)
    }

    fn cycle_repeat(&self) -> Result<Vec<MenuEntry>> {
        let status = self
            .player
            .status()
            .context("could not query player status")?;

        self.player
            .set_repeat(&status)
            .context("could not set repeat mode")?;

        if status.repeat != RepeatState::Unavailable {
            wait::wait_until(wait::MAX_WAIT, || {
                self.player
                    .status()
                    .map(|now| wait::repeat_changed(status.repeat, now.repeat))
                    .unwrap_or(false)
            });
        }

        Ok(self.render_after(Action::Repeat))
    }

    /// Re-render after a keep-open action, against fresh state.
    fn render_after(&self, action: Action) -> Vec<MenuEntry> {
        match self.player.status() {
            Ok(status) => self.main_page(Some(action), &status),
            Err(err) => {
                error!(%err, "could not query player status");
                vec![self.menu.no_media()]
            }
        }
    }

    fn main_page(&self, action: Option<Action>, status: &PlayerStatus) -> Vec<MenuEntry> {
        match status.playback {
            PlaybackState::Error => vec![self.menu.no_media()],
            PlaybackState::NoPlayer => {
                let mut items = vec![self.menu.no_player()];
                items.extend(self.build_items(
                    &[MenuItem::Volume, MenuItem::Mute],
                    status,
                    &Query::default(),
                ));
                items
            }
            PlaybackState::Playing | PlaybackState::Paused => {
                let mut items = Vec::new();

                match action {
                    Some(Action::Next) => items.push(self.menu.next_track()),
                    Some(Action::Prev) => items.push(self.menu.previous_track()),
                    Some(Action::Repeat) => {
                        if let Some(entry) = self.menu.repeat(status) {
                            items.push(entry);
                        }
                    }
                    _ => {}
                }

                match self.current_media_entry() {
                    Ok(entry) => items.push(entry),
                    Err(err) => {
                        error!(%err, "could not fetch current media");
                        items.push(self.menu.no_media());
                    }
                }

                if matches!(action, Some(Action::Next | Action::Prev | Action::Repeat)) {
                    return items;
                }

                // CurrentMedia is already at the top; skip it in the rest.
                items.extend(self.build_items(&DEFAULT_MENU_ORDER[1..], status, &Query::default()));
                items
            }
        }
    }

    fn build_items(
        &self,
        order: &[MenuItem],
        status: &PlayerStatus,
        query: &Query,
    ) -> Vec<MenuEntry> {
        let mut items = Vec::new();
        for item in order {
            match item {
                MenuItem::CurrentMedia => match self.current_media_entry() {
                    Ok(entry) => items.push(entry),
                    Err(err) => debug!(%err, "skipping current media entry"),
                },
                MenuItem::PlayPause => items.push(self.menu.play_pause(status)),
                MenuItem::NextTrack => items.push(self.menu.next_track()),
                MenuItem::PrevTrack => items.push(self.menu.previous_track()),
                MenuItem::Shuffle => {
                    if let Some(entry) = self.menu.shuffle(status) {
                        items.push(entry);
                    }
                }
                MenuItem::Repeat => {
                    if let Some(entry) = self.menu.repeat(status) {
                        items.push(entry);
                    }
                }
                MenuItem::Volume => items.push(self.menu.volume(query.amount())),
                MenuItem::Mute => items.push(self.menu.mute(self.mixer.next_mute_action())),
                MenuItem::PlayerSelect => items.push(self.menu.player_select()),
            }
        }
        items
    }

    fn current_media_entry(&self) -> Result<MenuEntry, CommandError> {
        let media = self.player.current_media()?;
        let thumbnail = self.cache.thumbnail_for(&media);
        Ok(self.menu.current_media(&media, thumbnail))
    }
}
