use std::path::Path;
use std::sync::{Arc, Mutex};

use medley::app::App;
use medley::artwork::ThumbnailCache;
use medley::menu::{Action, Query};
use medley::mixer::Mixer;
use medley::player::Player;
use medley::shell::{CommandError, CommandRunner};
use medley::theme::Theme;

const MEDIA_BEFORE: &str = "artUrl:file:///nonexistent/a.png\nartist:Beatles\ntitle:Let It Be\nalbum:Let It Be\nplayerName:spotify\nposition:5000000\n";
const MEDIA_AFTER: &str = "artUrl:file:///nonexistent/b.png\nartist:Beatles\ntitle:Get Back\nalbum:Let It Be\nplayerName:spotify\nposition:0\n";
const MEDIA_RESTARTED: &str = "artUrl:file:///nonexistent/a.png\nartist:Beatles\ntitle:Let It Be\nalbum:Let It Be\nplayerName:spotify\nposition:100\n";

/// Scripted stand-in for playerctl/pactl: answers queries from canned
/// state, flips that state when it sees a mutating command, and records
/// every argv for assertions.
struct ScriptedRunner {
    status: &'static str,
    media_after: &'static str,
    skipped: Mutex<bool>,
    loop_set: Mutex<bool>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedRunner {
    fn new(status: &'static str) -> Arc<Self> {
        Self::with_media_after(status, MEDIA_AFTER)
    }

    fn with_media_after(status: &'static str, media_after: &'static str) -> Arc<Self> {
        Arc::new(Self {
            status,
            media_after,
            skipped: Mutex::new(false),
            loop_set: Mutex::new(false),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[&str], _check: bool) -> Result<String, CommandError> {
        self.calls
            .lock()
            .unwrap()
            .push(args.iter().map(|a| a.to_string()).collect());

        if program == "pactl" {
            return Ok(String::new());
        }

        if args.contains(&"next") || args.contains(&"previous") {
            *self.skipped.lock().unwrap() = true;
            return Ok(String::new());
        }
        if args.contains(&"playlist") {
            *self.loop_set.lock().unwrap() = true;
            return Ok(String::new());
        }

        if args.contains(&"metadata") {
            let moved = *self.skipped.lock().unwrap();
            return Ok(if moved { self.media_after } else { MEDIA_BEFORE }.to_string());
        }
        if args.contains(&"-l") {
            return Ok("spotify\nfirefox.instance_1\n".to_string());
        }
        if args.last() == Some(&"status") {
            return Ok(self.status.to_string());
        }
        if args.last() == Some(&"shuffle") {
            return Ok("Off\n".to_string());
        }
        if args.last() == Some(&"loop") {
            let set = *self.loop_set.lock().unwrap();
            return Ok(if set { "Playlist\n" } else { "None\n" }.to_string());
        }

        Ok(String::new())
    }
}

struct Shared(Arc<ScriptedRunner>);

impl CommandRunner for Shared {
    fn run(&self, program: &str, args: &[&str], check: bool) -> Result<String, CommandError> {
        self.0.run(program, args, check)
    }
}

fn test_app(runner: &Arc<ScriptedRunner>, cache_dir: &Path) -> App {
    App::with_parts(
        Player::with_runner(Box::new(Shared(runner.clone()))),
        Mixer::with_runner(Box::new(Shared(runner.clone()))),
        ThumbnailCache::new(cache_dir.to_path_buf()),
        Theme::Light,
    )
}

#[test]
fn main_menu_renders_in_default_order() {
    let dir = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new("Playing\n");
    let app = test_app(&runner, dir.path());

    let entries = app.render("");
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();

    assert_eq!(
        names,
        vec![
            "Let It Be",
            "Pause",
            "Next Track",
            "Previous Track",
            "Shuffle Off",
            "Repeat: Off",
            "Volume",
            "Mute",
            "Change player",
        ]
    );
}

#[test]
fn current_media_entry_falls_back_when_art_is_missing() {
    let dir = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new("Playing\n");
    let app = test_app(&runner, dir.path());

    let entries = app.render("");
    assert_eq!(entries[0].icon, Path::new("images/icon.png"));
    assert_eq!(entries[0].description, "By Beatles | Let It Be | Spotify");
}

#[test]
fn alias_query_renders_just_that_entry() {
    let dir = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new("Playing\n");
    let app = test_app(&runner, dir.path());

    let entries = app.render("n");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "Next Track");
}

#[test]
fn query_terms_filter_the_menu() {
    let dir = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new("Playing\n");
    let app = test_app(&runner, dir.path());

    let entries = app.render("track");
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Next Track", "Previous Track"]);
}

#[test]
fn no_player_offers_only_volume_and_mute() {
    let dir = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new("No players found\n");
    let app = test_app(&runner, dir.path());

    let entries = app.render("");
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["No Media Playing", "Volume", "Mute"]);
}

#[test]
fn unparseable_status_renders_the_error_entry() {
    let dir = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new("Stopped\n");
    let app = test_app(&runner, dir.path());

    let entries = app.render("");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "Could not fetch current media");
}

#[test]
fn next_waits_for_the_title_change_and_rerenders() {
    let dir = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new("Playing\n");
    let mut app = test_app(&runner, dir.path());

    let entries = app.dispatch(Action::Next, &Query::default()).unwrap();
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();

    assert_eq!(names, vec!["Next Track", "Get Back"]);
}

#[test]
fn previous_accepts_a_restart_of_the_same_track() {
    let dir = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::with_media_after("Playing\n", MEDIA_RESTARTED);
    let mut app = test_app(&runner, dir.path());

    let entries = app.dispatch(Action::Prev, &Query::default()).unwrap();
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();

    // Same title, earlier position: the waiter treats that as "previous
    // worked" instead of stalling until the timeout.
    assert_eq!(names, vec!["Previous Track", "Let It Be"]);
}

#[test]
fn repeat_cycles_and_rerenders_the_new_mode() {
    let dir = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new("Playing\n");
    let mut app = test_app(&runner, dir.path());

    let entries = app.dispatch(Action::Repeat, &Query::default()).unwrap();
    assert_eq!(entries[0].name, "Repeat: Playlist");

    let calls = runner.calls();
    assert!(calls
        .iter()
        .any(|argv| argv.ends_with(&["loop".to_string(), "playlist".to_string()])));
}

#[test]
fn volume_sets_the_sink_after_unmuting() {
    let dir = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new("Playing\n");
    let mut app = test_app(&runner, dir.path());

    let entries = app
        .dispatch(Action::Volume, &Query::parse("50"))
        .unwrap();
    assert!(entries.is_empty());

    let calls = runner.calls();
    assert!(calls.contains(&vec![
        "set-sink-mute".to_string(),
        "@DEFAULT_SINK@".to_string(),
        "0".to_string()
    ]));
    assert!(calls.contains(&vec![
        "set-sink-volume".to_string(),
        "@DEFAULT_SINK@".to_string(),
        "50%".to_string()
    ]));
}

#[test]
fn unparseable_volume_amount_touches_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new("Playing\n");
    let mut app = test_app(&runner, dir.path());

    let entries = app
        .dispatch(Action::Volume, &Query::parse("loud"))
        .unwrap();
    assert!(entries.is_empty());

    let calls = runner.calls();
    assert!(!calls.iter().any(|argv| argv
        .first()
        .is_some_and(|arg| arg.starts_with("set-sink"))));
}

#[test]
fn players_action_lists_registered_players() {
    let dir = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new("Playing\n");
    let mut app = test_app(&runner, dir.path());

    let entries = app.dispatch(Action::Players, &Query::default()).unwrap();
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Spotify", "Firefox"]);
    assert_eq!(entries[1].argument.as_deref(), Some("firefox.instance_1"));
}

#[test]
fn select_player_runs_the_wake_and_resume_dance() {
    let dir = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new("Playing\n");
    let mut app = test_app(&runner, dir.path());

    app.dispatch(Action::SelectPlayer, &Query::parse("firefox.instance_1"))
        .unwrap();

    let calls = runner.calls();
    let tail: Vec<Vec<String>> = calls.iter().rev().take(4).rev().cloned().collect();
    assert_eq!(tail[0], vec!["--all-players", "pause"]);
    assert_eq!(tail[1], vec!["-p", "firefox.instance_1", "play"]);
    assert_eq!(tail[2], vec!["-p", "firefox.instance_1", "pause"]);
    assert_eq!(tail[3], vec!["-p", "firefox.instance_1", "play-pause"]);
}

#[test]
fn mute_toggle_issues_the_sink_mute_call() {
    let dir = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new("Playing\n");
    let mut app = test_app(&runner, dir.path());

    app.dispatch(Action::Mute, &Query::default()).unwrap();

    let calls = runner.calls();
    assert!(calls.contains(&vec![
        "set-sink-mute".to_string(),
        "@DEFAULT_SINK@".to_string(),
        "1".to_string()
    ]));
}
