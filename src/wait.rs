use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::player::{CurrentMedia, RepeatState};

/// How often the waiter re-queries the player.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long a command gets to take visible effect before we give up and
/// render whatever state is current.
pub const MAX_WAIT: Duration = Duration::from_secs(3);

/// Poll `predicate` every [`POLL_INTERVAL`] until it holds or `max_wait`
/// elapses. Player commands are fire-and-forget at the process level; this
/// is how the menu shows the result of an action without a fixed delay.
///
/// Returns whether the predicate was observed to hold. Timing out is not an
/// error (a single-track player may never satisfy "the title changed").
pub fn wait_until(max_wait: Duration, mut predicate: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    loop {
        if predicate() {
            return true;
        }
        if start.elapsed() >= max_wait {
            debug!(?max_wait, "gave up waiting for state change");
            return false;
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// A "next" took effect once the title differs from the snapshot.
pub fn track_advanced(before: &CurrentMedia, now: &CurrentMedia) -> bool {
    now.title != before.title
}

/// A "previous" took effect once the title differs, or the title is the
/// same but a valid position moved backwards: players near the start of a
/// track restart it instead of jumping to the previous one.
pub fn track_rewound(before: &CurrentMedia, now: &CurrentMedia) -> bool {
    if now.title != before.title {
        return true;
    }
    match (before.position, now.position) {
        (Some(before_pos), Some(now_pos)) => now_pos < before_pos,
        _ => false,
    }
}

/// A repeat toggle took effect once the mode differs from the snapshot.
pub fn repeat_changed(before: RepeatState, now: RepeatState) -> bool {
    now != before
}
