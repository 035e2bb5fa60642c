//! `standings --watch`: keep the leaderboard on screen and redraw it whenever
//! the competition changes.
//!
//! Two things can wake the loop: the store's revision signal (a write in this
//! process) and a reload timer that re-reads the data file so edits from
//! another shell show up too. A reload that finds new content bumps the
//! revision itself, so all redraws funnel through the one signal. Ctrl-C
//! exits.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::store::{CompetitionStore, JsonFileStore};

/// Run the watch loop until ctrl-c. `render` pulls fresh collections and
/// returns the full screen contents; it runs once up front and then once per
/// revision change.
pub async fn run_watch(
    store: Arc<JsonFileStore>,
    interval: Duration,
    mut render: impl FnMut() -> Result<String>,
) -> Result<()> {
    let mut revision = store.subscribe();
    redraw(&mut render)?;

    let mut reload_timer = tokio::time::interval(interval);
    reload_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // The first tick fires immediately; we just drew.
    reload_timer.tick().await;

    loop {
        tokio::select! {
            changed = revision.changed() => {
                if changed.is_err() {
                    break;
                }
                redraw(&mut render)?;
            }
            _ = reload_timer.tick() => {
                // A transient read failure (file mid-replace) is not worth
                // tearing the screen down for; the next tick retries.
                match store.reload() {
                    Ok(true) => debug!("data file changed on disk"),
                    Ok(false) => {}
                    Err(e) => warn!("reload failed: {}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }
    Ok(())
}

fn redraw(render: &mut impl FnMut() -> Result<String>) -> Result<()> {
    // ANSI clear screen + cursor home.
    print!("\x1b[2J\x1b[H");
    println!("{}", render()?);
    Ok(())
}
