// Interactive Prompt
// Shows each differing pair and reads a single-key decision from the terminal

use crossterm::event::{self, Event};
use crossterm::terminal;
use std::io::{self, Write};
use tracing::debug;

use super::diff_view::render_review;
use super::{render_overview, Styles};
use crate::core::{EventHandler, PromptEvent};
use crate::errors::{SyncerError, SyncerResult};
use crate::operations::{
    Decision, DecisionProvider, Freshness, OverviewEntry, PairReview, Side,
};

/// Restores cooked mode when dropped, including on early return
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Action line for a pair
pub fn actions_line(freshness: Freshness) -> &'static str {
    match freshness {
        Freshness::Tie => {
            "[l]eft over right; [r]ight over left; [w]rite diff file; [s]kip; [q]uit"
        }
        _ => "[c]opy newer over older; copy [o]lder over newer; [w]rite diff file; [s]kip; [q]uit",
    }
}

fn valid_keys(freshness: Freshness) -> &'static str {
    match freshness {
        Freshness::Tie => "[lrwsq]",
        _ => "[cowsq]",
    }
}

/// Map a prompt event to a decision for a pair with the given freshness
///
/// `Ok(None)` means the key does not apply here and the prompt repeats.
pub fn decision_for(event: PromptEvent, freshness: Freshness) -> SyncerResult<Option<Decision>> {
    let tie = freshness == Freshness::Tie;
    Ok(match event {
        PromptEvent::CopyNewer => Decision::copy_newer(freshness),
        PromptEvent::CopyOlder => Decision::copy_older(freshness),
        PromptEvent::CopyLeft if tie => Some(Decision::Copy { from: Side::Left }),
        PromptEvent::CopyRight if tie => Some(Decision::Copy { from: Side::Right }),
        PromptEvent::CopyLeft | PromptEvent::CopyRight => None,
        PromptEvent::SaveDiff => Some(Decision::SaveDiff),
        PromptEvent::Skip => Some(Decision::Skip),
        PromptEvent::Quit => return Err(SyncerError::Interrupted),
        PromptEvent::None => None,
    })
}

/// Decision provider backed by the controlling terminal
pub struct TerminalPrompt<W: Write> {
    out: W,
}

impl<W: Write> TerminalPrompt<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Block until a key press arrives, with raw mode held only for the read
    fn read_event() -> io::Result<Event> {
        let _guard = RawModeGuard::enable()?;
        event::read()
    }

    fn ask(&mut self, freshness: Freshness) -> io::Result<SyncerResult<Decision>> {
        writeln!(self.out, "{}", Styles::actions().apply(actions_line(freshness)))?;
        loop {
            self.out.flush()?;
            let event = EventHandler::handle(Self::read_event()?);
            match decision_for(event, freshness) {
                Ok(Some(decision)) => {
                    debug!(?decision, "operator decided");
                    return Ok(Ok(decision));
                }
                Ok(None) if event == PromptEvent::None => {
                    // Releases, resizes and unbound keys land here
                    continue;
                }
                Ok(None) => {
                    writeln!(
                        self.out,
                        "Please press one of the keys {}",
                        valid_keys(freshness)
                    )?;
                }
                Err(e) => return Ok(Err(e)),
            }
        }
    }
}

impl<W: Write> DecisionProvider for TerminalPrompt<W> {
    fn overview(&mut self, entries: &[OverviewEntry]) -> SyncerResult<()> {
        render_overview(&mut self.out, entries).map_err(SyncerError::Terminal)
    }

    fn decide(&mut self, review: &PairReview<'_>) -> SyncerResult<Decision> {
        render_review(&mut self.out, review).map_err(SyncerError::Terminal)?;
        self.ask(review.freshness).map_err(SyncerError::Terminal)?
    }
}
