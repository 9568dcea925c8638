// Event Handling
// Maps terminal key presses to reconciliation prompt events

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Prompt events a key press can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptEvent {
    /// Copy the newer file over the older one
    CopyNewer,

    /// Copy the older file over the newer one
    CopyOlder,

    /// Copy the left file over the right one (equal timestamps)
    CopyLeft,

    /// Copy the right file over the left one (equal timestamps)
    CopyRight,

    /// Write the diff beside the pair
    SaveDiff,

    /// Leave the pair divergent
    Skip,

    /// Abort the run
    Quit,

    /// No operation
    None,
}

/// Converts terminal events to prompt events
pub struct EventHandler;

impl EventHandler {
    /// Convert a crossterm event to a prompt event
    pub fn handle(event: Event) -> PromptEvent {
        match event {
            Event::Key(key) => Self::handle_key(key),
            _ => PromptEvent::None,
        }
    }

    /// Handle keyboard events
    fn handle_key(key: KeyEvent) -> PromptEvent {
        if key.kind != KeyEventKind::Press {
            return PromptEvent::None;
        }

        match key.code {
            // Raw mode swallows SIGINT, so Ctrl-C arrives as a key
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                PromptEvent::Quit
            }
            KeyCode::Char('q') | KeyCode::Esc => PromptEvent::Quit,

            KeyCode::Char('c') => PromptEvent::CopyNewer,
            KeyCode::Char('o') => PromptEvent::CopyOlder,
            KeyCode::Char('l') => PromptEvent::CopyLeft,
            KeyCode::Char('r') => PromptEvent::CopyRight,
            KeyCode::Char('w') => PromptEvent::SaveDiff,
            KeyCode::Char('s') | KeyCode::Char(' ') => PromptEvent::Skip,

            _ => PromptEvent::None,
        }
    }
}
