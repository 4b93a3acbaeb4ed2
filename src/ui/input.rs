/// Input collector.
///
/// Every action in the game is a discrete key press, so this drains the
/// terminal queue once per frame and exposes the presses as edge events.
/// Release and Repeat events are dropped; holding a letter key must not
/// machine-gun it into the buffer.

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, poll};

pub struct InputState {
    /// Key events that arrived this frame (Press kind only).
    presses: Vec<KeyEvent>,
}

impl InputState {
    pub fn new() -> Self {
        InputState { presses: Vec::with_capacity(8) }
    }

    /// Drain all pending terminal events without blocking.
    /// Call once per frame, before the tick.
    pub fn drain_events(&mut self) {
        self.presses.clear();
        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                if key.kind != KeyEventKind::Release && key.kind != KeyEventKind::Repeat {
                    self.presses.push(key);
                }
            }
        }
    }

    /// Was this key pressed this frame?
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.presses.iter().any(|k| k.code == code)
    }

    /// Convenience: was any of these keys pressed?
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    /// Did any key at all arrive this frame? ("press any key" screens)
    pub fn anything_pressed(&self) -> bool {
        !self.presses.is_empty()
    }

    /// First plain letter pressed this frame, uppercased.
    /// Ignores letters with Control/Alt held so shortcuts stay shortcuts.
    pub fn pressed_letter(&self) -> Option<char> {
        self.presses.iter().find_map(|k| {
            if k.modifiers.contains(KeyModifiers::CONTROL)
                || k.modifiers.contains(KeyModifiers::ALT)
            {
                return None;
            }
            match k.code {
                KeyCode::Char(c) if c.is_ascii_alphabetic() => Some(c.to_ascii_uppercase()),
                _ => None,
            }
        })
    }

    /// Ctrl+C arrived this frame (raw mode swallows the signal).
    pub fn ctrl_c_pressed(&self) -> bool {
        self.presses.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}
