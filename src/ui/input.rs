/// Input state tracker.
///
/// Collects the key presses that arrived since the previous frame, in
/// arrival order. Snake steering is edge-triggered: every arrow press is
/// one direction request, so two quick presses between ticks both count.
///
/// Release events (only reported with keyboard enhancement) are ignored.

use std::time::Duration;

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::entity::Direction;

pub struct InputState {
    /// Keys pressed during the most recent drain_events() call.
    presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for meta-key handling.
    pub raw_events: Vec<KeyEvent>,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
        }
    }

    /// Drain all pending terminal events and record key presses.
    /// Call this once per frame, before polling the tick scheduler.
    pub fn drain_events(&mut self) {
        self.presses.clear();
        self.raw_events.clear();

        // Read all available events without blocking
        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(ev) => self.record(ev),
                Err(_) => break,
            }
        }
    }

    /// Feed one terminal event. Non-key events are ignored.
    pub fn record(&mut self, ev: Event) {
        if let Event::Key(key) = ev {
            self.raw_events.push(key);
            if key.kind != KeyEventKind::Release {
                self.presses.push(key.code);
            }
        }
    }

    /// Keys pressed this frame, oldest first.
    #[cfg(test)]
    pub fn presses(&self) -> &[KeyCode] {
        &self.presses
    }

    /// Was this key pressed this frame?
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.presses.contains(&code)
    }

    /// Convenience: was any of these keys pressed?
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    /// Direction requests of this frame, in the order they were typed.
    pub fn directions(&self) -> impl Iterator<Item = Direction> + '_ {
        self.presses.iter().filter_map(|&code| key_to_direction(code))
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}

/// The four arrow keys steer; nothing else does.
pub fn key_to_direction(code: KeyCode) -> Option<Direction> {
    match code {
        KeyCode::Up => Some(Direction::Up),
        KeyCode::Down => Some(Direction::Down),
        KeyCode::Left => Some(Direction::Left),
        KeyCode::Right => Some(Direction::Right),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn only_arrows_map_to_directions() {
        assert_eq!(key_to_direction(KeyCode::Up), Some(Direction::Up));
        assert_eq!(key_to_direction(KeyCode::Down), Some(Direction::Down));
        assert_eq!(key_to_direction(KeyCode::Left), Some(Direction::Left));
        assert_eq!(key_to_direction(KeyCode::Right), Some(Direction::Right));
        for code in [KeyCode::Char('w'), KeyCode::Char('a'), KeyCode::Enter, KeyCode::Esc, KeyCode::F(1)] {
            assert_eq!(key_to_direction(code), None);
        }
    }

    #[test]
    fn directions_keep_arrival_order() {
        let mut kb = InputState::new();
        kb.record(press(KeyCode::Up));
        kb.record(press(KeyCode::Char('x')));
        kb.record(press(KeyCode::Left));
        let dirs: Vec<Direction> = kb.directions().collect();
        assert_eq!(dirs, vec![Direction::Up, Direction::Left]);
    }

    #[test]
    fn releases_are_not_presses() {
        let mut kb = InputState::new();
        kb.record(Event::Key(KeyEvent::new_with_kind(
            KeyCode::Up, KeyModifiers::NONE, KeyEventKind::Release,
        )));
        assert!(!kb.was_pressed(KeyCode::Up));
        assert_eq!(kb.raw_events.len(), 1);
    }

    #[test]
    fn ctrl_c_detected() {
        let mut kb = InputState::new();
        kb.record(Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(kb.ctrl_c_pressed());
        assert!(!kb.any_pressed(&[KeyCode::Enter]));
    }

    #[test]
    fn non_key_events_ignored() {
        let mut kb = InputState::new();
        kb.record(Event::Resize(80, 24));
        kb.record(Event::FocusGained);
        assert!(kb.presses().is_empty());
    }
}
