//! Key bindings: arrows/space/r/Esc plus vim-style aliases.

use blockfall::Command;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// What a key press asks for: an engine command, quitting, or nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Engine(Command),
    Quit,
    None,
}

/// Map key event to action. Esc toggles pause; q (or Ctrl-C) quits.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent {
        code, modifiers, ..
    } = key;
    if modifiers == KeyModifiers::CONTROL {
        return match code {
            KeyCode::Char('c') => Action::Quit,
            _ => Action::None,
        };
    }
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Esc | KeyCode::Char('p') => Action::Engine(Command::PauseToggle),
        KeyCode::Left | KeyCode::Char('h') => Action::Engine(Command::MoveLeft),
        KeyCode::Right | KeyCode::Char('l') => Action::Engine(Command::MoveRight),
        KeyCode::Down | KeyCode::Char('j') => Action::Engine(Command::SoftDrop),
        KeyCode::Up | KeyCode::Char('k') => Action::Engine(Command::Rotate),
        KeyCode::Char(' ') => Action::Engine(Command::HardDrop),
        KeyCode::Char('r') | KeyCode::Char('R') => Action::Engine(Command::Reset),
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_reference_bindings() {
        assert_eq!(key_to_action(key(KeyCode::Left)), Action::Engine(Command::MoveLeft));
        assert_eq!(key_to_action(key(KeyCode::Right)), Action::Engine(Command::MoveRight));
        assert_eq!(key_to_action(key(KeyCode::Down)), Action::Engine(Command::SoftDrop));
        assert_eq!(key_to_action(key(KeyCode::Up)), Action::Engine(Command::Rotate));
        assert_eq!(key_to_action(key(KeyCode::Char(' '))), Action::Engine(Command::HardDrop));
        assert_eq!(key_to_action(key(KeyCode::Char('r'))), Action::Engine(Command::Reset));
        assert_eq!(key_to_action(key(KeyCode::Esc)), Action::Engine(Command::PauseToggle));
    }

    #[test]
    fn test_quit_and_unbound() {
        assert_eq!(key_to_action(key(KeyCode::Char('q'))), Action::Quit);
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Quit
        );
        assert_eq!(key_to_action(key(KeyCode::Char('x'))), Action::None);
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Left, KeyModifiers::ALT)),
            Action::None
        );
    }
}
