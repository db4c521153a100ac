use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::model::{Action, Mode};

/// Maps a key press to an action for the current mode. A pending prompt
/// captures every key except Ctrl-C.
pub fn route(mode: Mode, prompting: bool, key: KeyEvent) -> Option<Action> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Action::Quit);
    }
    if prompting {
        return match key.code {
            KeyCode::Enter => Some(Action::Select),
            KeyCode::Esc => Some(Action::Back),
            KeyCode::Backspace => Some(Action::Erase),
            KeyCode::Char(c) => Some(Action::Input(c)),
            _ => None,
        };
    }

    let common = match key.code {
        KeyCode::Up | KeyCode::Char('k') => Some(Action::Up),
        KeyCode::Down | KeyCode::Char('j') => Some(Action::Down),
        KeyCode::PageUp => Some(Action::PageUp),
        KeyCode::PageDown => Some(Action::PageDown),
        KeyCode::Home => Some(Action::Top),
        KeyCode::End => Some(Action::Bottom),
        KeyCode::Enter => Some(Action::Select),
        KeyCode::Esc => Some(Action::Back),
        _ => None,
    };
    if common.is_some() {
        return common;
    }

    let KeyCode::Char(c) = key.code else {
        return None;
    };
    match (mode, c) {
        (Mode::MainMenu, 'q') => Some(Action::Quit),
        (Mode::CategoryMenu, 'r') => Some(Action::Rename),
        (Mode::CategoryMenu | Mode::Subscriptions, 'd') => Some(Action::Delete),
        (Mode::FeedList, 'm') => Some(Action::ToggleRead),
        (Mode::FeedList, 'c') => Some(Action::CycleCategory),
        (Mode::FeedList, 's') => Some(Action::CycleStatus),
        (Mode::FeedList, 'r') => Some(Action::Refresh),
        (Mode::Reader, 'q') => Some(Action::Back),
        (Mode::Reader, 'o') => Some(Action::OpenExternal),
        (Mode::Reader, 'g') => Some(Action::Top),
        (Mode::Reader, 'G') => Some(Action::Bottom),
        (Mode::Reader, ' ') => Some(Action::PageDown),
        _ => None,
    }
}
