use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Up,
    Down,
    Enter,
    Back,
    Delete,
    Register,
    Retry,
    Reload,
    Char(char),
    Backspace,
    None,
}

/// `typing` is set while a text field has focus; letters then go to the field.
pub fn map_event(ev: Event, typing: bool) -> Action {
    let Event::Key(KeyEvent { code, kind, .. }) = ev else {
        return Action::None;
    };
    if kind == KeyEventKind::Release {
        return Action::None;
    }
    if typing {
        return match code {
            KeyCode::Esc => Action::Back,
            KeyCode::Enter => Action::Enter,
            KeyCode::Backspace => Action::Backspace,
            KeyCode::Char(c) => Action::Char(c),
            _ => Action::None,
        };
    }
    match code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Esc | KeyCode::Backspace => Action::Back,
        KeyCode::Up | KeyCode::Char('k') => Action::Up,
        KeyCode::Down | KeyCode::Char('j') => Action::Down,
        KeyCode::Enter => Action::Enter,
        KeyCode::Delete | KeyCode::Char('d') | KeyCode::Char('x') => Action::Delete,
        KeyCode::Char('n') => Action::Register,
        KeyCode::Char('r') => Action::Retry,
        KeyCode::Char('g') => Action::Reload,
        _ => Action::None,
    }
}
