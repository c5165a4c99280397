use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Events that can occur in the monitor TUI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorEvent {
    /// Quit the application
    Quit,
    /// Toggle help overlay
    ToggleHelp,
    CursorUp,
    CursorDown,
    PageUp,
    PageDown,
    Home,
    End,
    /// Expand the selected process
    Expand,
    /// Collapse the selected process (or its parent)
    Collapse,
    ExpandAll,
    /// Suspend or resume automatic refresh
    ToggleFreeze,
    /// Switch to the next sort metric
    CycleSort,
    /// Refresh immediately
    Refresh,
    /// Write a JSON snapshot of the visible rows
    Export,
    StartSearch,
    SearchInput(char),
    SearchBackspace,
    /// Leave search keeping the filter
    SearchCommit,
    /// Leave search and clear the filter
    SearchCancel,
    /// No action
    None,
}

/// Translate a key press into an event. Search mode captures printable keys.
pub fn map_key(key: KeyEvent, search_mode: bool) -> MonitorEvent {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return MonitorEvent::Quit;
    }

    if search_mode {
        return match key.code {
            KeyCode::Esc => MonitorEvent::SearchCancel,
            KeyCode::Enter => MonitorEvent::SearchCommit,
            KeyCode::Backspace => MonitorEvent::SearchBackspace,
            KeyCode::Char(c) if !c.is_control() => MonitorEvent::SearchInput(c),
            _ => MonitorEvent::None,
        };
    }

    match key.code {
        KeyCode::Char('q') => MonitorEvent::Quit,
        KeyCode::Char('?') => MonitorEvent::ToggleHelp,
        KeyCode::Up | KeyCode::Char('k') => MonitorEvent::CursorUp,
        KeyCode::Down | KeyCode::Char('j') => MonitorEvent::CursorDown,
        KeyCode::PageUp => MonitorEvent::PageUp,
        KeyCode::PageDown => MonitorEvent::PageDown,
        KeyCode::Home | KeyCode::Char('g') => MonitorEvent::Home,
        KeyCode::End | KeyCode::Char('G') => MonitorEvent::End,
        KeyCode::Right | KeyCode::Char('l') => MonitorEvent::Expand,
        KeyCode::Left | KeyCode::Char('h') => MonitorEvent::Collapse,
        KeyCode::Char('*') => MonitorEvent::ExpandAll,
        KeyCode::Char('f') => MonitorEvent::ToggleFreeze,
        KeyCode::Char('s') => MonitorEvent::CycleSort,
        KeyCode::Char('r') => MonitorEvent::Refresh,
        KeyCode::Char('x') => MonitorEvent::Export,
        KeyCode::Char('/') => MonitorEvent::StartSearch,
        _ => MonitorEvent::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_normal_mode_keys() {
        assert_eq!(map_key(key(KeyCode::Char('q')), false), MonitorEvent::Quit);
        assert_eq!(map_key(key(KeyCode::Char('j')), false), MonitorEvent::CursorDown);
        assert_eq!(map_key(key(KeyCode::Left), false), MonitorEvent::Collapse);
        assert_eq!(map_key(key(KeyCode::Char('/')), false), MonitorEvent::StartSearch);
        assert_eq!(map_key(key(KeyCode::Esc), false), MonitorEvent::None);
    }

    #[test]
    fn test_search_mode_captures_letters() {
        assert_eq!(map_key(key(KeyCode::Char('q')), true), MonitorEvent::SearchInput('q'));
        assert_eq!(map_key(key(KeyCode::Char('/')), true), MonitorEvent::SearchInput('/'));
        assert_eq!(map_key(key(KeyCode::Esc), true), MonitorEvent::SearchCancel);
        assert_eq!(map_key(key(KeyCode::Enter), true), MonitorEvent::SearchCommit);
        assert_eq!(map_key(key(KeyCode::Backspace), true), MonitorEvent::SearchBackspace);
    }

    #[test]
    fn test_ctrl_c_always_quits() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(ctrl_c, true), MonitorEvent::Quit);
        assert_eq!(map_key(ctrl_c, false), MonitorEvent::Quit);
    }
}
