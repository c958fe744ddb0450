use crossterm::event::KeyCode;

/// Actions while browsing the ticket table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BrowseAction {
    Quit,
    Refresh,
    MoveSelectionUp,
    MoveSelectionDown,
    OpenEdit,
    ToggleAlarm,
    EditFilter,
    ToggleHelp,
}

pub fn browse_action(key: KeyCode) -> Option<BrowseAction> {
    match key {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(BrowseAction::Quit),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(BrowseAction::Refresh),
        KeyCode::Up => Some(BrowseAction::MoveSelectionUp),
        KeyCode::Down => Some(BrowseAction::MoveSelectionDown),
        KeyCode::Enter | KeyCode::Char('e') | KeyCode::Char('E') => Some(BrowseAction::OpenEdit),
        KeyCode::Char('a') | KeyCode::Char('A') => Some(BrowseAction::ToggleAlarm),
        KeyCode::Char('f') | KeyCode::Char('F') => Some(BrowseAction::EditFilter),
        KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::Char('H') => {
            Some(BrowseAction::ToggleHelp)
        }
        _ => None,
    }
}

/// Actions inside the update dialog. Printable characters feed the focused
/// text field, so only control keys map to structural actions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DialogAction {
    Cancel,
    Submit,
    NextField,
    PrevField,
    CycleLeft,
    CycleRight,
    Backspace,
    Input(char),
}

pub fn dialog_action(key: KeyCode) -> Option<DialogAction> {
    match key {
        KeyCode::Esc => Some(DialogAction::Cancel),
        KeyCode::Enter => Some(DialogAction::Submit),
        KeyCode::Tab | KeyCode::Down => Some(DialogAction::NextField),
        KeyCode::BackTab | KeyCode::Up => Some(DialogAction::PrevField),
        KeyCode::Left => Some(DialogAction::CycleLeft),
        KeyCode::Right => Some(DialogAction::CycleRight),
        KeyCode::Backspace => Some(DialogAction::Backspace),
        KeyCode::Char(c) => Some(DialogAction::Input(c)),
        _ => None,
    }
}

/// Actions inside the date-filter editor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterAction {
    Cancel,
    Apply,
    SwitchField,
    Backspace,
    Input(char),
}

pub fn filter_action(key: KeyCode) -> Option<FilterAction> {
    match key {
        KeyCode::Esc => Some(FilterAction::Cancel),
        KeyCode::Enter => Some(FilterAction::Apply),
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
            Some(FilterAction::SwitchField)
        }
        KeyCode::Backspace => Some(FilterAction::Backspace),
        KeyCode::Char(c) => Some(FilterAction::Input(c)),
        _ => None,
    }
}
