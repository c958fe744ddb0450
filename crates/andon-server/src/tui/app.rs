use crate::state::AppState;
use crate::tui::snapshot::UiSnapshot;
use andon_core::draft::{self, compose_update, EvidenceFile, TicketUpdate, UpdateDraft};
use andon_core::types::Ticket;
use chrono::NaiveDate;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// How long the success state stays on screen before the dialog closes
/// itself and the refetch goes out.
pub const DIALOG_AUTOCLOSE: Duration = Duration::from_millis(1500);

const DATE_INPUT_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DialogField {
    Pic,
    Status,
    Evidence,
}

/// Modal editor over one ticket. Holds the row it was seeded from so the
/// submission can carry existing evidence forward.
pub struct EditDialog {
    pub original: Ticket,
    pub draft: UpdateDraft,
    pub field: DialogField,
    pub evidence_input: String,
    pub submitting: bool,
    pub error: Option<String>,
    pub succeeded_at: Option<Instant>,
}

impl EditDialog {
    pub fn new(ticket: Ticket) -> Self {
        let draft = UpdateDraft::from_ticket(&ticket);
        Self {
            original: ticket,
            draft,
            field: DialogField::Pic,
            evidence_input: String::new(),
            submitting: false,
            error: None,
            succeeded_at: None,
        }
    }

    pub fn next_field(&mut self) {
        self.field = match self.field {
            DialogField::Pic => DialogField::Status,
            DialogField::Status => DialogField::Evidence,
            DialogField::Evidence => DialogField::Pic,
        };
    }

    pub fn prev_field(&mut self) {
        self.field = match self.field {
            DialogField::Pic => DialogField::Evidence,
            DialogField::Status => DialogField::Pic,
            DialogField::Evidence => DialogField::Status,
        };
    }

    pub fn input(&mut self, c: char) {
        if self.is_locked() {
            return;
        }
        match self.field {
            DialogField::Pic => self.draft.pic_security.push(c),
            DialogField::Evidence => self.evidence_input.push(c),
            DialogField::Status => {}
        }
    }

    pub fn backspace(&mut self) {
        if self.is_locked() {
            return;
        }
        match self.field {
            DialogField::Pic => {
                self.draft.pic_security.pop();
            }
            DialogField::Evidence => {
                self.evidence_input.pop();
            }
            DialogField::Status => {}
        }
    }

    pub fn cycle_status(&mut self, forward: bool) {
        if self.is_locked() || self.field != DialogField::Status {
            return;
        }
        self.draft.status_ticket = if forward {
            self.draft.status_ticket.next()
        } else {
            self.draft.status_ticket.prev()
        };
    }

    pub fn can_submit(&self) -> bool {
        !self.is_locked()
    }

    /// A submission in flight or already acknowledged freezes the form.
    fn is_locked(&self) -> bool {
        self.submitting || self.succeeded_at.is_some()
    }

    pub fn mark_submitting(&mut self) {
        self.submitting = true;
        self.error = None;
    }

    pub fn mark_succeeded(&mut self) {
        self.submitting = false;
        self.succeeded_at = Some(Instant::now());
    }

    pub fn mark_failed(&mut self, error: String) {
        self.submitting = false;
        self.error = Some(error);
    }

    /// True once the success state has been shown long enough for the
    /// dialog to close itself.
    pub fn should_autoclose(&self) -> bool {
        self.succeeded_at
            .map(|at| at.elapsed() >= DIALOG_AUTOCLOSE)
            .unwrap_or(false)
    }

    /// Resolve the typed evidence path and compose the request. An
    /// unsupported file type blocks the submission with an inline error.
    pub fn prepare_update(&mut self, now: &str) -> Result<TicketUpdate, String> {
        let trimmed = self.evidence_input.trim();
        if trimmed.is_empty() {
            self.draft.evidence_file = None;
        } else {
            if !draft::is_supported_evidence(trimmed) {
                return Err("Evidence must be a JPG, JPEG or PNG image".to_string());
            }
            let path = PathBuf::from(trimmed);
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .ok_or_else(|| "Evidence path has no file name".to_string())?;
            self.draft.evidence_file = Some(EvidenceFile { file_name, path });
        }
        Ok(compose_update(&self.draft, &self.original, now))
    }
}

/// Inline editor for the fetch date window.
pub struct FilterEditor {
    pub start_input: String,
    pub end_input: String,
    pub editing_end: bool,
    pub error: Option<String>,
}

impl FilterEditor {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start_input: start.format(DATE_INPUT_FORMAT).to_string(),
            end_input: end.format(DATE_INPUT_FORMAT).to_string(),
            editing_end: false,
            error: None,
        }
    }

    pub fn switch_field(&mut self) {
        self.editing_end = !self.editing_end;
    }

    pub fn input(&mut self, c: char) {
        self.active_field().push(c);
    }

    pub fn backspace(&mut self) {
        self.active_field().pop();
    }

    fn active_field(&mut self) -> &mut String {
        if self.editing_end {
            &mut self.end_input
        } else {
            &mut self.start_input
        }
    }

    pub fn parse(&self) -> Result<(NaiveDate, NaiveDate), String> {
        let start = NaiveDate::parse_from_str(self.start_input.trim(), DATE_INPUT_FORMAT)
            .map_err(|_| format!("Invalid start date '{}'", self.start_input.trim()))?;
        let end = NaiveDate::parse_from_str(self.end_input.trim(), DATE_INPUT_FORMAT)
            .map_err(|_| format!("Invalid end date '{}'", self.end_input.trim()))?;
        Ok((start, end))
    }
}

pub struct TuiApp {
    pub state: AppState,
    pub selected_index: usize,
    pub dialog: Option<EditDialog>,
    pub filter: Option<FilterEditor>,
    pub show_help: bool,
    pub notification: Option<(String, Instant)>,
}

impl TuiApp {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            selected_index: 0,
            dialog: None,
            filter: None,
            show_help: false,
            notification: None,
        }
    }

    pub fn move_selection_up(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
        }
    }

    pub fn move_selection_down(&mut self, snapshot: &UiSnapshot) {
        if !snapshot.tickets.is_empty() && self.selected_index + 1 < snapshot.tickets.len() {
            self.selected_index += 1;
        }
    }

    /// Clamp the cursor after a refresh shrank the collection.
    pub fn clamp_selection(&mut self, len: usize) {
        if len == 0 {
            self.selected_index = 0;
        } else if self.selected_index >= len {
            self.selected_index = len - 1;
        }
    }

    pub fn open_edit(&mut self, snapshot: &UiSnapshot) -> bool {
        self.clamp_selection(snapshot.tickets.len());
        match snapshot.tickets.get(self.selected_index) {
            Some(ticket) => {
                self.dialog = Some(EditDialog::new(ticket.clone()));
                true
            }
            None => false,
        }
    }

    pub fn close_dialog(&mut self) {
        self.dialog = None;
    }

    pub fn notify(&mut self, message: impl Into<String>) {
        self.notification = Some((message.into(), Instant::now()));
    }

    pub fn expire_notification(&mut self) {
        if let Some((_, at)) = &self.notification {
            if at.elapsed().as_secs() >= 3 {
                self.notification = None;
            }
        }
    }
}
