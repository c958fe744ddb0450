use crate::tui::app::{DialogField, EditDialog, FilterEditor};
use crate::tui::snapshot::{EventLine, UiSnapshot};
use andon_core::alarm::AlarmState;
use andon_core::types::TicketStatus;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};
use ratatui::Frame;

#[derive(Clone, Copy, Debug)]
pub enum EventColor {
    Normal,
    Error,
    Warning,
    Info,
}

impl EventColor {
    pub fn to_color(self) -> Color {
        match self {
            EventColor::Normal => Color::White,
            EventColor::Error => Color::Red,
            EventColor::Warning => Color::Yellow,
            EventColor::Info => Color::Cyan,
        }
    }
}

pub fn status_color(status: TicketStatus) -> Color {
    match status {
        TicketStatus::Open => Color::Red,
        TicketStatus::Process => Color::Yellow,
        TicketStatus::Closed => Color::Green,
        TicketStatus::Unknown(_) => Color::DarkGray,
    }
}

pub fn render_filter_bar(f: &mut Frame, area: Rect, snapshot: &UiSnapshot) {
    let refresh_status = if snapshot.refreshing {
        Span::styled("⟳ refreshing...", Style::default().fg(Color::Cyan))
    } else if let Some(ts) = snapshot.last_fetch_at {
        Span::styled(
            format!("Last updated {}", ts.format("%H:%M:%S")),
            Style::default().fg(Color::DarkGray),
        )
    } else {
        Span::styled("Waiting for first fetch...", Style::default().fg(Color::DarkGray))
    };

    let lines = vec![
        Line::from(vec![
            Span::raw("Window: "),
            Span::styled(
                snapshot.query.start_date.format("%Y-%m-%d").to_string(),
                Style::default().fg(Color::Cyan),
            ),
            Span::raw(" to "),
            Span::styled(
                snapshot.query.end_date.format("%Y-%m-%d").to_string(),
                Style::default().fg(Color::Cyan),
            ),
            Span::raw(format!("  │  Status filter: {}", snapshot.query.status)),
            Span::raw("  │  [F] change"),
        ]),
        Line::from(vec![
            refresh_status,
            Span::raw(format!(
                "  │  auto-refresh every {}s",
                snapshot.interval_secs
            )),
        ]),
    ];

    let block = Block::default().borders(Borders::ALL).title("Ticket Filter");
    let paragraph = Paragraph::new(lines).block(block).alignment(Alignment::Left);
    f.render_widget(paragraph, area);
}

pub fn render_summary_cards(f: &mut Frame, area: Rect, snapshot: &UiSnapshot) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(34),
            Constraint::Percentage(33),
            Constraint::Percentage(33),
        ])
        .split(area);

    let open_caption = if snapshot.summary.has_open() {
        "⚠ requiring immediate attention"
    } else {
        "no open tickets"
    };
    render_summary_card(
        f,
        chunks[0],
        "Open Tickets",
        snapshot.summary.open,
        Color::Red,
        open_caption,
        snapshot.summary.has_open(),
    );
    render_summary_card(
        f,
        chunks[1],
        "In Process",
        snapshot.summary.process,
        Color::Yellow,
        "being worked by security",
        false,
    );
    render_summary_card(
        f,
        chunks[2],
        "Closed",
        snapshot.summary.closed,
        Color::Green,
        "resolved this window",
        false,
    );
}

fn render_summary_card(
    f: &mut Frame,
    area: Rect,
    title: &str,
    count: usize,
    color: Color,
    caption: &str,
    emphasize: bool,
) {
    let count_style = if emphasize {
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(color)
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(count.to_string(), count_style)),
        Line::from(Span::styled(caption, Style::default().fg(Color::DarkGray))),
    ];

    let border_style = if emphasize {
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(color)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(border_style);
    let paragraph = Paragraph::new(lines).block(block).alignment(Alignment::Center);
    f.render_widget(paragraph, area);
}

pub fn render_ticket_table(f: &mut Frame, area: Rect, snapshot: &UiSnapshot, selected: usize) {
    let rows: Vec<Row> = snapshot
        .rows
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let bg = if idx == selected {
                Color::Blue
            } else {
                Color::Reset
            };
            let evidence = if row.has_evidence { "yes" } else { "-" };
            Row::new(vec![
                Cell::from(row.id_ticket.clone()).style(Style::default().bg(bg)),
                Cell::from(row.created.clone()).style(Style::default().bg(bg)),
                Cell::from(row.department.clone()).style(Style::default().bg(bg)),
                Cell::from(row.pic.clone()).style(Style::default().bg(bg)),
                Cell::from(row.status.label())
                    .style(Style::default().fg(status_color(row.status)).bg(bg)),
                Cell::from(row.updated.clone()).style(Style::default().bg(bg)),
                Cell::from(evidence).style(Style::default().bg(bg)),
            ])
        })
        .collect();

    let title = format!("Tickets ({})", snapshot.rows.len());
    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Length(18),
            Constraint::Min(14),
            Constraint::Length(16),
            Constraint::Length(9),
            Constraint::Length(18),
            Constraint::Length(8),
        ],
    )
    .header(
        Row::new(vec![
            Cell::from("Ticket"),
            Cell::from("Created"),
            Cell::from("Department"),
            Cell::from("PIC Security"),
            Cell::from("Status"),
            Cell::from("Updated"),
            Cell::from("Evidence"),
        ])
        .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().borders(Borders::ALL).title(title));

    f.render_widget(table, area);
}

pub fn render_event_log(f: &mut Frame, area: Rect, events: &[EventLine]) {
    let log_lines: Vec<Line> = events
        .iter()
        .rev()
        .take(30)
        .map(|entry| {
            let time_str = entry.timestamp.format("%H:%M:%S").to_string();
            Line::from(vec![
                Span::styled(format!("{} ", time_str), Style::default().fg(Color::DarkGray)),
                Span::styled(entry.text.clone(), Style::default().fg(entry.color.to_color())),
            ])
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Last Events (most recent first)");
    let paragraph = Paragraph::new(log_lines).block(block).alignment(Alignment::Left);
    f.render_widget(paragraph, area);
}

pub fn render_error_banner(f: &mut Frame, area: Rect, error: &str) {
    let line = Line::from(vec![
        Span::styled("✗ ", Style::default().fg(Color::Red)),
        Span::styled(error, Style::default().fg(Color::Red)),
        Span::styled(
            "  (showing last good data)",
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));
    let paragraph = Paragraph::new(vec![line]).block(block).alignment(Alignment::Left);
    f.render_widget(paragraph, area);
}

pub fn render_edit_dialog(f: &mut Frame, area: Rect, dialog: &EditDialog, evidence_url: Option<&str>) {
    let focused = |field: DialogField| {
        if dialog.field == field {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default().fg(Color::White)
        }
    };

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::raw("  Department:   "),
            Span::styled(
                dialog.draft.department.clone(),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        Line::from(vec![
            Span::raw("  PIC Security: "),
            Span::styled(
                format!(" {} ", dialog.draft.pic_security),
                focused(DialogField::Pic),
            ),
        ]),
        Line::from(vec![
            Span::raw("  Status:       "),
            Span::styled(
                format!("◀ {} ▶", dialog.draft.status_ticket.label()),
                focused(DialogField::Status).fg(if dialog.field == DialogField::Status {
                    Color::Black
                } else {
                    status_color(dialog.draft.status_ticket)
                }),
            ),
        ]),
        Line::from(vec![
            Span::raw("  Evidence:     "),
            Span::styled(
                format!(" {} ", dialog.evidence_input),
                focused(DialogField::Evidence),
            ),
        ]),
    ];

    if let Some(url) = evidence_url {
        lines.push(Line::from(vec![
            Span::raw("  Current:      "),
            Span::styled(url, Style::default().fg(Color::DarkGray)),
        ]));
    } else {
        lines.push(Line::from(vec![
            Span::raw("  Current:      "),
            Span::styled("no evidence uploaded", Style::default().fg(Color::DarkGray)),
        ]));
    }

    lines.push(Line::from(""));
    if dialog.succeeded_at.is_some() {
        lines.push(Line::from(Span::styled(
            "  ✓ Ticket updated successfully!",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )));
    } else if dialog.submitting {
        lines.push(Line::from(Span::styled(
            "  Submitting...",
            Style::default().fg(Color::Cyan),
        )));
    } else if let Some(error) = &dialog.error {
        lines.push(Line::from(Span::styled(
            format!("  ✗ {}", error),
            Style::default().fg(Color::Red),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            "  [Tab] field  [◀▶] status  [Enter] submit  [Esc] cancel",
            Style::default().fg(Color::DarkGray),
        )));
    }

    let title = format!("Update Ticket #{}", dialog.draft.id_ticket);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(Color::Cyan));
    let paragraph = Paragraph::new(lines).block(block).alignment(Alignment::Left);
    f.render_widget(ratatui::widgets::Clear, area);
    f.render_widget(paragraph, area);
}

pub fn render_filter_editor(f: &mut Frame, area: Rect, editor: &FilterEditor) {
    let field_style = |is_end: bool| {
        if editor.editing_end == is_end {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default().fg(Color::White)
        }
    };

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::raw("  Start date: "),
            Span::styled(format!(" {} ", editor.start_input), field_style(false)),
        ]),
        Line::from(vec![
            Span::raw("  End date:   "),
            Span::styled(format!(" {} ", editor.end_input), field_style(true)),
        ]),
        Line::from(""),
    ];
    if let Some(error) = &editor.error {
        lines.push(Line::from(Span::styled(
            format!("  ✗ {}", error),
            Style::default().fg(Color::Red),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            "  [Tab] switch  [Enter] apply  [Esc] cancel",
            Style::default().fg(Color::DarkGray),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Date Filter (YYYY-MM-DD)")
        .border_style(Style::default().fg(Color::Cyan));
    let paragraph = Paragraph::new(lines).block(block).alignment(Alignment::Left);
    f.render_widget(ratatui::widgets::Clear, area);
    f.render_widget(paragraph, area);
}

pub fn render_alarm_badge(f: &mut Frame, area: Rect, alarm: AlarmState) {
    let (text, color) = match alarm {
        AlarmState::Engaged => ("🔔 SOUNDING", Color::Red),
        AlarmState::Silent => ("silent", Color::DarkGray),
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            text,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Alarm")
        .border_style(Style::default().fg(color));
    let paragraph = Paragraph::new(lines).block(block).alignment(Alignment::Center);
    f.render_widget(paragraph, area);
}

pub fn render_help_panel(f: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(
            "Keyboard Controls",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("  ↑/↓        select ticket"),
        Line::from("  Enter / E  open update dialog"),
        Line::from("  R          refresh now"),
        Line::from("  A          toggle alarm sound"),
        Line::from("  F          edit date filter"),
        Line::from("  ?          toggle this help"),
        Line::from("  Q / Esc    quit"),
        Line::from(""),
        Line::from("  In dialogs: Tab cycles fields, Enter submits,"),
        Line::from("  Esc cancels. Type to edit the focused field."),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Help")
        .border_style(Style::default().fg(Color::Cyan));
    let paragraph = Paragraph::new(lines).block(block).alignment(Alignment::Left);
    f.render_widget(ratatui::widgets::Clear, area);
    f.render_widget(paragraph, area);
}

pub fn render_notification(f: &mut Frame, area: Rect, message: &str, is_success: bool) {
    let color = if is_success { Color::Green } else { Color::Red };
    let line = Line::from(Span::styled(
        message,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ));
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));
    let paragraph = Paragraph::new(vec![line]).block(block).alignment(Alignment::Center);
    f.render_widget(ratatui::widgets::Clear, area);
    f.render_widget(paragraph, area);
}

pub fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m{}s", secs / 60, secs % 60)
    } else {
        format!("{}h{}m", secs / 3600, (secs % 3600) / 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(45), "45s");
        assert_eq!(format_duration(125), "2m5s");
        assert_eq!(format_duration(7260), "2h1m");
    }

    #[test]
    fn test_status_colors() {
        assert_eq!(status_color(TicketStatus::Open), Color::Red);
        assert_eq!(status_color(TicketStatus::Process), Color::Yellow);
        assert_eq!(status_color(TicketStatus::Closed), Color::Green);
        assert_eq!(status_color(TicketStatus::Unknown(9)), Color::DarkGray);
    }
}
