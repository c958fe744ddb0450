use crate::metrics;
use crate::state::MonitorEvent;
use crate::tui::app::{FilterEditor, TuiApp};
use crate::tui::keys::{browse_action, dialog_action, filter_action, BrowseAction, DialogAction, FilterAction};
use crate::tui::snapshot::UiSnapshot;
use crate::tui::widgets;
use andon_api::client::TicketApi;
use andon_api::watcher::{RefreshKind, WatchCommand};
use andon_core::alarm::AlarmTransition;
use andon_core::timefmt::now_stamp;
use andon_core::types::ListQuery;
use anyhow::Context;
use chrono::Utc;
use crossterm::event::{self, DisableFocusChange, EnableFocusChange, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

/// Completion of a ticket update spawned off the event loop.
struct UpdateFeedback {
    id_ticket: i64,
    result: Result<(), String>,
}

pub async fn run_tui(
    mut app: TuiApp,
    api: TicketApi,
    commands: mpsc::UnboundedSender<WatchCommand>,
) -> anyhow::Result<()> {
    if !atty::is(atty::Stream::Stdout) {
        return Err(anyhow::anyhow!("TUI requires an interactive terminal"));
    }

    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)
        .context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend).context("Failed to create terminal")?;

    let (feedback_tx, mut feedback_rx) = mpsc::unbounded_channel::<UpdateFeedback>();
    let mut should_quit = false;
    let mut frame_interval = interval(Duration::from_millis(150));

    loop {
        let snapshot = UiSnapshot::from_state(&app.state).await;
        app.clamp_selection(snapshot.rows.len());

        terminal.draw(|f| render_ui(f, &app, &snapshot, &api))?;

        app.expire_notification();

        // Fold in completed submissions before reading the keyboard so the
        // dialog reflects the latest outcome.
        while let Ok(feedback) = feedback_rx.try_recv() {
            handle_update_feedback(&mut app, feedback).await;
        }

        if app
            .dialog
            .as_ref()
            .map(|dialog| dialog.should_autoclose())
            .unwrap_or(false)
        {
            app.close_dialog();
            app.notify("✓ Ticket updated");
            let _ = commands.send(WatchCommand::Refresh(RefreshKind::AfterUpdate));
        }

        if crossterm::event::poll(Duration::from_millis(33))? {
            match event::read()? {
                Event::FocusGained => {
                    let _ = commands.send(WatchCommand::Refresh(RefreshKind::Focus));
                }
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if app.dialog.is_some() {
                        handle_dialog_key(&mut app, &api, &feedback_tx, key.code);
                    } else if app.filter.is_some() {
                        handle_filter_key(&mut app, &commands, &snapshot, key.code).await;
                    } else if let Some(action) = browse_action(key.code) {
                        match action {
                            BrowseAction::Quit => {
                                should_quit = true;
                            }
                            BrowseAction::Refresh => {
                                let _ = commands.send(WatchCommand::Refresh(RefreshKind::Manual));
                            }
                            BrowseAction::MoveSelectionUp => {
                                app.move_selection_up();
                            }
                            BrowseAction::MoveSelectionDown => {
                                app.move_selection_down(&snapshot);
                            }
                            BrowseAction::OpenEdit => {
                                if !app.open_edit(&snapshot) {
                                    app.notify("✗ No ticket selected");
                                }
                            }
                            BrowseAction::ToggleAlarm => {
                                handle_alarm_toggle(&mut app).await;
                            }
                            BrowseAction::EditFilter => {
                                app.filter = Some(FilterEditor::new(
                                    snapshot.query.start_date,
                                    snapshot.query.end_date,
                                ));
                            }
                            BrowseAction::ToggleHelp => {
                                app.show_help = !app.show_help;
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        if should_quit {
            break;
        }

        frame_interval.tick().await;
    }

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableFocusChange, LeaveAlternateScreen)?;
    Ok(())
}

async fn handle_update_feedback(app: &mut TuiApp, feedback: UpdateFeedback) {
    match feedback.result {
        Ok(()) => {
            if let Some(dialog) = app.dialog.as_mut() {
                if dialog.draft.id_ticket == feedback.id_ticket {
                    dialog.mark_succeeded();
                }
            }
            metrics::record_update_ok();
            app.state
                .push_event(MonitorEvent::UpdateSubmitted {
                    id_ticket: feedback.id_ticket,
                })
                .await;
        }
        Err(error) => {
            if let Some(dialog) = app.dialog.as_mut() {
                if dialog.draft.id_ticket == feedback.id_ticket {
                    dialog.mark_failed(error.clone());
                }
            }
            metrics::record_update_failed();
            app.state
                .push_event(MonitorEvent::UpdateFailed {
                    id_ticket: feedback.id_ticket,
                    error,
                })
                .await;
        }
    }
}

fn handle_dialog_key(
    app: &mut TuiApp,
    api: &TicketApi,
    feedback_tx: &mpsc::UnboundedSender<UpdateFeedback>,
    key: crossterm::event::KeyCode,
) {
    let Some(action) = dialog_action(key) else {
        return;
    };
    let Some(dialog) = app.dialog.as_mut() else {
        return;
    };

    match action {
        DialogAction::Cancel => {
            if !dialog.submitting {
                app.close_dialog();
            }
        }
        DialogAction::Submit => {
            if !dialog.can_submit() {
                return;
            }
            match dialog.prepare_update(&now_stamp(Utc::now())) {
                Ok(update) => {
                    dialog.mark_submitting();
                    let api = api.clone();
                    let feedback_tx = feedback_tx.clone();
                    let id_ticket = update.id_ticket;
                    tokio::spawn(async move {
                        let result = match api.update_ticket(&update).await {
                            Ok(response) if response.success == Some(false) => Err(response
                                .message
                                .unwrap_or_else(|| "Failed to update ticket".to_string())),
                            Ok(_) => Ok(()),
                            Err(e) => {
                                tracing::error!(id_ticket, error = %e, "ticket update failed");
                                Err(e.user_message())
                            }
                        };
                        let _ = feedback_tx.send(UpdateFeedback { id_ticket, result });
                    });
                }
                Err(message) => {
                    dialog.mark_failed(message);
                }
            }
        }
        DialogAction::NextField => dialog.next_field(),
        DialogAction::PrevField => dialog.prev_field(),
        DialogAction::CycleLeft => dialog.cycle_status(false),
        DialogAction::CycleRight => dialog.cycle_status(true),
        DialogAction::Backspace => dialog.backspace(),
        DialogAction::Input(c) => dialog.input(c),
    }
}

async fn handle_filter_key(
    app: &mut TuiApp,
    commands: &mpsc::UnboundedSender<WatchCommand>,
    snapshot: &UiSnapshot,
    key: crossterm::event::KeyCode,
) {
    let Some(action) = filter_action(key) else {
        return;
    };
    let Some(editor) = app.filter.as_mut() else {
        return;
    };

    match action {
        FilterAction::Cancel => {
            app.filter = None;
        }
        FilterAction::Apply => match editor.parse() {
            Ok((start, end)) => {
                let query = ListQuery::new(start, end, snapshot.query.status.clone());
                app.state.set_query(query.clone()).await;
                app.state
                    .push_event(MonitorEvent::FilterChanged {
                        start_date: start,
                        end_date: end,
                    })
                    .await;
                let _ = commands.send(WatchCommand::SetQuery(query));
                app.filter = None;
            }
            Err(message) => {
                editor.error = Some(message);
            }
        },
        FilterAction::SwitchField => editor.switch_field(),
        FilterAction::Backspace => editor.backspace(),
        FilterAction::Input(c) => editor.input(c),
    }
}

async fn handle_alarm_toggle(app: &mut TuiApp) {
    let transition = app.state.alarm.toggle();
    let engaged = matches!(transition, AlarmTransition::Engaged);
    match transition {
        AlarmTransition::Engaged => metrics::record_alarm_engaged(),
        AlarmTransition::Silenced => metrics::record_alarm_silenced(),
    }
    app.state
        .push_event(MonitorEvent::AlarmToggled { engaged })
        .await;
    app.notify(if engaged {
        "🔔 Alarm sounding"
    } else {
        "Alarm silenced until next refresh"
    });
}

fn render_ui(f: &mut Frame, app: &TuiApp, snapshot: &UiSnapshot, api: &TicketApi) {
    let size = f.size();

    let mut constraints = vec![
        Constraint::Length(4), // filter bar + alarm badge
        Constraint::Length(5), // summary cards
    ];
    if snapshot.last_error.is_some() {
        constraints.push(Constraint::Length(3));
    }
    constraints.push(Constraint::Min(8));      // ticket table
    constraints.push(Constraint::Length(10));  // event log
    constraints.push(Constraint::Length(1));   // footer

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(size);

    let header_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(16)])
        .split(chunks[0]);
    widgets::render_filter_bar(f, header_chunks[0], snapshot);
    widgets::render_alarm_badge(f, header_chunks[1], snapshot.alarm);

    widgets::render_summary_cards(f, chunks[1], snapshot);

    let mut idx = 2;
    if let Some(error) = &snapshot.last_error {
        widgets::render_error_banner(f, chunks[idx], error);
        idx += 1;
    }

    widgets::render_ticket_table(f, chunks[idx], snapshot, app.selected_index);
    widgets::render_event_log(f, chunks[idx + 1], &snapshot.events);
    render_footer(f, chunks[idx + 2], snapshot);

    if let Some(dialog) = &app.dialog {
        let evidence_url = dialog
            .original
            .has_evidence()
            .then(|| api.evidence_url(&dialog.original.evidence_uploaded));
        let area = centered_rect(64, 45, size);
        widgets::render_edit_dialog(f, area, dialog, evidence_url.as_deref());
    }

    if let Some(editor) = &app.filter {
        let area = centered_rect(50, 30, size);
        widgets::render_filter_editor(f, area, editor);
    }

    if app.show_help {
        let area = centered_rect(60, 70, size);
        widgets::render_help_panel(f, area);
    }

    if let Some((message, at)) = &app.notification {
        if at.elapsed().as_secs() < 3 {
            let area = centered_rect(50, 8, size);
            let is_success = message.starts_with('✓') || message.starts_with('🔔');
            widgets::render_notification(f, area, message, is_success);
        }
    }
}

fn render_footer(f: &mut Frame, area: Rect, snapshot: &UiSnapshot) {
    let line = Line::from(vec![
        Span::styled(
            "[↑↓] select  [Enter] update  [R] refresh  [A] alarm  [F] filter  [?] help  [Q] quit",
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw("  │  "),
        Span::styled(
            format!("up {}", widgets::format_duration(snapshot.uptime_seconds)),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    let paragraph = Paragraph::new(vec![line]).alignment(Alignment::Left);
    f.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
