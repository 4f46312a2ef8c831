//! Async event loop for the playground.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use anyhow::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use crossterm::event::{
    self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use is_terminal::IsTerminal;
use ratatui::prelude::*;
use tokio::sync::mpsc;

use super::{
    app::{App, Popup},
    events::TuiEvent,
    ui::render_ui,
};
use crate::{catalog, config::Config};

/// Run the interactive playground until the user quits.
pub async fn run_playground(initial_source: Option<String>, config: &Config) -> Result<()> {
    if !io::stdout().is_terminal() {
        return Err(anyhow::anyhow!(
            "the playground needs a terminal; pass a script or --eval instead"
        ));
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(initial_source, config);
    let (event_tx, event_rx) = mpsc::unbounded_channel::<TuiEvent>();

    let result = run_app(&mut terminal, &mut app, event_tx, event_rx).await;

    // Restore terminal
    disable_raw_mode()?;
    terminal.backend_mut().execute(DisableBracketedPaste)?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Main application loop.
async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    event_tx: mpsc::UnboundedSender<TuiEvent>,
    mut event_rx: mpsc::UnboundedReceiver<TuiEvent>,
) -> Result<()> {
    // Spawn input handler
    let input_tx = event_tx.clone();
    tokio::task::spawn_blocking(move || loop {
        if event::poll(Duration::from_millis(100)).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(key)) => {
                    if input_tx.send(TuiEvent::Key(key)).is_err() {
                        break; // Channel closed
                    }
                }
                Ok(Event::Paste(text)) => {
                    if input_tx.send(TuiEvent::Paste(text)).is_err() {
                        break;
                    }
                }
                _ => {}
            }
        }
    });

    loop {
        // Render UI
        terminal.draw(|frame| render_ui(frame, app))?;

        // A requested run executes between two draws: the frame above
        // showed Running, the next one shows the outcome.
        if app.pending_run {
            app.finish_run();
            continue;
        }

        // Handle events
        if let Ok(tui_event) = event_rx.try_recv() {
            match tui_event {
                TuiEvent::Key(key) => {
                    if handle_key_event(app, key, &event_tx) {
                        break; // Quit requested
                    }
                }
                TuiEvent::Paste(text) => {
                    if !app.is_popup_open() {
                        app.editor.insert_str(&text);
                        app.note_edit();
                    }
                }
                TuiEvent::CopyCompleted => {
                    app.session.mark_copied(Instant::now());
                }
            }
        }

        // Small delay to prevent busy waiting
        tokio::time::sleep(Duration::from_millis(16)).await;
    }

    Ok(())
}

/// Handle one keyboard event. Returns true when the app should quit.
fn handle_key_event(
    app: &mut App,
    key: KeyEvent,
    event_tx: &mpsc::UnboundedSender<TuiEvent>,
) -> bool {
    if key.kind == KeyEventKind::Release {
        return false;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Global keys work with or without a popup.
    match key.code {
        KeyCode::Char('c') if ctrl => return app.handle_ctrl_c(),
        KeyCode::Char('q') if ctrl => return true,
        KeyCode::Char('r') if ctrl => {
            app.close_popup();
            app.request_run();
            return false;
        }
        KeyCode::Char('y') if ctrl => {
            copy_to_clipboard(app, event_tx);
            return false;
        }
        KeyCode::Char('e') if ctrl => {
            app.open_examples();
            return false;
        }
        KeyCode::F(1) => {
            if matches!(app.popup, Popup::Help) {
                app.close_popup();
            } else {
                app.open_help();
            }
            return false;
        }
        _ => {}
    }

    // Popup-scoped keys.
    match &app.popup {
        Popup::Help => {
            // Any key closes the help overlay.
            app.close_popup();
            return false;
        }
        Popup::Examples { selected } => {
            match key.code {
                KeyCode::Up => app.select_prev(),
                KeyCode::Down => app.select_next(),
                KeyCode::Enter => {
                    let idx = *selected;
                    if let Some(example) = catalog::all().get(idx) {
                        app.load_example(example);
                    }
                }
                KeyCode::Esc => app.close_popup(),
                _ => {}
            }
            return false;
        }
        Popup::Completion { .. } => {
            match key.code {
                KeyCode::Up => app.select_prev(),
                KeyCode::Down => app.select_next(),
                KeyCode::Tab | KeyCode::Enter => app.accept_completion(),
                KeyCode::Esc => app.close_popup(),
                KeyCode::Char(c) if !ctrl => {
                    // Keep typing; refresh the match set.
                    app.editor.insert_char(c);
                    app.close_popup();
                    reopen_if_matching(app);
                }
                KeyCode::Backspace => {
                    app.editor.backspace();
                    app.close_popup();
                    reopen_if_matching(app);
                }
                _ => app.close_popup(),
            }
            app.note_edit();
            return false;
        }
        Popup::None => {}
    }

    // Editor keys.
    match key.code {
        KeyCode::Char(' ') if ctrl => app.open_completion(),
        KeyCode::Null => app.open_completion(),
        KeyCode::Tab => {
            // Tab completes after a word or a dot, indents otherwise.
            let cx = app.editor.completion_cx();
            if cx.prefix.is_empty() && !cx.member {
                app.editor.insert_tab();
            } else {
                app.open_completion();
            }
        }
        KeyCode::Enter => app.editor.insert_newline(),
        KeyCode::Backspace => app.editor.backspace(),
        KeyCode::Delete => app.editor.delete(),
        KeyCode::Left => app.editor.move_left(),
        KeyCode::Right => app.editor.move_right(),
        KeyCode::Up => app.editor.move_up(),
        KeyCode::Down => app.editor.move_down(),
        KeyCode::Home => app.editor.move_home(),
        KeyCode::End => app.editor.move_end(),
        KeyCode::Char(c) if !ctrl => app.editor.insert_char(c),
        _ => {}
    }
    // Edits invalidate the previous result; motion does not.
    app.note_edit();
    false
}

fn reopen_if_matching(app: &mut App) {
    let cx = app.editor.completion_cx();
    if !cx.prefix.is_empty() || cx.member {
        app.open_completion();
    }
}

/// Write the last generated SQL to the clipboard via OSC 52. Terminals
/// that ignore the sequence simply do nothing; there is no error path.
fn copy_to_clipboard(app: &App, event_tx: &mpsc::UnboundedSender<TuiEvent>) {
    let Some(sql) = app.session.sql() else {
        return;
    };
    let payload = STANDARD.encode(sql);
    let tx = event_tx.clone();
    tokio::spawn(async move {
        let mut out = io::stdout();
        let _ = write!(out, "\x1b]52;c;{payload}\x07");
        let _ = out.flush();
        let _ = tx.send(TuiEvent::CopyCompleted);
    });
}
