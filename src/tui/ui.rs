//! UI layout and rendering logic for the playground.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use std::time::Instant;
use unicode_width::UnicodeWidthStr;

use super::app::{App, CompletionItem, Popup};
use super::editor::EditorState;
use crate::assist::{Diagnostics, LanguageProfile};
use crate::catalog;
use crate::script::{self, lexer};
use crate::session::Outcome;

/// Render the main UI.
pub fn render_ui(frame: &mut Frame, app: &mut App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),    // Editor
            Constraint::Length(8), // Result pane
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    let (scroll, gutter) = render_editor(frame, app, main_layout[0]);
    render_result(frame, app, main_layout[1]);
    render_status_bar(frame, app, main_layout[2]);

    match &app.popup {
        Popup::Help => render_help_overlay(frame),
        Popup::Examples { selected } => render_examples_popup(frame, *selected),
        Popup::Completion { items, selected, .. } => {
            render_completion_popup(frame, app, items, *selected, main_layout[0], scroll, gutter);
        }
        Popup::None => {}
    }
}

/// Render the script buffer. Returns the scroll offset and gutter width
/// so popup anchoring can reuse them.
fn render_editor(frame: &mut Frame, app: &mut App, area: Rect) -> (usize, u16) {
    let inner_height = area.height.saturating_sub(2) as usize;
    let inner_width = area.width.saturating_sub(2);
    let scroll = app.editor.scroll_for(inner_height);

    let gutter: u16 = if app.show_line_numbers {
        let digits = app.editor.line_count().to_string().len().max(2);
        digits as u16 + 1
    } else {
        0
    };

    let flagged = flagged_lines(&app.editor);

    let mut rows = Vec::new();
    for (offset, line) in app.editor.lines().iter().skip(scroll).take(inner_height).enumerate() {
        let mut spans = Vec::new();
        if gutter > 0 {
            let number = scroll + offset + 1;
            let style = if flagged.contains(&number) {
                Style::default().fg(Color::Red)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            spans.push(Span::styled(
                format!("{:>width$} ", number, width = gutter as usize - 1),
                style,
            ));
        }
        spans.extend(highlight_line(line, app.editor.language()));
        rows.push(Line::from(spans));
    }

    let paragraph = Paragraph::new(Text::from(rows))
        .block(Block::default().borders(Borders::ALL).title("Policy Script"));
    frame.render_widget(paragraph, area);

    // Place the terminal cursor at the buffer cursor.
    let line = &app.editor.lines()[app.editor.cursor_row];
    let col = line[..app.editor.cursor_col].width() as u16;
    let x = (area.x + 1 + gutter + col).min(area.x + inner_width);
    let y = area.y + 1 + (app.editor.cursor_row.saturating_sub(scroll)) as u16;
    frame.set_cursor_position((x, y));

    (scroll, gutter)
}

/// Line numbers flagged by the strict module profile. Empty while the
/// surface has diagnostics off, which is how the bridge configures it.
fn flagged_lines(editor: &EditorState) -> Vec<usize> {
    match editor.diagnostics() {
        Diagnostics::Off => Vec::new(),
        Diagnostics::Full => script::lint_module(&editor.source())
            .iter()
            .map(|note| note.line as usize)
            .collect(),
    }
}

/// Classify one line into styled spans: comments, strings, numbers,
/// keywords, everything else.
fn highlight_line<'a>(line: &'a str, profile: &LanguageProfile) -> Vec<Span<'a>> {
    let mut spans = Vec::new();
    let mut rest = line;

    while !rest.is_empty() {
        if rest.starts_with(profile.line_comment) {
            spans.push(Span::styled(rest, Style::default().fg(Color::DarkGray)));
            break;
        }
        let c = match rest.chars().next() {
            Some(c) => c,
            None => break,
        };
        if profile.string_quotes.contains(&c) {
            let len = string_len(rest, c);
            spans.push(Span::styled(&rest[..len], Style::default().fg(Color::Green)));
            rest = &rest[len..];
        } else if c.is_ascii_digit() {
            let len = number_len(rest);
            spans.push(Span::styled(&rest[..len], Style::default().fg(Color::Yellow)));
            rest = &rest[len..];
        } else if lexer::is_ident_start(c) {
            let len = rest
                .find(|ch: char| !lexer::is_ident_continue(ch))
                .unwrap_or(rest.len());
            let word = &rest[..len];
            let style = if profile.keywords.contains(&word) {
                Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            spans.push(Span::styled(word, style));
            rest = &rest[len..];
        } else {
            let len = c.len_utf8();
            spans.push(Span::styled(&rest[..len], Style::default()));
            rest = &rest[len..];
        }
    }
    spans
}

/// Byte length of a number literal starting at `text[0]`. The dot counts
/// only when a digit follows, as in the tokenizer, so `2.toSQL()` keeps
/// the dot outside the literal.
fn number_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut len = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    if bytes.get(len) == Some(&b'.') && bytes.get(len + 1).is_some_and(|b| b.is_ascii_digit()) {
        len += 1;
        len += bytes[len..].iter().take_while(|b| b.is_ascii_digit()).count();
    }
    len
}

/// Byte length of a string literal starting at `text[0]`, including both
/// quotes when the literal is closed on this line.
fn string_len(text: &str, quote: char) -> usize {
    let mut escaped = false;
    for (idx, c) in text.char_indices().skip(1) {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            return idx + c.len_utf8();
        }
    }
    text.len()
}

/// Render the outcome of the latest run.
fn render_result(frame: &mut Frame, app: &App, area: Rect) {
    let (title, text, style) = match app.session.outcome() {
        Outcome::Idle => (
            "Result",
            "ctrl+r to run".to_string(),
            Style::default().fg(Color::DarkGray),
        ),
        Outcome::Running => (
            "Result",
            "running...".to_string(),
            Style::default().fg(Color::Yellow),
        ),
        Outcome::Succeeded { sql } => ("SQL", sql.clone(), Style::default().fg(Color::Green)),
        Outcome::Failed { message } => ("Error", message.clone(), Style::default().fg(Color::Red)),
    };

    let paragraph = Paragraph::new(text)
        .style(style)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// Render the status bar.
fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status = Paragraph::new(app.status_line(Instant::now()))
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));
    frame.render_widget(status, area);
}

/// Render the help overlay.
fn render_help_overlay(frame: &mut Frame) {
    let popup_area = centered_rect(70, 70, frame.area());
    frame.render_widget(Clear, popup_area);

    let help_lines = vec![
        Line::from("Playground Help"),
        Line::from(""),
        Line::from("Running:"),
        Line::from("  Ctrl+R       - Run the script"),
        Line::from("  Ctrl+Y       - Copy the generated SQL"),
        Line::from(""),
        Line::from("Editing:"),
        Line::from("  Tab          - Complete at cursor (or indent)"),
        Line::from("  Ctrl+Space   - Complete at cursor"),
        Line::from("  Ctrl+E       - Load a bundled example"),
        Line::from(""),
        Line::from("Leaving:"),
        Line::from("  Ctrl+Q       - Quit"),
        Line::from("  Ctrl+C twice - Quit"),
        Line::from("  F1 / Esc     - Close this help"),
        Line::from(""),
        Line::from("Scripts end with `return policy(...).toSQL();`."),
    ];

    let help = Paragraph::new(Text::from(help_lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Help")
                .title_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(help, popup_area);
}

/// Render the example picker.
fn render_examples_popup(frame: &mut Frame, selected: usize) {
    let popup_area = centered_rect(70, 60, frame.area());
    frame.render_widget(Clear, popup_area);

    let mut lines = Vec::new();
    for (idx, example) in catalog::all().iter().enumerate() {
        let marker = if idx == selected { "> " } else { "  " };
        let style = if idx == selected {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(
            format!("{marker}{:<22} {}", example.name, example.title),
            style,
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "enter load | esc close",
        Style::default().fg(Color::DarkGray),
    )));

    let list = Paragraph::new(Text::from(lines)).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Examples")
            .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
    );
    frame.render_widget(list, popup_area);
}

/// Render the completion list anchored under the cursor.
fn render_completion_popup(
    frame: &mut Frame,
    app: &App,
    items: &[CompletionItem],
    selected: usize,
    editor_area: Rect,
    scroll: usize,
    gutter: u16,
) {
    let frame_area = frame.area();
    let visible = items.len().min(8);
    let max_width = frame_area.width.saturating_sub(4).max(16) as usize;
    let width = items
        .iter()
        .map(|item| item.label.width() + item.detail.width() + 3)
        .max()
        .unwrap_or(16)
        .clamp(16, max_width) as u16
        + 2;
    let height = visible as u16 + 2;

    let line = &app.editor.lines()[app.editor.cursor_row];
    let col = line[..app.editor.cursor_col].width() as u16;
    let cursor_x = editor_area.x + 1 + gutter + col;
    let cursor_y = editor_area.y + 1 + (app.editor.cursor_row.saturating_sub(scroll)) as u16;

    let x = cursor_x.min(frame_area.width.saturating_sub(width));
    let y = if cursor_y + 1 + height <= frame_area.height {
        cursor_y + 1
    } else {
        cursor_y.saturating_sub(height)
    };
    let popup_area = Rect::new(x, y, width, height).intersection(frame_area);
    if popup_area.width < 3 || popup_area.height < 3 {
        return;
    }
    frame.render_widget(Clear, popup_area);

    // Keep the selected row in the visible window.
    let first = if selected >= visible {
        selected + 1 - visible
    } else {
        0
    };
    let mut lines = Vec::new();
    for (idx, item) in items.iter().enumerate().skip(first).take(visible) {
        let style = if idx == selected {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::styled(item.label.clone(), style.add_modifier(Modifier::BOLD)),
            Span::styled(format!("  {}", item.detail), style.fg(Color::DarkGray)),
        ]));
    }

    let popup = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(popup, popup_area);
}

/// Helper function to create a centered rectangle.
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
