//! Multi-line editor buffer for the playground.
//!
//! Columns are byte indices into the current line and always sit on a
//! character boundary. The buffer doubles as the [`EditorSurface`] the
//! augmentation bridge configures.

use crate::assist::{Diagnostics, EditorSurface, LanguageProfile, VirtualDoc};
use crate::script::lexer;

/// What the user was typing when completion fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionCx {
    /// Partial word under the cursor; may be empty.
    pub prefix: String,
    /// Byte column where the prefix starts on the cursor line.
    pub replace_from: usize,
    /// Identifier receiver before a `.`, when one can be read off the text.
    pub receiver: Option<String>,
    /// Whether the cursor sits in a member position (after a `.`).
    pub member: bool,
}

#[derive(Debug)]
pub struct EditorState {
    lines: Vec<String>,
    pub cursor_row: usize,
    pub cursor_col: usize,
    scroll_row: usize,
    tab_width: usize,
    docs: Vec<VirtualDoc>,
    diagnostics: Diagnostics,
    language: LanguageProfile,
}

impl EditorState {
    pub fn new(source: &str, tab_width: usize) -> Self {
        let mut editor = EditorState {
            lines: Vec::new(),
            cursor_row: 0,
            cursor_col: 0,
            scroll_row: 0,
            tab_width: tab_width.max(1),
            docs: Vec::new(),
            diagnostics: Diagnostics::Full,
            language: LanguageProfile::baseline(),
        };
        editor.set_source(source);
        editor
    }

    /// Replace the whole buffer and reset cursor and scroll.
    pub fn set_source(&mut self, source: &str) {
        self.lines = source.split('\n').map(str::to_string).collect();
        if self.lines.is_empty() {
            self.lines.push(String::new());
        }
        self.cursor_row = 0;
        self.cursor_col = 0;
        self.scroll_row = 0;
    }

    pub fn source(&self) -> String {
        self.lines.join("\n")
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn line(&self) -> &str {
        &self.lines[self.cursor_row]
    }

    pub fn language(&self) -> &LanguageProfile {
        &self.language
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.diagnostics
    }

    pub fn docs(&self) -> &[VirtualDoc] {
        &self.docs
    }

    // ----- motion -----

    pub fn move_left(&mut self) {
        if self.cursor_col > 0 {
            let step = self.line()[..self.cursor_col]
                .chars()
                .next_back()
                .map_or(1, char::len_utf8);
            self.cursor_col -= step;
        } else if self.cursor_row > 0 {
            self.cursor_row -= 1;
            self.cursor_col = self.line().len();
        }
    }

    pub fn move_right(&mut self) {
        if self.cursor_col < self.line().len() {
            let step = self.line()[self.cursor_col..]
                .chars()
                .next()
                .map_or(1, char::len_utf8);
            self.cursor_col += step;
        } else if self.cursor_row + 1 < self.lines.len() {
            self.cursor_row += 1;
            self.cursor_col = 0;
        }
    }

    pub fn move_up(&mut self) {
        if self.cursor_row > 0 {
            self.cursor_row -= 1;
            self.clamp_col();
        }
    }

    pub fn move_down(&mut self) {
        if self.cursor_row + 1 < self.lines.len() {
            self.cursor_row += 1;
            self.clamp_col();
        }
    }

    pub fn move_home(&mut self) {
        self.cursor_col = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor_col = self.line().len();
    }

    fn clamp_col(&mut self) {
        let line = &self.lines[self.cursor_row];
        if self.cursor_col > line.len() {
            self.cursor_col = line.len();
        }
        while self.cursor_col > 0 && !line.is_char_boundary(self.cursor_col) {
            self.cursor_col -= 1;
        }
    }

    // ----- editing -----

    pub fn insert_char(&mut self, c: char) {
        let col = self.cursor_col;
        self.lines[self.cursor_row].insert(col, c);
        self.cursor_col += c.len_utf8();
    }

    pub fn insert_newline(&mut self) {
        let rest = self.lines[self.cursor_row].split_off(self.cursor_col);
        self.lines.insert(self.cursor_row + 1, rest);
        self.cursor_row += 1;
        self.cursor_col = 0;
    }

    pub fn insert_tab(&mut self) {
        for _ in 0..self.tab_width {
            self.insert_char(' ');
        }
    }

    /// Insert text that may span lines; the cursor lands after it.
    pub fn insert_str(&mut self, text: &str) {
        for c in text.chars() {
            match c {
                '\n' => self.insert_newline(),
                '\r' => {}
                _ => self.insert_char(c),
            }
        }
    }

    pub fn backspace(&mut self) {
        if self.cursor_col > 0 {
            let step = self.line()[..self.cursor_col]
                .chars()
                .next_back()
                .map_or(1, char::len_utf8);
            self.cursor_col -= step;
            let col = self.cursor_col;
            self.lines[self.cursor_row].remove(col);
        } else if self.cursor_row > 0 {
            let removed = self.lines.remove(self.cursor_row);
            self.cursor_row -= 1;
            self.cursor_col = self.lines[self.cursor_row].len();
            self.lines[self.cursor_row].push_str(&removed);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor_col < self.line().len() {
            let col = self.cursor_col;
            self.lines[self.cursor_row].remove(col);
        } else if self.cursor_row + 1 < self.lines.len() {
            let next = self.lines.remove(self.cursor_row + 1);
            self.lines[self.cursor_row].push_str(&next);
        }
    }

    // ----- viewport -----

    /// Adjust and return the scroll offset so the cursor stays visible in
    /// a viewport of `height` rows.
    pub fn scroll_for(&mut self, height: usize) -> usize {
        if height == 0 {
            return self.scroll_row;
        }
        if self.cursor_row < self.scroll_row {
            self.scroll_row = self.cursor_row;
        } else if self.cursor_row >= self.scroll_row + height {
            self.scroll_row = self.cursor_row + 1 - height;
        }
        self.scroll_row
    }

    // ----- completion support -----

    /// Read the completion context at the cursor: the partial word being
    /// typed and, for member positions, the receiver identifier when the
    /// text makes it plain.
    pub fn completion_cx(&self) -> CompletionCx {
        let line = self.line();
        let mut start = self.cursor_col;
        while start > 0 {
            let prev = match line[..start].chars().next_back() {
                Some(c) => c,
                None => break,
            };
            if lexer::is_ident_continue(prev) {
                start -= prev.len_utf8();
            } else {
                break;
            }
        }
        let prefix = line[start..self.cursor_col].to_string();

        let before = line[..start].chars().next_back();
        if before != Some('.') {
            return CompletionCx {
                prefix,
                replace_from: start,
                receiver: None,
                member: false,
            };
        }

        // Word before the dot, if the receiver is a bare identifier.
        let dot = start - 1;
        let mut recv_start = dot;
        while recv_start > 0 {
            let prev = match line[..recv_start].chars().next_back() {
                Some(c) => c,
                None => break,
            };
            if lexer::is_ident_continue(prev) {
                recv_start -= prev.len_utf8();
            } else {
                break;
            }
        }
        let receiver = if recv_start < dot {
            Some(line[recv_start..dot].to_string())
        } else {
            None
        };
        CompletionCx {
            prefix,
            replace_from: start,
            receiver,
            member: true,
        }
    }

    /// Replace the context's prefix with `replacement`.
    pub fn apply_completion(&mut self, cx: &CompletionCx, replacement: &str) {
        let end = self.cursor_col;
        self.lines[self.cursor_row].replace_range(cx.replace_from..end, replacement);
        self.cursor_col = cx.replace_from + replacement.len();
    }
}

impl EditorSurface for EditorState {
    fn install_doc(&mut self, doc: VirtualDoc) {
        match self.docs.iter_mut().find(|d| d.name == doc.name) {
            Some(slot) => *slot = doc,
            None => self.docs.push(doc),
        }
    }

    fn set_diagnostics(&mut self, mode: Diagnostics) {
        self.diagnostics = mode;
    }

    fn set_language(&mut self, profile: LanguageProfile) {
        self.language = profile;
    }
}
