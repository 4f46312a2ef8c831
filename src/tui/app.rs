//! Playground application state.

use std::time::{Duration, Instant};

use crate::assist::{self, AssistIndex, TypeSnapshot};
use crate::bindings::Bindings;
use crate::catalog::{self, Example};
use crate::config::Config;
use crate::engine;
use crate::execution;
use crate::session::{Outcome, Session};

use super::editor::{CompletionCx, EditorState};

const DOUBLE_CTRL_C_TIMEOUT: Duration = Duration::from_millis(500);

/// One row of the completion popup.
#[derive(Debug, Clone)]
pub struct CompletionItem {
    /// Name shown in the list.
    pub label: String,
    /// Text spliced into the buffer on accept.
    pub insert: String,
    /// Signature or declared type shown next to the name.
    pub detail: String,
}

/// Which overlay is on screen.
#[derive(Debug)]
pub enum Popup {
    None,
    Help,
    Examples {
        selected: usize,
    },
    Completion {
        items: Vec<CompletionItem>,
        selected: usize,
        cx: CompletionCx,
    },
}

/// Application state for the playground.
pub struct App {
    /// Script buffer and cursor.
    pub editor: EditorState,
    /// Source plus the lifecycle of the latest run.
    pub session: Session,
    /// Capability registry used for every run.
    pub bindings: Bindings,
    /// Completion data from the bundled declarations.
    pub index: AssistIndex,
    /// Active overlay.
    pub popup: Popup,
    /// Whether the editor gutter shows line numbers.
    pub show_line_numbers: bool,
    /// A run was requested; the loop executes it after the next draw.
    pub pending_run: bool,
    /// Timestamp of the last Ctrl+C press for double-press detection.
    pub last_ctrl_c: Option<Instant>,
}

impl App {
    pub fn new(initial_source: Option<String>, config: &Config) -> Self {
        let source = initial_source
            .or_else(|| {
                config
                    .default_example()
                    .and_then(|name| catalog::find(&name))
                    .map(|example| example.code.to_string())
            })
            .unwrap_or_else(|| catalog::default_example().code.to_string());

        let bindings = engine::bindings();
        let snapshot = TypeSnapshot::bundled();
        let mut editor = EditorState::new(&source, config.tab_width());
        assist::configure(&mut editor, &snapshot, &bindings);
        let index = AssistIndex::build(&snapshot, &bindings);
        let session = Session::new(source);

        App {
            editor,
            session,
            bindings,
            index,
            popup: Popup::None,
            show_line_numbers: config.show_line_numbers(),
            pending_run: false,
            last_ctrl_c: None,
        }
    }

    /// Mark the buffer for execution. The run itself happens between two
    /// draws so the Running state is visible exactly once per request.
    pub fn request_run(&mut self) {
        self.session.edit(self.editor.source());
        self.session.begin_run();
        self.pending_run = true;
    }

    /// Execute the pending run and record its outcome.
    pub fn finish_run(&mut self) {
        let result = execution::execute(self.session.source(), &self.bindings);
        self.session.complete(result);
        self.pending_run = false;
    }

    /// Mirror a buffer change into the session, invalidating any prior
    /// result and copy ack. Cursor motion leaves the source unchanged
    /// and keeps the result.
    pub fn note_edit(&mut self) {
        let source = self.editor.source();
        if source != self.session.source() {
            self.session.edit(source);
        }
    }

    pub fn load_example(&mut self, example: &Example) {
        self.editor.set_source(example.code);
        self.session.load(example);
        self.popup = Popup::None;
    }

    pub fn open_help(&mut self) {
        self.popup = Popup::Help;
    }

    pub fn open_examples(&mut self) {
        self.popup = Popup::Examples { selected: 0 };
    }

    pub fn close_popup(&mut self) {
        self.popup = Popup::None;
    }

    pub fn is_popup_open(&self) -> bool {
        !matches!(self.popup, Popup::None)
    }

    /// Open the completion popup for the word under the cursor. Stays
    /// closed when nothing matches.
    pub fn open_completion(&mut self) {
        let cx = self.editor.completion_cx();
        let items = self.completion_items(&cx);
        if items.is_empty() {
            return;
        }
        self.popup = Popup::Completion {
            items,
            selected: 0,
            cx,
        };
    }

    fn completion_items(&self, cx: &CompletionCx) -> Vec<CompletionItem> {
        if cx.member {
            let typed = cx
                .receiver
                .as_deref()
                .and_then(|receiver| self.index.global_type(receiver));
            let members = match typed {
                Some(type_name) => self.index.complete_member(type_name, &cx.prefix),
                None => self.index.complete_any_member(&cx.prefix),
            };
            members
                .into_iter()
                .map(|member| CompletionItem {
                    label: member.name.clone(),
                    insert: call_insert(&member.name, &member.signature),
                    detail: member.signature.clone(),
                })
                .collect()
        } else {
            self.index
                .complete_global(&cx.prefix)
                .into_iter()
                .map(|hint| CompletionItem {
                    label: hint.name.clone(),
                    insert: if hint.type_name.contains("=>") {
                        format!("{}(", hint.name)
                    } else {
                        hint.name.clone()
                    },
                    detail: hint.type_name.clone(),
                })
                .collect()
        }
    }

    /// Splice the selected completion into the buffer.
    pub fn accept_completion(&mut self) {
        if let Popup::Completion { items, selected, cx } = &self.popup {
            if let Some(item) = items.get(*selected) {
                let insert = item.insert.clone();
                let cx = cx.clone();
                self.editor.apply_completion(&cx, &insert);
            }
        }
        self.popup = Popup::None;
        self.note_edit();
    }

    pub fn select_next(&mut self) {
        match &mut self.popup {
            Popup::Examples { selected } => {
                *selected = (*selected + 1) % catalog::all().len();
            }
            Popup::Completion { items, selected, .. } => {
                *selected = (*selected + 1) % items.len();
            }
            _ => {}
        }
    }

    pub fn select_prev(&mut self) {
        match &mut self.popup {
            Popup::Examples { selected } => {
                let len = catalog::all().len();
                *selected = (*selected + len - 1) % len;
            }
            Popup::Completion { items, selected, .. } => {
                let len = items.len();
                *selected = (*selected + len - 1) % len;
            }
            _ => {}
        }
    }

    /// Handle Ctrl+C: the first press closes any popup and arms the
    /// timer, a second press within the window quits.
    pub fn handle_ctrl_c(&mut self) -> bool {
        let now = Instant::now();
        if let Some(last) = self.last_ctrl_c {
            if now.duration_since(last) <= DOUBLE_CTRL_C_TIMEOUT {
                return true;
            }
        }
        self.popup = Popup::None;
        self.last_ctrl_c = Some(now);
        false
    }

    /// Status line for the bottom bar.
    pub fn status_line(&self, now: Instant) -> String {
        if self.session.copy_acknowledged(now) {
            return "SQL copied to clipboard".to_string();
        }
        if let Some(last) = self.last_ctrl_c {
            if now.duration_since(last) <= DOUBLE_CTRL_C_TIMEOUT {
                return "press Ctrl+C again to quit".to_string();
            }
        }
        match self.session.outcome() {
            Outcome::Running => "running...".to_string(),
            _ => {
                "ctrl+r run | ctrl+y copy | ctrl+e examples | tab complete | f1 help | ctrl+q quit"
                    .to_string()
            }
        }
    }
}

/// Insertion text for a method completion: zero-argument calls close the
/// parens, anything else leaves them open for the arguments.
fn call_insert(name: &str, signature: &str) -> String {
    match signature.split_once('(') {
        Some((_, rest)) if rest.starts_with(')') => format!("{name}()"),
        Some(_) => format!("{name}("),
        None => name.to_string(),
    }
}
