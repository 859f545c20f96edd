use std::collections::VecDeque;
use std::sync::mpsc;
use std::time::Instant;

use crate::editor::{Editor, EditorError};
use crate::export::COPY_ACK;

const MAX_LOG_LINES: usize = 500;

pub enum TuiEvent {
    FileLoaded {
        generation: u64,
        result: Result<String, EditorError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogRole {
    User,
    System,
    Error,
}

#[derive(Debug, Clone)]
pub struct LogLine {
    pub role: LogRole,
    pub text: String,
}

pub struct AppState {
    pub should_quit: bool,
    pub editor: Editor,
    pub log_lines: VecDeque<LogLine>,
    pub input: String,
    pub suggestions: String,
    pub status_build: String,
    pub copied_at: Option<Instant>,
    pub tick: u64,
    pub result_rx: mpsc::Receiver<TuiEvent>,
    pub result_tx: mpsc::Sender<TuiEvent>,
}

impl AppState {
    pub fn new(editor: Editor, status_build: String) -> Self {
        let (result_tx, result_rx) = mpsc::channel();
        Self {
            should_quit: false,
            editor,
            log_lines: VecDeque::new(),
            input: String::new(),
            suggestions: String::new(),
            status_build,
            copied_at: None,
            tick: 0,
            result_rx,
            result_tx,
        }
    }

    pub fn append_message(&mut self, text: &str) {
        self.append_with_role(text, LogRole::System);
    }

    pub fn append_user_message(&mut self, text: &str) {
        self.append_with_role(text, LogRole::User);
    }

    pub fn append_error(&mut self, text: &str) {
        self.append_with_role(text, LogRole::Error);
    }

    pub fn visible_log_lines(&self, height: u16) -> Vec<LogLine> {
        let max = height as usize;
        let start = self.log_lines.len().saturating_sub(max);
        self.log_lines.iter().skip(start).cloned().collect()
    }

    pub fn mark_copied(&mut self, now: Instant) {
        self.copied_at = Some(now);
    }

    /// コピー直後の2秒間だけ true
    pub fn copy_acknowledged(&self, now: Instant) -> bool {
        self.copied_at
            .map(|at| now.saturating_duration_since(at) < COPY_ACK)
            .unwrap_or(false)
    }

    /// 入力欄は1行で表示する
    pub fn input_display(&self) -> String {
        self.input.replace(['\r', '\n'], " ")
    }

    fn append_with_role(&mut self, text: &str, role: LogRole) {
        for line in text.lines() {
            self.log_lines.push_back(LogLine {
                role,
                text: line.to_string(),
            });
        }
        while self.log_lines.len() > MAX_LOG_LINES {
            self.log_lines.pop_front();
        }
    }
}
