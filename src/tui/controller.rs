use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{
    self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEventKind, KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::prelude::*;
use tokio::runtime::Handle;

use crate::cli::parse_ids;
use crate::config::expand_home;
use crate::editor::{read_config_file, Editor, EditorError, LoadOutcome};
use crate::export::{bootstrap_command, DirectorySink, ExportSink, NoClipboard};
use crate::tui::render;
use crate::tui::state::{AppState, TuiEvent};

pub const SUCCESS_MESSAGE: &str = "Uploaded successfully.";
pub const ERROR_MESSAGE: &str = "Error: Please ensure the content is valid JSON.";

pub struct App {
    state: AppState,
    sink: ExportSink,
    handle: Handle,
}

impl App {
    pub fn new(editor: Editor, sink: ExportSink, handle: Handle, status_build: String) -> Self {
        let mut state = AppState::new(editor, status_build);
        state.append_message("Paste your config JSON and press Enter. /help for commands.");
        Self {
            state,
            sink,
            handle,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            DisableBracketedPaste,
            LeaveAlternateScreen
        )?;
        terminal.show_cursor()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        while !self.state.should_quit {
            let now = Instant::now();
            terminal.draw(|frame| render::draw(frame, &self.state, now))?;

            self.state.tick = self.state.tick.wrapping_add(1);
            self.drain_results();
            if !event::poll(Duration::from_millis(100))? {
                continue;
            }
            match event::read()? {
                Event::Key(key) if key.kind != KeyEventKind::Release => {
                    if key.code == KeyCode::Char('c')
                        && key.modifiers.contains(KeyModifiers::CONTROL)
                    {
                        self.state.should_quit = true;
                        continue;
                    }
                    match key.code {
                        KeyCode::Char(ch) => {
                            self.state.input.push(ch);
                            self.refresh_suggestions();
                        }
                        KeyCode::Backspace => {
                            self.state.input.pop();
                            self.refresh_suggestions();
                        }
                        KeyCode::Tab => self.complete_server_id(),
                        KeyCode::Enter => self.handle_input(),
                        KeyCode::Esc => {
                            self.state.input.clear();
                            self.refresh_suggestions();
                        }
                        _ => {}
                    }
                }
                Event::Paste(text) => {
                    self.state.input.push_str(&text);
                    self.refresh_suggestions();
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn refresh_suggestions(&mut self) {
        let input = self.state.input.trim_start();
        self.state.suggestions = if let Some(prefix) = server_id_prefix(input) {
            self.state.editor.catalog().ids_with_prefix(prefix).join("  ")
        } else if input.starts_with('/') {
            build_slash_help_filtered(input.trim_end())
        } else {
            String::new()
        };
    }

    fn complete_server_id(&mut self) {
        let input = self.state.input.clone();
        let Some(prefix) = server_id_prefix(input.trim_start()) else {
            return;
        };
        let matches = self.state.editor.catalog().ids_with_prefix(prefix);
        if let [only] = matches.as_slice() {
            let head = &input[..input.len() - prefix.len()];
            self.state.input = format!("{}{} ", head, only);
        }
        self.refresh_suggestions();
    }

    pub fn handle_input(&mut self) {
        let input = self.state.input.trim().to_string();
        self.state.input.clear();
        self.refresh_suggestions();
        if input.is_empty() {
            return;
        }
        if input.starts_with('/') {
            self.state.append_user_message(&format!("> {}", input));
            self.handle_slash_command(&input);
            return;
        }
        self.state.append_user_message("> (pasted JSON)");
        match self.state.editor.load_from_text(&input) {
            Ok(()) => self.state.append_message(SUCCESS_MESSAGE),
            Err(_) => self.state.append_error(ERROR_MESSAGE),
        }
    }

    fn handle_slash_command(&mut self, input: &str) {
        let (command, rest) = match input.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (input, ""),
        };
        match command {
            "/help" => self.state.append_message(&build_slash_help()),
            "/exit" | "/quit" => self.state.should_quit = true,
            "/add" => self.add_servers(rest),
            "/remove" => self.remove_servers(rest),
            "/load" => self.start_file_load(rest),
            "/save" => self.save_artifact(rest),
            "/copy" => {
                let commands = self.state.editor.apply_commands();
                if commands.is_empty() {
                    self.state.append_message("nothing to apply");
                } else {
                    self.copy_text(&commands.join("\n"));
                }
            }
            "/bootstrap" => {
                let command = bootstrap_command(self.state.editor.target_path());
                self.copy_text(&command);
            }
            "/show" => {
                let json = self.state.editor.document().to_pretty_json();
                self.state.append_message(&json);
            }
            "/catalog" => {
                let lines: Vec<String> = self
                    .state
                    .editor
                    .catalog()
                    .iter()
                    .map(|entry| {
                        format!("{:<20} {:<8} {}", entry.id, entry.descriptor.kind(), entry.name)
                    })
                    .collect();
                self.state.append_message(&lines.join("\n"));
            }
            "/validate" => match self.state.editor.document().validate() {
                Ok(config) => {
                    let message = format!("ok: {} server(s)", config.entries().len());
                    self.state.append_message(&message);
                }
                Err(err) => self.state.append_error(&err.to_string()),
            },
            "/instructions" => {
                let open = !self.state.editor.state().instructions_open;
                self.state.editor.set_instructions_open(open);
            }
            _ => {
                let filtered = build_slash_help_filtered(command);
                if filtered.is_empty() {
                    self.state.append_error(&format!("unknown command: {}", command));
                } else {
                    self.state.append_message(&filtered);
                }
            }
        }
    }

    fn add_servers(&mut self, rest: &str) {
        if let Err(err) = self.state.editor.require_loaded() {
            self.state.append_error(&err.to_string());
            return;
        }
        let ids = match parse_ids(rest) {
            Ok(ids) => ids,
            Err(err) => {
                self.state.append_error(&err.to_string());
                return;
            }
        };
        for id in ids {
            match self.state.editor.add_server(&id) {
                Ok(()) => self.state.append_message(&format!("added: {}", id)),
                Err(err) => self.state.append_error(&err.to_string()),
            }
        }
    }

    fn remove_servers(&mut self, rest: &str) {
        if let Err(err) = self.state.editor.require_loaded() {
            self.state.append_error(&err.to_string());
            return;
        }
        match parse_ids(rest) {
            Ok(ids) => {
                for id in ids {
                    self.state.editor.remove_server(&id);
                    self.state.append_message(&format!("removed: {}", id));
                }
            }
            Err(err) => self.state.append_error(&err.to_string()),
        }
    }

    fn start_file_load(&mut self, rest: &str) {
        if rest.is_empty() {
            self.state.append_error("usage: /load <path>");
            return;
        }
        let path = expand_home(rest);
        let generation = self.state.editor.begin_file_load();
        let result_tx = self.state.result_tx.clone();
        self.handle.spawn(async move {
            let result = read_config_file(&path).await;
            let _ = result_tx.send(TuiEvent::FileLoaded { generation, result });
        });
    }

    pub fn drain_results(&mut self) {
        while let Ok(event) = self.state.result_rx.try_recv() {
            match event {
                TuiEvent::FileLoaded { generation, result } => {
                    self.finish_file_load(generation, result);
                }
            }
        }
    }

    fn finish_file_load(&mut self, generation: u64, result: Result<String, EditorError>) {
        match self.state.editor.finish_file_load(generation, result) {
            Ok(LoadOutcome::Applied) => self.state.append_message(SUCCESS_MESSAGE),
            Ok(LoadOutcome::Stale) => {}
            Err(EditorError::MalformedInput(_)) => self.state.append_error(ERROR_MESSAGE),
            Err(err) => self.state.append_error(&format!("error: {}", err)),
        }
    }

    fn save_artifact(&mut self, rest: &str) {
        if let Err(err) = self.state.editor.require_loaded() {
            self.state.append_error(&err.to_string());
            return;
        }
        let artifact = self.state.editor.render_download_artifact();
        let saved = if rest.is_empty() {
            self.sink.download(&artifact)
        } else {
            let downloader = DirectorySink::new(expand_home(rest));
            ExportSink::new(Box::new(NoClipboard), Box::new(downloader)).download(&artifact)
        };
        match saved {
            Some(path) => self.state.append_message(&format!("saved: {}", path.display())),
            None => self.state.append_error("failed to save file"),
        }
    }

    fn copy_text(&mut self, text: &str) {
        if self.sink.copy(text) {
            self.state.mark_copied(Instant::now());
        } else {
            self.state.append_message(text);
        }
    }
}

fn server_id_prefix(input: &str) -> Option<&str> {
    let rest = input
        .strip_prefix("/add ")
        .or_else(|| input.strip_prefix("/remove "))?;
    Some(rest.rsplit([' ', ',']).next().unwrap_or(""))
}

#[derive(Clone, Copy)]
struct SlashCommandHelp {
    cmd: &'static str,
    desc_en: &'static str,
}

fn slash_help_items() -> Vec<SlashCommandHelp> {
    vec![
        SlashCommandHelp {
            cmd: "/add <id>...",
            desc_en: "Add servers from the catalog",
        },
        SlashCommandHelp {
            cmd: "/remove <id>...",
            desc_en: "Remove servers",
        },
        SlashCommandHelp {
            cmd: "/load <path>",
            desc_en: "Load config from a file",
        },
        SlashCommandHelp {
            cmd: "/save [dir]",
            desc_en: "Save claude_desktop_config.json",
        },
        SlashCommandHelp {
            cmd: "/copy",
            desc_en: "Copy the apply commands",
        },
        SlashCommandHelp {
            cmd: "/bootstrap",
            desc_en: "Copy the command that reads your config",
        },
        SlashCommandHelp {
            cmd: "/show",
            desc_en: "Show current config JSON",
        },
        SlashCommandHelp {
            cmd: "/catalog",
            desc_en: "List available servers",
        },
        SlashCommandHelp {
            cmd: "/validate",
            desc_en: "Check mcpServers entries",
        },
        SlashCommandHelp {
            cmd: "/instructions",
            desc_en: "Toggle instructions",
        },
        SlashCommandHelp {
            cmd: "/help",
            desc_en: "Show help",
        },
        SlashCommandHelp {
            cmd: "/exit, /quit",
            desc_en: "Quit",
        },
    ]
}

fn build_slash_help() -> String {
    build_slash_help_from_items(&slash_help_items())
}

pub fn build_slash_help_filtered(prefix: &str) -> String {
    let items: Vec<SlashCommandHelp> = slash_help_items()
        .into_iter()
        .filter(|item| item.cmd.starts_with(prefix))
        .collect();
    build_slash_help_from_items(&items)
}

fn build_slash_help_from_items(items: &[SlashCommandHelp]) -> String {
    items
        .iter()
        .map(|item| format!("{:<16} {}", item.cmd, item.desc_en))
        .collect::<Vec<_>>()
        .join("\n")
}
