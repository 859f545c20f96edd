use std::time::Instant;

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use unicode_width::UnicodeWidthStr;

use crate::catalog::ServerDescriptor;
use crate::editor::UploadStatus;
use crate::export::bootstrap_command;
use crate::tui::controller::{ERROR_MESSAGE, SUCCESS_MESSAGE};
use crate::tui::state::{AppState, LogRole};

pub fn draw(frame: &mut Frame, state: &AppState, now: Instant) {
    let area = frame.size();
    frame.render_widget(Clear, area);

    let instructions = instruction_lines(state);
    let servers = server_lines(state);
    let apply = apply_lines(state);
    let help_height = if state.suggestions.is_empty() {
        0
    } else {
        (state.suggestions.lines().count() as u16).min(area.height / 3)
    };
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(block_height(&instructions)),
            Constraint::Length(1),
            Constraint::Length(block_height(&servers)),
            Constraint::Length(block_height(&apply)),
            Constraint::Min(1),
            Constraint::Length(2),
            Constraint::Length(help_height),
            Constraint::Length(1),
        ])
        .split(area);

    let title = Paragraph::new("MCP Manager for Claude Desktop")
        .alignment(Alignment::Center)
        .style(Style::default().add_modifier(Modifier::BOLD));
    frame.render_widget(title, layout[0]);

    render_block(frame, layout[1], "Instructions to load your config file (macOS)", instructions);
    frame.render_widget(Paragraph::new(status_line(state, now)), layout[2]);
    render_block(frame, layout[3], "MCP servers", servers);
    render_block(frame, layout[4], "Apply your changes", apply);

    if layout[5].height > 0 {
        let log: Vec<Line> = state
            .visible_log_lines(layout[5].height)
            .into_iter()
            .map(|line| {
                let style = match line.role {
                    LogRole::User => Style::default().fg(Color::Cyan),
                    LogRole::System => Style::default(),
                    LogRole::Error => Style::default().fg(Color::Red),
                };
                Line::from(Span::styled(line.text, style))
            })
            .collect();
        frame.render_widget(Paragraph::new(log).wrap(Wrap { trim: false }), layout[5]);
    }

    let input_block = Block::default().borders(Borders::TOP);
    let input_area = input_block.inner(layout[6]);
    frame.render_widget(input_block, layout[6]);
    let input_text = state.input_display();
    frame.render_widget(Paragraph::new(format!("> {}", input_text)), input_area);

    if help_height > 0 {
        let help = Paragraph::new(state.suggestions.as_str()).style(Style::default().fg(Color::Gray));
        frame.render_widget(help, layout[7]);
    }

    let footer = Paragraph::new(format!("build {} • Ctrl+C to quit • /help", state.status_build))
        .style(Style::default().fg(Color::Gray));
    frame.render_widget(footer, layout[8]);

    if input_area.height > 0 && input_area.width > 0 {
        let cursor_offset = UnicodeWidthStr::width(input_text.as_str()) as u16;
        let cursor_x = input_area
            .x
            .saturating_add(2)
            .saturating_add(cursor_offset)
            .min(input_area.x.saturating_add(input_area.width.saturating_sub(1)));
        frame.set_cursor(cursor_x, input_area.y);
    }
}

fn block_height(lines: &[Line]) -> u16 {
    if lines.is_empty() {
        0
    } else {
        (lines.len() as u16).saturating_add(2)
    }
}

fn render_block(frame: &mut Frame, area: Rect, title: &str, lines: Vec<Line<'static>>) {
    if lines.is_empty() || area.height == 0 {
        return;
    }
    let block = Block::default().title(title.to_string()).borders(Borders::ALL);
    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn instruction_lines(state: &AppState) -> Vec<Line<'static>> {
    if !state.editor.state().instructions_open {
        return Vec::new();
    }
    let command = bootstrap_command(state.editor.target_path());
    vec![
        Line::from("Step 1: Run this terminal command to copy your config (/bootstrap copies it)"),
        Line::from(Span::styled(command, Style::default().fg(Color::Yellow))),
        Line::from("Step 2: Paste the copied content below and press Enter."),
    ]
}

pub fn status_line(state: &AppState, now: Instant) -> Line<'static> {
    let mut spans = Vec::new();
    if state.editor.state().loading {
        let frames = ["|", "/", "-", "\\"];
        let spinner = frames[(state.tick / 2) as usize % frames.len()];
        spans.push(Span::styled(
            format!("• loading {} ", spinner),
            Style::default().fg(Color::Yellow),
        ));
    }
    match state.editor.status() {
        UploadStatus::Idle => spans.push(Span::styled(
            format!("• status: {}", UploadStatus::Idle.as_str()),
            Style::default().fg(Color::Gray),
        )),
        UploadStatus::Success => spans.push(Span::styled(
            format!("✓ {}", SUCCESS_MESSAGE),
            Style::default().fg(Color::Green),
        )),
        UploadStatus::Error => spans.push(Span::styled(
            format!("✗ {}", ERROR_MESSAGE),
            Style::default().fg(Color::Red),
        )),
    }
    if state.copy_acknowledged(now) {
        spans.push(Span::styled(
            "  copied!".to_string(),
            Style::default().fg(Color::Green),
        ));
    }
    Line::from(spans)
}

fn server_lines(state: &AppState) -> Vec<Line<'static>> {
    let editor = &state.editor;
    if !editor.show_servers() {
        return Vec::new();
    }
    let mut lines = Vec::new();
    for name in editor.document().server_names() {
        let detail = editor
            .document()
            .get(&name)
            .map(|value| value.to_string())
            .unwrap_or_default();
        lines.push(Line::from(vec![
            Span::styled(format!("{:<20}", name), Style::default().fg(Color::Green)),
            Span::raw(detail),
        ]));
    }
    for id in &editor.state().terminal_servers {
        lines.push(Line::from(vec![
            Span::styled(format!("{:<20}", id), Style::default().fg(Color::Magenta)),
            Span::raw("terminal install"),
        ]));
    }
    let available: Vec<&str> = editor
        .catalog()
        .iter()
        .filter(|entry| match entry.descriptor {
            ServerDescriptor::Merge { .. } => editor.document().get(&entry.id).is_none(),
            ServerDescriptor::Terminal { .. } => {
                !editor.state().terminal_servers.contains(&entry.id)
            }
        })
        .map(|entry| entry.id.as_str())
        .collect();
    if lines.is_empty() {
        lines.push(Line::from("(no servers)"));
    }
    lines.push(Line::from(Span::styled(
        format!("available: {}", available.join(", ")),
        Style::default().fg(Color::Gray),
    )));
    lines
}

fn apply_lines(state: &AppState) -> Vec<Line<'static>> {
    if !state.editor.show_servers() {
        return Vec::new();
    }
    let commands = state.editor.apply_commands();
    if commands.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![Line::from("Step 1: Run these terminal commands (/copy)")];
    for command in commands {
        lines.push(Line::from(Span::styled(command, Style::default().fg(Color::Yellow))));
    }
    lines.push(Line::from("Step 2: Restart Claude.app"));
    lines
}
