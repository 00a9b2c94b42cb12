//! Multi-line script editor for `evaluate`
//!
//! Runs in an inline viewport below the shell prompt, so the operator keeps
//! the preceding output on screen. Accepting takes two keys: Esc arms the
//! gesture and Enter completes it. Any other key disarms it and is then
//! handled normally.

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    DefaultTerminal, Frame, TerminalOptions, Viewport,
};
use unicode_width::UnicodeWidthStr;

use heapscope_core::prelude::*;

use crate::highlight::{highlight_lines, POINTER_BINDING};

/// Height of the inline viewport, including header and toolbar.
pub const EDITOR_HEIGHT: u16 = 12;

pub const TOOLBAR_TEXT: &str =
    "JavaScript edit mode. [ESC] and then [ENTER] to accept. [CTRL] + C to cancel.";

const GUTTER_WIDTH: u16 = 4;
const TAB: &str = "  ";

/// What the event loop should do after a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorAction {
    Continue,
    Accept,
    Cancel,
}

/// Text buffer with a cursor.
///
/// The cursor column counts characters, not bytes.
#[derive(Debug, Clone)]
pub struct ScriptEditor {
    lines: Vec<String>,
    row: usize,
    col: usize,
    armed: bool,
}

impl Default for ScriptEditor {
    fn default() -> Self {
        Self {
            lines: vec![String::new()],
            row: 0,
            col: 0,
            armed: false,
        }
    }
}

impl ScriptEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// `(row, column)` of the cursor.
    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    /// Whether Esc was pressed and Enter will accept.
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// The buffer, trimmed. `None` when nothing but whitespace was entered.
    pub fn script(&self) -> Option<String> {
        let text = self.lines.join("\n");
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> EditorAction {
        if is_cancel_key(code, modifiers) {
            return EditorAction::Cancel;
        }

        if code == KeyCode::Esc {
            self.armed = true;
            return EditorAction::Continue;
        }

        if std::mem::take(&mut self.armed) && code == KeyCode::Enter {
            return EditorAction::Accept;
        }

        match code {
            KeyCode::Char(c)
                if !modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.insert_str(&c.to_string());
            }
            KeyCode::Tab => self.insert_str(TAB),
            KeyCode::Enter => self.newline(),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.move_left(),
            KeyCode::Right => self.move_right(),
            KeyCode::Up => self.move_vertical(-1),
            KeyCode::Down => self.move_vertical(1),
            KeyCode::Home => self.col = 0,
            KeyCode::End => self.col = self.current_len(),
            _ => {}
        }

        EditorAction::Continue
    }

    fn current_len(&self) -> usize {
        self.lines[self.row].chars().count()
    }

    fn byte_offset(&self, col: usize) -> usize {
        let line = &self.lines[self.row];
        line.char_indices()
            .nth(col)
            .map(|(i, _)| i)
            .unwrap_or(line.len())
    }

    fn insert_str(&mut self, text: &str) {
        let at = self.byte_offset(self.col);
        self.lines[self.row].insert_str(at, text);
        self.col += text.chars().count();
    }

    fn newline(&mut self) {
        let at = self.byte_offset(self.col);
        let rest = self.lines[self.row].split_off(at);
        self.lines.insert(self.row + 1, rest);
        self.row += 1;
        self.col = 0;
    }

    fn backspace(&mut self) {
        if self.col > 0 {
            let at = self.byte_offset(self.col - 1);
            self.lines[self.row].remove(at);
            self.col -= 1;
        } else if self.row > 0 {
            let line = self.lines.remove(self.row);
            self.row -= 1;
            self.col = self.current_len();
            self.lines[self.row].push_str(&line);
        }
    }

    fn delete(&mut self) {
        if self.col < self.current_len() {
            let at = self.byte_offset(self.col);
            self.lines[self.row].remove(at);
        } else if self.row + 1 < self.lines.len() {
            let next = self.lines.remove(self.row + 1);
            self.lines[self.row].push_str(&next);
        }
    }

    fn move_left(&mut self) {
        if self.col > 0 {
            self.col -= 1;
        } else if self.row > 0 {
            self.row -= 1;
            self.col = self.current_len();
        }
    }

    fn move_right(&mut self) {
        if self.col < self.current_len() {
            self.col += 1;
        } else if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = 0;
        }
    }

    fn move_vertical(&mut self, delta: isize) {
        let target = self.row as isize + delta;
        if target < 0 || target as usize >= self.lines.len() {
            return;
        }
        self.row = target as usize;
        self.col = self.col.min(self.current_len());
    }
}

/// Ctrl+C cancels the editor.
///
/// Esc is not a cancel key here; it arms the accept gesture.
pub fn is_cancel_key(code: KeyCode, modifiers: KeyModifiers) -> bool {
    matches!(code, KeyCode::Char('c') | KeyCode::Char('C'))
        && modifiers.contains(KeyModifiers::CONTROL)
}

/// Open the editor and block until the operator accepts or cancels.
///
/// Returns the trimmed script, or `None` on cancel or an empty buffer.
pub fn edit_script(pointer: &str) -> Result<Option<String>> {
    let mut terminal = ratatui::try_init_with_options(TerminalOptions {
        viewport: Viewport::Inline(EDITOR_HEIGHT),
    })
    .map_err(|e| Error::terminal(e.to_string()))?;

    let result = run_editor(&mut terminal, pointer);

    if let Err(e) = terminal.clear() {
        warn!("Failed to clear editor viewport: {}", e);
    }
    ratatui::restore();

    result
}

fn run_editor(terminal: &mut DefaultTerminal, pointer: &str) -> Result<Option<String>> {
    let mut editor = ScriptEditor::new();

    loop {
        terminal
            .draw(|frame| render_editor(frame, &editor, pointer))
            .map_err(|e| Error::terminal(e.to_string()))?;

        if event::poll(Duration::from_millis(100)).map_err(|e| Error::terminal(e.to_string()))? {
            if let Event::Key(KeyEvent {
                code,
                modifiers,
                kind: KeyEventKind::Press,
                ..
            }) = event::read().map_err(|e| Error::terminal(e.to_string()))?
            {
                match editor.handle_key(code, modifiers) {
                    EditorAction::Continue => {}
                    EditorAction::Accept => {
                        debug!("Script accepted ({} lines)", editor.lines().len());
                        return Ok(editor.script());
                    }
                    EditorAction::Cancel => {
                        debug!("Script entry cancelled");
                        return Ok(None);
                    }
                }
            }
        }
    }
}

/// Render header, buffer and toolbar.
pub fn render_editor(frame: &mut Frame, editor: &ScriptEditor, pointer: &str) {
    let [header_area, body_area, toolbar_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    let header = Line::from(vec![
        Span::styled(
            pointer.to_string(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" is available to the script as "),
        Span::styled(
            POINTER_BINDING,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
    ]);
    frame.render_widget(Paragraph::new(header), header_area);

    let [gutter_area, text_area] =
        Layout::horizontal([Constraint::Length(GUTTER_WIDTH), Constraint::Min(1)])
            .areas(body_area);

    let (row, col) = editor.cursor();
    let height = text_area.height as usize;
    let top = (row + 1).saturating_sub(height);

    let numbers: Vec<Line> = (top..editor.lines().len())
        .take(height)
        .map(|n| {
            Line::styled(
                format!("{:>3} ", n + 1),
                Style::default().fg(Color::DarkGray),
            )
        })
        .collect();
    frame.render_widget(Paragraph::new(numbers), gutter_area);

    // Scroll left far enough that the cursor column stays inside the text area
    let prefix: String = editor.lines()[row].chars().take(col).collect();
    let cursor_width = prefix.width();
    let left = cursor_width.saturating_sub(usize::from(text_area.width.saturating_sub(1)));

    let highlighted: Vec<Line> = highlight_lines(editor.lines())
        .into_iter()
        .skip(top)
        .take(height)
        .collect();
    frame.render_widget(
        Paragraph::new(highlighted).scroll((0, u16::try_from(left).unwrap_or(u16::MAX))),
        text_area,
    );

    let toolbar_style = if editor.is_armed() {
        Style::default().fg(Color::Black).bg(Color::Yellow)
    } else {
        Style::default().fg(Color::Black).bg(Color::Gray)
    };
    frame.render_widget(
        Paragraph::new(Line::from(TOOLBAR_TEXT)).style(toolbar_style),
        toolbar_area,
    );

    let offset = u16::try_from(cursor_width - left).unwrap_or(u16::MAX);
    let x = text_area.x + offset.min(text_area.width.saturating_sub(1));
    let y = text_area.y + (row - top) as u16;
    frame.set_cursor_position((x, y));
}
