//! Terminal output for command results.
//!
//! Everything a command prints goes through [`Console`], which owns the
//! writer and the UI settings. Logs never go here; they go to the log file.

use std::fmt::Display;
use std::io::{self, Write};

use comfy_table::Table;
use crossterm::style::Stylize;

use crate::config::{TableStyle, UiSettings};

/// Styled line writer over any [`Write`].
pub struct Console<W: Write> {
    out: W,
    color: bool,
    table_style: TableStyle,
}

impl Console<io::Stdout> {
    pub fn stdout(ui: &UiSettings) -> Self {
        Self::new(io::stdout(), ui)
    }
}

impl Console<Vec<u8>> {
    /// Uncolored in-memory console.
    pub fn buffer() -> Self {
        Self {
            out: Vec::new(),
            color: false,
            table_style: TableStyle::Utf8,
        }
    }

    /// Everything written so far.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.out).into_owned()
    }
}

impl<W: Write> Console<W> {
    pub fn new(out: W, ui: &UiSettings) -> Self {
        Self {
            out,
            color: ui.color,
            table_style: ui.table_style,
        }
    }

    pub fn color(&self) -> bool {
        self.color
    }

    pub fn table_style(&self) -> TableStyle {
        self.table_style
    }

    pub fn line(&mut self, text: impl Display) -> io::Result<()> {
        writeln!(self.out, "{}", text)
    }

    /// Usage text, bold.
    pub fn usage(&mut self, text: impl Display) -> io::Result<()> {
        self.styled(text.to_string(), |s| s.bold().to_string())
    }

    /// Refusals and other non-fatal warnings, yellow.
    pub fn warning(&mut self, text: impl Display) -> io::Result<()> {
        self.styled(text.to_string(), |s| s.yellow().to_string())
    }

    /// Progress notes, dim.
    pub fn note(&mut self, text: impl Display) -> io::Result<()> {
        self.styled(text.to_string(), |s| s.dim().to_string())
    }

    /// Echo of a script about to be evaluated, dim green.
    pub fn script(&mut self, text: impl Display) -> io::Result<()> {
        self.styled(text.to_string(), |s| s.green().dim().to_string())
    }

    pub fn error(&mut self, text: impl Display) -> io::Result<()> {
        self.styled(text.to_string(), |s| s.red().to_string())
    }

    pub fn table(&mut self, table: &Table) -> io::Result<()> {
        writeln!(self.out, "{table}")
    }

    /// Write `text` without a newline and flush, for prompts.
    pub fn prompt(&mut self, text: &str) -> io::Result<()> {
        write!(self.out, "{}", text)?;
        self.out.flush()
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn styled(&mut self, text: String, style: impl FnOnce(String) -> String) -> io::Result<()> {
        if self.color {
            writeln!(self.out, "{}", style(text))
        } else {
            writeln!(self.out, "{}", text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_console_writes_unstyled_lines() {
        let mut console = Console::buffer();
        console.usage("Usage: ivars <pointer>").unwrap();
        console.warning("careful").unwrap();
        console.prompt("heapscope> ").unwrap();

        assert_eq!(
            console.text(),
            "Usage: ivars <pointer>\ncareful\nheapscope> "
        );
    }

    #[test]
    fn test_colored_console_emits_escape_codes() {
        let ui = UiSettings {
            color: true,
            table_style: TableStyle::Ascii,
        };
        let mut console = Console::new(Vec::new(), &ui);
        console.usage("Usage: methods <pointer>").unwrap();

        let text = String::from_utf8(console.into_inner()).unwrap();
        assert!(text.contains("Usage: methods <pointer>"));
        assert!(text.contains('\u{1b}'));
    }
}
