//! # heapscope-tui - Script Editor
//!
//! Interactive JavaScript entry for the `evaluate` command.
//!
//! - [`TerminalScriptPrompt`] - [`ScriptPrompt`] backed by the inline editor
//! - [`editor`] - Buffer, key handling and rendering
//! - [`highlight`] - JavaScript token highlighting

pub mod editor;
pub mod highlight;

use heapscope_app::ScriptPrompt;
use heapscope_core::prelude::*;

pub use editor::{edit_script, ScriptEditor, TOOLBAR_TEXT};

/// Opens the inline script editor on the controlling terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalScriptPrompt;

impl ScriptPrompt for TerminalScriptPrompt {
    fn read_script(&mut self, pointer: &str) -> Result<Option<String>> {
        debug!("Opening script editor for {}", pointer);
        edit_script(pointer)
    }
}
