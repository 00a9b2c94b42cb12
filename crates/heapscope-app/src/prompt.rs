//! Script acquisition for `evaluate`.

use heapscope_core::prelude::*;

/// Asks the operator for a script to run against an object.
///
/// Implementations block until the operator accepts or cancels.
pub trait ScriptPrompt {
    /// Returns the trimmed script, or `None` when the operator cancelled or
    /// accepted an empty buffer.
    fn read_script(&mut self, pointer: &str) -> Result<Option<String>>;
}

impl<P: ScriptPrompt + ?Sized> ScriptPrompt for Box<P> {
    fn read_script(&mut self, pointer: &str) -> Result<Option<String>> {
        (**self).read_script(pointer)
    }
}

/// Prompt used when no interactive terminal is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTerminalPrompt;

impl ScriptPrompt for NoTerminalPrompt {
    fn read_script(&mut self, _pointer: &str) -> Result<Option<String>> {
        Err(Error::terminal(
            "the script editor needs an interactive terminal; pass --inline <script>",
        ))
    }
}

/// Prompt with a fixed answer, for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct CannedPrompt {
    pub answer: Option<String>,
    pub opened: usize,
}

#[cfg(test)]
impl ScriptPrompt for CannedPrompt {
    fn read_script(&mut self, _pointer: &str) -> Result<Option<String>> {
        self.opened += 1;
        Ok(self.answer.clone())
    }
}
