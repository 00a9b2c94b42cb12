//! Command dispatch.
//!
//! A command line is a flat token list whose leading tokens name the command,
//! either by its short name (`ivars`) or by its agent-menu form
//! (`ios heap print ivars`). The longest matching form wins and the remaining
//! tokens become the command's arguments.

use std::io::Write;

use heapscope_agent::HeapAgent;
use heapscope_core::prelude::*;

use crate::command::CommandKind;
use crate::console::Console;
use crate::handlers::{self, Outcome};
use crate::prompt::ScriptPrompt;

/// Find the command named by the leading tokens.
///
/// Returns the command and how many tokens its name used.
pub fn resolve_command(tokens: &[String]) -> Option<(CommandKind, usize)> {
    CommandKind::ALL
        .iter()
        .flat_map(|&kind| [(kind, kind.name()), (kind, kind.long_name())])
        .filter_map(|(kind, form)| {
            let words: Vec<&str> = form.split_whitespace().collect();
            let matches = tokens.len() >= words.len()
                && words.iter().zip(tokens).all(|(word, token)| word == token);
            matches.then_some((kind, words.len()))
        })
        .max_by_key(|&(_, consumed)| consumed)
}

/// Routes command lines to the handlers.
///
/// Owns the agent session, the script prompt and the console for the life of
/// the process.
pub struct Dispatcher<A, P, W: Write> {
    agent: A,
    prompt: P,
    console: Console<W>,
}

impl<A: HeapAgent, P: ScriptPrompt, W: Write> Dispatcher<A, P, W> {
    pub fn new(agent: A, prompt: P, console: Console<W>) -> Self {
        Self {
            agent,
            prompt,
            console,
        }
    }

    pub fn agent(&self) -> &A {
        &self.agent
    }

    pub fn console(&mut self) -> &mut Console<W> {
        &mut self.console
    }

    pub fn into_console(self) -> Console<W> {
        self.console
    }

    /// Run one command line.
    pub async fn dispatch(&mut self, tokens: &[String]) -> Result<Outcome> {
        let Some(first) = tokens.first() else {
            return Ok(Outcome::Empty);
        };

        if first == "help" {
            self.print_help()?;
            return Ok(Outcome::Help);
        }

        let Some((kind, consumed)) = resolve_command(tokens) else {
            debug!("Unknown command {:?}", tokens);
            self.console
                .warning(format!("Unknown command: {}", tokens.join(" ")))?;
            self.print_command_list()?;
            return Ok(Outcome::Unknown);
        };

        let args = &tokens[consumed..];
        debug!("Dispatching {} with {:?}", kind, args);

        match kind {
            CommandKind::Instances => handlers::instances(&self.agent, &mut self.console, args).await,
            CommandKind::Ivars => handlers::ivars(&self.agent, &mut self.console, args).await,
            CommandKind::Methods => handlers::methods(&self.agent, &mut self.console, args).await,
            CommandKind::Execute => handlers::execute(&self.agent, &mut self.console, args).await,
            CommandKind::Evaluate => {
                handlers::evaluate(&self.agent, &mut self.prompt, &mut self.console, args).await
            }
        }
    }

    fn print_command_list(&mut self) -> Result<()> {
        let names: Vec<&str> = CommandKind::ALL.iter().map(|k| k.name()).collect();
        self.console
            .line(format!("Commands: {}, help", names.join(", ")))?;
        Ok(())
    }

    fn print_help(&mut self) -> Result<()> {
        self.console.line("Commands:")?;
        for kind in CommandKind::ALL {
            self.console.usage(format!("  {}", kind.usage()))?;
            self.console
                .line(format!("      {} (also: {})", kind.summary(), kind.long_name()))?;
        }
        self.console.line("  help")?;
        self.console.line("      Show this list")?;
        Ok(())
    }
}
