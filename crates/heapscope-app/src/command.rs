//! Heap commands and their validated parameters.
//!
//! Each command takes a flat token list. Required positionals are read by
//! index; flags may appear anywhere. Parsing never contacts the agent: a
//! missing positional becomes a [`UsageError`] before any remote call.

use thiserror::Error;

use crate::args::{
    should_ignore_methods_with_arguments, should_interpret_inline_script, should_print_as_utf8,
    should_return_as_string, Flag,
};

/// The five heap commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Instances,
    Ivars,
    Methods,
    Execute,
    Evaluate,
}

impl CommandKind {
    pub const ALL: [CommandKind; 5] = [
        CommandKind::Instances,
        CommandKind::Ivars,
        CommandKind::Methods,
        CommandKind::Execute,
        CommandKind::Evaluate,
    ];

    /// Short command name.
    pub fn name(self) -> &'static str {
        match self {
            CommandKind::Instances => "instances",
            CommandKind::Ivars => "ivars",
            CommandKind::Methods => "methods",
            CommandKind::Execute => "execute",
            CommandKind::Evaluate => "evaluate",
        }
    }

    /// Agent-menu form of the command name.
    pub fn long_name(self) -> &'static str {
        match self {
            CommandKind::Instances => "ios heap search instances",
            CommandKind::Ivars => "ios heap print ivars",
            CommandKind::Methods => "ios heap print methods",
            CommandKind::Execute => "ios heap execute method",
            CommandKind::Evaluate => "ios heap execute js",
        }
    }

    pub fn usage(self) -> &'static str {
        match self {
            CommandKind::Instances => "instances <class> (eg: UIViewController)",
            CommandKind::Ivars => "ivars <pointer> [--to-utf8] (eg: 0x600001130660)",
            CommandKind::Methods => "methods <pointer> [--without-arguments] (eg: 0x600001130660)",
            CommandKind::Execute => {
                "execute <pointer> <selector> [--return-string] (eg: 0x600001130660 description)"
            }
            CommandKind::Evaluate => {
                "evaluate <pointer> [--inline <script>] (eg: 0x600001130660 --inline ptr.title())"
            }
        }
    }

    pub fn summary(self) -> &'static str {
        match self {
            CommandKind::Instances => "Search the heap for live instances of a class",
            CommandKind::Ivars => "Print the instance variables of an object",
            CommandKind::Methods => "Print the methods of an object's class",
            CommandKind::Execute => "Invoke a method that takes no arguments",
            CommandKind::Evaluate => "Evaluate JavaScript with the object bound as `ptr`",
        }
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A required positional argument is missing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Usage: {}", .kind.usage())]
pub struct UsageError {
    pub kind: CommandKind,
}

impl UsageError {
    pub fn new(kind: CommandKind) -> Self {
        Self { kind }
    }
}

/// Required positional at `index`.
///
/// A flag literal in that slot counts as missing, so `ivars --to-utf8` is a
/// usage error instead of a lookup of the pointer `--to-utf8`.
fn positional(args: &[String], index: usize, kind: CommandKind) -> Result<String, UsageError> {
    match args.get(index) {
        Some(arg) if !Flag::is_flag(arg) => Ok(arg.clone()),
        _ => Err(UsageError::new(kind)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstancesParams {
    pub class_name: String,
}

impl InstancesParams {
    pub fn parse(args: &[String]) -> Result<Self, UsageError> {
        Ok(Self {
            class_name: positional(args, 0, CommandKind::Instances)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IvarsParams {
    pub pointer: String,
    pub utf8: bool,
}

impl IvarsParams {
    pub fn parse(args: &[String]) -> Result<Self, UsageError> {
        Ok(Self {
            pointer: positional(args, 0, CommandKind::Ivars)?,
            utf8: should_print_as_utf8(args),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodsParams {
    pub pointer: String,
    pub without_arguments: bool,
}

impl MethodsParams {
    pub fn parse(args: &[String]) -> Result<Self, UsageError> {
        Ok(Self {
            pointer: positional(args, 0, CommandKind::Methods)?,
            without_arguments: should_ignore_methods_with_arguments(args),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteParams {
    pub pointer: String,
    pub selector: String,
    pub return_as_string: bool,
}

impl ExecuteParams {
    pub fn parse(args: &[String]) -> Result<Self, UsageError> {
        Ok(Self {
            pointer: positional(args, 0, CommandKind::Execute)?,
            selector: positional(args, 1, CommandKind::Execute)?,
            return_as_string: should_return_as_string(args),
        })
    }
}

/// Where `evaluate` gets its script from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource {
    /// Tokens after the pointer with `--inline` removed, joined without a
    /// separator
    Inline(String),
    /// Ask the operator through a [`crate::ScriptPrompt`]
    Interactive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluateParams {
    pub pointer: String,
    pub source: ScriptSource,
}

impl EvaluateParams {
    pub fn parse(args: &[String]) -> Result<Self, UsageError> {
        let pointer = positional(args, 0, CommandKind::Evaluate)?;

        let source = if should_interpret_inline_script(args) {
            let script = args[1..]
                .iter()
                .filter(|arg| arg.as_str() != Flag::Inline.literal())
                .map(String::as_str)
                .collect::<String>();
            ScriptSource::Inline(script)
        } else {
            ScriptSource::Interactive
        };

        Ok(Self { pointer, source })
    }
}

/// A fully validated command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Instances(InstancesParams),
    Ivars(IvarsParams),
    Methods(MethodsParams),
    Execute(ExecuteParams),
    Evaluate(EvaluateParams),
}

impl Command {
    pub fn parse(kind: CommandKind, args: &[String]) -> Result<Self, UsageError> {
        Ok(match kind {
            CommandKind::Instances => Command::Instances(InstancesParams::parse(args)?),
            CommandKind::Ivars => Command::Ivars(IvarsParams::parse(args)?),
            CommandKind::Methods => Command::Methods(MethodsParams::parse(args)?),
            CommandKind::Execute => Command::Execute(ExecuteParams::parse(args)?),
            CommandKind::Evaluate => Command::Evaluate(EvaluateParams::parse(args)?),
        })
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Instances(_) => CommandKind::Instances,
            Command::Ivars(_) => CommandKind::Ivars,
            Command::Methods(_) => CommandKind::Methods,
            Command::Execute(_) => CommandKind::Execute,
            Command::Evaluate(_) => CommandKind::Evaluate,
        }
    }
}
