//! Optional command flags.
//!
//! Flags are plain tokens anywhere in a command's argument list. They are not
//! validated against a schema: a predicate only asks whether its literal is
//! present, and unknown tokens are ignored.

/// Flags understood by the heap commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    /// `methods`: hide methods that take arguments
    WithoutArguments,
    /// `ivars`: ask the agent for UTF-8 renderings of values
    ToUtf8,
    /// `execute`: ask the agent to return the result as a string
    ReturnString,
    /// `evaluate`: take the script from the remaining tokens
    Inline,
}

impl Flag {
    pub const ALL: [Flag; 4] = [
        Flag::WithoutArguments,
        Flag::ToUtf8,
        Flag::ReturnString,
        Flag::Inline,
    ];

    pub fn literal(self) -> &'static str {
        match self {
            Flag::WithoutArguments => "--without-arguments",
            Flag::ToUtf8 => "--to-utf8",
            Flag::ReturnString => "--return-string",
            Flag::Inline => "--inline",
        }
    }

    /// Whether `token` is one of the flag literals.
    pub fn is_flag(token: &str) -> bool {
        Self::ALL.iter().any(|flag| flag.literal() == token)
    }

    pub fn is_set(self, args: &[String]) -> bool {
        args.iter().any(|arg| arg == self.literal())
    }
}

pub fn should_ignore_methods_with_arguments(args: &[String]) -> bool {
    Flag::WithoutArguments.is_set(args)
}

pub fn should_print_as_utf8(args: &[String]) -> bool {
    Flag::ToUtf8.is_set(args)
}

pub fn should_return_as_string(args: &[String]) -> bool {
    Flag::ReturnString.is_set(args)
}

pub fn should_interpret_inline_script(args: &[String]) -> bool {
    Flag::Inline.is_set(args)
}
