//! The five heap command handlers.
//!
//! Every handler follows the same flow: validate the tokens into a params
//! struct, make at most one agent call, then print. Usage problems and
//! refusals are printed and reported through [`Outcome`]; only agent and I/O
//! failures come back as `Err`.

use std::io::Write;

use heapscope_agent::HeapAgent;
use heapscope_core::prelude::*;
use heapscope_core::takes_arguments;

use crate::command::{
    CommandKind, EvaluateParams, ExecuteParams, InstancesParams, IvarsParams, MethodsParams,
    ScriptSource, UsageError,
};
use crate::console::Console;
use crate::prompt::ScriptPrompt;
use crate::render;

/// How a command ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The agent call succeeded and its result was printed
    Completed,
    /// The agent returned nothing to show; nothing was printed
    Empty,
    /// A required argument was missing; usage was printed
    Usage,
    /// The request cannot be served; a warning was printed
    Refused,
    /// The operator cancelled script entry
    Cancelled,
    /// Help text was printed
    Help,
    /// The command name was not recognised
    Unknown,
}

fn report_usage<W: Write>(console: &mut Console<W>, err: UsageError) -> Result<Outcome> {
    console.usage(&err)?;
    Ok(Outcome::Usage)
}

// ─────────────────────────────────────────────────────────────────────────────
// instances
// ─────────────────────────────────────────────────────────────────────────────

pub async fn instances<A: HeapAgent, W: Write>(
    agent: &A,
    console: &mut Console<W>,
    args: &[String],
) -> Result<Outcome> {
    match InstancesParams::parse(args) {
        Ok(params) => run_instances(agent, console, &params).await,
        Err(e) => report_usage(console, e),
    }
}

pub async fn run_instances<A: HeapAgent, W: Write>(
    agent: &A,
    console: &mut Console<W>,
    params: &InstancesParams,
) -> Result<Outcome> {
    let found = agent.list_live_instances(&params.class_name).await?;
    debug!("{} live instances of {}", found.len(), params.class_name);

    if found.is_empty() {
        return Ok(Outcome::Empty);
    }

    let table = render::instances_table(&found, console.table_style(), console.color());
    console.table(&table)?;
    Ok(Outcome::Completed)
}

// ─────────────────────────────────────────────────────────────────────────────
// ivars
// ─────────────────────────────────────────────────────────────────────────────

pub async fn ivars<A: HeapAgent, W: Write>(
    agent: &A,
    console: &mut Console<W>,
    args: &[String],
) -> Result<Outcome> {
    match IvarsParams::parse(args) {
        Ok(params) => run_ivars(agent, console, &params).await,
        Err(e) => report_usage(console, e),
    }
}

pub async fn run_ivars<A: HeapAgent, W: Write>(
    agent: &A,
    console: &mut Console<W>,
    params: &IvarsParams,
) -> Result<Outcome> {
    let dump = agent.dump_ivars(&params.pointer, params.utf8).await?;

    let table = render::ivars_table(&dump, console.table_style(), console.color());
    console.table(&table)?;
    Ok(Outcome::Completed)
}

// ─────────────────────────────────────────────────────────────────────────────
// methods
// ─────────────────────────────────────────────────────────────────────────────

pub async fn methods<A: HeapAgent, W: Write>(
    agent: &A,
    console: &mut Console<W>,
    args: &[String],
) -> Result<Outcome> {
    match MethodsParams::parse(args) {
        Ok(params) => run_methods(agent, console, &params).await,
        Err(e) => report_usage(console, e),
    }
}

pub async fn run_methods<A: HeapAgent, W: Write>(
    agent: &A,
    console: &mut Console<W>,
    params: &MethodsParams,
) -> Result<Outcome> {
    let mut list = agent.list_methods(&params.pointer).await?;
    if params.without_arguments {
        list = list.without_arguments();
    }

    let table = render::methods_table(&list, console.table_style(), console.color());
    console.table(&table)?;
    Ok(Outcome::Completed)
}

// ─────────────────────────────────────────────────────────────────────────────
// execute
// ─────────────────────────────────────────────────────────────────────────────

pub async fn execute<A: HeapAgent, W: Write>(
    agent: &A,
    console: &mut Console<W>,
    args: &[String],
) -> Result<Outcome> {
    match ExecuteParams::parse(args) {
        Ok(params) => run_execute(agent, console, &params).await,
        Err(e) => report_usage(console, e),
    }
}

pub async fn run_execute<A: HeapAgent, W: Write>(
    agent: &A,
    console: &mut Console<W>,
    params: &ExecuteParams,
) -> Result<Outcome> {
    if takes_arguments(&params.selector) {
        console.warning(format!(
            "Executing methods that take arguments is not supported ({})",
            params.selector
        ))?;
        return Ok(Outcome::Refused);
    }

    let result = agent
        .invoke_method(&params.pointer, &params.selector, params.return_as_string)
        .await?;

    console.line(render::format_result(&result))?;
    Ok(Outcome::Completed)
}

// ─────────────────────────────────────────────────────────────────────────────
// evaluate
// ─────────────────────────────────────────────────────────────────────────────

pub async fn evaluate<A: HeapAgent, P: ScriptPrompt, W: Write>(
    agent: &A,
    prompt: &mut P,
    console: &mut Console<W>,
    args: &[String],
) -> Result<Outcome> {
    match EvaluateParams::parse(args) {
        Ok(params) => run_evaluate(agent, prompt, console, &params).await,
        Err(e) => report_usage(console, e),
    }
}

pub async fn run_evaluate<A: HeapAgent, P: ScriptPrompt, W: Write>(
    agent: &A,
    prompt: &mut P,
    console: &mut Console<W>,
    params: &EvaluateParams,
) -> Result<Outcome> {
    let script = match &params.source {
        ScriptSource::Inline(script) => {
            if script.trim().is_empty() {
                return report_usage(console, UsageError::new(CommandKind::Evaluate));
            }
            console.note("Reading inline JavaScript for evaluation...")?;
            console.script(script)?;
            script.clone()
        }
        ScriptSource::Interactive => {
            console.flush()?;
            match prompt.read_script(&params.pointer)? {
                Some(script) => {
                    console.note("JavaScript capture complete. Evaluating...")?;
                    script
                }
                None => {
                    console.note("Script entry cancelled.")?;
                    return Ok(Outcome::Cancelled);
                }
            }
        }
    };

    agent.evaluate_script(&params.pointer, &script).await?;
    info!("Evaluated {} byte script against {}", script.len(), params.pointer);
    Ok(Outcome::Completed)
}
