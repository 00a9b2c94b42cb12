//! Interactive command loop.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use heapscope_agent::HeapAgent;
use heapscope_core::prelude::*;

use crate::dispatch::Dispatcher;
use crate::prompt::ScriptPrompt;

pub const PROMPT: &str = "heapscope> ";

/// Split a command line into tokens.
///
/// Plain whitespace splitting: quotes have no meaning, so inline scripts
/// lose their spaces the same way they do on the command line.
pub fn tokenize(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

fn is_exit(tokens: &[String]) -> bool {
    matches!(
        tokens.first().map(String::as_str),
        Some("exit") | Some("quit")
    )
}

/// Read command lines from `input` until `exit`, `quit` or end of input.
///
/// Agent errors end only the command that raised them. A lost connection or
/// a broken console ends the loop with the error.
pub async fn run_shell<A, P, W, R>(dispatcher: &mut Dispatcher<A, P, W>, input: R) -> Result<()>
where
    A: HeapAgent,
    P: ScriptPrompt,
    W: Write,
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();

    loop {
        dispatcher.console().prompt(PROMPT)?;

        let Some(line) = lines.next_line().await? else {
            dispatcher.console().line("")?;
            break;
        };

        let tokens = tokenize(&line);
        if is_exit(&tokens) {
            break;
        }

        if let Err(e) = dispatcher.dispatch(&tokens).await {
            if e.is_fatal() || matches!(e, Error::Io(_)) {
                return Err(e);
            }
            warn!("Command {:?} failed: {}", tokens, e);
            dispatcher.console().error(&e)?;
        }
    }

    info!("Shell closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::Console;
    use crate::prompt::CannedPrompt;
    use heapscope_agent::test_utils::{AgentCall, FakeAgent};
    use tokio::io::BufReader;

    fn dispatcher(agent: FakeAgent) -> Dispatcher<FakeAgent, CannedPrompt, Vec<u8>> {
        Dispatcher::new(agent, CannedPrompt::default(), Console::buffer())
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("  ivars\t0x1   --to-utf8 "),
            vec!["ivars", "0x1", "--to-utf8"]
        );
        assert!(tokenize("   ").is_empty());
    }

    #[tokio::test]
    async fn test_shell_runs_until_exit() {
        let mut dispatcher = dispatcher(FakeAgent::new());
        let input = BufReader::new(&b"instances\n\ninstances NSObject\nexit\ninstances Never\n"[..]);

        run_shell(&mut dispatcher, input).await.unwrap();

        assert_eq!(
            dispatcher.agent().calls(),
            vec![AgentCall::ListLiveInstances {
                class_name: "NSObject".to_string()
            }]
        );
        let text = dispatcher.into_console().text();
        assert_eq!(text.matches(PROMPT).count(), 4);
        assert!(text.contains("Usage: instances"));
    }

    #[tokio::test]
    async fn test_shell_stops_at_end_of_input() {
        let mut dispatcher = dispatcher(FakeAgent::new());

        run_shell(&mut dispatcher, BufReader::new(&b"help"[..]))
            .await
            .unwrap();

        let text = dispatcher.into_console().text();
        assert!(text.contains("Commands:"));
        assert!(text.ends_with(&format!("{PROMPT}\n")));
    }

    #[tokio::test]
    async fn test_shell_survives_agent_errors() {
        let mut dispatcher = dispatcher(FakeAgent::new().failing_with(-32000, "stale pointer"));
        let input = BufReader::new(&b"ivars 0xdead\nmethods 0xdead\nquit\n"[..]);

        run_shell(&mut dispatcher, input).await.unwrap();

        assert_eq!(dispatcher.agent().call_count(), 2);
        let text = dispatcher.into_console().text();
        assert_eq!(text.matches("stale pointer").count(), 2);
    }

    #[tokio::test]
    async fn test_shell_ends_when_connection_is_lost() {
        let mut dispatcher = dispatcher(FakeAgent::new().disconnected());
        let input = BufReader::new(&b"ivars 0x1
methods 0x1
quit
"[..]);

        let err = run_shell(&mut dispatcher, input).await.unwrap_err();

        assert!(matches!(err, Error::ChannelClosed));
        assert_eq!(dispatcher.agent().call_count(), 1);
    }
}
