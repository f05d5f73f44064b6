use crate::history::{ ChatKey, SessionManager };
use crate::replies::{
    cli_failure_message,
    is_exit_token,
    CLI_ASSISTANT_PREFIX,
    CLI_BANNER,
    CLI_CLOSING,
    CLI_FINISHED,
    CLI_HINT,
    CLI_PROMPT,
};
use log::{ info, error };
use tokio::io::{ self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader };

/// The terminal front end keeps a single conversation.
pub const CLI_CHAT: ChatKey = 0;

const SEPARATOR: &str = "--------------------";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplExit {
    /// The user typed one of the exit tokens.
    Quit,
    EndOfInput,
    /// The provider rejected the API key; continuing would fail every turn.
    AuthFailed,
}

async fn say<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> io::Result<()> {
    output.write_all(text.as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await
}

/// Reads lines from `input`, relays each to the model and prints the reply.
pub async fn run_repl<R, W>(
    sessions: &SessionManager,
    input: R,
    mut output: W
) -> io::Result<ReplExit>
    where R: AsyncBufRead + Unpin, W: AsyncWrite + Unpin
{
    let mut lines = input.lines();
    sessions.ensure(CLI_CHAT).await;

    say(&mut output, &format!("\n{}", CLI_BANNER)).await?;
    say(&mut output, CLI_HINT).await?;
    say(&mut output, SEPARATOR).await?;

    let exit = loop {
        output.write_all(CLI_PROMPT.as_bytes()).await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            say(&mut output, "").await?;
            break ReplExit::EndOfInput;
        };

        if is_exit_token(&line) {
            say(&mut output, CLI_CLOSING).await?;
            break ReplExit::Quit;
        }
        if line.trim().is_empty() {
            continue;
        }

        match sessions.exchange(CLI_CHAT, &line).await {
            Ok(reply) => {
                say(&mut output, &format!("{}{}", CLI_ASSISTANT_PREFIX, reply.trim())).await?;
            }
            Err(e) => {
                let kind = e.kind();
                say(&mut output, cli_failure_message(kind)).await?;
                if kind.is_fatal() {
                    error!("Stopping the chat: {}", e);
                    break ReplExit::AuthFailed;
                }
            }
        }
    };

    say(&mut output, SEPARATOR).await?;
    say(&mut output, CLI_FINISHED).await?;
    info!("Terminal chat finished: {:?}", exit);
    Ok(exit)
}

pub async fn run_stdio(sessions: &SessionManager) -> io::Result<ReplExit> {
    run_repl(sessions, BufReader::new(io::stdin()), io::stdout()).await
}
