mod bootstrap_helpers;
mod cli_args;
mod command_text;
mod document_loader;
mod transcript_render;

use std::io::BufRead;

use anyhow::{Context, Result};
use clap::Parser;
use esg_runtime::{SessionCommand, SessionRuntime};
use esg_session::{PendingInputKind, SessionSnapshot, TransportState};
use tokio::sync::{mpsc, watch};

use crate::bootstrap_helpers::init_tracing;
use crate::cli_args::Cli;
use crate::command_text::{parse_interactive_command, InteractiveCommand, INTERACTIVE_USAGE};
use crate::document_loader::load_documents;
use crate::transcript_render::{format_status, TerminalRenderer};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    run_cli(cli).await
}

async fn run_cli(cli: Cli) -> Result<()> {
    let mut runtime = SessionRuntime::new(&cli.runtime_config())?;
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (status_tx, status_rx) = watch::channel(runtime.controller().snapshot());
    let mut renderer = TerminalRenderer::new(std::io::stdout(), status_tx);

    println!("{INTERACTIVE_USAGE}\n");
    if let Some(company) = cli.company.as_deref() {
        let command = submit_command(company, &cli.files).await;
        command_tx
            .send(command)
            .context("session loop stopped before the first submission")?;
    }

    let input_task = tokio::spawn(read_reviewer_input(
        spawn_stdin_reader(),
        command_tx,
        status_rx,
    ));
    let result = runtime.run(command_rx, &mut renderer).await;
    input_task.abort();
    result
}

async fn submit_command<P: AsRef<std::path::Path>>(subject: &str, paths: &[P]) -> SessionCommand {
    let loaded = load_documents(paths).await;
    for skipped in &loaded.skipped {
        eprintln!("skipping {}: {}", skipped.path.display(), skipped.reason);
    }
    SessionCommand::Submit {
        subject: subject.to_string(),
        documents: loaded.documents,
    }
}

/// Stdin is read on a plain thread so a pending read never holds up shutdown.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (line_tx, line_rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if line_tx.send(line).is_err() {
                break;
            }
        }
    });
    line_rx
}

/// Forwards reviewer lines to the session loop until `/quit` or end of input.
async fn read_reviewer_input(
    mut lines: mpsc::UnboundedReceiver<String>,
    commands: mpsc::UnboundedSender<SessionCommand>,
    mut status: watch::Receiver<SessionSnapshot>,
) {
    while let Some(line) = lines.recv().await {
        let awaiting_comment = status.borrow().pending_input
            == Some(PendingInputKind::ConfirmationWithComment);
        let command = match parse_interactive_command(&line, awaiting_comment) {
            InteractiveCommand::Empty => continue,
            InteractiveCommand::Help => {
                println!("{INTERACTIVE_USAGE}");
                continue;
            }
            InteractiveCommand::Status => {
                println!("{}", format_status(&status.borrow()));
                continue;
            }
            InteractiveCommand::Invalid { message } => {
                eprintln!("{message}");
                continue;
            }
            InteractiveCommand::Approve => SessionCommand::Approve,
            InteractiveCommand::Reject => SessionCommand::Reject,
            InteractiveCommand::Comment(text) => SessionCommand::Comment(text),
            InteractiveCommand::Cancel => SessionCommand::Cancel,
            InteractiveCommand::Submit { subject, paths } => {
                submit_command(&subject, &paths).await
            }
            InteractiveCommand::Quit => SessionCommand::Quit,
        };
        let quitting = command == SessionCommand::Quit;
        let rejecting = command == SessionCommand::Reject;
        if commands.send(command).is_err() || quitting {
            break;
        }
        if rejecting {
            wait_for_reject_applied(&mut status).await;
        }
    }
}

/// The next line is only a comment once the loop has switched to comment mode,
/// so hold further input until the rejection has been applied or refused.
async fn wait_for_reject_applied(status: &mut watch::Receiver<SessionSnapshot>) {
    let _ = status.wait_for(reject_settled).await;
}

fn reject_settled(snapshot: &SessionSnapshot) -> bool {
    snapshot.pending_input != Some(PendingInputKind::Confirmation)
        || snapshot.state != TransportState::Open
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use esg_runtime::SessionCommand;
    use esg_session::{ActivityIndicator, PendingInputKind, SessionSnapshot, TransportState};
    use tokio::sync::{mpsc, watch};

    use super::read_reviewer_input;

    fn snapshot(pending_input: Option<PendingInputKind>) -> SessionSnapshot {
        SessionSnapshot {
            session_id: 1,
            subject: "Acme".to_string(),
            state: TransportState::Open,
            transcript: Vec::new(),
            pending_input,
            activity: ActivityIndicator::default(),
        }
    }

    async fn next_command(rx: &mut mpsc::UnboundedReceiver<SessionCommand>) -> SessionCommand {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("command before timeout")
            .expect("command channel open")
    }

    #[tokio::test]
    async fn regression_piped_comment_after_reject_is_not_lost() {
        let (line_tx, line_rx) = mpsc::unbounded_channel();
        let (command_tx, mut command_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(snapshot(Some(PendingInputKind::Confirmation)));
        line_tx.send("no".to_string()).expect("queue reject");
        line_tx
            .send("wrong sector".to_string())
            .expect("queue comment");
        drop(line_tx);
        let reader = tokio::spawn(read_reviewer_input(line_rx, command_tx, status_rx));

        assert_eq!(next_command(&mut command_rx).await, SessionCommand::Reject);
        tokio::time::sleep(Duration::from_millis(20)).await;
        status_tx.send_replace(snapshot(Some(PendingInputKind::ConfirmationWithComment)));

        assert_eq!(
            next_command(&mut command_rx).await,
            SessionCommand::Comment("wrong sector".to_string())
        );
        reader.await.expect("reader task");
    }

    #[tokio::test]
    async fn regression_refused_reject_does_not_block_input() {
        let (line_tx, line_rx) = mpsc::unbounded_channel();
        let (command_tx, mut command_rx) = mpsc::unbounded_channel();
        let (_status_tx, status_rx) = watch::channel(snapshot(None));
        line_tx.send("no".to_string()).expect("queue reject");
        line_tx.send("/cancel".to_string()).expect("queue cancel");
        drop(line_tx);
        let reader = tokio::spawn(read_reviewer_input(line_rx, command_tx, status_rx));

        assert_eq!(next_command(&mut command_rx).await, SessionCommand::Reject);
        assert_eq!(next_command(&mut command_rx).await, SessionCommand::Cancel);
        reader.await.expect("reader task");
    }
}
