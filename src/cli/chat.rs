//! Interactive chat command
//!
//! Reads prompts from stdin, one turn per line, all in one session so the
//! conversation carries over between lines. Ctrl-C interrupts the running
//! turn instead of exiting.

use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use promptline::config::Config;
use promptline::session::{Monitor, Session};
use promptline::{Output, SessionError, SessionResult};

/// A line of chat input
#[derive(Debug, PartialEq, Eq)]
enum ChatCommand<'a> {
    Prompt(&'a str),
    Choose(usize, Option<&'a str>),
    Reset,
    Quit,
    Empty,
    Invalid(String),
}

fn parse_line(line: &str) -> ChatCommand<'_> {
    let line = line.trim();
    if line.is_empty() {
        return ChatCommand::Empty;
    }

    match line {
        "/quit" | "/exit" => return ChatCommand::Quit,
        "/reset" => return ChatCommand::Reset,
        _ => {}
    }

    if let Some(rest) = line.strip_prefix("/choose") {
        let rest = rest.trim();
        let (number, extra) = match rest.split_once(char::is_whitespace) {
            Some((n, extra)) => (n, Some(extra.trim())),
            None => (rest, None),
        };
        return match number.parse::<usize>() {
            Ok(n) if n > 0 => ChatCommand::Choose(n, extra),
            _ => ChatCommand::Invalid(format!("Invalid choice number: {}", number)),
        };
    }

    ChatCommand::Prompt(line)
}

pub async fn chat_command(config: &Config, tool: Option<&str>, monitor: bool) -> Result<()> {
    let session = super::open_session(config, tool)?;

    let watcher = if monitor {
        let watcher = Monitor::new(session.clone(), config.settings.monitor_interval())
            .with_stop_grace(config.settings.monitor_stop_grace());
        watcher.on_change(|output: &Output| eprintln!("[monitor] {}", output));
        watcher.start();
        Some(watcher)
    } else {
        None
    };

    eprintln!(
        "Session {} ready. /choose N [extra], /reset, /quit. Ctrl-C interrupts a turn.",
        session.identity()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let result = match parse_line(&line) {
            ChatCommand::Empty => continue,
            ChatCommand::Quit => break,
            ChatCommand::Reset => {
                session.reset_session();
                eprintln!("Conversation reset; the next prompt starts a new one.");
                continue;
            }
            ChatCommand::Invalid(message) => {
                eprintln!("{}", message);
                continue;
            }
            ChatCommand::Choose(n, extra) => {
                run_interruptible(&session, session.select_choice(n, extra)).await
            }
            ChatCommand::Prompt(prompt) => {
                run_interruptible(&session, session.send_prompt(prompt)).await
            }
        };

        match result {
            Ok(output) => super::print_output(&output),
            Err(SessionError::Interrupted { .. }) => eprintln!("Turn interrupted."),
            Err(e) => eprintln!("Error: {}", e),
        }
    }

    if let Some(watcher) = watcher {
        watcher.stop().await;
    }
    session.close().await;
    Ok(())
}

/// Drive a turn to completion, interrupting it on Ctrl-C
async fn run_interruptible<F>(session: &Arc<Session>, turn: F) -> SessionResult<Output>
where
    F: std::future::Future<Output = SessionResult<Output>>,
{
    tokio::pin!(turn);
    let mut interrupting = false;
    loop {
        tokio::select! {
            result = &mut turn => return result,
            signal = tokio::signal::ctrl_c(), if !interrupting => {
                if signal.is_err() {
                    return turn.await;
                }
                eprintln!("Interrupting...");
                interrupting = true;
                // The turn must keep being polled so it can reap the child
                let session = Arc::clone(session);
                tokio::spawn(async move {
                    session.interrupt().await;
                });
            }
        }
    }
}
