// Voxen terminal driver
// Reads turns from stdin and prints the assistant replies.

use anyhow::Context;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};

use voxen_core::config::{sample_questions, AppConfig, WELCOME_MESSAGE};
use voxen_core::conversation::ExportFormat;
use voxen_core::logging::init_tracing;
use voxen_core::{AppError, SupervisorHandle};

/// Session id used for every turn typed in this terminal
const SESSION_ID: &str = "terminal";

/// Messages shown by `/history` without an explicit count
const DEFAULT_HISTORY_COUNT: usize = 10;

const HELP: &str = "Commands:
  /history [n]          show the last n messages
  /search <text>        find messages containing text
  /summary              conversation statistics
  /export json|txt      print the conversation
  /samples [category]   sample questions
  /clear                forget the conversation
  /quit                 exit";

#[derive(Debug, PartialEq)]
enum Command<'a> {
    Turn(&'a str),
    History(usize),
    Search(&'a str),
    Summary,
    Export(&'a str),
    Samples(Option<&'a str>),
    Clear,
    Help,
    Quit,
    Unknown(&'a str),
}

fn parse_command(line: &str) -> Command<'_> {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Turn(line);
    };

    let (name, argument) = match rest.split_once(char::is_whitespace) {
        Some((name, argument)) => (name, argument.trim()),
        None => (rest, ""),
    };
    let argument = (!argument.is_empty()).then_some(argument);

    match name {
        "history" => Command::History(
            argument
                .and_then(|a| a.parse().ok())
                .unwrap_or(DEFAULT_HISTORY_COUNT),
        ),
        "search" => Command::Search(argument.unwrap_or("")),
        "summary" => Command::Summary,
        "export" => Command::Export(argument.unwrap_or("json")),
        "samples" => Command::Samples(argument),
        "clear" => Command::Clear,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => Command::Unknown(line),
    }
}

/// Run one command; `Ok(None)` means exit.
async fn execute(supervisor: &SupervisorHandle, command: Command<'_>) -> Result<Option<String>, AppError> {
    let output = match command {
        Command::Turn(text) => {
            let outcome = supervisor
                .process_message(SESSION_ID.to_string(), text.to_string())
                .await?;
            format!(
                "{}\n  [{} route, confidence {:.2}, topic {}]",
                outcome.response,
                outcome.route,
                outcome.confidence,
                outcome.classification.topic()
            )
        }
        Command::History(count) => supervisor
            .history(count)
            .await?
            .iter()
            .map(|m| format!("{}: {}", m.role.label(), m.content))
            .collect::<Vec<_>>()
            .join("\n"),
        Command::Search(query) => supervisor
            .search(query.to_string())
            .await?
            .iter()
            .map(|m| format!("[{}] {}: {}", m.timestamp.format("%H:%M:%S"), m.role.label(), m.content))
            .collect::<Vec<_>>()
            .join("\n"),
        Command::Summary => supervisor.summary().await?.to_string(),
        Command::Export(format) => {
            let format: ExportFormat = format.parse()?;
            supervisor.export(format).await?
        }
        Command::Samples(category) => sample_questions(category)
            .iter()
            .map(|q| format!("  • {}", q))
            .collect::<Vec<_>>()
            .join("\n"),
        Command::Clear => {
            supervisor.clear_history().await?;
            "Conversation cleared.".to_string()
        }
        Command::Help => HELP.to_string(),
        Command::Quit => return Ok(None),
        Command::Unknown(line) => format!("Unknown command: {} (try /help)", line),
    };
    Ok(Some(output))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("Failed to load configuration")?;
    init_tracing(config.log_format).context("Failed to initialize logging")?;

    info!(
        "Starting Voxen (llm: {}, math threshold: {})",
        config.model.server_url, config.chat.math_threshold
    );
    let supervisor = SupervisorHandle::new(&config);

    let mut stdout = io::stdout();
    stdout.write_all(format!("{}\n\n", WELCOME_MESSAGE).as_bytes()).await?;

    let mut lines = BufReader::new(io::stdin()).lines();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        match execute(&supervisor, parse_command(&line)).await {
            Ok(Some(output)) => {
                stdout.write_all(format!("{}\n", output).as_bytes()).await?;
            }
            Ok(None) => break,
            Err(e) => {
                error!("Command failed: {}", e);
                stdout.write_all(format!("Error: {}\n", e).as_bytes()).await?;
            }
        }
    }

    supervisor.shutdown().await.ok();
    info!("Voxen stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("  hello  "), Command::Turn("hello"));
        assert_eq!(parse_command("/history"), Command::History(DEFAULT_HISTORY_COUNT));
        assert_eq!(parse_command("/history 3"), Command::History(3));
        assert_eq!(parse_command("/export txt"), Command::Export("txt"));
        assert_eq!(parse_command("/export"), Command::Export("json"));
        assert_eq!(parse_command("/samples math"), Command::Samples(Some("math")));
        assert_eq!(parse_command("/samples"), Command::Samples(None));
        assert_eq!(parse_command("/search  x = 4 "), Command::Search("x = 4"));
        assert_eq!(parse_command("/quit"), Command::Quit);
        assert_eq!(parse_command("/dance"), Command::Unknown("/dance"));
    }
}
