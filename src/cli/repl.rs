//! Interactive prompt loop.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};

use super::{stream_to_stdout, SessionArgs};
use crate::client::MindRx;

/// One line of REPL input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplInput {
    Empty,
    Prompt(String),
    /// `/state` with an optional name to switch to.
    State(Option<String>),
    List,
    Clear,
    Exit,
    Unknown(String),
}

pub fn parse_repl_input(line: &str) -> ReplInput {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return ReplInput::Empty;
    }

    let Some(command) = trimmed.strip_prefix('/') else {
        return ReplInput::Prompt(trimmed.to_string());
    };

    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default();
    match name {
        "state" => ReplInput::State(parts.next().map(str::to_string)),
        "list" => ReplInput::List,
        "clear" => ReplInput::Clear,
        "exit" | "quit" => ReplInput::Exit,
        _ => ReplInput::Unknown(name.to_string()),
    }
}

/// State names with the current one marked ` *`.
pub fn state_lines(rx: &MindRx) -> Vec<String> {
    rx.list_states()
        .into_iter()
        .map(|name| {
            let marker = if name == rx.state_name() { " *" } else { "" };
            format!("  {}{}", name, marker)
        })
        .collect()
}

pub async fn run(session: &SessionArgs) -> anyhow::Result<()> {
    let mut rx = session.client()?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!(
        "\nmindrx REPL - State: {} | Provider: {}",
        rx.state_name(),
        rx.provider_name()
    );
    println!("Commands: /state <name>, /list, /clear, /exit\n");

    loop {
        print!("[{}] > ", rx.state_name());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            return Ok(());
        };

        match parse_repl_input(&line) {
            ReplInput::Empty => {}
            ReplInput::Exit => return Ok(()),
            ReplInput::State(Some(name)) => match rx.set_state(&name) {
                Ok(()) => println!("Switched to state: {}\n", name),
                Err(e) => println!("Error: {}\n", e),
            },
            ReplInput::State(None) => println!("Current state: {}\n", rx.state_name()),
            ReplInput::List => {
                println!("\nAvailable states:");
                for line in state_lines(&rx) {
                    println!("{}", line);
                }
                println!();
            }
            ReplInput::Clear => {
                print!("\x1B[2J\x1B[1;1H");
                println!("mindrx REPL - State: {}\n", rx.state_name());
            }
            ReplInput::Unknown(command) => println!("Unknown command: {}\n", command),
            ReplInput::Prompt(prompt) => {
                println!();
                match stream_to_stdout(&mut rx, &prompt).await {
                    Ok(()) => println!("\n"),
                    Err(e) => println!("Error: {}\n", e),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MindRxOptions;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_repl_input("   "), ReplInput::Empty);
        assert_eq!(
            parse_repl_input("  tell me a story "),
            ReplInput::Prompt("tell me a story".into())
        );
        assert_eq!(parse_repl_input("/state"), ReplInput::State(None));
        assert_eq!(
            parse_repl_input("/state lsd"),
            ReplInput::State(Some("lsd".into()))
        );
        assert_eq!(parse_repl_input("/list"), ReplInput::List);
        assert_eq!(parse_repl_input("/clear"), ReplInput::Clear);
        assert_eq!(parse_repl_input("/exit"), ReplInput::Exit);
        assert_eq!(parse_repl_input("/quit"), ReplInput::Exit);
        assert_eq!(parse_repl_input("/dance"), ReplInput::Unknown("dance".into()));
        assert_eq!(parse_repl_input("/"), ReplInput::Unknown(String::new()));
    }

    #[test]
    fn test_state_lines_mark_current() {
        let rx = MindRx::new(MindRxOptions {
            state: Some("mdma".into()),
            ..Default::default()
        });
        let lines = state_lines(&rx);
        assert!(lines.contains(&"  mdma *".to_string()));
        assert!(lines.contains(&"  sober".to_string()));
    }
}
