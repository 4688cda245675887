//! Command-line interface for the `mindrx` binary.
//!
//! - `list` - print the available states
//! - `run`  - complete one prompt under a state
//! - `repl` - interactive loop with `/state`, `/list`, `/clear`, `/exit`

pub mod repl;

use std::io::{IsTerminal, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use futures::StreamExt;
use tokio::io::AsyncReadExt;

use crate::client::{MindRx, MindRxOptions};
use crate::states::{StateEngine, DEFAULT_STATE};

/// Provider used by the CLI when `--provider` is not given.
pub const DEFAULT_CLI_PROVIDER: &str = "mindrx";

#[derive(Debug, Parser)]
#[command(
    name = "mindrx",
    version,
    about = "Cognitive state simulation for AI agents",
    after_help = "PROVIDERS:\n  mindrx     MindRx hosted backend (no API key needed)\n  ollama     Local Ollama instance (OLLAMA_BASE_URL)\n  openai     OpenAI API (OPENAI_API_KEY)\n  anthropic  Anthropic API (ANTHROPIC_API_KEY)\n  google     Gemini API (GOOGLE_API_KEY)\n  xai        xAI API (XAI_API_KEY)"
)]
pub struct Cli {
    #[command(flatten)]
    pub session: SessionArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command.
#[derive(Debug, Clone, Args)]
pub struct SessionArgs {
    /// Cognitive state to apply
    #[arg(short, long, global = true, default_value = DEFAULT_STATE)]
    pub state: String,

    /// LLM provider: mindrx, ollama, openai, anthropic, google, xai
    #[arg(short, long, global = true, default_value = DEFAULT_CLI_PROVIDER)]
    pub provider: String,

    /// Specific model to use
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// Directory of extra state files
    #[arg(long, global = true, env = "MINDRX_STATES_DIR")]
    pub states_dir: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List available cognitive states
    List,

    /// Run a prompt with a cognitive state
    Run {
        /// Prompt text; read from stdin when omitted
        prompt: Vec<String>,

        /// Output the full response as JSON
        #[arg(long)]
        json: bool,

        /// Wait for the whole response instead of streaming
        #[arg(long)]
        no_stream: bool,
    },

    /// Start interactive mode
    Repl,
}

impl SessionArgs {
    fn engine(&self) -> anyhow::Result<StateEngine> {
        let mut engine = StateEngine::new();
        if let Some(dir) = &self.states_dir {
            engine
                .add_custom_state_dir(dir)
                .with_context(|| format!("loading states from {}", dir.display()))?;
        }
        Ok(engine)
    }

    pub fn client(&self) -> anyhow::Result<MindRx> {
        Ok(MindRx::with_engine(
            self.engine()?,
            MindRxOptions {
                state: Some(self.state.clone()),
                provider: Some(self.provider.clone()),
                model: self.model.clone(),
                ..Default::default()
            },
        ))
    }
}

/// Execute a parsed command line.
pub async fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::List => list_states(&cli.session),
        Commands::Run {
            prompt,
            json,
            no_stream,
        } => {
            let mut prompt = prompt.join(" ");
            if prompt.is_empty() {
                prompt = read_stdin().await?;
            }
            if prompt.is_empty() {
                bail!("No prompt provided");
            }
            run_prompt(&cli.session, &prompt, json, !no_stream).await
        }
        Commands::Repl => repl::run(&cli.session).await,
    }
}

fn list_states(session: &SessionArgs) -> anyhow::Result<()> {
    let engine = session.engine()?;
    println!("\nAvailable states:\n");
    for line in format_state_list(&engine) {
        println!("{}", line);
    }
    println!();
    Ok(())
}

/// One `  name  description` line per state, names padded to a column.
pub fn format_state_list(engine: &StateEngine) -> Vec<String> {
    engine
        .list_info()
        .into_iter()
        .map(|info| format!("  {:<14} {}", info.name, info.description).trim_end().to_string())
        .collect()
}

async fn run_prompt(
    session: &SessionArgs,
    prompt: &str,
    json: bool,
    stream: bool,
) -> anyhow::Result<()> {
    let mut rx = session.client()?;

    if stream && !json {
        stream_to_stdout(&mut rx, prompt).await?;
        println!();
        return Ok(());
    }

    let response = rx.run(prompt).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!("{}", response.text);
    }
    Ok(())
}

/// Write streamed text to stdout as it arrives.
pub(crate) async fn stream_to_stdout(rx: &mut MindRx, prompt: &str) -> anyhow::Result<()> {
    let mut chunks = rx.stream(prompt)?;
    let mut stdout = std::io::stdout();
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk?;
        stdout.write_all(chunk.text.as_bytes())?;
        stdout.flush()?;
    }
    Ok(())
}

async fn read_stdin() -> anyhow::Result<String> {
    if std::io::stdin().is_terminal() {
        return Ok(String::new());
    }
    let mut input = String::new();
    tokio::io::stdin()
        .read_to_string(&mut input)
        .await
        .context("reading prompt from stdin")?;
    Ok(input.trim().to_string())
}
