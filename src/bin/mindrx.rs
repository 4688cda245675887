//! `mindrx` command-line binary.
//!
//! ```bash
//! mindrx list
//! mindrx run --state ketamine "What is the nature of time?"
//! echo "Write a poem about clouds" | mindrx run -s cannabis
//! mindrx repl --state ayahuasca
//! ```

use clap::Parser;
use mindrx::cli::{execute, Cli};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    if let Err(e) = execute(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
