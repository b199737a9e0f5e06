//! Market brief CLI
//!
//! An interactive prompt that answers portfolio questions with a short brief.
//!
//! # Usage
//!
//! ```bash
//! export ALPHA_VANTAGE_API_KEY="your-key"
//! export BRIEF_LOG_JSON=1   # optional: JSON log lines
//! cargo run --bin market-brief -p market-brief
//! ```

use market_brief::{BriefConfig, Orchestrator, speech_text};
use std::io::{self, BufRead, Write};

const HELP: &str = r"Commands:
  /symbols <s1> <s2>  - Always include these tickers (no arguments clears them)
  /speak              - Repeat the last brief as plain sentences
  /help               - Show this help
  /exit               - Exit

Or ask a question, e.g. What is our risk exposure in Asia tech stocks today?";

fn print_banner(config: &BriefConfig) {
    println!("Market Brief\n");
    println!("{HELP}\n");
    println!("Configuration:");
    println!("  Default symbol: {}", config.default_symbol);
    println!("  News source: {}", config.news_url_template);
    println!("  Portfolio: {:?}", config.portfolio);
    println!();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if brief_utils::env_flag("BRIEF_LOG_JSON", false) {
        brief_utils::init_json_tracing("warn,market_brief=info");
    } else {
        brief_utils::init_tracing("warn,market_brief=info");
    }

    let config = BriefConfig::from_env()?;
    print_banner(&config);

    let mut orchestrator = Orchestrator::from_config(config)?;
    let mut symbols: Vec<String> = Vec::new();
    let mut last_response: Option<String> = None;

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("brief> ");
        stdout.flush()?;

        let mut input = String::new();
        match stdin.lock().read_line(&mut input) {
            Ok(0) => {
                println!("\nGoodbye!");
                break;
            },
            Ok(_) => {},
            Err(e) => {
                eprintln!("Error reading input: {e}");
                continue;
            },
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(command) = input.strip_prefix('/') {
            let mut parts = command.split_whitespace();
            match parts.next().unwrap_or_default() {
                "exit" | "quit" => {
                    println!("Goodbye!");
                    break;
                },
                "help" => println!("{HELP}\n"),
                "speak" => match &last_response {
                    Some(response) => println!("{}\n", speech_text(response)),
                    None => println!("Nothing to speak yet.\n"),
                },
                "symbols" => {
                    symbols = parts.map(str::to_uppercase).collect();
                    println!("Symbols: {symbols:?}\n");
                },
                other => println!("Unknown command: /{other}. Type /help for commands.\n"),
            }
            continue;
        }

        let response = orchestrator.process_query(input, &symbols).await;
        println!("{response}\n");
        last_response = Some(response);
    }

    Ok(())
}
