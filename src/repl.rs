//! Interactive REPL.

use crate::config::OutputConfig;
use crate::runner::{render_step, Runner};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};
use std::path::{Path, PathBuf};

const HELP_TEXT: &str = r#"
Any input that is not a command is processed as an event.

Available commands:
  :help                 Show this help
  :state                Show the current state
  :events               List events accepted in the current state
  :quit, :exit          Exit the REPL
"#;

enum Reply {
    Output(String),
    Quit,
}

pub fn run(file: &Path, output: &OutputConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut runner = Runner::open(file)?;

    println!("{}", "tinystate REPL".bold().cyan());
    println!(
        "Loaded {} (initial state: {})",
        file.display(),
        runner.current().yellow()
    );

    let config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .build();
    let mut rl: Editor<(), DefaultHistory> = Editor::with_config(config)?;

    let history_path = history_path();
    let _ = rl.load_history(&history_path);

    println!("Type ':help' for available commands.\n");

    loop {
        let prompt = format!("{} ", format!("{}>", runner.current()).cyan());
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                match execute_repl_command(&mut runner, line, output) {
                    Reply::Output(text) => println!("{}", text),
                    Reply::Quit => break,
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                break;
            }
            Err(err) => {
                println!("{}: {:?}", "Error".red(), err);
                break;
            }
        }
    }

    if let Err(e) = rl.save_history(&history_path) {
        tracing::debug!("failed to save REPL history: {}", e);
    }

    Ok(())
}

fn history_path() -> PathBuf {
    home::home_dir()
        .map(|h| h.join(".tinystate_history"))
        .unwrap_or_else(|| ".tinystate_history".into())
}

fn execute_repl_command(runner: &mut Runner, line: &str, output: &OutputConfig) -> Reply {
    match line {
        ":help" | ":h" | ":?" => Reply::Output(HELP_TEXT.trim_end().to_string()),

        ":quit" | ":exit" | ":q" => Reply::Quit,

        ":state" | ":s" => Reply::Output(runner.current().yellow().to_string()),

        ":events" | ":e" => {
            let events = runner.accepted_events();
            if events.is_empty() {
                Reply::Output("No events accepted in this state".yellow().to_string())
            } else {
                Reply::Output(events.join(", "))
            }
        }

        cmd if cmd.starts_with(':') => Reply::Output(format!(
            "Unknown command: {}. Type ':help' for help.",
            cmd
        )),

        event => Reply::Output(render_step(&runner.step(event), output)),
    }
}
