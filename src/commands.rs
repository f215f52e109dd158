//! Command execution.

use crate::config::Config;
use crate::runner::{render_step, Runner};
use crate::Commands;
use colored::Colorize;
use std::io::BufRead;
use std::path::Path;

/// Executes a one-shot command.
pub fn execute(cmd: Commands, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        Commands::Repl { file } => crate::repl::run(&file, &config.output),

        Commands::Validate { file } => {
            println!("{}", validate(&file)?);
            Ok(())
        }

        Commands::Inspect { file } => {
            println!("{}", inspect(&file)?);
            Ok(())
        }

        Commands::Run { file, events, .. } => {
            let mut runner = Runner::open(&file)?;

            if events.is_empty() {
                run_lines(&mut runner, std::io::stdin().lock(), config)
            } else {
                for event in &events {
                    run_event(&mut runner, event, config)?;
                }
                Ok(())
            }
        }
    }
}

/// Processes one event per line. Blank lines and lines starting with `#`
/// are skipped.
fn run_lines(
    runner: &mut Runner,
    input: impl BufRead,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    for line in input.lines() {
        let line = line?;
        let event = line.trim();
        if event.is_empty() || event.starts_with('#') {
            continue;
        }
        run_event(runner, event, config)?;
    }
    Ok(())
}

fn run_event(
    runner: &mut Runner,
    event: &str,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let step = runner.step(event);
    println!("{}", render_step(&step, &config.output));

    if !step.transitioned && config.run.fail_on_ignored {
        return Err(format!("event '{}' is not accepted in state '{}'", step.event, step.to).into());
    }
    Ok(())
}

/// Loads and validates a document, returning a summary.
pub fn validate(file: &Path) -> Result<String, Box<dyn std::error::Error>> {
    let runner = Runner::open(file)?;
    let definition = runner.definition();

    Ok(format!(
        "{} {} ({} states, {} transitions, initial: {}, checksum: {})",
        "Valid".green(),
        file.display().to_string().cyan(),
        definition.len(),
        definition.transition_count(),
        definition.initial().yellow(),
        runner.document().checksum()?
    ))
}

/// Lists every state with the events it accepts.
pub fn inspect(file: &Path) -> Result<String, Box<dyn std::error::Error>> {
    let runner = Runner::open(file)?;
    let definition = runner.definition();

    let mut output = String::new();
    for state in definition.states() {
        let marker = if state == definition.initial() { "*" } else { " " };
        output.push_str(&format!("{} {}\n", marker, state.yellow()));

        let mut events = definition.events_from(state);
        events.sort();
        if events.is_empty() {
            output.push_str(&format!("    {}\n", "(no events)".dimmed()));
        }
        for event in events {
            let target = definition
                .target(state, event.as_str())
                .map(String::as_str)
                .unwrap_or("?");
            output.push_str(&format!("    {} → {}\n", event.cyan(), target));
        }
    }
    Ok(output.trim_end().to_string())
}
