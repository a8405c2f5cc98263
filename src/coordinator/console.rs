//! Operator console command parsing.
//!
//! One line per command, whitespace-separated tokens. Parsing is kept
//! apart from execution so the event loop only ever sees well-formed
//! commands.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Exit,
    Status,
    Add { path: PathBuf },
    ClearPending,
    WorkerList,
    WorkerAdd { host: String, exe: Option<String> },
    WorkerDrop { worker_id: u64 },
    HaltSave { path: PathBuf },
    Restore { path: PathBuf },
}

/// Parse one console line. `Ok(None)` for a blank line; `Err` carries
/// the diagnostic to print.
pub fn parse(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some((&command, args)) = tokens.split_first() else {
        return Ok(None);
    };

    let parsed = match command {
        "exit" => ConsoleCommand::Exit,
        "status" => ConsoleCommand::Status,
        "add" => ConsoleCommand::Add {
            path: require_path(args, "add <path>")?,
        },
        "clear" => match args.first() {
            Some(&"pending") => ConsoleCommand::ClearPending,
            _ => return Err("Clear what?\n- pending".to_string()),
        },
        "worker" => parse_worker(args)?,
        "haltsave" => ConsoleCommand::HaltSave {
            path: require_path(args, "haltsave <path>")?,
        },
        "restore" => ConsoleCommand::Restore {
            path: require_path(args, "restore <path>")?,
        },
        other => return Err(format!("Unknown command: {other}")),
    };

    Ok(Some(parsed))
}

fn parse_worker(args: &[&str]) -> Result<ConsoleCommand, String> {
    match args.first() {
        Some(&"list") => Ok(ConsoleCommand::WorkerList),
        Some(&"add") => match args.get(1) {
            Some(host) => Ok(ConsoleCommand::WorkerAdd {
                host: host.to_string(),
                exe: args.get(2).map(|s| s.to_string()),
            }),
            None => Err("Usage: worker add <host> [exe]".to_string()),
        },
        Some(&"drop") => match args.get(1).and_then(|s| s.parse().ok()) {
            Some(worker_id) => Ok(ConsoleCommand::WorkerDrop { worker_id }),
            None => Err("Usage: worker drop <id>".to_string()),
        },
        _ => Err("Unknown worker subcommand (list, add, drop)".to_string()),
    }
}

fn require_path(args: &[&str], usage: &str) -> Result<PathBuf, String> {
    match args.first() {
        Some(path) => Ok(PathBuf::from(path)),
        None => Err(format!("Need a filename. Usage: {usage}")),
    }
}
