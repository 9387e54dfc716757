use chatflow::executor::{BubbleContent, ButtonPromptPayload, IoRequest};
use chatflow::prelude::*;
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, BufRead, Write};

/// Validate chatbot workspaces and chat with them from the terminal
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a workspace and report every violation and unreachable container
    Validate {
        /// Path to the workspace JSON file
        workspace_path: String,
    },
    /// Run an interactive session on stdin/stdout
    Run {
        /// Path to the workspace JSON file
        workspace_path: String,
        /// JSON object mapping I/O node ids to {"success": value} or {"failure": reason}
        #[arg(long)]
        io_results: Option<String>,
        /// JSON file with executor settings (maxStepsPerEvent, ioTimeoutMs)
        #[arg(long)]
        config: Option<String>,
        /// Resume from a snapshot file instead of starting a new session
        #[arg(long)]
        restore: Option<String>,
        /// Write the session snapshot here when the run ends
        #[arg(long)]
        snapshot: Option<String>,
        #[arg(long, default_value = "cli-session")]
        session_id: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Validate { workspace_path } => run_validate(&workspace_path),
        Command::Run {
            workspace_path,
            io_results,
            config,
            restore,
            snapshot,
            session_id,
        } => run_session(RunOptions {
            workspace_path,
            io_results,
            config,
            restore,
            snapshot,
            session_id,
        }),
    }
}

struct RunOptions {
    workspace_path: String,
    io_results: Option<String>,
    config: Option<String>,
    restore: Option<String>,
    snapshot: Option<String>,
    session_id: String,
}

fn compile_workspace(path: &str) -> std::result::Result<CompiledGraph, CompileError> {
    let json = read_file(path);
    Compiler::from_json(&json)?.compile()
}

fn run_validate(workspace_path: &str) {
    match compile_workspace(workspace_path) {
        Ok(graph) => {
            println!(
                "Workspace '{}' (version {}) is valid: {} containers, {} edges.",
                graph.name(),
                graph.version(),
                graph.containers().len(),
                graph.edge_count()
            );
            for container_id in graph.unreachable_containers() {
                println!("  warning: container '{}' is unreachable", container_id);
            }
        }
        Err(CompileError::Validation(errors)) => {
            eprintln!("Workspace is invalid ({} violations):", errors.len());
            for violation in errors.iter() {
                eprintln!("  - {}", violation);
            }
            std::process::exit(1);
        }
        Err(e) => exit_with_error(&e.to_string()),
    }
}

fn run_session(options: RunOptions) {
    let graph = compile_workspace(&options.workspace_path)
        .unwrap_or_else(|e| exit_with_error(&format!("Compilation failed: {}", e)));

    let config = match &options.config {
        Some(path) => ExecutorConfig::from_json(&read_file(path))
            .unwrap_or_else(|e| exit_with_error(&format!("Invalid executor config: {}", e))),
        None => ExecutorConfig::default(),
    };
    let executor = Executor::builder(graph).config(config).build();

    let scripted: BTreeMap<String, IoOutcome> = match &options.io_results {
        Some(path) => serde_json::from_str(&read_file(path))
            .unwrap_or_else(|e| exit_with_error(&format!("Invalid I/O results file: {}", e))),
        None => BTreeMap::new(),
    };
    let collaborator = |request: &IoRequest| match scripted.get(&request.node_id) {
        Some(IoOutcome::Success(value)) => Ok(value.clone()),
        Some(IoOutcome::Failure(reason)) => Err(reason.clone()),
        None => Err(format!("no scripted result for node '{}'", request.node_id)),
    };
    let driver = SessionDriver::new(&executor, &collaborator);

    let (mut session, events) = match &options.restore {
        Some(path) => {
            let snapshot = SessionSnapshot::from_json(&read_file(path))
                .unwrap_or_else(|e| exit_with_error(&e.to_string()));
            let mut session = executor
                .restore(snapshot)
                .unwrap_or_else(|e| exit_with_error(&format!("Cannot restore session: {}", e)));
            let events = driver
                .resume(&mut session)
                .unwrap_or_else(|e| exit_with_error(&e.to_string()));
            (session, events)
        }
        None => driver
            .start(&options.session_id)
            .unwrap_or_else(|e| exit_with_error(&e.to_string())),
    };

    let mut buttons = print_events(&events);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    while !session.is_terminated() {
        print!("> ");
        let _ = io::stdout().flush();
        let Some(Ok(line)) = lines.next() else {
            print_events(&executor.cancel(&mut session));
            break;
        };

        let event = to_inbound(session.id(), line.trim(), buttons.as_ref());
        match driver.handle(&mut session, event) {
            Ok(events) => {
                if let Some(next) = print_events(&events) {
                    buttons = Some(next);
                } else if events.iter().any(|e| matches!(e.kind, OutboundKind::Prompt(_))) {
                    buttons = None;
                }
            }
            Err(e) => eprintln!("error: {}", e),
        }
    }

    if let Some(path) = &options.snapshot {
        let json = session
            .snapshot()
            .to_json()
            .unwrap_or_else(|e| exit_with_error(&e.to_string()));
        fs::write(path, json)
            .unwrap_or_else(|e| exit_with_error(&format!("Could not write '{}': {}", path, e)));
        println!("Snapshot written to {}", path);
    }
}

/// Comma-separated button ids become a selection; anything else is a reply.
fn to_inbound(session_id: &str, line: &str, buttons: Option<&ButtonPromptPayload>) -> InboundEvent {
    if let Some(prompt) = buttons {
        let ids: Vec<&str> = line.split(',').map(str::trim).collect();
        let all_known = ids
            .iter()
            .all(|id| prompt.buttons.iter().any(|b| b.id == *id));
        if all_known {
            return InboundEvent::selection(session_id, ids);
        }
    }
    InboundEvent::reply(session_id, line)
}

/// Prints events and returns the last button prompt among them.
fn print_events(events: &[OutboundEvent]) -> Option<ButtonPromptPayload> {
    let mut buttons = None;
    for event in events {
        match &event.kind {
            OutboundKind::Render(render) => match &render.content {
                BubbleContent::Text { text, .. } | BubbleContent::Number { text } => {
                    println!("bot: {}", text)
                }
                BubbleContent::Media {
                    media,
                    url,
                    caption,
                } => println!(
                    "bot: [{:?}] {}{}",
                    media,
                    url,
                    caption.as_deref().map(|c| format!(" ({})", c)).unwrap_or_default()
                ),
            },
            OutboundKind::Prompt(prompt) => {
                if let Some(message) = &prompt.retry_message {
                    println!("bot: {}", message);
                }
                if let Some(placeholder) = &prompt.placeholder {
                    println!("     ({})", placeholder);
                }
            }
            OutboundKind::ButtonPrompt(prompt) => {
                if let Some(message) = &prompt.retry_message {
                    println!("bot: {}", message);
                }
                for button in &prompt.buttons {
                    println!("  [{}] {}", button.id, button.label);
                }
                buttons = Some(prompt.clone());
            }
            OutboundKind::IoRequest(request) => {
                println!("  .. calling {} ({:?})", request.node_id, request.call)
            }
            OutboundKind::Terminated(reason) => println!("-- conversation ended: {:?}", reason),
        }
    }
    buttons
}

fn read_file(path: &str) -> String {
    fs::read_to_string(path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to read file '{}': {}", path, e)))
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
