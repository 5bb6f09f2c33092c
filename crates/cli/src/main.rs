mod demo;
mod render;

use std::fs;
use std::process;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use cmdgraph_core::{Dispatcher, DispatcherConfig, EntryPoint, NodeId};
use cmdgraph_diagnostics::{self as diag, Diagnostic};
use futures::executor::block_on;
use serde::Serialize;

use crate::demo::Session;
use crate::render::{Format, print_summary, render_diagnostics_pretty};

// ── CLI definition ──────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "cmdgraph",
    version,
    about = "Run, complete, and inspect commands against the cmdgraph demo command tree"
)]
struct Cli {
    /// Output mode: "pretty" for coloured terminal output, "json" for
    /// machine-readable JSON. Defaults to "pretty" when stdout is a TTY,
    /// "json" otherwise.
    #[arg(long, global = true, value_parser = ["pretty", "json"])]
    output: Option<String>,

    /// Dispatcher configuration as a JSON file.
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    cmd: Cmd,
}

/// Who the command line is run as.
#[derive(Args, Debug)]
struct SessionArgs {
    /// User name of the session.
    #[arg(long, default_value = "guest")]
    user: String,
    /// Give the session admin rights.
    #[arg(long)]
    admin: bool,
}

impl SessionArgs {
    fn session(&self) -> Session {
        Session::new(self.user.clone(), self.admin)
    }
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Parse and execute a command line.
    Run {
        line: String,
        #[command(flatten)]
        session: SessionArgs,
    },

    /// List completions for a command line.
    Complete {
        line: String,
        /// Byte offset of the caret. Defaults to the end of the line.
        #[arg(long)]
        cursor: Option<usize>,
        #[command(flatten)]
        session: SessionArgs,
    },

    /// Print usage for a command (the whole tree when no path is given).
    Usage {
        /// Node names from the root, e.g. `add a`.
        path: Vec<String>,
        /// Every executable path, one line each, instead of one condensed
        /// line per child.
        #[arg(long)]
        all: bool,
        #[command(flatten)]
        session: SessionArgs,
    },

    /// Report ambiguous siblings and registration conflicts in the tree.
    Lint,

    /// Explain a diagnostic ID (e.g. CMD1301).
    Explain { id: String },
}

// ── Main ────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let format = Format::resolve_or_detect(cli.output.as_deref());
    let config = load_config(cli.config.as_deref())?;

    match cli.cmd {
        Cmd::Run { line, session } => cmd_run(config, &line, &session, format)?,
        Cmd::Complete {
            line,
            cursor,
            session,
        } => cmd_complete(config, &line, cursor, &session, format)?,
        Cmd::Usage { path, all, session } => cmd_usage(config, &path, all, &session, format)?,
        Cmd::Lint => cmd_lint(config, format)?,
        Cmd::Explain { id } => cmd_explain(&id, format)?,
    }

    Ok(())
}

// ── Commands ────────────────────────────────────────────────────────────

/// Result of one executed branch.
#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum Outcome {
    Result(i32),
    Error(Diagnostic),
}

fn cmd_run(
    config: DispatcherConfig,
    line: &str,
    session: &SessionArgs,
    format: Format,
) -> Result<()> {
    let (dispatcher, _) = demo::build(config)?;
    let session = session.session();
    let replies = session.replies.clone();

    let (outcomes, diagnostics) =
        match block_on(dispatcher.execute(&EntryPoint::default(), line, session)) {
            Ok(results) => (
                results
                    .iter()
                    .map(|result| match result {
                        Ok(value) => Outcome::Result(*value),
                        Err(err) => Outcome::Error(err.to_diagnostic()),
                    })
                    .collect::<Vec<_>>(),
                Vec::new(),
            ),
            Err(err) => (Vec::new(), vec![err.to_diagnostic()]),
        };
    let replies = replies.take();
    let branch_errors: Vec<&Diagnostic> = outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            Outcome::Error(d) => Some(d),
            Outcome::Result(_) => None,
        })
        .collect();
    let ok = diagnostics.is_empty() && branch_errors.is_empty();

    match format {
        Format::Json => {
            let out = serde_json::json!({
                "input": line,
                "ok": ok,
                "outcomes": outcomes,
                "replies": replies,
                "diagnostics": diagnostics,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            for reply in &replies {
                println!("{reply}");
            }
            let mut all: Vec<Diagnostic> = diagnostics.clone();
            all.extend(branch_errors.iter().map(|d| (*d).clone()));
            render_diagnostics_pretty(line, &all);
            print_summary(&all);
            if ok && outcomes.is_empty() {
                eprintln!("no commands ran");
            }
        }
    }

    if !ok {
        process::exit(1);
    }
    Ok(())
}

fn cmd_complete(
    config: DispatcherConfig,
    line: &str,
    cursor: Option<usize>,
    session: &SessionArgs,
    format: Format,
) -> Result<()> {
    let (dispatcher, _) = demo::build(config)?;
    let cursor = cursor.unwrap_or(line.len());
    let parse = dispatcher.parse(&EntryPoint::default(), line, session.session());

    let suggestions = match block_on(dispatcher.completion_suggestions(&parse, cursor)) {
        Ok(suggestions) => suggestions,
        Err(err) => {
            let diagnostics = vec![err.to_diagnostic()];
            match format {
                Format::Json => {
                    let out = serde_json::json!({ "input": line, "diagnostics": diagnostics });
                    println!("{}", serde_json::to_string_pretty(&out)?);
                }
                Format::Pretty => render_diagnostics_pretty(line, &diagnostics),
            }
            process::exit(1);
        }
    };

    match format {
        Format::Json => {
            let out = serde_json::json!({
                "input": line,
                "cursor": cursor,
                "range": suggestions.range(),
                "suggestions": suggestions.list(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            for suggestion in suggestions.list() {
                match suggestion.tooltip() {
                    Some(tooltip) => println!("{}\t{tooltip}", suggestion.text()),
                    None => println!("{}", suggestion.text()),
                }
            }
        }
    }
    Ok(())
}

fn cmd_usage(
    config: DispatcherConfig,
    path: &[String],
    all: bool,
    session: &SessionArgs,
    format: Format,
) -> Result<()> {
    let (dispatcher, _) = demo::build(config)?;
    let node = find_node(&dispatcher, path)?;
    let source = session.session();
    let prefix = path.join(" ");

    let lines: Vec<String> = if all {
        dispatcher.all_usage(node, &source, true)
    } else {
        dispatcher
            .smart_usage(node, &source)
            .into_iter()
            .map(|(_, usage)| usage)
            .collect()
    };
    let lines: Vec<String> = lines
        .into_iter()
        .map(|usage| match (prefix.is_empty(), usage.is_empty()) {
            (true, _) => usage,
            (false, true) => prefix.clone(),
            (false, false) => format!("{prefix} {usage}"),
        })
        .collect();

    match format {
        Format::Json => {
            let out = serde_json::json!({ "path": path, "usage": lines });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            for line in &lines {
                println!("{line}");
            }
        }
    }
    Ok(())
}

fn cmd_lint(config: DispatcherConfig, format: Format) -> Result<()> {
    let (dispatcher, conflicts) = demo::build(config)?;
    let mut issues: Vec<Diagnostic> = dispatcher
        .ambiguities()
        .iter()
        .map(|ambiguity| ambiguity.to_diagnostic(dispatcher.tree()))
        .collect();
    issues.extend(conflicts.iter().map(|conflict| conflict.to_diagnostic()));
    let ok = !issues.iter().any(Diagnostic::is_error);

    match format {
        Format::Json => {
            let out = serde_json::json!({ "ok": ok, "issues": issues });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            render_diagnostics_pretty("", &issues);
            print_summary(&issues);
            if issues.is_empty() {
                eprintln!("lint ok");
            }
        }
    }

    if !ok {
        process::exit(1);
    }
    Ok(())
}

fn cmd_explain(id: &str, format: Format) -> Result<()> {
    match format {
        Format::Json => {
            let out = serde_json::json!({
                "id": id,
                "explanation": diag::explain(id),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            if let Some(text) = diag::explain(id) {
                use ariadne::Fmt;
                println!("{}: {}", id.fg(ariadne::Color::Cyan), text);
            } else {
                println!("{id}: (no explanation available)");
            }
        }
    }
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────────────

fn load_config(path: Option<&str>) -> Result<DispatcherConfig> {
    let Some(path) = path else {
        return Ok(DispatcherConfig::default());
    };
    let text = fs::read_to_string(path).with_context(|| format!("failed to read config '{path}'"))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse config '{path}'"))
}

fn find_node(dispatcher: &Dispatcher<Session>, path: &[String]) -> Result<NodeId> {
    let segments: Vec<&str> = path.iter().map(String::as_str).collect();
    match dispatcher.find_node(&segments) {
        Some(node) => Ok(node),
        None => bail!("no command at '{}'", path.join(" ")),
    }
}
