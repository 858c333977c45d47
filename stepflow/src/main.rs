//! Step-flow governance CLI.
//!
//! Validates agent step registries against their output schemas and answers
//! tool-permission questions for a step kind. Exit codes are stable (see
//! [`stepflow::exit_codes`]).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use stepflow::core::policy::{
    all_known_tools, filter_allowed_tools, is_bash_command_allowed, is_tool_allowed,
};
use stepflow::core::types::{PermissionResult, StepKind};
use stepflow::exit_codes;
use stepflow::io::config::{CONFIG_FILE, load_config};
use stepflow::io::paths::AgentPaths;
use stepflow::io::registry_store::load_registry;
use stepflow::logging;
use stepflow::validate::validate_agent;

#[derive(Parser)]
#[command(
    name = "stepflow",
    version,
    about = "Step registry validation and tool policy for agent workflows"
)]
struct Cli {
    /// Project root containing `stepflow.toml` and the agent directory.
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load an agent's registry and run every validator.
    Validate {
        #[arg(long)]
        agent: String,
    },
    /// Print the steps of a named flow in order.
    Flow {
        #[arg(long)]
        agent: String,
        name: String,
    },
    /// Print the tools a step kind may use, filtered from TOOL... or the full catalogue.
    Tools {
        #[arg(long)]
        kind: StepKind,
        tools: Vec<String>,
    },
    /// Check whether a step kind may use a tool.
    CheckTool {
        #[arg(long)]
        kind: StepKind,
        tool: String,
    },
    /// Check whether a step kind may run a shell command.
    CheckBash {
        #[arg(long)]
        kind: StepKind,
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Validate { agent } => cmd_validate(&cli.root, &agent),
        Command::Flow { agent, name } => cmd_flow(&cli.root, &agent, &name),
        Command::Tools { kind, tools } => Ok(cmd_tools(kind, &tools)),
        Command::CheckTool { kind, tool } => Ok(report(is_tool_allowed(&tool, kind))),
        Command::CheckBash { kind, command } => {
            Ok(report(is_bash_command_allowed(&command.join(" "), kind)))
        }
    }
}

fn cmd_validate(root: &Path, agent_id: &str) -> Result<i32> {
    let outcome = validate_agent(root, agent_id)?;
    for warning in &outcome.warnings {
        println!("warning: {warning}");
    }
    println!(
        "ok: agent '{}' ({} steps, {} flows, {} gated)",
        outcome.agent_id, outcome.steps, outcome.flows, outcome.gated_steps
    );
    Ok(exit_codes::OK)
}

fn cmd_flow(root: &Path, agent_id: &str, name: &str) -> Result<i32> {
    let cfg = load_config(&root.join(CONFIG_FILE))?;
    let paths = AgentPaths::new(root, agent_id, &cfg);
    let registry = load_registry(agent_id, &paths.registry_path)?;
    registry
        .get_flow(name)
        .with_context(|| format!("flow '{name}' is not defined for agent '{agent_id}'"))?;
    for step in registry.get_flow_steps(name) {
        println!("{} {}", step.step_id, step.kind);
    }
    Ok(exit_codes::OK)
}

fn cmd_tools(kind: StepKind, tools: &[String]) -> i32 {
    let allowed = if tools.is_empty() {
        filter_allowed_tools(all_known_tools(), kind)
    } else {
        filter_allowed_tools(tools, kind)
    };
    for tool in allowed {
        println!("{tool}");
    }
    exit_codes::OK
}

fn report(result: PermissionResult) -> i32 {
    if result.allowed {
        println!("allowed");
        return exit_codes::OK;
    }
    println!(
        "denied: {}",
        result.reason.as_deref().unwrap_or("no reason given")
    );
    exit_codes::DENIED
}
