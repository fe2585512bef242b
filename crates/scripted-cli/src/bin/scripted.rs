use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use scripted_cli::{describe_script, help_index, help_topic};
use scripted_host::{ConfigError, ScriptedConfig};
use scripted_runner::logging::init_logging;
use scripted_runner::{load_scenario, run_command_loop, run_scenario, HostCommand, SimulatedServer};

#[derive(Parser)]
#[command(version, about, long_about = None, disable_help_subcommand = true)]
pub struct Cli {
    /// Enables debug mode
    #[arg(short, long, action = clap::ArgAction::Count)]
    debug: u8,

    /// Config file to use instead of the default location
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List scripts in the script directory
    List,
    /// Show every action and variable, or help for one of them
    Help { topic: Option<String> },
    /// Run a script once from the console. Scenarios can run scripts as a
    /// joined player with `run <script> <player>`.
    Run { script: String },
    /// Replay a scenario file against a simulated server
    Scenario { file: PathBuf },
    /// Read host commands from stdin until EOF or Ctrl-C
    Console,
}

fn load_config(path: Option<&PathBuf>) -> Result<ScriptedConfig> {
    let path = match path {
        Some(path) => path.clone(),
        None => ScriptedConfig::config_path()?,
    };

    match ScriptedConfig::load_from(&path) {
        Ok(config) => Ok(config),
        Err(ConfigError::NotFound(_)) => {
            let config = ScriptedConfig::example();
            config.save_to(&path)?;
            eprintln!("Config file created at: {}", path.display());
            Ok(config)
        }
        Err(err) => Err(err).context("Failed to load config"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    let filter = if cli.debug > 0 || config.scripting.debug {
        "info,scripting=debug,events=debug,runner=debug"
    } else {
        config.logging.filter.as_str()
    };
    let _guard = init_logging("cli", config.logging.file, filter)?;

    let server = Arc::new(SimulatedServer::from_config(&config)?);

    match cli.command {
        Command::List => {
            let scripts = server.catalog().list_scripts();
            if scripts.is_empty() {
                println!(
                    "No scripts in {}",
                    config.scripting.script_dir().display()
                );
            }
            for script in scripts {
                println!("{}", describe_script(&script));
                script.dispose();
            }
        }
        Command::Help { topic: None } => print!("{}", help_index(server.engine())),
        Command::Help { topic: Some(topic) } => match help_topic(server.engine(), &topic) {
            Some(help) => print!("{}", help),
            None => bail!("No action or variable named '{}'", topic),
        },
        Command::Run { script } => {
            let report = server.run_script(&script, None)?;
            for outcome in &report.outcomes {
                println!("{:>4} {:<16} {}", outcome.line, outcome.action, outcome.response);
            }
            if !report.is_success() {
                bail!("Script {} did not complete cleanly", report.script);
            }
        }
        Command::Scenario { file } => {
            let commands = load_scenario(&file)?;
            let stats = run_scenario(server.clone(), commands).await?;
            for hint in server.world().hints() {
                println!("[hint {}] {}", hint.player, hint.text);
            }
            println!("{} applied, {} failed", stats.applied, stats.failed);
        }
        Command::Console => run_console(server).await?,
    }

    Ok(())
}

async fn run_console(server: Arc<SimulatedServer>) -> Result<()> {
    let (tx, rx) = mpsc::channel::<HostCommand>(64);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(run_command_loop(server, rx, shutdown_rx));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    info!(target: "runner", "Reading commands from stdin");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let line = line.split('#').next().unwrap_or("").trim();
                if line.is_empty() {
                    continue;
                }
                match line.parse::<HostCommand>() {
                    Ok(command) => {
                        if tx.send(command).await.is_err() {
                            error!(target: "runner", "Command loop exited early");
                            break;
                        }
                    }
                    Err(e) => warn!(target: "runner", "'{}': {}", line, e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!(target: "runner", "Received Ctrl-C, shutting down");
                let _ = shutdown_tx.send(true);
                break;
            }
        }
    }

    drop(tx);
    let stats = handle.await.context("Command loop panicked")?;
    println!("{} applied, {} failed", stats.applied, stats.failed);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_takes_only_a_script_name() {
        let cli = Cli::try_parse_from(["scripted", "run", "welcome"]).unwrap();
        assert!(matches!(cli.command, Command::Run { script } if script == "welcome"));

        assert!(Cli::try_parse_from(["scripted", "run", "welcome", "--sender", "1"]).is_err());
    }
}
