// Scenario files: one host command per line, `#` starts a comment

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, watch};
use tracing::info;

use crate::command::HostCommand;
use crate::command_loop::{run_command_loop, LoopStats};
use crate::server::SimulatedServer;

pub fn parse_scenario(source: &str) -> Result<Vec<HostCommand>> {
    source
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.split('#').next().unwrap_or("").trim()))
        .filter(|(_, line)| !line.is_empty())
        .map(|(number, line)| {
            line.parse::<HostCommand>()
                .with_context(|| format!("line {}: '{}'", number, line))
        })
        .collect()
}

pub fn load_scenario(path: &Path) -> Result<Vec<HostCommand>> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario {}", path.display()))?;
    parse_scenario(&source).with_context(|| format!("Invalid scenario {}", path.display()))
}

/// Feed every command through the command loop and wait for it to drain
pub async fn run_scenario(server: Arc<SimulatedServer>, commands: Vec<HostCommand>) -> Result<LoopStats> {
    let (tx, rx) = mpsc::channel(64);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    info!(target: "runner", "Running scenario with {} command(s)", commands.len());
    let handle = tokio::spawn(run_command_loop(server, rx, shutdown_rx));

    for command in commands {
        if tx.send(command).await.is_err() {
            break;
        }
    }
    drop(tx);

    let stats = handle.await.context("Command loop panicked")?;
    drop(shutdown_tx);
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scripted_events::{PlayerId, RoleType};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_skips_comments_and_reports_line() {
        let commands = parse_scenario(
            "# round one\nwaiting\n\njoin 1 Alice alice@steam  # first player\nrole 1 ClassD\n",
        )
        .unwrap();
        assert_eq!(commands.len(), 3);
        assert_eq!(
            commands[2],
            HostCommand::Role {
                id: PlayerId(1),
                role: RoleType::ClassD,
                reason: scripted_events::SpawnReason::ForceClass,
            }
        );

        let err = parse_scenario("waiting\nteleport 1\n").unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("scenario.txt");
        assert!(load_scenario(&path).is_err());

        fs::write(&path, "waiting\nstart\n").unwrap();
        assert_eq!(load_scenario(&path).unwrap().len(), 2);
    }
}
