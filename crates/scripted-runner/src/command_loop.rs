use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use crate::command::HostCommand;
use crate::server::SimulatedServer;

/// Counts collected by [`run_command_loop`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub applied: usize,
    pub failed: usize,
}

/// Apply commands to the server in arrival order until the channel closes or
/// shutdown is signalled
pub async fn run_command_loop(
    server: Arc<SimulatedServer>,
    mut commands: mpsc::Receiver<HostCommand>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> LoopStats {
    let mut stats = LoopStats::default();
    info!(target: "runner", "Command loop started");

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else {
                    info!(target: "runner", "Command channel closed");
                    break;
                };

                if let HostCommand::Sleep(duration) = command {
                    tokio::select! {
                        _ = tokio::time::sleep(duration) => {}
                        _ = shutdown_rx.changed() => {
                            info!(target: "runner", "Command loop received shutdown signal");
                            break;
                        }
                    }
                    continue;
                }

                match server.apply(command.clone()) {
                    Ok(()) => stats.applied += 1,
                    Err(e) => {
                        warn!(target: "runner", "{:?} failed: {}", command, e);
                        stats.failed += 1;
                    }
                }
            }
            _ = shutdown_rx.changed() => {
                info!(target: "runner", "Command loop received shutdown signal");
                break;
            }
        }
    }

    server.shutdown();
    info!(
        target: "runner",
        "Command loop stopped ({} applied, {} failed)",
        stats.applied,
        stats.failed
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use scripted_events::{MemoryWorld, PlayerId, World};
    use scripted_host::MemoryCatalog;

    fn server() -> Arc<SimulatedServer> {
        Arc::new(SimulatedServer::new(
            Arc::new(MemoryWorld::new()),
            Vec::new(),
            |engine| {
                Arc::new(MemoryCatalog::with_scripts(
                    engine,
                    [("welcome", "!-- EVENT Joined\nHINTPLAYER {EVPLAYER} 3 hello")],
                ))
            },
        ))
    }

    #[tokio::test]
    async fn test_loop_applies_commands_until_channel_closes() {
        let server = server();
        let (tx, rx) = mpsc::channel(8);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run_command_loop(server.clone(), rx, shutdown_rx));

        for line in ["waiting", "join 1 Alice alice@steam", "sleep 1", "leave 5"] {
            tx.send(line.parse().unwrap()).await.unwrap();
        }
        drop(tx);

        let stats = handle.await.unwrap();
        assert_eq!(stats, LoopStats { applied: 2, failed: 1 });
        assert_eq!(server.world().hints().len(), 1);
        assert!(server.world().player(PlayerId(1)).is_some());
        // The loop unbinds on exit
        assert!(!server.module().is_bound());
    }

    #[tokio::test]
    async fn test_loop_stops_on_shutdown() {
        let server = server();
        let (_tx, rx) = mpsc::channel::<HostCommand>(8);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run_command_loop(server, rx, shutdown_rx));

        shutdown_tx.send(true).unwrap();
        let stats = handle.await.unwrap();
        assert_eq!(stats, LoopStats::default());
    }
}
