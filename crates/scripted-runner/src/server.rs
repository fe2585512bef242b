//! Simulated host server
//!
//! Owns the world, the event hub and the disable-rule gate, and translates
//! [`HostCommand`]s into world mutations and raised events. Deniable events
//! are raised before the mutation and only applied when still allowed;
//! `Left` and `ChangingRole` are raised while the world still holds the
//! player's previous state.

use std::sync::Arc;

use scripted_events::{
    ActivatingGeneratorEventArgs, ChangingRoleEventArgs, DecontaminatingEventArgs,
    DiedEventArgs, DisableRule, DisabledEvents, EventArgs, EventHub, EventKind,
    Generator, HurtingEventArgs, InteractingDoorEventArgs, JoinedEventArgs, LeftEventArgs,
    MemoryWorld, Player, PlayerId, RoleType, RoundEndedEventArgs, SpawnReason, SpawnedEventArgs, World,
};
use scripted_host::{
    CatalogError, DirectoryCatalog, Engine, EventScriptModule, ExecutionReport, Executor,
    ScriptCatalog, ScriptError, ScriptedConfig,
};
use tracing::{debug, info, warn};

use crate::command::HostCommand;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("player {0} is not connected")]
    UnknownPlayer(PlayerId),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Script(#[from] ScriptError),
}

pub struct SimulatedServer {
    world: Arc<MemoryWorld>,
    hub: Arc<EventHub>,
    rules: Arc<DisabledEvents>,
    engine: Arc<Engine>,
    catalog: Arc<dyn ScriptCatalog>,
    module: Arc<EventScriptModule>,
}

impl SimulatedServer {
    /// `catalog` receives the engine scripts will be parsed against
    pub fn new<F>(world: Arc<MemoryWorld>, rules: Vec<DisableRule>, catalog: F) -> Self
    where
        F: FnOnce(Arc<Engine>) -> Arc<dyn ScriptCatalog>,
    {
        let engine = Arc::new(Engine::new(world.clone()));
        let catalog = catalog(engine.clone());
        let hub = Arc::new(EventHub::new());
        let rules = Arc::new(DisabledEvents::with_rules(rules));
        let module = EventScriptModule::new(
            catalog.clone(),
            hub.clone(),
            rules.clone(),
            world.clone(),
        );
        module.init();

        Self {
            world,
            hub,
            rules,
            engine,
            catalog,
            module,
        }
    }

    /// Server reading scripts from the configured directory. With scripting
    /// disabled, scripts can still be run by hand but events bind nothing.
    pub fn from_config(config: &ScriptedConfig) -> Result<Self, scripted_host::ConfigError> {
        let rules = config.disable_rules()?;
        let script_dir = config.scripting.script_dir();
        info!(target: "runner", "Reading scripts from {}", script_dir.display());

        let server = Self::new(Arc::new(MemoryWorld::new()), rules, |engine| {
            Arc::new(DirectoryCatalog::new(script_dir, engine))
        });
        if !config.scripting.enabled {
            info!(target: "runner", "Event scripts disabled by config");
            server.module.kill();
        }
        Ok(server)
    }

    pub fn world(&self) -> &Arc<MemoryWorld> {
        &self.world
    }

    pub fn hub(&self) -> &Arc<EventHub> {
        &self.hub
    }

    pub fn module(&self) -> &Arc<EventScriptModule> {
        &self.module
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    pub fn rules(&self) -> &Arc<DisabledEvents> {
        &self.rules
    }

    pub fn catalog(&self) -> &Arc<dyn ScriptCatalog> {
        &self.catalog
    }

    fn require_player(&self, id: PlayerId) -> Result<Player, ServerError> {
        self.world.player(id).ok_or(ServerError::UnknownPlayer(id))
    }

    /// Raise a deniable event; true if no handler denied it
    fn raise_allowed(&self, mut args: EventArgs) -> bool {
        self.hub.raise(&mut args);
        let allowed = args.is_allowed().unwrap_or(true);
        if !allowed {
            debug!(target: "runner", "{} was denied", args.kind());
        }
        allowed
    }

    pub fn apply(&self, command: HostCommand) -> Result<(), ServerError> {
        match command {
            HostCommand::Waiting => self.hub.raise_bare(EventKind::WaitingForPlayers),
            HostCommand::Start => self.hub.raise_bare(EventKind::RoundStarted),
            HostCommand::End(leading_team) => self
                .hub
                .raise(&mut EventArgs::RoundEnded(RoundEndedEventArgs { leading_team })),
            HostCommand::Restart => self.hub.raise_bare(EventKind::RestartingRound),
            HostCommand::Join {
                id,
                nickname,
                user_id,
            } => {
                self.world.add_player(Player::new(id, nickname, user_id));
                self.hub
                    .raise(&mut EventArgs::Joined(JoinedEventArgs { player: id }));
            }
            HostCommand::Leave(id) => {
                self.require_player(id)?;
                self.hub
                    .raise(&mut EventArgs::Left(LeftEventArgs { player: id }));
                self.world.remove_player(id);
            }
            HostCommand::Role { id, role, reason } => self.change_role(id, role, reason)?,
            HostCommand::Hurt {
                id,
                amount,
                damage_type,
                attacker,
            } => {
                let player = self.require_player(id)?;
                let allowed = self.raise_allowed(EventArgs::Hurting(HurtingEventArgs {
                    player: id,
                    attacker,
                    amount,
                    damage_type,
                    is_allowed: true,
                }));
                if allowed {
                    let health = (player.health - amount).max(0.0);
                    self.world.set_health(id, health);
                    if health <= 0.0 && player.role.is_alive() {
                        self.hub.raise(&mut EventArgs::Died(DiedEventArgs {
                            player: id,
                            attacker,
                            damage_type,
                        }));
                        self.world.set_role(id, RoleType::Spectator);
                    }
                }
            }
            HostCommand::Door { id, door } => {
                self.require_player(id)?;
                let allowed = self.raise_allowed(EventArgs::InteractingDoor(
                    InteractingDoorEventArgs {
                        player: id,
                        door,
                        is_allowed: true,
                    },
                ));
                if allowed {
                    let open = self.world.door(door).is_some_and(|d| d.open);
                    self.world.set_door(door, !open);
                }
            }
            HostCommand::Generator { id, generator } => {
                self.require_player(id)?;
                let allowed = self.raise_allowed(EventArgs::ActivatingGenerator(
                    ActivatingGeneratorEventArgs {
                        player: id,
                        generator,
                        is_allowed: true,
                    },
                ));
                if allowed {
                    let mut state = self
                        .world
                        .generators()
                        .into_iter()
                        .find(|g| g.id == generator)
                        .unwrap_or_else(|| Generator::new(generator));
                    state.unlocked = true;
                    state.open = true;
                    state.activating = true;
                    self.world.add_generator(state);
                }
            }
            HostCommand::Decontaminate => {
                let allowed = self.raise_allowed(EventArgs::Decontaminating(
                    DecontaminatingEventArgs { is_allowed: true },
                ));
                if allowed {
                    self.world.set_decontaminated(true);
                }
            }
            HostCommand::Custom(name) => {
                self.module.fire_custom_event(&name);
            }
            HostCommand::Run { script, sender } => {
                let report = self.run_script(&script, sender)?;
                info!(
                    target: "runner",
                    "Script {} ran {} action(s), {} failed",
                    report.script,
                    report.outcomes.len(),
                    report.failures().count()
                );
            }
            HostCommand::Disable { event, user_id } => {
                self.rules.add(DisableRule { event, user_id });
            }
            HostCommand::Enable(event) => {
                let removed = self.rules.clear(event);
                debug!(target: "runner", "Removed {} disable rule(s) for {}", removed, event);
            }
            HostCommand::Sleep(_) => {
                warn!(target: "runner", "sleep is only meaningful inside the command loop");
            }
        }
        Ok(())
    }

    fn change_role(&self, id: PlayerId, role: RoleType, reason: SpawnReason) -> Result<(), ServerError> {
        let old_role = self.require_player(id)?.role;
        let allowed = self.raise_allowed(EventArgs::ChangingRole(ChangingRoleEventArgs {
            player: id,
            new_role: role,
            reason,
            is_allowed: true,
        }));
        if !allowed {
            return Ok(());
        }

        self.world.set_role(id, role);
        self.hub
            .raise(&mut EventArgs::Spawned(SpawnedEventArgs { player: id, old_role }));
        Ok(())
    }

    /// Run a script on demand. A player sender is exposed as `{SENDER}`.
    pub fn run_script(&self, name: &str, sender: Option<PlayerId>) -> Result<ExecutionReport, ServerError> {
        let executor = match sender {
            Some(id) => {
                self.require_player(id)?;
                Executor::Player(id)
            }
            None => Executor::Console,
        };

        let mut script = self.catalog.read_script(name, executor)?;
        let report = script.execute();
        script.dispose();
        Ok(report?)
    }

    /// Unbind event scripts and remove lifecycle hooks
    pub fn shutdown(&self) {
        self.module.kill();
    }
}
