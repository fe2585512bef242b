// Integration tests for event binding and dispatch

use scripted_events::{
    ChangingRoleEventArgs, DisableRule, DisabledEvents, DoorType, EventArgs, EventHub, EventKind,
    InteractingDoorEventArgs, JoinedEventArgs, LeftEventArgs, MemoryWorld, Player, PlayerId,
    RoleType, SpawnReason, World,
};
use scripted_host::{
    CatalogError, Engine, EventScriptModule, Executor, MemoryCatalog, MessageKind, Script,
    ScriptCatalog,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts catalog calls made by the binding module
struct CountingCatalog {
    inner: MemoryCatalog,
    reads: AtomicUsize,
    lists: AtomicUsize,
}

impl ScriptCatalog for CountingCatalog {
    fn list_scripts(&self) -> Vec<Script> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        self.inner.list_scripts()
    }

    fn read_script(&self, name: &str, executor: Executor) -> Result<Script, CatalogError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read_script(name, executor)
    }
}

struct Harness {
    world: Arc<MemoryWorld>,
    hub: Arc<EventHub>,
    catalog: Arc<CountingCatalog>,
    module: Arc<EventScriptModule>,
}

fn harness(scripts: &[(&str, &str)], rules: Vec<DisableRule>) -> Harness {
    let world = Arc::new(MemoryWorld::new());
    for (id, name) in [(1, "Alice"), (2, "Bob")] {
        world.add_player(Player::new(
            PlayerId(id),
            name,
            format!("{}@steam", name.to_lowercase()),
        ));
    }
    world.set_role(PlayerId(1), RoleType::Scientist);
    world.set_role(PlayerId(2), RoleType::ClassD);

    let engine = Arc::new(Engine::new(world.clone()));
    let catalog = Arc::new(CountingCatalog {
        inner: MemoryCatalog::with_scripts(engine, scripts.iter().copied()),
        reads: AtomicUsize::new(0),
        lists: AtomicUsize::new(0),
    });
    let hub = Arc::new(EventHub::new());
    let module = EventScriptModule::new(
        catalog.clone(),
        hub.clone(),
        Arc::new(DisabledEvents::with_rules(rules)),
        world.clone(),
    );

    Harness {
        world,
        hub,
        catalog,
        module,
    }
}

#[test]
fn test_begin_connections_is_idempotent() {
    let h = harness(
        &[
            ("greet", "!-- EVENT Joined\nHINTPLAYER {EVPLAYER} 3 Welcome"),
            ("bye", "!-- EVENT Left\nLOG bye"),
        ],
        Vec::new(),
    );

    h.module.begin_connections();
    let connected = h.module.connected_events();
    let stored = h.module.stored_callbacks();

    h.module.begin_connections();
    assert_eq!(h.module.connected_events(), connected);
    assert_eq!(h.module.stored_callbacks(), stored);
    assert_eq!(h.catalog.lists.load(Ordering::SeqCst), 1);
    assert_eq!(h.hub.handler_count(EventKind::Joined), 1);
    assert_eq!(h.hub.handler_count(EventKind::Left), 1);
}

#[test]
fn test_terminate_connections_clears_everything() {
    let h = harness(
        &[
            ("greet", "!-- EVENT Joined\nLOG hi"),
            ("boom", "!-- CUSTOMEVENT Boom\nLOG boom"),
        ],
        Vec::new(),
    );

    // Idle: no-op
    h.module.terminate_connections();
    assert!(!h.module.is_bound());

    h.module.begin_connections();
    assert!(h.module.is_bound());
    h.module.terminate_connections();

    assert!(!h.module.is_bound());
    assert!(h.module.connected_events().is_empty());
    assert_eq!(h.module.stored_callbacks(), 0);
    assert!(h.module.event_names().is_empty());
    assert!(h.module.custom_event_names().is_empty());
    assert_eq!(h.hub.handler_count(EventKind::Joined), 0);

    h.module.terminate_connections();
    assert!(!h.module.is_bound());
}

#[test]
fn test_event_without_scripts_makes_no_catalog_calls() {
    let h = harness(&[("greet", "!-- EVENT Joined\nLOG hi")], Vec::new());
    h.module.begin_connections();

    let mut args = EventArgs::Left(LeftEventArgs {
        player: PlayerId(1),
    });
    let report = h.module.on_any_event("Left", Some(&mut args));

    assert!(report.executions.is_empty());
    assert_eq!(h.catalog.reads.load(Ordering::SeqCst), 0);
}

#[test]
fn test_hub_event_runs_bound_script_with_event_variables() {
    let h = harness(
        &[("greet", "!-- EVENT Joined\nHINTPLAYER {EVPLAYER} 3 Welcome {GET:{EVPLAYER}:NAME}")],
        Vec::new(),
    );
    h.module.begin_connections();

    h.hub.raise(&mut EventArgs::Joined(JoinedEventArgs {
        player: PlayerId(2),
    }));

    let hints = h.world.hints();
    assert_eq!(hints.len(), 1);
    assert_eq!(hints[0].player, PlayerId(2));
    assert_eq!(hints[0].text, "Welcome Bob");
    assert_eq!(h.catalog.reads.load(Ordering::SeqCst), 1);
}

#[test]
fn test_left_exposes_state_before_leaving() {
    let h = harness(
        &[(
            "bye",
            "!-- EVENT Left\nHINTPLAYER 2 5 {EVLASTNAME} {EVLASTROLE} {EVLASTTEAM} {EVLASTZONE} {EVLASTROOM}",
        )],
        Vec::new(),
    );
    h.module.begin_connections();

    // The host raises Left while the player is still present, then removes it
    h.hub.raise(&mut EventArgs::Left(LeftEventArgs {
        player: PlayerId(1),
    }));
    h.world.remove_player(PlayerId(1));

    let hints = h.world.hints();
    assert_eq!(hints.len(), 1);
    assert_eq!(
        hints[0].text,
        "Alice Scientist Scientists LightContainment Lcz914"
    );
}

#[test]
fn test_changing_role_exposes_old_and_new_role() {
    let h = harness(
        &[(
            "role",
            "!-- EVENT ChangingRole\nHINTPLAYER {EVPLAYER} 5 {EVLASTROLE} -> {EVNEWROLE} ({EVREASON}, {EVISALLOWED})",
        )],
        Vec::new(),
    );
    h.module.begin_connections();

    h.hub.raise(&mut EventArgs::ChangingRole(ChangingRoleEventArgs {
        player: PlayerId(2),
        new_role: RoleType::ChaosConscript,
        reason: SpawnReason::Respawn,
        is_allowed: true,
    }));

    let hints = h.world.hints();
    assert_eq!(hints.len(), 1);
    assert_eq!(hints[0].text, "ClassD -> ChaosConscript (Respawn, TRUE)");
}

#[test]
fn test_missing_argument_is_invalid_usage_and_skips_execute() {
    let h = harness(
        &[("heal", "!-- EVENT Joined\nHP {EVPLAYER}\nLOG still running")],
        Vec::new(),
    );
    h.module.begin_connections();

    let mut args = EventArgs::Joined(JoinedEventArgs {
        player: PlayerId(1),
    });
    let report = h.module.on_any_event("Joined", Some(&mut args));

    let execution = &report.executions[0];
    assert_eq!(execution.outcomes.len(), 2);
    assert_eq!(
        execution.outcomes[0].response.kind(),
        MessageKind::InvalidUsage
    );
    assert!(execution.outcomes[1].response.is_success());
    assert_eq!(h.world.player(PlayerId(1)).map(|p| p.health), Some(100.0));
}

#[test]
fn test_disable_rule_denies_player_event() {
    let h = harness(
        &[("door", "!-- EVENT InteractingDoor\nLOG door used")],
        vec![DisableRule {
            event: EventKind::InteractingDoor,
            user_id: Some("alice@steam".to_string()),
        }],
    );
    h.module.begin_connections();

    let mut alice = EventArgs::InteractingDoor(InteractingDoorEventArgs {
        player: PlayerId(1),
        door: DoorType::GateA,
        is_allowed: true,
    });
    let report = h.module.on_any_event("InteractingDoor", Some(&mut alice));
    assert!(report.denied);
    assert_eq!(alice.is_allowed(), Some(false));
    assert_eq!(h.catalog.reads.load(Ordering::SeqCst), 0);

    let mut bob = EventArgs::InteractingDoor(InteractingDoorEventArgs {
        player: PlayerId(2),
        door: DoorType::GateA,
        is_allowed: true,
    });
    let report = h.module.on_any_event("InteractingDoor", Some(&mut bob));
    assert!(!report.denied);
    assert_eq!(bob.is_allowed(), Some(true));
    assert_eq!(report.executions.len(), 1);
}

#[test]
fn test_catalog_failures_do_not_stop_other_scripts() {
    let h = harness(
        &[
            ("a_off", "!-- DISABLE\n!-- EVENT Joined\nLOG off"),
            ("b_gone", "!-- EVENT Joined\nLOG gone"),
            ("c_ok", "!-- EVENT Joined\nLOG ok"),
        ],
        Vec::new(),
    );
    h.module.begin_connections();
    assert!(h.catalog.inner.remove("b_gone"));

    let mut args = EventArgs::Joined(JoinedEventArgs {
        player: PlayerId(1),
    });
    let report = h.module.on_any_event("Joined", Some(&mut args));

    assert_eq!(report.executions.len(), 1);
    assert_eq!(report.executions[0].script, "c_ok");
    assert_eq!(
        report.failed,
        vec![
            ("a_off".to_string(), MessageKind::DisabledScript),
            ("b_gone".to_string(), MessageKind::NotFoundScript),
        ]
    );
}

#[test]
fn test_npc_players_are_not_injected() {
    let h = harness(
        &[("greet", "!-- EVENT Joined\nHINTPLAYER {EVPLAYER} 3 hi")],
        Vec::new(),
    );
    h.world.add_npc(Player::new(PlayerId(9), "Dummy", "npc"));
    h.module.begin_connections();

    let mut args = EventArgs::Joined(JoinedEventArgs {
        player: PlayerId(9),
    });
    let report = h.module.on_any_event("Joined", Some(&mut args));

    assert_eq!(
        report.executions[0].outcomes[0].response.kind(),
        MessageKind::NoPlayersFound
    );
    assert!(h.world.hints().is_empty());
}

#[test]
fn test_custom_event_runs_flagged_scripts() {
    let h = harness(
        &[
            ("boom", "!-- CUSTOMEVENT Boom\nHINTPLAYER * 3 boom"),
            ("greet", "!-- EVENT Joined\nLOG hi"),
        ],
        Vec::new(),
    );
    h.module.begin_connections();

    let report = h.module.fire_custom_event("Boom");
    assert_eq!(report.executions.len(), 1);
    assert_eq!(h.world.hints().len(), 2);

    let report = h.module.fire_custom_event("Nothing");
    assert!(report.executions.is_empty());
}

#[test]
fn test_round_lifecycle_hooks() {
    let h = harness(&[("greet", "!-- EVENT Joined\nHINTPLAYER {EVPLAYER} 3 hi")], Vec::new());
    h.module.init();

    h.hub.raise_bare(EventKind::WaitingForPlayers);
    assert!(h.module.is_bound());

    h.hub.raise(&mut EventArgs::Joined(JoinedEventArgs {
        player: PlayerId(1),
    }));
    assert_eq!(h.world.hints().len(), 1);

    h.hub.raise_bare(EventKind::RestartingRound);
    assert!(!h.module.is_bound());
    assert_eq!(h.hub.handler_count(EventKind::Joined), 0);

    h.hub.raise(&mut EventArgs::Joined(JoinedEventArgs {
        player: PlayerId(1),
    }));
    assert_eq!(h.world.hints().len(), 1);

    h.module.kill();
    assert_eq!(h.hub.handler_count(EventKind::WaitingForPlayers), 0);
    assert_eq!(h.hub.handler_count(EventKind::RestartingRound), 0);
}
