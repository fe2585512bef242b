//! Event binding
//!
//! [`EventScriptModule`] connects scripts flagged `!-- EVENT <name>` to the
//! host's event sources. It is either Idle or Bound:
//!
//! - `begin_connections` indexes every script's `EVENT` and `CUSTOMEVENT`
//!   flags and subscribes once per distinct event name.
//! - `terminate_connections` removes exactly the callbacks it installed and
//!   clears the indexes.
//!
//! Each fired event reads fresh scripts from the catalog, injects the
//! payload as `{EV<FIELD>}` variables and executes them one after another.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};

use scripted_events::projection::project;
use scripted_events::{
    DisableRuleGate, EventArgs, EventCallback, EventKind, EventSourceDescriptor,
    EventSourceRegistry, PayloadShape, PayloadValue, World,
};
use tracing::{debug, info, warn};

use crate::catalog::ScriptCatalog;
use crate::error::MessageKind;
use crate::script::{ExecutionReport, Executor, ScopedValue, Script};
use crate::variables::PlayerSet;

pub const EVENT_FLAG: &str = "EVENT";
pub const CUSTOM_EVENT_FLAG: &str = "CUSTOMEVENT";

/// Events whose payload player already reflects the new state, so the state
/// from just before the event is exposed as `{EVLAST*}`
const LAST_STATE_EVENTS: &[EventKind] = &[EventKind::Left, EventKind::ChangingRole];

/// What one dispatch did
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    pub event: String,
    pub executions: Vec<ExecutionReport>,
    /// Script names the catalog could not produce
    pub failed: Vec<(String, MessageKind)>,
    /// Stopped by a disable rule before any script ran
    pub denied: bool,
    pub elapsed: Duration,
}

#[derive(Default)]
struct BindingState {
    bound: bool,
    /// event name -> script names
    event_data: HashMap<String, Vec<String>>,
    /// custom event name -> script names
    custom_event_data: HashMap<String, Vec<String>>,
    connected: BTreeSet<String>,
    stored: Vec<(EventSourceDescriptor, EventCallback)>,
}

/// One injected variable, computed once per dispatch
struct InjectedVariable {
    token: String,
    discriminator: &'static str,
    value: ScopedValue,
}

pub struct EventScriptModule {
    catalog: Arc<dyn ScriptCatalog>,
    registry: Arc<dyn EventSourceRegistry>,
    gate: Arc<dyn DisableRuleGate>,
    world: Arc<dyn World>,
    state: Mutex<BindingState>,
    lifecycle: Mutex<Vec<(EventSourceDescriptor, EventCallback)>>,
    this: Weak<EventScriptModule>,
}

impl EventScriptModule {
    pub fn new(
        catalog: Arc<dyn ScriptCatalog>,
        registry: Arc<dyn EventSourceRegistry>,
        gate: Arc<dyn DisableRuleGate>,
        world: Arc<dyn World>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            catalog,
            registry,
            gate,
            world,
            state: Mutex::new(BindingState::default()),
            lifecycle: Mutex::new(Vec::new()),
            this: this.clone(),
        })
    }

    fn state(&self) -> MutexGuard<'_, BindingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hook round lifecycle: waiting-for-players binds, restarting unbinds
    pub fn init(&self) {
        let mut lifecycle = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
        if !lifecycle.is_empty() {
            return;
        }

        let hooks: [(EventKind, fn(&EventScriptModule)); 2] = [
            (EventKind::WaitingForPlayers, |m| m.begin_connections()),
            (EventKind::RestartingRound, |m| m.terminate_connections()),
        ];

        for (kind, hook) in hooks {
            for source in self.registry.sources().into_iter().filter(|s| s.event == kind) {
                let this = self.this.clone();
                let run = move || {
                    if let Some(module) = this.upgrade() {
                        hook(&module);
                    }
                };
                let callback = match source.shape {
                    PayloadShape::None => EventCallback::bare(run),
                    PayloadShape::Typed => EventCallback::typed(move |_| run()),
                };

                match self.registry.subscribe(&source, callback.clone()) {
                    Ok(()) => lifecycle.push((source, callback)),
                    Err(e) => warn!(target: "events", "Failed to hook {}: {}", kind, e),
                }
            }
        }

        info!(target: "events", "Event scripts initialized ({} lifecycle hooks)", lifecycle.len());
    }

    /// Unbind everything and remove the lifecycle hooks
    pub fn kill(&self) {
        self.terminate_connections();

        let mut lifecycle = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
        for (source, callback) in lifecycle.drain(..) {
            self.registry.unsubscribe(&source, &callback);
        }
    }

    /// Index script flags and subscribe to every referenced event. No-op
    /// when already bound.
    pub fn begin_connections(&self) {
        let mut state = self.state();
        if state.bound {
            debug!(target: "events", "Event scripts already connected");
            return;
        }
        state.bound = true;

        for script in self.catalog.list_scripts() {
            index_flags(&mut state.event_data, &script, EVENT_FLAG);
            index_flags(&mut state.custom_event_data, &script, CUSTOM_EVENT_FLAG);
            script.dispose();
        }

        let mut names: Vec<String> = state.event_data.keys().cloned().collect();
        names.sort();
        for name in names {
            self.connect_dynamic_event(&mut state, &name);
        }

        info!(
            target: "events",
            "Connected {} event(s) for {} event script(s), {} custom event(s)",
            state.connected.len(),
            state.event_data.values().map(Vec::len).sum::<usize>(),
            state.custom_event_data.len()
        );
    }

    fn connect_dynamic_event(&self, state: &mut BindingState, name: &str) {
        if state.connected.contains(name) {
            return;
        }

        let matching: Vec<EventSourceDescriptor> = self
            .registry
            .sources()
            .into_iter()
            .filter(|source| source.name() == name)
            .collect();

        if matching.is_empty() {
            warn!(target: "events", "No event source named '{}'; scripts bound to it will never run", name);
            return;
        }

        for source in matching {
            let callback = self.dispatch_callback(source.shape, name);
            match self.registry.subscribe(&source, callback.clone()) {
                Ok(()) => {
                    debug!(target: "events", "Connected {}.{}", source.handler, name);
                    state.stored.push((source, callback));
                }
                Err(e) => warn!(target: "events", "Failed to connect {}: {}", name, e),
            }
        }
        state.connected.insert(name.to_string());
    }

    fn dispatch_callback(&self, shape: PayloadShape, name: &str) -> EventCallback {
        let this = self.this.clone();
        let name = name.to_string();
        match shape {
            PayloadShape::None => EventCallback::bare(move || {
                if let Some(module) = this.upgrade() {
                    module.on_any_event(&name, None);
                }
            }),
            PayloadShape::Typed => EventCallback::typed(move |args| {
                if let Some(module) = this.upgrade() {
                    module.on_any_event(&name, Some(args));
                }
            }),
        }
    }

    /// Remove every installed callback and return to Idle. No-op when idle.
    pub fn terminate_connections(&self) {
        let mut state = self.state();
        if !state.bound {
            return;
        }

        let stored = std::mem::take(&mut state.stored);
        for (source, callback) in &stored {
            if !self.registry.unsubscribe(source, callback) {
                warn!(target: "events", "Callback for {} was already removed", source.name());
            }
        }

        state.event_data.clear();
        state.custom_event_data.clear();
        state.connected.clear();
        state.bound = false;
        info!(target: "events", "Disconnected {} event callback(s)", stored.len());
    }

    /// Run every script bound to host event `name`
    pub fn on_any_event(&self, name: &str, mut args: Option<&mut EventArgs>) -> DispatchReport {
        let started = Instant::now();
        let mut report = DispatchReport {
            event: name.to_string(),
            ..Default::default()
        };

        if let Some(args) = args.as_deref_mut() {
            if self.is_disabled(args) {
                args.deny();
                report.denied = true;
                report.elapsed = started.elapsed();
                return report;
            }
        }

        let Some(scripts) = self.state().event_data.get(name).cloned() else {
            return report;
        };

        let variables = self.event_variables(args.as_deref());
        self.run_scripts(&scripts, &variables, &mut report);

        report.elapsed = started.elapsed();
        debug!(
            target: "events",
            "Dispatched {} to {} script(s) in {:?}",
            name,
            report.executions.len(),
            report.elapsed
        );
        report
    }

    /// Run every script flagged `!-- CUSTOMEVENT <name>`
    pub fn fire_custom_event(&self, name: &str) -> DispatchReport {
        let started = Instant::now();
        let mut report = DispatchReport {
            event: name.to_string(),
            ..Default::default()
        };

        let Some(scripts) = self.state().custom_event_data.get(name).cloned() else {
            debug!(target: "events", "No scripts for custom event {}", name);
            return report;
        };

        self.run_scripts(&scripts, &[], &mut report);

        report.elapsed = started.elapsed();
        debug!(
            target: "events",
            "Fired custom event {} for {} script(s) in {:?}",
            name,
            report.executions.len(),
            report.elapsed
        );
        report
    }

    fn is_disabled(&self, args: &EventArgs) -> bool {
        if !args.is_deniable() {
            return false;
        }
        let Some(player) = args.player().and_then(|id| self.world.player(id)) else {
            return false;
        };

        match self.gate.player_disable_event(args.kind(), &player) {
            Some(rule) => {
                debug!(
                    target: "events",
                    "{} disabled for {} ({:?})",
                    args.kind(),
                    player.user_id,
                    rule.user_id
                );
                true
            }
            None => false,
        }
    }

    fn event_variables(&self, args: Option<&EventArgs>) -> Vec<InjectedVariable> {
        let Some(args) = args else {
            return Vec::new();
        };

        let mut variables = Vec::new();
        for (field, value) in project(args) {
            let value = match value {
                PayloadValue::Player(id) => {
                    let is_npc = self.world.player(id).is_some_and(|p| p.is_npc);
                    if is_npc {
                        continue;
                    }
                    ScopedValue::Players(PlayerSet::single(id))
                }
                PayloadValue::Symbol(symbol) => ScopedValue::Text(symbol.to_string()),
                PayloadValue::Bool(b) => ScopedValue::Text(if b { "TRUE" } else { "FALSE" }.to_string()),
                PayloadValue::Text(text) => ScopedValue::Text(text),
            };
            variables.push(InjectedVariable {
                token: format!("EV{}", field.to_ascii_uppercase()),
                discriminator: field,
                value,
            });
        }

        if LAST_STATE_EVENTS.contains(&args.kind()) {
            if let Some(player) = args.player().and_then(|id| self.world.player(id)) {
                let last = [
                    ("EVLASTNAME", player.display_name().to_string()),
                    ("EVLASTUSERID", player.user_id.clone()),
                    ("EVLASTROLE", player.role.to_string()),
                    ("EVLASTTEAM", player.team().to_string()),
                    ("EVLASTZONE", player.zone().to_string()),
                    ("EVLASTROOM", player.room.to_string()),
                ];
                variables.extend(last.into_iter().map(|(token, value)| InjectedVariable {
                    token: token.to_string(),
                    discriminator: "LastPlayerState",
                    value: ScopedValue::Text(value),
                }));
            }
        }

        variables
    }

    fn run_scripts(&self, names: &[String], variables: &[InjectedVariable], report: &mut DispatchReport) {
        for name in names {
            let mut script = match self.catalog.read_script(name, Executor::Automatic) {
                Ok(script) => script,
                Err(e) => {
                    warn!(target: "events", "Skipping script {} for {}: {}", name, report.event, e);
                    report.failed.push((name.clone(), e.kind()));
                    continue;
                }
            };

            debug!(target: "events", "Including script {} for {}", name, report.event);
            inject(&mut script, variables);

            match script.execute() {
                Ok(execution) => report.executions.push(execution),
                Err(e) => warn!(target: "events", "{}", e),
            }
            script.dispose();
        }
    }

    pub fn is_bound(&self) -> bool {
        self.state().bound
    }

    /// Scripts indexed under host event `name`
    pub fn event_scripts(&self, name: &str) -> Vec<String> {
        self.state().event_data.get(name).cloned().unwrap_or_default()
    }

    pub fn custom_event_scripts(&self, name: &str) -> Vec<String> {
        self.state().custom_event_data.get(name).cloned().unwrap_or_default()
    }

    /// Event names with at least one indexed script, sorted
    pub fn event_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state().event_data.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn custom_event_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state().custom_event_data.keys().cloned().collect();
        names.sort();
        names
    }

    /// Event names with a live subscription, sorted
    pub fn connected_events(&self) -> Vec<String> {
        self.state().connected.iter().cloned().collect()
    }

    /// Number of (source, callback) pairs awaiting teardown
    pub fn stored_callbacks(&self) -> usize {
        self.state().stored.len()
    }
}

fn index_flags(index: &mut HashMap<String, Vec<String>>, script: &Script, key: &str) {
    for flag in script.flags_named(key) {
        for event in &flag.arguments {
            let names = index.entry(event.clone()).or_default();
            if !names.iter().any(|n| n == script.name()) {
                names.push(script.name().to_string());
            }
        }
    }
}

fn inject(script: &mut Script, variables: &[InjectedVariable]) {
    for variable in variables {
        match &variable.value {
            ScopedValue::Text(text) => {
                script.add_variable(&variable.token, variable.discriminator, text.clone())
            }
            ScopedValue::Players(players) => {
                script.add_player_variable(&variable.token, variable.discriminator, players.clone())
            }
        }
    }
}
