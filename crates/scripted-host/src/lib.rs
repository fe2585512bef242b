//! Script execution and event dispatch engine
//!
//! Scripts are plain text files of queued action calls. This crate parses
//! them, substitutes `{VARIABLES}` at execution time, runs the queue, and
//! binds scripts to host events through [`EventScriptModule`]. The host side
//! (players, world, event sources) lives in `scripted-events`.
pub mod actions;
pub mod binding;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod expr;
pub mod script;
pub mod variables;

pub use actions::{Action, ActionContext, ActionRegistry, ActionResponse, ActionSubgroup};
pub use binding::{DispatchReport, EventScriptModule};
pub use catalog::{DirectoryCatalog, MemoryCatalog, ScriptCatalog};
pub use config::{ConfigError, ScriptedConfig};
pub use engine::Engine;
pub use error::{ArgumentError, CatalogError, ExprError, MessageKind, ScriptError, VariableError};
pub use script::{ExecutionReport, Executor, Flag, Script, ScriptScope};
pub use variables::{PlayerSet, Resolver, Variable, VariableRegistry, VariableValue};
