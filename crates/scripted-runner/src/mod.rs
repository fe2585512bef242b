mod command;
mod command_loop;
pub mod logging;
mod scenario;
mod server;

pub use command::{CommandParseError, HostCommand};
pub use command_loop::{run_command_loop, LoopStats};
pub use scenario::{load_scenario, parse_scenario, run_scenario};
pub use server::{ServerError, SimulatedServer};
