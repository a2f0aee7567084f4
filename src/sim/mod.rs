/// Simulation driver with parallel, order-stable aggregation.
pub mod engine;
/// Switch-on event placement and minute expansion.
pub mod placement;
pub mod stats;
pub mod types;

pub use engine::{CancelToken, simulate, simulate_with_cancel};
pub use types::{DayTrace, LoadProfile, SimulationResult, SwitchOnEvent};
