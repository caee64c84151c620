pub mod climate;
pub mod config;
pub mod engine;
pub mod error;
pub mod individual;
pub mod population;
pub mod report;
pub mod rng;
pub mod scenario;
pub mod snapshot;
pub mod spatial;
pub mod zones;

pub use engine::{Engine, EngineBuilder, EngineSettings, TickSummary};
pub use error::{ConfigError, SimulationError};
pub use report::RunReport;
pub use scenario::{Scenario, ScenarioLoader};
