pub mod simulation;
pub mod configuration;
pub mod dem;

pub use simulation::states::{tags, NVec3, Particle, ParticleCollection, PropertyBundle, BondParams, Shape, Tag};
pub use simulation::errors::{ColumnError, ConfigError, EngineError};
pub use simulation::params::{RunParameters, PackingType, CrossSection};
pub use simulation::properties::PropertyTable;
pub use simulation::engine::{Domain, SolveRequest, SolveSummary};
pub use simulation::scenario::{ColumnRun, Stage, RunReport};

pub use configuration::config::{ScenarioConfig, load_scenario};

pub use dem::DemDomain;
