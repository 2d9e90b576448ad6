//! Scenario files: definition, execution and reporting

pub mod definition;
pub mod executor;
pub mod results;
pub mod verification;

pub use definition::{
    EnvironmentDefinition, MapDefinition, MoverDefinition, ScenarioDefinition, SpillDefinition,
    WeathererDefinition,
};
pub use executor::{ScenarioExecutor, ScenarioExecutorConfig};
pub use results::{ExecutionReport, MassBudget};
pub use verification::{VerificationCondition, VerificationResult};
