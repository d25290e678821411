//! Pipeline execution engine

pub mod engine;
pub mod executor;

pub use engine::{DeployReport, EventHandler, ExecutionEngine, ExecutionEvent, RollbackReport};
pub use executor::{TaskExecutor, TaskOutcome};
