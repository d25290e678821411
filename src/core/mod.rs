//! Core domain models
//!
//! This module defines the release tree, the deployment configuration,
//! tasks and the per-run pipeline state.

pub mod config;
pub mod context;
pub mod error;
pub mod pipeline;
pub mod release;
pub mod state;
pub mod task;

pub use config::DeployConfig;
pub use context::*;
pub use error::DeployError;
pub use pipeline::*;
pub use release::{ReleaseId, ReleaseLayout};
pub use state::*;
pub use task::*;
