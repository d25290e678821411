//! Rollback target selection

use crate::core::{DeployError, ReleaseId};
use serde::Serialize;

/// Which release a rollback should make live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollbackTarget {
    /// The release before the newest one
    Previous,
    /// A specific release identifier
    Version(String),
}

impl RollbackTarget {
    /// Build a target from an optional CLI value (empty means previous)
    pub fn from_option(version: Option<&str>) -> Self {
        match version.map(str::trim).filter(|v| !v.is_empty()) {
            Some(version) => RollbackTarget::Version(version.to_string()),
            None => RollbackTarget::Previous,
        }
    }
}

/// The release to switch to and the release it displaces
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollbackPlan {
    pub target: ReleaseId,
    pub current: ReleaseId,
}

/// Select the target and the displaced release from the known releases
///
/// `releases` must be sorted oldest first. The displaced release is always
/// the newest one, whether or not the target is its direct predecessor.
pub fn plan_rollback(releases: &[ReleaseId], target: &RollbackTarget) -> Result<RollbackPlan, DeployError> {
    match target {
        RollbackTarget::Previous => match releases {
            [.., previous, current] => Ok(RollbackPlan {
                target: previous.clone(),
                current: current.clone(),
            }),
            _ => Err(DeployError::InsufficientHistory {
                found: releases.len(),
            }),
        },
        RollbackTarget::Version(version) => {
            let target = releases
                .iter()
                .find(|r| r.as_str() == version)
                .ok_or_else(|| DeployError::UnknownVersion(version.clone()))?;
            let current = releases
                .last()
                .ok_or_else(|| DeployError::UnknownVersion(version.clone()))?;

            if target == current {
                return Err(DeployError::NothingToRollBack(version.clone()));
            }

            Ok(RollbackPlan {
                target: target.clone(),
                current: current.clone(),
            })
        }
    }
}
