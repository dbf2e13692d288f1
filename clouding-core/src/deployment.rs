use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The two kinds of deployment job the backend runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum DeploymentType {
    /// Dry run that produces a deployment plan.
    Plan,
    /// Applies a blueprint to its hosts.
    Deploy,
}

impl DeploymentType {
    /// Returns the path segment used by the backend.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DeploymentType::Plan => "plan",
            DeploymentType::Deploy => "deploy",
        }
    }
}

impl fmt::Display for DeploymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeploymentType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plan" => Ok(DeploymentType::Plan),
            "deploy" => Ok(DeploymentType::Deploy),
            other => Err(CoreError::InvalidDeploymentType { value: other.to_owned() }),
        }
    }
}
