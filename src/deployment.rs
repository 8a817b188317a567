//! Deployment stages and the branch groups that map to them.
use std::fmt;

use crate::config::BranchConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentStage {
    Staging,
    Production,
}

impl DeploymentStage {
    /// Value stored in the tracker's "Deployed to" field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Staging => "Staging",
            Self::Production => "Production",
        }
    }

    /// Classify a base branch. Production wins if a branch is somehow in
    /// both groups; `None` means the branch is not tracked.
    pub fn for_branch(branches: &BranchConfig, branch: &str) -> Option<Self> {
        if branches.production.iter().any(|b| b == branch) {
            Some(Self::Production)
        } else if branches.staging.iter().any(|b| b == branch) {
            Some(Self::Staging)
        } else {
            None
        }
    }
}

impl fmt::Display for DeploymentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_configured_branches() {
        let branches = BranchConfig::default();

        assert_eq!(
            DeploymentStage::for_branch(&branches, "master"),
            Some(DeploymentStage::Production)
        );
        assert_eq!(
            DeploymentStage::for_branch(&branches, "development"),
            Some(DeploymentStage::Staging)
        );
        assert_eq!(DeploymentStage::for_branch(&branches, "feature/x"), None);
    }

    #[test]
    fn displays_tracker_value() {
        assert_eq!(DeploymentStage::Production.to_string(), "Production");
        assert_eq!(DeploymentStage::Staging.as_str(), "Staging");
    }
}
