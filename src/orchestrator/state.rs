// src/orchestrator/state.rs

//! Lifecycle state machine
//!
//! ```text
//! start -> laid-out -> requirements-declared -> configured -> compiled
//!       -> tested -> installed -> info-published
//! ```
//!
//! Any non-terminal state may move to `failed`. `failed` and
//! `info-published` are terminal: there is no retry and no partial success.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A lifecycle phase as seen by recipe authors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Layout,
    BuildRequirements,
    Build,
    Package,
    PackageInfo,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Layout => "layout",
            Phase::BuildRequirements => "build_requirements",
            Phase::Build => "build",
            Phase::Package => "package",
            Phase::PackageInfo => "package_info",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a build currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildState {
    Start,
    LaidOut,
    RequirementsDeclared,
    Configured,
    Compiled,
    Tested,
    Installed,
    InfoPublished,
    Failed,
}

impl BuildState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildState::Start => "start",
            BuildState::LaidOut => "laid-out",
            BuildState::RequirementsDeclared => "requirements-declared",
            BuildState::Configured => "configured",
            BuildState::Compiled => "compiled",
            BuildState::Tested => "tested",
            BuildState::Installed => "installed",
            BuildState::InfoPublished => "info-published",
            BuildState::Failed => "failed",
        }
    }

    /// States reachable from this one
    pub fn valid_next_states(&self) -> Vec<BuildState> {
        match self {
            BuildState::Start => vec![BuildState::LaidOut, BuildState::Failed],
            BuildState::LaidOut => vec![BuildState::RequirementsDeclared, BuildState::Failed],
            BuildState::RequirementsDeclared => vec![BuildState::Configured, BuildState::Failed],
            BuildState::Configured => vec![BuildState::Compiled, BuildState::Failed],
            BuildState::Compiled => vec![BuildState::Tested, BuildState::Failed],
            BuildState::Tested => vec![BuildState::Installed, BuildState::Failed],
            BuildState::Installed => vec![BuildState::InfoPublished, BuildState::Failed],
            BuildState::InfoPublished => vec![],
            BuildState::Failed => vec![],
        }
    }

    pub fn can_transition_to(&self, next: BuildState) -> bool {
        self.valid_next_states().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        self.valid_next_states().is_empty()
    }

    /// The phase whose success leads into this state
    pub fn phase(&self) -> Option<Phase> {
        match self {
            BuildState::LaidOut => Some(Phase::Layout),
            BuildState::RequirementsDeclared => Some(Phase::BuildRequirements),
            BuildState::Configured | BuildState::Compiled | BuildState::Tested => Some(Phase::Build),
            BuildState::Installed => Some(Phase::Package),
            BuildState::InfoPublished => Some(Phase::PackageInfo),
            BuildState::Start | BuildState::Failed => None,
        }
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks the state of one build and every state it passed through
#[derive(Debug, Clone)]
pub struct Lifecycle {
    state: BuildState,
    history: Vec<BuildState>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: BuildState::Start,
            history: vec![BuildState::Start],
        }
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    pub fn history(&self) -> &[BuildState] {
        &self.history
    }

    /// Check a transition without performing it
    pub fn ensure_can_reach(&self, next: BuildState) -> Result<()> {
        if self.state.can_transition_to(next) {
            Ok(())
        } else {
            Err(Error::InvalidTransition {
                from: self.state,
                to: next,
            })
        }
    }

    pub fn transition_to(&mut self, next: BuildState) -> Result<()> {
        self.ensure_can_reach(next)?;
        self.state = next;
        self.history.push(next);
        Ok(())
    }

    /// Mark the build failed; a terminal build stays as it is
    pub fn fail(&mut self) {
        if !self.state.is_terminal() {
            self.state = BuildState::Failed;
            self.history.push(BuildState::Failed);
        }
    }
}
