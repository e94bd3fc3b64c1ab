// src/orchestrator/config.rs

//! Configuration for the orchestrator

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the cache root
pub const CACHE_HOME_ENV: &str = "NBKIT_RECIPE_HOME";

/// What to do when the test phase has nothing to run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestPolicy {
    /// `BUILD_TESTING` must be on and at least one test must run
    #[default]
    Require,
    /// A disabled or empty test phase is reported as skipped
    AllowSkip,
}

impl std::str::FromStr for TestPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "require" => Ok(TestPolicy::Require),
            "allow-skip" => Ok(TestPolicy::AllowSkip),
            other => Err(Error::ParseError(format!(
                "Unknown test policy '{}', expected 'require' or 'allow-skip'",
                other
            ))),
        }
    }
}

/// Configuration for the Orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Local package cache holding exports, builds and packages
    pub cache_root: PathBuf,
    /// Parallel jobs passed to `cmake --build` and `ctest`
    pub jobs: u32,
    /// Keep the build folder after a successful create
    pub keep_build: bool,
    pub test_policy: TestPolicy,
    /// Explicit cmake executable, otherwise looked up on PATH
    pub cmake: Option<PathBuf>,
    /// Extra `-D` cache variables, applied after the recipe's
    pub variables: BTreeMap<String, String>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        let jobs = std::thread::available_parallelism()
            .map(|p| p.get() as u32)
            .unwrap_or(4);

        Self {
            cache_root: default_cache_root(),
            jobs,
            keep_build: false,
            test_policy: TestPolicy::Require,
            cmake: None,
            variables: BTreeMap::new(),
        }
    }
}

impl OrchestratorConfig {
    /// Load a config file; missing keys take their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::IoError(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        toml::from_str(&content)
            .map_err(|e| Error::ParseError(format!("{}: {}", path.display(), e)))
    }

    pub fn with_cache_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.cache_root = root.into();
        self
    }

    pub fn with_jobs(mut self, jobs: u32) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn with_test_policy(mut self, policy: TestPolicy) -> Self {
        self.test_policy = policy;
        self
    }

    pub fn with_keep_build(mut self, keep: bool) -> Self {
        self.keep_build = keep;
        self
    }

    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }
}

/// `$NBKIT_RECIPE_HOME`, else `~/.nbkit-recipe`
pub fn default_cache_root() -> PathBuf {
    if let Some(home) = std::env::var_os(CACHE_HOME_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(home);
    }
    dirs::home_dir()
        .map(|h| h.join(".nbkit-recipe"))
        .unwrap_or_else(|| PathBuf::from(".nbkit-recipe"))
}
