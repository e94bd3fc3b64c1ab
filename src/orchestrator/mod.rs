// src/orchestrator/mod.rs

//! The build orchestrator
//!
//! Runs a recipe through its lifecycle with a fixed phase order:
//! 1. layout: derive the build folders from the settings
//! 2. build_requirements: locate the test-only requirements
//! 3. build: generators, configure, compile, test
//! 4. package: install into a staging folder and move it into place
//! 5. package_info: publish the metadata consumers link against
//!
//! The first failing phase ends the build. Package info is written only
//! after every earlier phase succeeded.
//!
//! Two drivers sit on top of the phases. [`Orchestrator::create`] exports
//! the recipe into the local cache and runs the full lifecycle there;
//! [`Orchestrator::build_local`] builds in place and stops after the tests.

mod config;
mod session;
mod state;

pub use config::{CACHE_HOME_ENV, OrchestratorConfig, TestPolicy, default_cache_root};
pub use session::{
    Built, Installed, LaidOut, Published, RequirementsDeclared, Session, TestSummary,
};
pub use state::{BuildState, Lifecycle, Phase};

use crate::cmake::BuildTool;
use crate::error::{Error, Result};
use crate::export::{ExportedSources, copy_tree, export_sources};
use crate::package_info::PackageInfo;
use crate::recipe::{
    PackageReference, RECIPE_FILE_NAME, Recipe, parse_recipe_file, validate_recipe,
};
use crate::requirements::RequirementResolver;
use crate::settings::BuildSettings;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Folders of one reference in the local cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePaths {
    root: PathBuf,
}

impl CachePaths {
    pub fn new(cache_root: &Path, reference: &PackageReference) -> Self {
        Self {
            root: cache_root.join(&reference.name).join(&reference.version),
        }
    }

    /// Exported recipe and sources
    pub fn export(&self) -> PathBuf {
        self.root.join("export")
    }

    pub fn build(&self, package_id: &str) -> PathBuf {
        self.root.join("build").join(package_id)
    }

    pub fn package(&self, package_id: &str) -> PathBuf {
        self.root.join("package").join(package_id)
    }
}

/// Copy a recipe's exported sources into `<cache>/<name>/<version>/export`
pub fn export_to_cache(cache_root: &Path, recipe_file: &Path, recipe: &Recipe) -> Result<ExportedSources> {
    let dest = CachePaths::new(cache_root, &recipe.reference()).export();
    info!("Exporting {} to {}", recipe.reference(), dest.display());
    let exported = export_sources(recipe_file, &recipe.build.exports_sources, &dest)?;
    fs::copy(recipe_file, dest.join(RECIPE_FILE_NAME))?;
    Ok(exported)
}

/// What a finished build produced
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub reference: PackageReference,
    pub package_id: String,
    /// Final lifecycle state
    pub state: BuildState,
    pub history: Vec<BuildState>,
    pub tests: TestSummary,
    pub recipe_revision: Option<String>,
    pub package_folder: Option<PathBuf>,
    pub package_info: Option<PackageInfo>,
    /// Tool output of every step
    pub log: String,
    pub warnings: Vec<String>,
}

/// A build that stopped at a failing phase
///
/// Carries the tool output gathered up to the failure so callers can
/// still show or save it.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct BuildFailure {
    pub error: Error,
    /// Lifecycle states reached before the failure
    pub history: Vec<BuildState>,
    pub log: String,
    pub warnings: Vec<String>,
}

impl BuildFailure {
    pub fn phase(&self) -> Option<Phase> {
        self.error.phase()
    }

    fn from_session(error: Error, session: &mut Session<'_>, mut warnings: Vec<String>) -> Self {
        let history = session.lifecycle().history().to_vec();
        let (log, session_warnings) = session.take_output();
        warnings.extend(session_warnings);
        Self {
            error,
            history,
            log,
            warnings,
        }
    }
}

impl From<Error> for BuildFailure {
    fn from(error: Error) -> Self {
        Self {
            error,
            history: Vec::new(),
            log: String::new(),
            warnings: Vec::new(),
        }
    }
}

/// Result of a driver run
pub type BuildResult = std::result::Result<BuildOutcome, BuildFailure>;

/// Drives recipes through the lifecycle
pub struct Orchestrator {
    config: OrchestratorConfig,
    tool: Arc<dyn BuildTool>,
    resolver: Arc<dyn RequirementResolver>,
    host: BuildSettings,
}

impl Orchestrator {
    pub fn new(
        config: OrchestratorConfig,
        tool: Arc<dyn BuildTool>,
        resolver: Arc<dyn RequirementResolver>,
    ) -> Self {
        Self {
            config,
            tool,
            resolver,
            host: BuildSettings::detect(),
        }
    }

    /// Override the detected host settings
    pub fn with_host(mut self, host: BuildSettings) -> Self {
        self.host = host;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn cache_paths(&self, reference: &PackageReference) -> CachePaths {
        CachePaths::new(&self.config.cache_root, reference)
    }

    /// Start a build of `recipe` from `source_folder`
    pub fn session<'a>(
        &'a self,
        recipe: &'a Recipe,
        settings: &BuildSettings,
        source_folder: &Path,
        package_folder: &Path,
    ) -> Session<'a> {
        Session::new(self, recipe, settings, source_folder, package_folder)
    }

    /// Copy a recipe's exported sources into the cache
    pub fn export(&self, recipe_file: &Path, recipe: &Recipe) -> Result<ExportedSources> {
        export_to_cache(&self.config.cache_root, recipe_file, recipe)
    }

    /// Export, build, test, package and publish in the local cache
    ///
    /// A package previously created under the same id is removed before
    /// the build starts, so a failed rebuild never leaves the old package
    /// info resolvable next to the new sources.
    pub fn create(&self, recipe_file: &Path, settings: &BuildSettings) -> BuildResult {
        let recipe = parse_recipe_file(recipe_file)?;
        let mut warnings = validate_recipe(&recipe)?;

        let exported = self.export(recipe_file, &recipe)?;
        warnings.extend(exported.warnings.iter().cloned());

        let paths = self.cache_paths(&recipe.reference());
        let package_id = crate::package_info::package_id(
            &recipe.reference(),
            &settings.restricted_to(&recipe.build.settings),
        );
        let build_folder = paths.build(&package_id);
        let package_folder = paths.package(&package_id);

        if package_folder.exists() {
            info!("Removing stale package {}", package_folder.display());
            fs::remove_dir_all(&package_folder).map_err(Error::from)?;
        }
        if build_folder.exists() {
            fs::remove_dir_all(&build_folder).map_err(Error::from)?;
        }
        fs::create_dir_all(&build_folder).map_err(Error::from)?;
        copy_tree(&exported.folder, &build_folder)?;

        info!(
            "Creating {} with package id {} ({})",
            recipe.reference(),
            package_id,
            settings.restricted_to(&recipe.build.settings)
        );

        let mut session = self.session(&recipe, settings, &build_folder, &package_folder);
        let (built, published) = match run_to_published(&mut session, &exported.revision) {
            Ok(done) => done,
            Err(error) => return Err(BuildFailure::from_session(error, &mut session, warnings)),
        };

        if !self.config.keep_build
            && let Err(e) = fs::remove_dir_all(&build_folder)
        {
            warn!("Failed to remove build folder {}: {}", build_folder.display(), e);
        }

        let state = session.state();
        let history = session.lifecycle().history().to_vec();
        let (log, session_warnings) = session.take_output();
        warnings.extend(session_warnings);

        info!(
            "Created {} in {}",
            recipe.reference(),
            published.package_folder.display()
        );

        Ok(BuildOutcome {
            reference: recipe.reference(),
            package_id,
            state,
            history,
            tests: built.tests().clone(),
            recipe_revision: Some(exported.revision),
            package_folder: Some(published.package_folder),
            package_info: Some(published.info),
            log,
            warnings,
        })
    }

    /// Build and test in place, without packaging
    pub fn build_local(&self, recipe_file: &Path, settings: &BuildSettings) -> BuildResult {
        let recipe = parse_recipe_file(recipe_file)?;
        let mut warnings = validate_recipe(&recipe)?;

        let source_folder = recipe_file.parent().unwrap_or(Path::new("."));
        let package_folder = source_folder.join("package");

        let mut session = self.session(&recipe, settings, source_folder, &package_folder);
        let built = match run_to_tested(&mut session) {
            Ok(built) => built,
            Err(error) => return Err(BuildFailure::from_session(error, &mut session, warnings)),
        };

        let package_id = session.package_id();
        let state = session.state();
        let history = session.lifecycle().history().to_vec();
        let (log, session_warnings) = session.take_output();
        warnings.extend(session_warnings);

        Ok(BuildOutcome {
            reference: recipe.reference(),
            package_id,
            state,
            history,
            tests: built.tests().clone(),
            recipe_revision: None,
            package_folder: None,
            package_info: None,
            log,
            warnings,
        })
    }
}

fn run_to_tested(session: &mut Session<'_>) -> Result<Built> {
    let laid_out = session.layout()?;
    let requirements = session.build_requirements(&laid_out)?;
    session.build(&laid_out, &requirements)
}

fn run_to_published(session: &mut Session<'_>, recipe_revision: &str) -> Result<(Built, Published)> {
    let laid_out = session.layout()?;
    let requirements = session.build_requirements(&laid_out)?;
    let built = session.build(&laid_out, &requirements)?;
    let installed = session.package(&laid_out, &built)?;
    let published = session.publish(&installed, recipe_revision)?;
    Ok((built, published))
}
