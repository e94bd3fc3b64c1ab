// src/cmake/mod.rs

//! The native build tool collaborator
//!
//! The orchestrator never runs compilers itself. It drives CMake through
//! the [`BuildTool`] trait: configure, build, test, install. A step that
//! ran to completion returns its [`StepOutput`] whatever the exit status;
//! `Err` means the tool could not be started at all. Interpreting the
//! status is the orchestrator's job.

mod ctest;

pub use ctest::{CtestSummary, failed_tests, parse_summary};

use crate::error::{Error, Result};
use crate::layout::Layout;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Captured result of one tool invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepOutput {
    /// Exit code, `None` when killed by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl StepOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// stdout followed by stderr
    pub fn combined(&self) -> String {
        let mut out = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&self.stderr);
        }
        out
    }
}

/// Arguments of the configure step
#[derive(Debug, Clone)]
pub struct ConfigureRequest<'a> {
    pub layout: &'a Layout,
    /// `-D` cache variables
    pub variables: &'a BTreeMap<String, String>,
    /// `-A` platform for multi-config generators
    pub platform: Option<&'a str>,
}

/// Trait for the CMake/CTest collaborator
pub trait BuildTool: Send + Sync {
    /// Configure the build tree with the generated toolchain
    fn configure(&self, request: &ConfigureRequest<'_>) -> Result<StepOutput>;

    /// Compile the configured tree
    fn build(&self, layout: &Layout, jobs: u32) -> Result<StepOutput>;

    /// Run the registered tests
    fn test(&self, layout: &Layout, jobs: u32) -> Result<StepOutput>;

    /// Install the built tree into `prefix`
    fn install(&self, layout: &Layout, prefix: &Path) -> Result<StepOutput>;
}

/// [`BuildTool`] that shells out to `cmake` and `ctest`
#[derive(Debug, Clone)]
pub struct CMakeCli {
    cmake: PathBuf,
    ctest: PathBuf,
}

impl CMakeCli {
    /// Locate `cmake` and `ctest`
    ///
    /// `cmake` may be given explicitly; `ctest` is then looked up next to
    /// it before falling back to `PATH`.
    pub fn locate(cmake: Option<&Path>) -> Result<Self> {
        let cmake = match cmake {
            Some(path) => which::which(path)
                .map_err(|e| Error::ToolNotFound(format!("{}: {}", path.display(), e)))?,
            None => which::which("cmake")
                .map_err(|e| Error::ToolNotFound(format!("cmake: {}", e)))?,
        };

        let sibling = cmake
            .parent()
            .map(|dir| dir.join(format!("ctest{}", std::env::consts::EXE_SUFFIX)));
        let ctest = match sibling {
            Some(path) if path.is_file() => path,
            _ => which::which("ctest").map_err(|e| Error::ToolNotFound(format!("ctest: {}", e)))?,
        };

        debug!("Using cmake at {} and ctest at {}", cmake.display(), ctest.display());
        Ok(Self { cmake, ctest })
    }

    pub fn cmake(&self) -> &Path {
        &self.cmake
    }

    fn run(&self, program: &Path, args: &[String], cwd: Option<&Path>) -> Result<StepOutput> {
        debug!("Running: {} {}", program.display(), args.join(" "));

        let mut command = Command::new(program);
        command.args(args);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        let output = command.output().map_err(|e| {
            Error::IoError(format!("Failed to run {}: {}", program.display(), e))
        })?;

        Ok(StepOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Command line for the configure step
pub fn configure_args(request: &ConfigureRequest<'_>) -> Vec<String> {
    let layout = request.layout;
    let mut args = vec![
        "-S".to_string(),
        path_arg(&layout.source_folder),
        "-B".to_string(),
        path_arg(&layout.build_folder),
        format!("-DCMAKE_TOOLCHAIN_FILE={}", path_arg(&layout.toolchain_file())),
    ];
    if let Some(platform) = request.platform {
        args.push("-A".to_string());
        args.push(platform.to_string());
    }
    if !layout.multi_config {
        args.push(format!("-DCMAKE_BUILD_TYPE={}", layout.build_type));
    }
    for (key, value) in request.variables {
        args.push(format!("-D{}={}", key, value));
    }
    args
}

/// Command line for the compile step
pub fn build_args(layout: &Layout, jobs: u32) -> Vec<String> {
    let mut args = vec![
        "--build".to_string(),
        path_arg(&layout.build_folder),
        "--parallel".to_string(),
        jobs.max(1).to_string(),
    ];
    if layout.multi_config {
        args.push("--config".to_string());
        args.push(layout.build_type.clone());
    }
    args
}

/// Command line for the test step
pub fn test_args(layout: &Layout, jobs: u32) -> Vec<String> {
    vec![
        "--test-dir".to_string(),
        path_arg(&layout.build_folder),
        "--output-on-failure".to_string(),
        "--no-tests=error".to_string(),
        "-C".to_string(),
        layout.build_type.clone(),
        "--parallel".to_string(),
        jobs.max(1).to_string(),
    ]
}

/// Command line for the install step
pub fn install_args(layout: &Layout, prefix: &Path) -> Vec<String> {
    vec![
        "--install".to_string(),
        path_arg(&layout.build_folder),
        "--prefix".to_string(),
        path_arg(prefix),
        "--config".to_string(),
        layout.build_type.clone(),
    ]
}

impl BuildTool for CMakeCli {
    fn configure(&self, request: &ConfigureRequest<'_>) -> Result<StepOutput> {
        self.run(&self.cmake, &configure_args(request), None)
    }

    fn build(&self, layout: &Layout, jobs: u32) -> Result<StepOutput> {
        self.run(&self.cmake, &build_args(layout, jobs), None)
    }

    fn test(&self, layout: &Layout, jobs: u32) -> Result<StepOutput> {
        self.run(
            &self.ctest,
            &test_args(layout, jobs),
            Some(&layout.build_folder),
        )
    }

    fn install(&self, layout: &Layout, prefix: &Path) -> Result<StepOutput> {
        self.run(&self.cmake, &install_args(layout, prefix), None)
    }
}
