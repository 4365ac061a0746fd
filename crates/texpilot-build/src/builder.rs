use crate::artifacts::OutputArtifact;
use crate::config::BuildConfig;
use crate::engine::{BuildEngine, BuildRequest, ExitKind, LatexmkEngine};
use crate::error::{BuildError, BuildResult};
use crate::magic::MagicComments;
use crate::registry::{BuildRegistry, BuildState};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use texpilot_log::ir::{Location, Position};
use texpilot_log::{Diagnostic, LogInterpreter, Severity};

/// Outcome of one [`Builder::build`] call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildReport {
    /// The root document that was compiled.
    pub file: PathBuf,
    /// `success`, `error`, or `idle` when the engine was interrupted.
    pub status: BuildState,
    pub diagnostics: Vec<Diagnostic>,
    /// Present whenever the engine ran to completion.
    pub output: Option<OutputArtifact>,
    pub elapsed: Duration,
    pub error: Option<String>,
}

impl BuildReport {
    pub fn succeeded(&self) -> bool {
        self.status == BuildState::Success
    }
}

/// Drives an engine through the registry and turns its log into diagnostics.
pub struct Builder {
    registry: Arc<Mutex<BuildRegistry>>,
    engine: Arc<dyn BuildEngine>,
    config: BuildConfig,
}

impl Builder {
    pub fn new(config: BuildConfig) -> Self {
        Self::with_engine(config, Arc::new(LatexmkEngine))
    }

    pub fn with_engine(config: BuildConfig, engine: Arc<dyn BuildEngine>) -> Self {
        Self {
            registry: Arc::new(Mutex::new(BuildRegistry::new())),
            engine,
            config,
        }
    }

    /// Shared handle to the registry, for status queries and subscriptions.
    pub fn registry(&self) -> Arc<Mutex<BuildRegistry>> {
        Arc::clone(&self.registry)
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Compiles `file`, or the root its magic comments point to.
    ///
    /// Only a build already running for the same root is an error; failed
    /// compilations come back as a report with status `error`.
    pub async fn build(&self, file: &Path) -> BuildResult<BuildReport> {
        let magic = match tokio::fs::read_to_string(file).await {
            Ok(text) => MagicComments::parse(&text),
            Err(err) => {
                log::debug!("no magic comments read from {}: {}", file.display(), err);
                MagicComments::default()
            }
        };
        let root = magic.resolve_root(file);
        let engine = magic.engine().unwrap_or(self.config.engine);
        if root != file {
            log::info!("building {} for {}", root.display(), file.display());
        }

        {
            let mut registry = self.lock_registry();
            if registry.is_building(&root) {
                return Err(BuildError::AlreadyBuilding(root));
            }
            registry.start_build(&root);
        }

        let request = BuildRequest {
            root: root.clone(),
            engine,
            config: self.config.clone(),
        };
        let started = Instant::now();
        let result = self.engine.run(&request).await;
        let elapsed = started.elapsed();

        let output = match result {
            Ok(output) => output,
            Err(err) => {
                let error = format!("{err:#}");
                let mut registry = self.lock_registry();
                registry.fail_build(&root, error.clone(), "");
                registry.update_diagnostics(&root, Vec::new());
                return Ok(BuildReport {
                    file: root,
                    status: BuildState::Error,
                    diagnostics: Vec::new(),
                    output: None,
                    elapsed,
                    error: Some(error),
                });
            }
        };

        let code = match output.exit {
            ExitKind::Code(code) => code,
            ExitKind::Interrupted => {
                log::info!("{} interrupted: {}", self.engine.name(), root.display());
                self.lock_registry().reset(Some(root.as_path()));
                return Ok(BuildReport {
                    file: root,
                    status: BuildState::Idle,
                    diagnostics: Vec::new(),
                    output: None,
                    elapsed,
                    error: None,
                });
            }
        };

        let log_path = request.log_path();
        let log = match tokio::fs::read_to_string(&log_path).await {
            Ok(log) => log,
            Err(err) => {
                let error = format!("Could not read {}: {}", log_path.display(), err);
                log::warn!("{error}");
                let mut registry = self.lock_registry();
                registry.fail_build(&root, error.clone(), output.stdout);
                registry.update_diagnostics(&root, Vec::new());
                return Ok(BuildReport {
                    file: root,
                    status: BuildState::Error,
                    diagnostics: Vec::new(),
                    output: None,
                    elapsed,
                    error: Some(error),
                });
            }
        };
        let report = LogInterpreter::new().parse_report(&log, &root);
        let mut diagnostics = report.diagnostics;
        let artifact =
            OutputArtifact::inspect(report.output_file.unwrap_or_else(|| request.pdf_path())).await;

        let mut registry = self.lock_registry();
        let (status, error) = if code == 0 {
            registry.finish_build(&root, output.stdout, Some(elapsed));
            (BuildState::Success, None)
        } else {
            let error = format!("Compilation failed with exit code {code}");
            if !texpilot_log::has_errors(&diagnostics) {
                diagnostics.push(critical_error(&root, &error));
            }
            registry.fail_build(&root, error.clone(), output.stdout);
            (BuildState::Error, Some(error))
        };
        registry.update_diagnostics(&root, diagnostics.clone());

        Ok(BuildReport {
            file: root,
            status,
            diagnostics,
            output: Some(artifact),
            elapsed,
            error,
        })
    }

    fn lock_registry(&self) -> MutexGuard<'_, BuildRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Stand-in diagnostic for a failed run whose log names no error.
fn critical_error(root: &Path, error: &str) -> Diagnostic {
    Diagnostic {
        severity: Severity::Error,
        excerpt: format!("Critical error: {error}"),
        description: None,
        location: Location::new(root.to_path_buf(), Position::rows(0, 0)),
        log_range: None,
    }
}
