use crate::config::{BuildConfig, Engine};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// One compilation to run.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// The root document.
    pub root: PathBuf,
    pub engine: Engine,
    pub config: BuildConfig,
}

impl BuildRequest {
    pub fn working_dir(&self) -> &Path {
        self.root.parent().unwrap_or_else(|| Path::new("."))
    }

    pub fn log_path(&self) -> PathBuf {
        self.config.log_path(&self.root)
    }

    pub fn pdf_path(&self) -> PathBuf {
        self.config.pdf_path(&self.root)
    }
}

/// How the engine process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    Code(i32),
    /// Killed by a signal; the outcome of the build is unknown.
    Interrupted,
}

#[derive(Debug, Clone)]
pub struct EngineOutput {
    pub exit: ExitKind,
    pub stdout: String,
    pub stderr: String,
}

#[async_trait]
pub trait BuildEngine: Send + Sync {
    /// Uniquely identifies the engine (e.g. "latexmk").
    fn name(&self) -> &str;

    /// Runs the compilation. `Err` means the process could not be run at all.
    async fn run(&self, request: &BuildRequest) -> Result<EngineOutput>;
}

/// Runs `latexmk` in the document's directory.
pub struct LatexmkEngine;

#[async_trait]
impl BuildEngine for LatexmkEngine {
    fn name(&self) -> &str {
        "latexmk"
    }

    async fn run(&self, request: &BuildRequest) -> Result<EngineOutput> {
        let working_dir = request.working_dir();
        let out_dir = request.config.output_dir(&request.root);
        tokio::fs::create_dir_all(&out_dir)
            .await
            .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

        let args = request.config.latexmk_args(request.engine, &request.root);
        log::debug!("running {} {}", request.config.latexmk, args.join(" "));

        let output = Command::new(&request.config.latexmk)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .current_dir(working_dir)
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn {}", request.config.latexmk))?
            .wait_with_output()
            .await
            .with_context(|| format!("Failed to wait for {}", request.config.latexmk))?;

        let exit = match output.status.code() {
            Some(code) => ExitKind::Code(code),
            None => ExitKind::Interrupted,
        };
        Ok(EngineOutput {
            exit,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let request = BuildRequest {
            root: dir.path().join("main.tex"),
            engine: Engine::Pdflatex,
            config: BuildConfig {
                latexmk: "texpilot-no-such-latexmk".to_string(),
                ..BuildConfig::default()
            },
        };
        let err = LatexmkEngine.run(&request).await.unwrap_err();
        assert!(err.to_string().contains("Failed to spawn"));
    }

    #[test]
    fn test_request_paths() {
        let request = BuildRequest {
            root: PathBuf::from("/doc/paper.tex"),
            engine: Engine::Xelatex,
            config: BuildConfig::default(),
        };
        assert_eq!(request.working_dir(), Path::new("/doc"));
        assert_eq!(request.log_path(), PathBuf::from("/doc/paper.log"));
        assert_eq!(request.pdf_path(), PathBuf::from("/doc/paper.pdf"));
    }
}
