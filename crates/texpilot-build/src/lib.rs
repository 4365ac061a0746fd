//! Build orchestration for TexPilot.
//!
//! [`BuildRegistry`] tracks the lifecycle of every document being compiled
//! and fans out events to subscribers. [`Builder`] runs a [`BuildEngine`]
//! (latexmk by default), feeds the resulting log to the interpreter from
//! `texpilot-log` and publishes the diagnostics through the registry.
//!
//! ```no_run
//! use std::path::Path;
//! use texpilot_build::{BuildConfig, Builder};
//!
//! # async fn run() -> Result<(), texpilot_build::BuildError> {
//! let builder = Builder::new(BuildConfig::default());
//! let updates = builder.registry().lock().unwrap().on_status_changed();
//! let report = builder.build(Path::new("/doc/main.tex")).await?;
//! for event in updates.try_iter() {
//!     println!("{:?} {:?}", event.status, event.file);
//! }
//! println!("{} diagnostics", report.diagnostics.len());
//! # Ok(())
//! # }
//! ```

pub mod artifacts;
pub mod builder;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod magic;
pub mod registry;

pub use artifacts::OutputArtifact;
pub use builder::{BuildReport, Builder};
pub use config::{BuildConfig, Engine};
pub use engine::{BuildEngine, BuildRequest, EngineOutput, ExitKind, LatexmkEngine};
pub use error::{BuildError, BuildResult};
pub use events::{
    BuildFailed, BuildFinished, BuildStarted, DiagnosticsUpdated, EventChannel, StatusChanged,
};
pub use magic::MagicComments;
pub use registry::{BuildRecord, BuildRegistry, BuildState, FileStatus, RegistryStatus, StatusReport};
