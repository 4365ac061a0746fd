use std::path::PathBuf;

/// Errors surfaced by the build layer.
///
/// Failed compilations are not errors: they are reported through the
/// registry as the `error` build state.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("a build is already running for {}", .0.display())]
    AlreadyBuilding(PathBuf),

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type BuildResult<T> = Result<T, BuildError>;
