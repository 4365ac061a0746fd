use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// The document produced by a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputArtifact {
    pub path: PathBuf,
    /// SHA-256 of the file content, `None` when the file could not be read.
    ///
    /// Viewers compare it with the previous build to decide whether to reload.
    pub fingerprint: Option<String>,
}

impl OutputArtifact {
    pub async fn inspect(path: PathBuf) -> Self {
        let fingerprint = match tokio::fs::read(&path).await {
            Ok(bytes) => Some(fingerprint(&bytes)),
            Err(err) => {
                log::debug!("no output artifact at {}: {}", path.display(), err);
                None
            }
        };
        Self { path, fingerprint }
    }

    pub fn exists(&self) -> bool {
        self.fingerprint.is_some()
    }
}

pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
