use crate::error::{BuildError, BuildResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// TeX engine latexmk should drive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    #[default]
    Pdflatex,
    Xelatex,
    Lualatex,
}

impl Engine {
    /// The latexmk switch selecting this engine.
    pub fn latexmk_flag(self) -> &'static str {
        match self {
            Engine::Pdflatex => "-pdf",
            Engine::Xelatex => "-pdfxe",
            Engine::Lualatex => "-pdflua",
        }
    }
}

impl FromStr for Engine {
    type Err = String;

    /// Accepts engine and format names as written in `% !TEX program` lines.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdflatex" | "pdftex" | "latex" => Ok(Engine::Pdflatex),
            "xelatex" | "xetex" => Ok(Engine::Xelatex),
            "lualatex" | "luatex" => Ok(Engine::Lualatex),
            other => Err(format!("unknown TeX engine `{other}`")),
        }
    }
}

/// User settings for driving latexmk.
///
/// Stored as JSON with camelCase keys; every field is optional.
///
/// ```json
/// { "engine": "xelatex", "outputDirectory": "build", "extraArgs": ["-shell-escape"] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildConfig {
    /// latexmk executable.
    pub latexmk: String,
    pub engine: Engine,
    /// Output directory, relative to the document's directory.
    pub output_directory: Option<PathBuf>,
    pub synctex: bool,
    pub extra_args: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            latexmk: "latexmk".to_string(),
            engine: Engine::default(),
            output_directory: None,
            synctex: true,
            extra_args: Vec::new(),
        }
    }
}

impl BuildConfig {
    pub fn load(path: &Path) -> BuildResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| BuildError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> BuildResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| BuildError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Directory receiving the log and PDF of `root`.
    pub fn output_dir(&self, root: &Path) -> PathBuf {
        let doc_dir = root.parent().unwrap_or_else(|| Path::new(""));
        match &self.output_directory {
            Some(dir) => doc_dir.join(dir),
            None => doc_dir.to_path_buf(),
        }
    }

    pub fn log_path(&self, root: &Path) -> PathBuf {
        self.artifact_path(root, "log")
    }

    pub fn pdf_path(&self, root: &Path) -> PathBuf {
        self.artifact_path(root, "pdf")
    }

    fn artifact_path(&self, root: &Path, extension: &str) -> PathBuf {
        let stem = root.file_stem().unwrap_or_default();
        let mut path = self.output_dir(root).join(stem);
        path.set_extension(extension);
        path
    }

    /// Command line for compiling `root`, run from the document's directory.
    pub fn latexmk_args(&self, engine: Engine, root: &Path) -> Vec<String> {
        let mut args = vec![
            "-interaction=nonstopmode".to_string(),
            "-file-line-error".to_string(),
            engine.latexmk_flag().to_string(),
        ];
        if self.synctex {
            args.push("-synctex=1".to_string());
        }
        if let Some(dir) = &self.output_directory {
            args.push(format!("-outdir={}", dir.display()));
        }
        args.extend(self.extra_args.iter().cloned());
        let file_name = root.file_name().unwrap_or(root.as_os_str());
        args.push(file_name.to_string_lossy().into_owned());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let config = BuildConfig::default();
        let args = config.latexmk_args(Engine::Pdflatex, Path::new("/doc/main.tex"));
        assert_eq!(
            args,
            vec!["-interaction=nonstopmode", "-file-line-error", "-pdf", "-synctex=1", "main.tex"]
        );
    }

    #[test]
    fn test_args_with_outdir_and_extras() {
        let config = BuildConfig {
            output_directory: Some(PathBuf::from("build")),
            synctex: false,
            extra_args: vec!["-shell-escape".into()],
            ..BuildConfig::default()
        };
        let args = config.latexmk_args(Engine::Lualatex, Path::new("/doc/main.tex"));
        assert_eq!(
            args,
            vec![
                "-interaction=nonstopmode",
                "-file-line-error",
                "-pdflua",
                "-outdir=build",
                "-shell-escape",
                "main.tex"
            ]
        );
        assert_eq!(config.log_path(Path::new("/doc/main.tex")), PathBuf::from("/doc/build/main.log"));
        assert_eq!(config.pdf_path(Path::new("/doc/main.tex")), PathBuf::from("/doc/build/main.pdf"));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: BuildConfig = serde_json::from_str(r#"{ "engine": "xelatex" }"#).unwrap();
        assert_eq!(config.engine, Engine::Xelatex);
        assert_eq!(config.latexmk, "latexmk");
        assert!(config.synctex);
    }

    #[test]
    fn test_config_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("texpilot.json");
        let config = BuildConfig {
            output_directory: Some(PathBuf::from("out")),
            ..BuildConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(BuildConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_config_is_io_error() {
        let err = BuildConfig::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, BuildError::Io { .. }));
    }

    #[test]
    fn test_engine_names() {
        assert_eq!("XeLaTeX".parse::<Engine>(), Ok(Engine::Xelatex));
        assert_eq!("luatex".parse::<Engine>(), Ok(Engine::Lualatex));
        assert!("context".parse::<Engine>().is_err());
    }
}
