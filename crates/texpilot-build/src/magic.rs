//! `% !TEX` magic comments.

use crate::config::Engine;
use regex::Regex;
use std::path::{Path, PathBuf};

lazy_static::lazy_static! {
    static ref MAGIC_COMMENT: Regex =
        Regex::new(r"(?i)^\s*%\s*!\s*TEX\s+(root|program)\s*=\s*(.*?)\s*$").unwrap();
}

/// Only the head of a file is searched.
const MAGIC_COMMENT_LINES: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MagicComments {
    /// `% !TEX root = <path>`, as written.
    pub root: Option<PathBuf>,
    /// `% !TEX program = <engine>`, as written.
    pub program: Option<String>,
}

impl MagicComments {
    pub fn parse(text: &str) -> Self {
        let mut magic = Self::default();
        for line in text.lines().take(MAGIC_COMMENT_LINES) {
            let Some(caps) = MAGIC_COMMENT.captures(line) else {
                continue;
            };
            let value = caps[2].to_string();
            if value.is_empty() {
                continue;
            }
            // The first occurrence wins.
            if caps[1].eq_ignore_ascii_case("root") {
                if magic.root.is_none() {
                    magic.root = Some(PathBuf::from(value));
                }
            } else if magic.program.is_none() {
                magic.program = Some(value);
            }
        }
        magic
    }

    /// The document to build when `file` was requested.
    pub fn resolve_root(&self, file: &Path) -> PathBuf {
        match &self.root {
            Some(root) => file.parent().unwrap_or_else(|| Path::new("")).join(root),
            None => file.to_path_buf(),
        }
    }

    /// The engine selected by `% !TEX program`, if it names a known one.
    pub fn engine(&self) -> Option<Engine> {
        let program = self.program.as_deref()?;
        match program.parse() {
            Ok(engine) => Some(engine),
            Err(err) => {
                log::warn!("ignoring magic comment: {err}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_and_program() {
        let text = "% !TEX root = ../thesis.tex\n%!TeX program=xelatex\n\\section{Intro}\n";
        let magic = MagicComments::parse(text);
        assert_eq!(magic.root, Some(PathBuf::from("../thesis.tex")));
        assert_eq!(magic.engine(), Some(Engine::Xelatex));
        assert_eq!(
            magic.resolve_root(Path::new("/doc/chapters/one.tex")),
            PathBuf::from("/doc/chapters/../thesis.tex")
        );
    }

    #[test]
    fn test_only_head_of_file_is_searched() {
        let text = "a\nb\nc\nd\ne\n% !TEX root = main.tex\n";
        assert_eq!(MagicComments::parse(text), MagicComments::default());
    }

    #[test]
    fn test_unknown_program_is_ignored() {
        let magic = MagicComments::parse("% !TEX program = context\n");
        assert_eq!(magic.program.as_deref(), Some("context"));
        assert_eq!(magic.engine(), None);
    }

    #[test]
    fn test_without_magic_root_builds_file_itself() {
        let magic = MagicComments::parse("\\documentclass{article}\n");
        assert_eq!(magic.resolve_root(Path::new("/doc/main.tex")), PathBuf::from("/doc/main.tex"));
    }
}
