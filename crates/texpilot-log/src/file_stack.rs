use regex::Regex;
use std::path::{Component, Path, PathBuf};

lazy_static::lazy_static! {
    /// `("quoted path"`, `(bare/path.tex` or a lone `)`.
    static ref PAREN_TOKEN: Regex = Regex::new(r#"\("[^"]*"?|\([^()\s"]*|\)"#).unwrap();
}

/// The engine's view of which source file is currently open.
///
/// Matches the `(file.tex ... )` tracing TeX writes while it reads nested
/// inputs. The root document is always at the bottom and is never popped.
#[derive(Debug, Clone)]
pub struct FileStack {
    base_dir: PathBuf,
    files: Vec<PathBuf>,
}

impl FileStack {
    pub fn new(root: &Path) -> Self {
        let base_dir = root.parent().map(Path::to_path_buf).unwrap_or_default();
        Self {
            base_dir,
            files: vec![normalize(root)],
        }
    }

    /// The file on top of the stack.
    pub fn current(&self) -> &Path {
        // `files` is never empty; see `pop`.
        self.files.last().map(PathBuf::as_path).unwrap_or(Path::new(""))
    }

    pub fn root(&self) -> &Path {
        &self.files[0]
    }

    pub fn depth(&self) -> usize {
        self.files.len()
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn push(&mut self, path: PathBuf) {
        log::trace!("file stack push: {}", path.display());
        self.files.push(path);
    }

    /// Pops the top file unless only the root is left.
    pub fn pop(&mut self) -> Option<PathBuf> {
        if self.files.len() <= 1 {
            log::trace!("file stack pop ignored at root");
            return None;
        }
        let popped = self.files.pop();
        if let Some(path) = &popped {
            log::trace!("file stack pop: {}", path.display());
        }
        popped
    }

    /// Resolves a path printed in the log against the document directory.
    pub fn resolve(&self, raw: &str) -> PathBuf {
        resolve_against(&self.base_dir, raw)
    }

    /// Applies every open/close token found anywhere in `line`.
    pub fn scan_line(&mut self, line: &str) {
        for token in PAREN_TOKEN.find_iter(line) {
            let token = token.as_str();
            if token == ")" {
                self.pop();
                continue;
            }
            if let Some(path) = file_token(token) {
                let resolved = self.resolve(path);
                self.push(resolved);
            }
        }
    }
}

/// Extracts the path from an open-paren token, if it looks like one.
fn file_token(token: &str) -> Option<&str> {
    let stripped = token
        .trim_start_matches(['(', '"', ' '])
        .trim_end_matches([' ', '"']);
    if !stripped.contains('.') || stripped.chars().all(|c| c == '.') {
        return None;
    }
    Some(stripped)
}

pub(crate) fn resolve_against(base_dir: &Path, raw: &str) -> PathBuf {
    let raw = Path::new(raw.trim());
    if raw.is_absolute() {
        normalize(raw)
    } else {
        normalize(&base_dir.join(raw))
    }
}

/// Lexically removes `.` and `..` components without touching the file system.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}
