//! Source-level checks on the crate's layering.
//!
//! A [`Layer`] is every non-test line under one `src/` directory. Rules are
//! expressed as the crate paths a layer may not name.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

const CRATE_DIR: &str = env!("CARGO_MANIFEST_DIR");

/// One offending line.
#[derive(Debug)]
pub struct Violation {
    pub file: String,
    pub line: usize,
    pub text: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.file, self.line, self.text.trim())
    }
}

struct SourceFile {
    path: String,
    production: Vec<String>,
}

/// The production code of every `.rs` file below a directory.
pub struct Layer {
    files: Vec<SourceFile>,
}

impl Layer {
    pub fn at(dir: &str) -> Self {
        let mut paths = Vec::new();
        walk(&Path::new(CRATE_DIR).join(dir), &mut paths);
        paths.sort();

        let files = paths
            .into_iter()
            .map(|path| SourceFile {
                path: crate_relative(&path),
                production: production_lines(&read(&path)),
            })
            .collect();
        Self { files }
    }

    /// Drop the files below `dir` (crate-relative, e.g. `src/adapter/outbound/kafka`).
    pub fn without(mut self, dir: &str) -> Self {
        let prefix = format!("{}/", dir.trim_end_matches('/'));
        self.files.retain(|file| !file.path.starts_with(&prefix));
        self
    }

    /// Every line naming one of `forbidden`.
    pub fn naming(&self, forbidden: &[&str]) -> Vec<Violation> {
        self.files
            .iter()
            .flat_map(|file| {
                file.production
                    .iter()
                    .enumerate()
                    .filter(move |(_, text)| forbidden.iter().any(|needle| text.contains(needle)))
                    .map(move |(index, text)| Violation {
                        file: file.path.clone(),
                        line: index + 1,
                        text: text.clone(),
                    })
            })
            .collect()
    }
}

/// Panic listing `violations` unless there are none.
pub fn assert_clean(rule: &str, violations: &[Violation]) {
    if violations.is_empty() {
        return;
    }
    let listing: Vec<String> = violations.iter().map(ToString::to_string).collect();
    panic!("{rule}:\n  {}", listing.join("\n  "));
}

/// Whether the item `declaration` in `file` sits directly under `attribute`.
pub fn declared_under(file: &str, declaration: &str, attribute: &str) -> bool {
    let source = read(&Path::new(CRATE_DIR).join(file));
    let lines: Vec<&str> = source.lines().map(str::trim).collect();
    lines
        .iter()
        .position(|line| line.ends_with(declaration))
        .and_then(|index| lines[..index].iter().rev().find(|line| !line.is_empty()))
        .is_some_and(|previous| *previous == attribute)
}

/// Lines before the first `#[cfg(test)]`; test modules close every file.
fn production_lines(source: &str) -> Vec<String> {
    source
        .lines()
        .take_while(|line| !line.trim_start().starts_with("#[cfg(test)]"))
        .map(str::to_string)
        .collect()
}

fn walk(dir: &Path, out: &mut Vec<PathBuf>) {
    let entries =
        fs::read_dir(dir).unwrap_or_else(|e| panic!("cannot list {}: {e}", dir.display()));
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk(&path, out);
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            out.push(path);
        }
    }
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
}

fn crate_relative(path: &Path) -> String {
    path.strip_prefix(CRATE_DIR)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}
