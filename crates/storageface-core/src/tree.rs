//! Text trees of a local folder and of a repository's file list.
//!
//! Both render the same way: one entry per line, four spaces per level,
//! directories (suffixed with `/`) before files, each group sorted by name.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};

#[derive(Debug, Default)]
struct Node {
    dirs: BTreeMap<String, Node>,
    files: Vec<String>,
}

impl Node {
    fn insert(&mut self, parts: &[&str]) {
        match parts {
            [] => {}
            [file] => {
                if !self.files.iter().any(|f| f.as_str() == *file) {
                    self.files.push((*file).to_string());
                }
            }
            [dir, rest @ ..] => self.dirs.entry((*dir).to_string()).or_default().insert(rest),
        }
    }

    fn render(&mut self, depth: usize, out: &mut String) {
        self.files.sort();
        let indent = " ".repeat(depth * 4);
        for (name, child) in self.dirs.iter_mut() {
            let _ = writeln!(out, "{indent}{name}/");
            child.render(depth + 1, out);
        }
        for name in &self.files {
            let _ = writeln!(out, "{indent}{name}");
        }
    }
}

/// Renders `/`-separated repository paths as a tree.
pub fn remote_tree<S: AsRef<str>>(paths: &[S]) -> String {
    let mut root = Node::default();
    for p in paths {
        let parts: Vec<&str> = p.as_ref().split('/').filter(|s| !s.is_empty()).collect();
        root.insert(&parts);
    }
    let mut out = String::new();
    root.render(0, &mut out);
    out
}

/// Renders a local folder (recursively, symlinks not followed). The first
/// line is the folder's own name.
pub fn local_tree(folder: &Path) -> Result<String> {
    if !folder.is_dir() {
        anyhow::bail!("'{}' is not a directory", folder.display());
    }
    let mut root = Node::default();
    for entry in walkdir::WalkDir::new(folder).min_depth(1).follow_links(false) {
        let entry = entry.with_context(|| format!("walk {}", folder.display()))?;
        let rel = entry
            .path()
            .strip_prefix(folder)
            .with_context(|| format!("{} outside {}", entry.path().display(), folder.display()))?;
        let parts: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        let parts: Vec<&str> = parts.iter().map(String::as_str).collect();
        if entry.file_type().is_dir() {
            let mut node = &mut root;
            for p in parts {
                node = node.dirs.entry(p.to_string()).or_default();
            }
        } else {
            root.insert(&parts);
        }
    }
    let name = folder
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| folder.display().to_string());
    let mut out = format!("{}/\n", name.trim_end_matches('/'));
    root.render(1, &mut out);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn remote_tree_nests_and_sorts() {
        let paths = ["z.txt", "data/b.csv", "data/a.csv", "README.md", "data/raw/x.bin"];
        let expected = "\
data/
    raw/
        x.bin
    a.csv
    b.csv
README.md
z.txt
";
        assert_eq!(remote_tree(&paths), expected);
    }

    #[test]
    fn remote_tree_of_nothing_is_empty() {
        assert_eq!(remote_tree::<&str>(&[]), "");
    }

    #[test]
    fn local_tree_includes_empty_directories() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("photos");
        fs::create_dir_all(root.join("2024/june")).unwrap();
        fs::create_dir_all(root.join("empty")).unwrap();
        fs::write(root.join("2024/june/a.jpg"), b"x").unwrap();
        fs::write(root.join("index.txt"), b"x").unwrap();

        let expected = "\
photos/
    2024/
        june/
            a.jpg
    empty/
    index.txt
";
        assert_eq!(local_tree(&root).unwrap(), expected);
    }

    #[test]
    fn local_tree_rejects_files() {
        let f = tempfile::NamedTempFile::new().unwrap();
        assert!(local_tree(f.path()).is_err());
    }
}
