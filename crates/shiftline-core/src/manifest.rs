/*!
# Manifest Resolution

Discovers the ordered list of source files for one run, either by walking a
directory or by following a manifest file that lists paths line by line.
*/

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{read_lines, Result, ShiftlineError};

/// A resolved source file
///
/// Identity is the path; the extension it was admitted under is kept so the
/// orchestrator can swap it for the target extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceFile {
    pub path: PathBuf,
    pub extension: String,
}

/// Ordered list of source files taking part in a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    files: Vec<SourceFile>,
}

impl Manifest {
    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SourceFile> {
        self.files.iter()
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a SourceFile;
    type IntoIter = std::slice::Iter<'a, SourceFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

/// Resolve `root` into an ordered manifest of files ending in `extension`.
///
/// A directory root is listed in lexicographic order, recursing depth-first
/// into subdirectories. A file root is read as a manifest: each line names a
/// path, lines naming nothing on disk are dropped, and the survivors keep
/// their line order before being expanded the same way.
pub fn resolve(root: &Path, extension: &str) -> Result<Manifest> {
    let extension = normalize_extension(extension);
    let mut files = Vec::new();

    if root.is_dir() {
        walk_directory(root, &extension, &mut files)?;
    } else if root.is_file() {
        for entry in read_manifest_file(root)? {
            collect(&entry, &extension, &mut files)?;
        }
    } else {
        return Err(ShiftlineError::Config(format!(
            "Bad source root: {}",
            root.display()
        )));
    }

    debug!("Resolved {} source files from {}", files.len(), root.display());
    Ok(Manifest { files })
}

/// Make sure an extension filter starts with a dot (`kt` -> `.kt`).
pub(crate) fn normalize_extension(extension: &str) -> String {
    if extension.is_empty() || extension.starts_with('.') {
        extension.to_string()
    } else {
        format!(".{extension}")
    }
}

fn collect(path: &Path, extension: &str, files: &mut Vec<SourceFile>) -> Result<()> {
    if path.is_file() {
        if matches_extension(path, extension) {
            files.push(SourceFile {
                path: path.to_path_buf(),
                extension: extension.to_string(),
            });
        }
    } else if path.is_dir() {
        walk_directory(path, extension, files)?;
    }
    Ok(())
}

fn walk_directory(dir: &Path, extension: &str, files: &mut Vec<SourceFile>) -> Result<()> {
    let mut children = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| ShiftlineError::io(dir, e))? {
        let entry = entry.map_err(|e| ShiftlineError::io(dir, e))?;
        children.push(entry.path());
    }
    children.sort();

    for child in children {
        collect(&child, extension, files)?;
    }
    Ok(())
}

fn read_manifest_file(path: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for (idx, line) in read_lines(path)?.iter().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let entry = PathBuf::from(line);
        if entry.exists() {
            entries.push(entry);
        } else {
            warn!(
                "{}:{}: listed path does not exist, skipping: {}",
                path.display(),
                idx + 1,
                line
            );
        }
    }
    Ok(entries)
}

fn matches_extension(path: &Path, extension: &str) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().ends_with(extension))
        .unwrap_or(false)
}
