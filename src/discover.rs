//! Finding the sample ids (audio paths) that make up a dataset.

use std::{fs, path::{Path, PathBuf}};

use glob::Pattern;

use crate::error::{Error, Result};

/// Lists every file under `root` ending in `.{extension}`.
///
/// Symlinked directories below `root` are not descended into, so a linked folder or a link
/// loop cannot list the same sample twice. An empty `root` means the working directory.
/// The result is sorted, so two runs over the same tree always produce the same index order.
pub fn list_files(root: impl AsRef<Path>, extension: &str, recursive: bool) -> Result<Vec<PathBuf>> {
    let root = match root.as_ref() {
        r if r.as_os_str().is_empty() => Path::new("."),
        r => r,
    };
    // Escape the root so folders like "take [2]" are not read as character classes.
    let base = Pattern::escape(&root.to_string_lossy());
    let pattern = if recursive {
        format!("{}/**/*.{}", base, extension)
    } else {
        format!("{}/*.{}", base, extension)
    };

    let mut paths = Vec::new();
    for entry in glob::glob(&pattern)? {
        match entry {
            Ok(path) if behind_symlinked_dir(root, &path) => {}
            Ok(path) => {
                if path.is_file() {
                    paths.push(path);
                }
            }
            // Link loops end in "file name too long" somewhere inside the loop.
            Err(e) if behind_symlinked_dir(root, e.path()) => {}
            Err(e) => return Err(e.into()),
        }
    }
    paths.sort();

    log::debug!("Found {} files matching {}", paths.len(), pattern);
    Ok(paths)
}

// True if a directory between `root` (exclusive) and `path` is a symlink.
fn behind_symlinked_dir(root: &Path, path: &Path) -> bool {
    path.ancestors()
        .skip(1)
        .take_while(|dir| *dir != root && !dir.as_os_str().is_empty())
        .any(|dir| fs::symlink_metadata(dir).is_ok_and(|m| m.file_type().is_symlink()))
}

/// Reads a file list with one audio path per line.
///
/// Paths are taken verbatim (relative entries stay relative to the working directory).
/// Blank lines are skipped.
pub fn parse_wav_paths(filelist: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let filelist = filelist.as_ref();
    let text = fs::read_to_string(filelist).map_err(|source| Error::Filelist {
        path: filelist.to_path_buf(),
        source,
    })?;

    Ok(text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(PathBuf::from)
        .collect())
}
