//! Path resolution: absolute paths, `PATH` search and the installation root

use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::LaunchError;
use crate::platform::Platform;

/// Symlinks followed before the resolver gives up and returns what it has
const MAX_SYMLINK_DEPTH: usize = 20;

/// Restores the process working directory once resolution is done.
///
/// The original directory is recorded lazily on the first switch, so
/// resolving a bare file name never touches the working directory.
struct WorkingDirectory {
    original: Option<PathBuf>,
}

impl WorkingDirectory {
    fn new() -> Self {
        Self { original: None }
    }

    fn enter(&mut self, dir: &Path) -> Result<(), LaunchError> {
        if self.original.is_none() {
            self.original = Some(std::env::current_dir().map_err(LaunchError::WorkingDirectory)?);
        }
        std::env::set_current_dir(dir).map_err(|source| LaunchError::ChangeDirectory {
            path: dir.to_path_buf(),
            source,
        })
    }

    fn restore(mut self) -> Result<(), LaunchError> {
        match self.original.take() {
            Some(original) => {
                std::env::set_current_dir(&original).map_err(|source| {
                    LaunchError::ChangeDirectory {
                        path: original,
                        source,
                    }
                })
            }
            None => Ok(()),
        }
    }
}

impl Drop for WorkingDirectory {
    fn drop(&mut self) {
        if let Some(original) = self.original.take() {
            if let Err(e) = std::env::set_current_dir(&original) {
                log::error!("Could not change back to {}: {}", original.display(), e);
            }
        }
    }
}

/// Make `path` absolute, resolving symlinks in its directory part and
/// following a trailing symlink up to a bounded depth.
pub fn resolve_absolute(platform: &dyn Platform, path: &Path) -> Result<PathBuf, LaunchError> {
    let limit = platform.max_path_len();
    if path.as_os_str().len() >= limit {
        return Err(LaunchError::PathTooLong(path.display().to_string()));
    }

    let mut cwd = WorkingDirectory::new();
    let mut current = path.to_path_buf();
    let mut resolved = PathBuf::new();

    for _ in 0..MAX_SYMLINK_DEPTH {
        let (dir, last) = if current.is_dir() {
            (current.clone(), None)
        } else {
            split_last(&current)
        };

        if !dir.as_os_str().is_empty() {
            cwd.enter(&dir)?;
        }
        resolved = std::env::current_dir().map_err(LaunchError::WorkingDirectory)?;

        if let Some(last) = last {
            if resolved.as_os_str().len() + last.len() + 2 > limit {
                return Err(LaunchError::PathTooLong(format!(
                    "{}/{}",
                    resolved.display(),
                    last.to_string_lossy()
                )));
            }
            resolved.push(last);
        }

        match fs::symlink_metadata(&resolved) {
            Ok(meta) if meta.file_type().is_symlink() => {
                // Relative targets resolve against the link's directory,
                // which is the current working directory at this point
                current = fs::read_link(&resolved).map_err(|source| LaunchError::Symlink {
                    path: resolved.clone(),
                    source,
                })?;
            }
            _ => break,
        }
    }

    cwd.restore()?;
    Ok(resolved)
}

fn split_last(path: &Path) -> (PathBuf, Option<OsString>) {
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => (parent.to_path_buf(), Some(name.to_os_string())),
        (None, Some(name)) => (PathBuf::new(), Some(name.to_os_string())),
        _ => (path.to_path_buf(), None),
    }
}

/// Search a `PATH`-style list for an executable named `name`.
pub fn search_path_list(
    platform: &dyn Platform,
    name: &str,
    path_list: &OsStr,
) -> Result<PathBuf, LaunchError> {
    let suffix = platform.executable_suffix();
    let name = if !suffix.is_empty() && !name.to_ascii_lowercase().ends_with(suffix) {
        format!("{name}{suffix}")
    } else {
        name.to_string()
    };

    // Platforms with executable suffixes also run programs from the
    // current directory without qualification
    if !suffix.is_empty() {
        let in_cwd = resolve_absolute(platform, Path::new(&name))?;
        if in_cwd.is_file() {
            return Ok(in_cwd);
        }
    }

    let list = path_list.to_string_lossy();
    for entry in list.split(platform.path_list_separator()) {
        if entry.is_empty() || !Path::new(entry).is_absolute() {
            continue;
        }
        let candidate = Path::new(entry).join(&name);
        let executable = fs::metadata(&candidate)
            .map(|meta| meta.is_file() && platform.is_executable(&meta))
            .unwrap_or(false);
        if executable {
            return resolve_absolute(platform, &candidate);
        }
    }

    Err(LaunchError::NotInPath(name))
}

/// Whether `list` contains `path` as one of its entries
pub fn path_list_contains(list: &str, path: &str, separator: char) -> bool {
    list.split(separator).any(|entry| entry == path)
}

/// Whether `path` exists and was modified after `than` (or `than` is missing)
pub fn is_newer(path: &Path, than: &Path) -> bool {
    let Ok(modified) = fs::metadata(path).and_then(|m| m.modified()) else {
        return false;
    };
    match fs::metadata(than).and_then(|m| m.modified()) {
        Ok(other) => modified > other,
        Err(_) => true,
    }
}

/// Where the launcher is installed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installation {
    /// Installation root
    pub root: PathBuf,
    /// Absolute path of the launcher executable
    pub executable: PathBuf,
    /// Whether the launcher runs from the `precompiled` directory
    pub precompiled: bool,
}

impl Installation {
    /// Path of `relative` below the installation root
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }
}

/// Compute the installation root from the launcher's `argv[0]`
pub fn locate_installation_root(
    platform: &dyn Platform,
    argv0: &str,
) -> Result<Installation, LaunchError> {
    let executable = if argv0.chars().any(|c| platform.is_separator(c)) {
        resolve_absolute(platform, Path::new(argv0))?
    } else {
        platform.search_path(argv0)?
    };

    let dir = executable
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .ok_or_else(|| LaunchError::NoParentDirectory(executable.display().to_string()))?;

    let mut precompiled = false;
    let root = match dir.file_name() {
        Some(name) if platform.is_precompiled_dir(name) => {
            precompiled = true;
            dir.parent().unwrap_or(dir)
        }
        _ => match platform.bundle_suffix() {
            Some((suffix, strip)) if dir.ends_with(suffix) => {
                dir.ancestors().nth(strip).unwrap_or(dir)
            }
            _ => dir,
        },
    };
    let root = platform.resolve_short_path(root);
    log::debug!("Installation root: {}", root.display());

    Ok(Installation {
        root,
        executable,
        precompiled,
    })
}
