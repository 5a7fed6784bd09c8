//! Merging staged updates into the live installation
//!
//! The updater places new files below `update/`, mirroring the layout of
//! the installation. A zero-length staged file marks the live file for
//! deletion.

use std::fs;
use std::io;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::LaunchError;
use crate::paths::Installation;
use crate::platform::Platform;

/// Staging directory below the installation root
pub const UPDATE_DIR: &str = "update";

/// Merge everything staged below `update/`
pub fn merge_all(install: &Installation, platform: &dyn Platform) -> Result<(), LaunchError> {
    merge_staged(install, platform, Path::new(""))
}

/// Mirror `update/<relative>` onto `<relative>`, depth-first, removing the
/// staging directories it empties. Nothing happens when nothing is staged.
pub fn merge_staged(
    install: &Installation,
    platform: &dyn Platform,
    relative: &Path,
) -> Result<(), LaunchError> {
    let staging = install.root.join(UPDATE_DIR).join(relative);
    if !staging.is_dir() {
        return Ok(());
    }
    let live = install.root.join(relative);
    create_dir(&live)?;

    let walker = WalkDir::new(&staging).min_depth(1).contents_first(true);
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping staged entry: {e}");
                continue;
            }
        };
        let Ok(suffix) = entry.path().strip_prefix(&staging) else {
            continue;
        };
        let target = live.join(suffix);

        if entry.file_type().is_dir() {
            create_dir(&target)?;
            // Fails while anything is left inside
            let _ = fs::remove_dir(entry.path());
            continue;
        }
        if let Some(parent) = target.parent() {
            create_dir(parent)?;
        }

        let empty = entry.metadata().map(|m| m.len() == 0).unwrap_or(false);
        if empty {
            remove_marked(entry.path(), &target);
        } else {
            replace(platform, entry.path(), &target)?;
        }
    }

    let _ = fs::remove_dir(&staging);
    Ok(())
}

fn create_dir(path: &Path) -> Result<(), LaunchError> {
    fs::create_dir_all(path).map_err(|source| LaunchError::CreateDirectory {
        path: path.to_path_buf(),
        source,
    })
}

/// Delete a zero-length marker and the live file it names
fn remove_marked(marker: &Path, target: &Path) {
    if let Err(e) = fs::remove_file(marker) {
        log::warn!("Could not remove {}: {}", marker.display(), e);
    }
    match fs::remove_file(target) {
        Ok(()) => log::debug!("Removed {}", target.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::info!("{} was already removed", target.display());
        }
        Err(e) => log::warn!("Could not remove {}: {}", target.display(), e),
    }
}

fn replace(platform: &dyn Platform, source: &Path, target: &Path) -> Result<(), LaunchError> {
    if platform.remove_before_rename() && target.exists() {
        fs::remove_file(target).map_err(|source| LaunchError::RemoveOldVersion {
            path: target.to_path_buf(),
            source,
        })?;
    }
    fs::rename(source, target).map_err(|e| LaunchError::Move {
        from: source.to_path_buf(),
        to: target.to_path_buf(),
        source: e,
    })?;
    log::debug!("Updated {}", target.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::testing::FakePlatform;

    fn install(root: &Path) -> Installation {
        Installation {
            root: root.to_path_buf(),
            executable: root.join("fiji"),
            precompiled: false,
        }
    }

    fn write(path: &Path, content: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_nothing_staged() {
        let dir = tempfile::tempdir().unwrap();
        merge_all(&install(dir.path()), &FakePlatform::default()).unwrap();
        assert!(!dir.path().join(UPDATE_DIR).exists());
    }

    #[test]
    fn test_staged_files_replace_live_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(&root.join("jars/ij.jar"), b"old");
        write(&root.join("update/jars/ij.jar"), b"new");
        write(&root.join("update/plugins/sub/new.jar"), b"added");

        merge_all(&install(root), &FakePlatform::default()).unwrap();

        assert_eq!(fs::read(root.join("jars/ij.jar")).unwrap(), b"new");
        assert_eq!(fs::read(root.join("plugins/sub/new.jar")).unwrap(), b"added");
        assert!(!root.join(UPDATE_DIR).exists());
    }

    #[test]
    fn test_zero_length_file_deletes_live_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(&root.join("plugins/obsolete.jar"), b"content");
        write(&root.join("update/plugins/obsolete.jar"), b"");
        write(&root.join("update/plugins/never-installed.jar"), b"");

        merge_all(&install(root), &FakePlatform::default()).unwrap();

        assert!(!root.join("plugins/obsolete.jar").exists());
        assert!(!root.join("plugins/never-installed.jar").exists());
        assert!(!root.join("update/plugins/obsolete.jar").exists());
        assert!(!root.join(UPDATE_DIR).exists());
    }

    #[test]
    fn test_merge_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(&root.join("update/jars/Fiji.jar"), b"fiji");

        merge_all(&install(root), &FakePlatform::default()).unwrap();
        merge_all(&install(root), &FakePlatform::default()).unwrap();

        assert_eq!(fs::read(root.join("jars/Fiji.jar")).unwrap(), b"fiji");
    }

    #[test]
    fn test_empty_staged_directories_are_created() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("update/plugins/empty/nested")).unwrap();
        fs::create_dir_all(root.join("update/macros")).unwrap();

        merge_all(&install(root), &FakePlatform::default()).unwrap();

        assert!(root.join("plugins/empty/nested").is_dir());
        assert!(root.join("macros").is_dir());
        assert!(!root.join(UPDATE_DIR).exists());
    }

    #[test]
    fn test_merge_single_subtree() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(&root.join("update/jars/a.jar"), b"a");
        write(&root.join("update/plugins/b.jar"), b"b");

        merge_staged(&install(root), &FakePlatform::default(), Path::new("jars")).unwrap();

        assert!(root.join("jars/a.jar").exists());
        assert!(!root.join("plugins/b.jar").exists());
        assert!(root.join("update/plugins/b.jar").exists());
    }
}
