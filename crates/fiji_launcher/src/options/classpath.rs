//! Class path accumulation

use std::path::Path;

use walkdir::WalkDir;

use crate::config::ClassPathOrder;
use crate::error::LaunchError;

const ARCHIVE_SUFFIX: &str = ".jar";

/// Ordered class path entries joined with the platform separator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassPath {
    entries: Vec<String>,
    separator: char,
}

impl ClassPath {
    pub fn new(separator: char) -> Self {
        Self {
            entries: Vec::new(),
            separator,
        }
    }

    /// Append an entry (which may itself be a separator-joined list)
    pub fn push(&mut self, entry: impl Into<String>) {
        let entry = entry.into();
        if !entry.is_empty() {
            self.entries.push(entry);
        }
    }

    /// Insert an entry before all others
    pub fn prepend(&mut self, entry: impl Into<String>) {
        let entry = entry.into();
        if !entry.is_empty() {
            self.entries.insert(0, entry);
        }
    }

    /// Append a path entry
    pub fn push_path(&mut self, path: &Path) {
        self.push(path.display().to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Entries joined into a single class path string
    pub fn joined(&self) -> String {
        let mut separator = [0u8; 4];
        self.entries
            .join(self.separator.encode_utf8(&mut separator))
    }

    /// Append every archive found below `dir`.
    ///
    /// Entries ending in `.jar` are added whether they are files or
    /// directories; other non-hidden directories are searched the same way.
    /// In strict mode a top-level directory that cannot be opened is an
    /// error; unreadable nested directories are always skipped.
    pub fn add_archives(
        &mut self,
        dir: &Path,
        strict: bool,
        order: ClassPathOrder,
    ) -> Result<(), LaunchError> {
        let mut walker = WalkDir::new(dir).min_depth(1).follow_links(true);
        if order == ClassPathOrder::Sorted {
            walker = walker.sort_by_file_name();
        }

        let mut it = walker.into_iter();
        while let Some(entry) = it.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    if strict {
                        return Err(LaunchError::ClassPath {
                            path: dir.to_path_buf(),
                            source: e,
                        });
                    }
                    log::debug!("Skipping class path directory {}: {}", dir.display(), e);
                    return Ok(());
                }
                Err(e) => {
                    log::debug!("Skipping unreadable class path entry: {}", e);
                    continue;
                }
            };

            let name = entry.file_name().to_string_lossy();
            let is_dir = entry.file_type().is_dir();
            if name.len() > ARCHIVE_SUFFIX.len() && name.ends_with(ARCHIVE_SUFFIX) {
                self.push_path(entry.path());
                if is_dir {
                    it.skip_current_dir();
                }
            } else if name.starts_with('.') && is_dir {
                it.skip_current_dir();
            }
        }
        Ok(())
    }
}
