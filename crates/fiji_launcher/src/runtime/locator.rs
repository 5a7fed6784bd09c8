//! Runtime discovery
//!
//! The runtime home is, in order of preference, an explicit override, a
//! valid `JAVA_HOME`, or a directory below the installation root. The
//! bundled location may be replaced at startup by the newest runtime found
//! under `os-specific/`.

use std::cell::OnceCell;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use walkdir::WalkDir;

/// Environment variable naming the runtime home
pub const RUNTIME_HOME_VAR: &str = "JAVA_HOME";

/// Directory below the installation root holding bundled runtimes
pub const RUNTIME_SEARCH_ROOT: &str = "os-specific";

/// Name of the nested runtime directory of a development kit
const JRE_DIR: &str = "jre";

/// Locates the runtime installation used for a launch
#[derive(Debug, Clone)]
pub struct RuntimeLocator {
    install_root: PathBuf,
    relative_home: PathBuf,
    library: &'static str,
    override_home: Option<PathBuf>,
    library_home: OnceCell<PathBuf>,
}

impl RuntimeLocator {
    /// Locator for the bundled runtime of platform `tag`, whose shared
    /// library sits at `library` below the runtime home
    pub fn new(install_root: impl Into<PathBuf>, tag: &str, library: &'static str) -> Self {
        Self {
            install_root: install_root.into(),
            relative_home: Path::new(RUNTIME_SEARCH_ROOT).join(tag).join(JRE_DIR),
            library,
            override_home: None,
            library_home: OnceCell::new(),
        }
    }

    /// Runtime library path relative to the runtime home
    pub fn library(&self) -> &'static str {
        self.library
    }

    /// Runtime home relative to the installation root
    pub fn relative_home(&self) -> &Path {
        &self.relative_home
    }

    /// Use `home` regardless of the environment
    pub fn set_override(&mut self, home: impl Into<PathBuf>) {
        self.override_home = Some(home.into());
        self.library_home = OnceCell::new();
    }

    /// Move the installation root, e.g. after `--install-dir`
    pub fn set_install_root(&mut self, root: impl Into<PathBuf>) {
        self.install_root = root.into();
        self.library_home = OnceCell::new();
    }

    /// The runtime home for this launch.
    ///
    /// An invalid `JAVA_HOME` is reported and removed from the environment
    /// so that child processes do not inherit it.
    pub fn runtime_home(&self) -> PathBuf {
        if let Some(home) = &self.override_home {
            return home.clone();
        }
        if let Some(env) = std::env::var_os(RUNTIME_HOME_VAR) {
            let env = PathBuf::from(env);
            if env.is_dir() {
                return env;
            }
            log::warn!("Ignoring invalid {}: {}", RUNTIME_HOME_VAR, env.display());
            std::env::remove_var(RUNTIME_HOME_VAR);
        }
        self.install_root.join(&self.relative_home)
    }

    /// Directory holding the runtime's shared library: the home itself if
    /// it is a `jre` directory, its `jre` subdirectory if present, or the
    /// home otherwise.
    pub fn library_home(&self) -> &Path {
        self.library_home.get_or_init(|| {
            let home = self.runtime_home();
            if home.file_name().is_some_and(|name| name == JRE_DIR) {
                return home;
            }
            let jre = home.join(JRE_DIR);
            if jre.is_dir() {
                jre
            } else {
                home
            }
        })
    }

    /// Full path of the runtime's shared library
    pub fn library_path(&self) -> PathBuf {
        self.library_home().join(self.library)
    }

    /// Replace the bundled runtime location with the newest runtime under
    /// `os-specific/` when the default location lacks the shared library.
    pub fn adjust_if_necessary(&mut self) {
        let default = self
            .install_root
            .join(&self.relative_home)
            .join(self.library);
        if default.exists() {
            return;
        }

        let search_root = self.install_root.join(RUNTIME_SEARCH_ROOT);
        let nested = Path::new(JRE_DIR).join(self.library);
        let adjusted = find_newest(&search_root, 2, &nested)
            .map(|dir| dir.join(JRE_DIR))
            .or_else(|| find_newest(&search_root, 3, Path::new(self.library)));

        if let Some(dir) = adjusted {
            if let Ok(relative) = dir.strip_prefix(&self.install_root) {
                log::debug!("Using bundled runtime at {}", relative.display());
                self.relative_home = relative.to_path_buf();
                self.library_home = OnceCell::new();
            }
        }
    }
}

/// Most recently modified directory at most `max_depth` levels below
/// `root` (inclusive) that contains `file`. Hidden directories are skipped.
pub fn find_newest(root: &Path, max_depth: usize, file: &Path) -> Option<PathBuf> {
    let mut newest: Option<(PathBuf, Option<SystemTime>)> = None;

    let walker = WalkDir::new(root)
        .max_depth(max_depth)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || !entry.file_name().to_string_lossy().starts_with('.')
        });

    for entry in walker.filter_map(Result::ok) {
        if !entry.file_type().is_dir() || !entry.path().join(file).exists() {
            continue;
        }
        let modified = entry.metadata().ok().and_then(|m| m.modified().ok());
        let replace = match &newest {
            None => true,
            Some((_, current)) => match (modified, current) {
                (Some(candidate), Some(current)) => candidate > *current,
                (Some(_), None) => true,
                _ => false,
            },
        };
        if replace {
            newest = Some((entry.into_path(), modified));
        }
    }

    newest.map(|(path, _)| path)
}
