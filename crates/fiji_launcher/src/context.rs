//! Per-invocation launch state

use std::path::PathBuf;

use crate::config::{BundleVariables, Settings};
use crate::error::LaunchError;
use crate::options::{parse_memory, split_options, ClassPath};
use crate::paths::{self, Installation};
use crate::platform::Platform;
use crate::runtime::RuntimeLocator;

/// Entry point used when nothing else is selected
pub const DEFAULT_MAIN_CLASS: &str = "fiji.Main";

/// Entry points that start the full application rather than a tool
pub const DEFAULT_MAIN_CLASSES: [&str; 2] = [DEFAULT_MAIN_CLASS, "ij.ImageJ"];

/// Whether `name` starts the full application
pub fn is_default_main_class(name: &str) -> bool {
    DEFAULT_MAIN_CLASSES.contains(&name)
}

/// Garbage collector configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GcStrategy {
    /// The runtime's own defaults
    Default,
    /// Incremental collection with a larger permanent generation
    #[default]
    Advanced,
    /// The G1 collector
    G1,
}

impl GcStrategy {
    /// Engine options selecting this strategy
    pub fn options(self) -> &'static [&'static str] {
        match self {
            GcStrategy::Default => &[],
            GcStrategy::Advanced => &["-Xincgc", "-XX:PermSize=128m"],
            GcStrategy::G1 => &[
                "-XX:PermSize=128m",
                "-XX:+UseCompressedOops",
                "-XX:+UnlockExperimentalVMOptions",
                "-XX:+UseG1GC",
                "-XX:+G1ParallelRSetUpdatingEnabled",
                "-XX:+G1ParallelRSetScanningEnabled",
                "-XX:NewRatio=5",
            ],
        }
    }
}

/// Boolean switches collected from settings and the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchFlags {
    /// Run without a display
    pub headless: bool,
    /// Print the command line instead of launching
    pub dry_run: bool,
    /// Do not reuse a running instance
    pub allow_multiple: bool,
    /// Skip loading the runtime in-process
    pub use_system_runtime: bool,
    /// Start under the debugger
    pub jdb: bool,
    /// Build mode: the class path is given explicitly
    pub skip_class_path: bool,
    /// Pass the class path to the entry point as `-classpath`
    pub add_class_path_option: bool,
    /// Wrap the entry point in the retrotranslator
    pub retrotranslator: bool,
    /// Log collector activity
    pub debug_gc: bool,
    pub gc: GcStrategy,
}

/// Everything one launch accumulates before booting the runtime
#[derive(Debug, Clone)]
pub struct LaunchContext {
    /// Original arguments, the launcher's own path first
    pub args: Vec<String>,
    pub install: Installation,
    pub runtime: RuntimeLocator,
    pub settings: Settings,
    /// Entry point selected by a flag or inference
    pub main_class: Option<String>,
    pub class_path: ClassPath,
    pub ext_dirs: ClassPath,
    pub plugins_dir: Option<String>,
    /// Heap size in bytes, 0 when unset
    pub memory_size: u64,
    /// Engine options from settings
    pub jvm_options: Vec<String>,
    /// Application options from settings
    pub default_arguments: Vec<String>,
    pub flags: LaunchFlags,
    /// Whether a console window was allocated for this launch
    pub console_opened: bool,
}

impl LaunchContext {
    /// Context for the launcher invoked as `args[0]`
    pub fn new(platform: &dyn Platform, args: Vec<String>) -> Result<Self, LaunchError> {
        let argv0 = args.first().cloned().unwrap_or_default();
        let install = paths::locate_installation_root(platform, &argv0)?;
        let settings = Settings::load(&install.root)?;
        Self::with_installation(platform, install, settings, args)
    }

    /// Context for an already located installation
    pub fn with_installation(
        platform: &dyn Platform,
        install: Installation,
        settings: Settings,
        args: Vec<String>,
    ) -> Result<Self, LaunchError> {
        let mut runtime =
            RuntimeLocator::new(&install.root, platform.tag(), platform.runtime_library());
        runtime.adjust_if_necessary();

        let separator = platform.path_list_separator();
        let mut context = Self {
            args,
            install,
            runtime,
            settings: Settings::default(),
            main_class: None,
            class_path: ClassPath::new(separator),
            ext_dirs: ClassPath::new(separator),
            plugins_dir: None,
            memory_size: 0,
            jvm_options: Vec::new(),
            default_arguments: Vec::new(),
            flags: LaunchFlags::default(),
            console_opened: false,
        };
        context.apply_settings(platform, settings)?;
        Ok(context)
    }

    /// Apply bundle variables and engine options; flags scanned later
    /// override them.
    fn apply_settings(&mut self, platform: &dyn Platform, settings: Settings) -> Result<(), LaunchError> {
        if let Some(heap) = settings.heap() {
            self.memory_size = parse_memory(&heap)?;
        }
        self.flags.use_system_runtime = settings.use_system_runtime();
        match settings.ext() {
            Some(ext) => self.ext_dirs.push(ext),
            None => {
                if let Some(ext) = platform.default_extension_dirs(&self.runtime) {
                    self.ext_dirs.push(ext);
                }
            }
        }
        if let Some(allow) = settings.allow_multiple() {
            self.flags.allow_multiple = allow;
        }

        self.jvm_options = split_options(settings.engine_options())?;
        if let Some(options) = settings.jvm_options() {
            self.jvm_options.extend(split_options(&options)?);
        }
        if let Some(arguments) = settings.default_arguments() {
            self.default_arguments = split_options(&arguments)?;
        }
        self.settings = settings;
        Ok(())
    }

    /// The launcher's arguments without its own path
    pub fn arguments(&self) -> &[String] {
        self.args.get(1..).unwrap_or(&[])
    }

    /// Path of `relative` below the installation root
    pub fn install_path(&self, relative: &str) -> PathBuf {
        self.install.path(relative)
    }

    /// Move the installation root
    pub fn set_install_root(&mut self, root: impl Into<PathBuf>) {
        let root = root.into();
        self.runtime.set_install_root(&root);
        self.install.root = root;
    }

    /// `tools.jar` of the development kit the runtime belongs to
    pub fn tools_jar(&self) -> PathBuf {
        self.runtime.library_home().join("../lib/tools.jar")
    }

    /// Entry point, the default one when none was selected
    pub fn main_class(&self) -> &str {
        self.main_class.as_deref().unwrap_or(DEFAULT_MAIN_CLASS)
    }

    /// Whether an explicit, non-default entry point was selected
    pub fn has_custom_main_class(&self) -> bool {
        self.main_class
            .as_deref()
            .is_some_and(|name| !is_default_main_class(name))
    }

    /// Whether the named target is being built: `--build`/`--fake` came
    /// first and `target` is among the build targets
    pub fn is_building(&self, target: &str) -> bool {
        let args = self.arguments();
        matches!(args.first().map(String::as_str), Some("--build" | "--fake"))
            && args.iter().skip(1).any(|arg| arg == target)
    }
}

impl BundleVariables for LaunchContext {
    fn variable(&self, key: &str) -> Option<String> {
        self.settings.variable(key)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::platform::testing::FakePlatform;
    use std::path::Path;

    /// Context rooted at `root` without touching `PATH` or settings files
    pub(crate) fn context_at(root: &Path, args: &[&str]) -> LaunchContext {
        context_with_settings(root, args, Settings::default())
    }

    pub(crate) fn context_with_settings(
        root: &Path,
        args: &[&str],
        settings: Settings,
    ) -> LaunchContext {
        let install = Installation {
            root: root.to_path_buf(),
            executable: root.join("fiji"),
            precompiled: false,
        };
        let mut argv = vec![root.join("fiji").display().to_string()];
        argv.extend(args.iter().map(|arg| arg.to_string()));
        LaunchContext::with_installation(&FakePlatform::default(), install, settings, argv).unwrap()
    }

    #[test]
    fn test_settings_are_applied() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::from_yaml(
            "heap: 256m\nsystem: 1\nallowMultiple: true\nJVMOptions: -Xss4m\nDefaultArguments: \"-port9 'a b'\"\n",
        )
        .unwrap()
        .with_engine_options("-Dfrom.cfg=1");
        let context = context_with_settings(dir.path(), &[], settings);

        assert_eq!(context.memory_size, 256 << 20);
        assert!(context.flags.use_system_runtime);
        assert!(context.flags.allow_multiple);
        assert_eq!(context.jvm_options, ["-Dfrom.cfg=1", "-Xss4m"]);
        assert_eq!(context.default_arguments, ["-port9", "a b"]);
    }

    #[test]
    fn test_default_gc_is_advanced() {
        let dir = tempfile::tempdir().unwrap();
        let context = context_at(dir.path(), &[]);
        assert_eq!(context.flags.gc, GcStrategy::Advanced);
        assert_eq!(context.main_class(), DEFAULT_MAIN_CLASS);
        assert!(!context.has_custom_main_class());
    }

    #[test]
    fn test_is_building() {
        let dir = tempfile::tempdir().unwrap();
        let context = context_at(dir.path(), &["--build", "jars/fake.jar"]);
        assert!(context.is_building("jars/fake.jar"));
        assert!(!context.is_building("fiji"));

        let context = context_at(dir.path(), &["--headless", "jars/fake.jar"]);
        assert!(!context.is_building("jars/fake.jar"));
    }
}
