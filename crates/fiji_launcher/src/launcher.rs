//! The launch sequence: locate, classify, assemble, boot

use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;

use crate::context::LaunchContext;
use crate::error::LaunchError;
use crate::options::{classify, usage, EarlyExit, LaunchCommand};
use crate::paths;
use crate::platform::{BootFn, Platform};
use crate::runtime;

/// What a launch amounts to once the arguments are understood
#[derive(Debug)]
pub enum Plan {
    /// Print `text` on stdout and exit with `status`
    Print { text: String, status: i32 },
    /// Print the help text on stderr and exit with status 1
    Usage(String),
    /// Boot the runtime
    Boot {
        ctx: Box<LaunchContext>,
        command: LaunchCommand,
    },
}

/// Drives one launch on a platform
pub struct Launcher {
    platform: Arc<dyn Platform>,
}

impl Launcher {
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        Self { platform }
    }

    /// Work out what to do for `args`, the launcher's own path first.
    ///
    /// May replace the process to fix the library search path.
    pub fn plan(&self, args: Vec<String>) -> Result<Plan, LaunchError> {
        let platform = self.platform.as_ref();
        let mut ctx = LaunchContext::new(platform, args)?;

        if platform.is_finder_launch(ctx.arguments()) {
            ctx.args.truncate(1);
            std::env::set_current_dir(&ctx.install.root).map_err(|source| {
                LaunchError::ChangeDirectory {
                    path: ctx.install.root.clone(),
                    source,
                }
            })?;
        }

        let scan = classify(&mut ctx, platform)?;
        match scan.exit {
            Some(EarlyExit::PrintInstallDir) => {
                return Ok(Plan::Print {
                    text: ctx.install.root.display().to_string(),
                    status: 0,
                });
            }
            Some(EarlyExit::PrintRuntimeHome) => {
                return Ok(Plan::Print {
                    text: ctx.runtime.runtime_home().display().to_string(),
                    status: 0,
                });
            }
            Some(EarlyExit::Usage) => {
                let program = ctx.args.first().map(String::as_str).unwrap_or("fiji");
                return Ok(Plan::Usage(usage(program)));
            }
            None => {}
        }

        if !ctx.flags.dry_run {
            reexec_with_library_path(&ctx, platform)?;
        }

        let command = LaunchCommand::build(&mut ctx, platform, &scan)?;
        if ctx.flags.dry_run {
            return Ok(Plan::Print {
                text: command.dry_run_line(),
                status: 0,
            });
        }
        Ok(Plan::Boot {
            ctx: Box::new(ctx),
            command,
        })
    }

    /// Run the launch to completion, returning the process exit status
    pub fn run(&self, args: Vec<String>) -> Result<i32, LaunchError> {
        match self.plan(args)? {
            Plan::Print { text, status } => {
                println!("{text}");
                Ok(status)
            }
            Plan::Usage(text) => {
                eprint!("{text}");
                Ok(1)
            }
            Plan::Boot { ctx, command } => {
                let install_root = ctx.install.root.clone();
                let platform = Arc::clone(&self.platform);
                let boot: BootFn = Box::new(move || {
                    match runtime::boot(&ctx, platform.as_ref(), &command) {
                        Ok(status) => status,
                        Err(e) => {
                            log::error!("{e}");
                            1
                        }
                    }
                });
                Ok(self.platform.run_with_event_loop(&install_root, boot))
            }
        }
    }
}

/// Convert the process arguments, refusing any that is not valid UTF-8
/// since re-executions would otherwise replay an altered argument.
pub fn utf8_arguments(
    args: impl IntoIterator<Item = OsString>,
) -> Result<Vec<String>, LaunchError> {
    args.into_iter()
        .map(|arg| {
            arg.into_string()
                .map_err(|arg| LaunchError::NonUtf8Argument(arg.to_string_lossy().into_owned()))
        })
        .collect()
}

/// On platforms whose dynamic linker reads the library search path only at
/// startup, put the runtime's library directory on it and restart.
fn reexec_with_library_path(ctx: &LaunchContext, platform: &dyn Platform) -> Result<(), LaunchError> {
    let Some(var) = platform.library_search_path_var() else {
        return Ok(());
    };
    if !platform.needs_library_path_reexec() {
        return Ok(());
    }
    let library = ctx.runtime.library_path();
    if !library.exists() {
        return Ok(());
    }
    let Some(lib_dir) = library.parent().and_then(Path::parent) else {
        return Ok(());
    };
    // Runtimes with a launcher support library find their own way
    if lib_dir.join("jli").is_dir() {
        return Ok(());
    }

    let lib_dir = lib_dir.display().to_string();
    let separator = platform.path_list_separator();
    let value = match std::env::var(var) {
        Ok(original) if paths::path_list_contains(&original, &lib_dir, separator) => {
            return Ok(());
        }
        Ok(original) if !original.is_empty() => format!("{lib_dir}{separator}{original}"),
        _ => lib_dir,
    };
    std::env::set_var(var, &value);

    let executable = ctx.install.executable.display().to_string();
    let mut argv = vec![executable.clone()];
    argv.extend(ctx.arguments().iter().cloned());
    log::info!("Re-executing with correct library lookup path");
    let source = platform.replace_process_image(&executable, &argv, false);
    Err(LaunchError::Exec {
        command: argv.join(" "),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::testing::{lock_env, FakePlatform};

    fn launcher() -> Launcher {
        Launcher::new(Arc::new(FakePlatform::default()))
    }

    fn argv(root: &Path, args: &[&str]) -> Vec<String> {
        let mut argv = vec![root.join("fiji").display().to_string()];
        argv.extend(args.iter().map(|arg| arg.to_string()));
        argv
    }

    #[test]
    fn test_utf8_arguments_pass_through() {
        let args = utf8_arguments(["fiji", "café.tif"].map(OsString::from)).unwrap();
        assert_eq!(args, ["fiji", "café.tif"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_argument_is_rejected() {
        use std::os::unix::ffi::OsStringExt;

        let latin1 = OsString::from_vec(b"caf\xe9.tif".to_vec());
        match utf8_arguments([OsString::from("fiji"), latin1]) {
            Err(LaunchError::NonUtf8Argument(arg)) => assert_eq!(arg, "caf\u{FFFD}.tif"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_print_install_dir() {
        let _guard = lock_env();
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        match launcher().plan(argv(&root, &["--print-install-dir"])).unwrap() {
            Plan::Print { text, status } => {
                assert_eq!(text, root.display().to_string());
                assert_eq!(status, 0);
            }
            other => panic!("unexpected plan: {other:?}"),
        }
    }

    #[test]
    fn test_help_exits_with_failure() {
        let _guard = lock_env();
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        assert_eq!(launcher().run(argv(&root, &["--help"])).unwrap(), 1);
    }

    #[test]
    fn test_dry_run_prints_command_line() {
        let _guard = lock_env();
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        match launcher().plan(argv(&root, &["--dry-run", "--mem=1g", "my image.tif"])).unwrap() {
            Plan::Print { text, status } => {
                assert_eq!(status, 0);
                assert!(text.starts_with("java -Dpython.cachedir.skip=true"));
                assert!(text.contains(" -Xmx1024m "));
                assert!(text.ends_with("fiji.Main -port7 my\\ image.tif"));
            }
            other => panic!("unexpected plan: {other:?}"),
        }
    }

    #[test]
    fn test_settings_file_is_read() {
        let _guard = lock_env();
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        std::fs::write(root.join("launcher.yaml"), "heap: 300m\n").unwrap();
        match launcher().plan(argv(&root, &["--dry-run", "image.tif"])).unwrap() {
            Plan::Print { text, .. } => assert!(text.contains(" -Xmx300m ")),
            other => panic!("unexpected plan: {other:?}"),
        }
    }

    #[test]
    fn test_finder_launch_drops_process_serial_number() {
        let _guard = lock_env();
        let cwd = std::env::current_dir().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let launcher = Launcher::new(Arc::new(FakePlatform {
            finder_launch: true,
            ..FakePlatform::default()
        }));

        let plan = launcher.plan(argv(&root, &["-psn_0_123"])).unwrap();
        let moved_to = std::env::current_dir().unwrap();
        std::env::set_current_dir(cwd).unwrap();

        assert_eq!(moved_to, root);
        match plan {
            Plan::Boot { ctx, command } => {
                assert!(ctx.arguments().is_empty());
                assert!(!command.engine.iter().any(|option| option.starts_with("-psn_")));
                assert_eq!(command.app.as_slice(), ["-port7"]);
            }
            other => panic!("unexpected plan: {other:?}"),
        }
    }

    #[test]
    fn test_boot_plan() {
        let _guard = lock_env();
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        match launcher().plan(argv(&root, &["--headless", "macro.ijm"])).unwrap() {
            Plan::Boot { ctx, command } => {
                assert!(ctx.flags.headless);
                assert_eq!(command.main_class, "fiji.Main");
                assert_eq!(command.app.as_slice(), ["-port7", "-batch", "macro.ijm"]);
            }
            other => panic!("unexpected plan: {other:?}"),
        }
    }
}
