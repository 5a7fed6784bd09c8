//! Single-pass classification of the launcher's arguments
//!
//! Every argument is either consumed by the launcher (a flag or its value)
//! or forwarded. Forwarded tokens before the boundary become engine
//! options, the others application options. The input is never modified;
//! the scan records where each token went.

use std::path::Path;

use super::{unquote, OptionList};
use crate::context::{GcStrategy, LaunchContext, DEFAULT_MAIN_CLASS};
use crate::error::LaunchError;
use crate::paths;
use crate::platform::Platform;
use crate::runtime::RUNTIME_HOME_VAR;

/// Where a single input token ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A launcher flag or its value
    Control,
    /// Forwarded as an engine option
    Engine,
    /// Forwarded as an application option
    Application,
    /// Forwarded uninterpreted to a custom entry point
    Passthrough,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classified {
    /// Position in the argument list, launcher path excluded
    pub index: usize,
    pub kind: TokenKind,
}

/// Flags that end the launch before anything is booted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EarlyExit {
    PrintRuntimeHome,
    PrintInstallDir,
    Usage,
}

/// A token the launcher did not consume
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forwarded {
    pub index: usize,
    pub token: String,
    /// Seen after `--` with a custom entry point selected
    pub verbatim: bool,
}

/// Result of classifying the arguments
#[derive(Debug, Clone, Default)]
pub struct Scan {
    pub forwarded: Vec<Forwarded>,
    /// Number of forwarded tokens that are engine options
    pub boundary: Option<usize>,
    /// Application options generated by launcher flags
    pub app_options: OptionList,
    /// Flags that count as a parameter for `--headless`
    pub headless_args: usize,
    /// Set when the scan stopped at a flag that ends the launch
    pub exit: Option<EarlyExit>,
    control: Vec<usize>,
}

impl Scan {
    fn split(&self) -> (&[Forwarded], &[Forwarded]) {
        match self.boundary {
            Some(boundary) => self.forwarded.split_at(boundary.min(self.forwarded.len())),
            None => (&[], &self.forwarded),
        }
    }

    /// Forwarded tokens destined for the engine
    pub fn engine_tokens(&self) -> impl Iterator<Item = &str> {
        self.split().0.iter().map(|f| f.token.as_str())
    }

    /// Forwarded tokens destined for the application
    pub fn application_tokens(&self) -> impl Iterator<Item = &str> {
        self.split().1.iter().map(|f| f.token.as_str())
    }

    /// Number of forwarded application tokens
    pub fn application_count(&self) -> usize {
        self.split().1.len()
    }

    /// The class of every scanned token, ordered by position.
    ///
    /// When the scan stopped early, tokens after the stopping flag are
    /// absent.
    pub fn trace(&self) -> Vec<Classified> {
        let mut trace: Vec<Classified> = self
            .control
            .iter()
            .map(|&index| Classified {
                index,
                kind: TokenKind::Control,
            })
            .collect();
        for (position, forwarded) in self.forwarded.iter().enumerate() {
            let kind = if forwarded.verbatim {
                TokenKind::Passthrough
            } else if self.boundary.is_some_and(|boundary| position < boundary) {
                TokenKind::Engine
            } else {
                TokenKind::Application
            };
            trace.push(Classified {
                index: forwarded.index,
                kind,
            });
        }
        trace.sort_by_key(|classified| classified.index);
        trace
    }
}

/// Value of the flag at `*i` if it is one of `names`, taken from the next
/// token or from the `name=value` form.
fn take_value(args: &[String], i: &mut usize, names: &[&str]) -> Result<Option<String>, LaunchError> {
    let token = args[*i].as_str();
    for name in names {
        if token == *name {
            let value = args
                .get(*i + 1)
                .ok_or_else(|| LaunchError::MissingValue(name.to_string()))?;
            *i += 1;
            return Ok(Some(value.clone()));
        }
        if let Some(value) = token.strip_prefix(name).and_then(|rest| rest.strip_prefix('=')) {
            return Ok(Some(value.to_string()));
        }
    }
    Ok(None)
}

fn absolute(platform: &dyn Platform, path: &str) -> Result<String, LaunchError> {
    Ok(paths::resolve_absolute(platform, Path::new(path))?
        .display()
        .to_string())
}

fn eval(scan: &mut Scan, macro_call: String) {
    scan.app_options.push("-eval");
    scan.app_options.push(macro_call);
}

/// Classify the context's arguments, applying every launcher flag to `ctx`
/// and selecting the entry point.
pub fn classify(ctx: &mut LaunchContext, platform: &dyn Platform) -> Result<Scan, LaunchError> {
    let args = ctx.arguments().to_vec();
    let mut scan = Scan::default();

    let mut i = 0;
    while i < args.len() {
        let start = i;
        let token = args[i].as_str();
        let mut consumed = true;

        if token == "--" && scan.boundary.is_none() {
            scan.boundary = Some(scan.forwarded.len());
        } else if scan.boundary.is_some() && ctx.has_custom_main_class() {
            scan.forwarded.push(Forwarded {
                index: i,
                token: token.to_string(),
                verbatim: true,
            });
            consumed = false;
        } else if token == "--dry-run" {
            ctx.flags.dry_run = true;
        } else if let Some(home) = take_value(&args, &mut i, &["--runtime-home", "--java-home"])? {
            std::env::set_var(RUNTIME_HOME_VAR, &home);
            ctx.runtime.set_override(home);
        } else if token == "--system" {
            ctx.flags.use_system_runtime = true;
        } else if token == "--console" {
            if platform.open_console() {
                ctx.console_opened = true;
            }
        } else if token == "--jdb" {
            let tools = ctx.tools_jar();
            ctx.class_path.push_path(&tools);
            ctx.flags.add_class_path_option = true;
            ctx.flags.jdb = true;
        } else if token == "--allow-multiple" {
            ctx.flags.allow_multiple = true;
        } else if let Some(dir) = take_value(&args, &mut i, &["--plugins"])? {
            ctx.plugins_dir = Some(dir);
        } else if let Some(name) = take_value(&args, &mut i, &["--run"])? {
            let mut call = unquote(&name)?.replace('_', " ");
            if let Some(arg) = args.get(i + 1).filter(|arg| !arg.starts_with('-')) {
                call.push_str(&format!("\", \"{arg}"));
                i += 1;
            }
            eval(&mut scan, format!("run(\"{call}\");"));
            scan.headless_args += 1;
        } else if let Some(file) = take_value(&args, &mut i, &["--compile-and-run"])? {
            let file = absolute(platform, &file)?;
            eval(&mut scan, format!("run(\"Refresh Javas\", \"{file} \");"));
            scan.headless_args += 1;
        } else if let Some(first) = take_value(&args, &mut i, &["--edit"])? {
            let mut file = first;
            loop {
                let target = if file.is_empty() || file.starts_with("class:") {
                    file
                } else {
                    absolute(platform, &file)?
                };
                eval(&mut scan, format!("run(\"Script Editor\", \"{target}\");"));
                if i + 1 >= args.len() {
                    break;
                }
                i += 1;
                file = args[i].clone();
            }
        } else if let Some(amount) = take_value(&args, &mut i, &["--heap", "--mem", "--memory"])? {
            ctx.memory_size = super::parse_memory(&amount)?;
        } else if token == "--headless" {
            ctx.flags.headless = true;
            // --headless script.ijm
            if i + 2 == args.len() && !args[i + 1].starts_with('-') {
                scan.boundary = Some(scan.forwarded.len());
            }
        } else if token == "--jython" {
            ctx.main_class = Some("org.python.util.jython".into());
            ctx.class_path.push("/usr/share/java/jython.jar");
        } else if token == "--jruby" {
            ctx.main_class = Some("org.jruby.Main".into());
        } else if token == "--clojure" {
            ctx.main_class = Some("clojure.lang.Repl".into());
            ctx.class_path.push("/usr/share/java/clojure.jar");
        } else if token == "--beanshell" || token == "--bsh" {
            ctx.main_class = Some("bsh.Interpreter".into());
            ctx.class_path.push("/usr/share/java/bsh.jar");
        } else if let Some(class) = take_value(&args, &mut i, &["--main-class"])? {
            ctx.class_path.push(".");
            ctx.main_class = Some(class);
        } else if let Some(jar) = take_value(&args, &mut i, &["--jar"])? {
            ctx.class_path.push(jar.as_str());
            ctx.main_class = Some("fiji.JarLauncher".into());
            scan.app_options.push(jar);
        } else if let Some(entry) = take_value(
            &args,
            &mut i,
            &["--class-path", "--classpath", "-classpath", "--cp", "-cp"],
        )? {
            ctx.class_path.push(entry);
        } else if let Some(dir) = take_value(&args, &mut i, &["--jar-path", "--jarpath", "-jarpath"])? {
            let order = ctx.settings.class_path_order();
            ctx.class_path.add_archives(Path::new(&dir), true, order)?;
        } else if let Some(dir) = take_value(&args, &mut i, &["--ext"])? {
            ctx.ext_dirs.push(dir);
        } else if token == "--build" || token == "--fake" {
            select_build_tool(ctx, platform);
        } else if matches!(token, "--javac" | "--javap" | "--javadoc") {
            ctx.flags.add_class_path_option = true;
            ctx.flags.headless = true;
            if token == "--javac" {
                let javac = ctx.install_path("jars/javac.jar");
                if ctx.install.precompiled || !javac.exists() {
                    let precompiled = ctx.install_path("precompiled/javac.jar");
                    ctx.class_path.push_path(&precompiled);
                } else {
                    ctx.class_path.push_path(&javac);
                }
            }
            let tools = ctx.tools_jar();
            ctx.class_path.push_path(&tools);
            let main_class = match token {
                "--javac" => "com.sun.tools.javac.Main",
                "--javap" => "sun.tools.javap.Main",
                _ => "com.sun.tools.javadoc.Main",
            };
            ctx.main_class = Some(main_class.into());
        } else if token == "--ant" {
            ctx.main_class = Some(ANT_MAIN_CLASS.into());
            let tools = ctx.tools_jar();
            ctx.class_path.push_path(&tools);
            for jar in ["ant.jar", "ant-launcher.jar", "ant-nodeps.jar"] {
                ctx.class_path.push(format!("/usr/share/java/{jar}"));
            }
        } else if token == "--retrotranslator" || token == "--retro" {
            ctx.flags.retrotranslator = true;
        } else if let Some(root) = take_value(&args, &mut i, &["--install-dir", "--fiji-dir"])? {
            ctx.set_install_root(root);
        } else if token == "--print-install-dir" || token == "--print-fiji-dir" {
            return Ok(stop(scan, i, EarlyExit::PrintInstallDir));
        } else if token == "--print-runtime-home" || token == "--print-java-home" {
            return Ok(stop(scan, i, EarlyExit::PrintRuntimeHome));
        } else if token == "--default-gc" {
            ctx.flags.gc = GcStrategy::Default;
        } else if token == "--gc-g1" || token == "--g1" {
            ctx.flags.gc = GcStrategy::G1;
        } else if token == "--debug-gc" {
            ctx.flags.debug_gc = true;
        } else if token == "--help" || token == "-h" {
            return Ok(stop(scan, i, EarlyExit::Usage));
        } else {
            scan.forwarded.push(Forwarded {
                index: i,
                token: token.to_string(),
                verbatim: false,
            });
            consumed = false;
        }

        if consumed {
            scan.control.extend(start..=i);
        }
        i += 1;
    }

    infer_main_class(ctx, platform, &mut scan);
    Ok(scan)
}

/// Entry point of the build tool
pub const ANT_MAIN_CLASS: &str = "org.apache.tools.ant.Main";

fn stop(mut scan: Scan, index: usize, exit: EarlyExit) -> Scan {
    scan.control.push(index);
    scan.exit = Some(exit);
    scan
}

fn select_build_tool(ctx: &mut LaunchContext, platform: &dyn Platform) {
    if platform.open_console() {
        ctx.console_opened = true;
    }
    ctx.flags.skip_class_path = true;
    ctx.flags.headless = true;

    let mut fake = ctx.install_path("jars/fake.jar");
    let precompiled = ctx.install_path("precompiled/fake.jar");
    if ctx.install.precompiled || !fake.exists() || paths::is_newer(&precompiled, &fake) {
        fake = precompiled;
    }
    let source = ctx.install_path("src-plugins/fake/fiji/build/Fake.java");
    if paths::is_newer(&source, &fake) && !ctx.is_building("jars/fake.jar") {
        log::warn!("Warning: jars/fake.jar is not up-to-date");
    }
    ctx.class_path.push_path(&fake);
    ctx.main_class = Some("fiji.build.Fake".into());
}

fn has_suffix(token: &str, suffix: &str) -> bool {
    token.len() > suffix.len() && token.ends_with(suffix)
}

/// Pick the entry point from the first application token when no flag
/// selected one.
fn infer_main_class(ctx: &mut LaunchContext, platform: &dyn Platform, scan: &mut Scan) {
    if ctx.main_class.is_some() {
        return;
    }
    let position = scan.boundary.unwrap_or(0);
    let first = match scan.forwarded.get(position) {
        Some(first) if !first.token.starts_with("--") => first.token.clone(),
        _ => {
            ctx.main_class = Some(DEFAULT_MAIN_CLASS.into());
            return;
        }
    };

    let main_class = if has_suffix(&first, ".py") {
        "org.python.util.jython".to_string()
    } else if has_suffix(&first, ".rb") {
        "org.jruby.Main".to_string()
    } else if has_suffix(&first, ".clj") {
        "clojure.lang.Script".to_string()
    } else if has_suffix(&first, ".bsh") || has_suffix(&first, ".bs") {
        "bsh.Interpreter".to_string()
    } else if has_suffix(&first, ".class") {
        let dotted: String = first[..first.len() - ".class".len()]
            .chars()
            .map(|c| if platform.is_separator(c) { '.' } else { c })
            .collect();
        ctx.class_path.push(".");
        let removed = scan.forwarded.remove(position);
        scan.control.push(removed.index);
        dotted
    } else {
        DEFAULT_MAIN_CLASS.to_string()
    };
    log::debug!("Entry point: {main_class}");
    ctx.main_class = Some(main_class);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::context_at;
    use crate::platform::testing::{lock_env, FakePlatform};

    fn run(root: &Path, args: &[&str]) -> (LaunchContext, Scan) {
        let mut ctx = context_at(root, args);
        let scan = classify(&mut ctx, &FakePlatform::default()).unwrap();
        (ctx, scan)
    }

    fn outcome(ctx: &LaunchContext, scan: &Scan) -> String {
        format!(
            "{:?} {:?} {:?} {:?} {:?} {:?} {:?}",
            scan.app_options,
            ctx.class_path,
            ctx.ext_dirs,
            ctx.memory_size,
            ctx.plugins_dir,
            ctx.main_class,
            scan.forwarded.iter().map(|f| &f.token).collect::<Vec<_>>(),
        )
    }

    #[test]
    fn test_value_flags_accept_both_syntaxes() {
        let _guard = lock_env();
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("lib")).unwrap();
        std::fs::write(dir.path().join("lib/a.jar"), b"").unwrap();
        let lib = dir.path().join("lib").display().to_string();

        let cases = [
            ("--heap", "512m"),
            ("--mem", "1g"),
            ("--memory", "256"),
            ("--plugins", "/opt/plugins"),
            ("--main-class", "org.example.Tool"),
            ("--jar", "tool.jar"),
            ("--class-path", "a.jar"),
            ("--classpath", "a.jar"),
            ("-classpath", "a.jar"),
            ("--cp", "a.jar"),
            ("-cp", "a.jar"),
            ("--jar-path", lib.as_str()),
            ("--jarpath", lib.as_str()),
            ("-jarpath", lib.as_str()),
            ("--ext", "/opt/ext"),
            ("--run", "Hello"),
        ];
        for (flag, value) in cases {
            let joined = format!("{flag}={value}");
            let (ctx_a, scan_a) = run(dir.path(), &[flag, value, "image.tif"]);
            let (ctx_b, scan_b) = run(dir.path(), &[&joined, "image.tif"]);
            assert_eq!(outcome(&ctx_a, &scan_a), outcome(&ctx_b, &scan_b), "{flag}");
        }
    }

    #[test]
    fn test_location_flags_accept_both_syntaxes() {
        let _guard = lock_env();
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let script = root.join("Hello_.java");
        std::fs::write(&script, b"").unwrap();
        let script = script.display().to_string();

        let cases = [
            ("--runtime-home", "/opt/jdk"),
            ("--java-home", "/opt/jdk"),
            ("--install-dir", "/opt/fiji"),
            ("--fiji-dir", "/opt/fiji"),
            ("--compile-and-run", script.as_str()),
        ];
        for (flag, value) in cases {
            let joined = format!("{flag}={value}");
            let (ctx_a, scan_a) = run(&root, &[flag, value, "image.tif"]);
            let (ctx_b, scan_b) = run(&root, &[&joined, "image.tif"]);
            std::env::remove_var(RUNTIME_HOME_VAR);

            assert_eq!(outcome(&ctx_a, &scan_a), outcome(&ctx_b, &scan_b), "{flag}");
            assert_eq!(ctx_a.install.root, ctx_b.install.root, "{flag}");
            assert_eq!(ctx_a.runtime.runtime_home(), ctx_b.runtime.runtime_home(), "{flag}");
        }

        let (ctx, _) = run(&root, &["--runtime-home=/opt/jdk"]);
        std::env::remove_var(RUNTIME_HOME_VAR);
        assert_eq!(ctx.runtime.runtime_home(), Path::new("/opt/jdk"));

        let (ctx, _) = run(&root, &["--install-dir=/opt/fiji"]);
        assert_eq!(ctx.install.root, Path::new("/opt/fiji"));

        let (_, scan) = run(&root, &[&format!("--compile-and-run={script}")]);
        let call = format!("run(\"Refresh Javas\", \"{script} \");");
        assert_eq!(scan.app_options.as_slice(), ["-eval", call.as_str()]);
    }

    #[test]
    fn test_oversized_heap_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context_at(dir.path(), &["--mem=16777216t"]);
        let err = classify(&mut ctx, &FakePlatform::default()).unwrap_err();
        assert!(matches!(err, LaunchError::HeapTooLarge(_)));
    }

    #[test]
    fn test_missing_value_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context_at(dir.path(), &["--heap"]);
        let err = classify(&mut ctx, &FakePlatform::default()).unwrap_err();
        assert!(matches!(err, LaunchError::MissingValue(ref name) if name == "--heap"));
    }

    #[test]
    fn test_run_builds_macro_call() {
        let dir = tempfile::tempdir().unwrap();
        let (_, scan) = run(dir.path(), &["--run", "Gaussian Blur", "5"]);
        assert_eq!(
            scan.app_options.as_slice(),
            ["-eval", "run(\"Gaussian Blur\", \"5\");"]
        );
        assert_eq!(scan.headless_args, 1);

        let (_, scan) = run(dir.path(), &["--run", "\"Gaussian_Blur\"", "-x"]);
        assert_eq!(scan.app_options.as_slice(), ["-eval", "run(\"Gaussian Blur\");"]);
        assert_eq!(scan.application_tokens().collect::<Vec<_>>(), ["-x"]);
    }

    #[test]
    fn test_run_with_unclosed_quote_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context_at(dir.path(), &["--run", "\"abc"]);
        let err = classify(&mut ctx, &FakePlatform::default()).unwrap_err();
        assert!(matches!(err, LaunchError::UnclosedQuote { column: 0, .. }));
    }

    #[test]
    fn test_every_token_is_classified_once() {
        let dir = tempfile::tempdir().unwrap();
        let args = [
            "-Dfoo=1",
            "--plugins",
            "/p",
            "--",
            "--allow-multiple",
            "image.tif",
            "--heap=1g",
        ];
        let (ctx, scan) = run(dir.path(), &args);
        let trace = scan.trace();
        assert_eq!(
            trace.iter().map(|c| c.index).collect::<Vec<_>>(),
            (0..args.len()).collect::<Vec<_>>()
        );
        assert_eq!(trace[0].kind, TokenKind::Engine);
        assert_eq!(trace[3].kind, TokenKind::Control);
        assert_eq!(trace[5].kind, TokenKind::Application);
        assert_eq!(trace[6].kind, TokenKind::Control);
        assert!(ctx.flags.allow_multiple);
        assert_eq!(ctx.memory_size, 1 << 30);
    }

    #[test]
    fn test_custom_entry_point_receives_tokens_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, scan) = run(
            dir.path(),
            &["--main-class", "org.example.Tool", "--", "--heap", "1g", "--"],
        );
        assert_eq!(ctx.memory_size, 0);
        assert_eq!(
            scan.application_tokens().collect::<Vec<_>>(),
            ["--heap", "1g", "--"]
        );
        assert!(scan
            .trace()
            .iter()
            .skip(3)
            .all(|c| c.kind == TokenKind::Passthrough));
    }

    #[test]
    fn test_headless_with_single_parameter_sets_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, scan) = run(dir.path(), &["-Xss4m", "--headless", "macro.ijm"]);
        assert!(ctx.flags.headless);
        assert_eq!(scan.boundary, Some(1));
        assert_eq!(scan.engine_tokens().collect::<Vec<_>>(), ["-Xss4m"]);
        assert_eq!(scan.application_tokens().collect::<Vec<_>>(), ["macro.ijm"]);
    }

    #[test]
    fn test_script_suffix_selects_interpreter() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, scan) = run(dir.path(), &["script.py", "arg"]);
        assert_eq!(ctx.main_class(), "org.python.util.jython");
        assert_eq!(scan.application_count(), 2);

        let (ctx, _) = run(dir.path(), &["lib.clj"]);
        assert_eq!(ctx.main_class(), "clojure.lang.Script");

        let (ctx, _) = run(dir.path(), &["--", "--looks-like-a-flag.py"]);
        assert_eq!(ctx.main_class(), DEFAULT_MAIN_CLASS);
    }

    #[test]
    fn test_class_file_selects_entry_point() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, scan) = run(dir.path(), &["org/example/Foo.class", "x"]);
        assert_eq!(ctx.main_class(), "org.example.Foo");
        assert_eq!(ctx.class_path.entries(), ["."]);
        assert_eq!(scan.application_tokens().collect::<Vec<_>>(), ["x"]);
        assert_eq!(scan.trace()[0].kind, TokenKind::Control);
    }

    #[test]
    fn test_edit_consumes_remaining_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let (_, scan) = run(dir.path(), &["--edit", "class:Foo", ""]);
        assert_eq!(
            scan.app_options.as_slice(),
            [
                "-eval",
                "run(\"Script Editor\", \"class:Foo\");",
                "-eval",
                "run(\"Script Editor\", \"\");",
            ]
        );
        assert!(scan.forwarded.is_empty());
    }

    #[test]
    fn test_gc_flags() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, _) = run(dir.path(), &["--default-gc"]);
        assert_eq!(ctx.flags.gc, GcStrategy::Default);
        let (ctx, _) = run(dir.path(), &["--g1", "--debug-gc"]);
        assert_eq!(ctx.flags.gc, GcStrategy::G1);
        assert!(ctx.flags.debug_gc);
    }

    #[test]
    fn test_build_uses_precompiled_tool_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, _) = run(dir.path(), &["--build", "all"]);
        assert!(ctx.flags.headless);
        assert!(ctx.flags.skip_class_path);
        assert_eq!(ctx.main_class(), "fiji.build.Fake");
        assert_eq!(
            ctx.class_path.entries(),
            [dir.path().join("precompiled/fake.jar").display().to_string()]
        );
    }

    #[test]
    fn test_print_flags_stop_the_scan() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, scan) = run(dir.path(), &["--print-install-dir", "--heap", "1g"]);
        assert_eq!(scan.exit, Some(EarlyExit::PrintInstallDir));
        assert_eq!(ctx.memory_size, 0);

        let (_, scan) = run(dir.path(), &["-h"]);
        assert_eq!(scan.exit, Some(EarlyExit::Usage));
    }
}
