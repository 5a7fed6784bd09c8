//! Assembling the runtime's command line from a classified launch

use std::path::{Path, PathBuf};

use super::classifier::{Scan, ANT_MAIN_CLASS};
use super::{clamp_to_address_space, default_heap, heap_option, OptionList};
use crate::buffer::StringBuffer;
use crate::context::{is_default_main_class, LaunchContext};
use crate::error::LaunchError;
use crate::platform::Platform;
use crate::staging;

const DEBUGGER_MAIN_CLASS: &str = "com.sun.tools.example.debug.tty.TTY";
const RETROTRANSLATOR_MAIN_CLASS: &str = "net.sf.retrotranslator.transformer.JITRetrotranslator";

/// The runtime invocation a launch boils down to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    /// Options for the runtime itself
    pub engine: OptionList,
    pub main_class: String,
    /// Arguments handed to the entry point
    pub app: OptionList,
    /// System properties, set in-process or passed as `-D` options
    pub properties: Vec<(String, String)>,
}

impl LaunchCommand {
    /// Build the command for a scanned launch.
    ///
    /// Besides assembling options this falls back to headless mode when no
    /// display is reachable, merges staged updates for the default entry
    /// point and, for the build tool, puts the runtime's tools on `PATH`.
    pub fn build(
        ctx: &mut LaunchContext,
        platform: &dyn Platform,
        scan: &Scan,
    ) -> Result<Self, LaunchError> {
        if !ctx.flags.headless && !platform.display_available() {
            log::warn!("No GUI detected.  Falling back to headless mode.");
            ctx.flags.headless = true;
        }

        let mut engine = OptionList::new();
        if !ctx.ext_dirs.is_empty() {
            engine.push(format!("-Djava.ext.dirs={}", ctx.ext_dirs.joined()));
        }
        engine.push("-Dpython.cachedir.skip=true");
        let plugins = ctx
            .plugins_dir
            .clone()
            .unwrap_or_else(|| ctx.install.root.display().to_string());
        engine.push(format!("-Dplugins.dir={plugins}"));

        if ctx.memory_size == 0 {
            ctx.memory_size = clamp_to_address_space(
                default_heap(platform.available_memory()),
                platform.address_bits(),
                platform.max_32bit_heap_mb(),
            );
        }
        if ctx.memory_size > 0 {
            engine.push(heap_option(ctx.memory_size));
        }
        if ctx.flags.headless {
            engine.push("-Djava.awt.headless=true");
        }
        engine.extend(ctx.flags.gc.options().iter().copied());
        if ctx.flags.debug_gc {
            engine.push("-verbose:gc");
        }

        build_class_path(ctx, platform)?;
        let class_path = ctx.class_path.joined();
        if !class_path.is_empty() {
            engine.push(format!("-Djava.class.path={class_path}"));
        }
        engine.extend(ctx.jvm_options.iter().cloned());

        let mut app = scan.app_options.clone();
        app.extend(ctx.default_arguments.iter().cloned());
        engine.extend(scan.engine_tokens());

        if ctx.flags.add_class_path_option {
            app.push("-classpath");
            app.push(class_path);
        }

        let mut main_class = ctx.main_class().to_string();
        if main_class == ANT_MAIN_CLASS {
            add_runtime_to_path(ctx, platform);
        }
        if ctx.flags.jdb {
            app.push(main_class.as_str());
        }

        let default_entry = is_default_main_class(&main_class);
        if default_entry {
            app.push(if ctx.flags.allow_multiple { "-port0" } else { "-port7" });
            engine.push("-Dsun.java.command=Fiji");
            staging::merge_all(&ctx.install, platform)?;
        }

        if ctx.flags.headless && default_entry {
            if scan.application_count() + scan.headless_args < 1 {
                if !ctx.flags.dry_run {
                    return Err(LaunchError::HeadlessWithoutParameter);
                }
                log::error!("{}", LaunchError::HeadlessWithoutParameter);
            }
            if scan
                .application_tokens()
                .next()
                .is_some_and(|first| !first.starts_with('-'))
            {
                app.push("-batch");
            }
        }

        if ctx.flags.jdb {
            main_class = DEBUGGER_MAIN_CLASS.to_string();
        }
        if ctx.flags.retrotranslator {
            app.push("-advanced");
            app.push(main_class);
            main_class = RETROTRANSLATOR_MAIN_CLASS.to_string();
        }
        app.extend(scan.application_tokens());

        let properties = vec![
            ("fiji.dir".to_string(), ctx.install.root.display().to_string()),
            (
                "fiji.defaultLibPath".to_string(),
                ctx.runtime.library().to_string(),
            ),
            (
                "fiji.executable".to_string(),
                ctx.args.first().cloned().unwrap_or_default(),
            ),
        ];

        Ok(Self {
            engine,
            main_class,
            app,
            properties,
        })
    }

    /// The properties as `-Dkey=value` engine options
    pub fn property_options(&self) -> impl Iterator<Item = String> + '_ {
        self.properties
            .iter()
            .map(|(key, value)| format!("-D{key}={value}"))
    }

    /// Engine options for creating the runtime in-process
    pub fn engine_options(&self) -> &[String] {
        self.engine.as_slice()
    }

    /// The command line printed by `--dry-run`
    pub fn dry_run_line(&self) -> String {
        let mut line = StringBuffer::copy_of("java");
        for option in self.engine.iter().cloned().chain(self.property_options()) {
            line.append_formatted(" %s", &[quote_if_necessary(&option).as_str().into()]);
        }
        line.append_formatted(" %s", &[self.main_class.as_str().into()]);
        for option in &self.app {
            line.append_formatted(" %s", &[quote_if_necessary(option).as_str().into()]);
        }
        line.to_string()
    }

    /// Arguments of a separate runtime process, program name first
    pub fn fallback_argv(&self, platform: &dyn Platform, install_root: &Path) -> Vec<String> {
        let mut argv = vec!["java".to_string()];
        argv.extend(self.engine.iter().cloned());
        argv.extend(platform.fallback_engine_options(install_root));
        argv.extend(self.property_options());
        argv.push(self.main_class.clone());
        argv.extend(self.app.iter().cloned());
        argv
    }
}

fn build_class_path(ctx: &mut LaunchContext, platform: &dyn Platform) -> Result<(), LaunchError> {
    let order = ctx.settings.class_path_order();
    if ctx.flags.retrotranslator {
        let retro = ctx.install_path("retro");
        ctx.class_path.add_archives(&retro, true, order)?;
    }
    if ctx.flags.skip_class_path {
        return Ok(());
    }

    if ctx.flags.headless {
        let headless = ctx.install_path("misc/headless.jar");
        ctx.class_path.push_path(&headless);
    }
    if is_default_main_class(ctx.main_class()) {
        staging::merge_all(&ctx.install, platform)?;
        for jar in ["jars/Fiji.jar", "jars/ij.jar"] {
            let jar = ctx.install_path(jar);
            ctx.class_path.push_path(&jar);
        }
    } else {
        let plugins = ctx.install_path("plugins");
        ctx.class_path.add_archives(&plugins, true, order)?;
        let jars = ctx.install_path("jars");
        if let Err(e) = ctx.class_path.add_archives(&jars, true, order) {
            log::warn!("{e}");
        }
    }
    Ok(())
}

/// Put the runtime's `bin` directories in front of `PATH`
fn add_runtime_to_path(ctx: &LaunchContext, platform: &dyn Platform) {
    let mut home = ctx.runtime.runtime_home();
    if home.file_name().is_some_and(|name| name == "jre") {
        if let Some(parent) = home.parent() {
            home = parent.to_path_buf();
        }
    }

    let separator = platform.path_list_separator().to_string();
    let mut entries: Vec<String> = [home.join("bin"), home.join("jre").join("bin")]
        .into_iter()
        .filter(|dir| dir.is_dir())
        .map(|dir: PathBuf| dir.display().to_string())
        .collect();
    match std::env::var("PATH") {
        Ok(path) => entries.push(path),
        Err(_) => entries.push(ctx.install.root.display().to_string()),
    }
    std::env::set_var("PATH", entries.join(&separator));
}

/// Escape spaces, quotes and backslashes with a backslash; newlines and
/// tabs become `\n` and `\t`.
pub fn quote_if_necessary(option: &str) -> String {
    let mut quoted = StringBuffer::with_capacity(option.len());
    for c in option.chars() {
        match c {
            '\n' => quoted.append("\\n"),
            '\t' => quoted.append("\\t"),
            ' ' | '"' | '\\' => {
                quoted.push('\\');
                quoted.push(c);
            }
            _ => quoted.push(c),
        }
    }
    quoted.to_string()
}

/// Help text for `--help`
pub fn usage(program: &str) -> String {
    format!(
        "Usage: {program} [<runtime options>.. --] [<application options>..] [<files>..]

Runtime options are passed to the Java runtime, application options to
Fiji (or Jython, JRuby, ...).

General options:
--help, -h
\tshow this help
--dry-run
\tshow the command line, but do not run anything
--system
\tdo not try to run the bundled runtime in-process
--runtime-home, --java-home <path>
\tuse the runtime installed at <path>
--print-runtime-home, --print-java-home
\tprint where the runtime is expected
--print-install-dir, --print-fiji-dir
\tprint the installation directory
--console
\talways open an error console (Windows)
--headless
\trun in text mode
--install-dir, --fiji-dir <path>
\tuse <path> as the installation directory (jars/, plugins/, macros/)
--heap, --mem, --memory <amount>
\tset the heap size to <amount> (e.g. 512M)
--class-path, --classpath, -classpath, --cp, -cp <path>
\tappend <path> to the class path
--jar-path, --jarpath, -jarpath <path>
\tappend the .jar files in <path> to the class path
--ext <path>
\tset the runtime's extension directories to <path>
--default-gc
\tdo not use the advanced garbage collector settings
--gc-g1, --g1
\tuse the G1 garbage collector
--debug-gc
\tlog garbage collector activity on stderr

Application options:
--allow-multiple
\tdo not reuse a running instance
--plugins <dir>
\tdiscover plugins in <dir>
--run <plugin> [<arg>]
\trun <plugin>, optionally with arguments
--compile-and-run <path-to-.java-file>
\tcompile and run the plugin
--edit <file>...
\topen the files in the script editor

Running other programs:
--jdb
\tstart under jdb, the Java debugger
--jython
\tstart Jython (default for files ending in .py)
--jruby
\tstart JRuby (default for files ending in .rb)
--clojure
\tstart Clojure (default for files ending in .clj)
--beanshell, --bsh
\tstart BeanShell (default for files ending in .bs or .bsh)
--main-class <class name>
\tstart the given class (default for files ending in .class)
--jar <path>
\tstart the given archive
--build, --fake
\tstart the build tool
--javac, --javap, --javadoc
\tstart the given development kit tool
--ant
\trun Apache Ant
--retrotranslator, --retro
\tuse Retrotranslator to support older runtimes
"
    )
}
