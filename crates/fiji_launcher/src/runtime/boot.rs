//! Booting the runtime: in-process when possible, otherwise by replacing
//! the launcher with a runtime executable

use std::ffi::{CStr, CString};
use std::path::Path;

use super::jni::{jvalue, Env, JNI_OK};
use super::loader::{create_runtime, CreateError, JavaVm};
use super::locator::RUNTIME_HOME_VAR;
use crate::context::LaunchContext;
use crate::error::LaunchError;
use crate::options::LaunchCommand;
use crate::platform::Platform;
use crate::retry;

const MAIN_SIGNATURE: &CStr = c"([Ljava/lang/String;)V";
const SET_PROPERTY_SIGNATURE: &CStr = c"(Ljava/lang/String;Ljava/lang/String;)Ljava/lang/String;";

fn c_string(text: &str) -> Result<CString, LaunchError> {
    CString::new(text).map_err(|_| LaunchError::NulInOption(text.to_string()))
}

/// Run `command`. Returns the exit status once the entry point and every
/// runtime thread have finished; a fallback launch does not return unless
/// it fails.
pub fn boot(
    ctx: &LaunchContext,
    platform: &dyn Platform,
    command: &LaunchCommand,
) -> Result<i32, LaunchError> {
    if ctx.flags.use_system_runtime {
        return Err(exec_fallback(ctx, platform, command));
    }

    let options = command
        .engine_options()
        .iter()
        .map(|option| c_string(option))
        .collect::<Result<Vec<_>, _>>()?;

    match create_runtime(platform, &ctx.runtime, &options) {
        Ok(vm) => {
            run_main(&vm, command)?;
            Ok(0)
        }
        Err(CreateError::OutOfMemory) => {
            Err(retry::try_with_less_memory(ctx, platform, &command.main_class))
        }
        Err(CreateError::NotFound(home)) => {
            log::debug!("No bundled runtime at {}", home.display());
            Err(exec_fallback(ctx, platform, command))
        }
        Err(e) => {
            log::warn!("{e}");
            log::warn!("Warning: falling back to System JVM");
            Err(exec_fallback(ctx, platform, command))
        }
    }
}

/// Set a system property of the running VM, returning its previous value
fn set_property(env: &Env, key: &str, value: &str) -> Result<Option<String>, LaunchError> {
    let system = env.find_class(c"java/lang/System");
    if system.is_null() {
        return Ok(None);
    }
    let method = env.get_static_method_id(system, c"setProperty", SET_PROPERTY_SIGNATURE);
    if method.is_null() {
        return Ok(None);
    }
    let key = env.new_string_utf(&c_string(key)?);
    let value = env.new_string_utf(&c_string(value)?);
    let previous = env.call_static_object_method(system, method, &[jvalue { l: key }, jvalue { l: value }]);
    Ok(env.get_string(previous))
}

/// Build the `String[]` handed to the entry point
fn string_array(env: &Env, options: &[String]) -> Result<jvalue, LaunchError> {
    let failed = || {
        env.exception_describe();
        LaunchError::OptionArray("application".to_string())
    };

    let first = c_string(options.first().map(String::as_str).unwrap_or(""))?;
    let initial = env.new_string_utf(&first);
    if initial.is_null() {
        return Err(failed());
    }
    let string_class = env.find_class(c"java/lang/String");
    let array = env.new_object_array(options.len() as i32, string_class, initial);
    if array.is_null() {
        return Err(failed());
    }
    for (index, option) in options.iter().enumerate().skip(1) {
        let string = env.new_string_utf(&c_string(option)?);
        if string.is_null() {
            return Err(failed());
        }
        env.set_object_array_element(array, index as i32, string);
    }
    Ok(jvalue { l: array })
}

/// Call the entry point's `main` and wait for the VM to wind down
fn run_main(vm: &JavaVm, command: &LaunchCommand) -> Result<(), LaunchError> {
    let env = vm.env();
    for (key, value) in &command.properties {
        if let Some(previous) = set_property(env, key, value)? {
            log::debug!("Replaced property {key}={previous}");
        }
    }

    let slashed = command.main_class.replace('.', "/");
    let class = env.find_class(&c_string(&slashed)?);
    if class.is_null() {
        env.exception_describe();
        return Err(LaunchError::MainClassNotFound(slashed));
    }
    let method = env.get_static_method_id(class, c"main", MAIN_SIGNATURE);
    if method.is_null() {
        env.exception_describe();
        return Err(LaunchError::MainMethodNotFound(slashed));
    }

    let args = string_array(env, command.app.as_slice())?;
    log::info!("Starting {}", command.main_class);
    env.call_static_void_method(class, method, &[args]);

    if vm.vm().detach_current_thread() != JNI_OK {
        log::error!("Could not detach current thread");
    }
    // Returns once the application has exited
    vm.vm().destroy();
    Ok(())
}

/// Runtime executable for a fallback launch, and whether to search `PATH`
fn fallback_program() -> (String, bool) {
    match std::env::var(RUNTIME_HOME_VAR) {
        Ok(home) if !home.is_empty() => {
            log::info!("Found that {RUNTIME_HOME_VAR} was: '{home}'");
            let java = Path::new(&home).join("bin").join("java");
            (java.display().to_string(), false)
        }
        _ => ("java".to_string(), true),
    }
}

/// Replace the launcher with a separate runtime process. Only returns on
/// failure.
pub fn exec_fallback(
    ctx: &LaunchContext,
    platform: &dyn Platform,
    command: &LaunchCommand,
) -> LaunchError {
    let (program, search) = fallback_program();
    if let Err(source) = platform.before_fallback_exec() {
        return LaunchError::Exec {
            command: program,
            source,
        };
    }

    let mut argv = command.fallback_argv(platform, &ctx.install.root);
    argv[0] = program.clone();
    if let Some(delay) = platform.grace_delay(ctx.console_opened) {
        std::thread::sleep(delay);
    }

    log::debug!("Executing {}", argv.join(" "));
    let source = platform.replace_process_image(&program, &argv, search);
    LaunchError::Exec {
        command: argv.join(" "),
        source,
    }
}
