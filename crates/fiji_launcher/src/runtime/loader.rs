//! Loading the runtime's shared library and creating a VM

use std::ffi::{c_void, CString, OsString};
use std::path::PathBuf;
use std::ptr;

use libloading::Library;

use super::jni::{
    self, CreateJavaVm, Env, JavaVMInitArgs, JavaVMOption, RawInterface, Vm, JNI_ENOMEM, JNI_OK,
};
use super::locator::{RuntimeLocator, RUNTIME_HOME_VAR};
use crate::platform::Platform;

/// Recoverable outcomes of runtime creation
#[derive(Debug, thiserror::Error)]
pub enum CreateError {
    #[error("No runtime at {}", .0.display())]
    NotFound(PathBuf),

    #[error("Could not load runtime library '{}': {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("Error loading runtime library: {0}")]
    Symbol(#[source] libloading::Error),

    #[error("Runtime creation ran out of memory")]
    OutOfMemory,

    #[error("Runtime creation failed with status {0}")]
    Failed(i32),
}

/// Environment variables changed for the runtime, restorable on failure
#[derive(Debug, Default)]
struct EnvironmentChange {
    saved: Vec<(String, Option<OsString>)>,
}

impl EnvironmentChange {
    fn set(&mut self, key: &str, value: impl AsRef<std::ffi::OsStr>) {
        self.saved.push((key.to_string(), std::env::var_os(key)));
        std::env::set_var(key, value);
    }

    fn restore(self) {
        for (key, value) in self.saved.into_iter().rev() {
            match value {
                Some(value) => std::env::set_var(&key, value),
                None => std::env::remove_var(&key),
            }
        }
    }
}

/// A created VM and the library it lives in
pub struct JavaVm {
    vm: Vm,
    env: Env,
    // Unloading the library would invalidate both interfaces
    _library: Library,
}

impl JavaVm {
    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn vm(&self) -> &Vm {
        &self.vm
    }
}

/// Load the runtime library and create a VM with `options`.
///
/// `JAVA_HOME` is pointed at the library home first; if the library cannot
/// be loaded or lacks the creation entry point, the environment is put back
/// so that a fallback runtime process sees the user's settings.
pub fn create_runtime(
    platform: &dyn Platform,
    locator: &RuntimeLocator,
    options: &[CString],
) -> Result<JavaVm, CreateError> {
    let home = locator.library_home().to_path_buf();
    let mut environment = EnvironmentChange::default();
    for (key, value) in platform.library_environment(&home) {
        environment.set(&key, value);
    }
    environment.set(RUNTIME_HOME_VAR, &home);

    let path = home.join(locator.library());
    log::debug!("Loading runtime library {}", path.display());
    let library = match unsafe { Library::new(&path) } {
        Ok(library) => library,
        Err(source) => {
            environment.restore();
            if !home.exists() {
                return Err(CreateError::NotFound(home));
            }
            return Err(CreateError::Load { path, source });
        }
    };

    let create: CreateJavaVm = match unsafe { library.get::<CreateJavaVm>(jni::CREATE_VM_SYMBOL) } {
        Ok(symbol) => *symbol,
        Err(e) => {
            environment.restore();
            return Err(CreateError::Symbol(e));
        }
    };

    let mut raw_options: Vec<JavaVMOption> = options
        .iter()
        .map(|option| JavaVMOption {
            option_string: option.as_ptr().cast_mut(),
            extra_info: ptr::null_mut(),
        })
        .collect();
    let mut args = JavaVMInitArgs {
        version: jni::JNI_VERSION_1_4,
        n_options: raw_options.len() as jni::jint,
        options: raw_options.as_mut_ptr(),
        ignore_unrecognized: jni::JNI_FALSE,
    };

    let mut vm: RawInterface = ptr::null_mut();
    let mut env: RawInterface = ptr::null_mut();
    let status = unsafe {
        create(
            &mut vm,
            &mut env,
            (&mut args as *mut JavaVMInitArgs).cast::<c_void>(),
        )
    };
    match status {
        JNI_OK if !vm.is_null() && !env.is_null() => Ok(JavaVm {
            vm: unsafe { Vm::from_raw(vm) },
            env: unsafe { Env::from_raw(env) },
            _library: library,
        }),
        JNI_ENOMEM => Err(CreateError::OutOfMemory),
        status => Err(CreateError::Failed(status)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::testing::{lock_env, FakePlatform};

    #[test]
    fn test_missing_home_is_not_found_and_restores_environment() {
        let _guard = lock_env();
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var(RUNTIME_HOME_VAR, dir.path());

        let mut locator = RuntimeLocator::new(dir.path(), "fake-amd64", "lib/server/libjvm.so");
        locator.set_override(dir.path().join("missing"));
        let result = create_runtime(&FakePlatform::default(), &locator, &[]);

        assert!(matches!(result, Err(CreateError::NotFound(_))));
        assert_eq!(std::env::var_os(RUNTIME_HOME_VAR), Some(dir.path().into()));
        std::env::remove_var(RUNTIME_HOME_VAR);
    }

    #[test]
    fn test_unloadable_library_is_load_error() {
        let _guard = lock_env();
        std::env::remove_var(RUNTIME_HOME_VAR);
        let dir = tempfile::tempdir().unwrap();
        let lib = dir.path().join("lib/server/libjvm.so");
        std::fs::create_dir_all(lib.parent().unwrap()).unwrap();
        std::fs::write(&lib, b"not a shared library").unwrap();

        let mut locator = RuntimeLocator::new(dir.path(), "fake-amd64", "lib/server/libjvm.so");
        locator.set_override(dir.path());
        let result = create_runtime(&FakePlatform::default(), &locator, &[]);

        assert!(matches!(result, Err(CreateError::Load { .. })));
        assert!(std::env::var_os(RUNTIME_HOME_VAR).is_none());
    }
}
