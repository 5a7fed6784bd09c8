//! Platform services
//!
//! Everything that differs between the Unix, macOS and Windows builds of the
//! launcher sits behind the [`Platform`] trait. The launch pipeline only ever
//! talks to a `&dyn Platform`, which makes it possible to exercise the
//! 32-bit or Windows code paths from tests running anywhere.

use std::ffi::OsStr;
use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use sysinfo::{MemoryRefreshKind, RefreshKind, System};

use crate::error::LaunchError;
use crate::paths;
use crate::runtime::RuntimeLocator;

#[cfg(unix)]
mod exec;

#[cfg(all(unix, not(target_os = "macos")))]
#[path = "unix.rs"]
mod native;

#[cfg(target_os = "macos")]
#[path = "macos.rs"]
mod native;

#[cfg(windows)]
#[path = "windows.rs"]
mod native;

pub use native::Native;

/// Boxed launch routine handed to [`Platform::run_with_event_loop`]
pub type BootFn = Box<dyn FnOnce() -> i32 + Send>;

/// Capabilities the launcher needs from the operating system
pub trait Platform: Send + Sync {
    /// Short platform name used in diagnostics
    fn name(&self) -> &'static str;

    /// Tag naming this platform's runtime directory below `os-specific/`
    fn tag(&self) -> &'static str;

    /// Separator for `PATH`-style lists
    fn path_list_separator(&self) -> char {
        ':'
    }

    /// Suffix of executable files
    fn executable_suffix(&self) -> &'static str {
        ""
    }

    /// Longest path the resolver accepts
    fn max_path_len(&self) -> usize {
        4096
    }

    /// Whether `c` separates path components
    fn is_separator(&self, c: char) -> bool {
        c == '/'
    }

    /// Location of the runtime's shared library relative to its home
    fn runtime_library(&self) -> &'static str;

    /// Environment variable the dynamic linker consults for library lookup
    fn library_search_path_var(&self) -> Option<&'static str> {
        None
    }

    /// Whether the dynamic linker only honors the library search path at
    /// process start, requiring a re-exec after changing it
    fn needs_library_path_reexec(&self) -> bool {
        false
    }

    /// Extra `(variable, value)` pairs to export before loading the runtime
    fn library_environment(&self, _runtime_home: &Path) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Pointer width of the address space the runtime will live in
    fn address_bits(&self) -> u32 {
        usize::BITS
    }

    /// Largest heap, in megabytes, a 32-bit runtime can reserve
    fn max_32bit_heap_mb(&self) -> u64 {
        1920
    }

    /// Available physical memory in bytes, 0 when unknown
    fn available_memory(&self) -> u64 {
        let system = System::new_with_specifics(
            RefreshKind::nothing().with_memory(MemoryRefreshKind::nothing().with_ram()),
        );
        system.available_memory()
    }

    /// Whether a graphical display is reachable from this process
    fn display_available(&self) -> bool;

    /// Trailing directories of an application bundle to strip from the
    /// executable's directory, as `(bundle suffix, components to strip)`
    fn bundle_suffix(&self) -> Option<(&'static str, usize)> {
        None
    }

    /// Directory name marking a precompiled launcher copy
    fn is_precompiled_dir(&self, name: &OsStr) -> bool {
        name == "precompiled"
    }

    /// Convert a path into the platform's short form
    fn resolve_short_path(&self, path: &Path) -> PathBuf {
        path.to_path_buf()
    }

    /// Attach or allocate a console for diagnostics; returns `true` when a
    /// new console window was created
    fn open_console(&self) -> bool {
        false
    }

    /// Pause before replacing the process image so that diagnostics in a
    /// freshly allocated console stay readable
    fn grace_delay(&self, _console_opened: bool) -> Option<Duration> {
        None
    }

    /// Whether the file described by `metadata` may be executed
    fn is_executable(&self, metadata: &Metadata) -> bool;

    /// Search `PATH` for an executable named `name`
    fn search_path(&self, name: &str) -> Result<PathBuf, LaunchError> {
        let path = std::env::var_os("PATH").ok_or(LaunchError::PathUnset)?;
        paths::search_path_list(self.as_dyn(), name, &path)
    }

    /// Whether rename refuses to replace an existing file
    fn remove_before_rename(&self) -> bool {
        false
    }

    /// Whether the process was launched by the desktop shell with an extra
    /// session argument that must be discarded
    fn is_finder_launch(&self, _args: &[String]) -> bool {
        false
    }

    /// Engine options only the fallback runtime process needs
    fn fallback_engine_options(&self, _install_root: &Path) -> Vec<String> {
        Vec::new()
    }

    /// Default extension directories when settings name none
    fn default_extension_dirs(&self, _runtime: &RuntimeLocator) -> Option<String> {
        None
    }

    /// Prepare the process for replacing itself with the fallback runtime
    fn before_fallback_exec(&self) -> io::Result<()> {
        Ok(())
    }

    /// Replace the current process image. Only returns on failure.
    ///
    /// With `search` set the program is looked up in `PATH`.
    fn replace_process_image(&self, program: &str, args: &[String], search: bool) -> io::Error;

    /// Run the launch routine, owning the initial thread's event loop where
    /// the platform requires it.
    fn run_with_event_loop(&self, _install_root: &Path, boot: BootFn) -> i32 {
        boot()
    }

    #[doc(hidden)]
    fn as_dyn(&self) -> &dyn Platform;
}

/// The platform this binary was built for
pub fn current() -> Box<dyn Platform> {
    Box::new(Native::default())
}

/// Whether the desktop shell prepended a process serial number to the
/// arguments following the launcher's path
pub(crate) fn has_process_serial_number(args: &[String]) -> bool {
    args.first().is_some_and(|arg| arg.starts_with("-psn_"))
}

/// Whether a display-related variable is present and non-empty
pub(crate) fn env_present(name: &str) -> bool {
    std::env::var_os(name).is_some_and(|v| !v.is_empty())
}
