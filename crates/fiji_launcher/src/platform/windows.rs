//! Windows

use std::ffi::{OsStr, OsString};
use std::fs::Metadata;
use std::io;
use std::io::IsTerminal;
use std::os::windows::ffi::{OsStrExt, OsStringExt};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::Platform;

const ATTACH_PARENT_PROCESS: u32 = u32::MAX;

#[link(name = "kernel32")]
extern "system" {
    fn GetShortPathNameW(long_path: *const u16, short_path: *mut u16, buffer_len: u32) -> u32;
    fn AttachConsole(process_id: u32) -> i32;
    fn AllocConsole() -> i32;
}

/// Set once a console was attached or allocated
static CONSOLE_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Seconds a freshly allocated console stays open before `java.exe` takes over
const CONSOLE_GRACE_SECS: u64 = 5;

#[derive(Debug, Default, Clone, Copy)]
pub struct Native;

fn wide(s: &OsStr) -> Vec<u16> {
    s.encode_wide().chain(std::iter::once(0)).collect()
}

impl Platform for Native {
    fn name(&self) -> &'static str {
        "windows"
    }

    fn tag(&self) -> &'static str {
        if cfg!(target_pointer_width = "64") {
            "win64"
        } else {
            "win32"
        }
    }

    fn path_list_separator(&self) -> char {
        ';'
    }

    fn executable_suffix(&self) -> &'static str {
        ".exe"
    }

    fn max_path_len(&self) -> usize {
        260
    }

    fn is_separator(&self, c: char) -> bool {
        c == '/' || c == '\\'
    }

    fn runtime_library(&self) -> &'static str {
        "bin/server/jvm.dll"
    }

    fn library_environment(&self, runtime_home: &Path) -> Vec<(String, String)> {
        let path = std::env::var("PATH").unwrap_or_default();
        vec![(
            "PATH".to_string(),
            format!("{};{}", runtime_home.join("bin").display(), path),
        )]
    }

    fn max_32bit_heap_mb(&self) -> u64 {
        1638
    }

    fn display_available(&self) -> bool {
        true
    }

    fn is_precompiled_dir(&self, name: &OsStr) -> bool {
        name.eq_ignore_ascii_case("precompiled") || name == "PRECOM~1"
    }

    fn resolve_short_path(&self, path: &Path) -> PathBuf {
        let long = wide(path.as_os_str());
        let size = unsafe { GetShortPathNameW(long.as_ptr(), std::ptr::null_mut(), 0) };
        if size == 0 {
            return path.to_path_buf();
        }
        let mut buffer = vec![0u16; size as usize];
        let written = unsafe { GetShortPathNameW(long.as_ptr(), buffer.as_mut_ptr(), size) };
        if written == 0 || written >= size {
            return path.to_path_buf();
        }
        buffer.truncate(written as usize);
        PathBuf::from(OsString::from_wide(&buffer))
    }

    fn open_console(&self) -> bool {
        if CONSOLE_INITIALIZED.swap(true, Ordering::SeqCst) {
            return false;
        }
        if !io::stdout().is_terminal() && !io::stderr().is_terminal() {
            return false;
        }
        if unsafe { AttachConsole(ATTACH_PARENT_PROCESS) } != 0 {
            return false;
        }
        unsafe { AllocConsole() != 0 }
    }

    fn grace_delay(&self, console_opened: bool) -> Option<Duration> {
        console_opened.then(|| Duration::from_secs(CONSOLE_GRACE_SECS))
    }

    fn is_executable(&self, metadata: &Metadata) -> bool {
        metadata.is_file()
    }

    fn remove_before_rename(&self) -> bool {
        true
    }

    fn replace_process_image(&self, program: &str, args: &[String], _search: bool) -> io::Error {
        // No exec(): run the program as a child and pass its status on
        match Command::new(program).args(args.iter().skip(1)).status() {
            Ok(status) => std::process::exit(status.code().unwrap_or(1)),
            Err(e) => e,
        }
    }

    fn as_dyn(&self) -> &dyn Platform {
        self
    }
}
