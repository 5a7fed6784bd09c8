//! macOS
//!
//! The runtime's GUI toolkit insists on owning the initial thread's run
//! loop, so the launch itself happens on a worker thread while the main
//! thread sits in `CFRunLoopRun`.

use std::ffi::c_void;
use std::fs::Metadata;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use nix::unistd::{fork, ForkResult};

use super::{env_present, has_process_serial_number, BootFn, Platform};
use crate::runtime::RuntimeLocator;

type CFIndex = isize;
type CFRunLoopRef = *mut c_void;
type CFRunLoopSourceRef = *mut c_void;
type CFStringRef = *const c_void;

#[repr(C)]
struct CFRunLoopSourceContext {
    version: CFIndex,
    info: *mut c_void,
    retain: Option<extern "C" fn(*const c_void) -> *const c_void>,
    release: Option<extern "C" fn(*const c_void)>,
    copy_description: Option<extern "C" fn(*const c_void) -> CFStringRef>,
    equal: Option<extern "C" fn(*const c_void, *const c_void) -> u8>,
    hash: Option<extern "C" fn(*const c_void) -> usize>,
    schedule: Option<extern "C" fn(*mut c_void, CFRunLoopRef, CFStringRef)>,
    cancel: Option<extern "C" fn(*mut c_void, CFRunLoopRef, CFStringRef)>,
    perform: Option<extern "C" fn(*mut c_void)>,
}

#[link(name = "CoreFoundation", kind = "framework")]
extern "C" {
    static kCFRunLoopCommonModes: CFStringRef;

    fn CFRunLoopGetCurrent() -> CFRunLoopRef;
    fn CFRunLoopSourceCreate(
        allocator: *const c_void,
        order: CFIndex,
        context: *mut CFRunLoopSourceContext,
    ) -> CFRunLoopSourceRef;
    fn CFRunLoopAddSource(rl: CFRunLoopRef, source: CFRunLoopSourceRef, mode: CFStringRef);
    fn CFRunLoopRun();
}

extern "C" fn ignore_event(_info: *mut c_void) {}

/// Application name shown in the Dock
const APP_NAME: &str = "Fiji";

#[derive(Debug, Default, Clone, Copy)]
pub struct Native;

impl Native {
    fn icon_path(install_root: &Path) -> PathBuf {
        if install_root.ends_with("Fiji.app") {
            install_root.join("Contents/Resources/Fiji.icns")
        } else {
            install_root.join("images/Fiji.icns")
        }
    }
}

impl Platform for Native {
    fn name(&self) -> &'static str {
        "macosx"
    }

    fn tag(&self) -> &'static str {
        "macosx"
    }

    fn runtime_library(&self) -> &'static str {
        "lib/server/libjvm.dylib"
    }

    fn display_available(&self) -> bool {
        env_present("SECURITYSESSIONID") || env_present("DISPLAY")
    }

    fn bundle_suffix(&self) -> Option<(&'static str, usize)> {
        Some(("Fiji.app/Contents/MacOS", 2))
    }

    fn is_executable(&self, metadata: &Metadata) -> bool {
        metadata.permissions().mode() & 0o111 != 0
    }

    fn is_finder_launch(&self, args: &[String]) -> bool {
        has_process_serial_number(args)
    }

    fn fallback_engine_options(&self, install_root: &Path) -> Vec<String> {
        vec![
            format!("-Xdock:name={APP_NAME}"),
            format!("-Xdock:icon={}", Self::icon_path(install_root).display()),
        ]
    }

    fn default_extension_dirs(&self, runtime: &RuntimeLocator) -> Option<String> {
        Some(format!(
            "{}/Home/lib/ext:/Library/Java/Extensions:/System/Library/Java/Extensions:\
             /System/Library/Frameworks/JavaVM.framework/Home/lib/ext",
            runtime.runtime_home().display()
        ))
    }

    fn before_fallback_exec(&self) -> io::Result<()> {
        // exec() from a process that already started threads fails with
        // "Operation not supported"; continue in a fresh child instead
        match unsafe { fork() } {
            Ok(ForkResult::Parent { .. }) => std::process::exit(0),
            Ok(ForkResult::Child) => Ok(()),
            Err(errno) => Err(io::Error::from(errno)),
        }
    }

    fn replace_process_image(&self, program: &str, args: &[String], search: bool) -> io::Error {
        super::exec::exec(program, args, search)
    }

    fn run_with_event_loop(&self, install_root: &Path, boot: BootFn) -> i32 {
        let pid = std::process::id();
        std::env::set_var(format!("APP_NAME_{pid}"), APP_NAME);
        std::env::set_var(
            format!("APP_ICON_{pid}"),
            Self::icon_path(install_root).as_os_str(),
        );

        let spawned = std::thread::Builder::new()
            .name("launcher".to_string())
            .spawn(move || std::process::exit(boot()));
        if let Err(e) = spawned {
            log::error!("Could not start launcher thread: {}", e);
            return 1;
        }

        let mut context = CFRunLoopSourceContext {
            version: 0,
            info: std::ptr::null_mut(),
            retain: None,
            release: None,
            copy_description: None,
            equal: None,
            hash: None,
            schedule: None,
            cancel: None,
            perform: Some(ignore_event),
        };
        // The worker thread ends the process; this loop never returns
        // under normal operation
        unsafe {
            let source = CFRunLoopSourceCreate(std::ptr::null(), 0, &mut context);
            CFRunLoopAddSource(CFRunLoopGetCurrent(), source, kCFRunLoopCommonModes);
            CFRunLoopRun();
        }
        0
    }

    fn as_dyn(&self) -> &dyn Platform {
        self
    }
}
