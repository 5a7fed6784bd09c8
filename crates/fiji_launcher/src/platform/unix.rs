//! Linux and other Unix systems

use std::fs::Metadata;
use std::io;
use std::os::unix::fs::PermissionsExt;

use super::{env_present, Platform};

#[derive(Debug, Default, Clone, Copy)]
pub struct Native;

impl Platform for Native {
    fn name(&self) -> &'static str {
        "unix"
    }

    fn tag(&self) -> &'static str {
        if cfg!(target_pointer_width = "64") {
            "linux-amd64"
        } else {
            "linux"
        }
    }

    fn runtime_library(&self) -> &'static str {
        "lib/server/libjvm.so"
    }

    fn library_search_path_var(&self) -> Option<&'static str> {
        Some("LD_LIBRARY_PATH")
    }

    fn needs_library_path_reexec(&self) -> bool {
        cfg!(target_os = "linux")
    }

    fn display_available(&self) -> bool {
        env_present("DISPLAY") || env_present("WAYLAND_DISPLAY")
    }

    fn is_executable(&self, metadata: &Metadata) -> bool {
        metadata.permissions().mode() & 0o111 != 0
    }

    fn replace_process_image(&self, program: &str, args: &[String], search: bool) -> io::Error {
        super::exec::exec(program, args, search)
    }

    fn as_dyn(&self) -> &dyn Platform {
        self
    }
}
