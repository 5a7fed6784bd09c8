//! Restarting the launcher with a smaller heap after the runtime ran out
//! of memory during creation

use crate::context::{is_default_main_class, LaunchContext};
use crate::error::LaunchError;
use crate::options::MB_SHIFT;
use crate::platform::Platform;

const MEMORY_FLAGS: [&str; 3] = ["--heap", "--mem", "--memory"];

/// Heap for the next attempt in megabytes, a quarter less than
/// `memory_size` bytes, or `None` when there is nothing left to take away
pub fn reduced_heap_mb(memory_size: u64) -> Option<u64> {
    let mb = memory_size >> MB_SHIFT;
    let subtract = mb >> 2;
    (subtract > 0).then_some(mb - subtract)
}

/// Arguments for the restarted launcher: `executable`, the new heap, then
/// the original `args` without their heap flags.
///
/// Heap flags after `--` belong to the application unless the entry point
/// is a default one.
pub fn retry_arguments(
    executable: &str,
    args: &[String],
    heap_mb: u64,
    default_entry: bool,
) -> Vec<String> {
    let mut argv = vec![executable.to_string(), format!("--mem={heap_mb}m")];
    let mut past_boundary = false;
    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        if arg == "--" {
            past_boundary = true;
        }
        if !past_boundary || default_entry {
            if MEMORY_FLAGS.contains(&arg) {
                i += 2;
                continue;
            }
            let joined = MEMORY_FLAGS
                .iter()
                .any(|flag| arg.strip_prefix(flag).is_some_and(|rest| rest.starts_with('=')));
            if joined {
                i += 1;
                continue;
            }
        }
        argv.push(arg.to_string());
        i += 1;
    }
    argv
}

/// Replace the process with a launcher asking for less memory.
///
/// Only returns on failure: [`LaunchError::OutOfMemory`] when the heap
/// cannot shrink further, [`LaunchError::Exec`] when the restart failed.
pub fn try_with_less_memory(
    ctx: &LaunchContext,
    platform: &dyn Platform,
    main_class: &str,
) -> LaunchError {
    let Some(heap_mb) = reduced_heap_mb(ctx.memory_size) else {
        return LaunchError::OutOfMemory;
    };
    let executable = ctx.install.executable.display().to_string();
    let argv = retry_arguments(
        &executable,
        ctx.arguments(),
        heap_mb,
        is_default_main_class(main_class),
    );

    log::warn!("Trying with a smaller heap: --mem={heap_mb}m");
    let source = platform.replace_process_image(&executable, &argv, false);
    LaunchError::Exec {
        command: argv.join(" "),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::context_at;
    use crate::platform::testing::FakePlatform;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn test_reduced_heap() {
        assert_eq!(reduced_heap_mb(1024 << 20), Some(768));
        assert_eq!(reduced_heap_mb(4 << 20), Some(3));
        assert_eq!(reduced_heap_mb(2 << 20), None);
        assert_eq!(reduced_heap_mb(0), None);
    }

    #[test]
    fn test_heap_flags_are_replaced() {
        let args = strings(&["--heap", "1g", "--mem=2g", "-Xss4m", "--memory", "3g", "image.tif"]);
        assert_eq!(
            retry_arguments("/opt/fiji/fiji", &args, 768, true),
            ["/opt/fiji/fiji", "--mem=768m", "-Xss4m", "image.tif"]
        );
    }

    #[test]
    fn test_flags_after_boundary_kept_for_custom_entry_point() {
        let args = strings(&["--mem=1g", "--main-class", "Tool", "--", "--mem=5"]);
        assert_eq!(
            retry_arguments("fiji", &args, 768, false),
            ["fiji", "--mem=768m", "--main-class", "Tool", "--", "--mem=5"]
        );
        assert_eq!(
            retry_arguments("fiji", &args, 768, true),
            ["fiji", "--mem=768m", "--main-class", "Tool", "--"]
        );
    }

    #[test]
    fn test_gives_up_on_tiny_heap() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context_at(dir.path(), &["--mem=2m"]);
        ctx.memory_size = 2 << 20;
        let err = try_with_less_memory(&ctx, &FakePlatform::default(), "fiji.Main");
        assert!(matches!(err, LaunchError::OutOfMemory));
    }

    #[test]
    fn test_failed_restart_reports_command_line() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context_at(dir.path(), &["--mem=1g", "image.tif"]);
        ctx.memory_size = 1 << 30;
        let err = try_with_less_memory(&ctx, &FakePlatform::default(), "fiji.Main");
        match err {
            LaunchError::Exec { command, .. } => {
                assert!(command.ends_with("fiji --mem=768m image.tif"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
