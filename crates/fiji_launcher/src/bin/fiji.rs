//! Fiji launcher
//!
//! Usage:
//!   fiji [<runtime options>.. --] [<application options>..] [<files>..]
//!   fiji --dry-run image.tif
//!   fiji --headless --run "Gaussian Blur" "sigma=2"

use std::io::Write;
use std::sync::Arc;

use fiji_launcher::{platform, utf8_arguments, Launcher};

fn main() {
    // Plain messages keep multi-line diagnostics aligned
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();

    let launcher = Launcher::new(Arc::from(platform::current()));
    let status = match utf8_arguments(std::env::args_os()).and_then(|args| launcher.run(args)) {
        Ok(status) => status,
        Err(e) => {
            log::error!("{}", e);
            1
        }
    };
    std::process::exit(status);
}
