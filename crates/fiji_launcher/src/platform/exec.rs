//! Process image replacement shared by the Unix platforms

use std::ffi::CString;
use std::io;

use nix::unistd::{execv, execvp};

/// Replace the process image via `execv`/`execvp`
pub(crate) fn exec(program: &str, args: &[String], search: bool) -> io::Error {
    let program = match CString::new(program) {
        Ok(program) => program,
        Err(e) => return io::Error::new(io::ErrorKind::InvalidInput, e),
    };
    let args = match args
        .iter()
        .map(|arg| CString::new(arg.as_str()))
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(args) => args,
        Err(e) => return io::Error::new(io::ErrorKind::InvalidInput, e),
    };

    let result = if search {
        execvp(&program, &args)
    } else {
        execv(&program, &args)
    };
    match result {
        Err(errno) => io::Error::from(errno),
        Ok(never) => match never {},
    }
}
